use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use alphalib::config::{read_settings, TradingConfig};
use alphalib::data::{Resolution, Slice, TradeBar};
use alphalib::host::{Engine, HistoryStore};
use alphalib::indicators::IndicatorRegistry;
use alphalib::oanda::objects::OandaSettings;
use alphalib::{logging, models, oanda};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

// Groups freshly fetched bars into slices. A bar is new when it closes after
// the last stored bar of its own instrument; closes before the clock can no
// longer be applied and are skipped.
fn new_slices(bars: Vec<TradeBar>, clock: DateTime<Utc>, history: &HistoryStore) -> Vec<Slice> {
    let mut by_time: BTreeMap<DateTime<Utc>, Slice> = BTreeMap::new();
    for bar in bars {
        let time = bar.end_time();
        let last = history.latest(&bar.symbol).map(TradeBar::end_time);
        if last.map_or(false, |last| time <= last) {
            continue;
        }
        if time < clock {
            log::warn!("Skipping {} close at {}, clock is already at {}", bar.symbol, time, clock);
            continue;
        }
        by_time
            .entry(time)
            .or_insert_with(|| Slice::new(time))
            .bars
            .insert(bar.symbol.clone(), bar);
    }
    by_time.into_values().collect()
}

async fn poll(
    engine: &mut Engine,
    instruments: &[String],
    resolution: Resolution,
    settings: &OandaSettings,
) -> Result<()> {
    let bars = oanda::get_candles_for(instruments, resolution, 2, settings).await?;
    let slices = new_slices(bars, engine.time(), engine.algorithm().history_store());
    for slice in slices {
        let insights = engine.on_data(&slice)?;
        for insight in &insights {
            log::info!("[{}][INSIGHT] {}", slice.time, insight);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config>", args[0]);
        std::process::exit(1);
    }

    let settings = read_settings("settings.json").context("reading settings.json")?;
    let config = TradingConfig::load(&args[1])?;
    logging::init(&config.logging)?;

    let alpha = config.historical_alpha()?;
    let model = models::from_config(&config, Box::new(IndicatorRegistry::new()))?;

    // Candles are fetched once to warm up, then polled for fresh closes
    let warm_up = oanda::get_candles_for(
        &config.instruments,
        alpha.resolution,
        alpha.lookback + 1,
        &settings.oanda,
    )
    .await?;
    let start = warm_up
        .iter()
        .map(TradeBar::end_time)
        .max()
        .unwrap_or_else(Utc::now);
    log::info!("Fetched {} warm-up candles, clock starts at {}", warm_up.len(), start);

    let mut engine = Engine::new(model, HistoryStore::from_bars(warm_up), start);
    engine.add_securities(&config.symbols())?;
    log::info!("Running {} on {:?}", engine.alpha_name(), config.instruments);

    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_seconds));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = poll(&mut engine, &config.instruments, alpha.resolution, &settings.oanda).await {
                    log::error!("{:#}", e);
                }
            }
        }
    }

    log::info!(
        "{} insights emitted, {} cancelled",
        engine.insights().all().len(),
        engine.insights().cancelled_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphalib::data::Symbol;
    use chrono::TimeZone;

    fn bar(ticker: &str, day: i64) -> TradeBar {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();
        TradeBar {
            symbol: Symbol::new(ticker),
            time: start + chrono::Duration::days(day),
            period: chrono::Duration::days(1),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        }
    }

    #[test]
    fn only_new_closes_become_slices() {
        let history = HistoryStore::from_bars(vec![bar("EUR_USD", 0), bar("USD_JPY", 0)]);
        let bars = vec![bar("EUR_USD", 0), bar("EUR_USD", 1), bar("USD_JPY", 1), bar("USD_JPY", 2)];
        let clock = bars[0].end_time();

        let slices = new_slices(bars, clock, &history);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].bars.len(), 2);
        assert_eq!(slices[1].bars.len(), 1);
        assert!(slices[0].time < slices[1].time);
    }

    #[test]
    fn lagging_instrument_close_is_delivered_on_the_next_poll() {
        let mut history = HistoryStore::from_bars(vec![bar("EUR_USD", 0), bar("USD_JPY", 0)]);
        let clock = bar("EUR_USD", 0).end_time();

        // first poll: only EUR_USD has completed day 1
        let first = new_slices(vec![bar("EUR_USD", 0), bar("EUR_USD", 1)], clock, &history);
        assert_eq!(first.len(), 1);
        let clock = first[0].time;
        for bar in first[0].bars.values() {
            history.append(bar.clone());
        }

        // second poll: USD_JPY catches up at the close the clock already reached
        let second = new_slices(vec![bar("EUR_USD", 1), bar("USD_JPY", 1)], clock, &history);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].time, clock);
        assert_eq!(second[0].bars.keys().collect::<Vec<_>>(), vec![&Symbol::new("USD_JPY")]);
    }

    #[test]
    fn closes_behind_the_clock_are_skipped() {
        let history = HistoryStore::from_bars(vec![bar("EUR_USD", 0)]);
        let clock = bar("EUR_USD", 2).end_time();

        let slices = new_slices(vec![bar("USD_JPY", 0), bar("USD_JPY", 2)], clock, &history);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].time, clock);
    }
}
