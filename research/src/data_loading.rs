use std::collections::BTreeMap;
use std::path::Path;

use alphalib::data::{Resolution, Slice, Symbol, TradeBar};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

// CSV layout: symbol,time,open,high,low,close,volume
// `time` is the bar's open time in RFC3339. Every bar is assumed to span one
// period of the configured resolution.
#[derive(Debug, Deserialize)]
struct BarRecord {
    symbol: String,
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn load_bars(path: impl AsRef<Path>, resolution: Resolution) -> Result<Vec<TradeBar>> {
    let path = path.as_ref();
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;

    let mut bars = Vec::new();
    for (line, record) in reader.deserialize::<BarRecord>().enumerate() {
        let record = record.with_context(|| format!("{} row {}", path.display(), line + 1))?;
        bars.push(TradeBar {
            symbol: Symbol::new(record.symbol),
            time: record.time,
            period: resolution.to_duration(),
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    bars.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.symbol.cmp(&b.symbol)));
    Ok(bars)
}

// Geometric random walk per symbol, reproducible from `seed`.
pub fn synthetic_bars(
    symbols: &[Symbol],
    count: usize,
    resolution: Resolution,
    start: DateTime<Utc>,
    seed: u64,
) -> Vec<TradeBar> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let period = resolution.to_duration();
    let mut bars = Vec::with_capacity(symbols.len() * count);

    for symbol in symbols {
        let mut price = rng.gen_range(0.5..200.0);
        let mut time = start;
        for _ in 0..count {
            let open = price;
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            let wick = price * rng.gen_range(0.0..0.005);
            bars.push(TradeBar {
                symbol: symbol.clone(),
                time,
                period,
                open,
                high: open.max(price) + wick,
                low: open.min(price) - wick,
                close: price,
                volume: rng.gen_range(100.0..10_000.0),
            });
            time = time + period;
        }
    }

    bars.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.symbol.cmp(&b.symbol)));
    bars
}

// Groups bars into the slices the host would deliver, one per close time.
pub fn slices(bars: &[TradeBar]) -> Vec<Slice> {
    let mut by_time: BTreeMap<DateTime<Utc>, Slice> = BTreeMap::new();
    for bar in bars {
        let time = bar.end_time();
        let slice = by_time.entry(time).or_insert_with(|| Slice::new(time));
        slice.bars.insert(bar.symbol.clone(), bar.clone());
    }
    by_time.into_values().collect()
}

// The clock time by which exactly `lookback` distinct bar closes have happened.
pub fn warm_up_end(bars: &[TradeBar], lookback: usize) -> Result<DateTime<Utc>> {
    if lookback == 0 {
        bail!("lookback must be at least 1");
    }

    let mut close_times: Vec<DateTime<Utc>> = bars.iter().map(TradeBar::end_time).collect();
    close_times.sort();
    close_times.dedup();

    if close_times.len() <= lookback {
        bail!(
            "need more than {} bar closes to warm up, found {}",
            lookback,
            close_times.len()
        );
    }
    Ok(close_times[lookback - 1])
}
