mod backtesting;
mod data_loading;
mod sweep;

use std::env;

use alphalib::config::TradingConfig;
use alphalib::indicators::IndicatorRegistry;
use alphalib::logging;
use alphalib::models::MARKOWITZ_HISTORICAL;
use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};

const USAGE: &str = "Usage: research <config> (<bars.csv> | --synthetic <count>) [--report <out.csv>] [--sweep <l1,l2,...>]";

struct Args {
    config: String,
    bars: Option<String>,
    synthetic: Option<usize>,
    report: Option<String>,
    sweep: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let config = match args.next() {
        Some(config) => config,
        None => bail!(USAGE),
    };
    let mut parsed = Args {
        config,
        bars: None,
        synthetic: None,
        report: None,
        sweep: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--synthetic" => {
                let count = args.next().context(USAGE)?;
                parsed.synthetic = Some(count.parse().context("--synthetic takes a bar count")?);
            }
            "--report" => parsed.report = Some(args.next().context(USAGE)?),
            "--sweep" => parsed.sweep = Some(args.next().context(USAGE)?),
            _ if parsed.bars.is_none() && !arg.starts_with("--") => parsed.bars = Some(arg),
            _ => bail!("unexpected argument {}\n{}", arg, USAGE),
        }
    }

    if parsed.bars.is_none() == parsed.synthetic.is_none() {
        bail!(USAGE);
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = TradingConfig::load(&args.config)?;
    logging::init(&config.logging)?;

    if config.model != MARKOWITZ_HISTORICAL {
        bail!("research only backtests the {} model, got {}", MARKOWITZ_HISTORICAL, config.model);
    }
    let alpha = config.historical_alpha()?;
    let symbols = config.symbols();

    let bars = match (&args.bars, args.synthetic) {
        (Some(path), _) => data_loading::load_bars(path, alpha.resolution)?,
        (None, Some(count)) => {
            let start = Utc
                .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
                .single()
                .context("synthetic start time")?;
            data_loading::synthetic_bars(&symbols, count, alpha.resolution, start, 42)
        }
        (None, None) => bail!(USAGE),
    };
    log::info!("Loaded {} bars for {} instruments", bars.len(), symbols.len());

    if let Some(raw) = &args.sweep {
        let lookbacks = sweep::parse_lookbacks(raw)?;
        for (lookback, result) in sweep::sweep_lookbacks(alpha, &lookbacks, &bars, &symbols) {
            match result {
                Ok(summary) => log::info!(
                    "lookback {:>4}: {} insights ({} up, {} down), {} cancelled, hit rate {}",
                    lookback,
                    summary.insights,
                    summary.up,
                    summary.down,
                    summary.cancelled,
                    summary
                        .hit_rate()
                        .map_or("n/a".to_string(), |rate| format!("{:.2}%", rate * 100.0))
                ),
                Err(e) => log::error!("lookback {:>4}: {:#}", lookback, e),
            }
        }
        return Ok(());
    }

    let mut backtest =
        backtesting::Backtest::new(alpha, Box::new(IndicatorRegistry::new()), &bars, &symbols)?;
    backtest.run()?;

    let summary = backtest.summary();
    log::info!(
        "{} insights ({} up, {} down), {} cancelled, {} hits, {} misses, {} open",
        summary.insights,
        summary.up,
        summary.down,
        summary.cancelled,
        summary.hits,
        summary.misses,
        summary.open
    );

    if let Some(output) = &args.report {
        backtest.save_report(output)?;
        log::info!("Saved report to {}", output);
    }
    Ok(())
}
