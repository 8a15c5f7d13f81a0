use std::fs::File;
use std::path::Path;

use alphalib::config::HistoricalAlphaConfig;
use alphalib::data::{Slice, Symbol, TradeBar};
use alphalib::host::{Engine, HistoryStore};
use alphalib::indicators::IndicatorFactory;
use alphalib::models::{Insight, InsightDirection, MarkowitzHistoricalAlphaModel};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data_loading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Hit,
    Miss,
    Open,
}

// One report row per insight.
#[derive(Debug, Serialize)]
pub struct InsightRow {
    pub id: u64,
    pub symbol: String,
    pub direction: InsightDirection,
    pub magnitude: Option<f64>,
    pub generated: Option<DateTime<Utc>>,
    pub close: Option<DateTime<Utc>>,
    pub cancelled: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestSummary {
    pub lookback: usize,
    pub insights: usize,
    pub up: usize,
    pub down: usize,
    pub cancelled: usize,
    pub hits: usize,
    pub misses: usize,
    pub open: usize,
}

impl BacktestSummary {
    pub fn hit_rate(&self) -> Option<f64> {
        let scored = self.hits + self.misses;
        if scored == 0 {
            None
        } else {
            Some(self.hits as f64 / scored as f64)
        }
    }
}

pub struct Backtest {
    lookback: usize,
    engine: Engine,
    slices: Vec<Slice>,
    last_close: DateTime<Utc>,
}

impl Backtest {
    // The first `lookback` closes are served as history; the rest are replayed.
    pub fn new(
        config: HistoricalAlphaConfig,
        factory: Box<dyn IndicatorFactory>,
        bars: &[TradeBar],
        symbols: &[Symbol],
    ) -> Result<Self> {
        let start = data_loading::warm_up_end(bars, config.lookback)?;
        let (history, replay): (Vec<TradeBar>, Vec<TradeBar>) =
            bars.iter().cloned().partition(|bar| bar.end_time() <= start);
        let last_close = replay.iter().map(TradeBar::end_time).max().unwrap_or(start);

        let model = MarkowitzHistoricalAlphaModel::new(config)?.with_factory(factory);
        let mut engine = Engine::new(Box::new(model), HistoryStore::from_bars(history), start);
        engine.add_securities(symbols)?;

        Ok(Backtest {
            lookback: config.lookback,
            engine,
            slices: data_loading::slices(&replay),
            last_close,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        for slice in &self.slices {
            let insights = self.engine.on_data(slice)?;
            if !insights.is_empty() {
                log::debug!("{} insights at {}", insights.len(), slice.time);
            }
        }
        log::info!(
            "{} replayed {} slices, {} insights",
            self.engine.alpha_name(),
            self.slices.len(),
            self.engine.insights().all().len()
        );
        Ok(())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    // Compares the close at generation time to the close when the insight ended.
    pub fn outcome(&self, insight: &Insight) -> Outcome {
        let (generated, close) = match (insight.generated_time_utc, insight.close_time_utc) {
            (Some(generated), Some(close)) => (generated, close),
            _ => return Outcome::Open,
        };
        if close > self.last_close {
            return Outcome::Open;
        }

        let before = self.price_at(&insight.symbol, generated);
        let after = self.price_at(&insight.symbol, close);
        let (before, after) = match (before, after) {
            (Some(before), Some(after)) => (before, after),
            _ => return Outcome::Open,
        };

        let correct = match insight.direction {
            InsightDirection::Up => after > before,
            InsightDirection::Down => after < before,
            InsightDirection::Flat => after == before,
        };
        if correct {
            Outcome::Hit
        } else {
            Outcome::Miss
        }
    }

    pub fn rows(&self) -> Vec<InsightRow> {
        let ledger = self.engine.insights();
        ledger
            .all()
            .iter()
            .map(|insight| InsightRow {
                id: insight.id,
                symbol: insight.symbol.to_string(),
                direction: insight.direction,
                magnitude: insight.magnitude,
                generated: insight.generated_time_utc,
                close: insight.close_time_utc,
                cancelled: ledger.is_cancelled(insight.id),
                outcome: self.outcome(insight),
            })
            .collect()
    }

    pub fn summary(&self) -> BacktestSummary {
        let mut summary = BacktestSummary {
            lookback: self.lookback,
            cancelled: self.engine.insights().cancelled_count(),
            ..BacktestSummary::default()
        };
        for row in self.rows() {
            summary.insights += 1;
            match row.direction {
                InsightDirection::Up => summary.up += 1,
                InsightDirection::Down => summary.down += 1,
                InsightDirection::Flat => {}
            }
            match row.outcome {
                Outcome::Hit => summary.hits += 1,
                Outcome::Miss => summary.misses += 1,
                Outcome::Open => summary.open += 1,
            }
        }
        summary
    }

    pub fn save_report(&self, output: impl AsRef<Path>) -> Result<()> {
        let file = File::create(output)?;
        let mut writer = csv::Writer::from_writer(file);
        for row in self.rows() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn price_at(&self, symbol: &Symbol, time: DateTime<Utc>) -> Option<f64> {
        self.engine
            .algorithm()
            .history_store()
            .closed_bars(symbol, time)
            .last()
            .map(|bar| bar.close)
    }
}
