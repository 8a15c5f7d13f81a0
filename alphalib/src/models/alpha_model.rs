use std::collections::BTreeMap;
use std::fmt;

use chrono::Duration;

use crate::config::{HistoricalAlphaConfig, TradingConfig};
use crate::data::{Resolution, SecurityChanges, Slice, Symbol};
use crate::errors::AlphaError;
use crate::host::Algorithm;
use crate::indicators::{IndicatorFactory, IndicatorPref, IndicatorRegistry};
use crate::models::{Insight, InsightCollection, InsightDirection, SymbolData};

pub const MARKOWITZ_HISTORICAL: &str = "markowitz_historical";

/// Callbacks the host invokes on an alpha model.
pub trait AlphaModel {
    fn name(&self) -> &str;

    /// Called on every data slice; returns the insights generated for it.
    fn update(&mut self, algorithm: &mut dyn Algorithm, data: &Slice) -> Result<Vec<Insight>, AlphaError>;

    /// Called whenever securities are added to or removed from the universe.
    fn on_securities_changed(
        &mut self,
        algorithm: &mut dyn Algorithm,
        changes: &SecurityChanges,
    ) -> Result<(), AlphaError>;
}

/// Builds the alpha model named by `config.model`.
pub fn from_config(
    config: &TradingConfig,
    factory: Box<dyn IndicatorFactory>,
) -> Result<Box<dyn AlphaModel>, AlphaError> {
    match config.model.as_str() {
        MARKOWITZ_HISTORICAL => {
            let model = MarkowitzHistoricalAlphaModel::new(config.historical_alpha()?)?.with_factory(factory);
            Ok(Box::new(model))
        }
        _ => Err(AlphaError::UnknownModel(config.model.clone())),
    }
}

/// Emits a price insight per symbol in the direction of its historical return
/// forecast, as estimated by the configured indicator.
pub struct MarkowitzHistoricalAlphaModel {
    name: String,
    lookback: usize,
    resolution: Resolution,
    indicator: IndicatorPref,
    prediction_interval: Duration,
    symbol_data: BTreeMap<Symbol, SymbolData>,
    insight_collection: InsightCollection,
    factory: Box<dyn IndicatorFactory>,
}

impl MarkowitzHistoricalAlphaModel {
    pub fn new(config: HistoricalAlphaConfig) -> Result<Self, AlphaError> {
        config.validate()?;
        let lookback = i32::try_from(config.lookback).map_err(|_| AlphaError::InvalidLookback(config.lookback))?;

        Ok(MarkowitzHistoricalAlphaModel {
            name: format!(
                "MarkowitzHistoricalAlphaModel({},{},{})",
                config.lookback, config.resolution, config.indicator
            ),
            lookback: config.lookback,
            resolution: config.resolution,
            indicator: config.indicator,
            prediction_interval: config.resolution.to_duration() * lookback,
            symbol_data: BTreeMap::new(),
            insight_collection: InsightCollection::new(),
            factory: Box::new(IndicatorRegistry::new()),
        })
    }

    pub fn with_factory(mut self, factory: Box<dyn IndicatorFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn prediction_interval(&self) -> Duration {
        self.prediction_interval
    }

    pub fn symbol_data(&self, symbol: &Symbol) -> Option<&SymbolData> {
        self.symbol_data.get(symbol)
    }

    pub fn tracked_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbol_data.keys()
    }

    pub fn insight_collection(&self) -> &InsightCollection {
        &self.insight_collection
    }
}

impl AlphaModel for MarkowitzHistoricalAlphaModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, algorithm: &mut dyn Algorithm, _data: &Slice) -> Result<Vec<Insight>, AlphaError> {
        let now = algorithm.time();
        self.insight_collection.remove_expired(now);

        let mut insights = Vec::new();
        for (symbol, symbol_data) in self.symbol_data.iter_mut() {
            if !symbol_data.can_emit() {
                continue;
            }

            let magnitude = symbol_data.current_return();
            let direction = InsightDirection::from_magnitude(magnitude);
            if direction == InsightDirection::Flat {
                cancel_insights(&mut self.insight_collection, algorithm, symbol);
                continue;
            }

            let insight = Insight::price(
                symbol.clone(),
                self.prediction_interval,
                direction,
                Some(magnitude),
                None,
            )
            .with_generated_time(now);
            log::info!("Insight {} ({})", insight, symbol_data);
            insights.push(insight);
        }

        self.insight_collection.add_range(insights.iter().cloned());
        Ok(insights)
    }

    fn on_securities_changed(
        &mut self,
        algorithm: &mut dyn Algorithm,
        changes: &SecurityChanges,
    ) -> Result<(), AlphaError> {
        // clean up data for removed securities; insights are cancelled even
        // when releasing the consolidator fails
        for removed in &changes.removed {
            cancel_insights(&mut self.insight_collection, algorithm, removed);
            if let Some(mut symbol_data) = self.symbol_data.remove(removed) {
                symbol_data.remove_consolidators(algorithm)?;
                log::info!("Stopped tracking {}", removed);
            }
        }

        if changes.added.is_empty() {
            return Ok(());
        }

        let history = algorithm.history(&changes.added, self.lookback, self.resolution)?;
        if history.is_empty() {
            log::warn!("No history for {} added securities", changes.added.len());
            return Ok(());
        }

        // only symbols the history actually covers get state
        for (symbol, bars) in history.iter() {
            if self.symbol_data.contains_key(symbol) {
                continue;
            }

            let indicator = self.factory.create(self.indicator, self.lookback);
            let mut symbol_data = SymbolData::new(symbol.clone(), indicator);
            symbol_data.register_indicators(algorithm, self.resolution)?;
            symbol_data.warm_up_indicators(bars);
            log::info!("Tracking {} warmed up on {} bars", symbol, bars.len());
            self.symbol_data.insert(symbol.clone(), symbol_data);
        }

        Ok(())
    }
}

impl fmt::Display for MarkowitzHistoricalAlphaModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (symbol, symbol_data) in &self.symbol_data {
            write!(f, "\n  {} {}", symbol, symbol_data)?;
        }
        Ok(())
    }
}

fn cancel_insights(collection: &mut InsightCollection, algorithm: &mut dyn Algorithm, symbol: &Symbol) {
    let insights = match collection.get(symbol) {
        Some(insights) => insights,
        None => return,
    };
    log::debug!("Cancelling {} insights for {}", insights.len(), symbol);
    algorithm.cancel_insights(insights);
    collection.clear(&[symbol.clone()]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{History, TradeBar};
    use crate::host::ConsolidatorId;
    use crate::indicators::SharedIndicator;
    use chrono::{DateTime, TimeZone, Utc};

    #[derive(Default)]
    struct MockAlgorithm {
        time: Option<DateTime<Utc>>,
        history: History,
        next_id: u64,
        registered: Vec<(Symbol, ConsolidatorId)>,
        removed: Vec<(Symbol, ConsolidatorId)>,
        cancelled: Vec<Insight>,
        fail_removal: bool,
    }

    impl Algorithm for MockAlgorithm {
        fn time(&self) -> DateTime<Utc> {
            self.time.unwrap_or_else(start)
        }

        fn history(&self, symbols: &[Symbol], lookback: usize, _: Resolution) -> Result<History, AlphaError> {
            let mut history = History::new();
            for symbol in symbols {
                if let Some(bars) = self.history.get(symbol) {
                    let skip = bars.len().saturating_sub(lookback);
                    history.insert(symbol.clone(), bars[skip..].to_vec());
                }
            }
            Ok(history)
        }

        fn resolve_consolidator(&mut self, _: &Symbol, _: Resolution) -> Result<ConsolidatorId, AlphaError> {
            self.next_id += 1;
            Ok(ConsolidatorId(self.next_id))
        }

        fn register_indicator(
            &mut self,
            symbol: &Symbol,
            _: SharedIndicator,
            consolidator: ConsolidatorId,
        ) -> Result<(), AlphaError> {
            self.registered.push((symbol.clone(), consolidator));
            Ok(())
        }

        fn remove_consolidator(&mut self, symbol: &Symbol, consolidator: ConsolidatorId) -> Result<(), AlphaError> {
            if self.fail_removal {
                return Err(AlphaError::UnknownConsolidator {
                    symbol: symbol.clone(),
                    id: consolidator,
                });
            }
            self.removed.push((symbol.clone(), consolidator));
            Ok(())
        }

        fn cancel_insights(&mut self, insights: &[Insight]) {
            self.cancelled.extend_from_slice(insights);
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn daily_bars(ticker: &str, closes: &[f64]) -> Vec<TradeBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| TradeBar {
                symbol: Symbol::new(ticker),
                time: start() + Duration::days(i as i64),
                period: Duration::days(1),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: 0.0,
            })
            .collect()
    }

    fn model(lookback: usize) -> MarkowitzHistoricalAlphaModel {
        MarkowitzHistoricalAlphaModel::new(HistoricalAlphaConfig {
            lookback,
            ..HistoricalAlphaConfig::default()
        })
        .unwrap()
    }

    /// Simulates the host consolidator delivering one more close.
    fn feed(model: &MarkowitzHistoricalAlphaModel, ticker: &str, day: i64, close: f64) {
        let symbol_data = model.symbol_data(&Symbol::new(ticker)).unwrap();
        symbol_data
            .indicator()
            .borrow_mut()
            .update(start() + Duration::days(day), close);
    }

    fn slice() -> Slice {
        Slice::new(start())
    }

    #[test]
    fn prediction_interval_is_resolution_times_lookback() {
        assert_eq!(model(5).prediction_interval(), Duration::days(5));
        let hourly = MarkowitzHistoricalAlphaModel::new(HistoricalAlphaConfig {
            lookback: 3,
            resolution: Resolution::Hour,
            indicator: IndicatorPref::Oracle,
        })
        .unwrap();
        assert_eq!(hourly.prediction_interval(), Duration::hours(3));
        assert_eq!(hourly.name(), "MarkowitzHistoricalAlphaModel(3,hour,Oracle)");
    }

    #[test]
    fn zero_lookback_is_rejected() {
        let result = MarkowitzHistoricalAlphaModel::new(HistoricalAlphaConfig {
            lookback: 0,
            ..HistoricalAlphaConfig::default()
        });
        assert!(matches!(result, Err(AlphaError::InvalidLookback(0))));
    }

    #[test]
    fn empty_history_creates_no_state() {
        let mut algorithm = MockAlgorithm::default();
        let mut model = model(2);

        model
            .on_securities_changed(&mut algorithm, &SecurityChanges::added(vec![Symbol::new("EUR_USD")]))
            .unwrap();

        assert_eq!(model.tracked_symbols().count(), 0);
        assert!(algorithm.registered.is_empty());
    }

    #[test]
    fn only_symbols_with_history_are_tracked() {
        let mut algorithm = MockAlgorithm::default();
        algorithm
            .history
            .insert(Symbol::new("EUR_USD"), daily_bars("EUR_USD", &[1.0, 1.1, 1.2]));
        let mut model = model(2);

        model
            .on_securities_changed(
                &mut algorithm,
                &SecurityChanges::added(vec![Symbol::new("EUR_USD"), Symbol::new("GBP_USD")]),
            )
            .unwrap();

        let tracked: Vec<&Symbol> = model.tracked_symbols().collect();
        assert_eq!(tracked, vec![&Symbol::new("EUR_USD")]);
        assert_eq!(algorithm.registered, vec![(Symbol::new("EUR_USD"), ConsolidatorId(1))]);

        // warmed up with the last `lookback` bars only
        let symbol_data = model.symbol_data(&Symbol::new("EUR_USD")).unwrap();
        assert_eq!(symbol_data.indicator().borrow().samples(), 2);
        assert_eq!(symbol_data.consolidator(), Some(ConsolidatorId(1)));
    }

    #[test]
    fn emits_in_the_direction_of_the_return_once_per_sample() {
        let mut algorithm = MockAlgorithm::default();
        algorithm.history.insert(Symbol::new("EUR_USD"), daily_bars("EUR_USD", &[1.0, 1.1]));
        algorithm.history.insert(Symbol::new("USD_JPY"), daily_bars("USD_JPY", &[150.0, 148.0]));
        let mut model = model(2);
        model
            .on_securities_changed(
                &mut algorithm,
                &SecurityChanges::added(vec![Symbol::new("EUR_USD"), Symbol::new("USD_JPY")]),
            )
            .unwrap();

        // two warm-up samples, indicator needs three
        assert!(model.update(&mut algorithm, &slice()).unwrap().is_empty());

        feed(&model, "EUR_USD", 2, 1.2);
        feed(&model, "USD_JPY", 2, 135.0);
        let insights = model.update(&mut algorithm, &slice()).unwrap();
        assert_eq!(insights.len(), 2);

        let eur = &insights[0];
        assert_eq!(eur.symbol, Symbol::new("EUR_USD"));
        assert_eq!(eur.direction, InsightDirection::Up);
        assert!((eur.magnitude.unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(eur.period, Duration::days(2));
        assert_eq!(eur.close_time_utc, Some(start() + Duration::days(2)));

        let jpy = &insights[1];
        assert_eq!(jpy.direction, InsightDirection::Down);
        assert!((jpy.magnitude.unwrap() + 0.1).abs() < 1e-12);

        // no new sample, nothing new to say
        assert!(model.update(&mut algorithm, &slice()).unwrap().is_empty());
        assert_eq!(model.insight_collection().len(), 2);
    }

    /// Tracks EUR_USD with a one-bar lookback and emits one Up insight from
    /// the first live close.
    fn tracking_eur_usd(algorithm: &mut MockAlgorithm) -> (MarkowitzHistoricalAlphaModel, Vec<Insight>) {
        algorithm.history.insert(Symbol::new("EUR_USD"), daily_bars("EUR_USD", &[1.0, 1.1]));
        let mut model = model(1);
        model
            .on_securities_changed(algorithm, &SecurityChanges::added(vec![Symbol::new("EUR_USD")]))
            .unwrap();

        // a single warm-up close is not enough for a one-bar return
        assert_eq!(model.symbol_data(&Symbol::new("EUR_USD")).unwrap().indicator().borrow().samples(), 1);
        assert!(model.update(algorithm, &slice()).unwrap().is_empty());

        feed(&model, "EUR_USD", 2, 1.21);
        let emitted = model.update(algorithm, &slice()).unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].direction, InsightDirection::Up);
        (model, emitted)
    }

    #[test]
    fn flat_forecast_cancels_outstanding_insights() {
        let mut algorithm = MockAlgorithm::default();
        let (mut model, emitted) = tracking_eur_usd(&mut algorithm);

        feed(&model, "EUR_USD", 3, 1.21);
        let insights = model.update(&mut algorithm, &slice()).unwrap();

        assert!(insights.is_empty());
        assert_eq!(algorithm.cancelled, emitted);
        assert!(!model.insight_collection().contains_key(&Symbol::new("EUR_USD")));

        // a second flat reading has nothing left to cancel
        feed(&model, "EUR_USD", 4, 1.21);
        model.update(&mut algorithm, &slice()).unwrap();
        assert_eq!(algorithm.cancelled.len(), 1);
    }

    #[test]
    fn removal_releases_state_and_cancels() {
        let mut algorithm = MockAlgorithm::default();
        let (mut model, emitted) = tracking_eur_usd(&mut algorithm);
        let eur = Symbol::new("EUR_USD");

        model
            .on_securities_changed(&mut algorithm, &SecurityChanges::removed(vec![eur.clone()]))
            .unwrap();

        assert!(model.symbol_data(&eur).is_none());
        assert_eq!(algorithm.removed, vec![(eur.clone(), ConsolidatorId(1))]);
        assert_eq!(algorithm.cancelled, emitted);
        assert!(model.insight_collection().is_empty());

        // removing a symbol that was never tracked is harmless
        model
            .on_securities_changed(&mut algorithm, &SecurityChanges::removed(vec![Symbol::new("GBP_USD")]))
            .unwrap();
        assert_eq!(algorithm.removed.len(), 1);
    }

    #[test]
    fn failed_release_still_cancels_insights() {
        let mut algorithm = MockAlgorithm::default();
        let (mut model, emitted) = tracking_eur_usd(&mut algorithm);
        algorithm.fail_removal = true;

        let result = model.on_securities_changed(&mut algorithm, &SecurityChanges::removed(vec![Symbol::new("EUR_USD")]));

        assert!(matches!(result, Err(AlphaError::UnknownConsolidator { .. })));
        assert_eq!(algorithm.cancelled, emitted);
        assert!(model.insight_collection().is_empty());
    }

    #[test]
    fn re_adding_a_tracked_symbol_keeps_its_state() {
        let mut algorithm = MockAlgorithm::default();
        let (mut model, _) = tracking_eur_usd(&mut algorithm);
        let changes = SecurityChanges::added(vec![Symbol::new("EUR_USD")]);

        model.on_securities_changed(&mut algorithm, &changes).unwrap();

        // no second registration and no second warm-up
        assert_eq!(algorithm.registered.len(), 1);
        let symbol_data = model.symbol_data(&Symbol::new("EUR_USD")).unwrap();
        assert_eq!(symbol_data.indicator().borrow().samples(), 2);
        assert!(model.update(&mut algorithm, &slice()).unwrap().is_empty());
    }

    #[test]
    fn from_config_selects_model_by_name() {
        let config = TradingConfig::from_json(
            r#"{ "instruments": ["EUR_USD"], "model": "markowitz_historical", "modelConfig": { "lookback": 4 } }"#,
        )
        .unwrap();
        let model = from_config(&config, Box::new(IndicatorRegistry::new())).unwrap();
        assert_eq!(model.name(), "MarkowitzHistoricalAlphaModel(4,daily,Cv Clipping)");

        let unknown = TradingConfig::from_json(r#"{ "instruments": ["EUR_USD"], "model": "random" }"#).unwrap();
        assert!(matches!(
            from_config(&unknown, Box::new(IndicatorRegistry::new())),
            Err(AlphaError::UnknownModel(name)) if name == "random"
        ));
    }
}
