use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::{shared, RateOfChange, SharedIndicator};

/// Which return estimator an alpha model should build for each symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorPref {
    #[serde(alias = "Constrained")]
    Constrained,
    #[serde(alias = "clippedEigen", alias = "ClippedEigen")]
    ClippedEigen,
    #[serde(alias = "Oracle")]
    Oracle,
    #[serde(alias = "CV", alias = "Cv")]
    Cv,
    #[default]
    #[serde(alias = "cvClipping", alias = "CvClipping")]
    CvClipping,
}

impl IndicatorPref {
    pub fn display_name(self) -> &'static str {
        match self {
            IndicatorPref::Constrained => "Constrained",
            IndicatorPref::ClippedEigen => "ClippedEigen",
            IndicatorPref::Oracle => "Oracle",
            IndicatorPref::Cv => "CV",
            IndicatorPref::CvClipping => "Cv Clipping",
        }
    }
}

impl fmt::Display for IndicatorPref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

pub trait IndicatorFactory {
    fn create(&self, pref: IndicatorPref, lookback: usize) -> SharedIndicator;
}

type IndicatorBuilder = Box<dyn Fn(&str, usize) -> SharedIndicator>;

/// Maps each preference to a builder. Preferences nobody registered fall back
/// to a plain historical return over the lookback.
#[derive(Default)]
pub struct IndicatorRegistry {
    builders: HashMap<IndicatorPref, IndicatorBuilder>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        IndicatorRegistry::default()
    }

    pub fn register<F>(mut self, pref: IndicatorPref, builder: F) -> Self
    where
        F: Fn(&str, usize) -> SharedIndicator + 'static,
    {
        self.builders.insert(pref, Box::new(builder));
        self
    }

    pub fn is_registered(&self, pref: IndicatorPref) -> bool {
        self.builders.contains_key(&pref)
    }
}

impl IndicatorFactory for IndicatorRegistry {
    fn create(&self, pref: IndicatorPref, lookback: usize) -> SharedIndicator {
        match self.builders.get(&pref) {
            Some(builder) => builder(pref.display_name(), lookback),
            None => {
                log::debug!(
                    "No estimator registered for {}, using historical rate of change",
                    pref
                );
                shared(RateOfChange::new(pref.display_name(), lookback))
            }
        }
    }
}

impl fmt::Debug for IndicatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("IndicatorRegistry")
            .field("registered", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}
