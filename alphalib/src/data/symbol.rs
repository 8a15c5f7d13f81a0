use std::fmt;

use serde::{Deserialize, Serialize};

/// A tradable instrument, identified by its ticker (e.g. `EUR_USD`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(ticker: impl Into<String>) -> Self {
        Symbol(ticker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(ticker: &str) -> Self {
        Symbol::new(ticker)
    }
}

impl From<String> for Symbol {
    fn from(ticker: String) -> Self {
        Symbol(ticker)
    }
}
