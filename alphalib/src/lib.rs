pub mod config;
pub mod data;
pub mod errors;
pub mod host;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod oanda;

pub use errors::AlphaError;
