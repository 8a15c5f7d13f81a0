pub mod candles;
pub use candles::*;

pub mod objects;

pub mod helpers;

pub mod errors;
pub use errors::OandaError;
