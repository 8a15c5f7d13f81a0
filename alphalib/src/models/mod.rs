pub mod alpha_model;
pub mod insight;
pub mod insight_collection;
pub mod symbol_data;

pub use alpha_model::*;
pub use insight::*;
pub use insight_collection::*;
pub use symbol_data::*;
