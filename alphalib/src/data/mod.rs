pub mod bar;
pub mod history;
pub mod resolution;
pub mod slice;
pub mod symbol;

pub use bar::*;
pub use history::*;
pub use resolution::*;
pub use slice::*;
pub use symbol::*;
