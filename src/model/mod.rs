pub mod catalog;
pub mod score;
pub mod types;

pub use catalog::*;
pub use score::*;
pub use types::*;
