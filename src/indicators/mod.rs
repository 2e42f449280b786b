//! Indicator library.
//!
//! Every function is fail-soft: with too little history it returns `None`
//! rather than a numeric default.

pub mod momentum;
pub mod series;
pub mod strength;
pub mod trend;

pub use momentum::*;
pub use series::*;
pub use strength::*;
pub use trend::*;
