//! Signal detection and selection logic.

pub mod activity;
pub mod patterns;
pub mod plan;
pub mod scoring;

pub use activity::*;
pub use patterns::*;
pub use plan::*;
pub use scoring::*;
