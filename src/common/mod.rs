//! Numeric helpers shared by indicators and signal logic.

pub mod math;
