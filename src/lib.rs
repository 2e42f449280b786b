//! candlescope: daily candle analytics, screening and signal lifecycle tracking.

pub mod cache;
pub mod common;
pub mod config;
pub mod core;
pub mod db;
pub mod engine;
pub mod indicators;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
