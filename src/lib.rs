//! `spread-stress` library crate.
//!
//! Estimates investment-grade and high-yield credit-spread proxies from bond
//! ETF prices and relates them to a market stress index (VIX): correlation,
//! significance, rolling correlation, and tight/normal/wide regimes.
//!
//! The binary (`spread`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline can be driven by any [`data::MarketDataProvider`]

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
