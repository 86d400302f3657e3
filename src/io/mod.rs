//! Output helpers.
//!
//! - aligned dataset + spreads to CSV (`export`)
//! - analysis summary to JSON (`summary`)

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
