//! Neural branch predictor simulation core library.
//!
//! Models the direction-prediction path of a processor front end: a scaled
//! neural predictor voting over folded global history, and a
//! difficulty-aware hybrid that keeps easy branches on a cheap baseline
//! predictor. Branch events are fed one at a time, prediction strictly
//! before resolution; every structure is bounded by construction-time
//! configuration, so predict and update run in input-independent time.

pub mod bp;
pub mod config;
pub mod stats;

pub use bp::{Branch, BranchPredictor, GSharePredictor, HybridPredictor, SnpPredictor};
pub use config::{HybridConfig, SnpConfig};
pub use stats::DispatchStats;
