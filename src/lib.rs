//! Pen report filters for graphics tablets.
//!
//! Raw digitizer reports jitter. The filters in this crate trade a little
//! latency for a steadier cursor:
//!
//! - `filter::ExponentialSmoother` removes high frequency noise with a
//!   latency expressed in milliseconds.
//! - `filter::PredictiveAntiChatter` smooths hard while the pen hovers in
//!   place and backs off as it moves, optionally predicting ahead to win
//!   back some latency.
//! - `filter::GeometricMedianReducer` snaps small tremors to the geometric
//!   median of the recent reports and resets on large moves.
//!
//! Filters are chained into a `pipeline::Pipeline`, which can in turn be
//! wrapped in a node and run in its own thread, fed over crossbeam channels.

extern crate self as tablet_filters;

#[macro_use]
pub mod node;
pub mod config;
pub mod filter;
pub mod pipeline;
pub mod prelude;
pub mod sample;
pub mod util;

pub use crossbeam::channel;
