//! Positional filters for digitizer input.
//!
//! All filters work on millimeter samples and share one contract: a sample
//! arrives (`set_target`), the filter advances one tick (`step`) and hands
//! back the filtered sample. Filters driven directly by device reports call
//! both at once through `consume`; timer-driven schedules call `set_target`
//! whenever a report arrives and `step` once per timer tick.

use crate::pipeline::Schedule;
use crate::sample::{Digitizer, Sample};
use std::time::Instant;
use thiserror::Error;

/// Velocity dependent smoothing with optional motion prediction
pub mod antichatter;
/// Geometric median noise reduction over a ring buffer of samples
pub mod noise_reduction;
/// Single-pole exponential smoothing
pub mod smoothing;

pub use self::antichatter::{AntichatterConfig, PredictiveAntiChatter};
pub use self::noise_reduction::{GeometricMedianReducer, NoiseReductionConfig};
pub use self::smoothing::{ColdStartPolicy, ExponentialSmoother, SmoothingConfig};

/// Errors raised while attaching a filter to a pipeline.
///
/// Nothing fails once a filter is running; out of range parameters are
/// clamped when they are assigned.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Sampling frequency must be positive and finite, got {0} Hz")]
    InvalidFrequency(f64),

    #[error("Digitizer size and resolution must be positive, got {0:?}")]
    InvalidDigitizer(Digitizer),

    #[error("A {0:?} pipeline cannot drive this node")]
    UnsupportedSchedule(Schedule),

    #[error("Invalid filter settings: {0}")]
    Settings(String),
}

impl From<serde_cbor::Error> for FilterError {
    fn from(err: serde_cbor::Error) -> Self {
        FilterError::Settings(err.to_string())
    }
}

/// The capability shared by every filter: take one sample, produce one.
pub trait Filter {
    /// Records the most recent sample as the filter's target.
    fn set_target(&mut self, sample: Sample);

    /// Advances one tick toward the current target and returns the filtered
    /// sample.
    fn step(&mut self, now: Instant) -> Sample;

    /// Drops all state; the next sample is a cold start.
    fn reset(&mut self);

    /// Filters a single report as it arrives.
    fn consume(&mut self, sample: Sample, now: Instant) -> Sample {
        self.set_target(sample);
        self.step(now)
    }
}

/// The closed set of filters a pipeline stage can hold.
#[derive(Clone, Debug)]
pub enum FilterKind {
    Smoothing(ExponentialSmoother),
    Antichatter(PredictiveAntiChatter),
    NoiseReduction(GeometricMedianReducer),
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Smoothing(_) => "smoothing",
            FilterKind::Antichatter(_) => "antichatter",
            FilterKind::NoiseReduction(_) => "noise reduction",
        }
    }
}

impl Filter for FilterKind {
    fn set_target(&mut self, sample: Sample) {
        match self {
            FilterKind::Smoothing(f) => f.set_target(sample),
            FilterKind::Antichatter(f) => f.set_target(sample),
            FilterKind::NoiseReduction(f) => f.set_target(sample),
        }
    }

    fn step(&mut self, now: Instant) -> Sample {
        match self {
            FilterKind::Smoothing(f) => f.step(now),
            FilterKind::Antichatter(f) => f.step(now),
            FilterKind::NoiseReduction(f) => f.step(now),
        }
    }

    fn reset(&mut self) {
        match self {
            FilterKind::Smoothing(f) => f.reset(),
            FilterKind::Antichatter(f) => f.reset(),
            FilterKind::NoiseReduction(f) => f.reset(),
        }
    }
}

impl From<ExponentialSmoother> for FilterKind {
    fn from(filter: ExponentialSmoother) -> Self {
        FilterKind::Smoothing(filter)
    }
}

impl From<PredictiveAntiChatter> for FilterKind {
    fn from(filter: PredictiveAntiChatter) -> Self {
        FilterKind::Antichatter(filter)
    }
}

impl From<GeometricMedianReducer> for FilterKind {
    fn from(filter: GeometricMedianReducer) -> Self {
        FilterKind::NoiseReduction(filter)
    }
}
