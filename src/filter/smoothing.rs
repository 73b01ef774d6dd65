//! Single-pole exponential smoothing.
//!
//! Every tick the output moves a fixed fraction of the way toward the latest
//! sample. The fraction is derived from the configured latency so that the
//! output reaches 63% of a step input after `latency` milliseconds, whatever
//! the sampling rate. Pressure is smoothed along with the position as a
//! third, unscaled axis.

use crate::filter::{Filter, FilterError};
use crate::sample::Sample;
use crate::util::math::{convergence_weight, saturate, timer_interval};
use log::debug;
use std::time::{Duration, Instant};

/// Fraction of a step input reached after `latency` milliseconds.
pub const SMOOTHING_THRESHOLD: f64 = 0.63;

/// Default latency in milliseconds.
pub const DEFAULT_LATENCY: f64 = 2.0;

/// Largest latency accepted, in milliseconds.
pub const MAX_LATENCY: f64 = 1000.0;

/// Decides when the smoother forgets its history and passes the next sample
/// straight through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColdStartPolicy {
    /// Only the very first sample after creation or `reset` is a cold start.
    FirstSample,
    /// Additionally restart when more than the given time passed since the
    /// previous tick, e.g. after the pen left proximity.
    AfterGap(Duration),
}

impl Default for ColdStartPolicy {
    fn default() -> Self {
        ColdStartPolicy::AfterGap(Duration::from_millis(100))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SmoothingConfig {
    latency: f64,
    cold_start: ColdStartPolicy,
}

impl SmoothingConfig {
    pub fn latency(&self) -> f64 {
        self.latency
    }

    /// Sets the latency in milliseconds, clamped to [0, 1000].
    pub fn set_latency(&mut self, latency: f64) -> &mut Self {
        self.latency = saturate("latency", latency, 0.0, MAX_LATENCY);
        self
    }

    pub fn cold_start(&self) -> ColdStartPolicy {
        self.cold_start
    }

    pub fn set_cold_start(&mut self, policy: ColdStartPolicy) -> &mut Self {
        self.cold_start = policy;
        self
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            latency: DEFAULT_LATENCY,
            cold_start: ColdStartPolicy::default(),
        }
    }
}

/// Exponential low-pass filter over position and pressure.
#[derive(Clone, Debug)]
pub struct ExponentialSmoother {
    config: SmoothingConfig,
    weight: f64,
    target: Sample,
    last: Option<Sample>,
    last_update: Option<Instant>,
}

impl ExponentialSmoother {
    /// Creates a smoother for a stream sampled at `frequency` Hz.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Instant;
    /// use tablet_filters::filter::{ExponentialSmoother, Filter, SmoothingConfig};
    /// use tablet_filters::sample::Sample;
    ///
    /// let mut config = SmoothingConfig::default();
    /// config.set_latency(20.0);
    /// let mut smoother = ExponentialSmoother::new(config, 1000.0).unwrap();
    ///
    /// let now = Instant::now();
    /// assert_eq!(smoother.consume(Sample::at(0.0, 0.0), now), Sample::at(0.0, 0.0));
    /// let out = smoother.consume(Sample::at(10.0, 0.0), now);
    /// assert!(out.position.x > 0.0 && out.position.x < 10.0);
    /// ```
    pub fn new(
        config: SmoothingConfig,
        frequency: f64,
    ) -> Result<ExponentialSmoother, FilterError> {
        let interval = timer_interval(frequency)?;
        let weight =
            convergence_weight(config.latency, interval, SMOOTHING_THRESHOLD);
        Ok(ExponentialSmoother {
            config,
            weight,
            target: Sample::default(),
            last: None,
            last_update: None,
        })
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Fraction of the remaining gap applied per tick.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    fn is_cold(&self, now: Instant) -> bool {
        if self.last.is_none() {
            return true;
        }
        match (self.config.cold_start, self.last_update) {
            (ColdStartPolicy::AfterGap(gap), Some(last)) => {
                now.saturating_duration_since(last) > gap
            }
            (ColdStartPolicy::AfterGap(_), None) => true,
            (ColdStartPolicy::FirstSample, _) => false,
        }
    }
}

impl Filter for ExponentialSmoother {
    fn set_target(&mut self, sample: Sample) {
        self.target = sample;
    }

    fn step(&mut self, now: Instant) -> Sample {
        let cold = self.is_cold(now);
        self.last_update = Some(now);
        let mut last = match self.last {
            Some(last) if !cold => last,
            _ => {
                debug!("smoothing cold start at {:?}", self.target.position);
                self.last = Some(self.target);
                return self.target;
            }
        };

        if self.weight >= 1.0 {
            last = self.target;
        } else {
            last.position += (self.target.position - last.position) * self.weight;
            last.pressure += (self.target.pressure - last.pressure) * self.weight;
        }
        self.last = Some(last);
        last
    }

    fn reset(&mut self) {
        self.last = None;
        self.last_update = None;
    }
}
