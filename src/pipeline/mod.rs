//! Chains filters into a pipeline attached to one device.
//!
//! A pipeline converts incoming reports to millimeters, runs them through
//! its stages in order and converts the result back to device units. How
//! often the stages run is up to the `Schedule`:
//!
//! - `PerReport` filters each report as it arrives.
//! - `Timer` only records reports as they arrive; the filter advances on
//!   every timer tick instead, which lets smoothing interpolate between
//!   device reports at a steady output rate. Ticks stop producing output
//!   once no report arrived for the proximity timeout, i.e. the pen left
//!   the tablet.

use crate::filter::{Filter, FilterError, FilterKind};
use crate::sample::{MillimeterScale, Sample};
use crate::util::math::timer_interval;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Nodes that drive a pipeline from crossbeam channels
pub mod pipeline_node;

/// Time without reports after which a timer pipeline treats the pen as out
/// of range.
pub const PROXIMITY_TIMEOUT: Duration = Duration::from_millis(100);

/// When the stages of a pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Schedule {
    /// Once per device report.
    PerReport,
    /// Once per timer tick at the pipeline frequency, on the latest report.
    Timer,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::PerReport
    }
}

/// An ordered chain of filter stages with unit conversion at both ends.
#[derive(Clone, Debug)]
pub struct Pipeline {
    scale: MillimeterScale,
    frequency: f64,
    schedule: Schedule,
    stages: Vec<FilterKind>,
    latest: Option<Sample>,
    last_report: Option<Instant>,
    proximity_timeout: Duration,
}

impl Pipeline {
    /// Creates a pipeline for a device with the given scale, running at
    /// `frequency` Hz.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Instant;
    /// use tablet_filters::filter::{ExponentialSmoother, SmoothingConfig};
    /// use tablet_filters::pipeline::{Pipeline, Schedule};
    /// use tablet_filters::sample::{MillimeterScale, Sample};
    ///
    /// let smoother = ExponentialSmoother::new(SmoothingConfig::default(), 250.0).unwrap();
    /// let mut pipeline = Pipeline::new(
    ///     MillimeterScale::identity(),
    ///     250.0,
    ///     Schedule::PerReport,
    ///     vec![smoother.into()],
    /// )
    /// .unwrap();
    ///
    /// let report = Sample::at(100.0, 50.0);
    /// assert_eq!(pipeline.consume(report, Instant::now()), Some(report));
    /// ```
    pub fn new(
        scale: MillimeterScale,
        frequency: f64,
        schedule: Schedule,
        stages: Vec<FilterKind>,
    ) -> Result<Pipeline, FilterError> {
        timer_interval(frequency)?;
        Ok(Pipeline {
            scale,
            frequency,
            schedule,
            stages,
            latest: None,
            last_report: None,
            proximity_timeout: PROXIMITY_TIMEOUT,
        })
    }

    pub fn scale(&self) -> MillimeterScale {
        self.scale
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Time between timer ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency)
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn stages(&self) -> &[FilterKind] {
        &self.stages
    }

    pub fn proximity_timeout(&self) -> Duration {
        self.proximity_timeout
    }

    /// Sets how long `tick` keeps emitting after the last report.
    pub fn set_proximity_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.proximity_timeout = timeout;
        self
    }

    /// Handles a device report according to the schedule. Returns the
    /// filtered report for `PerReport`; `Timer` pipelines emit from `tick`.
    pub fn consume(&mut self, report: Sample, now: Instant) -> Option<Sample> {
        match self.schedule {
            Schedule::PerReport => Some(self.filter(report, now)),
            Schedule::Timer => {
                self.observe(report, now);
                None
            }
        }
    }

    /// Runs a report through every stage immediately.
    pub fn filter(&mut self, report: Sample, now: Instant) -> Sample {
        let mut sample = self.scale.to_millimeters(report);
        for stage in self.stages.iter_mut() {
            sample = stage.consume(sample, now);
        }
        self.latest = Some(sample);
        self.scale.from_millimeters(sample)
    }

    /// Records a report received at `now` for the next tick.
    pub fn observe(&mut self, report: Sample, now: Instant) {
        let sample = self.scale.to_millimeters(report);
        if let Some(head) = self.stages.first_mut() {
            head.set_target(sample);
        }
        self.latest = Some(sample);
        self.last_report = Some(now);
    }

    /// Advances the first stage by one tick and runs its output through the
    /// remaining stages.
    ///
    /// Nothing is emitted before the first report, nor while the pen is out
    /// of range. Stages are not stepped in that case either, so a smoother
    /// sees the gap once reports resume.
    pub fn tick(&mut self, now: Instant) -> Option<Sample> {
        let latest = self.latest?;
        let last_report = self.last_report?;
        if now.saturating_duration_since(last_report) > self.proximity_timeout {
            return None;
        }
        let sample = match self.stages.split_first_mut() {
            Some((head, rest)) => rest
                .iter_mut()
                .fold(head.step(now), |sample, stage| stage.consume(sample, now)),
            None => latest,
        };
        Some(self.scale.from_millimeters(sample))
    }

    /// Returns every stage to its cold state, e.g. when the pen leaves
    /// proximity or the device is detached.
    pub fn reset(&mut self) {
        debug!("resetting {} pipeline stages", self.stages.len());
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
        self.latest = None;
        self.last_report = None;
    }
}
