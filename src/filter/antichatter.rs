//! Velocity dependent smoothing with short-horizon prediction.
//!
//! The smoothing weight follows
//!
//! ```text
//! y(d) = (d + OffsetX)^(-Strength) * Multiplier + OffsetY
//! weight = baseWeight / y(d)
//! ```
//!
//! where `d` is the distance between the smoothed position and the target.
//! A resting pen produces tiny distances, so `y` explodes and the weight
//! collapses toward zero: chatter is smoothed away. Deliberate strokes
//! produce large distances and pass through almost untouched.
//!
//! Prediction pushes the target further along the last movement to win back
//! the lag smoothing introduces:
//!
//! ```text
//! p(v) = sech((v - PredictionOffsetX) * Sharpness) * Strength + PredictionOffsetY
//! target = raw + (raw - previousRaw) * p(v)
//! ```
//!
//! The gain peaks at `PredictionOffsetX` mm per report and tapers off for
//! both slower and faster movement.

use crate::filter::{Filter, FilterError};
use crate::sample::{Point, Sample};
use crate::util::math::{convergence_weight, saturate, sech, timer_interval};
use log::{debug, trace};
use std::time::Instant;

/// Fraction of a step reached after `latency` ms with no antichatter boost.
pub const ANTICHATTER_THRESHOLD: f64 = 0.9;

/// Antichatter and prediction tuning.
///
/// Latency is clamped to [0, 1000] ms. The curve parameters have no natural
/// range and are stored as given, except that NaN and infinities are
/// ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct AntichatterConfig {
    latency: f64,
    strength: f64,
    multiplier: f64,
    offset_x: f64,
    offset_y: f64,
    prediction_enabled: bool,
    prediction_strength: f64,
    prediction_sharpness: f64,
    prediction_offset_x: f64,
    prediction_offset_y: f64,
}

macro_rules! curve_parameter {
    ($get:ident, $set:ident, $doc:literal) => {
        #[doc = $doc]
        pub fn $get(&self) -> f64 {
            self.$get
        }

        pub fn $set(&mut self, value: f64) -> &mut Self {
            if value.is_finite() {
                self.$get = value;
            } else {
                trace!("ignoring non-finite {} {}", stringify!($get), value);
            }
            self
        }
    };
}

impl AntichatterConfig {
    pub fn latency(&self) -> f64 {
        self.latency
    }

    /// Sets the latency in milliseconds, clamped to [0, 1000].
    pub fn set_latency(&mut self, latency: f64) -> &mut Self {
        self.latency = saturate("latency", latency, 0.0, 1000.0);
        self
    }

    curve_parameter!(strength, set_strength, "Steepness of the antichatter curve.");
    curve_parameter!(multiplier, set_multiplier, "Vertical zoom of the antichatter curve.");
    curve_parameter!(offset_x, set_offset_x, "Shifts the antichatter curve along the speed axis.");
    curve_parameter!(offset_y, set_offset_y, "Minimum amount of antichatter smoothing.");
    curve_parameter!(prediction_strength, set_prediction_strength, "Peak prediction gain.");
    curve_parameter!(prediction_sharpness, set_prediction_sharpness, "Narrows the prediction peak.");
    curve_parameter!(prediction_offset_x, set_prediction_offset_x, "Speed at which prediction peaks.");
    curve_parameter!(prediction_offset_y, set_prediction_offset_y, "Minimum prediction gain.");

    pub fn prediction_enabled(&self) -> bool {
        self.prediction_enabled
    }

    pub fn set_prediction_enabled(&mut self, enabled: bool) -> &mut Self {
        self.prediction_enabled = enabled;
        self
    }
}

impl Default for AntichatterConfig {
    fn default() -> Self {
        AntichatterConfig {
            latency: 2.0,
            strength: 3.0,
            multiplier: 1.0,
            offset_x: 0.0,
            offset_y: 1.0,
            prediction_enabled: false,
            prediction_strength: 1.1,
            prediction_sharpness: 1.0,
            prediction_offset_x: 3.0,
            prediction_offset_y: 0.3,
        }
    }
}

/// Smoother whose strength depends on pen speed, plus optional prediction.
#[derive(Clone, Debug)]
pub struct PredictiveAntiChatter {
    config: AntichatterConfig,
    base_weight: f64,
    position: Option<Point>,
    prev_raw: Option<Point>,
    target: Sample,
}

impl PredictiveAntiChatter {
    pub fn new(
        config: AntichatterConfig,
        frequency: f64,
    ) -> Result<PredictiveAntiChatter, FilterError> {
        let interval = timer_interval(frequency)?;
        let base_weight =
            convergence_weight(config.latency, interval, ANTICHATTER_THRESHOLD);
        Ok(PredictiveAntiChatter {
            config,
            base_weight,
            position: None,
            prev_raw: None,
            target: Sample::default(),
        })
    }

    pub fn config(&self) -> &AntichatterConfig {
        &self.config
    }

    /// Weight applied with no antichatter modification.
    pub fn base_weight(&self) -> f64 {
        self.base_weight
    }

    /// The target the next step moves toward, after prediction.
    pub fn target(&self) -> Sample {
        self.target
    }

    /// Fraction of the gap closed in one step when the smoothed position is
    /// `distance` mm away from the target.
    ///
    /// A curve that is undefined at `distance` (a negative base raised to a
    /// fractional power) is treated like an infinitely steep one: no
    /// movement at all.
    pub fn weight_at(&self, distance: f64) -> f64 {
        let c = &self.config;
        let mut modifier = (distance + c.offset_x).powf(-c.strength) * c.multiplier;
        if modifier + c.offset_y < 0.0 {
            modifier = 0.0;
        } else {
            modifier += c.offset_y;
        }
        let weight = self.base_weight / modifier;
        if weight.is_nan() {
            0.0
        } else {
            num_traits::clamp(weight, 0.0, 1.0)
        }
    }

    /// Gain applied to the last movement when predicting, for a movement of
    /// `distance` mm between reports.
    pub fn prediction_gain(&self, distance: f64) -> f64 {
        let c = &self.config;
        sech((distance - c.prediction_offset_x) * c.prediction_sharpness)
            * c.prediction_strength
            + c.prediction_offset_y
    }

    fn predict(&mut self, raw: Point) -> Point {
        let prev = match self.prev_raw {
            Some(prev) if prev != raw => prev,
            Some(_) => return raw,
            None => {
                self.prev_raw = Some(raw);
                return raw;
            }
        };
        let delta = raw - prev;
        self.prev_raw = Some(raw);
        raw + delta * self.prediction_gain(delta.length())
    }
}

impl Filter for PredictiveAntiChatter {
    fn set_target(&mut self, sample: Sample) {
        let position = if self.config.prediction_enabled {
            self.predict(sample.position)
        } else {
            sample.position
        };
        self.target = sample.with_position(position);
    }

    fn step(&mut self, _now: Instant) -> Sample {
        let position = match self.position {
            Some(position) => position,
            None => {
                debug!("antichatter cold start at {:?}", self.target.position);
                self.position = Some(self.target.position);
                return self.target;
            }
        };

        let delta = self.target.position - position;
        let weight = self.weight_at(delta.length());
        let position = position + delta * weight;
        self.position = Some(position);
        self.target.with_position(position)
    }

    fn reset(&mut self) {
        self.position = None;
        self.prev_raw = None;
    }
}
