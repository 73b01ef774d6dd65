//! User facing settings.
//!
//! Settings hold raw values exactly as a user or a settings file supplied
//! them. Building a filter routes every value through the clamping setters
//! of the filter's config, so out of range input saturates instead of
//! failing. Settings travel as CBOR.

use crate::filter::{
    AntichatterConfig, ColdStartPolicy, ExponentialSmoother, FilterError, FilterKind,
    GeometricMedianReducer, NoiseReductionConfig, PredictiveAntiChatter, SmoothingConfig,
};
use crate::pipeline::{Pipeline, Schedule};
use crate::sample::{Digitizer, MillimeterScale};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SmoothingSettings {
    pub latency: f64,
    /// Restart smoothing after this many milliseconds without a tick.
    /// `None` disables gap detection.
    pub reset_after_gap_ms: Option<u64>,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        SmoothingSettings {
            latency: 2.0,
            reset_after_gap_ms: Some(100),
        }
    }
}

impl SmoothingSettings {
    pub fn config(&self) -> SmoothingConfig {
        let policy = match self.reset_after_gap_ms {
            Some(ms) => ColdStartPolicy::AfterGap(Duration::from_millis(ms)),
            None => ColdStartPolicy::FirstSample,
        };
        let mut config = SmoothingConfig::default();
        config.set_latency(self.latency).set_cold_start(policy);
        config
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AntichatterSettings {
    pub latency: f64,
    pub antichatter_strength: f64,
    pub antichatter_multiplier: f64,
    pub antichatter_offset_x: f64,
    pub antichatter_offset_y: f64,
    pub prediction_enabled: bool,
    pub prediction_strength: f64,
    pub prediction_sharpness: f64,
    pub prediction_offset_x: f64,
    pub prediction_offset_y: f64,
}

impl Default for AntichatterSettings {
    fn default() -> Self {
        let config = AntichatterConfig::default();
        AntichatterSettings {
            latency: config.latency(),
            antichatter_strength: config.strength(),
            antichatter_multiplier: config.multiplier(),
            antichatter_offset_x: config.offset_x(),
            antichatter_offset_y: config.offset_y(),
            prediction_enabled: config.prediction_enabled(),
            prediction_strength: config.prediction_strength(),
            prediction_sharpness: config.prediction_sharpness(),
            prediction_offset_x: config.prediction_offset_x(),
            prediction_offset_y: config.prediction_offset_y(),
        }
    }
}

impl AntichatterSettings {
    pub fn config(&self) -> AntichatterConfig {
        let mut config = AntichatterConfig::default();
        config
            .set_latency(self.latency)
            .set_strength(self.antichatter_strength)
            .set_multiplier(self.antichatter_multiplier)
            .set_offset_x(self.antichatter_offset_x)
            .set_offset_y(self.antichatter_offset_y)
            .set_prediction_enabled(self.prediction_enabled)
            .set_prediction_strength(self.prediction_strength)
            .set_prediction_sharpness(self.prediction_sharpness)
            .set_prediction_offset_x(self.prediction_offset_x)
            .set_prediction_offset_y(self.prediction_offset_y);
        config
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NoiseReductionSettings {
    pub samples: i64,
    pub distance_threshold: f64,
}

impl Default for NoiseReductionSettings {
    fn default() -> Self {
        NoiseReductionSettings {
            samples: 10,
            distance_threshold: 0.5,
        }
    }
}

impl NoiseReductionSettings {
    pub fn config(&self) -> NoiseReductionConfig {
        let mut config = NoiseReductionConfig::default();
        config
            .set_samples(self.samples)
            .set_distance_threshold(self.distance_threshold);
        config
    }
}

/// Settings for a single pipeline stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Filter")]
pub enum FilterSettings {
    Smoothing(SmoothingSettings),
    Antichatter(AntichatterSettings),
    NoiseReduction(NoiseReductionSettings),
}

impl FilterSettings {
    /// Builds the filter for a stream sampled at `frequency` Hz.
    pub fn build(&self, frequency: f64) -> Result<FilterKind, FilterError> {
        Ok(match self {
            FilterSettings::Smoothing(s) => {
                ExponentialSmoother::new(s.config(), frequency)?.into()
            }
            FilterSettings::Antichatter(s) => {
                PredictiveAntiChatter::new(s.config(), frequency)?.into()
            }
            FilterSettings::NoiseReduction(s) => {
                GeometricMedianReducer::new(s.config()).into()
            }
        })
    }
}

/// Everything needed to attach a filter pipeline to a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineSettings {
    /// Report rate, or timer rate for `Schedule::Timer`, in Hz.
    pub frequency: f64,
    /// Device geometry; samples are taken to already be in millimeters
    /// when absent.
    #[serde(default)]
    pub digitizer: Option<Digitizer>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub stages: Vec<FilterSettings>,
}

impl PipelineSettings {
    pub fn from_cbor(bytes: &[u8]) -> Result<PipelineSettings, FilterError> {
        Ok(serde_cbor::from_slice(bytes)?)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, FilterError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn build(&self) -> Result<Pipeline, FilterError> {
        let scale = match self.digitizer {
            Some(ref digitizer) => MillimeterScale::from_digitizer(digitizer)?,
            None => MillimeterScale::identity(),
        };
        let stages = self
            .stages
            .iter()
            .map(|stage| stage.build(self.frequency))
            .collect::<Result<Vec<_>, _>>()?;
        Pipeline::new(scale, self.frequency, self.schedule, stages)
    }
}
