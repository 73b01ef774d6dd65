//! Noise reduction around the geometric median of recent samples.
//!
//! The last `Samples` positions are kept in a ring buffer. While the newest
//! sample stays within `DistanceThreshold` of the buffer's geometric median
//! the median is emitted, which removes jitter without the drift an average
//! shows around outliers. Beyond the threshold the buffer is pulled toward
//! the new sample, linearly more the faster the pen moves, until at twice
//! the threshold the buffer is simply refilled with the sample and filtering
//! adds no lag at all.

use crate::filter::Filter;
use crate::sample::{Point, Sample};
use crate::util::math::saturate;
use crate::util::ring_buffer::RingBuffer;
use log::debug;
use std::time::Instant;

/// Weiszfeld iterations per median.
pub const MEDIAN_ITERATIONS: usize = 10;

/// Distances below this are treated as this, keeping the weights finite
/// when the candidate lands on a buffered point.
pub const MIN_DISTANCE: f64 = 0.001;

/// Largest buffer accepted.
pub const MAX_SAMPLES: usize = 20;

/// Largest distance threshold accepted, in millimeters.
pub const MAX_DISTANCE_THRESHOLD: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseReductionConfig {
    samples: usize,
    distance_threshold: f64,
}

impl NoiseReductionConfig {
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Sets the buffer length, clamped to [0, 20].
    pub fn set_samples(&mut self, samples: i64) -> &mut Self {
        self.samples = num_traits::clamp(samples, 0, MAX_SAMPLES as i64) as usize;
        self
    }

    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }

    /// Sets the threshold in millimeters, clamped to [0, 10].
    pub fn set_distance_threshold(&mut self, threshold: f64) -> &mut Self {
        self.distance_threshold = saturate(
            "distance threshold",
            threshold,
            0.0,
            MAX_DISTANCE_THRESHOLD,
        );
        self
    }

    /// Distance at which filtering stops entirely.
    pub fn distance_max(&self) -> f64 {
        self.distance_threshold * 2.0
    }
}

impl Default for NoiseReductionConfig {
    fn default() -> Self {
        NoiseReductionConfig {
            samples: 10,
            distance_threshold: 0.5,
        }
    }
}

/// Geometric median of `points` using Weiszfeld's algorithm.
///
/// Starts from the arithmetic mean and runs a fixed number of reweighting
/// iterations. Returns `None` for an empty set.
///
/// # Examples
///
/// ```
/// use tablet_filters::filter::noise_reduction::geometric_median;
/// use tablet_filters::sample::Point;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(0.0, 0.1),
///     Point::new(0.1, 0.0),
///     Point::new(40.0, 40.0),
/// ];
/// let median = geometric_median(&points).unwrap();
/// assert!(median.length() < 0.2);
/// ```
pub fn geometric_median<'a, I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = &'a Point>,
    I::IntoIter: Clone,
{
    let points = points.into_iter();
    let (sum, count) = points
        .clone()
        .fold((Point::default(), 0usize), |(sum, n), p| (sum + *p, n + 1));
    if count == 0 {
        return None;
    }

    let mut candidate = sum / count as f64;
    for _ in 0..MEDIAN_ITERATIONS {
        let mut numerator = Point::default();
        let mut denominator = 0.0;
        for point in points.clone() {
            let weight = 1.0 / candidate.distance(*point).max(MIN_DISTANCE);
            numerator += *point * weight;
            denominator += weight;
        }
        candidate = numerator / denominator;
    }
    Some(candidate)
}

/// Noise reduction filter over a ring buffer of recent positions.
#[derive(Clone, Debug)]
pub struct GeometricMedianReducer {
    config: NoiseReductionConfig,
    buffer: RingBuffer<Point>,
    output: Point,
    target: Sample,
}

impl GeometricMedianReducer {
    pub fn new(config: NoiseReductionConfig) -> GeometricMedianReducer {
        GeometricMedianReducer {
            buffer: RingBuffer::new(config.samples),
            config,
            output: Point::default(),
            target: Sample::default(),
        }
    }

    pub fn config(&self) -> &NoiseReductionConfig {
        &self.config
    }

    pub fn buffer(&self) -> &RingBuffer<Point> {
        &self.buffer
    }

    /// The position emitted by the last step.
    pub fn output(&self) -> Point {
        self.output
    }
}

impl Filter for GeometricMedianReducer {
    fn set_target(&mut self, sample: Sample) {
        self.buffer.push(sample.position);
        self.target = sample;
    }

    fn step(&mut self, _now: Instant) -> Sample {
        let target = self.target.position;
        let median = if self.buffer.is_filled() {
            geometric_median(self.buffer.iter())
        } else {
            None
        };
        let median = match median {
            Some(median) => median,
            None => {
                self.output = target;
                return self.target;
            }
        };

        let threshold = self.config.distance_threshold;
        let distance = target.distance(median);
        if distance <= threshold {
            self.output = median;
            return self.target.with_position(median);
        }

        let ratio = (distance - threshold) / (self.config.distance_max() - threshold);
        if ratio >= 1.0 {
            debug!("noise reduction buffer reset at {:?}", target);
            self.buffer.fill(target);
            self.output = target;
            return self.target;
        }

        for point in self.buffer.iter_mut() {
            *point = point.lerp(target, ratio);
        }
        self.output = median.lerp(target, ratio);
        self.target.with_position(self.output)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.output = Point::default();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    // Nine points on a 0.05 mm circle around the origin.
    fn cluster() -> Vec<Point> {
        (0..9)
            .map(|k| {
                let angle = 2.0 * PI * k as f64 / 9.0;
                Point::new(0.05 * angle.cos(), 0.05 * angle.sin())
            })
            .collect()
    }

    fn primed_reducer() -> GeometricMedianReducer {
        let mut reducer = GeometricMedianReducer::new(NoiseReductionConfig::default());
        let now = Instant::now();
        let mut points = cluster();
        points.push(Point::new(0.0, 0.0));
        for point in points {
            reducer.consume(Sample::default().with_position(point), now);
        }
        assert!(reducer.buffer().is_filled());
        reducer
    }

    #[test]
    fn test_config_clamped_on_assignment() {
        let mut config = NoiseReductionConfig::default();
        config.set_samples(50).set_distance_threshold(25.0);
        assert_eq!(config.samples(), 20);
        assert_eq!(config.distance_threshold(), 10.0);
        assert_eq!(config.distance_max(), 20.0);

        config.set_samples(-3).set_distance_threshold(-1.0);
        assert_eq!(config.samples(), 0);
        assert_eq!(config.distance_threshold(), 0.0);
    }

    #[test]
    // One far outlier barely moves the median while it drags the mean.
    fn test_median_robust_to_outlier() {
        let mut points = cluster();
        points.push(Point::new(50.0, 50.0));

        let median = geometric_median(&points).unwrap();
        assert!(median.length() < 0.1, "median at {:?}", median);

        let mean = points.iter().fold(Point::default(), |acc, p| acc + *p) / 10.0;
        assert!(mean.length() > 5.0);
    }

    #[test]
    fn test_median_of_coincident_points() {
        let points = vec![Point::new(1.0, 2.0); 4];
        let median = geometric_median(&points).unwrap();
        assert_approx_eq!(median.x, 1.0);
        assert_approx_eq!(median.y, 2.0);
        assert!(geometric_median(&Vec::<Point>::new()).is_none());
    }

    #[test]
    fn test_passthrough_until_filled() {
        let mut reducer = GeometricMedianReducer::new(NoiseReductionConfig::default());
        let now = Instant::now();
        for i in 0..9 {
            let sample = Sample::new(i as f64, 0.0, 50.0);
            assert_eq!(reducer.consume(sample, now), sample);
        }
        assert!(!reducer.buffer().is_filled());
    }

    #[test]
    fn test_jitter_suppressed() {
        let mut reducer = primed_reducer();
        let sample = Sample::at(0.3, 0.0);
        let out = reducer.consume(sample, Instant::now());
        assert!(out.position.length() < 0.05, "output at {:?}", out.position);
        assert_eq!(reducer.output(), out.position);
    }

    #[test]
    fn test_fast_motion_resets_buffer() {
        let mut reducer = primed_reducer();
        let now = Instant::now();
        let sample = Sample::new(2.0, 0.0, 300.0);
        assert_eq!(reducer.consume(sample, now), sample);
        assert_eq!(reducer.buffer().len(), 10);
        assert!(reducer.buffer().iter().all(|p| *p == sample.position));

        // The refilled buffer's median is the sample itself.
        let out = reducer.consume(sample, now);
        assert_approx_eq!(out.position.x, 2.0);
        assert_approx_eq!(out.position.y, 0.0);
    }

    #[test]
    fn test_interpolation_between_thresholds() {
        let mut reducer = primed_reducer();
        let sample = Sample::at(0.75, 0.0);

        let mut probe = reducer.clone();
        probe.set_target(sample);
        let median = geometric_median(probe.buffer().iter()).unwrap();
        let distance = sample.position.distance(median);
        let ratio = (distance - 0.5) / 0.5;
        assert!(ratio > 0.0 && ratio < 1.0);

        let out = reducer.consume(sample, Instant::now());
        let expected = median.lerp(sample.position, ratio);
        assert_approx_eq!(out.position.x, expected.x);
        assert_approx_eq!(out.position.y, expected.y);
        assert!(out.position.x > median.x && out.position.x < 0.75);
    }

    #[test]
    fn test_zero_samples_passthrough() {
        let mut config = NoiseReductionConfig::default();
        config.set_samples(0);
        let mut reducer = GeometricMedianReducer::new(config);
        let now = Instant::now();
        for i in 0..30 {
            let sample = Sample::at(0.01 * i as f64, 0.0);
            assert_eq!(reducer.consume(sample, now), sample);
        }
    }

    #[test]
    fn test_idempotent_at_rest() {
        let mut reducer = primed_reducer();
        let now = Instant::now();
        let rest = Sample::new(4.0, -2.0, 10.0);
        let mut out = rest;
        for _ in 0..30 {
            out = reducer.consume(rest, now);
        }
        assert_approx_eq!(out.position.x, 4.0, 1e-9);
        assert_approx_eq!(out.position.y, -2.0, 1e-9);
        assert_eq!(out.pressure, 10.0);
    }

    #[test]
    fn test_reset() {
        let mut reducer = primed_reducer();
        reducer.reset();
        assert!(reducer.buffer().is_empty());
        let sample = Sample::at(0.3, 0.0);
        assert_eq!(reducer.consume(sample, Instant::now()), sample);
    }
}
