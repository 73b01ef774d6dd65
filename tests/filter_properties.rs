use assert_approx_eq::assert_approx_eq;
use rand::Rng;
use std::time::{Duration, Instant};
use tablet_filters::filter::{
    AntichatterConfig, ExponentialSmoother, Filter, FilterKind, GeometricMedianReducer,
    NoiseReductionConfig, PredictiveAntiChatter, SmoothingConfig,
};
use tablet_filters::sample::{Point, Sample};

const FREQUENCY: f64 = 250.0;

fn smoother(latency: f64) -> ExponentialSmoother {
    let mut config = SmoothingConfig::default();
    config.set_latency(latency);
    ExponentialSmoother::new(config, FREQUENCY).unwrap()
}

fn every_filter() -> Vec<FilterKind> {
    vec![
        smoother(20.0).into(),
        PredictiveAntiChatter::new(AntichatterConfig::default(), FREQUENCY)
            .unwrap()
            .into(),
        GeometricMedianReducer::new(NoiseReductionConfig::default()).into(),
    ]
}

fn jitter(rng: &mut impl Rng, center: Point, amount: f64) -> Sample {
    Sample::at(
        center.x + rng.gen_range(-amount..amount),
        center.y + rng.gen_range(-amount..amount),
    )
}

fn ticks(start: Instant, count: u64) -> impl Iterator<Item = Instant> {
    (1..=count).map(move |i| start + Duration::from_millis(4 * i))
}

#[test]
fn test_first_sample_passes_through() {
    let mut rng = rand::thread_rng();
    for mut filter in every_filter() {
        let sample = Sample::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), 0.4);
        assert_eq!(filter.consume(sample, Instant::now()), sample, "{}", filter.name());
    }
}

#[test]
fn test_zero_latency_passes_through() {
    let mut rng = rand::thread_rng();
    let mut filter = smoother(0.0);
    let start = Instant::now();
    for now in ticks(start, 100) {
        let sample = jitter(&mut rng, Point::new(20.0, 20.0), 5.0);
        assert_eq!(filter.consume(sample, now), sample);
    }
}

#[test]
fn test_smoothing_convergence() {
    // 20 ms at 4 ms per tick converges in five ticks.
    let mut filter = smoother(20.0);
    let start = Instant::now();
    filter.consume(Sample::at(0.0, 0.0), start);

    let target = Sample::at(10.0, 0.0);
    let mut remaining = target.distance(&Sample::at(0.0, 0.0));
    for now in ticks(start, 5) {
        let distance = filter.consume(target, now).distance(&target);
        assert!(distance < remaining);
        remaining = distance;
    }
    assert!(remaining <= 10.0 * (1.0 - 0.63) + 1e-9);
}

#[test]
fn test_antichatter_weight_grows_with_distance() {
    let filter = PredictiveAntiChatter::new(AntichatterConfig::default(), FREQUENCY).unwrap();
    let weights: Vec<f64> = [0.05, 0.2, 0.5, 1.0, 3.0]
        .iter()
        .map(|d| filter.weight_at(*d))
        .collect();
    for pair in weights.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert!(weights[0] < weights[4]);
}

#[test]
fn test_every_filter_settles_at_rest() {
    let rest = Sample::new(42.0, 17.0, 0.5);
    let start = Instant::now();
    for mut filter in every_filter() {
        let mut out = Sample::default();
        for now in ticks(start, 300) {
            out = filter.consume(rest, now);
        }
        assert_approx_eq!(out.position.x, rest.position.x, 1e-9);
        assert_approx_eq!(out.position.y, rest.position.y, 1e-9);
        assert_approx_eq!(out.pressure, rest.pressure, 1e-9);
    }
}

#[test]
fn test_smoothing_settles_after_jitter() {
    let mut rng = rand::thread_rng();
    let mut filter = smoother(20.0);
    let start = Instant::now();
    for now in ticks(start, 50) {
        filter.consume(jitter(&mut rng, Point::new(5.0, 5.0), 1.0), now);
    }
    let rest = Sample::at(5.0, 5.0);
    let mut out = Sample::default();
    for now in ticks(start + Duration::from_millis(200), 300) {
        out = filter.consume(rest, now);
    }
    assert!(out.distance(&rest) < 1e-6);
}

#[test]
fn test_noise_reduction_holds_a_hovering_pen() {
    let mut rng = rand::thread_rng();
    let center = Point::new(5.0, 5.0);
    let mut filter = GeometricMedianReducer::new(NoiseReductionConfig::default());
    let start = Instant::now();
    for (i, now) in ticks(start, 200).enumerate() {
        let out = filter.consume(jitter(&mut rng, center, 0.05), now);
        if i >= 10 {
            // The median stays inside the jitter square.
            assert!(out.position.distance(center) < 0.0708);
        }
    }
}

#[test]
fn test_noise_reduction_follows_a_stroke() {
    let mut filter = GeometricMedianReducer::new(NoiseReductionConfig::default());
    let start = Instant::now();
    for now in ticks(start, 10) {
        filter.consume(Sample::at(0.0, 0.0), now);
    }
    let jump = Sample::at(3.0, 0.0);
    assert_eq!(filter.consume(jump, start), jump);
    assert!(filter.buffer().iter().all(|p| *p == jump.position));
}

#[test]
fn test_reset_is_a_cold_start() {
    let start = Instant::now();
    for mut filter in every_filter() {
        for now in ticks(start, 20) {
            filter.consume(Sample::at(1.0, 1.0), now);
        }
        filter.reset();
        let sample = Sample::at(30.0, -4.0);
        assert_eq!(filter.consume(sample, start), sample, "{}", filter.name());
    }
}
