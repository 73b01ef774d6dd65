//! Draws a slow diagonal stroke with simulated sensor jitter and shows how
//! much of the jitter each pipeline leaves behind.

use log::info;
use rand::Rng;
use std::time::{Duration, Instant};
use tablet_filters::config::{
    AntichatterSettings, FilterSettings, NoiseReductionSettings, PipelineSettings,
    SmoothingSettings,
};
use tablet_filters::filter::FilterError;
use tablet_filters::pipeline::Schedule;
use tablet_filters::sample::{Digitizer, Sample};

const FREQUENCY: f64 = 200.0;
const REPORTS: usize = 400;

// Mean distance of each sample from the ideal stroke.
fn residual(samples: &[Sample], ideal: &[Sample]) -> f64 {
    let total: f64 = samples
        .iter()
        .zip(ideal)
        .map(|(s, i)| s.distance(i))
        .sum();
    total / samples.len() as f64
}

fn run(
    name: &str,
    stages: Vec<FilterSettings>,
    ideal: &[Sample],
    reports: &[Sample],
) -> Result<(), FilterError> {
    let settings = PipelineSettings {
        frequency: FREQUENCY,
        digitizer: Some(Digitizer {
            width: 152.0,
            height: 95.0,
            max_x: 15200.0,
            max_y: 9500.0,
        }),
        schedule: Schedule::PerReport,
        stages,
    };
    let mut pipeline = PipelineSettings::from_cbor(&settings.to_cbor()?)?.build()?;

    let start = Instant::now();
    let period = Duration::from_millis(5);
    let filtered: Vec<Sample> = reports
        .iter()
        .enumerate()
        .map(|(i, report)| pipeline.filter(*report, start + period * i as u32))
        .collect();
    info!(
        "{:>16}: residual jitter {:.2} units",
        name,
        residual(&filtered, ideal)
    );
    Ok(())
}

fn main() -> Result<(), FilterError> {
    simple_logger::init_with_level(log::Level::Info)
        .map_err(|err| FilterError::Settings(err.to_string()))?;

    let mut rng = rand::thread_rng();
    let ideal: Vec<Sample> = (0..REPORTS)
        .map(|i| Sample::new(2000.0 + i as f64 * 2.0, 1500.0 + i as f64, 0.5))
        .collect();
    let reports: Vec<Sample> = ideal
        .iter()
        .map(|s| {
            Sample::new(
                s.position.x + rng.gen_range(-4.0..4.0),
                s.position.y + rng.gen_range(-4.0..4.0),
                s.pressure,
            )
        })
        .collect();

    info!("{:>16}: residual jitter {:.2} units", "raw", residual(&reports, &ideal));
    run(
        "smoothing",
        vec![FilterSettings::Smoothing(SmoothingSettings {
            latency: 15.0,
            ..SmoothingSettings::default()
        })],
        &ideal,
        &reports,
    )?;
    run(
        "antichatter",
        vec![FilterSettings::Antichatter(AntichatterSettings {
            latency: 10.0,
            antichatter_multiplier: 100.0,
            antichatter_offset_x: 1.5,
            ..AntichatterSettings::default()
        })],
        &ideal,
        &reports,
    )?;
    run(
        "noise reduction",
        vec![FilterSettings::NoiseReduction(NoiseReductionSettings::default())],
        &ideal,
        &reports,
    )?;
    run(
        "chained",
        vec![
            FilterSettings::NoiseReduction(NoiseReductionSettings::default()),
            FilterSettings::Smoothing(SmoothingSettings::default()),
        ],
        &ideal,
        &reports,
    )?;
    Ok(())
}
