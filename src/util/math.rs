use crate::filter::FilterError;
use log::trace;
use num_traits::Float;

/// Milliseconds between samples at `frequency` Hz.
///
/// Fails for a zero, negative or non-finite frequency since no sampling
/// period can be derived from it.
pub fn timer_interval(frequency: f64) -> Result<f64, FilterError> {
    if frequency > 0.0 && frequency.is_finite() {
        Ok(1000.0 / frequency)
    } else {
        Err(FilterError::InvalidFrequency(frequency))
    }
}

/// Fraction of the remaining gap to the target applied on every tick.
///
/// The weight is chosen so that after `latency / timer_interval` ticks of a
/// step input only `1 - threshold` of the step remains, which makes the
/// latency independent of the sampling rate. A latency shorter than one
/// sample interval yields a weight of 1, i.e. no smoothing at all.
///
/// # Arguments
///
/// * `latency` - Time in milliseconds to converge to `threshold`.
/// * `timer_interval` - Milliseconds between ticks.
/// * `threshold` - Fraction of the step reached after `latency`.
///
/// # Examples
///
/// ```
/// use tablet_filters::util::math::convergence_weight;
///
/// // Latency of a single tick converges by exactly the threshold.
/// let weight = convergence_weight(4.0_f64, 4.0, 0.63);
/// assert!((weight - 0.63).abs() < 1e-12);
///
/// // Less than one tick of latency passes samples straight through.
/// assert_eq!(convergence_weight(2.0_f64, 4.0, 0.63), 1.0);
/// ```
pub fn convergence_weight<T: Float>(latency: T, timer_interval: T, threshold: T) -> T {
    let step_count = latency / timer_interval;
    if !(step_count >= T::one()) {
        return T::one();
    }
    let target = T::one() - threshold;
    T::one() - T::one() / (T::one() / target).powf(T::one() / step_count)
}

/// Hyperbolic secant, the bell curve used for the prediction gain.
pub fn sech<T: Float>(x: T) -> T {
    T::one() / x.cosh()
}

/// Clamps a user supplied value into `[min, max]`.
///
/// NaN saturates to `min`. Saturation is not an error, only traced.
pub fn saturate<T: Float + std::fmt::Debug>(name: &str, value: T, min: T, max: T) -> T {
    let clamped = if value.is_nan() {
        min
    } else {
        num_traits::clamp(value, min, max)
    };
    if clamped != value {
        trace!("{} {:?} saturated to {:?}", name, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_timer_interval() {
        assert_approx_eq!(timer_interval(250.0).unwrap(), 4.0);
        assert_approx_eq!(timer_interval(1000.0).unwrap(), 1.0);
        assert!(timer_interval(0.0).is_err());
        assert!(timer_interval(-133.0).is_err());
        assert!(timer_interval(std::f64::NAN).is_err());
        assert!(timer_interval(std::f64::INFINITY).is_err());
    }

    #[test]
    fn test_convergence_weight() {
        // Ten ticks of latency: (1 - w)^10 == 1 - threshold.
        let weight = convergence_weight(40.0_f64, 4.0, 0.63);
        assert_approx_eq!((1.0 - weight).powi(10), 0.37);

        let weight = convergence_weight(20.0_f64, 1.0, 0.9);
        assert_approx_eq!((1.0 - weight).powi(20), 0.1);

        assert_eq!(convergence_weight(0.0_f64, 4.0, 0.63), 1.0);
        assert_eq!(convergence_weight(3.9_f64, 4.0, 0.63), 1.0);
    }

    #[test]
    fn test_weight_shrinks_with_latency() {
        let mut last = 1.0;
        for latency in &[4.0, 8.0, 16.0, 100.0, 1000.0] {
            let weight = convergence_weight(*latency, 4.0_f64, 0.63);
            assert!(weight < last);
            assert!(weight > 0.0);
            last = weight;
        }
    }

    #[test]
    fn test_sech() {
        assert_eq!(sech(0.0_f64), 1.0);
        assert_approx_eq!(sech(1.0_f64), sech(-1.0_f64));
        assert!(sech(10.0_f64) < 1e-3);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate("latency", 2000.0, 0.0, 1000.0), 1000.0);
        assert_eq!(saturate("latency", -5.0, 0.0, 1000.0), 0.0);
        assert_eq!(saturate("latency", 15.0, 0.0, 1000.0), 15.0);
        assert_eq!(saturate("latency", std::f64::NAN, 0.0, 1000.0), 0.0);
    }
}
