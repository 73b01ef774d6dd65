//! Samples flowing through a filter pipeline and the conversion between
//! device units and millimeters.
//!
//! Every filter in this crate operates in physical units so that thresholds
//! such as a distance of 0.5 mm mean the same thing on every digitizer. The
//! surrounding pipeline converts reports with a `MillimeterScale` on the way
//! in and back again on the way out.

use crate::filter::FilterError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// A 2D position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// Euclidean length of the vector from the origin to this point.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Moves `self` toward `target` by `ratio` of the remaining gap.
    pub fn lerp(self, target: Point, ratio: f64) -> Point {
        self + (target - self) * ratio
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// One report from the digitizer: a position and a pressure reading.
///
/// Pressure is carried along as a third axis which is never scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point,
    pub pressure: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, pressure: f64) -> Sample {
        Sample {
            position: Point::new(x, y),
            pressure,
        }
    }

    /// A sample with no pressure channel.
    pub fn at(x: f64, y: f64) -> Sample {
        Sample::new(x, y, 0.0)
    }

    /// Same pressure, different position.
    pub fn with_position(self, position: Point) -> Sample {
        Sample { position, ..self }
    }

    pub fn distance(&self, other: &Sample) -> f64 {
        self.position.distance(other.position)
    }
}

/// Physical size and native resolution of a digitizer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Digitizer {
    /// Active area width in millimeters.
    pub width: f64,
    /// Active area height in millimeters.
    pub height: f64,
    /// Largest X coordinate the device reports.
    pub max_x: f64,
    /// Largest Y coordinate the device reports.
    pub max_y: f64,
}

/// Per-axis conversion factor from device units to millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MillimeterScale {
    pub x: f64,
    pub y: f64,
}

impl MillimeterScale {
    /// Derives the scale as `width / max_x` and `height / max_y`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tablet_filters::sample::{Digitizer, MillimeterScale};
    ///
    /// let digitizer = Digitizer {
    ///     width: 152.0,
    ///     height: 95.0,
    ///     max_x: 15200.0,
    ///     max_y: 9500.0,
    /// };
    /// let scale = MillimeterScale::from_digitizer(&digitizer).unwrap();
    /// assert_eq!(scale.x, 0.01);
    /// assert_eq!(scale.y, 0.01);
    /// ```
    pub fn from_digitizer(
        digitizer: &Digitizer,
    ) -> Result<MillimeterScale, FilterError> {
        let sizes_valid = digitizer.width > 0.0
            && digitizer.height > 0.0
            && digitizer.width.is_finite()
            && digitizer.height.is_finite();
        let ranges_valid = digitizer.max_x > 0.0
            && digitizer.max_y > 0.0
            && digitizer.max_x.is_finite()
            && digitizer.max_y.is_finite();
        if !sizes_valid || !ranges_valid {
            return Err(FilterError::InvalidDigitizer(*digitizer));
        }
        Ok(MillimeterScale {
            x: digitizer.width / digitizer.max_x,
            y: digitizer.height / digitizer.max_y,
        })
    }

    /// A scale for streams that already arrive in millimeters.
    pub fn identity() -> MillimeterScale {
        MillimeterScale { x: 1.0, y: 1.0 }
    }

    pub fn to_millimeters(&self, sample: Sample) -> Sample {
        sample.with_position(Point::new(
            sample.position.x * self.x,
            sample.position.y * self.y,
        ))
    }

    pub fn from_millimeters(&self, sample: Sample) -> Sample {
        sample.with_position(Point::new(
            sample.position.x / self.x,
            sample.position.y / self.y,
        ))
    }
}

impl Default for MillimeterScale {
    fn default() -> Self {
        MillimeterScale::identity()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_point_math() {
        let a = Point::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a.distance(Point::default()), 5.0);
        assert_eq!(a.lerp(Point::new(5.0, 8.0), 0.5), Point::new(4.0, 6.0));
        assert_eq!(a * 2.0 - a, a);
    }

    #[test]
    fn test_scale_conversion() {
        let digitizer = Digitizer {
            width: 216.0,
            height: 135.0,
            max_x: 43200.0,
            max_y: 27000.0,
        };
        let scale = MillimeterScale::from_digitizer(&digitizer).unwrap();
        let report = Sample::new(21600.0, 13500.0, 512.0);
        let mm = scale.to_millimeters(report);
        assert_approx_eq!(mm.position.x, 108.0);
        assert_approx_eq!(mm.position.y, 67.5);
        assert_eq!(mm.pressure, 512.0);

        let back = scale.from_millimeters(mm);
        assert_approx_eq!(back.position.x, report.position.x);
        assert_approx_eq!(back.position.y, report.position.y);
    }

    #[test]
    fn test_invalid_digitizer() {
        let digitizer = Digitizer {
            width: 100.0,
            height: 100.0,
            max_x: 0.0,
            max_y: 1000.0,
        };
        assert!(MillimeterScale::from_digitizer(&digitizer).is_err());

        let digitizer = Digitizer {
            width: -1.0,
            ..digitizer
        };
        assert!(MillimeterScale::from_digitizer(&digitizer).is_err());
    }
}
