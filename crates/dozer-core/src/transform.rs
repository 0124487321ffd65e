//! Coordinate transform between physical microns and on-screen pixels.
//!
//! The pixel-per-micron ratio depends on display density and zoom, so it is
//! measured rather than computed: a reference element of known physical size
//! is rendered inside the live canvas container and its pixel size is read
//! back. The resulting [`Calibration`] is cached for the lifetime of one open
//! notepage session.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use thiserror::Error;

/// Physical size of the calibration reference element (100 mm).
pub const DEFAULT_REFERENCE_LENGTH_UM: i64 = 100_000;

/// An integer 2D quantity in microns (a position or a size).
///
/// Serialized as a two-element array, matching the `pos_um` / `size_um`
/// wire fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct MicronVec {
    pub x: i64,
    pub y: i64,
}

impl MicronVec {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<[i64; 2]> for MicronVec {
    fn from([x, y]: [i64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<MicronVec> for [i64; 2] {
    fn from(v: MicronVec) -> Self {
        [v.x, v.y]
    }
}

impl Add for MicronVec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for MicronVec {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Calibration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("Reference length must be positive, got {0} um")]
    InvalidReference(i64),
    #[error("Reference element measured {0} px; expected a positive finite size")]
    BadMeasurement(f64),
    #[error("Probe failed: {0}")]
    Probe(String),
}

/// Something that can render a reference element and report its pixel size.
pub trait CalibrationProbe {
    /// Render a square of `length_um` microns inside the canvas container,
    /// read its rendered width in pixels, and discard it.
    fn measure_reference(&mut self, length_um: i64) -> Result<f64, CalibrationError>;
}

/// A probe that reports a fixed ratio. Used for headless sessions and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedProbe {
    pub px_per_um: f64,
}

impl FixedProbe {
    pub fn new(px_per_um: f64) -> Self {
        Self { px_per_um }
    }
}

impl CalibrationProbe for FixedProbe {
    fn measure_reference(&mut self, length_um: i64) -> Result<f64, CalibrationError> {
        Ok(self.px_per_um * length_um as f64)
    }
}

/// Measured pixel-per-micron ratio for one open canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    px_per_um: f64,
}

impl Calibration {
    /// Measure the ratio with a reference element of `reference_um` microns.
    pub fn measure<P: CalibrationProbe + ?Sized>(
        probe: &mut P,
        reference_um: i64,
    ) -> Result<Self, CalibrationError> {
        if reference_um <= 0 {
            return Err(CalibrationError::InvalidReference(reference_um));
        }

        let measured_px = probe.measure_reference(reference_um)?;
        let calibration = Self::from_ratio(measured_px / reference_um as f64)
            .map_err(|_| CalibrationError::BadMeasurement(measured_px))?;

        log::info!(
            "Calibrated canvas: {} um reference measured {} px ({} px/um)",
            reference_um,
            measured_px,
            calibration.px_per_um
        );
        Ok(calibration)
    }

    /// Build a calibration from a known ratio.
    pub fn from_ratio(px_per_um: f64) -> Result<Self, CalibrationError> {
        if px_per_um.is_finite() && px_per_um > 0.0 {
            Ok(Self { px_per_um })
        } else {
            Err(CalibrationError::BadMeasurement(px_per_um))
        }
    }

    pub fn px_per_um(&self) -> f64 {
        self.px_per_um
    }

    /// Convert a physical length to (fractional) pixels.
    pub fn length_to_px(&self, um: i64) -> f64 {
        um as f64 * self.px_per_um
    }

    /// Convert a pixel length to the nearest whole micron.
    pub fn length_to_um(&self, px: f64) -> i64 {
        (px / self.px_per_um).round() as i64
    }

    /// Convert a physical position to pixel coordinates.
    pub fn um_to_px(&self, um: MicronVec) -> Point {
        Point::new(self.length_to_px(um.x), self.length_to_px(um.y))
    }

    /// Convert a physical size to a pixel size.
    pub fn size_to_px(&self, um: MicronVec) -> Size {
        Size::new(self.length_to_px(um.x), self.length_to_px(um.y))
    }

    /// Convert a pixel position to the nearest whole-micron position.
    pub fn px_to_um(&self, px: Point) -> MicronVec {
        MicronVec::new(self.length_to_um(px.x), self.length_to_um(px.y))
    }

    /// Convert a pixel displacement to the nearest whole-micron displacement.
    pub fn px_delta_to_um(&self, delta: Vec2) -> MicronVec {
        MicronVec::new(self.length_to_um(delta.x), self.length_to_um(delta.y))
    }
}

/// Pixel reads from the rendering engine are whole pixels.
pub fn truncate_px(p: Point) -> Point {
    Point::new(p.x.trunc(), p.y.trunc())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenProbe(f64);

    impl CalibrationProbe for BrokenProbe {
        fn measure_reference(&mut self, _length_um: i64) -> Result<f64, CalibrationError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_measure_derives_ratio() {
        // 100 mm rendered as 377.95 px is the usual 96 dpi desktop.
        let mut probe = BrokenProbe(377.95);
        let cal = Calibration::measure(&mut probe, DEFAULT_REFERENCE_LENGTH_UM).unwrap();
        assert!((cal.px_per_um() - 0.0037795).abs() < 1e-12);
    }

    #[test]
    fn test_measure_rejects_zero_and_nan() {
        assert_eq!(
            Calibration::measure(&mut BrokenProbe(0.0), 1000),
            Err(CalibrationError::BadMeasurement(0.0))
        );
        assert!(Calibration::measure(&mut BrokenProbe(f64::NAN), 1000).is_err());
        assert_eq!(
            Calibration::measure(&mut FixedProbe::new(1.0), 0),
            Err(CalibrationError::InvalidReference(0))
        );
    }

    #[test]
    fn test_fixed_probe() {
        let cal = Calibration::measure(&mut FixedProbe::new(2.0), 1000).unwrap();
        assert!((cal.px_per_um() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_px_to_um_rounds() {
        let cal = Calibration::from_ratio(2.0).unwrap();
        assert_eq!(cal.px_to_um(Point::new(50.0, 51.0)), MicronVec::new(25, 26));
        // 51 / 2 = 25.5 rounds away from zero.
        assert_eq!(cal.px_delta_to_um(Vec2::new(-51.0, 3.0)), MicronVec::new(-26, 2));
    }

    #[test]
    fn test_roundtrip_within_one_micron() {
        for ratio in [0.0037795, 0.5, 1.0, 2.0, 3.7795] {
            let cal = Calibration::from_ratio(ratio).unwrap();
            for um in [0_i64, 1, 25, 999, 1000, 123_456, -4_321] {
                let original = MicronVec::new(um, -um);
                let back = cal.px_to_um(cal.um_to_px(original));
                assert!((back.x - original.x).abs() <= 1, "ratio {ratio}, um {um}");
                assert!((back.y - original.y).abs() <= 1, "ratio {ratio}, um {um}");
            }
        }
    }

    #[test]
    fn test_roundtrip_through_truncated_pixels() {
        let cal = Calibration::from_ratio(2.0).unwrap();
        for um in [0_i64, 7, 25, 1000, 31_337] {
            let original = MicronVec::new(um, um);
            let back = cal.px_to_um(truncate_px(cal.um_to_px(original)));
            assert!((back.x - original.x).abs() <= 1);
        }
    }

    #[test]
    fn test_micron_vec_wire_format() {
        let v = MicronVec::new(25, -3);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[25,-3]");
        let parsed: MicronVec = serde_json::from_str("[1000,1000]").unwrap();
        assert_eq!(parsed, MicronVec::new(1000, 1000));
        assert_eq!(v + MicronVec::new(5, 3), MicronVec::new(30, 0));
    }
}
