use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::Context as _;

use crate::{
    core::Rgba8,
    error::{JoyplotError, JoyplotResult},
};

pub const LINE_PITCH_RANGE: RangeInclusive<u32> = 1..=50;
pub const SAMPLING_RESOLUTION_RANGE: RangeInclusive<u32> = 1..=50;
pub const MAX_PEAK_HEIGHT_RANGE: RangeInclusive<u32> = 0..=255;
pub const CURVE_STRENGTH_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const CURVE_DEVIATION_MAX: f64 = 0.25;
pub const CENTRE_SCALING_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const WIDTH_CROP_RANGE: RangeInclusive<f64> = 0.6..=1.0;

/// Fill and stroke applied to every line shape.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LineStyle {
    pub fill: Rgba8,
    pub stroke: Rgba8,
    /// Stroke width in logical pixels. Caps and joins are always round.
    pub stroke_width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            fill: Rgba8::BLACK,
            stroke: Rgba8::WHITE,
            stroke_width: 2.0,
        }
    }
}

/// Tunable joyplot parameters.
///
/// A `Params` value is immutable once handed to a [`crate::Session`]; the
/// controlling UI replaces it wholesale on every change.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Params {
    /// Vertical distance between rendered lines, in source rows.
    pub line_pitch: u32,
    /// Horizontal distance between sampled columns. Also the envelope granularity.
    pub sampling_resolution: u32,
    /// Displacement of a full-brightness pixel at envelope weight 1, in source rows.
    pub max_peak_height: u32,
    /// Multiplier on the envelope weight.
    pub curve_strength: f64,
    /// Standard deviation of the centre envelope, as a fraction of line width.
    pub curve_deviation: f64,
    /// Uniform scale about the surface centre; `1.0` fills the surface.
    pub centre_scaling: f64,
    /// Fraction of the frame width kept, symmetric about the centre.
    pub width_crop: f64,
    pub background: Rgba8,
    pub style: LineStyle,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            line_pitch: 5,
            sampling_resolution: 2,
            max_peak_height: 70,
            curve_strength: 1.0,
            curve_deviation: 0.15,
            centre_scaling: 0.75,
            width_crop: 0.75,
            background: Rgba8::BLACK,
            style: LineStyle::default(),
        }
    }
}

impl Params {
    /// Brightness (0..=255) to row displacement factor.
    pub fn peak_height_scale(&self) -> f64 {
        f64::from(self.max_peak_height) / 255.0
    }

    pub fn validate(&self) -> JoyplotResult<()> {
        if self.line_pitch == 0 {
            return Err(JoyplotError::validation("line_pitch must be >= 1"));
        }
        if self.sampling_resolution == 0 {
            return Err(JoyplotError::validation("sampling_resolution must be >= 1"));
        }
        if !MAX_PEAK_HEIGHT_RANGE.contains(&self.max_peak_height) {
            return Err(JoyplotError::validation("max_peak_height must be in 0..=255"));
        }
        if !self.curve_strength.is_finite() || self.curve_strength < 0.0 {
            return Err(JoyplotError::validation(
                "curve_strength must be finite and >= 0",
            ));
        }
        if !self.curve_deviation.is_finite()
            || self.curve_deviation <= 0.0
            || self.curve_deviation > CURVE_DEVIATION_MAX
        {
            return Err(JoyplotError::validation(
                "curve_deviation must be in (0, 0.25]",
            ));
        }
        if !CENTRE_SCALING_RANGE.contains(&self.centre_scaling) {
            return Err(JoyplotError::validation("centre_scaling must be in [0, 1]"));
        }
        if !WIDTH_CROP_RANGE.contains(&self.width_crop) {
            return Err(JoyplotError::validation("width_crop must be in [0.6, 1]"));
        }
        if !self.style.stroke_width.is_finite() || self.style.stroke_width < 0.0 {
            return Err(JoyplotError::validation(
                "style.stroke_width must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Copy with every value pulled into its control range.
    ///
    /// Non-finite floats fall back to the default value.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        let clamp_f = |v: f64, r: &RangeInclusive<f64>, fallback: f64| {
            if v.is_finite() {
                v.clamp(*r.start(), *r.end())
            } else {
                fallback
            }
        };

        let deviation = if self.curve_deviation.is_finite() {
            // Lower bound is exclusive; keep a tiny positive spread.
            self.curve_deviation.clamp(1e-3, CURVE_DEVIATION_MAX)
        } else {
            d.curve_deviation
        };
        let stroke_width = if self.style.stroke_width.is_finite() {
            self.style.stroke_width.max(0.0)
        } else {
            d.style.stroke_width
        };

        Self {
            line_pitch: self
                .line_pitch
                .clamp(*LINE_PITCH_RANGE.start(), *LINE_PITCH_RANGE.end()),
            sampling_resolution: self.sampling_resolution.clamp(
                *SAMPLING_RESOLUTION_RANGE.start(),
                *SAMPLING_RESOLUTION_RANGE.end(),
            ),
            max_peak_height: self.max_peak_height.min(*MAX_PEAK_HEIGHT_RANGE.end()),
            curve_strength: clamp_f(self.curve_strength, &CURVE_STRENGTH_RANGE, d.curve_strength),
            curve_deviation: deviation,
            centre_scaling: clamp_f(self.centre_scaling, &CENTRE_SCALING_RANGE, d.centre_scaling),
            width_crop: clamp_f(self.width_crop, &WIDTH_CROP_RANGE, d.width_crop),
            background: self.background,
            style: LineStyle {
                stroke_width,
                ..self.style
            },
        }
    }

    /// Load from JSON; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> JoyplotResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read params '{}'", path.display()))?;
        let params: Self = serde_json::from_slice(&bytes)?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let p = Params::default();
        p.validate().unwrap();
        assert!((p.peak_height_scale() - 70.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_out_of_domain_values() {
        let bad = [
            Params {
                line_pitch: 0,
                ..Params::default()
            },
            Params {
                sampling_resolution: 0,
                ..Params::default()
            },
            Params {
                max_peak_height: 256,
                ..Params::default()
            },
            Params {
                curve_strength: -0.1,
                ..Params::default()
            },
            Params {
                curve_deviation: 0.0,
                ..Params::default()
            },
            Params {
                curve_deviation: f64::NAN,
                ..Params::default()
            },
            Params {
                curve_deviation: 0.3,
                ..Params::default()
            },
            Params {
                centre_scaling: 1.5,
                ..Params::default()
            },
            Params {
                width_crop: 0.5,
                ..Params::default()
            },
        ];
        for p in bad {
            assert!(p.validate().is_err(), "{p:?} should be rejected");
        }
    }

    #[test]
    fn clamped_lands_inside_the_control_ranges() {
        let wild = Params {
            line_pitch: 0,
            sampling_resolution: 99,
            max_peak_height: 1000,
            curve_strength: 9.0,
            curve_deviation: -1.0,
            centre_scaling: f64::NAN,
            width_crop: 0.1,
            ..Params::default()
        };
        let c = wild.clamped();
        c.validate().unwrap();
        assert_eq!(c.line_pitch, 1);
        assert_eq!(c.sampling_resolution, 50);
        assert_eq!(c.max_peak_height, 255);
        assert_eq!(c.curve_strength, 2.0);
        assert_eq!(c.centre_scaling, Params::default().centre_scaling);
        assert_eq!(c.width_crop, 0.6);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: Params = serde_json::from_str(r#"{"line_pitch": 8}"#).unwrap();
        assert_eq!(p.line_pitch, 8);
        assert_eq!(p.sampling_resolution, 2);
        assert_eq!(p.style, LineStyle::default());
    }
}
