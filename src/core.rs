use crate::error::{JoyplotError, JoyplotResult};

pub use kurbo::{BezPath, Point};

/// Output display surface: physical pixel size plus display density.
///
/// All drawing happens in logical units (`physical / density`); the rasterizer
/// applies the density scale when it fills paths.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Surface {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Physical pixels per logical pixel (1.0 on desktops, >1 on dense displays).
    pub density: f64,
}

impl Surface {
    /// Create a validated surface.
    pub fn new(width: u32, height: u32, density: f64) -> JoyplotResult<Self> {
        let s = Self {
            width,
            height,
            density,
        };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> JoyplotResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(JoyplotError::validation("surface width/height must be > 0"));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(JoyplotError::validation(
                "surface density must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Density-corrected width.
    pub fn logical_width(self) -> f64 {
        f64::from(self.width) / self.density
    }

    /// Density-corrected height.
    pub fn logical_height(self) -> f64 {
        f64::from(self.height) / self.density
    }
}

/// Straight-alpha RGBA8 colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

}
