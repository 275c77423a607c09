use crate::{
    core::Surface,
    envelope::Envelope,
    error::{JoyplotError, JoyplotResult},
    params::Params,
};

/// Horizontal range of source columns that gets drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    pub start_x: u32,
    pub end_x: u32,
}

impl CropWindow {
    /// `(floor(w * (1 - crop)), floor(w * crop))`, symmetric about the centre.
    pub fn compute(frame_width: u32, width_crop: f64) -> Self {
        let w = f64::from(frame_width);
        Self {
            start_x: (w * (1.0 - width_crop)).floor() as u32,
            end_x: (w * width_crop).floor() as u32,
        }
    }

    pub fn width(self) -> u32 {
        self.end_x.saturating_sub(self.start_x)
    }
}

/// Translation applied before centre scaling so the shrunken drawing stays centred.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOrigin {
    pub x: f64,
    pub y: f64,
}

impl RenderOrigin {
    pub fn compute(centre_scaling: f64, surface: Surface) -> Self {
        let k = 1.0 - centre_scaling;
        Self {
            x: k * surface.logical_width() * 0.5,
            y: k * surface.logical_height() * 0.5,
        }
    }
}

/// Source pixel to logical output unit factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderScales {
    pub width: f64,
    pub height: f64,
}

impl RenderScales {
    pub fn compute(frame_width: u32, frame_height: u32, surface: Surface) -> Self {
        Self {
            width: surface.logical_width() / f64::from(frame_width),
            height: surface.logical_height() / f64::from(frame_height),
        }
    }
}

/// Every value derived from params and frame/surface dimensions.
///
/// Always replaced as a whole so the envelope, crop window, origin and scales
/// never disagree about the frame they were computed for.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub frame_width: u32,
    pub frame_height: u32,
    pub surface: Surface,
    pub envelope: Envelope,
    pub crop: CropWindow,
    pub origin: RenderOrigin,
    pub scales: RenderScales,
}

impl Layout {
    #[tracing::instrument(level = "debug", skip(params))]
    pub fn compute(
        params: &Params,
        frame_width: u32,
        frame_height: u32,
        surface: Surface,
    ) -> JoyplotResult<Self> {
        let envelope = Envelope::compute(
            frame_width,
            params.sampling_resolution,
            params.curve_deviation,
        )?;
        Self::with_envelope(params, frame_width, frame_height, surface, envelope)
    }

    /// Recompute for new inputs, reusing the current envelope when it still matches.
    pub fn recompute(
        &self,
        params: &Params,
        frame_width: u32,
        frame_height: u32,
        surface: Surface,
    ) -> JoyplotResult<Self> {
        if self.envelope.matches(
            frame_width,
            params.sampling_resolution,
            params.curve_deviation,
        ) {
            Self::with_envelope(
                params,
                frame_width,
                frame_height,
                surface,
                self.envelope.clone(),
            )
        } else {
            Self::compute(params, frame_width, frame_height, surface)
        }
    }

    fn with_envelope(
        params: &Params,
        frame_width: u32,
        frame_height: u32,
        surface: Surface,
        envelope: Envelope,
    ) -> JoyplotResult<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(JoyplotError::validation(
                "layout frame width/height must be > 0",
            ));
        }
        surface.validate()?;

        Ok(Self {
            frame_width,
            frame_height,
            surface,
            envelope,
            crop: CropWindow::compute(frame_width, params.width_crop),
            origin: RenderOrigin::compute(params.centre_scaling, surface),
            scales: RenderScales::compute(frame_width, frame_height, surface),
        })
    }

    pub fn fits_frame(&self, width: u32, height: u32) -> bool {
        self.frame_width == width && self.frame_height == height
    }
}
