use crate::{
    core::Surface,
    error::JoyplotResult,
    frame::VideoFrame,
    layout::Layout,
    params::Params,
    render::{DrawSurface, RenderOutcome, SkipReason, render_frame},
    source::SourceEvent,
};

/// Capture lifecycle as seen by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// No pixel data yet; render passes only clear.
    Uninitialized,
    /// Pixel data is readable; dimensions are provisional.
    Loaded,
    /// The source reported its true dimensions.
    MetadataResized,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct LayoutKey {
    epoch: u64,
    frame: (u32, u32),
    surface: Surface,
}

/// Owns the current parameters, the capture lifecycle and the derived layout.
///
/// Every mutation recomputes the layout before returning, so a render pass
/// only ever reads a layout that matches the current params and dimensions.
#[derive(Debug)]
pub struct Session {
    params: Params,
    epoch: u64,
    surface: Surface,
    capture: CaptureState,
    frame_dims: Option<(u32, u32)>,
    layout: Option<(LayoutKey, Layout)>,
}

impl Session {
    pub fn new(params: Params, surface: Surface) -> JoyplotResult<Self> {
        params.validate()?;
        surface.validate()?;
        Ok(Self {
            params,
            epoch: 0,
            surface,
            capture: CaptureState::Uninitialized,
            frame_dims: None,
            layout: None,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    /// Bumped on every accepted params change.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref().map(|(_, l)| l)
    }

    /// Replace the parameters. Invalid params are rejected and nothing changes.
    pub fn set_params(&mut self, params: Params) -> JoyplotResult<()> {
        params.validate()?;
        let previous = std::mem::replace(&mut self.params, params);
        self.epoch += 1;
        if let Err(e) = self.refresh_layout() {
            self.params = previous;
            self.epoch -= 1;
            return Err(e);
        }
        Ok(())
    }

    pub fn resize_surface(&mut self, surface: Surface) -> JoyplotResult<()> {
        surface.validate()?;
        self.surface = surface;
        self.refresh_layout()
    }

    pub fn handle_event(&mut self, event: SourceEvent) -> JoyplotResult<()> {
        match event {
            SourceEvent::Loaded { width, height } => self.on_loaded(width, height),
            SourceEvent::MetadataResized { width, height } => {
                self.on_metadata_resized(width, height)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn on_loaded(&mut self, width: u32, height: u32) -> JoyplotResult<()> {
        tracing::info!(width, height, "capture loaded");
        self.frame_dims = Some((width, height));
        if self.capture == CaptureState::Uninitialized {
            self.capture = CaptureState::Loaded;
        }
        self.refresh_layout()
    }

    #[tracing::instrument(skip(self))]
    pub fn on_metadata_resized(&mut self, width: u32, height: u32) -> JoyplotResult<()> {
        tracing::info!(width, height, "capture resized to true dimensions");
        self.frame_dims = Some((width, height));
        self.capture = CaptureState::MetadataResized;
        self.refresh_layout()
    }

    /// One display refresh.
    ///
    /// Always clears `surface`. Draws only once the capture is loaded and a
    /// frame is available. A frame whose size differs from the known capture
    /// size is treated as a late metadata resize, and a target whose size
    /// differs from the session surface is adopted as a surface resize.
    pub fn tick(
        &mut self,
        surface: &mut dyn DrawSurface,
        frame: Option<&VideoFrame>,
    ) -> JoyplotResult<RenderOutcome> {
        if let Some(target) = surface.size()
            && target != self.surface
        {
            tracing::debug!(?target, previous = ?self.surface, "draw target resized");
            self.resize_surface(target)?;
        }

        if self.capture == CaptureState::Uninitialized {
            surface.clear(self.params.background)?;
            tracing::debug!("capture not loaded, skipping render pass");
            return Ok(RenderOutcome::Skipped(SkipReason::NotLoaded));
        }

        if let Some(f) = frame
            && self.frame_dims != Some(f.dimensions())
        {
            self.on_metadata_resized(f.width(), f.height())?;
        }

        let Some((_, layout)) = &self.layout else {
            surface.clear(self.params.background)?;
            return Ok(RenderOutcome::Skipped(SkipReason::NoFrame));
        };
        render_frame(surface, frame, &self.params, layout)
    }

    fn refresh_layout(&mut self) -> JoyplotResult<()> {
        let Some(frame) = self.frame_dims else {
            return Ok(());
        };
        let key = LayoutKey {
            epoch: self.epoch,
            frame,
            surface: self.surface,
        };

        let next = match &self.layout {
            Some((k, _)) if *k == key => return Ok(()),
            // Frame size changes always go through a full recompute.
            Some((k, l)) if k.frame == frame => {
                l.recompute(&self.params, frame.0, frame.1, self.surface)?
            }
            _ => Layout::compute(&self.params, frame.0, frame.1, self.surface)?,
        };
        self.layout = Some((key, next));
        Ok(())
    }
}
