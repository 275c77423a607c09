use crate::{
    core::{BezPath, Rgba8, Surface},
    error::{JoyplotError, JoyplotResult},
    frame::VideoFrame,
    layout::Layout,
    params::{LineStyle, Params},
    plot::build_lines,
};

/// Rendered RGBA8 pixels, read back from a surface.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Opaque RGBA8 copy with any transparency composited over `bg`.
    pub fn to_opaque_rgba8(&self, bg: Rgba8) -> JoyplotResult<Vec<u8>> {
        let mut out = vec![0u8; self.data.len()];
        flatten_to_opaque_rgba8(&mut out, &self.data, self.premultiplied, bg)?;
        Ok(out)
    }
}

/// Drawing target for the frame renderer. Coordinates are logical pixels.
pub trait DrawSurface {
    /// Physical size and density of the target, when it has a fixed one.
    fn size(&self) -> Option<Surface> {
        None
    }

    /// Drop everything drawn so far and fill with `color`.
    fn clear(&mut self, color: Rgba8) -> JoyplotResult<()>;

    /// Fill then stroke one closed path.
    fn fill_stroke(&mut self, path: &BezPath, style: &LineStyle) -> JoyplotResult<()>;
}

/// Why a render pass drew nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The source has not signalled that pixel data is available.
    NotLoaded,
    /// The source was loaded but produced no frame this tick.
    NoFrame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Skipped(SkipReason),
    Drawn { lines: usize },
}

/// One render pass: clear, then fill and stroke every line.
///
/// Without a frame only the clear happens. All shapes are built before the
/// first one is drawn, so a failure never leaves a partial set of lines.
pub fn render_frame(
    surface: &mut dyn DrawSurface,
    frame: Option<&VideoFrame>,
    params: &Params,
    layout: &Layout,
) -> JoyplotResult<RenderOutcome> {
    surface.clear(params.background)?;

    let Some(frame) = frame else {
        tracing::debug!("no frame available, skipping render pass");
        return Ok(RenderOutcome::Skipped(SkipReason::NoFrame));
    };

    let lines = build_lines(frame, params, layout)?;
    for path in &lines {
        surface.fill_stroke(path, &params.style)?;
    }
    Ok(RenderOutcome::Drawn { lines: lines.len() })
}

/// Recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear(Rgba8),
    FillStroke { path: BezPath, style: LineStyle },
}

/// Surface that only remembers what was drawn since the last clear.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn paths(&self) -> impl Iterator<Item = &BezPath> {
        self.ops.iter().filter_map(|op| match op {
            SurfaceOp::FillStroke { path, .. } => Some(path),
            SurfaceOp::Clear(_) => None,
        })
    }

    pub fn path_count(&self) -> usize {
        self.paths().count()
    }
}

impl DrawSurface for RecordingSurface {
    fn clear(&mut self, color: Rgba8) -> JoyplotResult<()> {
        self.ops.clear();
        self.ops.push(SurfaceOp::Clear(color));
        Ok(())
    }

    fn fill_stroke(&mut self, path: &BezPath, style: &LineStyle) -> JoyplotResult<()> {
        self.ops.push(SurfaceOp::FillStroke {
            path: path.clone(),
            style: *style,
        });
        Ok(())
    }
}

/// `vello_cpu` rasterizing surface.
///
/// Logical coordinates are scaled by the surface density, so the pixmap is
/// `surface.width x surface.height` physical pixels.
pub struct CpuSurface {
    surface: Surface,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl CpuSurface {
    pub fn new(surface: Surface) -> JoyplotResult<Self> {
        surface.validate()?;
        let width: u16 = surface
            .width
            .try_into()
            .map_err(|_| JoyplotError::render("surface width exceeds u16"))?;
        let height: u16 = surface
            .height
            .try_into()
            .map_err(|_| JoyplotError::render("surface height exceeds u16"))?;

        Ok(Self {
            surface,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Rasterize everything drawn since the last clear.
    pub fn readback(&mut self) -> FrameRGBA {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        FrameRGBA {
            width: self.surface.width,
            height: self.surface.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn logical_transform(&self) -> vello_cpu::kurbo::Affine {
        vello_cpu::kurbo::Affine::scale(self.surface.density)
    }
}

impl DrawSurface for CpuSurface {
    fn size(&self) -> Option<Surface> {
        Some(self.surface)
    }

    fn clear(&mut self, color: Rgba8) -> JoyplotResult<()> {
        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.surface.width),
            f64::from(self.surface.height),
        ));
        Ok(())
    }

    fn fill_stroke(&mut self, path: &BezPath, style: &LineStyle) -> JoyplotResult<()> {
        let cpu_path = bezpath_to_cpu(path);
        let transform = self.logical_transform();
        self.ctx.set_transform(transform);

        self.ctx.set_paint(color_to_cpu(style.fill));
        self.ctx.fill_path(&cpu_path);

        if style.stroke_width > 0.0 {
            let stroke = vello_cpu::kurbo::Stroke::new(style.stroke_width)
                .with_caps(vello_cpu::kurbo::Cap::Round)
                .with_join(vello_cpu::kurbo::Join::Round);
            self.ctx.set_stroke(stroke);
            self.ctx.set_paint(color_to_cpu(style.stroke));
            self.ctx.stroke_path(&cpu_path);
        }
        Ok(())
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn point_to_cpu(p: crate::core::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg: Rgba8,
) -> JoyplotResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(JoyplotError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let (r, g, b) = if src_is_premul {
            (
                u16::from(s[0]) + mul_div255(bg_r, inv),
                u16::from(s[1]) + mul_div255(bg_g, inv),
                u16::from(s[2]) + mul_div255(bg_b, inv),
            )
        } else {
            (
                mul_div255(u16::from(s[0]), a) + mul_div255(bg_r, inv),
                mul_div255(u16::from(s[1]), a) + mul_div255(bg_g, inv),
                mul_div255(u16::from(s[2]), a) + mul_div255(bg_b, inv),
            )
        };

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
