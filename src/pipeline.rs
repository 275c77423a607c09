use std::path::Path;

use crate::{
    core::Surface,
    error::{JoyplotError, JoyplotResult},
    export,
    frame::VideoFrame,
    params::Params,
    render::{CpuSurface, FrameRGBA, RenderOutcome},
    session::Session,
    source::VideoSource,
};

/// Feed every pending lifecycle signal from `source` into `session`.
pub fn drain_events(source: &mut dyn VideoSource, session: &mut Session) -> JoyplotResult<()> {
    while let Some(event) = source.poll_event() {
        session.handle_event(event)?;
    }
    Ok(())
}

/// Render one still frame onto a fresh CPU surface.
pub fn render_still(frame: &VideoFrame, params: &Params, surface: Surface) -> JoyplotResult<FrameRGBA> {
    let mut session = Session::new(params.clone(), surface)?;
    session.on_loaded(frame.width(), frame.height())?;

    let mut cpu = CpuSurface::new(surface)?;
    session.tick(&mut cpu, Some(frame))?;
    Ok(cpu.readback())
}

/// Render every frame of `source` into `out_dir` as a numbered PNG sequence.
///
/// Returns the number of frames written.
#[tracing::instrument(level = "debug", skip(source, params))]
pub fn render_sequence(
    source: &mut dyn VideoSource,
    params: &Params,
    surface: Surface,
    out_dir: &Path,
) -> JoyplotResult<u64> {
    let mut session = Session::new(params.clone(), surface)?;
    let mut cpu = CpuSurface::new(surface)?;

    let mut written = 0u64;
    loop {
        drain_events(source, &mut session)?;
        let Some(frame) = source.next_frame()? else {
            break;
        };
        if let RenderOutcome::Skipped(reason) = session.tick(&mut cpu, Some(frame))? {
            tracing::debug!(?reason, "frame skipped");
        }
        written += 1;
        let path = export::sequence_frame_path(out_dir, written);
        export::save_frame(&cpu.readback(), &path, session.params().background)?;
    }

    if written == 0 {
        return Err(JoyplotError::media("source produced no frames"));
    }
    tracing::info!(frames = written, out = %out_dir.display(), "wrote joyplot sequence");
    Ok(written)
}
