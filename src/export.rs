use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{Datelike as _, NaiveDateTime, Timelike as _};

use crate::{
    core::Rgba8,
    error::{JoyplotError, JoyplotResult},
    render::FrameRGBA,
};

pub const SNAPSHOT_PREFIX: &str = "unknownpleasures_";
pub const SEQUENCE_PREFIX: &str = "joyplot_";

/// `unknownpleasures_YYYYMMDDHHMMSS.jpg`
pub fn snapshot_file_name(at: NaiveDateTime) -> String {
    format!(
        "{SNAPSHOT_PREFIX}{:04}{:02}{:02}{:02}{:02}{:02}.jpg",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// `dir/joyplot_NNNNNN.png`, numbered from 1.
pub fn sequence_frame_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{SEQUENCE_PREFIX}{index:06}.png"))
}

fn ensure_parent_dir(path: &Path) -> JoyplotResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write `frame` as an opaque image; the format follows the file extension.
pub fn save_frame(frame: &FrameRGBA, path: &Path, bg: Rgba8) -> JoyplotResult<()> {
    let format = image::ImageFormat::from_path(path).map_err(|e| {
        JoyplotError::validation(format!(
            "unsupported image extension for '{}': {e}",
            path.display()
        ))
    })?;
    ensure_parent_dir(path)?;

    let rgba = frame.to_opaque_rgba8(bg)?;
    let written = match format {
        image::ImageFormat::Jpeg => {
            let rgb: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::save_buffer_with_format(
                path,
                &rgb,
                frame.width,
                frame.height,
                image::ColorType::Rgb8,
                format,
            )
        }
        _ => image::save_buffer_with_format(
            path,
            &rgba,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            format,
        ),
    };
    written.with_context(|| format!("write image '{}'", path.display()))?;

    tracing::info!(path = %path.display(), "saved frame");
    Ok(())
}

/// Save `frame` into `dir` under a local-time snapshot name.
pub fn save_snapshot(frame: &FrameRGBA, dir: &Path, bg: Rgba8) -> JoyplotResult<PathBuf> {
    let name = snapshot_file_name(chrono::Local::now().naive_local());
    let path = dir.join(name);
    save_frame(frame, &path, bg)?;
    Ok(path)
}
