use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::{
    error::{JoyplotError, JoyplotResult},
    frame::VideoFrame,
    source::{SourceEvent, VideoSource},
};

#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> JoyplotResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = std::process::Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| JoyplotError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(JoyplotError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| JoyplotError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| JoyplotError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| JoyplotError::media("missing video height from ffprobe"))?;

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> JoyplotResult<VideoSourceInfo> {
    Err(JoyplotError::media(
        "video file input requires the 'media-ffmpeg' feature",
    ))
}

/// Video file decoded frame by frame through an `ffmpeg` child process.
///
/// `ffmpeg` is only started on the first [`VideoSource::next_frame`] call;
/// until then only `Loaded` (from `ffprobe`) is known.
pub struct FfmpegSource {
    info: VideoSourceInfo,
    events: VecDeque<SourceEvent>,
    decoder: Option<RawFrameReader>,
    current: Option<VideoFrame>,
    max_frames: Option<u64>,
    decoded: u64,
    ended: bool,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> JoyplotResult<Self> {
        let info = probe_video(path)?;
        Ok(Self::from_info(info))
    }

    pub fn from_info(info: VideoSourceInfo) -> Self {
        let events = VecDeque::from([SourceEvent::Loaded {
            width: info.width,
            height: info.height,
        }]);
        Self {
            info,
            events,
            decoder: None,
            current: None,
            max_frames: None,
            decoded: 0,
            ended: false,
        }
    }

    /// Stop after `n` frames.
    pub fn with_max_frames(mut self, n: u64) -> Self {
        self.max_frames = Some(n);
        self
    }

    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if let Some(d) = self.decoder.take()
            && let Err(e) = d.stop()
        {
            tracing::warn!(error = %e, "ffmpeg decoder did not shut down cleanly");
        }
    }
}

impl VideoSource for FfmpegSource {
    fn poll_event(&mut self) -> Option<SourceEvent> {
        self.events.pop_front()
    }

    fn next_frame(&mut self) -> JoyplotResult<Option<&VideoFrame>> {
        if self.ended || self.max_frames.is_some_and(|max| self.decoded >= max) {
            self.current = None;
            self.ended = true;
            if let Some(d) = self.decoder.take() {
                d.stop()?;
            }
            return Ok(None);
        }
        if self.decoder.is_none() {
            self.decoder = Some(RawFrameReader::spawn(&self.info)?);
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(None);
        };

        match decoder.read_frame()? {
            Some(bytes) => {
                self.current = Some(VideoFrame::from_rgba8(
                    self.info.width,
                    self.info.height,
                    bytes,
                )?);
                self.decoded += 1;
            }
            None => {
                self.current = None;
                self.ended = true;
                if let Some(d) = self.decoder.take() {
                    d.finish()?;
                }
            }
        }
        Ok(self.current.as_ref())
    }
}

#[cfg(feature = "media-ffmpeg")]
struct RawFrameReader {
    child: std::process::Child,
    stdout: std::process::ChildStdout,
    frame_len: usize,
    source_path: PathBuf,
}

#[cfg(feature = "media-ffmpeg")]
impl RawFrameReader {
    fn spawn(info: &VideoSourceInfo) -> JoyplotResult<Self> {
        use std::process::{Command, Stdio};

        let frame_len = info.width as usize * info.height as usize * crate::frame::CHANNELS;
        if frame_len == 0 {
            return Err(JoyplotError::media(
                "decoded video frame size is zero (invalid source dimensions)",
            ));
        }

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(&info.source_path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                JoyplotError::media(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| JoyplotError::media("failed to open ffmpeg stdout (unexpected)"))?;

        Ok(Self {
            child,
            stdout,
            frame_len,
            source_path: info.source_path.clone(),
        })
    }

    fn read_frame(&mut self) -> JoyplotResult<Option<Vec<u8>>> {
        use std::io::Read as _;

        let mut buf = vec![0u8; self.frame_len];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.stdout.read(&mut buf[filled..]).map_err(|e| {
                JoyplotError::media(format!("failed to read frame from ffmpeg stdout: {e}"))
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        match filled {
            0 => Ok(None),
            n if n == buf.len() => Ok(Some(buf)),
            n => Err(JoyplotError::media(format!(
                "truncated video frame from '{}': got {n} bytes, expected {}",
                self.source_path.display(),
                self.frame_len
            ))),
        }
    }

    /// Kill a decoder that still has frames to give, then reap it.
    fn stop(mut self) -> JoyplotResult<()> {
        drop(self.stdout);
        // Already exited is fine.
        let _ = self.child.kill();
        self.child
            .wait()
            .map_err(|e| JoyplotError::media(format!("failed to reap ffmpeg: {e}")))?;
        Ok(())
    }

    fn finish(self) -> JoyplotResult<()> {
        drop(self.stdout);
        let output = self.child.wait_with_output().map_err(|e| {
            JoyplotError::media(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            return Err(JoyplotError::media(format!(
                "ffmpeg video decode failed for '{}': {}",
                self.source_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[cfg(not(feature = "media-ffmpeg"))]
struct RawFrameReader;

#[cfg(not(feature = "media-ffmpeg"))]
impl RawFrameReader {
    fn spawn(_info: &VideoSourceInfo) -> JoyplotResult<Self> {
        Err(JoyplotError::media(
            "video file input requires the 'media-ffmpeg' feature",
        ))
    }

    fn read_frame(&mut self) -> JoyplotResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn finish(self) -> JoyplotResult<()> {
        Ok(())
    }

    fn stop(self) -> JoyplotResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> VideoSourceInfo {
        VideoSourceInfo {
            source_path: PathBuf::from("clip.mp4"),
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn ffmpeg_source_signals_probed_size_first() {
        let mut s = FfmpegSource::from_info(info());
        assert_eq!(
            s.poll_event(),
            Some(SourceEvent::Loaded {
                width: 640,
                height: 480
            })
        );
        assert_eq!(s.poll_event(), None);
    }

    #[test]
    fn zero_max_frames_ends_without_spawning() {
        let mut s = FfmpegSource::from_info(info()).with_max_frames(0);
        assert!(s.next_frame().unwrap().is_none());
        assert!(s.decoder.is_none());
        assert!(s.next_frame().unwrap().is_none());
    }

    #[cfg(feature = "media-ffmpeg")]
    mod ffmpeg {
        use std::process::{Command, Stdio};

        use super::*;

        fn tools_available() -> bool {
            ["ffmpeg", "ffprobe"].iter().all(|tool| {
                Command::new(tool)
                    .arg("-version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map(|s| s.success())
                    .unwrap_or(false)
            })
        }

        fn synth_clip(name: &str) -> PathBuf {
            let root = std::env::temp_dir().join(format!(
                "joyplot_media_{name}_{}_{}",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_nanos()
            ));
            std::fs::create_dir_all(&root).unwrap();
            let path = root.join("clip.mp4");
            let status = Command::new("ffmpeg")
                .args([
                    "-v",
                    "error",
                    "-y",
                    "-f",
                    "lavfi",
                    "-i",
                    "testsrc=size=32x24:rate=10",
                    "-t",
                    "1",
                    "-pix_fmt",
                    "yuv420p",
                ])
                .arg(&path)
                .status()
                .unwrap();
            assert!(status.success());
            path
        }

        #[test]
        fn frame_cap_reaps_the_decoder() {
            if !tools_available() {
                return;
            }
            let path = synth_clip("cap");
            let mut s = FfmpegSource::open(&path).unwrap().with_max_frames(2);
            assert_eq!((s.info().width, s.info().height), (32, 24));

            for _ in 0..2 {
                let frame = s.next_frame().unwrap().unwrap();
                assert_eq!((frame.width(), frame.height()), (32, 24));
            }
            assert!(s.decoder.is_some());

            assert!(s.next_frame().unwrap().is_none());
            assert!(s.decoder.is_none());
            assert!(s.next_frame().unwrap().is_none());
        }

        #[test]
        fn drains_to_end_of_stream() {
            if !tools_available() {
                return;
            }
            let path = synth_clip("eos");
            let mut s = FfmpegSource::open(&path).unwrap();
            let mut n = 0;
            while s.next_frame().unwrap().is_some() {
                n += 1;
            }
            assert!((9..=11).contains(&n), "decoded {n} frames");
            assert!(s.decoder.is_none());
        }
    }
}
