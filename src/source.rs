use std::collections::VecDeque;
use std::path::Path;

use crate::{error::JoyplotResult, frame::VideoFrame};

/// Lifecycle signal from a video source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEvent {
    /// Pixel data became readable at (possibly provisional) dimensions.
    Loaded { width: u32, height: u32 },
    /// True dimensions are known; fired at most once, after `Loaded`.
    MetadataResized { width: u32, height: u32 },
}

/// Supplier of frames for the renderer.
pub trait VideoSource {
    /// Next pending lifecycle signal, if any.
    fn poll_event(&mut self) -> Option<SourceEvent>;

    /// Advance to the next frame. `None` once the source is exhausted.
    fn next_frame(&mut self) -> JoyplotResult<Option<&VideoFrame>>;
}

/// A single still image shown on every tick.
#[derive(Debug)]
pub struct StillSource {
    frame: VideoFrame,
    events: VecDeque<SourceEvent>,
}

impl StillSource {
    pub fn new(frame: VideoFrame) -> Self {
        let events = VecDeque::from([SourceEvent::Loaded {
            width: frame.width(),
            height: frame.height(),
        }]);
        Self { frame, events }
    }

    pub fn open(path: &Path) -> JoyplotResult<Self> {
        Ok(Self::new(VideoFrame::open(path)?))
    }
}

impl VideoSource for StillSource {
    fn poll_event(&mut self) -> Option<SourceEvent> {
        self.events.pop_front()
    }

    fn next_frame(&mut self) -> JoyplotResult<Option<&VideoFrame>> {
        Ok(Some(&self.frame))
    }
}

/// In-memory frames played once, in order.
///
/// Signals `Loaded` with the first frame's size and `MetadataResized` the
/// first time a frame of a different size is reached.
#[derive(Debug)]
pub struct FrameSequence {
    frames: VecDeque<VideoFrame>,
    current: Option<VideoFrame>,
    events: VecDeque<SourceEvent>,
    loaded: Option<(u32, u32)>,
    resized: bool,
}

impl FrameSequence {
    pub fn new(frames: impl IntoIterator<Item = VideoFrame>) -> Self {
        let frames: VecDeque<VideoFrame> = frames.into_iter().collect();
        let mut events = VecDeque::new();
        let loaded = frames.front().map(VideoFrame::dimensions);
        if let Some((width, height)) = loaded {
            events.push_back(SourceEvent::Loaded { width, height });
        }
        Self {
            frames,
            current: None,
            events,
            loaded,
            resized: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl VideoSource for FrameSequence {
    fn poll_event(&mut self) -> Option<SourceEvent> {
        self.events.pop_front()
    }

    fn next_frame(&mut self) -> JoyplotResult<Option<&VideoFrame>> {
        self.current = self.frames.pop_front();
        if let Some(f) = &self.current
            && !self.resized
            && self.loaded != Some(f.dimensions())
        {
            self.resized = true;
            self.events.push_back(SourceEvent::MetadataResized {
                width: f.width(),
                height: f.height(),
            });
        }
        Ok(self.current.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_source_loads_once_and_repeats() {
        let mut s = StillSource::new(VideoFrame::solid(4, 3, 9).unwrap());
        assert_eq!(
            s.poll_event(),
            Some(SourceEvent::Loaded {
                width: 4,
                height: 3
            })
        );
        assert_eq!(s.poll_event(), None);
        for _ in 0..3 {
            assert_eq!(s.next_frame().unwrap().unwrap().brightness(0, 0), 9);
        }
    }

    #[test]
    fn sequence_reports_a_single_late_resize() {
        let mut s = FrameSequence::new([
            VideoFrame::solid(4, 3, 0).unwrap(),
            VideoFrame::solid(8, 6, 0).unwrap(),
            VideoFrame::solid(4, 3, 0).unwrap(),
        ]);
        assert!(matches!(s.poll_event(), Some(SourceEvent::Loaded { .. })));

        s.next_frame().unwrap();
        assert_eq!(s.poll_event(), None);

        s.next_frame().unwrap();
        assert_eq!(
            s.poll_event(),
            Some(SourceEvent::MetadataResized {
                width: 8,
                height: 6
            })
        );

        s.next_frame().unwrap();
        assert_eq!(s.poll_event(), None);
        assert!(s.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_sequence_never_loads() {
        let mut s = FrameSequence::new(Vec::new());
        assert_eq!(s.poll_event(), None);
        assert!(s.next_frame().unwrap().is_none());
        assert_eq!(s.remaining(), 0);
    }
}
