#![forbid(unsafe_code)]

pub mod core;
pub mod envelope;
pub mod error;
pub mod export;
pub mod frame;
pub mod layout;
pub mod mapper;
pub mod media;
pub mod params;
pub mod pipeline;
pub mod plot;
pub mod render;
pub mod session;
pub mod source;

pub use crate::core::{Rgba8, Surface};
pub use envelope::{Envelope, gaussian};
pub use error::{JoyplotError, JoyplotResult};
pub use frame::VideoFrame;
pub use layout::{CropWindow, Layout, RenderOrigin, RenderScales};
pub use mapper::map_point;
pub use media::{FfmpegSource, VideoSourceInfo, probe_video};
pub use params::{LineStyle, Params};
pub use pipeline::{drain_events, render_sequence, render_still};
pub use plot::{build_line, build_lines};
pub use render::{
    CpuSurface, DrawSurface, FrameRGBA, RecordingSurface, RenderOutcome, SkipReason, SurfaceOp,
    render_frame,
};
pub use session::{CaptureState, Session};
pub use source::{FrameSequence, SourceEvent, StillSource, VideoSource};
