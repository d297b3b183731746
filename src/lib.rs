//! Hand-landmark overlay pipeline.
//!
//! Two cooperating pieces over external collaborators: a frame adapter that
//! turns raw camera buffers into packed RGBA bitmaps and submits them for
//! asynchronous detection, and an overlay renderer that maps each detected
//! hand's normalized landmarks onto the view and draws the skeleton.
//! Detection itself is behind the [`pipeline::HandLandmarker`] trait; results
//! travel over a channel into the UI-owned [`pipeline::OverlaySession`].

pub mod overlay;
pub mod pipeline;
pub mod raster;
pub mod skeleton;
pub mod types;

pub use overlay::{Canvas, LandmarkOverlay, Paint, PaintStyle};
pub use pipeline::{
    CameraFrame, FrameAdapter, HandLandmarker, OverlaySession, PixelFormat, StubLandmarker,
    start_frame_adapter,
};
pub use raster::PixmapCanvas;
pub use types::{
    Bitmap, DetectionResult, DetectorEvent, DetectorOptions, Hand, NormalizedLandmark, RunningMode,
};
