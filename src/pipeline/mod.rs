pub mod detector;
pub mod frame_adapter;
pub mod session;

// Re-exports for convenience
pub use detector::{HandLandmarker, StubLandmarker};
pub use frame_adapter::{
    CameraFrame, ConvertError, FrameAdapter, PixelFormat, convert_frame, start_frame_adapter,
};
pub use session::OverlaySession;
