use crossbeam_channel::Sender;

/// One keypoint of a detected hand, normalized to the source frame.
///
/// `x` and `y` are in `[0, 1]` relative to the frame's width and height with
/// the origin at the top-left corner. `z` is relative depth and is not used
/// for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        NormalizedLandmark { x, y, z }
    }
}

/// Ordered landmark list for one detected hand. The index of each landmark
/// names a specific joint (see [`crate::skeleton`]).
#[derive(Clone, Debug, Default)]
pub struct Hand {
    pub landmarks: Vec<NormalizedLandmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<NormalizedLandmark>) -> Self {
        Hand { landmarks }
    }
}

/// All hands detected in a single frame. Immutable once produced.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    pub hands: Vec<Hand>,
}

impl DetectionResult {
    pub fn new(hands: Vec<Hand>) -> Self {
        DetectionResult { hands }
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

/// Detector operating mode. Selects the scale-fit policy of the overlay:
/// `Image` and `Video` letterbox (fit entirely within the view), `LiveStream`
/// crops (fill the view entirely), matching a fill-start camera preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunningMode {
    Image,
    Video,
    LiveStream,
}

/// Packed RGBA frame, the pixel layout the detector consumes.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Bitmap {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Bitmap {
            rgba,
            width,
            height,
        }
    }
}

/// Detector configuration. One struct covers every pipeline variant instead
/// of per-variant wiring.
#[derive(Clone, Copy, Debug)]
pub struct DetectorOptions {
    pub num_hands: usize,
    pub min_hand_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub min_hand_presence_confidence: f32,
    pub running_mode: RunningMode,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        DetectorOptions {
            num_hands: 2,
            min_hand_detection_confidence: 0.7,
            min_tracking_confidence: 0.7,
            min_hand_presence_confidence: 0.7,
            running_mode: RunningMode::LiveStream,
        }
    }
}

/// Event emitted by a detector onto its result channel. Errors carry a
/// message only; the overlay keeps its previous state when one arrives.
#[derive(Clone, Debug)]
pub enum DetectorEvent {
    Result {
        result: DetectionResult,
        image_width: u32,
        image_height: u32,
        timestamp_ms: i64,
    },
    Error(String),
}

/// Sending half of a detector's result channel.
pub type DetectorEventSender = Sender<DetectorEvent>;
