//! Overlay renderer: maps normalized hand landmarks into view-space pixels
//! and draws points plus skeleton edges on top of the camera preview.

use crate::skeleton::HAND_CONNECTIONS;
use crate::types::{DetectionResult, NormalizedLandmark, RunningMode};

/// Stroke width shared by points and skeleton lines.
const LANDMARK_STROKE_WIDTH: f32 = 8.0;
/// Skeleton edge color (deep purple).
const LINE_COLOR: [u8; 4] = [0x37, 0x00, 0xB3, 0xFF];
/// Landmark point color (yellow).
const POINT_COLOR: [u8; 4] = [0xFF, 0xFF, 0x00, 0xFF];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintStyle {
    Fill,
    Stroke,
}

/// Drawing attributes for one primitive class. Hosts may tweak these between
/// frames; [`LandmarkOverlay::clear`] restores the initial configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: [u8; 4],
    pub stroke_width: f32,
    pub style: PaintStyle,
}

/// Rendering-surface boundary. The host owns the actual surface; the overlay
/// only needs its current pixel size and two primitives. Dimensions are read
/// at draw time, so a resize between `set_results` and `draw` is reflected.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn draw_point(&mut self, x: f32, y: f32, paint: &Paint);
    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, paint: &Paint);
}

/// Holds the latest detection result and renders it on demand.
///
/// Single writer, single reader: results arrive through the owner's update
/// path (see [`crate::pipeline::OverlaySession`]) and `draw` runs on the same
/// thread. State is replaced wholesale per result, never partially mutated.
#[derive(Debug)]
pub struct LandmarkOverlay {
    results: Option<DetectionResult>,
    image_width: u32,
    image_height: u32,
    running_mode: RunningMode,
    scale_factor: f32,
    line_paint: Paint,
    point_paint: Paint,
    needs_redraw: bool,
}

impl LandmarkOverlay {
    pub fn new() -> Self {
        LandmarkOverlay {
            results: None,
            image_width: 1,
            image_height: 1,
            running_mode: RunningMode::Image,
            scale_factor: 1.0,
            line_paint: initial_line_paint(),
            point_paint: initial_point_paint(),
            needs_redraw: false,
        }
    }

    /// Replaces the overlay state with a new result and schedules a redraw.
    ///
    /// `image_width`/`image_height` are the source frame's pixel dimensions.
    /// Non-positive dimensions are not an error; the scale factor falls back
    /// to 1 at draw time.
    pub fn set_results(
        &mut self,
        results: DetectionResult,
        image_width: u32,
        image_height: u32,
        running_mode: RunningMode,
    ) {
        self.results = Some(results);
        self.image_width = image_width;
        self.image_height = image_height;
        self.running_mode = running_mode;
        self.needs_redraw = true;
    }

    /// Drops the current result and restores both paints to their initial
    /// configuration, so transient style mutation cannot leak into the next
    /// session. The next draw produces an empty canvas.
    pub fn clear(&mut self) {
        self.results = None;
        self.line_paint = initial_line_paint();
        self.point_paint = initial_point_paint();
        self.needs_redraw = true;
    }

    /// Consumes the pending-redraw flag. The host's render loop polls this
    /// in place of a view `invalidate()`.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Draws the current result onto `canvas`: every landmark as a point,
    /// then every skeleton edge of that same hand as a line. No result means
    /// no primitives.
    pub fn draw(&mut self, canvas: &mut dyn Canvas) {
        let view_w = canvas.width();
        let view_h = canvas.height();
        self.scale_factor = scale_factor_for(
            self.running_mode,
            self.image_width,
            self.image_height,
            view_w,
            view_h,
        );

        let Some(results) = &self.results else {
            return;
        };
        for hand in &results.hands {
            for landmark in &hand.landmarks {
                let (x, y) = map_to_view(*landmark, view_w, view_h);
                canvas.draw_point(x, y, &self.point_paint);
            }
            for &(start, end) in HAND_CONNECTIONS {
                if let (Some(a), Some(b)) =
                    (hand.landmarks.get(start), hand.landmarks.get(end))
                {
                    let (x0, y0) = map_to_view(*a, view_w, view_h);
                    let (x1, y1) = map_to_view(*b, view_w, view_h);
                    canvas.draw_line(x0, y0, x1, y1, &self.line_paint);
                }
            }
        }
    }

    /// Scale factor derived from the last draw. Stored for letterbox or crop
    /// correction by the host; it is not applied to the point mapping.
    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn line_paint_mut(&mut self) -> &mut Paint {
        &mut self.line_paint
    }

    pub fn point_paint_mut(&mut self) -> &mut Paint {
        &mut self.point_paint
    }
}

impl Default for LandmarkOverlay {
    fn default() -> Self {
        Self::new()
    }
}

fn initial_line_paint() -> Paint {
    Paint {
        color: LINE_COLOR,
        stroke_width: LANDMARK_STROKE_WIDTH,
        style: PaintStyle::Stroke,
    }
}

fn initial_point_paint() -> Paint {
    Paint {
        color: POINT_COLOR,
        stroke_width: LANDMARK_STROKE_WIDTH,
        style: PaintStyle::Fill,
    }
}

/// Maps a normalized landmark into view pixels. The `(1 - y)` flip corrects
/// the detector's top-left-origin convention to the view's.
fn map_to_view(landmark: NormalizedLandmark, view_w: u32, view_h: u32) -> (f32, f32) {
    (
        landmark.x * view_w as f32,
        (1.0 - landmark.y) * view_h as f32,
    )
}

/// Image/Video fit entirely within the view (may letterbox); LiveStream
/// fills the view entirely (may crop). Non-positive dimensions fall back
/// to a factor of 1.
fn scale_factor_for(
    mode: RunningMode,
    image_w: u32,
    image_h: u32,
    view_w: u32,
    view_h: u32,
) -> f32 {
    if image_w == 0 || image_h == 0 || view_w == 0 || view_h == 0 {
        return 1.0;
    }
    let wx = view_w as f32 / image_w as f32;
    let wy = view_h as f32 / image_h as f32;
    match mode {
        RunningMode::Image | RunningMode::Video => wx.min(wy),
        RunningMode::LiveStream => wx.max(wy),
    }
}
