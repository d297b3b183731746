//! UI-side consumer of detector events. The session owns the overlay and the
//! receiving half of the result channel, so only the host's render thread
//! ever touches overlay state; dropping the session disconnects the channel
//! and any detection completing afterwards is discarded at the producer.

use crossbeam_channel::Receiver;

use crate::overlay::LandmarkOverlay;
use crate::types::{DetectorEvent, RunningMode};

pub struct OverlaySession {
    overlay: LandmarkOverlay,
    events_rx: Receiver<DetectorEvent>,
    running_mode: RunningMode,
    last_applied_ms: Option<i64>,
}

impl OverlaySession {
    pub fn new(events_rx: Receiver<DetectorEvent>, running_mode: RunningMode) -> Self {
        OverlaySession {
            overlay: LandmarkOverlay::new(),
            events_rx,
            running_mode,
            last_applied_ms: None,
        }
    }

    /// Drains all pending detector events in arrival order and applies them
    /// to the overlay, newest result winning. A result whose timestamp is
    /// not newer than the last applied one is discarded; detector errors are
    /// logged and leave the overlay untouched. Returns whether the host
    /// should redraw.
    pub fn pump(&mut self) -> bool {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                DetectorEvent::Result {
                    result,
                    image_width,
                    image_height,
                    timestamp_ms,
                } => {
                    if self
                        .last_applied_ms
                        .is_some_and(|last| timestamp_ms <= last)
                    {
                        log::debug!("discarding stale detection result at {timestamp_ms}ms");
                        continue;
                    }
                    self.last_applied_ms = Some(timestamp_ms);
                    self.overlay
                        .set_results(result, image_width, image_height, self.running_mode);
                }
                DetectorEvent::Error(message) => {
                    log::warn!("hand landmarker error: {message}");
                }
            }
        }
        self.overlay.take_redraw()
    }

    /// Clears the overlay and forgets the applied-timestamp watermark, so a
    /// restarted detector may begin a fresh timeline.
    pub fn clear(&mut self) {
        self.overlay.clear();
        self.last_applied_ms = None;
    }

    pub fn overlay(&self) -> &LandmarkOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut LandmarkOverlay {
        &mut self.overlay
    }
}
