//! Detector boundary: the async submission trait plus a deterministic stub
//! backend used by the demo binary and the tests.

use anyhow::Result;

use crate::skeleton::NUM_LANDMARKS;
use crate::types::{
    Bitmap, DetectionResult, DetectorEvent, DetectorEventSender, DetectorOptions, Hand,
    NormalizedLandmark,
};

/// Asynchronous hand-landmark detector.
///
/// `detect_async` hands off a frame and returns; the completed
/// [`DetectorEvent`] arrives later on the result channel the backend was
/// constructed with. Timestamps are strictly increasing per source and the
/// backend delivers results in submission order.
pub trait HandLandmarker {
    fn detect_async(&mut self, bitmap: Bitmap, timestamp_ms: i64) -> Result<()>;
}

/// Backend that reports a fixed, plausible hand for every frame. Stands in
/// for a real inference engine where none is wired up.
pub struct StubLandmarker {
    events: DetectorEventSender,
    options: DetectorOptions,
}

impl StubLandmarker {
    pub fn new(events: DetectorEventSender, options: DetectorOptions) -> Self {
        StubLandmarker { events, options }
    }
}

impl HandLandmarker for StubLandmarker {
    fn detect_async(&mut self, bitmap: Bitmap, timestamp_ms: i64) -> Result<()> {
        let hands = (0..self.options.num_hands.min(2))
            .map(|i| synthetic_hand(0.15 + 0.45 * i as f32))
            .collect();
        let event = DetectorEvent::Result {
            result: DetectionResult::new(hands),
            image_width: bitmap.width,
            image_height: bitmap.height,
            timestamp_ms,
        };
        // A send failure means the consuming session is gone; the result is
        // simply abandoned.
        if self.events.send(event).is_err() {
            log::debug!("dropping detection result at {timestamp_ms}ms: session closed");
        }
        Ok(())
    }
}

/// A rough open hand: wrist at the bottom, five fingers fanning upward.
fn synthetic_hand(offset_x: f32) -> Hand {
    let mut landmarks = Vec::with_capacity(NUM_LANDMARKS);
    // Wrist.
    landmarks.push(NormalizedLandmark::new(offset_x + 0.12, 0.85, 0.0));
    for finger in 0..5 {
        let base_x = offset_x + 0.05 * finger as f32;
        for joint in 0..4 {
            let t = (joint + 1) as f32 / 4.0;
            landmarks.push(NormalizedLandmark::new(
                base_x + 0.02 * t,
                0.75 - 0.45 * t,
                -0.05 * t,
            ));
        }
    }
    Hand::new(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn stub_reports_configured_hand_count() {
        let (tx, rx) = bounded(4);
        let options = DetectorOptions {
            num_hands: 2,
            ..DetectorOptions::default()
        };
        let mut stub = StubLandmarker::new(tx, options);
        stub.detect_async(Bitmap::new(vec![0; 16], 2, 2), 7).unwrap();

        match rx.try_recv().unwrap() {
            DetectorEvent::Result {
                result,
                image_width,
                image_height,
                timestamp_ms,
            } => {
                assert_eq!(result.hands.len(), 2);
                assert_eq!((image_width, image_height), (2, 2));
                assert_eq!(timestamp_ms, 7);
                for hand in &result.hands {
                    assert_eq!(hand.landmarks.len(), NUM_LANDMARKS);
                }
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn stub_survives_closed_session() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut stub = StubLandmarker::new(tx, DetectorOptions::default());
        stub.detect_async(Bitmap::new(vec![0; 16], 2, 2), 1).unwrap();
    }

    #[test]
    fn synthetic_hand_is_normalized() {
        let hand = synthetic_hand(0.15);
        for lm in &hand.landmarks {
            assert!((0.0..=1.0).contains(&lm.x));
            assert!((0.0..=1.0).contains(&lm.y));
        }
    }
}
