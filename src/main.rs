//! Demo: drives synthetic camera frames through the full pipeline (frame
//! adapter → stub detector → overlay session) and writes the composited
//! overlay to `overlay.png`.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::bounded;
use handmark::pipeline::convert_frame;
use handmark::{
    CameraFrame, DetectorOptions, OverlaySession, PixmapCanvas, StubLandmarker,
    start_frame_adapter,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAMES: usize = 30;

fn main() -> Result<()> {
    env_logger::init();

    let (frame_tx, frame_rx) = bounded(1);
    let (event_tx, event_rx) = bounded(FRAMES);

    let options = DetectorOptions::default();
    let mut session = OverlaySession::new(event_rx, options.running_mode);
    let adapter = start_frame_adapter(frame_rx, StubLandmarker::new(event_tx, options));

    let released = Arc::new(AtomicUsize::new(0));
    let producer = {
        let released = released.clone();
        thread::spawn(move || {
            for seq in 0..FRAMES {
                let released = released.clone();
                let frame = synth_frame(seq as u32).with_release(move || {
                    released.fetch_add(1, Ordering::SeqCst);
                });
                // Drop the frame if the adapter is busy, like a live camera.
                let _ = frame_tx.try_send(frame);
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    producer
        .join()
        .map_err(|_| anyhow!("frame producer panicked"))?;
    adapter
        .join()
        .map_err(|_| anyhow!("frame adapter panicked"))?;
    log::info!("released {} camera buffers", released.load(Ordering::SeqCst));

    if !session.pump() {
        return Err(anyhow!("no detection result reached the session"));
    }
    let backdrop = convert_frame(&synth_frame(FRAMES as u32 - 1))
        .map_err(|err| anyhow!("backdrop conversion failed: {err}"))?;
    let mut canvas = PixmapCanvas::from_rgba(backdrop.rgba, backdrop.width, backdrop.height)
        .context("backdrop buffer size mismatch")?;
    session.overlay_mut().draw(&mut canvas);
    log::info!("scale factor after draw: {}", session.overlay().scale_factor());

    let image = canvas.into_image().context("canvas size overflow")?;
    image.save("overlay.png").context("writing overlay.png")?;
    log::info!("wrote overlay.png");

    Ok(())
}

/// Planar YUV 4:2:0 gradient that drifts with the sequence number.
fn synth_frame(seq: u32) -> CameraFrame {
    let mut y = vec![0u8; (WIDTH * HEIGHT) as usize];
    for (i, value) in y.iter_mut().enumerate() {
        let row = i as u32 / WIDTH;
        *value = ((row + seq * 4) % 256) as u8;
    }
    let chroma_len = ((WIDTH / 2) * (HEIGHT / 2)) as usize;
    let u = vec![118u8; chroma_len];
    let v = vec![138u8; chroma_len];
    CameraFrame::planar(WIDTH, HEIGHT, y, u, v)
}
