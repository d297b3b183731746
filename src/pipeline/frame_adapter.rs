//! Frame adapter: converts raw camera buffers into packed RGBA bitmaps and
//! submits them for asynchronous detection with strictly increasing
//! timestamps. A frame that cannot be converted is skipped, never fatal.

use std::{thread, time::Instant};

use anyhow::anyhow;
use crossbeam_channel::Receiver;
use rayon::prelude::*;
use thiserror::Error;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv21_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

use super::detector::HandLandmarker;
use crate::types::Bitmap;

/// Declared pixel layout of a camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Three separate planes: full-resolution Y plus quarter-resolution U
    /// and V (4:2:0).
    Yuv420Planar,
    /// Single packed 4:2:2 buffer, Y0 U Y1 V ordering.
    Yuyv422,
    /// Single JPEG-compressed buffer.
    Mjpeg,
    /// Single packed RGB buffer, 3 bytes per pixel.
    Rgb24,
    /// Anything the adapter does not understand; carries the source API's
    /// format code for logging.
    Unknown(u32),
}

/// One camera frame plus its release hook.
///
/// The capture pipeline requires every frame buffer back exactly once; the
/// hook runs when the frame is dropped, so every exit path of
/// [`FrameAdapter::process`] returns the buffer without bookkeeping.
pub struct CameraFrame {
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: Vec<Vec<u8>>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CameraFrame {
    pub fn planar(width: u32, height: u32, y: Vec<u8>, u: Vec<u8>, v: Vec<u8>) -> Self {
        CameraFrame {
            format: PixelFormat::Yuv420Planar,
            width,
            height,
            planes: vec![y, u, v],
            release: None,
        }
    }

    pub fn packed(format: PixelFormat, width: u32, height: u32, data: Vec<u8>) -> Self {
        CameraFrame {
            format,
            width,
            height,
            planes: vec![data],
            release: None,
        }
    }

    /// Attaches the buffer-release hook invoked when the frame is dropped.
    pub fn with_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Why a frame could not be converted. `Unsupported` is a silent skip;
/// `Malformed` is logged at warn level. Neither stops the pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported pixel format {0:?}")]
    Unsupported(PixelFormat),
    #[error(transparent)]
    Malformed(#[from] anyhow::Error),
}

/// Decodes a camera frame into a packed RGBA bitmap.
pub fn convert_frame(frame: &CameraFrame) -> Result<Bitmap, ConvertError> {
    let width = frame.width;
    let height = frame.height;
    match frame.format {
        PixelFormat::Yuv420Planar => {
            let [y, u, v] = frame.planes.as_slice() else {
                return Err(anyhow!(
                    "YUV420 frame carries {} planes, expected 3",
                    frame.planes.len()
                )
                .into());
            };
            let rgba = yuv420_planar_to_rgba(y, u, v, width, height)?;
            Ok(Bitmap::new(rgba, width, height))
        }
        PixelFormat::Yuyv422 => {
            let data = packed_plane(frame)?;
            let rgba = yuyv_to_rgba(data, width, height)?;
            Ok(Bitmap::new(rgba, width, height))
        }
        PixelFormat::Mjpeg => mjpeg_to_bitmap(packed_plane(frame)?, width, height),
        PixelFormat::Rgb24 => {
            let data = packed_plane(frame)?;
            let rgba = rgb24_to_rgba(data, width, height)?;
            Ok(Bitmap::new(rgba, width, height))
        }
        PixelFormat::Unknown(_) => Err(ConvertError::Unsupported(frame.format)),
    }
}

fn packed_plane(frame: &CameraFrame) -> Result<&[u8], ConvertError> {
    match frame.planes.as_slice() {
        [data] => Ok(data),
        planes => Err(anyhow!(
            "packed frame carries {} planes, expected 1",
            planes.len()
        )
        .into()),
    }
}

/// Interleaves quarter-resolution chroma planes into the VU-interleaved
/// semi-planar layout (NV21). V leads, matching the source convention.
fn interleave_vu(u: &[u8], v: &[u8]) -> Vec<u8> {
    let mut vu = Vec::with_capacity(u.len() + v.len());
    for (&vb, &ub) in v.iter().zip(u.iter()) {
        vu.push(vb);
        vu.push(ub);
    }
    vu
}

fn yuv420_planar_to_rgba(
    y: &[u8],
    u: &[u8],
    v: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ConvertError> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(anyhow!("YUV420 requires positive even dimensions, got {width}x{height}").into());
    }
    let y_plane_len = width as usize * height as usize;
    let chroma_len = y_plane_len / 4;
    if y.len() < y_plane_len || u.len() < chroma_len || v.len() < chroma_len {
        return Err(anyhow!(
            "YUV420 planes too small: y {} u {} v {}, expected {y_plane_len}/{chroma_len}/{chroma_len}",
            y.len(),
            u.len(),
            v.len()
        )
        .into());
    }

    let vu = interleave_vu(&u[..chroma_len], &v[..chroma_len]);
    let mut rgba = vec![0u8; y_plane_len * 4];

    let image = YuvBiPlanarImage {
        y_plane: &y[..y_plane_len],
        y_stride: width,
        uv_plane: &vu,
        uv_stride: width,
        width,
        height,
    };

    yuv_nv21_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV21→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let expected_len = width as usize * height as usize * 2;
    if data.len() < expected_len {
        return Err(anyhow!(
            "YUYV buffer too small: got {}, expected {expected_len}",
            data.len()
        )
        .into());
    }

    let mut rgba = vec![0u8; (width as usize * height as usize) * 4];
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn mjpeg_to_bitmap(data: &[u8], width: u32, height: u32) -> Result<Bitmap, ConvertError> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    // Trust the bitstream dimensions over the declared ones.
    let (width, height) = match decoder.info() {
        Some(info) => (info.width as u32, info.height as u32),
        None => (width, height),
    };
    let expected_len = width as usize * height as usize * 4;
    if rgba.len() < expected_len {
        return Err(anyhow!(
            "MJPEG decode produced too few bytes: got {}, expected {expected_len}",
            rgba.len()
        )
        .into());
    }

    Ok(Bitmap::new(rgba, width, height))
}

fn rgb24_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let expected_len = width as usize * height as usize * 3;
    if data.len() < expected_len {
        return Err(anyhow!(
            "RGB buffer too small: got {}, expected {expected_len}",
            data.len()
        )
        .into());
    }

    let mut rgba = vec![0u8; (width as usize * height as usize) * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[0] = src[0];
            dst[1] = src[1];
            dst[2] = src[2];
            dst[3] = 255;
        });

    Ok(rgba)
}

/// Converts frames and feeds the detector. One adapter serves one camera
/// source; its timestamps are milliseconds since construction, forced
/// strictly increasing across submissions.
pub struct FrameAdapter<D> {
    landmarker: D,
    epoch: Instant,
    last_timestamp_ms: i64,
}

impl<D: HandLandmarker> FrameAdapter<D> {
    pub fn new(landmarker: D) -> Self {
        FrameAdapter {
            landmarker,
            epoch: Instant::now(),
            last_timestamp_ms: 0,
        }
    }

    /// Converts one frame and submits it. Consumes the frame, so its buffer
    /// is released exactly once on every path out of here.
    pub fn process(&mut self, frame: CameraFrame) {
        let bitmap = match convert_frame(&frame) {
            Ok(bitmap) => bitmap,
            Err(ConvertError::Unsupported(format)) => {
                log::debug!("skipping frame with unsupported pixel format {format:?}");
                return;
            }
            Err(err) => {
                log::warn!("failed to decode camera frame: {err:?}");
                return;
            }
        };
        drop(frame);

        let timestamp_ms = self.next_timestamp_ms();
        if let Err(err) = self.landmarker.detect_async(bitmap, timestamp_ms) {
            log::warn!("landmark submission failed: {err:?}");
        }
    }

    fn next_timestamp_ms(&mut self) -> i64 {
        let elapsed = self.epoch.elapsed().as_millis() as i64;
        let timestamp = elapsed.max(self.last_timestamp_ms + 1);
        self.last_timestamp_ms = timestamp;
        timestamp
    }
}

/// Spawns the producer worker: drains the frame channel keeping only the
/// newest frame (matching the capture layer's latest-frame delivery policy)
/// and runs until the channel disconnects.
pub fn start_frame_adapter<D: HandLandmarker + Send + 'static>(
    frame_rx: Receiver<CameraFrame>,
    landmarker: D,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        log::info!("frame adapter started");
        let mut adapter = FrameAdapter::new(landmarker);
        while let Some(frame) = recv_latest_frame(&frame_rx) {
            adapter.process(frame);
        }
        log::info!("frame adapter stopped");
    })
}

fn recv_latest_frame(frame_rx: &Receiver<CameraFrame>) -> Option<CameraFrame> {
    let mut frame = frame_rx.recv().ok()?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use anyhow::Result;

    #[derive(Default)]
    struct CountingLandmarker {
        timestamps: Vec<i64>,
    }

    impl HandLandmarker for &mut CountingLandmarker {
        fn detect_async(&mut self, _bitmap: Bitmap, timestamp_ms: i64) -> Result<()> {
            self.timestamps.push(timestamp_ms);
            Ok(())
        }
    }

    fn release_counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let counter = Arc::new(AtomicUsize::new(0));
        let hook = {
            let counter = counter.clone();
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        };
        (counter, hook)
    }

    fn gray_planar_frame(width: u32, height: u32) -> CameraFrame {
        let y = vec![128u8; width as usize * height as usize];
        let chroma = vec![128u8; (width as usize * height as usize) / 4];
        CameraFrame::planar(width, height, y, chroma.clone(), chroma)
    }

    #[test]
    fn unsupported_format_released_once_no_submission() {
        let (released, hook) = release_counter();
        let frame = CameraFrame::packed(PixelFormat::Unknown(0x32315559), 4, 4, vec![0; 64])
            .with_release(hook);

        let mut landmarker = CountingLandmarker::default();
        let mut adapter = FrameAdapter::new(&mut landmarker);
        adapter.process(frame);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(landmarker.timestamps.is_empty());
    }

    #[test]
    fn successful_frame_released_once_and_submitted() {
        let (released, hook) = release_counter();
        let frame = gray_planar_frame(8, 8).with_release(hook);

        let mut landmarker = CountingLandmarker::default();
        let mut adapter = FrameAdapter::new(&mut landmarker);
        adapter.process(frame);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(landmarker.timestamps.len(), 1);
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut landmarker = CountingLandmarker::default();
        let mut adapter = FrameAdapter::new(&mut landmarker);
        for _ in 0..5 {
            adapter.process(gray_planar_frame(8, 8));
        }

        assert_eq!(landmarker.timestamps.len(), 5);
        for pair in landmarker.timestamps.windows(2) {
            assert!(pair[1] > pair[0], "timestamps not increasing: {pair:?}");
        }
    }

    #[test]
    fn interleave_puts_v_before_u() {
        let u = [1u8, 2, 3];
        let v = [10u8, 20, 30];
        assert_eq!(interleave_vu(&u, &v), vec![10, 1, 20, 2, 30, 3]);
    }

    #[test]
    fn gray_planar_frame_decodes_to_gray_rgba() {
        let frame = gray_planar_frame(8, 8);
        let bitmap = convert_frame(&frame).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (8, 8));
        assert_eq!(bitmap.rgba.len(), 8 * 8 * 4);
        for px in bitmap.rgba.chunks_exact(4) {
            for channel in &px[..3] {
                assert!(
                    (120..=136).contains(channel),
                    "channel {channel} not near gray"
                );
            }
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn odd_dimensions_are_malformed() {
        let frame = CameraFrame::planar(5, 4, vec![0; 20], vec![0; 5], vec![0; 5]);
        assert!(matches!(
            convert_frame(&frame),
            Err(ConvertError::Malformed(_))
        ));
    }

    #[test]
    fn undersized_planes_are_malformed() {
        let frame = CameraFrame::planar(8, 8, vec![0; 10], vec![0; 16], vec![0; 16]);
        assert!(matches!(
            convert_frame(&frame),
            Err(ConvertError::Malformed(_))
        ));
    }

    #[test]
    fn undersized_yuyv_buffer_is_malformed() {
        let frame = CameraFrame::packed(PixelFormat::Yuyv422, 8, 8, vec![0; 10]);
        assert!(matches!(
            convert_frame(&frame),
            Err(ConvertError::Malformed(_))
        ));
    }

    #[test]
    fn mjpeg_frame_decodes_with_bitstream_dimensions() {
        let mut jpeg = Vec::new();
        let img = image::RgbImage::from_pixel(16, 8, image::Rgb([200, 30, 30]));
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
            .encode_image(&img)
            .unwrap();

        // Declared dimensions are wrong on purpose; the bitstream wins.
        let frame = CameraFrame::packed(PixelFormat::Mjpeg, 4, 4, jpeg);
        let bitmap = convert_frame(&frame).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (16, 8));
        assert_eq!(bitmap.rgba.len(), 16 * 8 * 4);
    }

    #[test]
    fn rgb24_expands_with_opaque_alpha() {
        let data = vec![10u8, 20, 30, 40, 50, 60];
        let frame = CameraFrame::packed(PixelFormat::Rgb24, 2, 1, data);
        let bitmap = convert_frame(&frame).unwrap();
        assert_eq!(bitmap.rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn malformed_frame_still_released_once() {
        let (released, hook) = release_counter();
        let frame =
            CameraFrame::planar(8, 8, vec![0; 10], vec![0; 16], vec![0; 16]).with_release(hook);

        let mut landmarker = CountingLandmarker::default();
        let mut adapter = FrameAdapter::new(&mut landmarker);
        adapter.process(frame);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(landmarker.timestamps.is_empty());
    }
}
