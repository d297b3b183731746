//! Software RGBA canvas for hosts without a native drawing surface.

use image::RgbaImage;

use crate::overlay::{Canvas, Paint};

/// Owned RGBA pixel buffer implementing [`Canvas`]. Points become filled
/// discs, lines thick Bresenham strokes; writes outside the buffer are
/// clipped.
#[derive(Clone, Debug)]
pub struct PixmapCanvas {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixmapCanvas {
    /// Opaque-black canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for px in rgba.chunks_exact_mut(4) {
            px[3] = 255;
        }
        PixmapCanvas {
            rgba,
            width,
            height,
        }
    }

    /// Wraps an existing RGBA buffer, e.g. a decoded camera frame to
    /// composite the overlay onto. Returns `None` on a size mismatch.
    pub fn from_rgba(rgba: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(PixmapCanvas {
            rgba,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba)
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.width || uy >= self.height {
            return;
        }
        let idx = ((uy * self.width + ux) as usize) * 4;
        self.rgba[idx..idx + 4].copy_from_slice(&color);
    }

    fn fill_disc(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn stroke_line(&mut self, p0: (f32, f32), p1: (f32, f32), color: [u8; 4], thickness: i32) {
        let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
        let (x1, y1) = (p1.0 as i32, p1.1 as i32);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let radius = (thickness.max(1) - 1) / 2;

        loop {
            self.put_pixel(x0, y0, color);
            if radius > 0 {
                for ox in -radius..=radius {
                    for oy in -radius..=radius {
                        if ox == 0 && oy == 0 {
                            continue;
                        }
                        if ox.abs() + oy.abs() <= radius {
                            self.put_pixel(x0 + ox, y0 + oy, color);
                        }
                    }
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

impl Canvas for PixmapCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw_point(&mut self, x: f32, y: f32, paint: &Paint) {
        let radius = ((paint.stroke_width / 2.0) as i32).max(1);
        self.fill_disc(x as i32, y as i32, radius, paint.color);
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, paint: &Paint) {
        self.stroke_line((x0, y0), (x1, y1), paint.color, paint.stroke_width as i32);
    }
}
