use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result, ensure};
use image::{ColorType, ImageEncoder, RgbaImage, codecs::png::PngEncoder};

use crate::glyphs::{GlyphBitmap, GlyphSource};

pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 0xFF];

/// Opaque colour from a `0xRRGGBB` literal.
pub const fn rgb_hex(value: u32) -> Rgba {
    [
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
        0xFF,
    ]
}

/// CPU-side RGBA surface the screen frames are drawn onto before upload.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "canvas has no dimensions");
        Ok(Self {
            image: RgbaImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width() && y < self.height() {
            Some(self.image.get_pixel(x, y).0)
        } else {
            None
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.image.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Fills the pixels whose centres fall inside the rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let (x0, x1) = self.span(x, x + width, self.width());
        let (y0, y1) = self.span(y, y + height, self.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px as i32, py as i32, color, u8::MAX);
            }
        }
    }

    /// One pixel wide outline with a `dash` on / `gap` off pattern that runs
    /// clockwise from the top-left corner.
    pub fn stroke_dashed_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        dash: u32,
        gap: u32,
        color: Rgba,
    ) {
        let left = x.round() as i32;
        let top = y.round() as i32;
        let right = (x + width).round() as i32;
        let bottom = (y + height).round() as i32;
        if right <= left || bottom <= top {
            return;
        }

        let period = (dash + gap).max(1);
        let mut step = 0u32;
        let mut plot = |canvas: &mut Self, px: i32, py: i32| {
            if step % period < dash {
                canvas.blend_pixel(px, py, color, u8::MAX);
            }
            step += 1;
        };

        for px in left..right {
            plot(self, px, top);
        }
        for py in top..bottom {
            plot(self, right, py);
        }
        for px in (left + 1..=right).rev() {
            plot(self, px, bottom);
        }
        for py in (top + 1..=bottom).rev() {
            plot(self, left, py);
        }
    }

    /// Draws a single line of text whose em box is vertically centred on
    /// `y_middle`. Returns the pen advance.
    pub fn fill_text(
        &mut self,
        glyphs: &dyn GlyphSource,
        text: &str,
        x: f32,
        y_middle: f32,
        size_px: f32,
        color: Rgba,
    ) -> f32 {
        let baseline = (y_middle + glyphs.middle_to_baseline(size_px)).round() as i32;
        let mut pen_x = x;
        for ch in text.chars() {
            let glyph = glyphs.glyph(ch, size_px);
            self.blit_glyph(pen_x.round() as i32, baseline, &glyph, color);
            pen_x += glyph.advance;
        }
        pen_x - x
    }

    fn blit_glyph(&mut self, pen_x: i32, baseline: i32, glyph: &GlyphBitmap, color: Rgba) {
        if glyph.width == 0 || glyph.height == 0 {
            return;
        }
        let start_x = pen_x + glyph.xmin;
        let start_y = baseline - glyph.ymax;
        for gy in 0..glyph.height {
            let row_offset = gy as usize * glyph.width as usize;
            for gx in 0..glyph.width {
                let coverage = glyph.coverage[row_offset + gx as usize];
                if coverage == 0 {
                    continue;
                }
                self.blend_pixel(start_x + gx as i32, start_y + gy as i32, color, coverage);
            }
        }
    }

    /// Source-over blend of `color` scaled by `coverage`; out-of-bounds
    /// coordinates are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, coverage: u8) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let alpha = (coverage as u32 * color[3] as u32) / u8::MAX as u32;
        if alpha == 0 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let inverse = u8::MAX as u32 - alpha;
        for channel in 0..3 {
            let blended =
                (color[channel] as u32 * alpha + pixel.0[channel] as u32 * inverse) / u8::MAX as u32;
            pixel.0[channel] = blended as u8;
        }
        let dst_alpha = pixel.0[3] as u32;
        pixel.0[3] = (alpha + dst_alpha * inverse / u8::MAX as u32).min(u8::MAX as u32) as u8;
    }

    pub fn export_png(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let encoder = PngEncoder::new(file);
        encoder
            .write_image(
                self.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgba8.into(),
            )
            .with_context(|| format!("writing PNG to {}", path.display()))?;
        Ok(())
    }

    fn span(&self, start: f32, end: f32, limit: u32) -> (u32, u32) {
        let clamp = |value: f32| value.round().clamp(0.0, limit as f32) as u32;
        (clamp(start), clamp(end))
    }
}

/// Luma summary used by headless dumps and tests to check that a frame
/// actually drew something.
#[derive(Debug, Clone)]
pub struct RasterStats {
    pub min_luma: u8,
    pub max_luma: u8,
    pub mean_luma: f32,
    pub opaque_pixels: u32,
    pub total_pixels: u32,
    pub quadrant_means: [f32; 4],
}

impl RasterStats {
    pub fn compute(width: u32, height: u32, data: &[u8]) -> Self {
        let mut min_luma = u8::MAX;
        let mut max_luma = u8::MIN;
        let mut sum_luma = 0u64;
        let mut opaque_pixels = 0u32;
        let mut quadrant_sums = [0u64; 4];
        let mut quadrant_counts = [0u32; 4];

        for y in 0..height as usize {
            for x in 0..width as usize {
                let idx = (y * width as usize + x) * 4;
                let pixel = data.get(idx..idx + 4).unwrap_or(&[0, 0, 0, 0]);
                let luma = luma(pixel);
                min_luma = min_luma.min(luma);
                max_luma = max_luma.max(luma);
                sum_luma += luma as u64;
                if pixel[3] > 0 {
                    opaque_pixels += 1;
                }
                let quadrant =
                    (y >= height as usize / 2) as usize * 2 + (x >= width as usize / 2) as usize;
                quadrant_sums[quadrant] += luma as u64;
                quadrant_counts[quadrant] += 1;
            }
        }

        let total_pixels = width * height;
        let mean_luma = if total_pixels == 0 {
            0.0
        } else {
            sum_luma as f32 / total_pixels as f32
        };
        let mut quadrant_means = [0.0f32; 4];
        for (mean, (sum, count)) in quadrant_means
            .iter_mut()
            .zip(quadrant_sums.iter().zip(quadrant_counts.iter()))
        {
            if *count > 0 {
                *mean = *sum as f32 / *count as f32;
            }
        }

        Self {
            min_luma,
            max_luma,
            mean_luma,
            opaque_pixels,
            total_pixels,
            quadrant_means,
        }
    }

    pub fn of_canvas(canvas: &Canvas) -> Self {
        Self::compute(canvas.width(), canvas.height(), canvas.as_raw())
    }
}

fn luma(pixel: &[u8]) -> u8 {
    (0.2126 * pixel[0] as f32 + 0.7152 * pixel[1] as f32 + 0.0722 * pixel[2] as f32).round() as u8
}
