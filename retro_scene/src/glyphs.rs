//! Glyph rasterization for the screen textures. The built-in 8x8 bitmap font
//! needs no assets; a TrueType file can be supplied instead and is rasterized
//! with fontdue, caching each glyph per pixel size.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use font8x8::legacy::BASIC_LEGACY;
use fontdue::{Font, FontSettings};
use thiserror::Error;

/// Coverage bitmap for one glyph. `xmin` is the offset from the pen position
/// and `ymax` the height of the glyph's top edge above the baseline.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub xmin: i32,
    pub ymax: i32,
    pub advance: f32,
    pub coverage: Arc<[u8]>,
}

impl GlyphBitmap {
    fn empty(advance: f32) -> Self {
        Self {
            width: 0,
            height: 0,
            xmin: 0,
            ymax: 0,
            advance,
            coverage: Arc::<[u8]>::from([]),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.coverage.iter().all(|value| *value == 0)
    }
}

pub trait GlyphSource {
    fn glyph(&self, ch: char, size_px: f32) -> GlyphBitmap;

    /// Distance from the vertical middle of the em box down to the baseline.
    fn middle_to_baseline(&self, size_px: f32) -> f32;

    fn label(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("reading font {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("parsing font {label}: {message}")]
    Parse { label: String, message: String },
}

/// Scaled 8x8 bitmap font. One font unit maps to `size_px / 12` pixels so a
/// cell is two thirds of the requested size, close to a narrow terminal face.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    const UNITS_PER_EM: f32 = 12.0;
    /// Rows above the baseline; the last row of each glyph is the descender.
    const ASCENT_ROWS: u32 = 7;

    fn unit(size_px: f32) -> u32 {
        ((size_px / Self::UNITS_PER_EM).round() as u32).max(1)
    }

    fn rows(ch: char) -> [u8; 8] {
        let ch = match ch {
            '\u{2192}' => '>',
            '\u{2026}' => '.',
            other => other,
        };
        let index = ch as usize;
        if index < BASIC_LEGACY.len() {
            BASIC_LEGACY[index]
        } else {
            BASIC_LEGACY[b'?' as usize]
        }
    }
}

impl GlyphSource for BitmapFont {
    fn glyph(&self, ch: char, size_px: f32) -> GlyphBitmap {
        let unit = Self::unit(size_px);
        let side = 8 * unit;
        let advance = side as f32;
        if ch.is_whitespace() {
            return GlyphBitmap::empty(advance);
        }

        let rows = Self::rows(ch);
        let mut coverage = vec![0u8; (side * side) as usize];
        for (gy, row) in rows.iter().enumerate() {
            for gx in 0..8u32 {
                if row & (1 << gx) == 0 {
                    continue;
                }
                for dy in 0..unit {
                    let y = gy as u32 * unit + dy;
                    let start = (y * side + gx * unit) as usize;
                    coverage[start..start + unit as usize].fill(u8::MAX);
                }
            }
        }

        GlyphBitmap {
            width: side,
            height: side,
            xmin: 0,
            ymax: (Self::ASCENT_ROWS * unit) as i32,
            advance,
            coverage: Arc::from(coverage.into_boxed_slice()),
        }
    }

    fn middle_to_baseline(&self, size_px: f32) -> f32 {
        // em box spans rows 0..8; its middle sits at row 4
        ((Self::ASCENT_ROWS - 4) * Self::unit(size_px)) as f32
    }

    fn label(&self) -> &str {
        "font8x8"
    }
}

pub struct TrueTypeFont {
    font: Font,
    label: String,
    cache: Mutex<HashMap<(char, u32), GlyphBitmap>>,
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> Result<Self, GlyphError> {
        let data = fs::read(path).map_err(|source| GlyphError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&data, &path.display().to_string())
    }

    pub fn from_bytes(data: &[u8], label: &str) -> Result<Self, GlyphError> {
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|message| {
            GlyphError::Parse {
                label: label.to_string(),
                message: message.to_string(),
            }
        })?;
        Ok(Self {
            font,
            label: label.to_string(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn rasterize(&self, ch: char, size_px: f32) -> GlyphBitmap {
        let mut glyph_index = self.font.lookup_glyph_index(ch);
        if glyph_index == 0 && !ch.is_whitespace() {
            glyph_index = self.font.lookup_glyph_index('?');
        }
        let (metrics, bitmap) = self.font.rasterize_indexed(glyph_index, size_px);
        GlyphBitmap {
            width: metrics.width as u32,
            height: metrics.height as u32,
            xmin: metrics.xmin,
            ymax: metrics.ymin + metrics.height as i32,
            advance: metrics.advance_width,
            coverage: Arc::from(bitmap.into_boxed_slice()),
        }
    }
}

impl GlyphSource for TrueTypeFont {
    fn glyph(&self, ch: char, size_px: f32) -> GlyphBitmap {
        let key = (ch, size_px.to_bits());
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(key)
            .or_insert_with(|| self.rasterize(ch, size_px))
            .clone()
    }

    fn middle_to_baseline(&self, size_px: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size_px)
            .map(|metrics| (metrics.ascent + metrics.descent) * 0.5)
            .unwrap_or(size_px * 0.35)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_glyph_scales_with_font_size() {
        let font = BitmapFont;
        let small = font.glyph('A', 12.0);
        assert_eq!((small.width, small.height), (8, 8));
        let large = font.glyph('A', 96.0);
        assert_eq!((large.width, large.height), (64, 64));
        assert_eq!(large.advance, 64.0);
        assert_eq!(large.ymax, 56);
        assert!(!large.is_blank());
    }

    #[test]
    fn bitmap_space_has_advance_but_no_pixels() {
        let glyph = BitmapFont.glyph(' ', 24.0);
        assert_eq!(glyph.width, 0);
        assert_eq!(glyph.advance, 16.0);
    }

    #[test]
    fn arrow_renders_as_greater_than() {
        let font = BitmapFont;
        let arrow = font.glyph('\u{2192}', 12.0);
        let greater = font.glyph('>', 12.0);
        assert_eq!(arrow.coverage, greater.coverage);
    }

    #[test]
    fn unsupported_char_falls_back_to_question_mark() {
        let font = BitmapFont;
        let fallback = font.glyph('\u{6f22}', 12.0);
        let question = font.glyph('?', 12.0);
        assert_eq!(fallback.coverage, question.coverage);
    }

    #[test]
    fn invalid_truetype_bytes_report_parse_error() {
        let err = TrueTypeFont::from_bytes(b"not a font", "inline")
            .err()
            .expect("garbage rejected");
        assert!(matches!(err, GlyphError::Parse { .. }));
    }

    #[test]
    fn missing_font_file_reports_read_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let err = TrueTypeFont::load(&temp.path().join("missing.ttf"))
            .err()
            .expect("missing file rejected");
        assert!(matches!(err, GlyphError::Read { .. }));
    }
}
