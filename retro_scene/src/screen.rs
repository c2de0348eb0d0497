use anyhow::Result;

use crate::glyphs::GlyphSource;
use crate::progress::{PROGRESS_TARGET, ProgressState};
use crate::raster::{BLACK, Canvas, Rgba, rgb_hex};
use crate::sequence::{BootPhase, BootSequence};
use crate::typewriter::TypewriterState;

const PEACH: Rgba = rgb_hex(0xFFDAB3);
const TERMINAL_GREEN: Rgba = rgb_hex(0x4AF626);
const TERMINAL_GLOW: Rgba = [0x4A, 0xF6, 0x26, 0x60];

const MARGIN_X: f32 = 50.0;
const BAR_HEIGHT: f32 = 40.0;
const BAR_DASH: u32 = 5;
const NEARLY_THERE_GAP: f32 = 60.0;
const LINE_PITCH: f32 = 1.5;

/// Size of the texture mapped onto the monitor and the font size drawn into
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenOptions {
    pub width: u32,
    pub height: u32,
    pub font_size: f32,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 1536,
            font_size: 96.0,
        }
    }
}

pub struct ScreenPainter {
    canvas: Canvas,
    options: ScreenOptions,
    glyphs: Box<dyn GlyphSource>,
}

impl ScreenPainter {
    pub fn new(options: ScreenOptions, glyphs: Box<dyn GlyphSource>) -> Result<Self> {
        let canvas = Canvas::new(options.width, options.height)?;
        Ok(Self {
            canvas,
            options,
            glyphs,
        })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn options(&self) -> &ScreenOptions {
        &self.options
    }

    pub fn glyph_label(&self) -> &str {
        self.glyphs.label()
    }

    /// Redraws whichever frame the sequence's phase calls for.
    pub fn paint(&mut self, sequence: &BootSequence) -> &Canvas {
        match sequence.phase() {
            BootPhase::Loading => self.paint_loading(sequence.progress()),
            BootPhase::Typing | BootPhase::Ready => {
                self.paint_typewriter(sequence.typewriter(), sequence.now_ms())
            }
        }
    }

    pub fn paint_loading(&mut self, progress: &ProgressState) -> &Canvas {
        let width = self.canvas.width() as f32;
        let height = self.canvas.height() as f32;
        let font_size = self.options.font_size;
        let glyphs = self.glyphs.as_ref();
        self.canvas.clear(BLACK);

        self.canvas
            .fill_text(glyphs, "Booting...", MARGIN_X, height / 4.0, font_size, PEACH);

        let bar_x = MARGIN_X;
        let bar_y = height / 3.0;
        let bar_width = (width - 2.0 * MARGIN_X).max(0.0);
        self.canvas.stroke_dashed_rect(
            bar_x,
            bar_y,
            bar_width,
            BAR_HEIGHT,
            BAR_DASH,
            BAR_DASH,
            PEACH,
        );
        let fill_width = bar_width * progress.progress() as f32 / PROGRESS_TARGET as f32;
        self.canvas
            .fill_rect(bar_x, bar_y, fill_width, BAR_HEIGHT, PEACH);

        if progress.nearly_there() {
            self.canvas.fill_text(
                glyphs,
                "Nearly There...",
                MARGIN_X,
                bar_y + BAR_HEIGHT + NEARLY_THERE_GAP,
                font_size,
                PEACH,
            );
        }
        &self.canvas
    }

    pub fn paint_typewriter(&mut self, typewriter: &TypewriterState, now_ms: u64) -> &Canvas {
        let height = self.canvas.height() as f32;
        let font_size = self.options.font_size;
        let glyphs = self.glyphs.as_ref();
        let glow_offset = (font_size / 96.0).max(1.0);
        self.canvas.clear(BLACK);

        let text = typewriter.frame_text(now_ms);
        let first_line = height / 14.0;
        for (index, line) in text.split('\n').enumerate() {
            let y = first_line + index as f32 * font_size * LINE_PITCH;
            self.canvas.fill_text(
                glyphs,
                line,
                MARGIN_X + glow_offset,
                y + glow_offset,
                font_size,
                TERMINAL_GLOW,
            );
            self.canvas
                .fill_text(glyphs, line, MARGIN_X, y, font_size, TERMINAL_GREEN);
        }
        &self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::BitmapFont;
    use crate::progress::ProgressTiming;
    use crate::typewriter::TypingTiming;

    fn painter() -> ScreenPainter {
        let options = ScreenOptions {
            width: 512,
            height: 384,
            font_size: 24.0,
        };
        ScreenPainter::new(options, Box::new(BitmapFont)).expect("painter")
    }

    fn progress_at(value: u32) -> ProgressState {
        let timing = ProgressTiming {
            interval_ms: 0,
            increment: value,
        };
        let mut state = ProgressState::new();
        state.advance(0, &timing);
        state
    }

    fn count_color(canvas: &Canvas, color: Rgba, row: u32) -> usize {
        (0..canvas.width())
            .filter(|x| canvas.pixel(*x, row) == Some(color))
            .count()
    }

    #[test]
    fn loading_fill_grows_with_progress() {
        let mut painter = painter();
        // bar spans y 128..168; sample a row inside it
        let row = 150;
        let quarter = count_color(painter.paint_loading(&progress_at(25)), PEACH, row);
        let half = count_color(painter.paint_loading(&progress_at(50)), PEACH, row);
        let full = count_color(painter.paint_loading(&progress_at(100)), PEACH, row);
        assert!(quarter < half && half < full, "{quarter} {half} {full}");
        // 412 px wide bar plus the dashed right edge
        assert!(full >= 412, "{full}");
    }

    #[test]
    fn nearly_there_line_only_after_threshold() {
        let mut painter = painter();
        // text centred at 128 + 40 + 60 = 228
        let row = 228;
        let before = count_color(painter.paint_loading(&progress_at(75)), PEACH, row);
        assert_eq!(before, 0);
        let after = count_color(painter.paint_loading(&progress_at(76)), PEACH, row);
        assert!(after > 0);
    }

    #[test]
    fn typewriter_frame_draws_green_text() {
        let mut painter = painter();
        let timing = TypingTiming {
            char_delay_ms: 0,
            ellipsis_pause_ms: 0,
        };
        let mut typewriter = TypewriterState::new("HELLO\nWORLD");
        let empty = painter.paint_typewriter(&typewriter, 600);
        assert!(empty.as_raw().chunks_exact(4).all(|px| px == BLACK));

        for now in 0..20 {
            typewriter.advance(now, &timing);
        }
        let canvas = painter.paint_typewriter(&typewriter, 600);
        let green = canvas
            .as_raw()
            .chunks_exact(4)
            .filter(|px| *px == TERMINAL_GREEN)
            .count();
        assert!(green > 0);
        // second line starts 36 px below the first
        let first_line = 384 / 14;
        let second_line = first_line + 36;
        assert!(count_color(canvas, TERMINAL_GREEN, second_line as u32) > 0);
    }

    #[test]
    fn paint_follows_sequence_phase() {
        let config = crate::config::SceneConfig {
            screen: ScreenOptions {
                width: 256,
                height: 192,
                font_size: 12.0,
            },
            ..crate::config::SceneConfig::default()
        };
        let mut sequence = BootSequence::new(&config, crate::viewport::ViewportClass::Standard);
        let mut painter =
            ScreenPainter::new(config.screen.clone(), Box::new(BitmapFont)).expect("painter");
        sequence.tick(std::time::Duration::from_millis(16));
        let canvas = painter.paint(&sequence);
        assert!(canvas.as_raw().chunks_exact(4).any(|px| px == PEACH));
    }
}
