//! Character-by-character reveal of the boot log.
//!
//! The reveal pauses on the dots of the first and last `...` in the target so
//! the log reads like it is waiting on work. Positions are counted in `char`s,
//! not bytes, so the arrow glyphs in the default log behave like any other
//! character.

/// Cursor glyph appended while the blink cycle is in its "on" half.
pub const CURSOR_GLYPH: char = '_';
pub const CURSOR_PERIOD_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingTiming {
    pub char_delay_ms: u64,
    pub ellipsis_pause_ms: u64,
}

#[derive(Debug, Clone)]
pub struct TypewriterState {
    target: Vec<char>,
    revealed: usize,
    last_advance_ms: Option<u64>,
    first_ellipsis: Option<usize>,
    last_ellipsis: Option<usize>,
}

impl TypewriterState {
    pub fn new(target: &str) -> Self {
        let target: Vec<char> = target.chars().collect();
        let first_ellipsis = find_ellipsis(&target, false);
        let last_ellipsis = find_ellipsis(&target, true);
        Self {
            target,
            revealed: 0,
            last_advance_ms: None,
            first_ellipsis,
            last_ellipsis,
        }
    }

    pub fn reset(&mut self) {
        self.revealed = 0;
        self.last_advance_ms = None;
    }

    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.target.len()
    }

    pub fn revealed_text(&self) -> String {
        self.target[..self.revealed].iter().collect()
    }

    /// True while the next character to reveal is the second or third dot of
    /// the first or last ellipsis.
    pub fn in_pause(&self) -> bool {
        let position = self.revealed;
        let at_dot = self.target.get(position) == Some(&'.');
        let after_dot = position > 0 && self.target.get(position - 1) == Some(&'.');
        if !(at_dot && after_dot) {
            return false;
        }
        let within = |start: Option<usize>| {
            start.is_some_and(|index| position == index + 1 || position == index + 2)
        };
        within(self.first_ellipsis) || within(self.last_ellipsis)
    }

    pub fn current_delay_ms(&self, timing: &TypingTiming) -> u64 {
        if self.in_pause() {
            timing.ellipsis_pause_ms
        } else {
            timing.char_delay_ms
        }
    }

    /// Reveals at most one character. The first call after a reset always
    /// advances; later calls need strictly more than the current delay to
    /// have passed.
    pub fn advance(&mut self, now_ms: u64, timing: &TypingTiming) -> bool {
        if self.is_complete() {
            return false;
        }
        if let Some(last) = self.last_advance_ms {
            if now_ms.saturating_sub(last) <= self.current_delay_ms(timing) {
                return false;
            }
        }
        self.revealed += 1;
        self.last_advance_ms = Some(now_ms);
        true
    }

    /// Revealed text with the blinking cursor applied for `now_ms`.
    pub fn frame_text(&self, now_ms: u64) -> String {
        let mut text = self.revealed_text();
        if cursor_visible(now_ms) {
            text.push(CURSOR_GLYPH);
        }
        text
    }
}

pub fn cursor_visible(now_ms: u64) -> bool {
    now_ms % CURSOR_PERIOD_MS < CURSOR_PERIOD_MS / 2
}

fn find_ellipsis(target: &[char], last: bool) -> Option<usize> {
    let mut matches = target
        .windows(3)
        .enumerate()
        .filter(|(_, window)| window.iter().all(|ch| *ch == '.'))
        .map(|(index, _)| index);
    if last { matches.last() } else { matches.next() }
}
