pub const PROGRESS_TARGET: u32 = 100;
/// Progress past which the loading frame shows its "nearly there" line.
pub const NEARLY_THERE_THRESHOLD: u32 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTiming {
    pub interval_ms: u64,
    pub increment: u32,
}

/// Simulated loading progress, capped at [`PROGRESS_TARGET`].
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    progress: u32,
    last_advance_ms: Option<u64>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.progress = 0;
        self.last_advance_ms = None;
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn fraction(&self) -> f32 {
        self.progress as f32 / PROGRESS_TARGET as f32
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= PROGRESS_TARGET
    }

    pub fn nearly_there(&self) -> bool {
        self.progress > NEARLY_THERE_THRESHOLD
    }

    /// Adds one increment once strictly more than the interval has passed
    /// since the previous step. The first step after a reset is immediate.
    pub fn advance(&mut self, now_ms: u64, timing: &ProgressTiming) -> bool {
        if self.is_complete() {
            return false;
        }
        if let Some(last) = self.last_advance_ms {
            if now_ms.saturating_sub(last) <= timing.interval_ms {
                return false;
            }
        }
        self.progress = self
            .progress
            .saturating_add(timing.increment)
            .min(PROGRESS_TARGET);
        self.last_advance_ms = Some(now_ms);
        true
    }
}
