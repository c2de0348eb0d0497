//! Per-frame driver for the boot screen: the loading bar runs first, then the
//! typewriter log, then the screen holds the finished log while the site
//! title is shown.

use std::time::Duration;

use log::{debug, info};

use crate::config::SceneConfig;
use crate::progress::{ProgressState, ProgressTiming};
use crate::typewriter::{TypewriterState, TypingTiming};
use crate::viewport::ViewportClass;

/// Background shader time added on every frame.
pub const SHADER_TIME_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Loading,
    Typing,
    Ready,
}

impl BootPhase {
    pub fn label(self) -> &'static str {
        match self {
            BootPhase::Loading => "loading",
            BootPhase::Typing => "typing",
            BootPhase::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameTick {
    pub now_ms: u64,
    pub shader_time: f32,
    pub phase: BootPhase,
    pub phase_changed: bool,
}

pub struct BootSequence {
    phase: BootPhase,
    clock: Duration,
    frames: u64,
    shader_time: f32,
    progress: ProgressState,
    progress_timing: ProgressTiming,
    typewriter: TypewriterState,
    typing_timing: TypingTiming,
}

impl BootSequence {
    pub fn new(config: &SceneConfig, class: ViewportClass) -> Self {
        let preset = config.class_preset(class);
        Self {
            phase: BootPhase::Loading,
            clock: Duration::ZERO,
            frames: 0,
            shader_time: 0.0,
            progress: ProgressState::new(),
            progress_timing: preset.progress,
            typewriter: TypewriterState::new(&config.boot_text),
            typing_timing: preset.typing,
        }
    }

    /// Swaps the generator timings for a new viewport class without touching
    /// progress already made.
    pub fn retime(&mut self, config: &SceneConfig, class: ViewportClass) {
        let preset = config.class_preset(class);
        self.progress_timing = preset.progress;
        self.typing_timing = preset.typing;
        debug!(
            "boot timings now {} (typing {}ms, progress +{} per {}ms)",
            class.label(),
            self.typing_timing.char_delay_ms,
            self.progress_timing.increment,
            self.progress_timing.interval_ms
        );
    }

    /// Advances the frame clock by `delta` and steps the active generator.
    /// The caller paints the screen after this returns.
    pub fn tick(&mut self, delta: Duration) -> FrameTick {
        self.clock += delta;
        self.frames += 1;
        self.shader_time += SHADER_TIME_STEP;
        let now_ms = self.now_ms();

        let previous = self.phase;
        match self.phase {
            BootPhase::Loading => {
                self.progress.advance(now_ms, &self.progress_timing);
                if self.progress.is_complete() {
                    self.typewriter.reset();
                    self.phase = BootPhase::Typing;
                }
            }
            BootPhase::Typing => {
                self.typewriter.advance(now_ms, &self.typing_timing);
                if self.typewriter.is_complete() {
                    self.phase = BootPhase::Ready;
                }
            }
            BootPhase::Ready => {}
        }

        let phase_changed = previous != self.phase;
        if phase_changed {
            info!(
                "boot phase {} -> {} at {}ms (frame {})",
                previous.label(),
                self.phase.label(),
                now_ms,
                self.frames
            );
        }

        FrameTick {
            now_ms,
            shader_time: self.shader_time,
            phase: self.phase,
            phase_changed,
        }
    }

    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.as_millis() as u64
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn shader_time(&self) -> f32 {
        self.shader_time
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn typewriter(&self) -> &TypewriterState {
        &self.typewriter
    }

    /// The site title overlay appears once the log has been typed out.
    pub fn title_revealed(&self) -> bool {
        self.phase == BootPhase::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn run_until(sequence: &mut BootSequence, phase: BootPhase, max_frames: usize) -> usize {
        for frame in 0..max_frames {
            if sequence.phase() == phase {
                return frame;
            }
            sequence.tick(FRAME);
        }
        panic!("never reached {phase:?}");
    }

    #[test]
    fn shader_time_steps_per_frame() {
        let mut sequence = BootSequence::new(&SceneConfig::default(), ViewportClass::Standard);
        for _ in 0..10 {
            sequence.tick(FRAME);
        }
        assert!((sequence.shader_time() - 1.0).abs() < 1e-4);
        assert_eq!(sequence.frames(), 10);
        assert_eq!(sequence.now_ms(), 160);
    }

    #[test]
    fn loading_completes_then_typewriter_starts_empty() {
        let mut sequence = BootSequence::new(&SceneConfig::default(), ViewportClass::Standard);
        // 2 per frame at 60 fps: fifty frames to fill the bar
        let mut changed_at = None;
        for frame in 0..100 {
            let tick = sequence.tick(FRAME);
            if tick.phase_changed {
                changed_at = Some(frame);
                break;
            }
        }
        assert_eq!(changed_at, Some(49));
        assert_eq!(sequence.phase(), BootPhase::Typing);
        assert_eq!(sequence.progress().progress(), 100);
        assert_eq!(sequence.typewriter().revealed_len(), 0);

        let tick = sequence.tick(FRAME);
        assert!(!tick.phase_changed);
        assert_eq!(sequence.typewriter().revealed_len(), 1);
    }

    #[test]
    fn reaches_ready_and_reveals_title() {
        let config = SceneConfig {
            boot_text: "ok...".to_string(),
            ..SceneConfig::default()
        };
        let mut sequence = BootSequence::new(&config, ViewportClass::Compact);
        assert!(!sequence.title_revealed());
        run_until(&mut sequence, BootPhase::Ready, 1_000);
        assert!(sequence.title_revealed());
        assert_eq!(sequence.typewriter().revealed_text(), "ok...");

        let progress = sequence.progress().progress();
        let tick = sequence.tick(FRAME);
        assert_eq!(tick.phase, BootPhase::Ready);
        assert_eq!(sequence.progress().progress(), progress);
    }

    #[test]
    fn retime_keeps_progress() {
        let config = SceneConfig::default();
        let mut sequence = BootSequence::new(&config, ViewportClass::Standard);
        sequence.tick(FRAME);
        sequence.tick(FRAME);
        let before = sequence.progress().progress();
        sequence.retime(&config, ViewportClass::Compact);
        assert_eq!(sequence.progress().progress(), before);
        sequence.tick(FRAME);
        assert_eq!(sequence.progress().progress(), before + 3);
    }
}
