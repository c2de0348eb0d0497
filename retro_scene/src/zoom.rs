//! Staged scroll-to-zoom interpolation. The scroll range is split into three
//! phases by four offsets; inside each phase the camera distance moves
//! linearly between that phase's endpoint distances. Boundary offsets belong
//! to the earlier phase.

use glam::Vec3;
use thiserror::Error;

use crate::config::{ClassPreset, SceneConfig};
use crate::viewport::{ViewportClass, ViewportSize};

#[derive(Debug, Error, PartialEq)]
pub enum ZoomConfigError {
    #[error("zoom stage values must be finite")]
    NonFinite,
    #[error("scroll offsets must be non-decreasing ({earlier} > {later})")]
    OffsetsDecreasing { earlier: f32, later: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomPhase {
    /// At or before the first offset.
    Resting,
    First,
    Second,
    Third,
    /// Past the final offset.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStageConfig {
    pub start: f32,
    pub mid: f32,
    pub mid2: f32,
    pub end: f32,
    pub offset_start: f32,
    pub offset_mid: f32,
    pub offset_mid2: f32,
    pub offset_end: f32,
}

impl ZoomStageConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start: f32,
        mid: f32,
        mid2: f32,
        end: f32,
        offset_start: f32,
        offset_mid: f32,
        offset_mid2: f32,
        offset_end: f32,
    ) -> Result<Self, ZoomConfigError> {
        let config = Self {
            start,
            mid,
            mid2,
            end,
            offset_start,
            offset_mid,
            offset_mid2,
            offset_end,
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds the stage table for a viewport class; offsets scale with the
    /// viewport height.
    pub fn for_viewport(
        preset: &ClassPreset,
        viewport: ViewportSize,
    ) -> Result<Self, ZoomConfigError> {
        let zoom = &preset.zoom;
        let height = viewport.height;
        Self::new(
            zoom.start,
            zoom.mid,
            zoom.mid2,
            zoom.end,
            zoom.offset_start,
            height * zoom.mid_fraction,
            height * zoom.mid2_fraction,
            height * zoom.end_fraction,
        )
    }

    fn validate(&self) -> Result<(), ZoomConfigError> {
        let values = [
            self.start,
            self.mid,
            self.mid2,
            self.end,
            self.offset_start,
            self.offset_mid,
            self.offset_mid2,
            self.offset_end,
        ];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(ZoomConfigError::NonFinite);
        }
        let offsets = [
            self.offset_start,
            self.offset_mid,
            self.offset_mid2,
            self.offset_end,
        ];
        for pair in offsets.windows(2) {
            if pair[0] > pair[1] {
                return Err(ZoomConfigError::OffsetsDecreasing {
                    earlier: pair[0],
                    later: pair[1],
                });
            }
        }
        Ok(())
    }

    pub fn phase_at(&self, scroll: f32) -> ZoomPhase {
        if scroll <= self.offset_start {
            ZoomPhase::Resting
        } else if scroll <= self.offset_mid {
            ZoomPhase::First
        } else if scroll <= self.offset_mid2 {
            ZoomPhase::Second
        } else if scroll <= self.offset_end {
            ZoomPhase::Third
        } else {
            ZoomPhase::Settled
        }
    }

    /// Camera distance for a scroll offset.
    pub fn distance_at(&self, scroll: f32) -> f32 {
        match self.phase_at(scroll) {
            ZoomPhase::Resting => self.start,
            ZoomPhase::First => lerp_phase(
                scroll,
                (self.offset_start, self.start),
                (self.offset_mid, self.mid),
            ),
            ZoomPhase::Second => lerp_phase(
                scroll,
                (self.offset_mid, self.mid),
                (self.offset_mid2, self.mid2),
            ),
            ZoomPhase::Third => lerp_phase(
                scroll,
                (self.offset_mid2, self.mid2),
                (self.offset_end, self.end),
            ),
            ZoomPhase::Settled => self.end,
        }
    }
}

/// Linear interpolation inside one phase. A zero-width phase jumps straight
/// to its end value.
fn lerp_phase(scroll: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    let span = to.0 - from.0;
    if span <= 0.0 {
        return to.1;
    }
    let progress = ((scroll - from.0) / span).clamp(0.0, 1.0);
    from.1 + (to.1 - from.1) * progress
}

/// Where the camera sits for a given zoom distance. The x coordinate is left
/// to the orbit rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPlacement {
    pub distance: f32,
    pub height: f32,
    pub target: Vec3,
}

impl CameraPlacement {
    pub fn eye(&self, x: f32) -> Vec3 {
        Vec3::new(x, self.height, self.distance)
    }
}

/// Owns the stage table for the current viewport and rebuilds it wholesale
/// whenever the viewport changes.
#[derive(Debug, Clone)]
pub struct ScrollZoom {
    class: ViewportClass,
    viewport: ViewportSize,
    preset: ClassPreset,
    stages: ZoomStageConfig,
    tilt_per_unit: f32,
}

impl ScrollZoom {
    pub fn new(config: &SceneConfig, viewport: ViewportSize) -> Result<Self, ZoomConfigError> {
        let class = config.classify(viewport);
        let preset = *config.class_preset(class);
        let stages = ZoomStageConfig::for_viewport(&preset, viewport)?;
        Ok(Self {
            class,
            viewport,
            preset,
            stages,
            tilt_per_unit: config.camera.tilt_per_unit,
        })
    }

    /// Recomputes the stage table for a new viewport. Returns `true` when the
    /// viewport class changed.
    pub fn resize(
        &mut self,
        config: &SceneConfig,
        viewport: ViewportSize,
    ) -> Result<bool, ZoomConfigError> {
        let rebuilt = Self::new(config, viewport)?;
        let class_changed = rebuilt.class != self.class;
        if class_changed {
            log::info!(
                "viewport class {} -> {} at {:.0}x{:.0}",
                self.class.label(),
                rebuilt.class.label(),
                viewport.width,
                viewport.height
            );
        }
        *self = rebuilt;
        Ok(class_changed)
    }

    pub fn class(&self) -> ViewportClass {
        self.class
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn preset(&self) -> &ClassPreset {
        &self.preset
    }

    pub fn stages(&self) -> &ZoomStageConfig {
        &self.stages
    }

    /// Camera placement for a scroll offset. Compact viewports ignore scroll
    /// and hold the layout camera.
    pub fn placement(&self, scroll: f32) -> CameraPlacement {
        let layout = &self.preset.layout;
        let target = layout.target();
        if self.class.is_compact() {
            return CameraPlacement {
                distance: layout.camera_z,
                height: layout.camera_y,
                target,
            };
        }

        let distance = self.stages.distance_at(scroll);
        log::trace!(
            "scroll {:.1} -> {:?} distance {:.3}",
            scroll,
            self.stages.phase_at(scroll),
            distance
        );
        CameraPlacement {
            distance,
            height: layout.camera_y + (distance - self.stages.start) * self.tilt_per_unit,
            target,
        }
    }
}
