//! Built-in presets for both viewport classes plus the optional JSON overrides
//! accepted by the viewer's `--preset` flag. Every preset field is optional;
//! anything left out keeps the built-in value.

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::effect::ScreenEffectConfig;
use crate::progress::ProgressTiming;
use crate::screen::ScreenOptions;
use crate::typewriter::TypingTiming;
use crate::viewport::{COMPACT_WIDTH_THRESHOLD, ViewportClass, ViewportSize};

pub const DEFAULT_BOOT_TEXT: &str = "[Loading...]\n\nWelcome.\n\n\u{2192} Initialising portfolio\n\u{2192} Loading product history\n\u{2192} Verifying system outputs\n\nEnvironment ready.\nScroll to continue...";

/// Camera distances for the three zoom phases and the scroll offsets that
/// bound them, expressed as fractions of the viewport height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPreset {
    pub start: f32,
    pub mid: f32,
    pub mid2: f32,
    pub end: f32,
    pub offset_start: f32,
    pub mid_fraction: f32,
    pub mid2_fraction: f32,
    pub end_fraction: f32,
}

/// Model scale and resting camera for a viewport class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceLayout {
    pub model_scale: f32,
    pub camera_z: f32,
    pub camera_y: f32,
    pub target_y: f32,
}

impl DeviceLayout {
    pub fn target(&self) -> Vec3 {
        Vec3::new(0.0, self.target_y, 0.0)
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, self.camera_y, self.camera_z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassPreset {
    pub zoom: ZoomPreset,
    pub layout: DeviceLayout,
    pub typing: TypingTiming,
    pub progress: ProgressTiming,
}

impl ClassPreset {
    pub fn standard() -> Self {
        Self {
            zoom: ZoomPreset {
                start: 3.0,
                mid: 3.0,
                mid2: 5.0,
                end: 8.0,
                offset_start: 0.0,
                mid_fraction: 0.0,
                mid2_fraction: 2.2,
                end_fraction: 3.0,
            },
            layout: DeviceLayout {
                model_scale: 1.0,
                camera_z: 3.0,
                camera_y: 1.5,
                target_y: 1.2,
            },
            typing: TypingTiming {
                char_delay_ms: 6,
                ellipsis_pause_ms: 150,
            },
            progress: ProgressTiming {
                interval_ms: 1,
                increment: 2,
            },
        }
    }

    pub fn compact() -> Self {
        Self {
            zoom: ZoomPreset {
                start: 3.0,
                mid: 4.0,
                mid2: 6.0,
                end: 10.0,
                offset_start: 0.0,
                mid_fraction: 0.0,
                mid2_fraction: 2.2,
                end_fraction: 3.0,
            },
            layout: DeviceLayout {
                model_scale: 0.7,
                camera_z: 3.5,
                camera_y: 1.6,
                target_y: 1.3,
            },
            typing: TypingTiming {
                char_delay_ms: 3,
                ellipsis_pause_ms: 80,
            },
            progress: ProgressTiming {
                interval_ms: 3,
                increment: 3,
            },
        }
    }
}

/// Perspective camera parameters shared by both viewport classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Upward camera drift per unit of zoom distance past the start distance.
    pub tilt_per_unit: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 65.0,
            near: 0.1,
            far: 1000.0,
            tilt_per_unit: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub compact_width: f32,
    pub standard: ClassPreset,
    pub compact: ClassPreset,
    pub camera: CameraRig,
    pub effect: ScreenEffectConfig,
    pub screen: ScreenOptions,
    pub boot_text: String,
    pub keyboard: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            compact_width: COMPACT_WIDTH_THRESHOLD,
            standard: ClassPreset::standard(),
            compact: ClassPreset::compact(),
            camera: CameraRig::default(),
            effect: ScreenEffectConfig::default(),
            screen: ScreenOptions::default(),
            boot_text: DEFAULT_BOOT_TEXT.to_string(),
            keyboard: false,
        }
    }
}

impl SceneConfig {
    pub fn classify(&self, viewport: ViewportSize) -> ViewportClass {
        ViewportClass::classify(viewport.width, self.compact_width)
    }

    pub fn class_preset(&self, class: ViewportClass) -> &ClassPreset {
        match class {
            ViewportClass::Compact => &self.compact,
            ViewportClass::Standard => &self.standard,
        }
    }

    /// Applies preset overrides on top of the current values.
    pub fn with_preset(mut self, preset: &ScenePreset) -> Result<Self, PresetError> {
        if let Some(width) = preset.compact_width {
            if !(width.is_finite() && width > 0.0) {
                return Err(PresetError::InvalidValue {
                    field: "compact_width",
                    value: width,
                });
            }
            self.compact_width = width;
        }
        if let Some(overrides) = preset.standard.as_ref() {
            overrides.apply(&mut self.standard)?;
        }
        if let Some(overrides) = preset.compact.as_ref() {
            overrides.apply(&mut self.compact)?;
        }
        if let Some(overrides) = preset.effect.as_ref() {
            overrides.apply(&mut self.effect)?;
        }
        if let Some(overrides) = preset.screen.as_ref() {
            overrides.apply(&mut self.screen)?;
        }
        if let Some(text) = preset.boot_text.as_ref() {
            if text.is_empty() {
                return Err(PresetError::EmptyBootText);
            }
            self.boot_text = text.clone();
        }
        if let Some(keyboard) = preset.keyboard {
            self.keyboard = keyboard;
        }
        Ok(self)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PresetError {
    #[error("preset field {field} has invalid value {value}")]
    InvalidValue { field: &'static str, value: f32 },
    #[error("preset field {field} must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("preset boot_text must not be empty")]
    EmptyBootText,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScenePreset {
    #[serde(default)]
    pub compact_width: Option<f32>,
    #[serde(default)]
    pub standard: Option<ClassOverrides>,
    #[serde(default)]
    pub compact: Option<ClassOverrides>,
    #[serde(default)]
    pub effect: Option<EffectOverrides>,
    #[serde(default)]
    pub screen: Option<ScreenOverrides>,
    #[serde(default)]
    pub boot_text: Option<String>,
    #[serde(default)]
    pub keyboard: Option<bool>,
}

impl ScenePreset {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClassOverrides {
    #[serde(default)]
    pub zoom_mid: Option<f32>,
    #[serde(default)]
    pub zoom_mid2: Option<f32>,
    #[serde(default)]
    pub zoom_end: Option<f32>,
    #[serde(default)]
    pub mid2_fraction: Option<f32>,
    #[serde(default)]
    pub end_fraction: Option<f32>,
    #[serde(default)]
    pub model_scale: Option<f32>,
    #[serde(default)]
    pub typing_delay_ms: Option<u64>,
    #[serde(default)]
    pub ellipsis_pause_ms: Option<u64>,
    #[serde(default)]
    pub progress_interval_ms: Option<u64>,
    #[serde(default)]
    pub progress_increment: Option<u32>,
}

impl ClassOverrides {
    fn apply(&self, preset: &mut ClassPreset) -> Result<(), PresetError> {
        set_finite(&mut preset.zoom.mid, self.zoom_mid, "zoom_mid")?;
        set_finite(&mut preset.zoom.mid2, self.zoom_mid2, "zoom_mid2")?;
        set_finite(&mut preset.zoom.end, self.zoom_end, "zoom_end")?;
        set_finite(&mut preset.zoom.mid2_fraction, self.mid2_fraction, "mid2_fraction")?;
        set_finite(&mut preset.zoom.end_fraction, self.end_fraction, "end_fraction")?;
        if let Some(scale) = self.model_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(PresetError::InvalidValue {
                    field: "model_scale",
                    value: scale,
                });
            }
            preset.layout.model_scale = scale;
        }
        if let Some(delay) = self.typing_delay_ms {
            preset.typing.char_delay_ms = delay;
        }
        if let Some(pause) = self.ellipsis_pause_ms {
            preset.typing.ellipsis_pause_ms = pause;
        }
        if let Some(interval) = self.progress_interval_ms {
            preset.progress.interval_ms = interval;
        }
        if let Some(increment) = self.progress_increment {
            if increment == 0 {
                return Err(PresetError::ZeroValue {
                    field: "progress_increment",
                });
            }
            preset.progress.increment = increment;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EffectOverrides {
    #[serde(default)]
    pub blur_start: Option<f32>,
    #[serde(default)]
    pub blur_end: Option<f32>,
    #[serde(default)]
    pub max_blur_px: Option<f32>,
    #[serde(default)]
    pub min_opacity: Option<f32>,
    #[serde(default)]
    pub hide_threshold: Option<f32>,
}

impl EffectOverrides {
    fn apply(&self, effect: &mut ScreenEffectConfig) -> Result<(), PresetError> {
        set_finite(&mut effect.blur_start, self.blur_start, "blur_start")?;
        set_finite(&mut effect.blur_end, self.blur_end, "blur_end")?;
        set_finite(&mut effect.max_blur_px, self.max_blur_px, "max_blur_px")?;
        set_finite(&mut effect.min_opacity, self.min_opacity, "min_opacity")?;
        set_finite(&mut effect.hide_threshold, self.hide_threshold, "hide_threshold")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScreenOverrides {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub font_size: Option<f32>,
}

impl ScreenOverrides {
    fn apply(&self, screen: &mut ScreenOptions) -> Result<(), PresetError> {
        if let Some(width) = self.width {
            if width == 0 {
                return Err(PresetError::ZeroValue {
                    field: "screen.width",
                });
            }
            screen.width = width;
        }
        if let Some(height) = self.height {
            if height == 0 {
                return Err(PresetError::ZeroValue {
                    field: "screen.height",
                });
            }
            screen.height = height;
        }
        if let Some(size) = self.font_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(PresetError::InvalidValue {
                    field: "screen.font_size",
                    value: size,
                });
            }
            screen.font_size = size;
        }
        Ok(())
    }
}

fn set_finite(slot: &mut f32, value: Option<f32>, field: &'static str) -> Result<(), PresetError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(PresetError::InvalidValue { field, value });
        }
        *slot = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_preset_keeps_defaults() {
        let preset = ScenePreset::from_json("{}").expect("parse empty preset");
        let config = SceneConfig::default()
            .with_preset(&preset)
            .expect("apply preset");
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn preset_overrides_only_named_fields() {
        let preset = ScenePreset::from_json(
            r#"{
                "compact_width": 900,
                "standard": { "zoom_end": 9.5, "typing_delay_ms": 12 },
                "screen": { "width": 1024, "height": 768, "font_size": 48 },
                "keyboard": true
            }"#,
        )
        .expect("parse preset");
        let config = SceneConfig::default()
            .with_preset(&preset)
            .expect("apply preset");

        assert_eq!(config.compact_width, 900.0);
        assert_eq!(config.standard.zoom.end, 9.5);
        assert_eq!(config.standard.zoom.mid2, 5.0);
        assert_eq!(config.standard.typing.char_delay_ms, 12);
        assert_eq!(config.standard.typing.ellipsis_pause_ms, 150);
        assert_eq!(config.compact, ClassPreset::compact());
        assert_eq!(config.screen.width, 1024);
        assert_eq!(config.screen.font_size, 48.0);
        assert!(config.keyboard);
    }

    #[test]
    fn preset_rejects_zero_progress_increment() {
        let preset = ScenePreset::from_json(r#"{ "compact": { "progress_increment": 0 } }"#)
            .expect("parse preset");
        let err = SceneConfig::default()
            .with_preset(&preset)
            .expect_err("zero increment rejected");
        assert_eq!(
            err,
            PresetError::ZeroValue {
                field: "progress_increment"
            }
        );
    }

    #[test]
    fn classify_uses_configured_threshold() {
        let config = SceneConfig::default();
        assert_eq!(
            config.classify(ViewportSize::new(600.0, 800.0)),
            ViewportClass::Compact
        );
        assert_eq!(
            config.classify(ViewportSize::new(1280.0, 720.0)),
            ViewportClass::Standard
        );
    }
}
