//! Blur/fade applied to the whole scene as the about section slides over it.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenEffectConfig {
    /// Visible fraction of the section where the blur starts.
    pub blur_start: f32,
    /// Visible fraction where the blur reaches its maximum.
    pub blur_end: f32,
    pub max_blur_px: f32,
    pub max_opacity: f32,
    /// How much opacity is removed at full blur, before the floor applies.
    pub opacity_fade: f32,
    pub min_opacity: f32,
    /// Blur progress above which the scene is hidden entirely.
    pub hide_threshold: f32,
}

impl Default for ScreenEffectConfig {
    fn default() -> Self {
        Self {
            blur_start: 0.1,
            blur_end: 0.6,
            max_blur_px: 15.0,
            max_opacity: 1.0,
            opacity_fade: 0.8,
            min_opacity: 0.2,
            hide_threshold: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenEffect {
    pub blur_px: f32,
    pub opacity: f32,
    pub visible: bool,
}

impl ScreenEffect {
    /// State while the section is still below the viewport.
    pub fn rest(config: &ScreenEffectConfig) -> Self {
        Self {
            blur_px: 0.0,
            opacity: config.max_opacity,
            visible: true,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.blur_px <= 0.0 && self.visible
    }
}

/// Maps the visible fraction of the section onto `0..=1`.
pub fn blur_progress(config: &ScreenEffectConfig, visible_amount: f32) -> f32 {
    let span = config.blur_end - config.blur_start;
    if span <= 0.0 {
        return if visible_amount > config.blur_start {
            1.0
        } else {
            0.0
        };
    }
    ((visible_amount - config.blur_start) / span).clamp(0.0, 1.0)
}

pub fn effect_for_visible_amount(config: &ScreenEffectConfig, visible_amount: f32) -> ScreenEffect {
    let progress = blur_progress(config, visible_amount);
    ScreenEffect {
        blur_px: progress * config.max_blur_px,
        opacity: (config.max_opacity - progress * config.opacity_fade).max(config.min_opacity),
        visible: progress <= config.hide_threshold,
    }
}

/// Effect for the section's top edge in viewport coordinates. `None` means the
/// section is missing and the caller should leave the current effect alone.
pub fn effect_for_section(
    config: &ScreenEffectConfig,
    section_top: Option<f32>,
    viewport_height: f32,
) -> Option<ScreenEffect> {
    let top = section_top?;
    let height = viewport_height.max(1.0);
    if top < height {
        let visible_amount = (height - top) / height;
        Some(effect_for_visible_amount(config, visible_amount))
    } else {
        Some(ScreenEffect::rest(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn progress_clamps_to_unit_range() {
        let config = ScreenEffectConfig::default();
        assert_eq!(blur_progress(&config, 0.0), 0.0);
        assert_eq!(blur_progress(&config, 0.1), 0.0);
        assert!((blur_progress(&config, 0.35) - 0.5).abs() < EPSILON);
        assert_eq!(blur_progress(&config, 0.6), 1.0);
        assert_eq!(blur_progress(&config, 2.0), 1.0);
    }

    #[test]
    fn full_blur_hits_opacity_floor_and_hides() {
        let config = ScreenEffectConfig::default();
        let effect = effect_for_visible_amount(&config, 0.9);
        assert!((effect.blur_px - 15.0).abs() < EPSILON);
        assert!((effect.opacity - 0.2).abs() < EPSILON);
        assert!(!effect.visible);
    }

    #[test]
    fn hide_only_above_threshold() {
        let config = ScreenEffectConfig::default();
        let below_threshold = effect_for_visible_amount(&config, 0.1 + 0.5 * 0.94);
        assert!(below_threshold.visible);
        let past_threshold = effect_for_visible_amount(&config, 0.1 + 0.5 * 0.96);
        assert!(!past_threshold.visible);
    }

    #[test]
    fn half_blur_fades_partially() {
        let config = ScreenEffectConfig::default();
        let effect = effect_for_visible_amount(&config, 0.35);
        assert!((effect.blur_px - 7.5).abs() < EPSILON);
        assert!((effect.opacity - 0.6).abs() < EPSILON);
        assert!(effect.visible);
    }

    #[test]
    fn section_below_viewport_resets_effect() {
        let config = ScreenEffectConfig::default();
        let effect = effect_for_section(&config, Some(1200.0), 900.0).expect("effect");
        assert_eq!(effect, ScreenEffect::rest(&config));
        assert!(effect.is_rest());
    }

    #[test]
    fn section_entering_view_uses_visible_fraction() {
        let config = ScreenEffectConfig::default();
        // 35% of the viewport covered by the section
        let effect = effect_for_section(&config, Some(650.0), 1000.0).expect("effect");
        assert!((effect.blur_px - 7.5).abs() < 1e-3);
    }

    #[test]
    fn missing_section_skips_update() {
        let config = ScreenEffectConfig::default();
        assert!(effect_for_section(&config, None, 900.0).is_none());
    }

    #[test]
    fn collapsed_blur_window_steps() {
        let config = ScreenEffectConfig {
            blur_start: 0.5,
            blur_end: 0.5,
            ..ScreenEffectConfig::default()
        };
        assert_eq!(blur_progress(&config, 0.4), 0.0);
        assert_eq!(blur_progress(&config, 0.6), 1.0);
    }
}
