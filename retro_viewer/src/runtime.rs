//! GPU-free side of the viewer: page scroll, camera staging, orbit drag, and
//! the boot screen. The window event loop and the headless runner both drive
//! this; the renderer only reads from it.

use std::time::Duration;

use anyhow::{Context, Result};
use glam::Mat4;
use log::{debug, info};
use retro_scene::effect::effect_for_section;
use retro_scene::typewriter::cursor_visible;
use retro_scene::{
    BootPhase, BootSequence, Canvas, CameraPlacement, FrameTick, GlyphSource, OrbitLimits,
    OrbitRig, SceneConfig, ScreenEffect, ScreenPainter, ScrollZoom, ViewportSize,
};

use crate::page::PageModel;

/// What the screen texture currently shows. Repainting is skipped while this
/// stays the same between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenKey {
    phase: BootPhase,
    progress: u32,
    revealed: usize,
    cursor: bool,
}

pub struct SceneRuntime {
    config: SceneConfig,
    viewport: ViewportSize,
    page: PageModel,
    zoom: ScrollZoom,
    orbit: OrbitRig,
    sequence: BootSequence,
    painter: ScreenPainter,
    effect: ScreenEffect,
    painted: Option<ScreenKey>,
    pointer: Option<(f32, f32)>,
    dragging: bool,
}

impl SceneRuntime {
    pub fn new(
        config: SceneConfig,
        glyphs: Box<dyn GlyphSource>,
        viewport: ViewportSize,
        page: PageModel,
    ) -> Result<Self> {
        let zoom = ScrollZoom::new(&config, viewport).context("building zoom stages")?;
        let layout = zoom.preset().layout;
        let orbit = OrbitRig::new(layout.eye(), layout.target(), OrbitLimits::default());
        let sequence = BootSequence::new(&config, zoom.class());
        let painter = ScreenPainter::new(config.screen.clone(), glyphs)
            .context("allocating screen texture")?;
        let effect = ScreenEffect::rest(&config.effect);
        info!(
            "scene ready: {:.0}x{:.0} ({}), screen {}x{} using {}",
            viewport.width,
            viewport.height,
            zoom.class().label(),
            config.screen.width,
            config.screen.height,
            painter.glyph_label()
        );

        let mut runtime = Self {
            config,
            viewport,
            page,
            zoom,
            orbit,
            sequence,
            painter,
            effect,
            painted: None,
            pointer: None,
            dragging: false,
        };
        runtime.page.resize(viewport.height);
        runtime.apply_scroll();
        Ok(runtime)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn zoom(&self) -> &ScrollZoom {
        &self.zoom
    }

    pub fn scroll(&self) -> f32 {
        self.page.scroll()
    }

    pub fn effect(&self) -> ScreenEffect {
        self.effect
    }

    pub fn sequence(&self) -> &BootSequence {
        &self.sequence
    }

    pub fn screen(&self) -> &Canvas {
        self.painter.canvas()
    }

    pub fn title_revealed(&self) -> bool {
        self.sequence.title_revealed()
    }

    /// Rebuilds everything that depends on the viewport. Crossing the
    /// compact threshold also puts the camera back on the class layout and
    /// swaps the boot timings.
    pub fn resize(&mut self, viewport: ViewportSize) -> Result<()> {
        let class_changed = self
            .zoom
            .resize(&self.config, viewport)
            .context("rebuilding zoom stages")?;
        self.viewport = viewport;
        self.page.resize(viewport.height);
        if class_changed {
            self.sequence.retime(&self.config, self.zoom.class());
            self.apply_layout();
        }
        self.apply_scroll();
        Ok(())
    }

    pub fn scroll_by(&mut self, delta: f32) {
        if self.page.scroll_by(delta) {
            self.apply_scroll();
        }
    }

    pub fn scroll_to(&mut self, offset: f32) {
        if self.page.scroll_to(offset) {
            self.apply_scroll();
        }
    }

    pub fn scroll_line(&mut self, lines: f32) {
        self.scroll_by(lines * 40.0);
    }

    pub fn scroll_page(&mut self, pages: f32) {
        self.scroll_by(pages * self.page.viewport_height() * 0.9);
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_to(self.page.max_scroll());
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Pointer position in logical pixels.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let (true, Some((last_x, last_y))) = (self.dragging, self.pointer) {
            self.orbit
                .drag(x - last_x, y - last_y, self.viewport.height);
        }
        self.pointer = Some((x, y));
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.dragging = false;
    }

    /// Advances the boot screen and the orbit damping by one frame, then
    /// repaints the screen texture if what it shows has changed. Returns the
    /// frame tick and whether the texture needs uploading.
    pub fn tick(&mut self, delta: Duration) -> (FrameTick, bool) {
        let tick = self.sequence.tick(delta);
        self.orbit.update();
        if tick.phase == BootPhase::Ready && tick.phase_changed {
            info!("boot log typed out; showing site title");
        }

        let key = self.screen_key(tick.now_ms);
        let dirty = self.painted != Some(key);
        if dirty {
            self.painter.paint(&self.sequence);
            self.painted = Some(key);
        }
        (tick, dirty)
    }

    pub fn camera_placement(&self) -> CameraPlacement {
        self.zoom.placement(self.page.scroll())
    }

    pub fn model_transform(&self) -> Mat4 {
        retro_scene::ComputerModel::root_transform(self.zoom.preset().layout.model_scale)
    }

    pub fn view_projection(&self) -> Mat4 {
        let camera = &self.config.camera;
        let projection = Mat4::perspective_rh(
            camera.fov_y_degrees.to_radians(),
            self.viewport.aspect(),
            camera.near,
            camera.far,
        );
        projection * self.orbit.view_matrix()
    }

    pub fn eye(&self) -> glam::Vec3 {
        self.orbit.eye()
    }

    fn screen_key(&self, now_ms: u64) -> ScreenKey {
        let phase = self.sequence.phase();
        ScreenKey {
            phase,
            progress: self.sequence.progress().progress(),
            revealed: self.sequence.typewriter().revealed_len(),
            cursor: phase != BootPhase::Loading && cursor_visible(now_ms),
        }
    }

    fn apply_layout(&mut self) {
        let layout = self.zoom.preset().layout;
        self.orbit = OrbitRig::new(layout.eye(), layout.target(), OrbitLimits::default());
    }

    fn apply_scroll(&mut self) {
        if !self.zoom.class().is_compact() {
            let placement = self.camera_placement();
            self.orbit.apply_placement(&placement);
            debug!(
                "scroll {:.1}: camera distance {:.3} height {:.3}",
                self.page.scroll(),
                placement.distance,
                placement.height
            );
        }
        if let Some(effect) = effect_for_section(
            &self.config.effect,
            self.page.about_section_top(),
            self.viewport.height,
        ) {
            if effect != self.effect {
                debug!(
                    "screen effect blur {:.1}px opacity {:.2} visible {}",
                    effect.blur_px, effect.opacity, effect.visible
                );
            }
            self.effect = effect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_scene::{BitmapFont, ScreenOptions};

    fn small_config() -> SceneConfig {
        SceneConfig {
            screen: ScreenOptions {
                width: 256,
                height: 192,
                font_size: 12.0,
            },
            ..SceneConfig::default()
        }
    }

    fn runtime(width: f32, height: f32) -> SceneRuntime {
        let viewport = ViewportSize::new(width, height);
        SceneRuntime::new(
            small_config(),
            Box::new(BitmapFont),
            viewport,
            PageModel::new(height),
        )
        .expect("runtime")
    }

    #[test]
    fn scrolling_moves_camera_back_on_standard_viewport() {
        let mut runtime = runtime(1280.0, 800.0);
        assert!((runtime.eye().z - 3.0).abs() < 1e-3);
        runtime.scroll_to(800.0 * 3.0);
        assert!((runtime.eye().z - 8.0).abs() < 1e-3);
        assert!((runtime.eye().y - 2.0).abs() < 1e-3);
    }

    #[test]
    fn compact_viewport_ignores_scroll_for_camera() {
        let mut runtime = runtime(600.0, 900.0);
        let before = runtime.eye();
        runtime.scroll_to(900.0 * 2.0);
        assert_eq!(runtime.eye(), before);
        assert!((before.z - 3.5).abs() < 1e-3);
    }

    #[test]
    fn about_section_blurs_and_hides_scene() {
        let mut runtime = runtime(1280.0, 800.0);
        assert!(runtime.effect().is_rest());
        // about top at 0.65 viewports leaves 35% covered: halfway through the blur
        runtime.scroll_to(800.0 * (3.4 - 0.65));
        let effect = runtime.effect();
        assert!((effect.blur_px - 7.5).abs() < 0.05, "{effect:?}");
        runtime.scroll_to_end();
        assert!(!runtime.effect().visible);
        runtime.scroll_to(0.0);
        assert!(runtime.effect().is_rest());
    }

    #[test]
    fn missing_about_section_leaves_effect_alone() {
        let viewport = ViewportSize::new(1280.0, 800.0);
        let mut runtime = SceneRuntime::new(
            small_config(),
            Box::new(BitmapFont),
            viewport,
            PageModel::without_about(800.0),
        )
        .expect("runtime");
        runtime.scroll_page(1.0);
        assert!(runtime.effect().is_rest());
    }

    #[test]
    fn resize_across_threshold_rebuilds_layout() -> Result<()> {
        let mut runtime = runtime(1280.0, 800.0);
        runtime.scroll_to(1200.0);
        runtime.resize(ViewportSize::new(500.0, 800.0))?;
        assert!(runtime.zoom().class().is_compact());
        assert!((runtime.eye().z - 3.5).abs() < 1e-3);
        assert!((runtime.model_transform().x_axis.x - 0.7).abs() < 1e-6);
        runtime.resize(ViewportSize::new(1280.0, 800.0))?;
        assert!(!runtime.zoom().class().is_compact());
        Ok(())
    }

    #[test]
    fn screen_repaints_only_on_change() {
        let mut runtime = runtime(1280.0, 800.0);
        let (_, first) = runtime.tick(Duration::from_millis(16));
        assert!(first);
        for _ in 0..200 {
            runtime.tick(Duration::from_millis(16));
        }
        assert!(runtime.title_revealed() || runtime.sequence().phase() == BootPhase::Typing);
        while !runtime.title_revealed() {
            runtime.tick(Duration::from_millis(16));
        }
        // cursor blink is the only change left; within one half-period nothing repaints
        let now = runtime.sequence().now_ms();
        let to_boundary = 500 - now % 500;
        if to_boundary > 2 {
            let (_, dirty) = runtime.tick(Duration::from_millis(1));
            assert!(!dirty);
        }
    }

    #[test]
    fn drag_only_rotates_while_button_held() {
        let mut runtime = runtime(1280.0, 800.0);
        let start = runtime.eye();
        runtime.pointer_moved(100.0, 100.0);
        runtime.pointer_moved(300.0, 100.0);
        for _ in 0..30 {
            runtime.tick(Duration::from_millis(16));
        }
        assert!((runtime.eye() - start).length() < 1e-3);

        runtime.set_dragging(true);
        runtime.pointer_moved(400.0, 100.0);
        for _ in 0..30 {
            runtime.tick(Duration::from_millis(16));
        }
        assert!(runtime.eye().x.abs() > 0.05);
    }
}
