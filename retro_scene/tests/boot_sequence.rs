use std::time::Duration;

use anyhow::Result;
use retro_scene::{
    BitmapFont, BootPhase, BootSequence, RasterStats, SceneConfig, ScenePreset, ScreenPainter,
    ScrollZoom, ViewportClass, ViewportSize,
};

const FRAME: Duration = Duration::from_millis(16);

fn small_config() -> Result<SceneConfig> {
    let preset = ScenePreset::from_json(
        r#"{
            "screen": { "width": 512, "height": 384, "font_size": 24 },
            "boot_text": "[Loading...]\nok\nScroll to continue..."
        }"#,
    )?;
    Ok(SceneConfig::default().with_preset(&preset)?)
}

#[test]
fn boot_runs_from_loading_to_ready() -> Result<()> {
    let config = small_config()?;
    let mut sequence = BootSequence::new(&config, ViewportClass::Standard);
    let mut painter = ScreenPainter::new(config.screen.clone(), Box::new(BitmapFont))?;

    let mut phases = vec![sequence.phase()];
    let mut loading_means = Vec::new();
    for _ in 0..2_000 {
        let tick = sequence.tick(FRAME);
        let canvas = painter.paint(&sequence);
        if tick.phase == BootPhase::Loading {
            loading_means.push(RasterStats::of_canvas(canvas).mean_luma);
        }
        if tick.phase_changed {
            phases.push(tick.phase);
        }
        if sequence.title_revealed() {
            break;
        }
    }

    assert_eq!(
        phases,
        vec![BootPhase::Loading, BootPhase::Typing, BootPhase::Ready]
    );
    assert!(
        loading_means.windows(2).all(|pair| pair[1] >= pair[0]),
        "loading frames should only brighten as the bar fills"
    );
    assert_eq!(
        sequence.typewriter().revealed_text(),
        "[Loading...]\nok\nScroll to continue..."
    );
    Ok(())
}

#[test]
fn ready_frame_exports_to_png() -> Result<()> {
    let config = small_config()?;
    let mut sequence = BootSequence::new(&config, ViewportClass::Compact);
    let mut painter = ScreenPainter::new(config.screen.clone(), Box::new(BitmapFont))?;
    while !sequence.title_revealed() {
        sequence.tick(FRAME);
    }
    let canvas = painter.paint(&sequence);
    let stats = RasterStats::of_canvas(canvas);
    assert!(stats.max_luma > 100);
    // text hugs the top-left of the screen
    assert!(stats.quadrant_means[0] > stats.quadrant_means[3]);

    let temp = tempfile::tempdir()?;
    let path = temp.path().join("screen.png");
    canvas.export_png(&path)?;
    let decoded = image::open(&path)?.to_rgba8();
    assert_eq!(decoded.dimensions(), (512, 384));
    Ok(())
}

#[test]
fn scroll_zoom_follows_viewport_class() -> Result<()> {
    let config = SceneConfig::default();
    let mut zoom = ScrollZoom::new(&config, ViewportSize::new(1280.0, 800.0))?;
    assert_eq!(zoom.class(), ViewportClass::Standard);
    let far = zoom.placement(800.0 * 3.0);
    assert!((far.distance - 8.0).abs() < 1e-4);

    let changed = zoom.resize(&config, ViewportSize::new(600.0, 900.0))?;
    assert!(changed);
    let held = zoom.placement(900.0 * 3.0);
    assert!((held.distance - 3.5).abs() < 1e-4);
    assert!((held.target.y - 1.3).abs() < 1e-4);
    Ok(())
}
