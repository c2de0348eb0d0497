use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use retro_scene::{BitmapFont, GlyphSource, ScenePreset, SceneConfig, TrueTypeFont};

use crate::page::PageModel;

#[derive(Parser, Debug)]
#[command(about = "Scroll-driven retro computer scene with a booting screen", version)]
pub struct Args {
    /// Optional scene preset JSON overriding zoom stages, timings, and screen size
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// TrueType font for the screen text; the built-in 8x8 font is used otherwise
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Add the keyboard in front of the monitor
    #[arg(long)]
    pub keyboard: bool,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Lay the page out without the about section, so the scene is never blurred
    #[arg(long)]
    pub no_about: bool,

    /// Skip creating a winit window/event loop and simulate the boot screen on the CPU
    #[arg(long)]
    pub headless: bool,

    /// Simulated milliseconds to run in headless mode (stops early once the log is typed)
    #[arg(long, default_value_t = 10_000)]
    pub simulate_ms: u64,

    /// Simulated frame length in milliseconds for headless mode
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u64,

    /// When set, write the final screen texture to disk (PNG)
    #[arg(long)]
    pub dump_screen: Option<PathBuf>,

    /// When set, write every Nth simulated screen frame into this directory
    #[arg(long)]
    pub dump_frames: Option<PathBuf>,

    /// Frame stride used with --dump-frames
    #[arg(long, default_value_t = 10)]
    pub dump_every: u64,

    /// Print camera placement and screen effect for these scroll offsets (headless)
    #[arg(long, value_delimiter = ',')]
    pub probe_scroll: Vec<f32>,

    /// When set, write a JSON summary of the headless run
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.frame_ms > 0, "--frame-ms must be positive");
        ensure!(self.dump_every > 0, "--dump-every must be positive");
        ensure!(
            self.width > 0 && self.height > 0,
            "window size must be positive (got {}x{})",
            self.width,
            self.height
        );
        ensure!(
            self.probe_scroll.iter().all(|offset| offset.is_finite() && *offset >= 0.0),
            "--probe-scroll offsets must be non-negative"
        );
        Ok(())
    }
}

pub fn load_scene_preset(path: &Path) -> Result<ScenePreset> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scene preset {}", path.display()))?;
    let preset = ScenePreset::from_json(&data)
        .with_context(|| format!("parsing scene preset {}", path.display()))?;
    Ok(preset)
}

/// Built-in configuration with the preset file and command-line switches
/// layered on top.
pub fn scene_config(args: &Args) -> Result<SceneConfig> {
    let mut config = SceneConfig::default();
    if let Some(path) = args.preset.as_ref() {
        let preset = load_scene_preset(path)?;
        config = config
            .with_preset(&preset)
            .with_context(|| format!("applying scene preset {}", path.display()))?;
    }
    if args.keyboard {
        config.keyboard = true;
    }
    Ok(config)
}

pub fn glyph_source(args: &Args) -> Result<Box<dyn GlyphSource>> {
    match args.font.as_ref() {
        Some(path) => {
            let font = TrueTypeFont::load(path).context("loading screen font")?;
            Ok(Box::new(font))
        }
        None => Ok(Box::new(BitmapFont)),
    }
}

pub fn page_model(args: &Args, viewport_height: f32) -> PageModel {
    if args.no_about {
        PageModel::without_about(viewport_height)
    } else {
        PageModel::new(viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["retro_viewer"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_validate() {
        let args = parse(&[]);
        args.validate().expect("defaults are valid");
        assert!(!args.headless);
        assert_eq!((args.width, args.height), (1280, 800));
    }

    #[test]
    fn probe_scroll_accepts_comma_list() {
        let args = parse(&["--headless", "--probe-scroll", "0,400,2400"]);
        assert_eq!(args.probe_scroll, vec![0.0, 400.0, 2400.0]);
    }

    #[test]
    fn no_about_flag_drops_section() {
        assert!(page_model(&parse(&[]), 800.0).about_section_top().is_some());
        let page = page_model(&parse(&["--no-about"]), 800.0);
        assert_eq!(page.about_section_top(), None);
    }

    #[test]
    fn zero_frame_length_is_rejected() {
        let args = parse(&["--frame-ms", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn preset_file_and_keyboard_flag_layer() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("preset.json");
        fs::write(&path, r#"{ "screen": { "font_size": 48 } }"#).expect("write preset");
        let preset_arg = path.to_str().expect("utf-8 path");
        let args = parse(&["--preset", preset_arg, "--keyboard"]);
        let config = scene_config(&args).expect("config");
        assert_eq!(config.screen.font_size, 48.0);
        assert!(config.keyboard);
    }

    #[test]
    fn malformed_preset_reports_path() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").expect("write preset");
        let err = load_scene_preset(&path).expect_err("parse failure");
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn missing_font_falls_through_as_error() {
        let args = parse(&["--font", "/nonexistent/screen.ttf"]);
        assert!(glyph_source(&args).is_err());
    }
}
