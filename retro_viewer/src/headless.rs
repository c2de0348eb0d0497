//! Windowless run of the scene: simulates the boot screen frame by frame on
//! the CPU, optionally dumping PNGs, probing scroll offsets, and writing a
//! JSON summary for automation.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::info;
use retro_scene::RasterStats;
use serde::Serialize;

use crate::cli::Args;
use crate::runtime::SceneRuntime;

#[derive(Debug, Serialize)]
struct PhaseChange {
    phase: &'static str,
    frame: u64,
    ms: u64,
}

#[derive(Debug, Serialize)]
struct ScreenDump {
    path: PathBuf,
    width: u32,
    height: u32,
    mean_luma: f32,
    quadrant_means: [f32; 4],
}

#[derive(Debug, Serialize)]
struct ScrollProbe {
    requested: f32,
    scroll: f32,
    distance: f32,
    height: f32,
    target_y: f32,
    blur_px: f32,
    opacity: f32,
    visible: bool,
}

#[derive(Debug, Serialize)]
struct HeadlessSummary {
    viewport: [f32; 2],
    class: &'static str,
    frames: u64,
    simulated_ms: u64,
    final_phase: &'static str,
    title_revealed: bool,
    phase_changes: Vec<PhaseChange>,
    dumped_frames: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    screen: Option<ScreenDump>,
    probes: Vec<ScrollProbe>,
}

pub fn run(args: &Args, mut runtime: SceneRuntime) -> Result<()> {
    let frame = Duration::from_millis(args.frame_ms);
    if let Some(dir) = args.dump_frames.as_ref() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating frame dump directory {}", dir.display()))?;
    }

    let mut phase_changes = Vec::new();
    let mut dumped_frames = 0usize;
    while runtime.sequence().now_ms() < args.simulate_ms && !runtime.title_revealed() {
        let (tick, _) = runtime.tick(frame);
        let index = runtime.sequence().frames();
        if tick.phase_changed {
            phase_changes.push(PhaseChange {
                phase: tick.phase.label(),
                frame: index,
                ms: tick.now_ms,
            });
        }
        if let Some(dir) = args.dump_frames.as_ref() {
            if index % args.dump_every == 0 {
                let path = dir.join(format!("screen_{index:05}.png"));
                runtime.screen().export_png(&path)?;
                dumped_frames += 1;
            }
        }
    }

    let sequence = runtime.sequence();
    let viewport = runtime.viewport();
    println!(
        "Simulated {} frames ({} ms) at {:.0}x{:.0} ({}); boot phase {}",
        sequence.frames(),
        sequence.now_ms(),
        viewport.width,
        viewport.height,
        runtime.zoom().class().label(),
        sequence.phase().label()
    );
    for change in &phase_changes {
        println!(
            "  phase -> {} at frame {} ({} ms)",
            change.phase, change.frame, change.ms
        );
    }
    if runtime.title_revealed() {
        println!("  site title revealed");
    }
    if let Some(dir) = args.dump_frames.as_ref() {
        println!(
            "  {} screen frames written to {}",
            dumped_frames,
            dir.display()
        );
    }

    let screen = match args.dump_screen.as_ref() {
        Some(path) => Some(dump_screen(&runtime, path)?),
        None => None,
    };

    let probes = probe_scroll(&mut runtime, &args.probe_scroll);

    if let Some(path) = args.summary_json.as_ref() {
        let sequence = runtime.sequence();
        let summary = HeadlessSummary {
            viewport: [viewport.width, viewport.height],
            class: runtime.zoom().class().label(),
            frames: sequence.frames(),
            simulated_ms: sequence.now_ms(),
            final_phase: sequence.phase().label(),
            title_revealed: runtime.title_revealed(),
            phase_changes,
            dumped_frames,
            screen,
            probes,
        };
        let json =
            serde_json::to_string_pretty(&summary).context("serializing headless summary to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing headless summary to {}", path.display()))?;
        info!("headless summary written to {}", path.display());
    }
    Ok(())
}

fn dump_screen(runtime: &SceneRuntime, path: &Path) -> Result<ScreenDump> {
    let canvas = runtime.screen();
    canvas
        .export_png(path)
        .with_context(|| format!("writing PNG to {}", path.display()))?;
    let stats = RasterStats::of_canvas(canvas);
    println!(
        "Boot screen exported to {} ({}x{})",
        path.display(),
        canvas.width(),
        canvas.height()
    );
    println!(
        "  luminance avg {:.2}, min {}, max {}, opaque pixels {} / {}",
        stats.mean_luma, stats.min_luma, stats.max_luma, stats.opaque_pixels, stats.total_pixels
    );
    println!(
        "  quadrant luma means (TL, TR, BL, BR): {:.2}, {:.2}, {:.2}, {:.2}",
        stats.quadrant_means[0],
        stats.quadrant_means[1],
        stats.quadrant_means[2],
        stats.quadrant_means[3]
    );
    Ok(ScreenDump {
        path: path.to_path_buf(),
        width: canvas.width(),
        height: canvas.height(),
        mean_luma: stats.mean_luma,
        quadrant_means: stats.quadrant_means,
    })
}

fn probe_scroll(runtime: &mut SceneRuntime, offsets: &[f32]) -> Vec<ScrollProbe> {
    if offsets.is_empty() {
        return Vec::new();
    }
    println!("Scroll probes:");
    offsets
        .iter()
        .map(|&requested| {
            runtime.scroll_to(requested);
            let placement = runtime.camera_placement();
            let effect = runtime.effect();
            let probe = ScrollProbe {
                requested,
                scroll: runtime.scroll(),
                distance: placement.distance,
                height: placement.height,
                target_y: placement.target.y,
                blur_px: effect.blur_px,
                opacity: effect.opacity,
                visible: effect.visible,
            };
            println!(
                "  scroll {:.0}: distance {:.3}, height {:.3}, target y {:.3}, blur {:.1}px, opacity {:.2}{}",
                probe.scroll,
                probe.distance,
                probe.height,
                probe.target_y,
                probe.blur_px,
                probe.opacity,
                if probe.visible { "" } else { " (hidden)" }
            );
            probe
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageModel;
    use clap::Parser;
    use retro_scene::{BitmapFont, SceneConfig, ScreenOptions, ViewportSize};
    use tempfile::tempdir;

    fn small_runtime() -> SceneRuntime {
        let config = SceneConfig {
            screen: ScreenOptions {
                width: 256,
                height: 192,
                font_size: 12.0,
            },
            ..SceneConfig::default()
        };
        SceneRuntime::new(
            config,
            Box::new(BitmapFont),
            ViewportSize::new(1280.0, 800.0),
            PageModel::new(800.0),
        )
        .expect("runtime")
    }

    #[test]
    fn summary_records_phases_and_probes() {
        let temp = tempdir().expect("temp dir");
        let summary_path = temp.path().join("summary.json");
        let frames_dir = temp.path().join("frames");
        let args = Args::parse_from([
            "retro_viewer",
            "--headless",
            "--dump-frames",
            frames_dir.to_str().expect("utf-8 path"),
            "--dump-every",
            "25",
            "--probe-scroll",
            "0,2400,100000",
            "--summary-json",
            summary_path.to_str().expect("utf-8 path"),
        ]);
        run(&args, small_runtime()).expect("headless run");

        let data = fs::read_to_string(&summary_path).expect("summary");
        let summary: serde_json::Value = serde_json::from_str(&data).expect("json");
        assert_eq!(summary["final_phase"], "ready");
        assert_eq!(summary["title_revealed"], true);
        let phases: Vec<_> = summary["phase_changes"]
            .as_array()
            .expect("phase list")
            .iter()
            .map(|change| change["phase"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(phases, vec!["typing", "ready"]);

        let probes = summary["probes"].as_array().expect("probe list");
        assert_eq!(probes.len(), 3);
        let distance = probes[1]["distance"].as_f64().unwrap_or_default();
        assert!((distance - 8.0).abs() < 1e-3, "distance {distance}");
        assert_eq!(probes[2]["visible"], false);
        assert!(summary["dumped_frames"].as_u64().unwrap_or(0) > 0);
        assert!(frames_dir.join("screen_00025.png").exists());
    }

    #[test]
    fn simulate_limit_stops_before_ready() {
        let temp = tempdir().expect("temp dir");
        let summary_path = temp.path().join("summary.json");
        let args = Args::parse_from([
            "retro_viewer",
            "--headless",
            "--simulate-ms",
            "160",
            "--summary-json",
            summary_path.to_str().expect("utf-8 path"),
        ]);
        run(&args, small_runtime()).expect("headless run");

        let data = fs::read_to_string(&summary_path).expect("summary");
        let summary: serde_json::Value = serde_json::from_str(&data).expect("json");
        assert_eq!(summary["frames"], 10);
        assert_eq!(summary["final_phase"], "loading");
        assert_eq!(summary["title_revealed"], false);
        assert!(summary.get("screen").is_none());
    }
}
