use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::tempdir;

const SMALL_PRESET: &str = r#"{
    "screen": { "width": 320, "height": 240, "font_size": 16 },
    "boot_text": "[Loading...]\nhello\nScroll to continue..."
}"#;

#[test]
fn headless_run_dumps_screen_and_probes_scroll() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for dumps")?;
    let preset_path = temp_dir.path().join("preset.json");
    fs::write(&preset_path, SMALL_PRESET).context("writing preset")?;
    let screen_path = temp_dir.path().join("screen.png");
    let summary_path = temp_dir.path().join("summary.json");

    let output = Command::new(env!("CARGO_BIN_EXE_retro_viewer"))
        .args([
            "--headless",
            "--preset",
            preset_path.to_str().context("preset path is not valid UTF-8")?,
            "--dump-screen",
            screen_path.to_str().context("screen path is not valid UTF-8")?,
            "--summary-json",
            summary_path.to_str().context("summary path is not valid UTF-8")?,
            "--probe-scroll",
            "0,1200,2400",
        ])
        .output()
        .context("executing retro_viewer headless run")?;

    assert!(
        output.status.success(),
        "retro_viewer exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(screen_path.is_file(), "retro_viewer did not dump the screen");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("boot phase ready"), "stdout:\n{stdout}");
    assert!(stdout.contains("site title revealed"), "stdout:\n{stdout}");
    assert!(
        stdout.contains("quadrant luma means (TL, TR, BL, BR)"),
        "stdout:\n{stdout}"
    );
    assert!(
        stdout.contains("scroll 2400: distance 8.000"),
        "stdout:\n{stdout}"
    );

    let decoded = image::open(&screen_path)?.to_rgba8();
    assert_eq!(decoded.dimensions(), (320, 240));

    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&summary_path)?)?;
    assert_eq!(summary["class"], "standard");
    assert_eq!(summary["probes"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn invalid_frame_length_fails_fast() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_retro_viewer"))
        .args(["--headless", "--frame-ms", "0"])
        .output()
        .context("executing retro_viewer with bad arguments")?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--frame-ms"));
    Ok(())
}
