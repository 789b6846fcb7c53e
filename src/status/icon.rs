//! One-shot icon setup for the status bar item. Converts the app bundle's
//! `.icns` into a small cached png and wires it up as the item background.
//! Everything here is optional decoration, failures only get logged.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::app;

use super::sketchybar::run_sketchybar;

const ICON_MAX_DIMENSION: &str = "36";

fn find_icns(app_path: &Path) -> Option<PathBuf> {
    let resources = app_path.join("Contents").join("Resources");
    let entries = std::fs::read_dir(resources).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "icns"))
}

async fn convert_to_png(icns: &Path, cache_dir: &Path) -> Result<PathBuf> {
    let png_out = cache_dir.join("brainfm_icon.png");
    Command::new("sips")
        .args(["-s", "format", "png"])
        .arg(icns)
        .arg("--out")
        .arg(&png_out)
        .output()
        .await?;
    if !png_out.exists() {
        anyhow::bail!("sips produced no output for {}", icns.display());
    }
    // Downscale so it fits the menu bar.
    Command::new("sips")
        .args(["-Z", ICON_MAX_DIMENSION])
        .arg(&png_out)
        .output()
        .await?;
    Ok(png_out)
}

async fn setup_icon(item: &str, cache_dir: &Path) -> Result<()> {
    let app_path = app::find_app_path().context("App bundle not found")?;
    let icns = find_icns(&app_path).context("No .icns in app resources")?;
    let png = convert_to_png(&icns, cache_dir).await?;

    let args = vec![
        "--set".to_string(),
        item.to_string(),
        format!("click_script=open {}", app_path.display()),
        "icon.drawing=on".into(),
        "icon.padding_right=0".into(),
        "icon.padding_left=0".into(),
        "padding_left=1".into(),
        "padding_right=1".into(),
        "icon.color=transparent".into(),
        "background.corner_radius=5".into(),
        "background.color=0x66f0f0f0".into(),
        "background.height=20".into(),
        "background.drawing=on".into(),
        "background.image.scale=0.6".into(),
        format!("background.image={}", png.display()),
    ];
    run_sketchybar(&args).await?;
    Ok(())
}

/// Tries to decorate the item with the app icon once at startup.
pub async fn ensure_icon(item: &str, cache_dir: &Path) {
    if let Err(e) = setup_icon(item, cache_dir).await {
        debug!("Skipping icon setup: {e:?}");
    }
}
