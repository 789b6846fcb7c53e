//! Locating and launching the Brain.fm desktop app with debugging enabled.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::info;

const APP_PATH: &str = "/Applications/Brain.fm.app";
const BUNDLE_ID: &str = "com.electron.brain.fm";
const STARTUP_GRACE: Duration = Duration::from_secs(5);

/// Finds the app bundle. Checks the usual install location first, then asks
/// Spotlight by bundle id.
pub fn find_app_path() -> Option<PathBuf> {
    let standard = PathBuf::from(APP_PATH);
    if standard.exists() {
        return Some(standard);
    }
    find_by_bundle_id()
}

fn find_by_bundle_id() -> Option<PathBuf> {
    let output = Command::new("mdfind")
        .arg(format!("kMDItemCFBundleIdentifier={BUNDLE_ID}"))
        .output()
        .ok()?;
    let stdout = String::from_utf8(output.stdout).ok()?;
    let mut paths: Vec<PathBuf> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && l.ends_with(".app"))
        .map(PathBuf::from)
        .collect();
    // Prefer /Applications installs over stray copies in build dirs.
    paths.sort_by_key(|p| {
        let in_applications = p.starts_with("/Applications");
        (!in_applications, p.as_os_str().len())
    });
    paths.into_iter().next()
}

fn executable_in(bundle: &Path) -> PathBuf {
    bundle.join("Contents").join("MacOS").join("Brain.fm")
}

/// Starts the app detached with the debugging port open, then waits a bit so
/// the first poll doesn't race the startup.
pub async fn launch(port: u16) -> Result<()> {
    let bundle = find_app_path()
        .context("Brain.fm app not found; please install it from https://brain.fm/")?;

    let mut command = Command::new(executable_in(&bundle));
    command.args([
        format!("--remote-debugging-port={port}"),
        "--remote-allow-origins=*".to_string(),
    ]);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    info!("Launched Brain.fm, waiting for the debugging port");
    tokio::time::sleep(STARTUP_GRACE).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    #[test]
    fn executable_path_points_into_bundle() {
        let exe = super::executable_in(&PathBuf::from("/Applications/Brain.fm.app"));
        assert_eq!(
            exe,
            PathBuf::from("/Applications/Brain.fm.app/Contents/MacOS/Brain.fm")
        );
    }
}
