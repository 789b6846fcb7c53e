use std::{env, io, path::PathBuf};

use anyhow::Result;

/// Resolves the directory used for logs and the cached icon. Follows
/// `XDG_CACHE_HOME` with a `$HOME/.cache` fallback, which also matches what
/// macOS users of sketchybar tend to have.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            env::var("HOME").map(|home| {
                let mut path = PathBuf::from(home);
                path.push(".cache");
                path
            })
        })
        .expect("Couldn't find neither XDG_CACHE_HOME nor HOME");
    path.push("brainbar");

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
