use anyhow::{Context, Result};
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Relative output paths are taken from the current working directory.
pub fn resolve_output_path(configured: &Path) -> Result<PathBuf> {
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    let cwd = env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(configured))
}

/// Writes `content` next to `path` first and renames it into place, so a
/// failed write never leaves a truncated document behind.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("Output path {:?} has no file name", path))?;
    let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let written = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .with_context(|| format!("Could not write to output file {}", temp_path.display()));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    fs::rename(&temp_path, path).map_err(|err| {
        let _ = fs::remove_file(&temp_path);
        anyhow::Error::new(err)
            .context(format!("Could not write to output file {}", path.display()))
    })
}
