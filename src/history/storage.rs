use super::types::ScanHistory;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Get the default scan history path (~/.config/securethenews/scans.json)
pub fn get_history_path() -> PathBuf {
    crate::config::get_config_dir().join("scans.json")
}

/// Load scan history from a JSON file
///
/// If the file doesn't exist, returns a new empty history.
/// If the file exists but has an unsupported version, returns an error.
/// Scores are recomputed from the stored observations.
pub fn load_history(path: &Path) -> Result<ScanHistory> {
    if !path.exists() {
        return Ok(ScanHistory::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open scan history at {}", path.display()))?;

    let mut history: ScanHistory = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load scan history from {}", path.display()))?;

    // Version check
    if history.version != 1 {
        anyhow::bail!("Unsupported scan history version: {}", history.version);
    }

    // Stored scores may predate the current scoring rules
    history.rescore_all();
    Ok(history)
}

/// Save scan history to a JSON file atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_history(path: &Path, history: &ScanHistory) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut history = history.clone();
    history.rescore_all();

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, &history).context("Failed to serialize scan history")?;

    // Commit the write atomically
    file.commit().context("Failed to save scan history")?;

    Ok(())
}
