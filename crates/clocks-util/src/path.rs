//! Path utilities.

use std::path::{Path, PathBuf};

/// Get the clocks data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/clocks` if set
/// - `~/.local/share/clocks` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("clocks"))
}

/// Get the clocks configuration directory.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("clocks"))
}

/// Directory holding persisted store snapshots below a data root.
pub fn snapshots_dir(data_root: &Path) -> PathBuf {
    data_root.join("snapshots")
}
