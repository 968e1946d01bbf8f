//! Save an encoded melody to disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use gene_midi::{MidiBuffer, MIDI_EXTENSION, MIDI_MIME};

use crate::error::Result;

/// Write `midi` to `path` and return the path actually written.
///
/// `.mid` is appended unless the name already ends in `.mid` or `.midi`.
pub fn save(midi: &MidiBuffer, path: &Path) -> Result<PathBuf> {
    let path = with_midi_extension(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, midi.as_bytes())?;
    info!("Saved {} bytes ({}) to {}", midi.len(), MIDI_MIME, path.display());
    Ok(path)
}

fn with_midi_extension(path: &Path) -> PathBuf {
    let has_ext = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
        .unwrap_or(false);
    if has_ext {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(MIDI_EXTENSION);
    PathBuf::from(name)
}
