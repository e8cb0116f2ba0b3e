//! Input discovery for the command line

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions the decoder can handle
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "oga", "m4a", "aac", "mp4"];

/// Check if a path has a supported audio extension
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand a mix of files and directories into audio file paths
///
/// Files are passed through untouched so the decoder can report them;
/// directories are walked recursively and filtered by extension, sorted for
/// stable output.
pub fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_audio_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();

        log::info!("Scanned {:?}: {} audio files", input, found.len());
        files.extend(found);
    }

    files
}
