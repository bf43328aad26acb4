use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::playlist::mime::is_playable;

/// One playable file discovered in the library directory.
/// Immutable for the pass that listed it; the next pass re-lists from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub path: PathBuf,
    /// File name shown as "now playing" (e.g. "001-al-fatiha.mp3").
    pub display_name: String,
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, display_name }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("failed to create library directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read library directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Create the library directory (and parents) if it does not exist yet.
pub fn ensure_library_dir(dir: &Path) -> Result<(), PlaylistError> {
    std::fs::create_dir_all(dir).map_err(|source| PlaylistError::CreateDir {
        path: dir.to_owned(),
        source,
    })
}

/// List the playable tracks directly inside `dir`, sorted ascending by file name.
///
/// Sorting compares raw file-name bytes, so it is case-sensitive ("B.mp3" sorts
/// before "a.mp3"). Subdirectories are not descended into. Symlinks are followed;
/// a dangling symlink or an unreadable entry is logged and skipped. An empty
/// directory yields an empty list, not an error. Only a failure to read `dir`
/// itself is returned as `PlaylistError::ReadDir`.
pub fn list_tracks(dir: &Path) -> Result<Vec<AudioTrack>, PlaylistError> {
    let mut tracks = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Err(e) if e.depth() == 0 => {
                return Err(PlaylistError::ReadDir {
                    path: dir.to_owned(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!("Cannot access library entry: {}", e);
            }
            Ok(entry) if entry.file_type().is_file() && is_playable(entry.path()) => {
                tracks.push(AudioTrack::new(entry.into_path()));
            }
            Ok(_) => {}
        }
    }

    // walkdir sorts per directory already; keep the ordering explicit since the
    // broadcast order depends on it.
    tracks.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(tracks)
}
