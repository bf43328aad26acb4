pub mod mime;
pub mod source;

pub use source::{ensure_library_dir, list_tracks, AudioTrack, PlaylistError};
