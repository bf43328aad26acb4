use std::path::Path;

/// MIME type of the broadcast stream. Every track is concatenated raw into one
/// MP3 byte stream, so only MP3 files are eligible for the playlist.
pub const STREAM_MIME: &str = "audio/mpeg";

/// File name suffix of playable tracks.
pub const AUDIO_SUFFIX: &str = ".mp3";

/// Returns true when `path` names a playable track.
///
/// The suffix match is case-sensitive: "a.mp3" and a bare ".mp3" play, "a.MP3"
/// and "a.mp3.bak" do not. No content sniffing happens at this layer.
pub fn is_playable(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(AUDIO_SUFFIX))
}
