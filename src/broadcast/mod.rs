//! Broadcast engine: every client gets its own endless walk over the playlist.

pub mod now_playing;
pub mod opener;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use now_playing::NowPlaying;
pub use opener::{FsTrackOpener, TrackOpener, TrackReader};
pub use session::Session;

/// Default chunk size handed to the HTTP body, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Tuning knobs for sessions. Defaults match the production server.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Upper bound on the size of each emitted chunk.
    pub chunk_size: usize,
    /// Pause after each chunk so one session cannot hog a worker thread.
    /// Zero falls back to a plain `yield_now`. This is not playback pacing.
    pub chunk_pause: Duration,
    /// How long an idle session waits before re-listing an empty library.
    pub empty_poll: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_pause: Duration::from_millis(1),
            empty_poll: Duration::from_secs(2),
        }
    }
}

pub(crate) struct EngineInner {
    pub(crate) library_dir: PathBuf,
    pub(crate) opener: Arc<dyn TrackOpener>,
    pub(crate) now_playing: NowPlaying,
    pub(crate) options: EngineOptions,
}

/// Hands out independent sessions over one library directory.
/// Cheap to clone; all clones share the same now-playing label.
#[derive(Clone)]
pub struct BroadcastEngine {
    inner: Arc<EngineInner>,
}

impl BroadcastEngine {
    /// Engine reading tracks from disk with default options.
    pub fn new(library_dir: impl Into<PathBuf>, now_playing: NowPlaying) -> Self {
        Self::with_opener(library_dir, FsTrackOpener, now_playing, EngineOptions::default())
    }

    pub fn with_opener(
        library_dir: impl Into<PathBuf>,
        opener: impl TrackOpener,
        now_playing: NowPlaying,
        options: EngineOptions,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                library_dir: library_dir.into(),
                opener: Arc::new(opener),
                now_playing,
                options,
            }),
        }
    }

    pub fn library_dir(&self) -> &Path {
        &self.inner.library_dir
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.inner.now_playing
    }

    /// Start a new session at the first track of a fresh pass.
    ///
    /// The returned stream is lazy and never ends on its own; it stops only when
    /// the caller drops it (client disconnect).
    pub fn open_session(&self) -> Session {
        self.open_session_for("-")
    }

    /// Same as [`open_session`](Self::open_session), with `client` (usually the
    /// listener's IP) attached to every log line the session emits.
    pub fn open_session_for(&self, client: &str) -> Session {
        Session::start(Arc::clone(&self.inner), client)
    }
}
