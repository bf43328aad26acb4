use std::sync::Arc;

use arc_swap::ArcSwap;

/// Process-wide "now playing" label.
///
/// Every session publishes the track it just advanced into, without any
/// coordination between sessions: the last writer wins. The value is purely
/// informational and does not describe the position of any particular session.
#[derive(Clone)]
pub struct NowPlaying {
    label: Arc<ArcSwap<String>>,
}

impl NowPlaying {
    pub fn new() -> Self {
        Self {
            label: Arc::new(ArcSwap::from_pointee(String::new())),
        }
    }

    pub fn publish(&self, name: &str) {
        self.label.store(Arc::new(name.to_owned()));
    }

    /// Last published label; empty until some session starts a track.
    pub fn current(&self) -> Arc<String> {
        self.label.load_full()
    }
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::new()
    }
}
