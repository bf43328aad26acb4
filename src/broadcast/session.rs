use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio_util::io::ReaderStream;
use tracing::Instrument;
use uuid::Uuid;

use crate::broadcast::{EngineInner, TrackReader};
use crate::playlist::{list_tracks, AudioTrack};

/// One client's endless, non-restartable walk over the playlist.
///
/// Chunks are produced only when the stream is polled, so a slow client stalls
/// its own session instead of making it buffer ahead. Dropping the stream ends
/// the session.
pub struct Session {
    id: Uuid,
    chunks: BoxStream<'static, Bytes>,
}

impl Session {
    pub(crate) fn start(engine: Arc<EngineInner>, client: &str) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("session", id = %id, client = %client);
        let state = SessionState {
            engine,
            client: client.to_string(),
            queue: VecDeque::new(),
            current: None,
            passes: 0,
            pass_bytes: None,
            bytes_sent: 0,
            idle: false,
        };

        let chunks = stream::unfold(state, move |mut state| {
            async move {
                let chunk = state.next_chunk().await;
                Some((chunk, state))
            }
            .instrument(span.clone())
        })
        .boxed();

        Self { id, chunks }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Stream for Session {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        self.chunks.poll_next_unpin(cx)
    }
}

struct SessionState {
    engine: Arc<EngineInner>,
    client: String,
    /// Tracks still to play in the current pass.
    queue: VecDeque<AudioTrack>,
    current: Option<(AudioTrack, ReaderStream<TrackReader>)>,
    passes: u64,
    /// Bytes emitted during the running pass; None between passes.
    pass_bytes: Option<u64>,
    bytes_sent: u64,
    idle: bool,
}

impl SessionState {
    async fn next_chunk(&mut self) -> Bytes {
        loop {
            if let Some((track, reader)) = self.current.as_mut() {
                match reader.next().await {
                    Some(Ok(chunk)) => {
                        self.bytes_sent += chunk.len() as u64;
                        if let Some(n) = self.pass_bytes.as_mut() {
                            *n += chunk.len() as u64;
                        }
                        pause(self.engine.options.chunk_pause).await;
                        return chunk;
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Skipping {}: read failed: {}", track.path.display(), e);
                        self.current = None;
                    }
                    None => {
                        tracing::debug!("Finished {}", track.display_name);
                        self.current = None;
                    }
                }
                continue;
            }

            if let Some(track) = self.queue.pop_front() {
                self.advance_into(track).await;
                continue;
            }

            self.start_pass().await;
        }
    }

    async fn advance_into(&mut self, track: AudioTrack) {
        self.engine.now_playing.publish(&track.display_name);
        tracing::debug!("Now playing {}", track.display_name);

        match self.engine.opener.open(&track).await {
            Ok(reader) => {
                let chunks = ReaderStream::with_capacity(reader, self.engine.options.chunk_size);
                self.current = Some((track, chunks));
            }
            Err(e) => {
                // Retried on the next pass, not within this one.
                tracing::warn!("Skipping {}: open failed: {}", track.path.display(), e);
            }
        }
    }

    /// Re-list the library and queue a new pass. Sleeps instead when the
    /// library is empty, or when the previous pass produced no audio at all.
    async fn start_pass(&mut self) {
        let empty_poll = self.engine.options.empty_poll;

        if let Some(0) = self.pass_bytes.take() {
            tracing::warn!("Pass {} produced no audio, retrying in {:?}", self.passes, empty_poll);
            tokio::time::sleep(empty_poll).await;
        }

        let dir = self.engine.library_dir.clone();
        let tracks = match tokio::task::spawn_blocking(move || list_tracks(&dir)).await {
            Ok(Ok(tracks)) => tracks,
            Ok(Err(e)) => {
                tracing::warn!("{}", e);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Library scan task failed: {}", e);
                Vec::new()
            }
        };

        if tracks.is_empty() {
            if !self.idle {
                tracing::info!(
                    "No tracks in {}, polling every {:?}",
                    self.engine.library_dir.display(),
                    empty_poll
                );
                self.idle = true;
            }
            tokio::time::sleep(empty_poll).await;
            return;
        }

        self.idle = false;
        self.passes += 1;
        self.pass_bytes = Some(0);
        tracing::debug!("Starting pass {} with {} tracks", self.passes, tracks.len());
        self.queue = tracks.into();
    }
}

/// Courtesy pause between chunks. Takes the duration by value so the session
/// future never holds a shared borrow of its state across the await.
async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        tracing::info!(
            "Session for {} closed after {} bytes over {} passes",
            self.client,
            self.bytes_sent,
            self.passes
        );
    }
}
