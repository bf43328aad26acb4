use std::io;
use std::pin::Pin;

use futures::future::BoxFuture;
use tokio::io::AsyncRead;

use crate::playlist::AudioTrack;

/// Byte source for one track, read sequentially from the start.
pub type TrackReader = Pin<Box<dyn AsyncRead + Send>>;

/// Opens track contents for a session.
///
/// Sessions call `open` once per track per pass. Any error here, or any read
/// error from the returned reader, makes the session skip to the next track.
pub trait TrackOpener: Send + Sync + 'static {
    fn open(&self, track: &AudioTrack) -> BoxFuture<'static, io::Result<TrackReader>>;
}

/// Reads tracks straight from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTrackOpener;

impl TrackOpener for FsTrackOpener {
    fn open(&self, track: &AudioTrack) -> BoxFuture<'static, io::Result<TrackReader>> {
        let path = track.path.clone();
        Box::pin(async move {
            let file = tokio::fs::File::open(&path).await?;
            Ok::<_, io::Error>(Box::pin(file) as TrackReader)
        })
    }
}
