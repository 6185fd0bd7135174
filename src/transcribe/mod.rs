pub mod async_live;
pub mod live;
pub mod segment;
mod window;

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

pub use async_live::AsyncLiveSegments;
pub use live::LiveSegments;
pub use segment::Segment;

use crate::engine::{RecognitionEngine, RecognizeOptions};
use crate::error::Result;
use crate::source::{
    AsyncFfmpegDecoder, AsyncPcmSource, FfmpegDecoder, FfmpegOptions, PcmSource,
};

/// Controls for one live transcription invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveOptions {
    /// How many seconds of fresh audio to request per read.
    pub interval_secs: f64,
    /// Spans ending within this distance of the window edge are held as
    /// partial; more context may still revise them.
    pub chunk_margin_secs: f64,
    /// Keep requesting audio forever, treating an empty read as a lull
    /// rather than the end.
    pub ignore_end_of_source: bool,
    /// Forwarded verbatim to the engine on every pass.
    pub recognize: RecognizeOptions,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            chunk_margin_secs: 2.0,
            ignore_end_of_source: false,
            recognize: RecognizeOptions::default(),
        }
    }
}

/// Entry point for the blocking shell.
///
/// Holds the engine across invocations (models are expensive to load); each
/// `transcribe*` call creates one independent invocation with its own
/// buffer and source.
pub struct LiveTranscriber<E> {
    engine: E,
    options: LiveOptions,
}

impl<E: RecognitionEngine> LiveTranscriber<E> {
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, LiveOptions::default())
    }

    pub fn with_options(engine: E, options: LiveOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &LiveOptions {
        &self.options
    }

    /// Transcribe an already-decoded PCM source.
    pub fn transcribe<S: PcmSource>(&mut self, source: S) -> LiveSegments<'_, S, E> {
        LiveSegments::new(source, &mut self.engine, &self.options)
    }

    /// Decode a media file through ffmpeg and transcribe it.
    pub fn transcribe_path(
        &mut self,
        path: impl AsRef<Path>,
        ffmpeg: &FfmpegOptions,
    ) -> Result<LiveSegments<'_, FfmpegDecoder, E>> {
        let source = FfmpegDecoder::open(path, ffmpeg)?;
        Ok(self.transcribe(source))
    }

    /// Decode an arbitrary media byte stream through ffmpeg and transcribe
    /// it.
    pub fn transcribe_reader<R>(
        &mut self,
        reader: R,
        ffmpeg: &FfmpegOptions,
    ) -> Result<LiveSegments<'_, FfmpegDecoder, E>>
    where
        R: Read + Send + 'static,
    {
        let source = FfmpegDecoder::from_reader(reader, ffmpeg)?;
        Ok(self.transcribe(source))
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}

/// [`LiveTranscriber`] for the cooperative shell.
pub struct AsyncLiveTranscriber<E> {
    engine: E,
    options: LiveOptions,
}

impl<E: RecognitionEngine> AsyncLiveTranscriber<E> {
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, LiveOptions::default())
    }

    pub fn with_options(engine: E, options: LiveOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &LiveOptions {
        &self.options
    }

    pub fn transcribe<S: AsyncPcmSource>(&mut self, source: S) -> AsyncLiveSegments<'_, S, E> {
        AsyncLiveSegments::new(source, &mut self.engine, &self.options)
    }

    pub fn transcribe_path(
        &mut self,
        path: impl AsRef<Path>,
        ffmpeg: &FfmpegOptions,
    ) -> Result<AsyncLiveSegments<'_, AsyncFfmpegDecoder, E>> {
        let source = AsyncFfmpegDecoder::open(path, ffmpeg)?;
        Ok(self.transcribe(source))
    }

    pub fn transcribe_reader<R>(
        &mut self,
        reader: R,
        ffmpeg: &FfmpegOptions,
    ) -> Result<AsyncLiveSegments<'_, AsyncFfmpegDecoder, E>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let source = AsyncFfmpegDecoder::from_reader(reader, ffmpeg)?;
        Ok(self.transcribe(source))
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}
