//! Live streaming speech transcription.
//!
//! Feeds a growing window of decoded audio through a pluggable recognition
//! engine and emits classified segments incrementally: partial while the
//! trailing audio might still revise them, final once they are safely
//! behind the chunk margin or the source has ended. One blocking shell and
//! one tokio shell drive the same window state machine.

pub mod audio;
pub mod engine;
pub mod error;
pub mod source;
pub mod transcribe;

pub use engine::{EnergySegmenter, RecognitionEngine, RecognizeOptions, Span, Word};
pub use error::{Error, Result};
pub use source::{
    AsyncFfmpegDecoder, AsyncPcmSource, AsyncReaderSource, FfmpegDecoder, FfmpegOptions,
    MicSource, PcmSource, ReaderSource,
};
pub use transcribe::{
    AsyncLiveSegments, AsyncLiveTranscriber, LiveOptions, LiveSegments, LiveTranscriber, Segment,
};
