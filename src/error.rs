/// Failure taxonomy for one transcription invocation.
///
/// End of source is not represented here: an empty read is normal stream
/// exhaustion and is handled by the window controller. Every variant below
/// is terminal for the invocation; the source is released before the
/// error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A PCM source read failed (pipe closed mid-read, I/O error).
    #[error("audio source read failed: {0}")]
    Source(#[from] std::io::Error),

    /// The external decoding process could not be started or died in a way
    /// that is not a plain read error.
    #[error("decoder: {0}")]
    Decoder(String),

    /// The recognition engine reported a failure for a window. Not retried:
    /// re-running a pass against a stale window would desynchronize the
    /// buffer trim point.
    #[error("recognition failed: {0:#}")]
    Recognition(anyhow::Error),

    /// Audio capture device could not be acquired or configured.
    #[error("audio device: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, Error>;
