pub mod ffmpeg;
pub mod ffmpeg_async;
pub mod mic;
pub mod reader;

use std::io;

use async_trait::async_trait;

pub use ffmpeg::{FfmpegDecoder, FfmpegOptions};
pub use ffmpeg_async::AsyncFfmpegDecoder;
pub use mic::MicSource;
pub use reader::{AsyncReaderSource, ReaderSource};

/// A blocking supplier of raw 16 kHz mono s16le PCM.
///
/// `read(n)` returns up to `n` bytes, fewer only at end of stream, and an
/// empty buffer once the stream is exhausted; exhaustion is not an error.
/// `terminate` releases whatever sits behind the source (decoder process,
/// capture stream); it is idempotent and must not block forever.
pub trait PcmSource {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>>;
    fn terminate(&mut self);
}

/// [`PcmSource`] for the cooperative shell: same contract, with the read
/// as the suspension point.
#[async_trait]
pub trait AsyncPcmSource: Send {
    async fn read(&mut self, n: usize) -> io::Result<Vec<u8>>;
    fn terminate(&mut self);
}

/// Read from `r` until `n` bytes are filled or the stream ends.
pub(crate) fn read_full(r: &mut impl io::Read, n: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(k) => filled += k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

pub(crate) async fn read_full_async(
    r: &mut (impl tokio::io::AsyncRead + Unpin),
    n: usize,
) -> io::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;

    let mut buf = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        match r.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(k) => filled += k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
