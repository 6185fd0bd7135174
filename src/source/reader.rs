use std::io;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::{read_full, read_full_async, AsyncPcmSource, PcmSource};

/// Pass-through source for input that is already 16 kHz mono s16le PCM,
/// the no-decoding path.
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: io::Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: io::Read> PcmSource for ReaderSource<R> {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        read_full(&mut self.inner, n)
    }

    fn terminate(&mut self) {}
}

/// [`ReaderSource`] over any tokio reader.
pub struct AsyncReaderSource<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin + Send> AsyncReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> AsyncPcmSource for AsyncReaderSource<R> {
    async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        read_full_async(&mut self.inner, n).await
    }

    fn terminate(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fill_then_signal_exhaustion() {
        let mut src = ReaderSource::new(io::Cursor::new(vec![1u8; 10]));
        assert_eq!(src.read(4).unwrap().len(), 4);
        assert_eq!(src.read(4).unwrap().len(), 4);
        assert_eq!(src.read(4).unwrap().len(), 2, "short read only at end of stream");
        assert!(src.read(4).unwrap().is_empty(), "exhaustion is an empty read, not an error");
        assert!(src.read(4).unwrap().is_empty(), "exhaustion is sticky");
    }
}
