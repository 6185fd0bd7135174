use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::debug;

use super::ffmpeg::{decode_args, FfmpegOptions};
use super::{read_full_async, AsyncPcmSource};
use crate::error::{Error, Result};

/// [`super::FfmpegDecoder`] for the cooperative shell: the child runs under
/// tokio with `kill_on_drop`, and the feeder is a spawned task instead of a
/// thread.
pub struct AsyncFfmpegDecoder {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    feeder: Option<JoinHandle<()>>,
}

impl AsyncFfmpegDecoder {
    pub fn open(path: impl AsRef<Path>, options: &FfmpegOptions) -> Result<Self> {
        let input = path.as_ref().to_string_lossy().into_owned();
        let child = Command::from(decode_args(&options.binary, &input))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Decoder(format!("failed to spawn {}: {}", options.binary, e)))?;
        debug!(input, "ffmpeg decoder started");
        Ok(Self::wrap(child, None))
    }

    pub fn from_reader<R>(reader: R, options: &FfmpegOptions) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut child = Command::from(decode_args(&options.binary, "pipe:0"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Decoder(format!("failed to spawn {}: {}", options.binary, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Decoder("decoder stdin unavailable".to_string()))?;
        let feeder = tokio::spawn(async move {
            let mut reader = reader;
            if let Err(e) = tokio::io::copy(&mut reader, &mut stdin).await {
                debug!("feeder stopped: {}", e);
            }
            // stdin drops here, closing the pipe so ffmpeg flushes its tail.
        });
        debug!("ffmpeg decoder started on piped input");
        Ok(Self::wrap(child, Some(feeder)))
    }

    fn wrap(mut child: Child, feeder: Option<JoinHandle<()>>) -> Self {
        let stdout = child.stdout.take();
        Self {
            child: Some(child),
            stdout,
            feeder,
        }
    }
}

#[async_trait]
impl AsyncPcmSource for AsyncFfmpegDecoder {
    async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        match self.stdout.as_mut() {
            Some(stdout) => read_full_async(stdout, n).await,
            None => Ok(Vec::new()),
        }
    }

    fn terminate(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        if let Some(mut child) = self.child.take() {
            // start_kill is non-blocking; the runtime reaps the child.
            let _ = child.start_kill();
            debug!("ffmpeg decoder terminated");
        }
        self.stdout = None;
    }
}

impl Drop for AsyncFfmpegDecoder {
    fn drop(&mut self) {
        self.terminate();
    }
}
