use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_full, PcmSource};
use crate::audio::SAMPLE_RATE;
use crate::error::{Error, Result};

/// Where to find the decoder binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegOptions {
    pub binary: String,
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

pub(crate) fn decode_args(binary: &str, input: &str) -> Command {
    let mut cmd = Command::new(binary);
    cmd.args(["-loglevel", "quiet", "-i", input, "-f", "s16le", "-ac", "1"])
        .arg("-ar")
        .arg(SAMPLE_RATE.to_string())
        .arg("-");
    cmd
}

/// External decoding process for the blocking shell.
///
/// Spawns ffmpeg converting an arbitrary container into raw 16 kHz mono
/// s16le on stdout. For reader input, a feeder thread copies the reader into
/// the child's stdin so the controller only ever blocks on already-decoded
/// output, never on feeding. The feeder closes stdin at input EOF so ffmpeg
/// flushes the tail of the stream.
pub struct FfmpegDecoder {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    feeder: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl FfmpegDecoder {
    /// Decode a file (or anything ffmpeg accepts as an input URL) directly.
    pub fn open(path: impl AsRef<Path>, options: &FfmpegOptions) -> Result<Self> {
        let input = path.as_ref().to_string_lossy().into_owned();
        let child = decode_args(&options.binary, &input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Decoder(format!("failed to spawn {}: {}", options.binary, e)))?;
        debug!(input, "ffmpeg decoder started");
        Ok(Self::wrap(child, None, Arc::new(AtomicBool::new(false))))
    }

    /// Decode a byte stream piped through the child's stdin.
    pub fn from_reader<R>(reader: R, options: &FfmpegOptions) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let mut child = decode_args(&options.binary, "pipe:0")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Decoder(format!("failed to spawn {}: {}", options.binary, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Decoder("decoder stdin unavailable".to_string()))?;
        let stop = Arc::new(AtomicBool::new(false));
        let feeder = spawn_feeder(reader, stdin, stop.clone());
        debug!("ffmpeg decoder started on piped input");
        Ok(Self::wrap(child, Some(feeder), stop))
    }

    fn wrap(mut child: Child, feeder: Option<JoinHandle<()>>, stop: Arc<AtomicBool>) -> Self {
        let stdout = child.stdout.take();
        Self {
            child: Some(child),
            stdout,
            feeder,
            stop,
        }
    }
}

fn spawn_feeder<R>(
    mut reader: R,
    mut stdin: std::process::ChildStdin,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("feeder input error: {}", e);
                    break;
                }
            };
            // A write failure means the child went away; nothing to feed.
            if stdin.write_all(&chunk[..n]).is_err() {
                break;
            }
        }
        // Dropping stdin closes the pipe and lets ffmpeg flush its tail.
    })
}

impl PcmSource for FfmpegDecoder {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        match self.stdout.as_mut() {
            Some(stdout) => read_full(stdout, n),
            None => Ok(Vec::new()),
        }
    }

    fn terminate(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(mut child) = self.child.take() {
            // Killing first unblocks a feeder stuck writing into the pipe.
            let _ = child.kill();
            let _ = child.wait();
            debug!("ffmpeg decoder terminated");
        }
        if let Some(feeder) = self.feeder.take() {
            let _ = feeder.join();
        }
        self.stdout = None;
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        self.terminate();
    }
}
