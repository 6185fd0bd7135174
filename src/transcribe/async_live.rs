use std::collections::VecDeque;
use std::io;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::segment::Segment;
use super::window::WindowState;
use super::LiveOptions;
use crate::audio;
use crate::engine::{RecognitionEngine, RecognizeOptions};
use crate::error::{Error, Result};
use crate::source::AsyncPcmSource;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Seed,
    Recognize,
    Fill,
    Done,
}

/// The cooperative shell: same state machine as
/// [`super::live::LiveSegments`], pulled with `next_segment().await`.
///
/// Suspension points are exactly the source reads; the engine call is
/// synchronous CPU-bound work and runs inline, blocking the runtime thread
/// for its duration. Cancellation, via the token or by dropping the
/// stream, releases the source before the sequence closes and is not an
/// error.
pub struct AsyncLiveSegments<'e, S: AsyncPcmSource, E: RecognitionEngine> {
    source: S,
    engine: &'e mut E,
    state: WindowState,
    recognize: RecognizeOptions,
    read_bytes: usize,
    pending: VecDeque<Segment>,
    phase: Phase,
    pass_terminal: bool,
    pass_confirmed: f64,
    cancel: CancellationToken,
    released: bool,
}

impl<'e, S: AsyncPcmSource, E: RecognitionEngine> AsyncLiveSegments<'e, S, E> {
    pub(crate) fn new(source: S, engine: &'e mut E, options: &LiveOptions) -> Self {
        Self {
            source,
            engine,
            state: WindowState::new(options),
            recognize: options.recognize.clone(),
            read_bytes: audio::seconds_to_bytes(options.interval_secs),
            pending: VecDeque::new(),
            phase: Phase::Seed,
            pass_terminal: false,
            pass_confirmed: 0.0,
            cancel: CancellationToken::new(),
            released: false,
        }
    }

    /// Cancelling this token stops the stream at its next read. The
    /// already-classified remainder of the current pass is discarded.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Pull the next classified segment. `None` means the invocation is
    /// over (drained, cancelled, or already failed) and the source has
    /// been released.
    pub async fn next_segment(&mut self) -> Option<Result<Segment>> {
        loop {
            if let Some(segment) = self.pending.pop_front() {
                return Some(Ok(segment));
            }
            match self.phase {
                Phase::Done => return None,

                Phase::Seed => {
                    let chunk = match self.read_chunk().await {
                        Some(Ok(chunk)) => chunk,
                        Some(Err(e)) => return self.fail(e.into()),
                        None => return self.cancelled(),
                    };
                    self.state.absorb_chunk(&chunk);
                    if self.state.is_empty() {
                        self.finish();
                        return None;
                    }
                    self.phase = Phase::Recognize;
                }

                Phase::Recognize => {
                    self.pass_terminal = self.state.end_of_source();
                    let spans = match self.engine.recognize(self.state.window(), &self.recognize)
                    {
                        Ok(spans) => spans,
                        Err(e) => return self.fail(Error::Recognition(e)),
                    };
                    let pass = self.state.classify_pass(spans);
                    self.pass_confirmed = pass.confirmed_end;
                    self.pending.extend(pass.segments);
                    self.phase = Phase::Fill;
                }

                Phase::Fill => {
                    let chunk = match self.read_chunk().await {
                        Some(Ok(chunk)) => chunk,
                        Some(Err(e)) => return self.fail(e.into()),
                        None => return self.cancelled(),
                    };
                    let starved = chunk.is_empty();
                    self.state.absorb_chunk(&chunk);
                    if self.state.is_empty() {
                        self.finish();
                        return None;
                    }
                    if starved && self.pass_terminal && self.pass_confirmed == 0.0 {
                        debug!("terminal pass confirmed nothing, draining");
                        self.finish();
                        return None;
                    }
                    self.phase = Phase::Recognize;
                }
            }
        }
    }

    /// Read the next chunk, or `None` if cancellation won the race.
    async fn read_chunk(&mut self) -> Option<io::Result<Vec<u8>>> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = self.source.read(self.read_bytes) => Some(result),
        }
    }

    fn cancelled(&mut self) -> Option<Result<Segment>> {
        debug!("transcription cancelled");
        self.finish();
        None
    }

    fn release(&mut self) {
        if !self.released {
            self.source.terminate();
            self.released = true;
        }
    }

    fn finish(&mut self) {
        self.release();
        self.phase = Phase::Done;
    }

    fn fail(&mut self, err: Error) -> Option<Result<Segment>> {
        self.finish();
        Some(Err(err))
    }
}

impl<S: AsyncPcmSource, E: RecognitionEngine> Drop for AsyncLiveSegments<'_, S, E> {
    fn drop(&mut self) {
        self.release();
    }
}
