use std::collections::VecDeque;

use tracing::debug;

use super::segment::Segment;
use super::window::WindowState;
use super::LiveOptions;
use crate::audio;
use crate::engine::{RecognitionEngine, RecognizeOptions};
use crate::error::{Error, Result};
use crate::source::PcmSource;

/// Where the loop resumes on the next pull.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// First read of the invocation seeds the buffer.
    Seed,
    /// Run the engine over the buffer, classify, trim.
    Recognize,
    /// Read the next chunk and fold it into the buffer.
    Fill,
    Done,
}

/// The blocking shell: a pull-driven iterator over classified segments.
///
/// One instance is one transcription invocation. The caller's thread drives
/// the loop; each `next()` either hands out a segment already classified in
/// the current pass or advances the state machine (read, recognize, trim)
/// far enough to produce one. Dropping the iterator early is cancellation:
/// the source is released and nothing further is emitted.
pub struct LiveSegments<'e, S: PcmSource, E: RecognitionEngine> {
    source: S,
    engine: &'e mut E,
    state: WindowState,
    recognize: RecognizeOptions,
    read_bytes: usize,
    pending: VecDeque<Segment>,
    phase: Phase,
    /// end_of_source as of the most recent pass, with what it confirmed.
    pass_terminal: bool,
    pass_confirmed: f64,
    released: bool,
}

impl<'e, S: PcmSource, E: RecognitionEngine> LiveSegments<'e, S, E> {
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
            released: false,
        }
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

impl<S: PcmSource, E: RecognitionEngine> Iterator for LiveSegments<'_, S, E> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(segment) = self.pending.pop_front() {
                return Some(Ok(segment));
            }
            match self.phase {
                Phase::Done => return None,

                Phase::Seed => {
                    let chunk = match self.source.read(self.read_bytes) {
                        Ok(chunk) => chunk,
                        Err(e) => return self.fail(e.into()),
                    };
                    self.state.absorb_chunk(&chunk);
                    if self.state.is_empty() {
                        // Nothing to transcribe at all.
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
                    let chunk = match self.source.read(self.read_bytes) {
                        Ok(chunk) => chunk,
                        Err(e) => return self.fail(e.into()),
                    };
                    let starved = chunk.is_empty();
                    self.state.absorb_chunk(&chunk);
                    if self.state.is_empty() {
                        self.finish();
                        return None;
                    }
                    // The source is exhausted and the terminal pass confirmed
                    // nothing: the engine has said all it will ever say about
                    // the remaining audio.
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
}

impl<S: PcmSource, E: RecognitionEngine> Drop for LiveSegments<'_, S, E> {
    fn drop(&mut self) {
        self.release();
    }
}
