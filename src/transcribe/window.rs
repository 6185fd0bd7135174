use tracing::debug;

use super::segment::Segment;
use super::LiveOptions;
use crate::audio::{self, SampleBuffer};
use crate::engine::Span;

/// The sliding-window state machine.
///
/// Owns the audio buffer and the end-of-source flag, and exposes two pure
/// steps: [`WindowState::absorb_chunk`] (append freshly read bytes, latch
/// end of source) and [`WindowState::classify_pass`] (classify one pass of
/// engine spans and trim confirmed audio off the front). All I/O and engine
/// invocation live in the shells; this type never blocks.
#[derive(Debug)]
pub(crate) struct WindowState {
    buffer: SampleBuffer,
    end_of_source: bool,
    ignore_end_of_source: bool,
    chunk_margin_secs: f64,
}

/// What one recognition pass produced.
pub(crate) struct PassResult {
    pub segments: Vec<Segment>,
    /// End time of the furthest span confirmed final in this pass, i.e. how
    /// many seconds were trimmed off the front of the buffer. Zero when the
    /// pass confirmed nothing.
    pub confirmed_end: f64,
}

impl WindowState {
    pub fn new(options: &LiveOptions) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            end_of_source: false,
            ignore_end_of_source: options.ignore_end_of_source,
            chunk_margin_secs: options.chunk_margin_secs,
        }
    }

    /// The window handed to the engine: the entire current buffer.
    pub fn window(&self) -> &[f32] {
        self.buffer.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn end_of_source(&self) -> bool {
        self.end_of_source
    }

    /// Append a freshly read chunk. An empty chunk latches `end_of_source`
    /// unless the caller asked to ignore it, in which case the flag never
    /// sets and the margin rule keeps applying on whatever arrives later.
    pub fn absorb_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            if !self.ignore_end_of_source && !self.end_of_source {
                self.end_of_source = true;
                debug!("end of source reached");
            }
            return;
        }
        self.buffer.append(&audio::pcm_to_samples(chunk));
    }

    /// Classify every span of one pass, in order, then trim the buffer.
    ///
    /// A span is partial when its end sits inside the margin at the edge of
    /// the window (strict comparison) and more audio can still arrive. Every
    /// span is evaluated independently (a partial does not short-circuit
    /// the rest of the pass) and each final moves the trim point to its own
    /// end, so the last final of the pass wins. Trimming discards exactly
    /// the confirmed region: unconfirmed audio stays buffered and is
    /// re-recognized next pass together with newer samples.
    pub fn classify_pass(&mut self, spans: Vec<Span>) -> PassResult {
        let window_secs = self.buffer.duration_secs();
        let mut confirmed_end = 0.0f64;
        let mut segments = Vec::with_capacity(spans.len());

        for span in spans {
            let partial = span.end > window_secs - self.chunk_margin_secs && !self.end_of_source;
            if !partial {
                confirmed_end = span.end;
            }
            segments.push(Segment::classified(span, partial));
        }

        self.buffer.trim_start(audio::seconds_to_samples(confirmed_end));
        debug!(
            window_secs,
            segments = segments.len(),
            confirmed_end,
            end_of_source = self.end_of_source,
            "pass classified"
        );
        PassResult {
            segments,
            confirmed_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;
    use crate::engine::Span;

    fn state(margin: f64, ignore_eos: bool) -> WindowState {
        WindowState::new(&LiveOptions {
            chunk_margin_secs: margin,
            ignore_end_of_source: ignore_eos,
            ..LiveOptions::default()
        })
    }

    fn pcm_secs(secs: f64) -> Vec<u8> {
        vec![0u8; (secs * SAMPLE_RATE as f64) as usize * 2]
    }

    #[test]
    fn margin_rule_splits_partial_and_final() {
        // The 5s window, margin 2 example: "hello" ends at 1.2 (≤ 3, final),
        // "world" ends at 4.9 (> 3, partial).
        let mut state = state(2.0, false);
        state.absorb_chunk(&pcm_secs(5.0));

        let pass = state.classify_pass(vec![
            Span::timed(0, 0.0, 1.2, "hello"),
            Span::timed(1, 1.2, 4.9, "world"),
        ]);

        assert!(!pass.segments[0].partial, "hello is safely inside the window");
        assert!(pass.segments[1].partial, "world ends inside the margin");
        assert_eq!(pass.confirmed_end, 1.2);
        // 5.0s minus the confirmed 1.2s stays buffered for the next pass.
        assert_eq!(state.window().len(), 80_000 - 19_200);
    }

    #[test]
    fn margin_comparison_is_strict() {
        // margin 0: a span ending exactly at the window edge is final.
        let mut state = state(0.0, false);
        state.absorb_chunk(&pcm_secs(5.0));

        let pass = state.classify_pass(vec![Span::timed(0, 0.0, 5.0, "edge")]);
        assert!(!pass.segments[0].partial, "end == window duration must be final");
        assert!(state.is_empty(), "confirming the whole window drains the buffer");
    }

    #[test]
    fn end_of_source_forces_finals() {
        let mut state = state(2.0, false);
        state.absorb_chunk(&pcm_secs(5.0));
        state.absorb_chunk(&[]);
        assert!(state.end_of_source());

        let pass = state.classify_pass(vec![Span::timed(0, 0.0, 4.9, "tail")]);
        assert!(!pass.segments[0].partial, "no more audio can revise the span");
        assert_eq!(pass.confirmed_end, 4.9);
    }

    #[test]
    fn ignore_end_of_source_never_latches() {
        let mut state = state(2.0, true);
        state.absorb_chunk(&pcm_secs(5.0));
        state.absorb_chunk(&[]);
        assert!(!state.end_of_source());

        let pass = state.classify_pass(vec![Span::timed(0, 0.0, 4.9, "tail")]);
        assert!(pass.segments[0].partial, "margin rule still applies");
        assert_eq!(pass.confirmed_end, 0.0);
    }

    #[test]
    fn every_span_is_classified_not_short_circuited() {
        // A span after a partial one is still evaluated on its own merits.
        let mut state = state(2.0, false);
        state.absorb_chunk(&pcm_secs(10.0));

        let pass = state.classify_pass(vec![
            Span::timed(0, 0.0, 9.0, "late"),
            Span::timed(1, 1.0, 2.0, "early"),
        ]);
        assert!(pass.segments[0].partial, "9.0 > 8.0");
        assert!(!pass.segments[1].partial, "2.0 ≤ 8.0 still qualifies as final");
        assert_eq!(pass.confirmed_end, 2.0);
    }

    #[test]
    fn later_final_overrides_trim_point() {
        let mut state = state(2.0, false);
        state.absorb_chunk(&pcm_secs(10.0));

        let pass = state.classify_pass(vec![
            Span::timed(0, 0.0, 1.0, "a"),
            Span::timed(1, 1.0, 3.0, "b"),
        ]);
        assert_eq!(pass.confirmed_end, 3.0, "the furthest final sets the trim");
        assert_eq!(state.window().len(), 160_000 - 48_000);
    }

    #[test]
    fn partial_audio_survives_trimming() {
        let mut state = state(2.0, false);
        state.absorb_chunk(&pcm_secs(5.0));
        let before = state.window().len();

        let pass = state.classify_pass(vec![Span::timed(0, 3.5, 4.5, "unsure")]);
        assert!(pass.segments[0].partial);
        assert_eq!(
            state.window().len(),
            before,
            "a pass with no finals must not discard any audio"
        );

        // New audio appends behind the retained region.
        state.absorb_chunk(&pcm_secs(5.0));
        assert_eq!(state.window().len(), before + 80_000);
    }
}
