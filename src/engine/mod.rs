pub mod energy;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use energy::EnergySegmenter;

/// Pass-through options handed verbatim to the recognition engine on every
/// pass. The window controller never inspects these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizeOptions {
    /// Language hint (e.g. "en"). None lets the engine auto-detect.
    pub language: Option<String>,
    /// Ask the engine to run its own voice-activity filter.
    pub vad_filter: bool,
    /// Ask the engine for word-level timing.
    pub word_timestamps: bool,
    /// Engine-specific knobs with no common shape.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Word-level timing, when the engine provides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    pub word: String,
    pub probability: f32,
}

/// One recognized region of speech, as returned by the engine for a single
/// window. `start`/`end` are seconds relative to the first sample of the
/// window the engine was given. The controller passes every field through
/// untouched except for attaching the partial/final classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: usize,
    pub seek: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub tokens: Vec<i64>,
    pub temperature: f32,
    pub avg_logprob: f32,
    pub compression_ratio: f32,
    pub no_speech_prob: f32,
    pub words: Option<Vec<Word>>,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            id: 0,
            seek: 0,
            start: 0.0,
            end: 0.0,
            text: String::new(),
            tokens: Vec::new(),
            temperature: 0.0,
            avg_logprob: 0.0,
            compression_ratio: 0.0,
            no_speech_prob: 0.0,
            words: None,
        }
    }
}

impl Span {
    /// Shorthand used by engines and tests that only care about timing and
    /// text.
    pub fn timed(id: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            text: text.into(),
            ..Self::default()
        }
    }
}

/// The speech-to-text engine as the window controller sees it.
///
/// Each call is independent: the engine must not carry session state between
/// passes, because the controller deliberately re-submits unconfirmed audio
/// and relies on getting fresh timings for it. Spans must come back ordered
/// by non-decreasing `start`.
pub trait RecognitionEngine {
    fn recognize(
        &mut self,
        window: &[f32],
        options: &RecognizeOptions,
    ) -> anyhow::Result<Vec<Span>>;
}

impl<E: RecognitionEngine + ?Sized> RecognitionEngine for &mut E {
    fn recognize(
        &mut self,
        window: &[f32],
        options: &RecognizeOptions,
    ) -> anyhow::Result<Vec<Span>> {
        (**self).recognize(window, options)
    }
}
