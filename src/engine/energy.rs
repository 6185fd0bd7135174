use tracing::debug;

use super::{RecognitionEngine, RecognizeOptions, Span};
use crate::audio::SAMPLE_RATE;

/// Energy-based reference engine.
///
/// Gates 20 ms frames on RMS energy with attack/release debouncing and emits
/// one span per detected speech region, with placeholder text. It recognizes
/// nothing; it exists so the streaming pipeline can be wired, demoed, and
/// exercised end-to-end without a model. Real deployments implement
/// [`RecognitionEngine`] over an actual speech-to-text backend.
#[derive(Debug, Clone)]
pub struct EnergySegmenter {
    /// RMS level above which a frame counts as speech.
    pub threshold_rms: f32,
    /// Consecutive speech frames required to open a region (debounce pops).
    pub attack_frames: usize,
    /// Consecutive silent frames required to close a region.
    pub release_frames: usize,
}

const FRAME_MS: usize = 20;

impl Default for EnergySegmenter {
    fn default() -> Self {
        Self {
            threshold_rms: 0.015,
            attack_frames: 6,    // 120 ms
            release_frames: 15,  // 300 ms
        }
    }
}

fn rms(frame: &[f32]) -> f32 {
    let sq_sum: f32 = frame.iter().map(|&x| x * x).sum();
    (sq_sum / frame.len() as f32).sqrt()
}

impl RecognitionEngine for EnergySegmenter {
    fn recognize(
        &mut self,
        window: &[f32],
        _options: &RecognizeOptions,
    ) -> anyhow::Result<Vec<Span>> {
        let frame_len = SAMPLE_RATE as usize * FRAME_MS / 1000;
        let frame_secs = FRAME_MS as f64 / 1000.0;

        let mut spans = Vec::new();
        let mut region_start: Option<f64> = None;
        let mut run_speech = 0usize;
        let mut run_silence = 0usize;

        // The gate is rebuilt from scratch for every window: the controller
        // re-submits unconfirmed audio and expects fresh, stateless timings.
        for (i, frame) in window.chunks(frame_len).enumerate() {
            let frame_start = i as f64 * frame_secs;
            if rms(frame) > self.threshold_rms {
                run_speech += 1;
                run_silence = 0;
                if region_start.is_none() && run_speech >= self.attack_frames {
                    // Date the region back to the first frame of the run.
                    region_start =
                        Some(frame_start - (run_speech - 1) as f64 * frame_secs);
                }
            } else {
                run_silence += 1;
                run_speech = 0;
                if let Some(start) = region_start {
                    if run_silence >= self.release_frames {
                        let end = frame_start - (run_silence - 1) as f64 * frame_secs;
                        spans.push(self.span(spans.len(), start, end));
                        region_start = None;
                    }
                }
            }
        }

        // A region still open at the edge of the window ends with it.
        if let Some(start) = region_start {
            let end = window.len() as f64 / SAMPLE_RATE as f64;
            spans.push(self.span(spans.len(), start, end));
        }

        debug!(
            window_secs = window.len() as f64 / SAMPLE_RATE as f64,
            spans = spans.len(),
            "energy gate pass"
        );
        Ok(spans)
    }
}

impl EnergySegmenter {
    fn span(&self, id: usize, start: f64, end: f64) -> Span {
        Span::timed(id, start, end, format!("[speech {:.2}s]", end - start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RecognizeOptions {
        RecognizeOptions::default()
    }

    #[test]
    fn silence_yields_no_spans() {
        let mut engine = EnergySegmenter::default();
        let window = vec![0.001; SAMPLE_RATE as usize];
        assert!(engine.recognize(&window, &opts()).unwrap().is_empty());
    }

    #[test]
    fn burst_between_silences_yields_one_timed_span() {
        let mut engine = EnergySegmenter::default();
        // 1 s silence, 1 s tone, 1 s silence
        let mut window = vec![0.0; SAMPLE_RATE as usize];
        window.extend(vec![0.1; SAMPLE_RATE as usize]);
        window.extend(vec![0.0; SAMPLE_RATE as usize]);

        let spans = engine.recognize(&window, &opts()).unwrap();
        assert_eq!(spans.len(), 1, "one speech region expected");
        assert!((spans[0].start - 1.0).abs() < 0.05, "start near 1.0s: {}", spans[0].start);
        assert!((spans[0].end - 2.0).abs() < 0.05, "end near 2.0s: {}", spans[0].end);
    }

    #[test]
    fn region_open_at_window_edge_ends_with_window() {
        let mut engine = EnergySegmenter::default();
        let mut window = vec![0.0; SAMPLE_RATE as usize];
        window.extend(vec![0.1; SAMPLE_RATE as usize / 2]);

        let spans = engine.recognize(&window, &opts()).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].end, 1.5, "open region must close at the window edge");
    }

    #[test]
    fn short_pop_is_debounced() {
        let mut engine = EnergySegmenter::default();
        let mut window = vec![0.0; SAMPLE_RATE as usize];
        // 40 ms pop, below the 120 ms attack
        window.extend(vec![0.5; SAMPLE_RATE as usize * 40 / 1000]);
        window.extend(vec![0.0; SAMPLE_RATE as usize]);

        assert!(engine.recognize(&window, &opts()).unwrap().is_empty());
    }
}
