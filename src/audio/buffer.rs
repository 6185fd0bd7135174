use super::samples_to_seconds;

/// The sliding window of normalized audio owned by one transcription
/// invocation.
///
/// Grows by appending freshly decoded chunks at the back; shrinks only from
/// the front, and only up to the end of the furthest confirmed segment.
/// Samples past the trim point are retained so the next recognition pass can
/// revise words that straddled the previous chunk boundary.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Drop the first `count` samples. Trimming past the end empties the
    /// buffer instead of panicking.
    pub fn trim_start(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.samples.drain(..count.min(self.samples.len()));
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        samples_to_seconds(self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_trim_keeps_tail() {
        let mut buf = SampleBuffer::new();
        buf.append(&[0.1, 0.2, 0.3, 0.4]);
        buf.trim_start(2);
        assert_eq!(buf.as_slice(), &[0.3, 0.4]);
        buf.append(&[0.5]);
        assert_eq!(buf.as_slice(), &[0.3, 0.4, 0.5]);
    }

    #[test]
    fn trim_past_end_empties() {
        let mut buf = SampleBuffer::new();
        buf.append(&[0.0; 10]);
        buf.trim_start(100);
        assert!(buf.is_empty());
    }

    #[test]
    fn duration_tracks_sample_count() {
        let mut buf = SampleBuffer::new();
        buf.append(&vec![0.0; 16_000]);
        assert_eq!(buf.duration_secs(), 1.0);
        buf.trim_start(8_000);
        assert_eq!(buf.duration_secs(), 0.5);
    }
}
