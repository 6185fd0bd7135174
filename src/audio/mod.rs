pub mod buffer;

pub use buffer::SampleBuffer;

/// Everything downstream of the decoder runs at 16 kHz mono s16le.
pub const SAMPLE_RATE: u32 = 16_000;
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert a run of signed 16-bit little-endian mono PCM into normalized
/// f32 samples in [-1.0, 1.0].
///
/// Conforming sources hand over whole-sample-aligned runs; a dangling odd
/// byte (a stream truncated mid-sample) is ignored rather than guessed at.
pub fn pcm_to_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect()
}

pub fn seconds_to_samples(secs: f64) -> usize {
    (secs * SAMPLE_RATE as f64).floor() as usize
}

pub fn seconds_to_bytes(secs: f64) -> usize {
    seconds_to_samples(secs) * BYTES_PER_SAMPLE
}

pub fn samples_to_seconds(samples: usize) -> f64 {
    samples as f64 / SAMPLE_RATE as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_conversion_maps_extremes() {
        // 0, i16::MAX, i16::MIN in little-endian order
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x00, 0x80];
        let samples = pcm_to_samples(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn pcm_conversion_drops_dangling_byte() {
        let samples = pcm_to_samples(&[0x00, 0x00, 0x12]);
        assert_eq!(samples.len(), 1, "odd trailing byte must not produce a sample");
    }

    #[test]
    fn unit_conversions_floor() {
        assert_eq!(seconds_to_samples(5.0), 80_000);
        assert_eq!(seconds_to_bytes(5.0), 160_000);
        // 0.99999 s floors to 15999 samples, not 16000
        assert_eq!(seconds_to_samples(0.99999), 15_999);
        assert_eq!(samples_to_seconds(16_000), 1.0);
        // negative trim points clamp to zero samples
        assert_eq!(seconds_to_samples(-1.0), 0);
    }
}
