use std::io;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use rubato::{FftFixedIn, Resampler};
use tracing::{debug, error, info};

use super::PcmSource;
use crate::audio::SAMPLE_RATE;
use crate::error::{Error, Result};

/// Live microphone source for the blocking shell.
///
/// The cpal callback downmixes to mono and pushes device-rate samples into
/// an SPSC ring; `read` drains the ring on the caller's thread, resampling
/// to 16 kHz when the device won't run there natively. A microphone never
/// reaches end of stream: reads block (briefly sleeping while starved)
/// until `terminate` drops the capture stream, after which whatever is left
/// drains and reads turn empty.
pub struct MicSource {
    stream: Option<cpal::Stream>,
    consumer: HeapCons<f32>,
    resampler: Option<FftFixedIn<f32>>,
    resample_in: Vec<f32>,
    chunk_in: usize,
    pending: Vec<u8>,
}

const RING_SECONDS: usize = 30;
const RESAMPLER_CHUNK: usize = 1024;

impl MicSource {
    /// Capture from the default input device.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Device("no input device available".to_string()))?;
        info!("input device: {}", device.name().unwrap_or_default());

        // Prefer running the device at 16 kHz so no resampling is needed.
        let target_rates = [SAMPLE_RATE, 48_000, 44_100, 32_000];
        let mut selected = None;
        for &rate in &target_rates {
            let configs = device
                .supported_input_configs()
                .map_err(|e| Error::Device(e.to_string()))?;
            for range in configs {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some(range.with_sample_rate(cpal::SampleRate(rate)));
                    break;
                }
            }
            if selected.is_some() {
                break;
            }
        }
        let config = match selected {
            Some(c) => c,
            None => device
                .default_input_config()
                .map_err(|e| Error::Device(e.to_string()))?,
        };
        let device_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!("capture config: {} Hz, {} ch", device_rate, channels);

        let ring = HeapRb::<f32>::new(device_rate as usize * RING_SECONDS);
        let (mut producer, consumer) = ring.split();

        let err_fn = |err| error!("capture stream error: {}", err);
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &_| push_mono(data, channels, &mut producer),
                    err_fn,
                    None,
                )
                .map_err(|e| Error::Device(e.to_string()))?,
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &_| {
                        let floats: Vec<f32> =
                            data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                        push_mono(&floats, channels, &mut producer)
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| Error::Device(e.to_string()))?,
            other => {
                return Err(Error::Device(format!("unsupported sample format {other:?}")))
            }
        };
        stream.play().map_err(|e| Error::Device(e.to_string()))?;

        let resampler = if device_rate != SAMPLE_RATE {
            Some(
                FftFixedIn::<f32>::new(
                    device_rate as usize,
                    SAMPLE_RATE as usize,
                    RESAMPLER_CHUNK,
                    1,
                    1,
                )
                .map_err(|e| Error::Device(format!("resampler: {e}")))?,
            )
        } else {
            None
        };

        Ok(Self {
            stream: Some(stream),
            consumer,
            resampler,
            resample_in: Vec::with_capacity(RESAMPLER_CHUNK),
            chunk_in: RESAMPLER_CHUNK,
            pending: Vec::new(),
        })
    }

    fn ingest(&mut self, samples: &[f32]) {
        match self.resampler.as_mut() {
            None => extend_pcm(&mut self.pending, samples),
            Some(resampler) => {
                let mut src = samples;
                while !src.is_empty() {
                    let space = self.chunk_in - self.resample_in.len();
                    let take = space.min(src.len());
                    self.resample_in.extend_from_slice(&src[..take]);
                    src = &src[take..];

                    if self.resample_in.len() == self.chunk_in {
                        match resampler.process(&[&self.resample_in[..]], None) {
                            Ok(out) => extend_pcm(&mut self.pending, &out[0]),
                            Err(e) => debug!("resampler error: {}", e),
                        }
                        self.resample_in.clear();
                    }
                }
            }
        }
    }
}

fn push_mono(data: &[f32], channels: usize, producer: &mut impl Producer<Item = f32>) {
    if channels <= 1 {
        // Ring full means the consumer stalled; dropping input is the only
        // option for a live source.
        producer.push_slice(data);
        return;
    }
    for frame in data.chunks(channels) {
        let mono = frame.iter().sum::<f32>() / channels as f32;
        let _ = producer.try_push(mono);
    }
}

fn extend_pcm(pending: &mut Vec<u8>, samples: &[f32]) {
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        pending.extend_from_slice(&v.to_le_bytes());
    }
}

impl PcmSource for MicSource {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut scratch = vec![0f32; self.chunk_in];
        while self.pending.len() < n {
            let got = self.consumer.pop_slice(&mut scratch);
            if got > 0 {
                let taken: Vec<f32> = scratch[..got].to_vec();
                self.ingest(&taken);
                continue;
            }
            if self.stream.is_none() {
                // Terminated and drained: the remainder is all there is.
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let take = n.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    fn terminate(&mut self) {
        if self.stream.take().is_some() {
            debug!("capture stream closed");
        }
    }
}
