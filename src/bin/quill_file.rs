use anyhow::{bail, Context};
use quill::{
    AsyncLiveTranscriber, AsyncReaderSource, EnergySegmenter, FfmpegOptions, LiveOptions,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Transcribe a media file through the cooperative shell and print one JSON
/// line per segment. `.wav` files that are already 16 kHz mono s16 are fed
/// directly; everything else goes through ffmpeg.
///
/// Uses the bundled energy-gate engine, so the "text" is speech markers;
/// swap in a real `RecognitionEngine` for actual words.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args()
        .nth(1)
        .context("usage: quill_file <media-file>")?;

    let mut transcriber = AsyncLiveTranscriber::with_options(
        EnergySegmenter::default(),
        LiveOptions::default(),
    );

    if path.ends_with(".wav") {
        let pcm = read_wav_pcm(&path)?;
        let source = AsyncReaderSource::new(std::io::Cursor::new(pcm));
        let mut segments = transcriber.transcribe(source);
        while let Some(segment) = segments.next_segment().await {
            println!("{}", serde_json::to_string(&segment?)?);
        }
    } else {
        let mut segments = transcriber.transcribe_path(&path, &FfmpegOptions::default())?;
        while let Some(segment) = segments.next_segment().await {
            println!("{}", serde_json::to_string(&segment?)?);
        }
    }
    Ok(())
}

fn read_wav_pcm(path: &str) -> anyhow::Result<Vec<u8>> {
    let mut reader = hound::WavReader::open(path).context("open wav")?;
    let spec = reader.spec();
    if spec.sample_rate != quill::audio::SAMPLE_RATE
        || spec.channels != 1
        || spec.bits_per_sample != 16
    {
        bail!(
            "expected 16 kHz mono s16 wav, got {} Hz / {} ch / {} bit (use a non-wav \
             extension to route through ffmpeg)",
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        );
    }
    let mut pcm = Vec::new();
    for sample in reader.samples::<i16>() {
        pcm.extend_from_slice(&sample?.to_le_bytes());
    }
    Ok(pcm)
}
