use anyhow::Context;
use quill::{EnergySegmenter, LiveOptions, LiveTranscriber, MicSource, RecognizeOptions};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Live captioning from the default microphone through the blocking shell.
/// Partial segments print with a trailing ellipsis and may be revised;
/// final lines are settled. Runs until interrupted.
fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mic = MicSource::open().context("acquire microphone")?;

    // A microphone never runs dry; shorter windows keep latency visible.
    let options = LiveOptions {
        interval_secs: 2.0,
        chunk_margin_secs: 1.0,
        ignore_end_of_source: true,
        recognize: RecognizeOptions::default(),
    };
    let mut transcriber = LiveTranscriber::with_options(EnergySegmenter::default(), options);

    println!("listening... speak into the microphone (ctrl-c to stop)");
    for segment in transcriber.transcribe(mic) {
        let segment = segment?;
        if segment.partial {
            println!("  {} …", segment.span.text);
        } else {
            println!("{}", segment.span.text);
        }
    }
    Ok(())
}
