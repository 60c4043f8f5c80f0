use std::path::PathBuf;
use std::time::Instant;

use syllable_tts::{
    CancelToken, Engines, PhraseRequest, PhraseScript, PhraseSynthesizer, PipelineConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let script_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/adon_olam.json"));
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("phrase.wav"));

    let script = PhraseScript::from_path(&script_path)?;
    println!(
        "Loaded {} syllables from {}",
        script.syllables.len(),
        script_path.display()
    );

    let synthesizer = PhraseSynthesizer::new(Engines::system()?, PipelineConfig::default())?;
    cancel_on_ctrl_c(synthesizer.interrupt_token())?;

    // Rendered into memory so a failed run leaves no output file behind.
    let mut wav = Vec::new();
    let mut request = PhraseRequest::new(script.syllables, &mut wav);
    if let Some(workers) = script.concurrency {
        request = request.with_concurrency(workers);
    }

    let start = Instant::now();
    let summary = synthesizer.synthesize(request)?;
    std::fs::write(&output_path, &wav)?;
    println!(
        "Wrote {} bytes to {} in {:.2?}",
        summary.bytes_written,
        output_path.display(),
        start.elapsed()
    );

    for syllable in &summary.syllables {
        match syllable.estimate {
            Some(estimate) => println!(
                "  #{:<2} {:>7.2} Hz  x{}",
                syllable.slot, estimate.hz, syllable.ratio
            ),
            None => println!("  #{:<2}  no pitch  x{}", syllable.slot, syllable.ratio),
        }
    }

    Ok(())
}

/// Turn Ctrl-C into a cancelled render, so the scratch directories are
/// removed on the way out instead of being left in the temp dir.
fn cancel_on_ctrl_c(token: CancelToken) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    std::thread::spawn(move || {
        runtime.block_on(async {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                eprintln!("\nInterrupted, cleaning up...");
                token.cancel();
            }
        });
    });
    Ok(())
}
