//! singtalk command-line front end.
//!
//! Usage:
//!   singtalk score.json                       # print the engine command
//!   singtalk score.json --command out.txt     # write it to a file
//!   singtalk score.json --wav out.wav         # render through the engine
//!
//! The score is the JSON form of `singtalk::Score`; `--config` points at a
//! `SynthConfig` JSON file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use singtalk::{SayEngine, Score, Singer, SynthConfig, Voice};

#[derive(Debug, Parser)]
#[command(name = "singtalk", about = "Compile a sung score into DECtalk phoneme commands")]
struct Args {
    /// Score JSON file.
    score: PathBuf,

    /// Configuration JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the dictionary path from the config.
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Voice by display name, e.g. "Beautiful Betty".
    #[arg(long)]
    voice: Option<String>,

    /// Write the command text here instead of stdout.
    #[arg(long)]
    command: Option<PathBuf>,

    /// Render through the engine and write a WAV file.
    #[arg(long)]
    wav: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SynthConfig::from_file(path)?,
        None => SynthConfig::default(),
    };
    if let Some(path) = args.dictionary {
        config.dictionary_path = path;
    }
    if let Some(name) = &args.voice {
        config.voice = Voice::from_name(name)
            .with_context(|| format!("Unknown voice '{}'", name))?;
    }

    let json = std::fs::read_to_string(&args.score)
        .with_context(|| format!("Cannot read score: {}", args.score.display()))?;
    let score = Score::from_json(&json).context("Failed to parse score")?;

    let engine = SayEngine::from_config(&config.engine);
    let singer = Singer::new(config);

    if let Some(output) = &args.wav {
        return singer.sing_to_file(&score, &engine, output);
    }

    let composition = singer.compose(&score);
    for warning in &composition.warnings {
        eprintln!("[singtalk] warning: {warning}");
    }

    match &args.command {
        Some(path) => {
            std::fs::write(path, &composition.command)
                .with_context(|| format!("Cannot write command: {}", path.display()))?;
            println!(
                "Wrote {} phonemes to {}",
                composition.phonemes.len(),
                path.display()
            );
        }
        None => println!("{}", composition.command),
    }
    Ok(())
}
