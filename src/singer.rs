//! Generation session — score in, engine command (and optionally audio) out.
//!
//! A [`Singer`] owns its configuration and a shared, read-only
//! [`Dictionary`].  Each call to [`Singer::compose`] is independent: it
//! builds its own note list and command buffer and keeps no state between
//! requests, so one `Singer` can serve any number of threads.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

use crate::{
    allocate::{allocate, PhonemeSpan},
    config::SynthConfig,
    dictionary::Dictionary,
    engine::{RenderedAudio, Renderer},
    error::Warning,
    quantize::emit,
    score::{flatten, Score},
    spread::spread,
};

/// Result of compiling one score.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Full engine input: voice preamble followed by the phoneme clauses.
    pub command: String,
    /// The allocated phonemes, before quantisation.
    pub phonemes: Vec<PhonemeSpan>,
    /// Non-fatal problems met on the way.
    pub warnings: Vec<Warning>,
}

/// The main pipeline handle.
#[derive(Debug, Clone)]
pub struct Singer {
    config: SynthConfig,
    dictionary: Arc<Dictionary>,
}

impl Singer {
    /// Session whose dictionary is read from `config.dictionary_path` on
    /// first use.
    pub fn new(config: SynthConfig) -> Self {
        let dictionary = Arc::new(Dictionary::open(&config.dictionary_path));
        Self { config, dictionary }
    }

    /// Session sharing an already constructed dictionary.
    pub fn with_dictionary(config: SynthConfig, dictionary: Arc<Dictionary>) -> Self {
        Self { config, dictionary }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    // ── Score → command ───────────────────────────────────────────────────────

    /// Run the whole pipeline: flatten → spread → allocate → quantise.
    pub fn compose(&self, score: &Score) -> Composition {
        let mut warnings = Vec::new();
        if let Some(reason) = self.dictionary.unavailable() {
            warnings.push(Warning::DictionaryUnavailable(reason.to_string()));
        }

        let mut notes = flatten(score, &self.config.timing);
        warnings.extend(spread(&mut notes, &self.dictionary));
        let phonemes = allocate(&notes, &self.config.timing);

        let mut command = self.config.voice.preamble();
        command.push_str(&emit(&phonemes, &self.config.quantizer));

        Composition { command, phonemes, warnings }
    }

    // ── Score → audio ─────────────────────────────────────────────────────────

    /// Compose `score` and render it with `renderer`.
    pub fn sing(&self, score: &Score, renderer: &dyn Renderer) -> Result<RenderedAudio> {
        let composition = self.compose(score);
        for warning in &composition.warnings {
            eprintln!("[singtalk] warning: {warning}");
        }
        renderer
            .render(&composition.command)
            .context("Synthesis engine failed")
    }

    /// Compose, render, and write a 16-bit PCM WAV file.
    pub fn sing_to_file(
        &self,
        score: &Score,
        renderer: &dyn Renderer,
        output_path: &Path,
    ) -> Result<()> {
        let audio = self.sing(score, renderer)?;
        audio
            .write_wav(output_path)
            .with_context(|| format!("Cannot write WAV: {}", output_path.display()))?;
        println!(
            "Saved {} samples ({:.2} s) to {}",
            audio.samples.len(),
            audio.duration_us() as f64 / 1e6,
            output_path.display()
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
