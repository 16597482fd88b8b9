//! Session configuration — deserialised from a JSON file.
//!
//! Every field is optional; omitted fields take the engine's stock values.
//!
//! ```json
//! {
//!   "dictionary_path": "dectalk/cmudict-mod",
//!   "voice": "beautiful_betty",
//!   "timing": { "plosive_us": 25000 },
//!   "engine": { "program": "dectalk/say" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{dictionary, engine::Voice, error::ConfigError};

/// Microseconds.
pub type Micros = i64;

// ─────────────────────────────────────────────────────────────────────────────
// Timing (flattener + allocator)
// ─────────────────────────────────────────────────────────────────────────────

/// Durations used while flattening the score and splitting notes into phonemes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Longest merged rest; a little under the engine's 30 s silence limit.
    pub max_rest_us: Micros,
    /// Gaps between nominal and actual note length shorter than this are
    /// absorbed into the note instead of becoming a rest.
    pub min_downtime_us: Micros,
    /// Fixed length of every plosive.
    pub plosive_us: Micros,
    /// Cap on each sustained (non-syllabic, non-plosive) phoneme.
    pub max_sustained_us: Micros,
    /// Share of the variable time reserved for syllabics.
    pub syllabic_share: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_rest_us: 27_500_000,
            min_downtime_us: 20_000,
            plosive_us: 20_000,
            max_sustained_us: 90_000,
            syllabic_share: 0.85,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quantizer
// ─────────────────────────────────────────────────────────────────────────────

/// Limits applied while quantising phonemes to engine frames.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuantizerConfig {
    /// Smallest duration ever sent to the engine, in milliseconds.
    pub min_input_ms: i64,
    /// Phonemes per clause before the next silence closes it.
    pub max_phonemes_per_clause: usize,
    /// Frames added after a plosive that runs into silence.
    pub dummy_vowel_frames: i64,
    /// Frames added for the pause of a clause break.
    pub comma_pause_frames: i64,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            min_input_ms: 5,
            max_phonemes_per_clause: 100,
            dummy_vowel_frames: 4,
            comma_pause_frames: 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// How to invoke the external synthesis engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable; run as `<program> -w <out.wav>` with the command
    /// text on stdin.
    pub program: PathBuf,
    /// Scratch directory for command and WAV files.  Defaults to the system
    /// temp directory.
    pub work_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { program: PathBuf::from("dectalk/say"), work_dir: None }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SynthConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration of a [`Singer`](crate::Singer).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub dictionary_path: PathBuf,
    pub voice: Voice,
    pub timing: TimingConfig,
    pub quantizer: QuantizerConfig,
    pub engine: EngineConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            dictionary_path: PathBuf::from(dictionary::DEFAULT_PATH),
            voice: Voice::default(),
            timing: TimingConfig::default(),
            quantizer: QuantizerConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl SynthConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
