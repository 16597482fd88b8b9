//! Error and warning types.
//!
//! Nothing in the score → command pipeline is fatal: lookup misses, ragged
//! syllables and degenerate durations are absorbed and, where the caller may
//! care, reported as a [`Warning`].  Real errors only come from I/O at the
//! edges: reading config files and running the external engine.

use std::{path::PathBuf, process::ExitStatus};

/// Failure to load a [`SynthConfig`](crate::SynthConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of the external synthesis engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot start engine {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited with {0}")]
    Status(ExitStatus),
    #[error("engine produced an unreadable WAV: {0}")]
    Wav(#[from] hound::Error),
}

/// A non-fatal degradation observed while compiling a score.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    /// The dictionary file could not be read; only `[...]` lyrics resolve.
    #[error("pronunciation dictionary unavailable ({0})")]
    DictionaryUnavailable(String),
    /// A lyric had no dictionary entry and was sung as silence.
    #[error("no pronunciation for {0:?}")]
    UnknownWord(String),
    /// A word had more syllables than the notes left in the score.
    #[error("{count} syllable(s) of {word:?} ran past the end of the score")]
    DroppedSyllables { word: String, count: usize },
}
