//! # singtalk
//!
//! Compiles a sung score (notes, rests, lyrics, pitches) into the phoneme
//! command language of a DECtalk-style formant synthesizer.
//!
//! ## Quick start
//!
//! ```no_run
//! use singtalk::{Score, ScoreEvent, Singer, SynthConfig};
//!
//! let mut score = Score::new();
//! score
//!     .push(0, ScoreEvent::Note { nominal: 500_000, actual: 500_000, pitch: 5 })
//!     .push(0, ScoreEvent::Syllable { text: "cat".into(), hyphenated: false });
//!
//! // The dictionary (dectalk/cmudict-mod by default) is read on first use.
//! let singer = Singer::new(SynthConfig::default());
//! let composition = singer.compose(&score);
//! println!("{}", composition.command);
//! ```
//!
//! Lyrics written in brackets bypass the dictionary and are sung as given:
//! `"[S T OW P]"` (or compactly `"[stowp]"`).
//!
//! ## Pipeline
//! 1. **Flatten** — timed events → notes; rests merged, word syllables glued.
//! 2. **Spread** — lyrics → syllables → per-note phonemes, across ties and melismas.
//! 3. **Allocate** — each note's time split over its phonemes by articulatory class.
//! 4. **Quantise** — durations → engine frames with error feedback; clause breaks.
//! 5. **Render** (optional) — command text handed to an external engine via [`Renderer`].

pub mod allocate;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod phoneme;
pub mod quantize;
pub mod score;
pub mod singer;
pub mod spread;

// C FFI for native notation hosts.
pub mod ffi;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use allocate::{allocate, PhonemeSpan};
pub use config::{EngineConfig, Micros, QuantizerConfig, SynthConfig, TimingConfig};
pub use dictionary::{Dictionary, PhoneticEntry};
pub use engine::{RenderedAudio, Renderer, SayEngine, Voice};
pub use error::{ConfigError, EngineError, Warning};
pub use quantize::{emit, Quantizer};
pub use score::{flatten, NoteLabel, Score, ScoreEvent, ScoreNote};
pub use singer::{Composition, Singer};
pub use spread::spread;
