//! Phoneme duration allocation — one note → one span per phoneme.
//!
//! Plosives get a fixed length.  Of the remaining ("variable") time, the
//! sustained consonants share `1 - syllabic_share`, each capped at
//! `max_sustained_us`; syllabics take what is left.  The last phoneme of a
//! note always takes the exact remainder, so a note's spans sum to its
//! duration.  Time cut by the cap is not handed back to anyone else.

use crate::{
    config::{Micros, TimingConfig},
    phoneme::{self, SILENCE},
    score::{NoteLabel, ScoreNote},
};

/// One phoneme with its allotted time and pitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeSpan {
    pub phoneme: String,
    pub duration: Micros,
    pub pitch: i16,
}

impl PhonemeSpan {
    pub fn new(phoneme: impl Into<String>, duration: Micros, pitch: i16) -> Self {
        Self { phoneme: phoneme.into(), duration, pitch }
    }

    pub fn silence(duration: Micros) -> Self {
        Self::new(SILENCE, duration, 0)
    }

    pub fn is_silence(&self) -> bool {
        phoneme::is_silence(&self.phoneme)
    }

    pub fn is_plosive(&self) -> bool {
        phoneme::is_plosive(&self.phoneme)
    }
}

/// Per-class lengths for one note.
struct Shares {
    plosive: Micros,
    sustained: Micros,
    syllabic: Micros,
}

fn shares(tokens: &[&str], duration: Micros, timing: &TimingConfig) -> Shares {
    let plosives = tokens.iter().filter(|t| phoneme::is_plosive(t)).count() as i64;
    let sustained_count = tokens.len() as i64 - 1 - plosives;

    let mut variable = duration - plosives * timing.plosive_us;

    let mut sustained = 0;
    if sustained_count > 0 {
        sustained = (variable as f64 * (1.0 - timing.syllabic_share) / sustained_count as f64) as Micros;
        sustained = sustained.min(timing.max_sustained_us);
    }
    variable -= sustained * sustained_count.max(0);

    Shares { plosive: timing.plosive_us, sustained, syllabic: variable }
}

fn expand_note(note: &ScoreNote, text: &str, timing: &TimingConfig, out: &mut Vec<PhonemeSpan>) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        out.push(PhonemeSpan::silence(note.duration));
        return;
    }

    let shares = shares(&tokens, note.duration, timing);
    let mut remaining = note.duration;

    for (i, &token) in tokens.iter().enumerate() {
        let length = if i + 1 == tokens.len() {
            remaining
        } else if phoneme::is_syllabic(token) {
            shares.syllabic
        } else if phoneme::is_plosive(token) {
            shares.plosive
        } else {
            shares.sustained
        };
        remaining -= length;
        out.push(PhonemeSpan::new(token, length, note.pitch));
    }
}

/// Expand every note into per-phoneme spans.
///
/// Notes whose label is not [`NoteLabel::Resolved`] pass through as a single
/// silence span.
pub fn allocate(notes: &[ScoreNote], timing: &TimingConfig) -> Vec<PhonemeSpan> {
    let mut spans = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        match &note.label {
            NoteLabel::Resolved(text) => expand_note(note, text, timing, &mut spans),
            _ => spans.push(PhonemeSpan::silence(note.duration)),
        }
    }
    spans
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
