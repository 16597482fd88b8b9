//! Score input and the flattening pass.
//!
//! A [`Score`] is a time-ordered map from timestamp to the events that start
//! at that instant.  [`flatten`] walks it once and produces a flat list of
//! [`ScoreNote`]s: rests become silence (adjacent ones merged), notes carry
//! their pitch and, when they start a word, the lyric text.  Continuation
//! syllables of hyphenated words are glued onto the note that started the
//! word, and the continuing note is marked as a [`NoteLabel::Tie`] so the
//! spreader can line the syllables back up.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::{Micros, TimingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Input events
// ─────────────────────────────────────────────────────────────────────────────

/// One event of the host score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreEvent {
    Rest {
        nominal: Micros,
        actual: Micros,
    },
    Note {
        nominal: Micros,
        actual: Micros,
        /// Engine pitch index.
        pitch: i16,
    },
    /// A note pitched in host nominal levels, converted with
    /// [`pitch_from_nominal_level`].
    LevelNote {
        nominal: Micros,
        actual: Micros,
        level: i32,
    },
    /// Lyric attached to the note(s) of the same timestamp.
    Syllable {
        text: String,
        /// The word continues on the next syllable event.
        #[serde(default)]
        hyphenated: bool,
    },
}

/// Events grouped by start time (µs), in time order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Score {
    pub events: BTreeMap<u64, Vec<ScoreEvent>>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the group starting at `timestamp`.
    pub fn push(&mut self, timestamp: u64, event: ScoreEvent) -> &mut Self {
        self.events.entry(timestamp).or_default().push(event);
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Convert a host pitch level (50 units per semitone, middle of the range at
/// 1000) to the engine's pitch index.
pub fn pitch_from_nominal_level(level: i32) -> i16 {
    (level / 50 - 20) as i16
}

// ─────────────────────────────────────────────────────────────────────────────
// ScoreNote
// ─────────────────────────────────────────────────────────────────────────────

/// What a note currently says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteLabel {
    Silence,
    /// A pitched note with no lyric of its own (melisma continuation).
    Pending,
    /// A note carrying the continuation syllable of a hyphenated word.
    Tie,
    /// Raw lyric text, possibly a `[...]` phoneme annotation.
    Lyric(String),
    /// Space-separated phoneme tokens.
    Resolved(String),
}

/// Intermediate unit threaded through flatten → spread → allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreNote {
    pub label: NoteLabel,
    pub duration: Micros,
    pub pitch: i16,
}

impl ScoreNote {
    pub fn silence(duration: Micros) -> Self {
        Self { label: NoteLabel::Silence, duration, pitch: 0 }
    }

    pub fn pending(duration: Micros, pitch: i16) -> Self {
        Self { label: NoteLabel::Pending, duration, pitch }
    }

    pub fn lyric(text: impl Into<String>, duration: Micros, pitch: i16) -> Self {
        Self { label: NoteLabel::Lyric(text.into()), duration, pitch }
    }

    pub fn is_silence(&self) -> bool {
        self.label == NoteLabel::Silence
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Flattening
// ─────────────────────────────────────────────────────────────────────────────

/// Word-tracking state carried from one syllable event to the next.
#[derive(Debug, Default)]
struct WordState {
    /// Index of the note that started the current word.
    start: Option<usize>,
    /// The previous syllable was hyphenated to this one.
    continues: bool,
    /// Inside a `[...]` annotation that spans several syllable events.
    phonemic: bool,
}

impl WordState {
    /// Apply one syllable event to `note` (about to be pushed at index
    /// `notes.len()`), extending the current word if it continues.
    fn attach(&mut self, notes: &mut [ScoreNote], note: &mut ScoreNote, text: &str, hyphenated: bool) {
        if !self.phonemic && text.starts_with('[') {
            self.phonemic = true;
        }

        let index = notes.len();
        let start = self.start.filter(|_| self.continues);
        match start.and_then(|i| notes.get_mut(i)) {
            Some(ScoreNote { label: NoteLabel::Lyric(word), .. }) => {
                if self.phonemic {
                    word.push_str(" | ");
                }
                word.push_str(text);
                note.label = NoteLabel::Tie;
            }
            _ => {
                note.label = NoteLabel::Lyric(text.to_string());
                self.start = Some(index);
            }
        }

        self.continues = hyphenated;

        if self.phonemic && text.ends_with(']') {
            self.phonemic = false;
        }
    }
}

/// A pitched note with the lyrics of its group attached.
fn start_note(
    word: &mut WordState,
    notes: &mut [ScoreNote],
    group: &[ScoreEvent],
    actual: Micros,
    pitch: i16,
) -> ScoreNote {
    let mut note = ScoreNote::pending(actual, pitch);
    for event in group {
        if let ScoreEvent::Syllable { text, hyphenated } = event {
            word.attach(notes, &mut note, text, *hyphenated);
        }
    }
    note
}

/// Flatten `score` into an ordered list of notes.
pub fn flatten(score: &Score, timing: &TimingConfig) -> Vec<ScoreNote> {
    let mut notes: Vec<ScoreNote> = Vec::new();
    let mut word = WordState::default();

    for group in score.events.values() {
        for event in group {
            let (mut note, nominal) = match event {
                ScoreEvent::Rest { nominal, actual } => {
                    if let Some(last) = notes.last_mut() {
                        let merged = last.duration.saturating_add(*actual);
                        if last.is_silence() && merged < timing.max_rest_us {
                            last.duration = merged;
                            continue;
                        }
                    }
                    (ScoreNote::silence(*actual), *nominal)
                }
                ScoreEvent::Note { nominal, actual, pitch } => {
                    (start_note(&mut word, &mut notes, group, *actual, *pitch), *nominal)
                }
                ScoreEvent::LevelNote { nominal, actual, level } => {
                    let pitch = pitch_from_nominal_level(*level);
                    (start_note(&mut word, &mut notes, group, *actual, pitch), *nominal)
                }
                ScoreEvent::Syllable { .. } => continue,
            };

            let downtime = nominal.saturating_sub(note.duration);
            if downtime < timing.min_downtime_us {
                note.duration = nominal;
                notes.push(note);
            } else {
                notes.push(note);
                notes.push(ScoreNote::silence(downtime));
            }
        }
    }

    notes
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
