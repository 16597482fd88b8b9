//! Syllable spreading — lyric text → per-note phoneme labels.
//!
//! Each [`NoteLabel::Lyric`] is resolved to a syllabified transcription,
//! either through the [`Dictionary`] or verbatim from a `[...]` annotation.
//! Every syllable then lands on one note:
//!
//! * the syllable's primary phoneme (its last syllabic, else its first
//!   phoneme) becomes the landing note's label and carries on through the
//!   [`NoteLabel::Pending`] notes that follow it, up to the first silence or
//!   note with content of its own;
//! * the onset (phonemes before the primary) is prepended to the first note
//!   of that run and the coda (phonemes after it) appended to the last.
//!
//! The next syllable lands on the next [`NoteLabel::Tie`] note, skipping
//! rests.  If content other than a tie follows, the leftover syllables are
//! sung on the last note of the run.  If the score ends first they are
//! dropped.  Pending and tie notes that no syllable reached fall silent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    dictionary::Dictionary,
    error::Warning,
    phoneme::{self, SILENCE, SYLLABLE_SEPARATOR},
    score::{NoteLabel, ScoreNote},
};

type Syllable = Vec<String>;

/// Characters never part of a dictionary headword.
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z']").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Lyric resolution
// ─────────────────────────────────────────────────────────────────────────────

fn is_annotation(lyric: &str) -> bool {
    lyric.starts_with('[') || lyric.ends_with(']')
}

/// Split a transcription on `|` into syllables of normalised tokens.
fn split_syllables(transcription: &str) -> Vec<Syllable> {
    transcription
        .split(SYLLABLE_SEPARATOR)
        .map(|s| s.split_whitespace().flat_map(phoneme::normalize_token).collect::<Syllable>())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Syllables of `lyric`, or `None` when it is a word the dictionary lacks.
fn resolve(lyric: &str, dictionary: &Dictionary) -> Option<Vec<Syllable>> {
    if is_annotation(lyric) {
        let inner = lyric.strip_prefix('[').unwrap_or(lyric);
        let inner = inner.strip_suffix(']').unwrap_or(inner);
        return Some(split_syllables(inner));
    }

    let word = RE_NON_WORD.replace_all(lyric, "");
    match dictionary.lookup(&word) {
        SILENCE => None,
        transcription => Some(split_syllables(transcription)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Placement
// ─────────────────────────────────────────────────────────────────────────────

fn resolved_mut(label: &mut NoteLabel) -> Option<&mut String> {
    match label {
        NoteLabel::Resolved(text) => Some(text),
        _ => None,
    }
}

/// Put `syllable` on the run starting at `first`; returns the run's last index.
fn place(notes: &mut [ScoreNote], first: usize, syllable: &[String]) -> usize {
    let p = phoneme::primary_index(syllable);
    let primary = &syllable[p];

    notes[first].label = NoteLabel::Resolved(primary.clone());
    let mut last = first;
    while let Some(next) = notes.get_mut(last + 1) {
        if next.label != NoteLabel::Pending {
            break;
        }
        next.label = NoteLabel::Resolved(primary.clone());
        last += 1;
    }

    if p > 0 {
        if let Some(text) = resolved_mut(&mut notes[first].label) {
            *text = format!("{} {}", syllable[..p].join(" "), text);
        }
    }
    if p + 1 < syllable.len() {
        if let Some(text) = resolved_mut(&mut notes[last].label) {
            text.push(' ');
            text.push_str(&syllable[p + 1..].join(" "));
        }
    }
    last
}

/// Where the syllable after a run ending at `last` goes.
enum Landing {
    Tie(usize),
    Occupied,
    End,
}

fn next_landing(notes: &[ScoreNote], last: usize) -> Landing {
    let next = notes[last + 1..]
        .iter()
        .position(|n| !n.is_silence())
        .map(|offset| last + 1 + offset);
    match next {
        None => Landing::End,
        Some(i) if notes[i].label == NoteLabel::Tie => Landing::Tie(i),
        Some(_) => Landing::Occupied,
    }
}

/// Spread the syllables of `word` from `start`; returns the last note used.
fn spread_word(
    notes: &mut [ScoreNote],
    start: usize,
    word: &str,
    syllables: &[Syllable],
    warnings: &mut Vec<Warning>,
) -> usize {
    let mut landing = start;
    let mut last = start;

    for (n, syllable) in syllables.iter().enumerate() {
        last = place(notes, landing, syllable);

        let remaining = &syllables[n + 1..];
        if remaining.is_empty() {
            break;
        }
        match next_landing(notes, last) {
            Landing::Tie(i) => landing = i,
            Landing::Occupied => {
                if let Some(text) = resolved_mut(&mut notes[last].label) {
                    for s in remaining {
                        text.push(' ');
                        text.push_str(&s.join(" "));
                    }
                }
                break;
            }
            Landing::End => {
                warnings.push(Warning::DroppedSyllables {
                    word: word.to_string(),
                    count: remaining.len(),
                });
                break;
            }
        }
    }
    last
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve every lyric in `notes` and spread its syllables in place.
///
/// After this pass every label is either [`NoteLabel::Silence`] or
/// [`NoteLabel::Resolved`].  Unknown words are sung as silence and reported.
pub fn spread(notes: &mut [ScoreNote], dictionary: &Dictionary) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut cursor = 0;

    while cursor < notes.len() {
        let lyric = match &notes[cursor].label {
            NoteLabel::Lyric(text) => text.clone(),
            NoteLabel::Pending | NoteLabel::Tie => {
                notes[cursor].label = NoteLabel::Silence;
                cursor += 1;
                continue;
            }
            NoteLabel::Silence | NoteLabel::Resolved(_) => {
                cursor += 1;
                continue;
            }
        };

        let syllables = match resolve(&lyric, dictionary) {
            Some(syllables) if !syllables.is_empty() => syllables,
            resolved => {
                if resolved.is_none() {
                    warnings.push(Warning::UnknownWord(lyric));
                }
                notes[cursor].label = NoteLabel::Silence;
                cursor += 1;
                continue;
            }
        };

        // Invariant: every note before `cursor` is Silence or Resolved.
        cursor = spread_word(notes, cursor, &lyric, &syllables, &mut warnings) + 1;
    }

    warnings
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary::from_lines([
            "CAT  K AE T",
            "DAY  D EY",
            "HAPPY  HX AE | P IY",
            "STOP  S T AA P",
        ])
    }

    fn labels(notes: &[ScoreNote]) -> Vec<NoteLabel> {
        notes.iter().map(|n| n.label.clone()).collect()
    }

    fn resolved(text: &str) -> NoteLabel {
        NoteLabel::Resolved(text.to_string())
    }

    fn tie(duration: i64) -> ScoreNote {
        ScoreNote { label: NoteLabel::Tie, duration, pitch: 0 }
    }

    #[test]
    fn test_single_syllable_single_note() {
        let mut notes = vec![ScoreNote::lyric("CAT", 500_000, 5)];
        let warnings = spread(&mut notes, &dict());
        assert!(warnings.is_empty());
        assert_eq!(labels(&notes), vec![resolved("K AE T")]);
    }

    #[test]
    fn test_lookup_ignores_case_and_punctuation() {
        let mut notes = vec![ScoreNote::lyric("Cat,", 500_000, 5)];
        spread(&mut notes, &dict());
        assert_eq!(labels(&notes), vec![resolved("K AE T")]);
    }

    #[test]
    fn test_explicit_phonemes_skip_dictionary() {
        let mut notes = vec![ScoreNote::lyric("[S T OW P]", 500_000, 0)];
        let warnings = spread(&mut notes, &Dictionary::empty());
        assert!(warnings.is_empty());
        assert_eq!(labels(&notes), vec![resolved("S T OW P")]);
    }

    #[test]
    fn test_compact_explicit_phonemes() {
        let mut notes = vec![ScoreNote::lyric("[stowp]", 500_000, 0)];
        spread(&mut notes, &Dictionary::empty());
        assert_eq!(labels(&notes), vec![resolved("S T OW P")]);
    }

    #[test]
    fn test_explicit_tokens_are_verbatim() {
        let mut notes = vec![
            ScoreNote::lyric("[B AH DX ER]", 400_000, 0),
            ScoreNote::lyric("[Q AA DF]", 400_000, 0),
            ScoreNote::lyric("[S AEX T]", 400_000, 0),
        ];
        let warnings = spread(&mut notes, &Dictionary::empty());
        assert!(warnings.is_empty());
        assert_eq!(
            labels(&notes),
            vec![resolved("B AH DX ER"), resolved("Q AA DF"), resolved("S AEX T")]
        );
    }

    #[test]
    fn test_melisma_spreads_vowel() {
        let mut notes = vec![
            ScoreNote::lyric("cat", 300_000, 1),
            ScoreNote::pending(300_000, 2),
            ScoreNote::pending(300_000, 3),
        ];
        spread(&mut notes, &dict());
        assert_eq!(
            labels(&notes),
            vec![resolved("K AE"), resolved("AE"), resolved("AE T")]
        );
    }

    #[test]
    fn test_melisma_stops_at_silence() {
        let mut notes = vec![
            ScoreNote::lyric("cat", 300_000, 1),
            ScoreNote::silence(100_000),
            ScoreNote::pending(300_000, 3),
        ];
        spread(&mut notes, &dict());
        assert_eq!(
            labels(&notes),
            vec![resolved("K AE T"), NoteLabel::Silence, NoteLabel::Silence]
        );
    }

    #[test]
    fn test_hyphenated_word_lands_on_tie() {
        let mut notes = vec![ScoreNote::lyric("happy", 400_000, 1), tie(400_000)];
        spread(&mut notes, &dict());
        assert_eq!(labels(&notes), vec![resolved("HX AE"), resolved("P IY")]);
    }

    #[test]
    fn test_tie_reached_across_rest() {
        let mut notes = vec![
            ScoreNote::lyric("happy", 300_000, 1),
            ScoreNote::silence(100_000),
            tie(400_000),
            ScoreNote::pending(400_000, 1),
        ];
        spread(&mut notes, &dict());
        assert_eq!(
            labels(&notes),
            vec![resolved("HX AE"), NoteLabel::Silence, resolved("P IY"), resolved("IY")]
        );
    }

    #[test]
    fn test_explicit_syllables_on_ties() {
        let mut notes = vec![ScoreNote::lyric("[HX AE | P IY]", 400_000, 1), tie(400_000)];
        spread(&mut notes, &Dictionary::empty());
        assert_eq!(labels(&notes), vec![resolved("HX AE"), resolved("P IY")]);
    }

    #[test]
    fn test_extra_syllables_fold_onto_last_note() {
        let mut notes = vec![
            ScoreNote::lyric("happy", 400_000, 1),
            ScoreNote::lyric("day", 400_000, 1),
        ];
        let warnings = spread(&mut notes, &dict());
        assert!(warnings.is_empty());
        assert_eq!(labels(&notes), vec![resolved("HX AE P IY"), resolved("D EY")]);
    }

    #[test]
    fn test_syllables_past_end_are_dropped() {
        let mut notes = vec![ScoreNote::lyric("happy", 400_000, 1), ScoreNote::silence(10_000)];
        let warnings = spread(&mut notes, &dict());
        assert_eq!(labels(&notes), vec![resolved("HX AE"), NoteLabel::Silence]);
        assert_eq!(
            warnings,
            vec![Warning::DroppedSyllables { word: "happy".into(), count: 1 }]
        );
    }

    #[test]
    fn test_unused_tie_falls_silent() {
        let mut notes = vec![ScoreNote::lyric("cat", 400_000, 1), tie(400_000)];
        spread(&mut notes, &dict());
        assert_eq!(labels(&notes), vec![resolved("K AE T"), NoteLabel::Silence]);
    }

    #[test]
    fn test_unknown_word_is_silence() {
        let mut notes = vec![
            ScoreNote::lyric("xyzzy", 400_000, 1),
            ScoreNote::pending(400_000, 1),
            ScoreNote::lyric("day", 400_000, 1),
        ];
        let warnings = spread(&mut notes, &dict());
        assert_eq!(
            labels(&notes),
            vec![NoteLabel::Silence, NoteLabel::Silence, resolved("D EY")]
        );
        assert_eq!(warnings, vec![Warning::UnknownWord("xyzzy".into())]);
    }

    #[test]
    fn test_leading_pending_notes_fall_silent() {
        let mut notes = vec![ScoreNote::pending(100_000, 0), ScoreNote::lyric("day", 100_000, 0)];
        spread(&mut notes, &dict());
        assert_eq!(labels(&notes), vec![NoteLabel::Silence, resolved("D EY")]);
    }

    #[test]
    fn test_empty_annotation_is_silence() {
        let mut notes = vec![ScoreNote::lyric("[]", 100_000, 0)];
        let warnings = spread(&mut notes, &Dictionary::empty());
        assert!(warnings.is_empty());
        assert_eq!(labels(&notes), vec![NoteLabel::Silence]);
    }
}
