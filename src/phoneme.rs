//! Phoneme inventory of the target engine and articulatory classification.
//!
//! Every token that may appear in dictionary data or explicit `[...]`
//! annotations belongs to exactly one [`PhonemeClass`].  The syllabic and
//! plosive sets are disjoint; the allocator and the quantizer rely on that.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// The silence token.
pub const SILENCE: &str = "_";

/// Separator between syllables in a transcription.
pub const SYLLABLE_SEPARATOR: char = '|';

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

const PLOSIVES: &[&str] = &["P", "B", "T", "D", "K", "G"];
const NASALS: &[&str] = &["M", "N", "NX", "EN"];
const FRICATIVES: &[&str] = &["F", "V", "TH", "DH", "S", "Z", "SH", "ZH", "HX"];
const AFFRICATES: &[&str] = &["CH", "JH", "DZ"];
const LIQUIDS: &[&str] = &["L", "R", "LX", "RX", "EL"];
const GLIDES: &[&str] = &["W", "Y", "YX"];
/// Flaps and glottal stops.  Not timed as plosives.
const TAPS: &[&str] = &["DX", "DF", "TX", "Q"];
const SYLLABICS: &[&str] = &[
    "IY", "IH", "EY", "EH", "AE", "AA", "AY", "AW", "AH", "AO", "OW", "OY",
    "UH", "UW", "RR", "YU", "AX", "IX", "IR", "ER", "AR", "OR", "UR",
];

/// Articulatory class of a phoneme token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhonemeClass {
    Syllabic,
    Plosive,
    Nasal,
    Fricative,
    Affricate,
    Liquid,
    Glide,
    Tap,
    Silence,
}

static CLASSES: Lazy<HashMap<&'static str, PhonemeClass>> = Lazy::new(|| {
    let groups: [(&[&'static str], PhonemeClass); 8] = [
        (PLOSIVES, PhonemeClass::Plosive),
        (NASALS, PhonemeClass::Nasal),
        (FRICATIVES, PhonemeClass::Fricative),
        (AFFRICATES, PhonemeClass::Affricate),
        (LIQUIDS, PhonemeClass::Liquid),
        (GLIDES, PhonemeClass::Glide),
        (TAPS, PhonemeClass::Tap),
        (SYLLABICS, PhonemeClass::Syllabic),
    ];

    std::iter::once((SILENCE, PhonemeClass::Silence))
        .chain(
            groups
                .into_iter()
                .flat_map(|(set, class)| set.iter().map(move |&p| (p, class))),
        )
        .collect()
});

/// Longest token in the inventory, in bytes.
const MAX_TOKEN_LEN: usize = 2;

/// Anything that cannot be part of a phoneme token.
static RE_NON_PHONEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z_]").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Class of `token`, or `None` when it is not part of the inventory.
pub fn classify(token: &str) -> Option<PhonemeClass> {
    CLASSES.get(token).copied()
}

pub fn is_plosive(token: &str) -> bool {
    classify(token) == Some(PhonemeClass::Plosive)
}

pub fn is_syllabic(token: &str) -> bool {
    classify(token) == Some(PhonemeClass::Syllabic)
}

pub fn is_silence(token: &str) -> bool {
    token == SILENCE
}

// ─────────────────────────────────────────────────────────────────────────────
// Segmentation
// ─────────────────────────────────────────────────────────────────────────────

/// Split a run of phoneme letters written without spaces (`"stowp"`) into
/// inventory tokens (`["S", "T", "OW", "P"]`), longest match first.
///
/// Input is uppercased and stripped of anything but `A-Z` and `_`.
/// Characters that start no known token are skipped.
pub fn segment(word: &str) -> Vec<String> {
    let cleaned = RE_NON_PHONEME.replace_all(&word.to_ascii_uppercase(), "").into_owned();
    let mut tokens = Vec::new();
    let mut rest = cleaned.as_str();

    while !rest.is_empty() {
        let matched = (1..=MAX_TOKEN_LEN.min(rest.len()))
            .rev()
            .map(|len| &rest[..len])
            .find(|candidate| CLASSES.contains_key(*candidate));

        match matched {
            Some(token) => {
                tokens.push(token.to_string());
                rest = &rest[token.len()..];
            }
            None => rest = &rest[1..],
        }
    }
    tokens
}

/// Normalise one whitespace-separated annotation token.
///
/// Known tokens pass through uppercased.  A run of phonemes written without
/// spaces is segmented, but only when every letter belongs to a token;
/// anything else is kept as written (uppercased) for the engine to judge.
pub fn normalize_token(token: &str) -> Vec<String> {
    let upper = token.to_ascii_uppercase();
    if CLASSES.contains_key(upper.as_str()) {
        return vec![upper];
    }
    let tokens = segment(&upper);
    if !tokens.is_empty() && tokens.concat() == upper {
        tokens
    } else {
        vec![upper]
    }
}

/// Index of the primary phoneme of a syllable: the last syllabic token, or
/// the first token when the syllable has no syllabic.
pub fn primary_index<S: AsRef<str>>(syllable: &[S]) -> usize {
    syllable
        .iter()
        .rposition(|p| is_syllabic(p.as_ref()))
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllabic_and_plosive_disjoint() {
        for p in PLOSIVES.iter().chain(TAPS) {
            assert!(!SYLLABICS.contains(p), "{p} is both a stop and syllabic");
        }
    }

    #[test]
    fn test_every_token_has_one_class() {
        let total = PLOSIVES.len()
            + NASALS.len()
            + FRICATIVES.len()
            + AFFRICATES.len()
            + LIQUIDS.len()
            + GLIDES.len()
            + TAPS.len()
            + SYLLABICS.len()
            + 1;
        // A duplicate across sets would collapse in the map.
        assert_eq!(CLASSES.len(), total);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("K"), Some(PhonemeClass::Plosive));
        assert_eq!(classify("AE"), Some(PhonemeClass::Syllabic));
        assert_eq!(classify("_"), Some(PhonemeClass::Silence));
        assert_eq!(classify("SH"), Some(PhonemeClass::Fricative));
        assert_eq!(classify("DX"), Some(PhonemeClass::Tap));
        assert_eq!(classify("Q"), Some(PhonemeClass::Tap));
        assert_eq!(classify("QQ"), None);
        assert!(is_plosive("T"));
        assert!(!is_plosive("S"));
        assert!(!is_plosive("TX"));
    }

    #[test]
    fn test_segment_compact_annotation() {
        assert_eq!(segment("stowp"), vec!["S", "T", "OW", "P"]);
        assert_eq!(segment("hxaelow"), vec!["HX", "AE", "L", "OW"]);
    }

    #[test]
    fn test_segment_skips_unknown() {
        assert_eq!(segment("s-1t"), vec!["S", "T"]);
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_normalize_token_keeps_known() {
        assert_eq!(normalize_token("ow"), vec!["OW"]);
        assert_eq!(normalize_token("kae"), vec!["K", "AE"]);
        assert_eq!(normalize_token("dx"), vec!["DX"]);
    }

    #[test]
    fn test_normalize_token_keeps_unknown_verbatim() {
        // "X" starts no token, so the run is not segmented.
        assert_eq!(normalize_token("aex"), vec!["AEX"]);
        assert_eq!(normalize_token("s-1"), vec!["S-1"]);
    }

    #[test]
    fn test_primary_index() {
        assert_eq!(primary_index(&["K", "AE", "T"]), 1);
        assert_eq!(primary_index(&["S", "T"]), 0);
        // Last syllabic wins.
        assert_eq!(primary_index(&["AY", "AX", "L"]), 1);
    }
}
