//! Pronunciation dictionary — word → syllabified phoneme transcription.
//!
//! The backing file is a CMU-style flat list, one entry per line:
//!
//! ```text
//! HAPPY  HX AE | P IY
//! ```
//!
//! The word and its transcription are separated by two spaces, and
//! syllables within the transcription by `" | "`.
//!
//! A [`Dictionary`] opened from a path reads its file lazily, exactly once,
//! on the first lookup.  Concurrent first callers block until the load has
//! finished and then share the same read-only table.  A missing or
//! unreadable file degrades to an empty table: every lookup misses and
//! [`Dictionary::unavailable`] reports why.

use std::{
    fs,
    path::{Path, PathBuf},
};

use once_cell::sync::OnceCell;

use crate::phoneme::SILENCE;

/// Default location of the dictionary, relative to the working directory.
pub const DEFAULT_PATH: &str = "dectalk/cmudict-mod";

/// Separator between the word and its transcription on each line.
const ENTRY_SEPARATOR: &str = "  ";

/// Comment prefix used by the CMU dictionary.
const COMMENT_PREFIX: &str = ";;;";

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

/// One immutable `(word, transcription)` pair.  `word` is uppercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticEntry {
    pub word: String,
    pub transcription: String,
}

impl PhoneticEntry {
    /// Parse a `WORD  PHONEMES` line.  Returns `None` for comments and lines
    /// without the two-space separator.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.starts_with(COMMENT_PREFIX) {
            return None;
        }
        let (word, transcription) = line.split_once(ENTRY_SEPARATOR)?;
        if word.is_empty() {
            return None;
        }
        Some(Self {
            word: word.to_uppercase(),
            transcription: transcription.trim().to_string(),
        })
    }

    /// Transcription split into syllables of phoneme tokens.
    pub fn syllables(&self) -> Vec<Vec<&str>> {
        self.transcription
            .split(crate::phoneme::SYLLABLE_SEPARATOR)
            .map(|s| s.split_whitespace().collect::<Vec<_>>())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loaded table
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Table {
    /// Sorted ascending by `word`.
    entries: Vec<PhoneticEntry>,
    /// Why the backing file could not be read, if it could not.
    failure: Option<String>,
}

impl Table {
    fn from_entries(mut entries: Vec<PhoneticEntry>) -> Self {
        entries.sort_by(|a, b| a.word.cmp(&b.word));
        Self { entries, failure: None }
    }

    fn unavailable(reason: String) -> Self {
        Self { entries: Vec::new(), failure: Some(reason) }
    }

    fn find(&self, word: &str) -> Option<&PhoneticEntry> {
        let word = word.to_uppercase();
        self.entries
            .binary_search_by(|e| e.word.as_str().cmp(word.as_str()))
            .ok()
            .map(|i| &self.entries[i])
    }
}

fn load_file(path: &Path) -> Table {
    match fs::read_to_string(path) {
        Ok(text) => Table::from_entries(text.lines().filter_map(PhoneticEntry::parse).collect()),
        Err(e) => {
            let reason = format!("cannot read {}: {}", path.display(), e);
            eprintln!("[singtalk] dictionary unavailable, {reason}");
            Table::unavailable(reason)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dictionary
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only pronunciation table with one-time lazy loading.
///
/// Share one instance between sessions with an `Arc`; the table is never
/// mutated after it has been loaded.
#[derive(Debug)]
pub struct Dictionary {
    path: Option<PathBuf>,
    table: OnceCell<Table>,
}

impl Dictionary {
    /// Dictionary backed by the file at `path`, read on first access.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()), table: OnceCell::new() }
    }

    /// Dictionary built from in-memory `WORD  PHONEMES` lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = lines
            .into_iter()
            .filter_map(|l| PhoneticEntry::parse(l.as_ref()))
            .collect();
        Self { path: None, table: OnceCell::with_value(Table::from_entries(entries)) }
    }

    /// A dictionary with no entries; only explicit phoneme annotations resolve.
    pub fn empty() -> Self {
        Self { path: None, table: OnceCell::with_value(Table::default()) }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `true` once the table has been loaded (always true for in-memory tables).
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    fn table(&self) -> &Table {
        self.table.get_or_init(|| match &self.path {
            Some(path) => load_file(path),
            None => Table::default(),
        })
    }

    /// Load the table if needed and report why the backing file could not
    /// be read.  `None` means the table is usable.
    pub fn unavailable(&self) -> Option<&str> {
        self.table().failure.as_deref()
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive exact lookup.
    pub fn entry(&self, word: &str) -> Option<&PhoneticEntry> {
        self.table().find(word)
    }

    /// Transcription of `word`, or the silence token `"_"` when the word is
    /// not in the table.  Never fails.
    pub fn lookup(&self, word: &str) -> &str {
        self.entry(word)
            .map(|e| e.transcription.as_str())
            .unwrap_or(SILENCE)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
