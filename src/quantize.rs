//! Frame quantisation and command emission.
//!
//! The engine renders in frames of 64 samples at 10 kHz (6.4 ms).  Each
//! phoneme's requested duration is corrected by the rounding error carried
//! over from the phonemes before it, so the realised timeline never drifts
//! more than a frame from the score.
//!
//! Output grammar:
//!
//! ```text
//! [K<20,5>AE<460,5>T<20,5>_<300>],[S<90,7>…]
//! ```
//!
//! Silence is `_<ms>`, every other phoneme `PH<ms,pitch>`.  Clauses are
//! bracketed and comma-separated.

use crate::{
    allocate::PhonemeSpan,
    config::{Micros, QuantizerConfig},
};

/// Engine sample rate in Hz.
pub const SAMPLE_RATE: i64 = 10_000;

/// Samples per engine frame.
pub const FRAME_SIZE: i64 = 64;

/// Length of one frame in microseconds.
pub const FRAME_US: Micros = 1_000_000 * FRAME_SIZE / SAMPLE_RATE;

/// Microseconds covered by `frames` engine frames.
pub fn frames_to_us(frames: i64) -> Micros {
    1_000_000 * (frames * FRAME_SIZE) / SAMPLE_RATE
}

/// Frames the engine renders for a `ms` millisecond request.
pub fn frames_for_ms(ms: i64) -> i64 {
    ((ms + 4) * 10) / FRAME_SIZE
}

// ─────────────────────────────────────────────────────────────────────────────
// Quantizer
// ─────────────────────────────────────────────────────────────────────────────

/// Streaming quantizer with first-order error feedback.
///
/// Call [`push`](Self::push) once per span, with the span that follows it
/// (if any), then [`finish`](Self::finish) to get the command text.
#[derive(Debug)]
pub struct Quantizer<'a> {
    config: &'a QuantizerConfig,
    command: String,
    /// Realised minus requested time so far, in µs.
    error: Micros,
    clause_len: usize,
    clauses: usize,
}

impl<'a> Quantizer<'a> {
    pub fn new(config: &'a QuantizerConfig) -> Self {
        Self {
            config,
            command: String::from("["),
            error: 0,
            clause_len: 0,
            clauses: 1,
        }
    }

    /// Accumulated rounding error in µs.
    pub fn error(&self) -> Micros {
        self.error
    }

    /// Clauses opened so far.
    pub fn clauses(&self) -> usize {
        self.clauses
    }

    /// Quantise `span` and append it to the command; returns the whole
    /// milliseconds sent to the engine.
    pub fn push(&mut self, span: &PhonemeSpan, next: Option<&PhonemeSpan>) -> i64 {
        let plosive = span.is_plosive();
        let mut extra_frames = 0;
        let mut close_clause = false;

        // Plosives count twice: the engine inserts a dummy vowel after each.
        self.clause_len += if plosive { 2 } else { 1 };

        if plosive && next.is_some_and(PhonemeSpan::is_silence) {
            extra_frames += self.config.dummy_vowel_frames;
        }

        if span.is_silence() && self.clause_len > self.config.max_phonemes_per_clause {
            close_clause = true;
            extra_frames += self.config.comma_pause_frames;
            self.clause_len = 0;
        }

        let requested = span.duration - self.error - frames_to_us(extra_frames);
        let ms = requested.div_euclid(1000).max(self.config.min_input_ms);

        let realised = frames_to_us(frames_for_ms(ms) + extra_frames);
        self.error += realised - span.duration;

        self.command.push_str(&span.phoneme);
        if span.is_silence() {
            self.command.push_str(&format!("<{ms}>"));
        } else {
            self.command.push_str(&format!("<{ms},{}>", span.pitch));
        }

        if close_clause {
            self.command.push_str("],[");
            self.clauses += 1;
        }
        ms
    }

    /// Close the last clause and return the command text.
    pub fn finish(mut self) -> String {
        self.command.push(']');
        self.command
    }
}

/// Quantise `spans` and serialise them in the engine's phoneme grammar.
pub fn emit(spans: &[PhonemeSpan], config: &QuantizerConfig) -> String {
    let mut quantizer = Quantizer::new(config);
    for (i, span) in spans.iter().enumerate() {
        quantizer.push(span, spans.get(i + 1));
    }
    quantizer.finish()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn vowel(duration: Micros) -> PhonemeSpan {
        PhonemeSpan::new("AA", duration, 3)
    }

    /// Parse the millisecond value out of every `<…>` group.
    fn emitted_ms(command: &str) -> Vec<i64> {
        command
            .split('<')
            .skip(1)
            .map(|s| {
                let body = &s[..s.find('>').unwrap()];
                body.split(',').next().unwrap().parse().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_frame_length() {
        assert_eq!(FRAME_US, 6_400);
        assert_eq!(frames_to_us(10), 64_000);
        assert_eq!(frames_for_ms(460), 72);
    }

    #[test]
    fn test_grammar() {
        let spans = [
            PhonemeSpan::new("K", 20_000, 5),
            PhonemeSpan::new("AE", 460_000, 5),
            PhonemeSpan::silence(300_000),
        ];
        let command = emit(&spans, &QuantizerConfig::default());
        assert!(command.starts_with("[K<"), "got: {command}");
        assert!(command.contains("AE<"), "got: {command}");
        assert!(command.contains(",5>"), "got: {command}");
        assert!(command.ends_with(">]"), "got: {command}");
        // Silence carries no pitch.
        let silence = &command[command.find("_<").unwrap()..];
        assert!(!silence.contains(','), "got: {command}");
    }

    #[test]
    fn test_exact_output() {
        let spans = [PhonemeSpan::new("AA", 64_000, 2), PhonemeSpan::silence(64_000)];
        // 64 ms → 10 frames exactly, no error carried.
        assert_eq!(emit(&spans, &QuantizerConfig::default()), "[AA<64,2>_<64>]");
    }

    #[test]
    fn test_error_stays_bounded() {
        let config = QuantizerConfig::default();
        for duration in [23_456, 100_000, 151_515, 333_333, 7_777] {
            let span = vowel(duration);
            let mut q = Quantizer::new(&config);
            for _ in 0..10_000 {
                q.push(&span, Some(&span));
                assert!(q.error().abs() < FRAME_US, "error {} for {duration}", q.error());
            }
        }
    }

    #[test]
    fn test_min_input_clamp() {
        let config = QuantizerConfig::default();
        let mut q = Quantizer::new(&config);
        assert_eq!(q.push(&vowel(1_000), None), 5);
        assert_eq!(q.push(&vowel(-50_000), None), 5);
    }

    #[test]
    fn test_dummy_vowel_before_silence() {
        let config = QuantizerConfig::default();
        let with_pause = [PhonemeSpan::new("T", 64_000, 0), PhonemeSpan::silence(64_000)];
        let without = [PhonemeSpan::new("T", 64_000, 0), PhonemeSpan::new("AA", 64_000, 0)];
        // Four dummy-vowel frames (25.6 ms) come out of the plosive's request.
        assert_eq!(emitted_ms(&emit(&with_pause, &config))[0], 38);
        assert_eq!(emitted_ms(&emit(&without, &config))[0], 64);
    }

    #[test]
    fn test_clause_breaks_only_at_silence() {
        // 150 sustained phonemes, silence at every 120th.
        let spans: Vec<_> = (1..=150)
            .map(|i| if i % 120 == 0 { PhonemeSpan::silence(50_000) } else { vowel(50_000) })
            .collect();
        let config = QuantizerConfig::default();
        let mut q = Quantizer::new(&config);
        for (i, span) in spans.iter().enumerate() {
            q.push(span, spans.get(i + 1));
        }
        assert_eq!(q.clauses(), 2);
        let command = q.finish();
        assert_eq!(command, emit(&spans, &config));
        assert_eq!(command.matches("],[").count(), 1);
        assert!(command.contains("_<"), "got: {command}");
        let split = command.find("],[").unwrap();
        assert!(command[..split].ends_with('>'));
        assert!(command[..split].rfind("_<").unwrap() > command[..split].rfind("AA<").unwrap());
    }

    #[test]
    fn test_long_word_never_splits() {
        let spans: Vec<_> = (0..250).map(|_| vowel(40_000)).collect();
        let config = QuantizerConfig::default();
        let mut q = Quantizer::new(&config);
        for span in &spans {
            q.push(span, None);
        }
        assert_eq!(q.clauses(), 1);
        assert!(!q.finish().contains("],["));
    }

    #[test]
    fn test_plosives_count_double() {
        // 51 plosives = 102 > 100, so the following silence breaks the clause.
        let mut spans: Vec<_> = (0..51).map(|_| PhonemeSpan::new("K", 20_000, 0)).collect();
        spans.push(PhonemeSpan::silence(100_000));
        spans.push(vowel(100_000));
        let command = emit(&spans, &QuantizerConfig::default());
        assert_eq!(command.matches("],[").count(), 1);
    }

    #[test]
    fn test_silence_round_trip_within_a_frame() {
        let config = QuantizerConfig::default();
        for duration in [1_000_000, 123_456, 27_499_999, 6_400, 10_000] {
            let command = emit(&[PhonemeSpan::silence(duration)], &config);
            let ms = emitted_ms(&command)[0];
            let elapsed = frames_to_us(frames_for_ms(ms));
            assert!((elapsed - duration).abs() <= FRAME_US, "{duration}: {elapsed}");
        }
    }
}
