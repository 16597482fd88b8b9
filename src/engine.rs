//! External synthesis engine — command text in, audio out.
//!
//! The crate never synthesises audio itself.  A [`Renderer`] takes the
//! finished command text and returns samples; [`SayEngine`] implements it
//! by running a DECtalk-compatible `say` executable:
//!
//! ```text
//! say -w <out.wav> < <out.txt>
//! ```

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Deserialize;

use crate::{config::EngineConfig, error::EngineError};

// ─────────────────────────────────────────────────────────────────────────────
// Voices
// ─────────────────────────────────────────────────────────────────────────────

/// The engine's built-in speakers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    #[default]
    PerfectPaul,
    BeautifulBetty,
    HugeHarry,
    FrailFrank,
    DoctorDennis,
    KitTheKid,
    UppityUrsula,
    RoughRita,
    WhisperingWendy,
    VariableVal,
}

impl Voice {
    pub const ALL: [Voice; 10] = [
        Voice::PerfectPaul,
        Voice::BeautifulBetty,
        Voice::HugeHarry,
        Voice::FrailFrank,
        Voice::DoctorDennis,
        Voice::KitTheKid,
        Voice::UppityUrsula,
        Voice::RoughRita,
        Voice::WhisperingWendy,
        Voice::VariableVal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Voice::PerfectPaul => "Perfect Paul",
            Voice::BeautifulBetty => "Beautiful Betty",
            Voice::HugeHarry => "Huge Harry",
            Voice::FrailFrank => "Frail Frank",
            Voice::DoctorDennis => "Doctor Dennis",
            Voice::KitTheKid => "Kit the Kid",
            Voice::UppityUrsula => "Uppity Ursula",
            Voice::RoughRita => "Rough Rita",
            Voice::WhisperingWendy => "Whispering Wendy",
            Voice::VariableVal => "Variable Val",
        }
    }

    /// Look a voice up by display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Voice> {
        Self::ALL.into_iter().find(|v| v.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Letter selecting this speaker in the `[:n?]` command.
    pub fn code(self) -> char {
        self.name().chars().next().unwrap_or('p').to_ascii_lowercase()
    }

    /// Commands that switch the engine to phoneme input and select the voice.
    pub fn preamble(self) -> String {
        format!("[:phoneme on][:n{}]", self.code())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// PCM audio returned by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved 16-bit samples.
    pub samples: Vec<i16>,
}

impl RenderedAudio {
    /// Duration in microseconds.
    pub fn duration_us(&self) -> i64 {
        let frames = self.samples.len() as i64 / i64::from(self.channels.max(1));
        frames * 1_000_000 / i64::from(self.sample_rate.max(1))
    }

    /// Read a 16-bit PCM WAV file.
    pub fn read_wav(path: &Path) -> Result<Self, EngineError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sample_rate: spec.sample_rate, channels: spec.channels, samples })
    }

    /// Write the samples as a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), EngineError> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &s in &self.samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Anything that turns command text into audio.
pub trait Renderer {
    fn render(&self, command: &str) -> Result<RenderedAudio, EngineError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SayEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Distinguishes concurrent requests in the same process.
static REQUEST_ID: AtomicU64 = AtomicU64::new(0);

/// Runs a DECtalk `say` executable as a subprocess.
#[derive(Debug, Clone)]
pub struct SayEngine {
    program: PathBuf,
    work_dir: PathBuf,
}

impl SayEngine {
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), work_dir: work_dir.into() }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let work_dir = config.work_dir.clone().unwrap_or_else(std::env::temp_dir);
        Self::new(&config.program, work_dir)
    }

    fn scratch_stem(&self) -> PathBuf {
        let id = REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        self.work_dir
            .join(format!("singtalk-{}-{}", std::process::id(), id))
    }
}

impl Renderer for SayEngine {
    fn render(&self, command: &str) -> Result<RenderedAudio, EngineError> {
        let stem = self.scratch_stem();
        let text_path = stem.with_extension("txt");
        let wav_path = stem.with_extension("wav");

        fs::write(&text_path, command)?;
        let result = run_say(&self.program, &text_path, &wav_path)
            .and_then(|()| RenderedAudio::read_wav(&wav_path));

        let _ = fs::remove_file(&text_path);
        let _ = fs::remove_file(&wav_path);
        result
    }
}

fn run_say(program: &Path, text_path: &Path, wav_path: &Path) -> Result<(), EngineError> {
    let status = Command::new(program)
        .arg("-w")
        .arg(wav_path)
        .stdin(File::open(text_path)?)
        .stdout(Stdio::null())
        .status()
        .map_err(|source| EngineError::Spawn { program: program.to_path_buf(), source })?;

    if !status.success() {
        return Err(EngineError::Status(status));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_preamble() {
        assert_eq!(Voice::PerfectPaul.preamble(), "[:phoneme on][:np]");
        assert_eq!(Voice::BeautifulBetty.preamble(), "[:phoneme on][:nb]");
        assert_eq!(Voice::KitTheKid.code(), 'k');
    }

    #[test]
    fn test_voice_from_name() {
        assert_eq!(Voice::from_name("huge harry"), Some(Voice::HugeHarry));
        assert_eq!(Voice::from_name("Nobody"), None);
    }

    #[test]
    fn test_wav_round_trip() {
        let path = std::env::temp_dir().join(format!("singtalk-wav-{}.wav", std::process::id()));
        let audio = RenderedAudio { sample_rate: 10_000, channels: 1, samples: vec![0, 100, -100, i16::MAX] };
        audio.write_wav(&path).unwrap();
        let back = RenderedAudio::read_wav(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(back, audio);
    }

    #[test]
    fn test_duration() {
        let audio = RenderedAudio { sample_rate: 10_000, channels: 1, samples: vec![0; 640] };
        assert_eq!(audio.duration_us(), 64_000);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let engine = SayEngine::new("/nonexistent/singtalk/say", std::env::temp_dir());
        let err = engine.render("[_<100>]").unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }), "got: {err}");
    }
}
