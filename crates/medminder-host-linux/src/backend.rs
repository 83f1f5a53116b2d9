//! Sound backend detection

use std::process::{Command, Stdio};
use tracing::{info, warn};

use crate::SAMPLE_RATE;

/// Detected playback backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundBackend {
    /// PulseAudio, or PipeWire through its Pulse compatibility layer
    PulseAudio,
    /// ALSA (direct)
    Alsa,
}

impl SoundBackend {
    /// Detect the best available sound backend
    pub fn detect() -> Option<Self> {
        if Self::is_pulseaudio_available() {
            info!("Detected PulseAudio sound backend");
            return Some(Self::PulseAudio);
        }

        if Self::is_alsa_available() {
            info!("Detected ALSA sound backend");
            return Some(Self::Alsa);
        }

        warn!("No sound backend detected");
        None
    }

    fn is_pulseaudio_available() -> bool {
        // paplay needs a running server; pactl info checks for one
        command_succeeds("pactl", &["info"]) && command_exists("paplay")
    }

    fn is_alsa_available() -> bool {
        command_succeeds("aplay", &["-l"])
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PulseAudio => "pulseaudio",
            Self::Alsa => "alsa",
        }
    }

    /// Program that accepts raw mono s16le PCM on stdin
    pub fn program(&self) -> &'static str {
        match self {
            Self::PulseAudio => "paplay",
            Self::Alsa => "aplay",
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::PulseAudio => vec![
                "--raw".into(),
                "--format=s16le".into(),
                format!("--rate={}", SAMPLE_RATE),
                "--channels=1".into(),
            ],
            Self::Alsa => vec![
                "-q".into(),
                "-f".into(),
                "S16_LE".into(),
                "-r".into(),
                SAMPLE_RATE.to_string(),
                "-c".into(),
                "1".into(),
                "-t".into(),
                "raw".into(),
            ],
        }
    }
}

fn command_succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn command_exists(program: &str) -> bool {
    // --version is cheap and does not touch the sound server
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}
