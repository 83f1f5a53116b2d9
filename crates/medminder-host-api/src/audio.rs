//! Audio alert trait interfaces
//!
//! Alerts are short sequences of pure tones. Platform adapters only need to
//! render a single tone; sequencing, pauses and failure handling live here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from audio operations
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio not available: {0}")]
    NotAvailable(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Audio handle has been disposed")]
    Disposed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AudioResult<T> = Result<T, AudioError>;

/// One tone in an alert pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSegment {
    pub frequency_hz: f32,
    pub duration: Duration,
    /// Linear gain, 0.0 to 1.0
    pub volume: f32,
}

impl ToneSegment {
    pub const fn new(frequency_hz: f32, duration_ms: u64, volume: f32) -> Self {
        Self {
            frequency_hz,
            duration: Duration::from_millis(duration_ms),
            volume,
        }
    }
}

/// The alert sounds the service knows how to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSound {
    /// A dose became due
    Alarm,
    /// A dose was marked taken
    Success,
    /// Soft reminder
    Gentle,
}

/// An ordered sequence of tones played back-to-back with a fixed pause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonePattern {
    pub segments: Vec<ToneSegment>,
    pub pause: Duration,
}

impl TonePattern {
    /// Three urgent beeps, repeated twice
    pub fn alarm() -> Self {
        let beep = ToneSegment::new(880.0, 200, 0.6);
        let low = ToneSegment::new(660.0, 200, 0.6);
        Self {
            segments: vec![beep, low, beep, beep, low, beep],
            pause: Duration::from_millis(100),
        }
    }

    /// Rising major arpeggio
    pub fn success() -> Self {
        Self {
            segments: vec![
                ToneSegment::new(523.25, 120, 0.4),
                ToneSegment::new(659.25, 120, 0.4),
                ToneSegment::new(783.99, 220, 0.4),
            ],
            pause: Duration::from_millis(40),
        }
    }

    /// Two soft low tones
    pub fn gentle() -> Self {
        Self {
            segments: vec![
                ToneSegment::new(440.0, 300, 0.25),
                ToneSegment::new(523.25, 400, 0.2),
            ],
            pause: Duration::from_millis(150),
        }
    }

    pub fn for_sound(sound: AlertSound) -> Self {
        match sound {
            AlertSound::Alarm => Self::alarm(),
            AlertSound::Success => Self::success(),
            AlertSound::Gentle => Self::gentle(),
        }
    }

    /// Total playback time including pauses
    pub fn total_duration(&self) -> Duration {
        let tones: Duration = self.segments.iter().map(|s| s.duration).sum();
        let gaps = self.pause * self.segments.len().saturating_sub(1) as u32;
        tones + gaps
    }
}

/// Audio output trait - implemented by platform-specific adapters
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Name of the backend in use (for logs and health)
    fn backend_name(&self) -> &str;

    /// Render a single tone, returning once it has finished playing
    async fn play_tone(&self, segment: &ToneSegment) -> AudioResult<()>;

    /// Play every segment in order. Stops at the first failing segment.
    async fn play_pattern(&self, pattern: &TonePattern) -> AudioResult<()> {
        for (i, segment) in pattern.segments.iter().enumerate() {
            if i > 0 && !pattern.pause.is_zero() {
                tokio::time::sleep(pattern.pause).await;
            }
            self.play_tone(segment).await?;
        }
        Ok(())
    }

    async fn play_alarm_pattern(&self) -> AudioResult<()> {
        self.play_pattern(&TonePattern::alarm()).await
    }

    async fn play_success_pattern(&self) -> AudioResult<()> {
        self.play_pattern(&TonePattern::success()).await
    }

    async fn play_gentle_pattern(&self) -> AudioResult<()> {
        self.play_pattern(&TonePattern::gentle()).await
    }
}

/// Constructs the platform audio output on first use.
///
/// Runs under the handle's lock on an async worker, so it must not block.
pub type AudioFactory = Box<dyn Fn() -> AudioResult<Arc<dyn AudioOutput>> + Send + Sync>;

enum HandleState {
    Uninitialized,
    Ready(Arc<dyn AudioOutput>),
    Disposed,
}

/// Owned, lazily-initialized audio resource.
///
/// The output is created on the first `get()` and released by `dispose()`.
/// A failed creation leaves the handle uninitialized so a later alert can
/// retry; once disposed every `get()` fails with `AudioError::Disposed`.
pub struct AudioHandle {
    factory: AudioFactory,
    state: Mutex<HandleState>,
}

impl AudioHandle {
    pub fn new(factory: AudioFactory) -> Self {
        Self {
            factory,
            state: Mutex::new(HandleState::Uninitialized),
        }
    }

    /// Wrap an already-constructed output
    pub fn from_output(output: Arc<dyn AudioOutput>) -> Self {
        Self::new(Box::new(move || Ok(output.clone())))
    }

    /// Get the output, creating it if this is the first use
    pub fn get(&self) -> AudioResult<Arc<dyn AudioOutput>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            HandleState::Ready(output) => Ok(output.clone()),
            HandleState::Disposed => Err(AudioError::Disposed),
            HandleState::Uninitialized => {
                let output = (self.factory)()?;
                info!(backend = output.backend_name(), "Audio output initialized");
                *state = HandleState::Ready(output.clone());
                Ok(output)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            HandleState::Ready(_)
        )
    }

    /// Release the output. In-flight playbacks keep their own reference and
    /// finish normally.
    pub fn dispose(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, HandleState::Ready(_)) {
            debug!("Audio output disposed");
        }
        *state = HandleState::Disposed;
    }

    /// Play one of the alert sounds
    pub async fn play(&self, sound: AlertSound) -> AudioResult<()> {
        let output = self.get()?;
        match sound {
            AlertSound::Alarm => output.play_alarm_pattern().await,
            AlertSound::Success => output.play_success_pattern().await,
            AlertSound::Gentle => output.play_gentle_pattern().await,
        }
    }
}
