//! Mock audio and haptics for testing

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::{
    AudioError, AudioOutput, AudioResult, HapticFeedback, HapticResult, HapticSupport,
    ToneSegment, VibrationPattern,
};

/// Mock audio output that records every tone instead of playing it
#[derive(Clone, Default)]
pub struct MockAudio {
    played: Arc<Mutex<Vec<ToneSegment>>>,

    /// Fail once this many tones have played (`Some(0)` fails immediately)
    fail_after: Arc<Mutex<Option<usize>>>,
}

impl MockAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure playback to fail after `tones` successful tones
    pub fn fail_after(&self, tones: usize) {
        *self.fail_after.lock().unwrap() = Some(tones);
    }

    /// Configure every tone to fail
    pub fn fail_all(&self) {
        self.fail_after(0);
    }

    pub fn tones_played(&self) -> usize {
        self.played.lock().unwrap().len()
    }

    pub fn played_segments(&self) -> Vec<ToneSegment> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioOutput for MockAudio {
    fn backend_name(&self) -> &str {
        "mock"
    }

    async fn play_tone(&self, segment: &ToneSegment) -> AudioResult<()> {
        let mut played = self.played.lock().unwrap();
        if let Some(limit) = *self.fail_after.lock().unwrap()
            && played.len() >= limit
        {
            return Err(AudioError::Backend("Mock playback failure".into()));
        }
        played.push(*segment);
        Ok(())
    }
}

/// Mock haptics that records every pattern
#[derive(Clone, Default)]
pub struct MockHaptics {
    patterns: Arc<Mutex<Vec<VibrationPattern>>>,
}

impl MockHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> Vec<VibrationPattern> {
        self.patterns.lock().unwrap().clone()
    }
}

#[async_trait]
impl HapticFeedback for MockHaptics {
    fn support(&self) -> HapticSupport {
        HapticSupport::Available {
            device: "mock".into(),
        }
    }

    async fn vibrate(&self, pattern: &VibrationPattern) -> HapticResult<()> {
        self.patterns.lock().unwrap().push(pattern.clone());
        Ok(())
    }
}
