//! Fire-and-forget alert playback

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{AlertSound, AudioHandle, HapticFeedback, NoHaptics, VibrationPattern};

/// Plays alert sounds and vibrations without blocking the caller.
///
/// Playback failures are logged and swallowed; they never reach the
/// scheduling loop.
#[derive(Clone)]
pub struct AlertPlayer {
    audio: Arc<AudioHandle>,
    haptics: Arc<dyn HapticFeedback>,
}

impl AlertPlayer {
    pub fn new(audio: Arc<AudioHandle>, haptics: Arc<dyn HapticFeedback>) -> Self {
        Self { audio, haptics }
    }

    pub fn audio_only(audio: Arc<AudioHandle>) -> Self {
        Self::new(audio, Arc::new(NoHaptics))
    }

    pub fn audio(&self) -> &Arc<AudioHandle> {
        &self.audio
    }

    /// Start playing `sound` in the background
    pub fn play(&self, sound: AlertSound) -> JoinHandle<()> {
        let audio = self.audio.clone();
        tokio::spawn(async move {
            match audio.play(sound).await {
                Ok(()) => debug!(?sound, "Alert played"),
                Err(e) => warn!(?sound, error = %e, "Alert playback failed"),
            }
        })
    }

    /// Start a vibration in the background
    pub fn vibrate(&self, pattern: VibrationPattern) -> JoinHandle<()> {
        let haptics = self.haptics.clone();
        tokio::spawn(async move {
            if let Err(e) = haptics.vibrate(&pattern).await {
                warn!(error = %e, "Vibration failed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioOutput, MockAudio, MockHaptics, TonePattern};

    #[tokio::test]
    async fn play_runs_in_background() {
        let audio = MockAudio::new();
        let player = AlertPlayer::audio_only(Arc::new(AudioHandle::from_output(Arc::new(
            audio.clone(),
        ))));

        player.play(AlertSound::Success).await.unwrap();

        assert_eq!(audio.tones_played(), TonePattern::success().segments.len());
    }

    #[tokio::test]
    async fn playback_failure_is_swallowed() {
        let audio = MockAudio::new();
        audio.fail_all();
        let player = AlertPlayer::audio_only(Arc::new(AudioHandle::from_output(Arc::new(
            audio.clone(),
        ))));

        // The task completes normally even though playback failed
        assert!(player.play(AlertSound::Alarm).await.is_ok());
    }

    #[tokio::test]
    async fn disposed_audio_is_swallowed() {
        let handle = Arc::new(AudioHandle::from_output(
            Arc::new(MockAudio::new()) as Arc<dyn AudioOutput>
        ));
        handle.dispose();
        let player = AlertPlayer::audio_only(handle);

        assert!(player.play(AlertSound::Alarm).await.is_ok());
    }

    #[tokio::test]
    async fn vibrate_uses_haptics() {
        let haptics = MockHaptics::new();
        let player = AlertPlayer::new(
            Arc::new(AudioHandle::from_output(Arc::new(MockAudio::new()))),
            Arc::new(haptics.clone()),
        );

        player.vibrate(VibrationPattern::dose_due()).await.unwrap();
        assert_eq!(haptics.patterns(), vec![VibrationPattern::dose_due()]);
    }
}
