//! Audio output through an external PCM player

use async_trait::async_trait;
use medminder_host_api::{AudioError, AudioOutput, AudioResult, ToneSegment};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::{synthesize, SoundBackend};

/// Plays synthesized tones by piping raw PCM into `paplay` or `aplay`
pub struct LinuxAudioOutput {
    backend: SoundBackend,
}

impl LinuxAudioOutput {
    pub fn with_backend(backend: SoundBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> SoundBackend {
        self.backend
    }
}

#[async_trait]
impl AudioOutput for LinuxAudioOutput {
    fn backend_name(&self) -> &str {
        self.backend.name()
    }

    async fn play_tone(&self, segment: &ToneSegment) -> AudioResult<()> {
        let pcm = synthesize(segment);
        if pcm.is_empty() {
            return Ok(());
        }

        let mut child = Command::new(self.backend.program())
            .args(self.backend.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        debug!(
            program = self.backend.program(),
            hz = segment.frequency_hz,
            bytes = pcm.len(),
            "Playing tone"
        );

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&pcm).await?;
            // Closing stdin signals end of stream
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioError::Backend(format!(
                "{} exited with {}: {}",
                self.backend.program(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
