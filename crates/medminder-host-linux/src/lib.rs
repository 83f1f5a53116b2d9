//! Linux host adapter for medminderd
//!
//! Provides:
//! - Sine tone synthesis to raw PCM
//! - Playback through `paplay` (PulseAudio/PipeWire) or `aplay` (ALSA)
//! - Host capability detection

mod backend;
mod output;
mod synth;

pub use backend::*;
pub use output::*;
pub use synth::*;

use medminder_host_api::{
    AudioError, AudioFactory, AudioOutput, AudioResult, AudioSupport, HapticSupport,
    HostCapabilities,
};
use std::sync::Arc;

/// Linux host, as probed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinuxHost {
    backend: Option<SoundBackend>,
}

impl LinuxHost {
    /// Probe the host. Spawns the backend detection commands and blocks on
    /// them, so call once at startup off the async workers.
    pub fn probe() -> Self {
        Self::with_backend(SoundBackend::detect())
    }

    pub fn with_backend(backend: Option<SoundBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Option<SoundBackend> {
        self.backend
    }

    pub fn capabilities(&self) -> HostCapabilities {
        let audio = match self.backend {
            Some(backend) => AudioSupport::Available {
                backend: backend.name().to_string(),
            },
            None => AudioSupport::Unavailable {
                reason: "neither paplay nor aplay is usable".into(),
            },
        };

        HostCapabilities {
            audio,
            haptics: HapticSupport::Unsupported,
        }
    }

    /// Audio output factory over the probed backend. Spawns nothing.
    pub fn audio_factory(&self) -> AudioFactory {
        let backend = self.backend;
        Box::new(move || -> AudioResult<Arc<dyn AudioOutput>> {
            let backend = backend
                .ok_or_else(|| AudioError::NotAvailable("No sound backend available".into()))?;
            Ok(Arc::new(LinuxAudioOutput::with_backend(backend)) as Arc<dyn AudioOutput>)
        })
    }
}
