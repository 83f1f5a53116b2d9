//! Host capabilities model

use serde::{Deserialize, Serialize};

/// Whether the host can play alert sounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AudioSupport {
    Available { backend: String },
    Unavailable { reason: String },
}

/// Whether the host can vibrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HapticSupport {
    Available { device: String },
    Unsupported,
}

/// Describes what a host adapter can do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub audio: AudioSupport,
    pub haptics: HapticSupport,
}

impl HostCapabilities {
    /// No audio, no haptics
    pub fn minimal() -> Self {
        Self {
            audio: AudioSupport::Unavailable {
                reason: "no audio backend configured".into(),
            },
            haptics: HapticSupport::Unsupported,
        }
    }

    pub fn can_play_audio(&self) -> bool {
        matches!(self.audio, AudioSupport::Available { .. })
    }

    pub fn can_vibrate(&self) -> bool {
        matches!(self.haptics, HapticSupport::Available { .. })
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::minimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_capabilities() {
        let caps = HostCapabilities::minimal();
        assert!(!caps.can_play_audio());
        assert!(!caps.can_vibrate());
    }

    #[test]
    fn capabilities_are_tagged() {
        let caps = HostCapabilities {
            audio: AudioSupport::Available {
                backend: "pulseaudio".into(),
            },
            haptics: HapticSupport::Unsupported,
        };

        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json["audio"]["status"], "available");
        assert_eq!(json["audio"]["backend"], "pulseaudio");
        assert_eq!(json["haptics"]["status"], "unsupported");
        assert!(caps.can_play_audio());
    }
}
