//! Haptic feedback trait interfaces

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::HapticSupport;

/// Errors from haptic operations
#[derive(Debug, Error)]
pub enum HapticError {
    #[error("Haptic device error: {0}")]
    Device(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HapticResult<T> = Result<T, HapticError>;

/// Alternating vibrate/pause durations, starting with a vibration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationPattern(pub Vec<Duration>);

impl VibrationPattern {
    /// Played when a dose becomes due
    pub fn dose_due() -> Self {
        Self(vec![
            Duration::from_millis(200),
            Duration::from_millis(100),
            Duration::from_millis(200),
        ])
    }

    /// Played when a dose is marked taken
    pub fn dose_taken() -> Self {
        Self(vec![Duration::from_millis(50)])
    }
}

/// Haptic feedback trait - implemented by platform-specific adapters.
///
/// Hosts without a vibration device use `NoHaptics`; callers never need to
/// check support before vibrating.
#[async_trait]
pub trait HapticFeedback: Send + Sync {
    fn support(&self) -> HapticSupport;

    async fn vibrate(&self, pattern: &VibrationPattern) -> HapticResult<()>;
}

/// Haptics for hosts without a vibration device
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

#[async_trait]
impl HapticFeedback for NoHaptics {
    fn support(&self) -> HapticSupport {
        HapticSupport::Unsupported
    }

    async fn vibrate(&self, _pattern: &VibrationPattern) -> HapticResult<()> {
        Ok(())
    }
}
