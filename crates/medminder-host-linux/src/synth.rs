//! Sine tone synthesis

use medminder_host_api::ToneSegment;
use std::f32::consts::TAU;

/// Output sample rate in Hz
pub const SAMPLE_RATE: u32 = 44_100;

/// Linear fade at each end of a tone, to avoid clicks
const FADE_SAMPLES: usize = 441;

/// Render a tone as mono signed 16-bit little-endian PCM
pub fn synthesize(segment: &ToneSegment) -> Vec<u8> {
    let count = (segment.duration.as_secs_f64() * SAMPLE_RATE as f64).round() as usize;
    let volume = segment.volume.clamp(0.0, 1.0);
    let fade = FADE_SAMPLES.min(count / 2);

    let mut pcm = Vec::with_capacity(count * 2);
    for n in 0..count {
        let t = n as f32 / SAMPLE_RATE as f32;
        let mut amplitude = volume;
        if fade > 0 {
            if n < fade {
                amplitude *= n as f32 / fade as f32;
            } else if n >= count - fade {
                amplitude *= (count - n) as f32 / fade as f32;
            }
        }

        let sample = (TAU * segment.frequency_hz * t).sin() * amplitude * i16::MAX as f32;
        pcm.extend_from_slice(&(sample as i16).to_le_bytes());
    }
    pcm
}
