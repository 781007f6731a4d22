//! Procedural sound effects as plain sample buffers.
//!
//! Each generator is a stateless function from a duration to `f32` samples
//! in [-1, 1]. Playback goes through [`AudioSink`]; the hub installs a
//! no-op sink, so synthesis stays fire-and-forget and never blocks a tick.

use log::debug;
use rand::Rng;

pub const SAMPLE_RATE: u32 = 44_100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

fn sample(wave: Wave, phase: f32) -> f32 {
    use std::f32::consts::TAU;
    let t = phase.fract();
    match wave {
        Wave::Sine => (t * TAU).sin(),
        Wave::Square => {
            if t < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Wave::Sawtooth => 2.0 * t - 1.0,
        Wave::Triangle => 4.0 * (t - 0.5).abs() - 1.0,
    }
}

/// White noise under a linear decay envelope; the pop/crunch staple.
pub fn noise_burst(rng: &mut impl Rng, duration_secs: f32, volume: f32) -> Vec<f32> {
    let len = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..len)
        .map(|i| {
            let envelope = 1.0 - i as f32 / len as f32;
            let noise: f32 = rng.gen_range(-1.0..1.0);
            noise * envelope * volume
        })
        .collect()
}

/// Fixed-pitch tone with a linear fade-out.
pub fn tone(wave: Wave, freq_hz: f32, duration_secs: f32, volume: f32) -> Vec<f32> {
    let len = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..len)
        .map(|i| {
            let phase = freq_hz * i as f32 / SAMPLE_RATE as f32;
            let envelope = 1.0 - i as f32 / len as f32;
            sample(wave, phase) * envelope * volume
        })
        .collect()
}

/// Tone whose pitch ramps linearly from `f0` to `f1`.
pub fn sweep(wave: Wave, f0: f32, f1: f32, duration_secs: f32, volume: f32) -> Vec<f32> {
    let len = (SAMPLE_RATE as f32 * duration_secs) as usize;
    let mut phase = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / len as f32;
            let freq = f0 + (f1 - f0) * t;
            phase += freq / SAMPLE_RATE as f32;
            let envelope = 1.0 - t;
            sample(wave, phase) * envelope * volume
        })
        .collect()
}

/// Output-device seam. Real playback is out of scope; the default sink
/// only records that a buffer would have been played.
pub trait AudioSink {
    fn play(&mut self, samples: &[f32]);
}

#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, samples: &[f32]) {
        debug!("audio: dropping {} samples", samples.len());
    }
}
