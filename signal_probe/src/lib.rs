#![no_std]

use rand_core::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

/// Types of probe signals that can be generated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Signal {
    /// One sample at full amplitude followed by zeros.
    Impulse,
    /// Constant full amplitude from the first sample on.
    Step,
    #[default]
    Cosine,
    /// Uniformly distributed samples in `[-amplitude, amplitude)`.
    WhiteNoise,
}

/// Basic configuration for a probe signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The signal type that should be generated. See [Signal] variants.
    pub signal: Signal,

    /// The frequency of the cosine in Hertz.
    pub frequency: f64,

    /// Peak amplitude in sample units. Signed for impulses and steps,
    /// non-negative otherwise.
    pub amplitude: i16,

    /// The initial phase of the cosine in turns, `[0, 1)`.
    pub phase: f64,

    /// Number of samples, 0 for infinite
    pub length: u32,

    /// White noise: generator seed
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signal: Signal::Cosine,
            frequency: 0.0,
            amplitude: 1 << 13,
            phase: 0.0,
            length: 0,
            seed: 0,
        }
    }
}

/// Represents the errors that can occur when attempting to configure a probe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The provided amplitude is negative for a cosine or noise probe.
    #[error("Invalid amplitude")]
    Amplitude,
    /// The provided frequency is outside the first Nyquist zone.
    #[error("Invalid frequency")]
    Frequency,
    /// The provided phase is outside one turn.
    #[error("Invalid phase")]
    Phase,
}

/// 32 bit wrapping phase accumulator.
#[derive(Clone, Debug)]
struct Accu {
    ftw: u32,
    state: u32,
}

impl Accu {
    #[inline]
    fn tick(&mut self) -> i32 {
        let s = self.state;
        self.state = self.state.wrapping_add(self.ftw);
        s as i32
    }
}

#[derive(Clone, Debug)]
enum Waveform {
    Impulse { amplitude: i16, fired: bool },
    Step { amplitude: i16 },
    Cosine { accu: Accu, amplitude: i16 },
    WhiteNoise { rng: XorShiftRng, amplitude: i16 },
}

/// A configured probe. Yields `length` samples, or forever for length 0.
#[derive(Clone, Debug)]
pub struct Source {
    waveform: Waveform,
    remaining: Option<u32>,
}

impl Source {
    /// Frequency actually generated, in cycles per sample.
    ///
    /// This is the tuning word quantized frequency and zero for the
    /// non-periodic signals.
    pub fn frequency(&self) -> f64 {
        match &self.waveform {
            Waveform::Cosine { accu, .. } => accu.ftw as f64 / TURN,
            _ => 0.0,
        }
    }
}

impl Iterator for Source {
    type Item = i16;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(count) = self.remaining.as_mut() {
            *count = count.checked_sub(1)?;
        }
        Some(match &mut self.waveform {
            Waveform::Impulse { amplitude, fired } => {
                if *fired {
                    0
                } else {
                    *fired = true;
                    *amplitude
                }
            }
            Waveform::Step { amplitude } => *amplitude,
            Waveform::Cosine { accu, amplitude } => {
                scale(idsp::cossin(accu.tick()).0, *amplitude)
            }
            Waveform::WhiteNoise { rng, amplitude } => {
                scale(rng.next_u32() as i32, *amplitude)
            }
        })
    }
}

const TURN: f64 = (1u64 << 32) as _;

/// Scale a full range value to the amplitude. Rounds towards negative infinity.
#[inline]
fn scale(x: i32, amplitude: i16) -> i16 {
    ((x as i64 * amplitude as i64) >> 31) as i16
}

impl Config {
    /// Build the probe.
    ///
    /// # Args
    /// * `period` - Sample period in seconds (1 for frequencies in cycles per
    ///   sample).
    pub fn build(&self, period: f64) -> Result<Source, Error> {
        if self.amplitude < 0
            && matches!(self.signal, Signal::Cosine | Signal::WhiteNoise)
        {
            return Err(Error::Amplitude);
        }

        let waveform = match self.signal {
            Signal::Impulse => Waveform::Impulse {
                amplitude: self.amplitude,
                fired: false,
            },
            Signal::Step => Waveform::Step {
                amplitude: self.amplitude,
            },
            Signal::Cosine => {
                const NYQUIST: f64 = (1u32 << 31) as _;
                let ftw = self.frequency * period * TURN;
                if !(0.0..NYQUIST).contains(&ftw) {
                    return Err(Error::Frequency);
                }
                // Nearest tuning word, must stay below Nyquist.
                let ftw = (ftw + 0.5) as u32;
                if ftw >= 1 << 31 {
                    return Err(Error::Frequency);
                }
                if !(0.0..1.0).contains(&self.phase) {
                    return Err(Error::Phase);
                }
                Waveform::Cosine {
                    accu: Accu {
                        ftw,
                        state: (self.phase * TURN) as u32,
                    },
                    amplitude: self.amplitude,
                }
            }
            Signal::WhiteNoise => Waveform::WhiteNoise {
                rng: XorShiftRng::seed_from_u64(self.seed),
                amplitude: self.amplitude,
            },
        };

        Ok(Source {
            waveform,
            remaining: (self.length != 0).then_some(self.length),
        })
    }
}
