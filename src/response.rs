//! Time and frequency response measurement.
//!
//! A filter is driven with a synthetic probe from [`signal_probe`] and its
//! output is recorded. No recorded signal is involved.
//!
//! Frequency responses are measured point by point on a fresh filter: the
//! cosine probe runs until the filter has settled, then input and output are
//! demodulated over a window spanning an integer number of probe periods.
//! The ratio of the two phasors is the complex gain at that frequency.

use core::f64::consts::{PI, TAU};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use signal_probe::{Config, Signal, Source};

use crate::{Error, Filter, Sample};

/// Longest measurement window in samples.
pub const MAX_WINDOW: usize = 1 << 22;

/// Spacing of the sweep frequencies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    #[default]
    Linear,
    Logarithmic,
}

/// Frequency sweep.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    /// Sample rate in Hertz. Frequencies are in the same unit.
    pub sample_rate: f64,
    /// First frequency.
    pub start: f64,
    /// Last frequency, included.
    pub stop: f64,
    /// Number of frequencies.
    pub points: usize,
    pub scale: Scale,
    /// Probe peak amplitude.
    pub amplitude: Sample,
    /// Samples discarded before measuring. Defaults to the filter's
    /// [`Filter::settling_time`].
    pub settling: Option<u32>,
    /// Minimum measurement window in samples.
    pub window: u32,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            start: 0.0,
            stop: 0.45,
            points: 50,
            scale: Scale::Linear,
            amplitude: 1 << 13,
            settling: None,
            window: 4096,
        }
    }
}

impl Sweep {
    /// The nominal sweep frequencies.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        let last = self.points.saturating_sub(1).max(1) as f64;
        (0..self.points).map(move |i| {
            let t = i as f64 / last;
            match self.scale {
                Scale::Linear => self.start + (self.stop - self.start) * t,
                Scale::Logarithmic => {
                    self.start * (self.stop / self.start).powf(t)
                }
            }
        })
    }

    fn validate(&self) -> Result<(), Error> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.amplitude <= 0 {
            return Err(Error::InvalidAmplitude(self.amplitude));
        }
        if self.scale == Scale::Logarithmic {
            if let Some(f) =
                [self.start, self.stop].into_iter().find(|f| !(*f > 0.0))
            {
                return Err(Error::InvalidFrequency(f));
            }
        }
        let nyquist = self.sample_rate / 2.0;
        if let Some(f) = [self.start, self.stop]
            .into_iter()
            .chain(self.frequencies())
            .find(|f| !(0.0..nyquist).contains(f))
        {
            return Err(Error::InvalidFrequency(f));
        }
        Ok(())
    }
}

/// What to measure.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Response to a single sample of `amplitude` followed by zeros.
    Impulse { amplitude: Sample, length: usize },
    /// Response to a constant `amplitude` applied at index zero.
    Step { amplitude: Sample, length: usize },
    /// Magnitude and phase over a range of frequencies.
    Frequency(Sweep),
}

impl Default for Request {
    fn default() -> Self {
        Self::Frequency(Sweep::default())
    }
}

/// One point of a response.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSample {
    /// Complex gain at a frequency.
    Frequency {
        /// Probe frequency in units of the sample rate, after tuning word
        /// quantization.
        frequency: f64,
        /// Output over input amplitude.
        magnitude: f64,
        /// Output relative to input, radians in `(-PI, PI]`.
        phase: f64,
    },
    /// Output sample at a time.
    Time { index: usize, amplitude: Sample },
}

/// Measure the response of a filter.
///
/// # Args
/// * `factory` - Builds a zero state filter. Called once per frequency point
///   and once for time responses.
/// * `request` - What to measure.
///
/// # Returns
/// The response in order of time or of the sweep frequencies.
/// All request parameters are validated before any filter is built.
pub fn generate<F, T>(
    mut factory: F,
    request: &Request,
) -> Result<Vec<ResponseSample>, Error>
where
    F: FnMut() -> T,
    T: Filter,
{
    match request {
        Request::Impulse { amplitude, length } => {
            time_response(factory(), Signal::Impulse, *amplitude, *length)
        }
        Request::Step { amplitude, length } => {
            time_response(factory(), Signal::Step, *amplitude, *length)
        }
        Request::Frequency(sweep) => {
            sweep.validate()?;
            let probes = sweep
                .frequencies()
                .map(|f| probe(sweep, f))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(probes
                .into_iter()
                .map(|source| measure(&mut factory(), sweep, source))
                .collect())
        }
    }
}

fn time_response<T: Filter>(
    mut filter: T,
    signal: Signal,
    amplitude: Sample,
    length: usize,
) -> Result<Vec<ResponseSample>, Error> {
    if amplitude == 0 {
        return Err(Error::InvalidAmplitude(amplitude));
    }
    let source = Config {
        signal,
        amplitude,
        ..Default::default()
    }
    .build(1.0)
    .map_err(|_| Error::InvalidAmplitude(amplitude))?;
    let response: Vec<_> = source
        .take(length)
        .enumerate()
        .map(|(index, x)| ResponseSample::Time {
            index,
            amplitude: filter.next(x),
        })
        .collect();
    if filter.saturations() > 0 {
        warn!(
            "{signal:?} response saturated {} times",
            filter.saturations()
        );
    }
    Ok(response)
}

fn probe(sweep: &Sweep, frequency: f64) -> Result<Source, Error> {
    Config {
        signal: Signal::Cosine,
        frequency,
        amplitude: sweep.amplitude,
        ..Default::default()
    }
    .build(sweep.sample_rate.recip())
    .map_err(|_| Error::InvalidFrequency(frequency))
}

/// Window length covering an integer number of periods as close as the
/// sample grid allows.
fn window(frequency: f64, min: u32) -> usize {
    let min = (min as usize).clamp(1, MAX_WINDOW);
    if frequency <= 0.0 {
        return min;
    }
    let periods = (min as f64 * frequency).ceil();
    ((periods / frequency).round() as usize).clamp(min, MAX_WINDOW)
}

/// Accumulated `sum(v[n] * exp(-j w n))`.
#[derive(Copy, Clone, Debug, Default)]
struct Phasor {
    re: f64,
    im: f64,
}

impl Phasor {
    #[inline]
    fn add(&mut self, v: Sample, (cos, sin): (f64, f64)) {
        self.re += v as f64 * cos;
        self.im -= v as f64 * sin;
    }

    fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

fn measure<T: Filter>(
    filter: &mut T,
    sweep: &Sweep,
    mut source: Source,
) -> ResponseSample {
    let nu = source.frequency();
    let settling = sweep.settling.unwrap_or_else(|| filter.settling_time());
    for x in source.by_ref().take(settling as usize) {
        filter.next(x);
    }

    let n = window(nu, sweep.window);
    let (mut x, mut y) = (Phasor::default(), Phasor::default());
    for (i, xi) in source.by_ref().take(n).enumerate() {
        let yi = filter.next(xi);
        let (sin, cos) = (TAU * (nu * i as f64).fract()).sin_cos();
        x.add(xi, (cos, sin));
        y.add(yi, (cos, sin));
    }

    // H = Y / X
    let (magnitude, phase) = if x.norm_sqr() > 0.0 {
        let re = y.re * x.re + y.im * x.im;
        let im = y.im * x.re - y.re * x.im;
        let phase = im.atan2(re);
        (
            (y.norm_sqr() / x.norm_sqr()).sqrt(),
            if phase <= -PI { PI } else { phase },
        )
    } else {
        (0.0, 0.0)
    };

    let frequency = nu * sweep.sample_rate;
    debug!(
        "f = {frequency}: |H| = {magnitude}, arg(H) = {phase} \
         ({settling} settling, {n} window)"
    );
    if filter.saturations() > 0 {
        warn!(
            "f = {frequency}: saturated {} times, response not linear",
            filter.saturations()
        );
    }
    ResponseSample::Frequency {
        frequency,
        magnitude,
        phase,
    }
}
