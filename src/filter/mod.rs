//! Stateful fixed-point filters.
//!
//! Every filter consumes one [`Sample`] and produces one [`Sample`] per call to
//! [`Filter::next`]. All arithmetic is integer. Where a result does not fit a
//! `Sample` it is saturated and the event is counted, never wrapped.

use crate::{Error, Sample};

mod abs;
pub use abs::*;
mod biquad;
pub use biquad::*;
mod pass;
pub use pass::*;
mod shift;
pub use shift::*;

/// Width of the native sample in bits.
pub const SAMPLE_BITS: u32 = Sample::BITS;

/// Number of time constants a transient is given to decay.
/// `exp(-12)` is below one LSB of a full scale 16 bit sample.
pub(crate) const SETTLING_TIME_CONSTANTS: u32 = 12;

/// Upper bound for any settling time estimate.
pub const MAX_SETTLING_TIME: u32 = 1 << 20;

/// Sample-by-sample filter.
pub trait Filter {
    /// Feed a new input sample into the filter, update the filter state, and
    /// return the new output.
    fn next(&mut self, x: Sample) -> Sample;

    /// Number of samples after which the response to a step or a sinusoid
    /// starting from zero state has settled.
    fn settling_time(&self) -> u32;

    /// Number of samples where the output or an intermediate was saturated.
    fn saturations(&self) -> u32;

    /// Filter a block of samples in place.
    fn process(&mut self, samples: &mut [Sample]) {
        for sample in samples.iter_mut() {
            *sample = self.next(*sample);
        }
    }
}

/// A built filter of any kind.
#[derive(Clone, Debug)]
pub enum FilterInstance {
    Offset(Offset),
    ExponentialMovingAverage(ExponentialMovingAverage),
    Biquad(Biquad),
    Abs(Abs),
    Pass(Pass),
}

impl Filter for FilterInstance {
    #[inline]
    fn next(&mut self, x: Sample) -> Sample {
        match self {
            Self::Offset(f) => f.next(x),
            Self::ExponentialMovingAverage(f) => f.next(x),
            Self::Biquad(f) => f.next(x),
            Self::Abs(f) => f.next(x),
            Self::Pass(f) => f.next(x),
        }
    }

    fn settling_time(&self) -> u32 {
        match self {
            Self::Offset(f) => f.settling_time(),
            Self::ExponentialMovingAverage(f) => f.settling_time(),
            Self::Biquad(f) => f.settling_time(),
            Self::Abs(f) => f.settling_time(),
            Self::Pass(f) => f.settling_time(),
        }
    }

    fn saturations(&self) -> u32 {
        match self {
            Self::Offset(f) => f.saturations(),
            Self::ExponentialMovingAverage(f) => f.saturations(),
            Self::Biquad(f) => f.saturations(),
            Self::Abs(f) => f.saturations(),
            Self::Pass(f) => f.saturations(),
        }
    }
}

impl From<Offset> for FilterInstance {
    fn from(f: Offset) -> Self {
        Self::Offset(f)
    }
}

impl From<ExponentialMovingAverage> for FilterInstance {
    fn from(f: ExponentialMovingAverage) -> Self {
        Self::ExponentialMovingAverage(f)
    }
}

impl From<Biquad> for FilterInstance {
    fn from(f: Biquad) -> Self {
        Self::Biquad(f)
    }
}

impl From<Abs> for FilterInstance {
    fn from(f: Abs) -> Self {
        Self::Abs(f)
    }
}

impl From<Pass> for FilterInstance {
    fn from(f: Pass) -> Self {
        Self::Pass(f)
    }
}

/// Reject shifts that are not smaller than the operand width.
pub(crate) fn check_shift(shift: u8, width: u32) -> Result<u32, Error> {
    let s = shift as u32;
    if s < width {
        Ok(s)
    } else {
        Err(Error::UndefinedShift { shift, width })
    }
}

/// Narrow to a sample, saturating and counting.
#[inline]
pub(crate) fn saturate(y: i64, saturations: &mut u32) -> Sample {
    match Sample::try_from(y) {
        Ok(y) => y,
        Err(_) => {
            *saturations = saturations.saturating_add(1);
            if y < 0 {
                Sample::MIN
            } else {
                Sample::MAX
            }
        }
    }
}

/// Narrow to a 32 bit register, saturating and counting.
#[inline]
pub(crate) fn saturate_wide(y: i64, saturations: &mut u32) -> i32 {
    match i32::try_from(y) {
        Ok(y) => y,
        Err(_) => {
            *saturations = saturations.saturating_add(1);
            if y < 0 {
                i32::MIN
            } else {
                i32::MAX
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shift_range() {
        assert_eq!(check_shift(0, 16), Ok(0));
        assert_eq!(check_shift(15, 16), Ok(15));
        assert_eq!(
            check_shift(16, 16),
            Err(Error::UndefinedShift {
                shift: 16,
                width: 16
            })
        );
        assert!(check_shift(u8::MAX, 16).is_err());
    }

    #[test]
    fn saturate_counts() {
        let mut n = 0;
        assert_eq!(saturate(-5, &mut n), -5);
        assert_eq!(saturate(32767, &mut n), 32767);
        assert_eq!(n, 0);
        assert_eq!(saturate(32768, &mut n), i16::MAX);
        assert_eq!(saturate(-32769, &mut n), i16::MIN);
        assert_eq!(n, 2);
        assert_eq!(saturate_wide(1 << 40, &mut n), i32::MAX);
        assert_eq!(saturate_wide(-(1 << 31), &mut n), i32::MIN);
        assert_eq!(n, 3);
    }

    #[test]
    fn process_block() {
        let mut f = FilterInstance::from(Abs::default());
        let mut x = [-3, 2, i16::MIN, 0];
        f.process(&mut x);
        assert_eq!(x, [3, 2, i16::MAX, 0]);
        assert_eq!(f.saturations(), 1);
    }
}
