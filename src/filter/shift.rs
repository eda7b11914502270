use super::{
    check_shift, saturate, Filter, SAMPLE_BITS, SETTLING_TIME_CONSTANTS,
};
use crate::{Error, Sample};

/// First order leaky integrator with a power of two gain.
///
/// `accu += (x - accu) >> shift`
///
/// The accumulator is 32 bit wide so that the difference `x - accu` never
/// overflows. The right shift is arithmetic: it rounds towards negative
/// infinity and no rounding bias is applied. A rising input therefore stalls
/// up to `(1 << shift) - 1` below its target while a falling input is
/// tracked exactly.
///
/// The accumulator always stays between its previous value and the input
/// and thus within the `Sample` range.
#[derive(Copy, Clone, Debug, Default)]
struct ShiftAccu {
    accu: i32,
    shift: u32,
}

impl ShiftAccu {
    fn new(shift: u8) -> Result<Self, Error> {
        Ok(Self {
            accu: 0,
            shift: check_shift(shift, SAMPLE_BITS)?,
        })
    }

    #[inline]
    fn update(&mut self, x: Sample) -> i32 {
        self.accu += (x as i32 - self.accu) >> self.shift;
        self.accu
    }

    fn settling_time(&self) -> u32 {
        // The time constant is about `1 << shift` samples.
        SETTLING_TIME_CONSTANTS << self.shift
    }
}

/// DC removal (first order highpass).
///
/// The accumulator tracks the DC level of the input and the output is the
/// residual `x - accu`, computed after the accumulator has been updated with
/// `x`. The residual can exceed the `Sample` range (e.g. a full scale step)
/// and is saturated.
#[derive(Copy, Clone, Debug)]
pub struct Offset {
    dc: ShiftAccu,
    saturations: u32,
}

impl Offset {
    /// # Args
    /// * `shift` - Smoothing of the DC estimate, `0..=15`.
    pub fn new(shift: u8) -> Result<Self, Error> {
        Ok(Self {
            dc: ShiftAccu::new(shift)?,
            saturations: 0,
        })
    }

    /// Current DC estimate.
    pub fn dc(&self) -> Sample {
        // Within range, see `ShiftAccu`.
        self.dc.accu as Sample
    }
}

impl Filter for Offset {
    #[inline]
    fn next(&mut self, x: Sample) -> Sample {
        let dc = self.dc.update(x);
        saturate(x as i64 - dc as i64, &mut self.saturations)
    }

    fn settling_time(&self) -> u32 {
        self.dc.settling_time()
    }

    fn saturations(&self) -> u32 {
        self.saturations
    }
}

/// Exponential moving average (first order lowpass).
///
/// Same recurrence as the [`Offset`] DC estimate, but the smoothed value
/// itself is the output. It never saturates.
#[derive(Copy, Clone, Debug)]
pub struct ExponentialMovingAverage {
    y: ShiftAccu,
}

impl ExponentialMovingAverage {
    /// # Args
    /// * `shift` - Averaging window `1 << shift` samples, `0..=15`.
    pub fn new(shift: u8) -> Result<Self, Error> {
        Ok(Self {
            y: ShiftAccu::new(shift)?,
        })
    }
}

impl Filter for ExponentialMovingAverage {
    #[inline]
    fn next(&mut self, x: Sample) -> Sample {
        // Within range, see `ShiftAccu`.
        self.y.update(x) as Sample
    }

    fn settling_time(&self) -> u32 {
        self.y.settling_time()
    }

    fn saturations(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(f: &mut impl Filter, x: &[Sample]) -> Vec<Sample> {
        x.iter().map(|&x| f.next(x)).collect()
    }

    #[test]
    fn ema_steps() {
        let mut f = ExponentialMovingAverage::new(2).unwrap();
        assert_eq!(run(&mut f, &[100; 4]), [25, 43, 57, 67]);
    }

    #[test]
    fn ema_negative_floor() {
        // (-100 - 0) >> 2 == -25, (-100 + 25) >> 2 == -19 (floor of -18.75)
        let mut f = ExponentialMovingAverage::new(2).unwrap();
        assert_eq!(run(&mut f, &[-100; 3]), [-25, -44, -58]);
    }

    #[test]
    fn ema_shift_zero_is_identity() {
        let mut f = ExponentialMovingAverage::new(0).unwrap();
        let x = [1, -7, Sample::MAX, Sample::MIN, 0];
        assert_eq!(run(&mut f, &x), x);
    }

    #[test]
    fn ema_rising_dead_band() {
        let shift = 4;
        let mut f = ExponentialMovingAverage::new(shift).unwrap();
        let y = *run(&mut f, &[1000; 2000]).last().unwrap();
        assert!((1000 - (1 << shift) + 1..=1000).contains(&y), "{y}");
    }

    #[test]
    fn ema_falling_exact() {
        let mut f = ExponentialMovingAverage::new(4).unwrap();
        run(&mut f, &[1000; 2000]);
        let y = *run(&mut f, &[-1000; 2000]).last().unwrap();
        assert_eq!(y, -1000);
    }

    #[test]
    fn ema_full_scale_swing() {
        let mut f = ExponentialMovingAverage::new(1).unwrap();
        let x: Vec<_> = (0..64)
            .map(|i| if i % 2 == 0 { Sample::MAX } else { Sample::MIN })
            .collect();
        for y in run(&mut f, &x) {
            assert!((Sample::MIN..=Sample::MAX).contains(&y));
        }
        assert_eq!(f.saturations(), 0);
    }

    #[test]
    fn offset_steps() {
        // accu: 25, 43, 57, 67; output x - accu
        let mut f = Offset::new(2).unwrap();
        assert_eq!(run(&mut f, &[100; 4]), [75, 57, 43, 33]);
        assert_eq!(f.dc(), 67);
    }

    #[test]
    fn offset_shift_zero_removes_everything() {
        let mut f = Offset::new(0).unwrap();
        assert_eq!(run(&mut f, &[5, -9, 300]), [0, 0, 0]);
    }

    #[test]
    fn offset_saturates_full_scale_step() {
        let mut f = Offset::new(15).unwrap();
        run(&mut f, &[Sample::MIN; 1 << 19]);
        assert_eq!(f.dc(), Sample::MIN);
        assert_eq!(f.next(Sample::MAX), Sample::MAX);
        assert_eq!(f.saturations(), 1);
    }

    #[test]
    fn undefined_shift() {
        assert_eq!(
            Offset::new(16).unwrap_err(),
            Error::UndefinedShift {
                shift: 16,
                width: 16
            }
        );
        assert!(ExponentialMovingAverage::new(16).is_err());
        assert!(ExponentialMovingAverage::new(15).is_ok());
    }

    #[test]
    fn settling() {
        assert_eq!(Offset::new(0).unwrap().settling_time(), 12);
        assert_eq!(
            ExponentialMovingAverage::new(4).unwrap().settling_time(),
            12 * 16
        );
    }
}
