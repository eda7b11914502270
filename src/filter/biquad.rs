use super::{
    check_shift, saturate, saturate_wide, Filter, MAX_SETTLING_TIME,
    SAMPLE_BITS, SETTLING_TIME_CONSTANTS,
};
use crate::{BiquadParameter, Error, Sample};

/// Arithmetic right shift with a half-up rounding bias.
#[inline]
fn shr_round(x: i64, shift: u32) -> i64 {
    (x + ((1i64 << shift) >> 1)) >> shift
}

/// Multiply-accumulate `x` and `a` with a 64 bit accumulator, then shift
/// right by `shift` with a half-up rounding bias.
#[inline]
fn macc(x: &[i32; 5], a: &[i32; 5], shift: u32) -> i64 {
    let y = x
        .iter()
        .zip(a)
        .map(|(x, a)| *x as i64 * *a as i64)
        .fold(0, |y, xa| y + xa);
    shr_round(y, shift)
}

fn unsupported(field: &'static str, value: i32) -> Error {
    Error::UnsupportedSection { field, value }
}

/// Integer biquad IIR section, direct form I.
///
/// ```text
/// u0 = (gain*x0 + bias) >> shift_gain
/// w0 = (b0*u0 + b1*u1 + b2*u2 - a1*w1 - a2*w2 + bias) >> shift
/// y0 = (w0 + bias) >> shift_return
/// ```
///
/// Coefficients are signed 16 bit with `shift` fractional bits, `a0 = 1`.
/// The section register `u`, `w` is 32 bit with `shift_return` fractional
/// bits. Products are exact and sums are accumulated in 64 bits. Every
/// shift rounds half up (`1 << (shift - 1)`, zero for a shift of zero). `w0`
/// is saturated to 32 bits and held in the delay registers, `y0` is
/// saturated to a `Sample`.
///
/// With the defaults (`gain = 1`, `shift_gain = shift_return = 0`) this is
/// the plain section `y = w`.
#[derive(Copy, Clone, Debug)]
pub struct Biquad {
    /// `[b0, b1, b2, -a1, -a2]`
    ba: [i32; 5],
    shift: u32,
    gain: i32,
    shift_gain: u32,
    shift_return: u32,
    /// `[u0, u1, w0, w1, w2]` between updates, see `next()`.
    xy: [i32; 5],
    saturations: u32,
}

impl Biquad {
    pub fn new(p: &BiquadParameter) -> Result<Self, Error> {
        let shift = check_shift(p.shift, SAMPLE_BITS)?;
        if let Some(a) = p.shift_a.filter(|&a| a != p.shift) {
            return Err(unsupported("shift_a", a as i32));
        }
        if let Some(a0) = p.a0.filter(|&a0| a0 as i32 != 1 << shift) {
            return Err(unsupported("a0", a0 as i32));
        }
        if let Some(za) = p.shift_za.filter(|&za| za != 0) {
            return Err(unsupported("shift_za", za as i32));
        }
        Ok(Self {
            ba: [
                p.b0 as i32,
                p.b1 as i32,
                p.b2 as i32,
                -(p.a1 as i32),
                -(p.a2 as i32),
            ],
            shift,
            gain: p.gain as i32,
            shift_gain: check_shift(p.shift_gain, i32::BITS)?,
            shift_return: check_shift(p.shift_return, i32::BITS)?,
            xy: [0; 5],
            saturations: 0,
        })
    }

    /// Largest pole radius.
    fn pole_radius(&self) -> f64 {
        let scale = (1u32 << self.shift) as f64;
        // z^2 + a1 z + a2
        let a1 = -self.ba[3] as f64 / scale;
        let a2 = -self.ba[4] as f64 / scale;
        let d = a1 * a1 - 4. * a2;
        if d >= 0. {
            let d = d.sqrt();
            ((-a1 + d) / 2.).abs().max(((-a1 - d) / 2.).abs())
        } else {
            a2.sqrt()
        }
    }
}

impl Filter for Biquad {
    #[inline]
    fn next(&mut self, x0: Sample) -> Sample {
        let n = self.ba.len();
        let mut saturations = 0;
        // `xy` contains       u0 u1 w0 w1 w2
        // Increment time      u1 u2 w1 w2 w3
        // Shift               u1 u1 u2 w1 w2
        self.xy.copy_within(0..n - 1, 1);
        // Store u0            u0 u1 u2 w1 w2
        self.xy[0] = saturate_wide(
            shr_round(x0 as i64 * self.gain as i64, self.shift_gain),
            &mut saturations,
        );
        let w0 = saturate_wide(
            macc(&self.xy, &self.ba, self.shift),
            &mut saturations,
        );
        // Store w0            u0 u1 w0 w1 w2
        self.xy[n / 2] = w0;
        let y0 = saturate(
            shr_round(w0 as i64, self.shift_return),
            &mut saturations,
        );
        if saturations > 0 {
            self.saturations = self.saturations.saturating_add(1);
        }
        y0
    }

    fn settling_time(&self) -> u32 {
        let r = self.pole_radius();
        if r >= 1. {
            MAX_SETTLING_TIME
        } else if r <= 0. {
            // Two taps of memory
            2
        } else {
            let tau = -1. / r.ln();
            let t = (SETTLING_TIME_CONSTANTS as f64 * tau).ceil();
            (t.min(MAX_SETTLING_TIME as f64) as u32 + 2).min(MAX_SETTLING_TIME)
        }
    }

    fn saturations(&self) -> u32 {
        self.saturations
    }
}
