//! Filter parameters.
//!
//! Parameters are plain configuration. They carry no state and build any
//! number of independent filters.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
    Abs, Biquad, Error, ExponentialMovingAverage, FilterInstance, Offset,
    Pass, Sample,
};

/// Filter configuration memory on the device in bytes.
pub const FILTER_MEMORY: usize = 80;

/// Firmware filter block function codes and names.
///
/// `Exit` terminates a chain in the device filter memory. It is not a filter
/// and has no parameter record; the end of a [`Cascade`](crate::Cascade)
/// plays its role.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    EnumString,
    AsRefStr,
    Display,
)]
#[repr(u8)]
pub enum FilterFunction {
    #[strum(serialize = "exit")]
    Exit = 0,
    #[strum(serialize = "abs")]
    Abs = 1,
    #[strum(serialize = "sos")]
    Biquad = 2,
    #[strum(serialize = "offset")]
    Offset = 3,
    #[strum(serialize = "movexp")]
    ExponentialMovingAverage = 4,
    #[strum(serialize = "pass")]
    Pass = 5,
}

impl FilterFunction {
    /// Configuration memory used by one block.
    pub const fn footprint(self) -> usize {
        match self {
            Self::Exit | Self::Abs | Self::Pass => 0,
            Self::Biquad => 20,
            Self::Offset | Self::ExponentialMovingAverage => 2,
        }
    }
}

/// DC removal highpass, see [`Offset`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetParameter {
    pub shift: u8,
}

impl OffsetParameter {
    pub fn build(&self) -> Result<Offset, Error> {
        Offset::new(self.shift)
    }
}

/// Exponential moving average lowpass, see [`ExponentialMovingAverage`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExponentialMovingAverageParameter {
    pub shift: u8,
}

impl ExponentialMovingAverageParameter {
    pub fn build(&self) -> Result<ExponentialMovingAverage, Error> {
        ExponentialMovingAverage::new(self.shift)
    }
}

fn default_coefficient_shift() -> u8 {
    BiquadParameter::DEFAULT_SHIFT
}

fn default_gain() -> i16 {
    1
}

/// Second order section coefficients, see [`Biquad`].
///
/// The field names follow the design tool's section records. `shift_b` is
/// accepted for `shift`. A record may restate `a0`, `shift_a` and
/// `shift_za`; they must agree with the normalized direct form
/// (`a0 = 1 << shift`, `shift_a = shift`, `shift_za = 0`).
///
/// Without `gain`, `shift_gain` and `shift_return` the section has unit input
/// gain and returns its register directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiquadParameter {
    pub b0: i16,
    pub b1: i16,
    pub b2: i16,
    pub a1: i16,
    pub a2: i16,
    /// Fractional bits of the coefficients.
    #[serde(default = "default_coefficient_shift", alias = "shift_b")]
    pub shift: u8,
    /// Input gain, `gain / 2^(shift_gain + shift_return)`.
    #[serde(default = "default_gain")]
    pub gain: i16,
    #[serde(default)]
    pub shift_gain: u8,
    /// Fractional bits of the section register.
    #[serde(default)]
    pub shift_return: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a0: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_a: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_za: Option<u8>,
}

impl Default for BiquadParameter {
    fn default() -> Self {
        Self::new([0; 3], [0; 2], Self::DEFAULT_SHIFT)
    }
}

impl BiquadParameter {
    /// Coefficient format of the design tool: Q1.14.
    pub const DEFAULT_SHIFT: u8 = 14;

    /// # Args
    /// * `b` - Feed forward taps `[b0, b1, b2]`.
    /// * `a` - Feed back taps `[a1, a2]`, `a0` is one.
    /// * `shift` - Fractional bits of the coefficients.
    pub const fn new(b: [i16; 3], a: [i16; 2], shift: u8) -> Self {
        Self {
            b0: b[0],
            b1: b[1],
            b2: b[2],
            a1: a[0],
            a2: a[1],
            shift,
            gain: 1,
            shift_gain: 0,
            shift_return: 0,
            a0: None,
            shift_a: None,
            shift_za: None,
        }
    }

    /// Set the input gain and register format.
    ///
    /// The input is scaled by `gain >> shift_gain` into the section register,
    /// the output is the register `>> shift_return`. The effective gain is
    /// `gain / 2^(shift_gain + shift_return)`.
    pub const fn with_gain(
        self,
        gain: i16,
        shift_gain: u8,
        shift_return: u8,
    ) -> Self {
        Self {
            gain,
            shift_gain,
            shift_return,
            ..self
        }
    }

    /// Pass-through section with the given coefficient format.
    ///
    /// `None` if unity does not fit the coefficients (`shift >= 15`).
    pub const fn unity(shift: u8) -> Option<Self> {
        if shift < Sample::BITS as u8 - 1 {
            Some(Self::new([1 << shift, 0, 0], [0, 0], shift))
        } else {
            None
        }
    }

    pub fn build(&self) -> Result<Biquad, Error> {
        Biquad::new(self)
    }
}

/// Full wave rectifier, see [`Abs`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsParameter;

impl AbsParameter {
    pub fn build(&self) -> Result<Abs, Error> {
        Ok(Abs::default())
    }
}

/// Pass-through block, see [`Pass`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassParameter;

impl PassParameter {
    pub fn build(&self) -> Result<Pass, Error> {
        Ok(Pass)
    }
}

/// Configuration of any filter kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterParameter {
    Offset(OffsetParameter),
    ExponentialMovingAverage(ExponentialMovingAverageParameter),
    Biquad(BiquadParameter),
    Abs(AbsParameter),
    Pass(PassParameter),
}

impl FilterParameter {
    pub fn function(&self) -> FilterFunction {
        match self {
            Self::Offset(_) => FilterFunction::Offset,
            Self::ExponentialMovingAverage(_) => {
                FilterFunction::ExponentialMovingAverage
            }
            Self::Biquad(_) => FilterFunction::Biquad,
            Self::Abs(_) => FilterFunction::Abs,
            Self::Pass(_) => FilterFunction::Pass,
        }
    }

    /// Build a zero state filter.
    pub fn build(&self) -> Result<FilterInstance, Error> {
        Ok(match self {
            Self::Offset(p) => p.build()?.into(),
            Self::ExponentialMovingAverage(p) => p.build()?.into(),
            Self::Biquad(p) => p.build()?.into(),
            Self::Abs(p) => p.build()?.into(),
            Self::Pass(p) => p.build()?.into(),
        })
    }
}

impl From<OffsetParameter> for FilterParameter {
    fn from(p: OffsetParameter) -> Self {
        Self::Offset(p)
    }
}

impl From<ExponentialMovingAverageParameter> for FilterParameter {
    fn from(p: ExponentialMovingAverageParameter) -> Self {
        Self::ExponentialMovingAverage(p)
    }
}

impl From<BiquadParameter> for FilterParameter {
    fn from(p: BiquadParameter) -> Self {
        Self::Biquad(p)
    }
}

impl From<AbsParameter> for FilterParameter {
    fn from(p: AbsParameter) -> Self {
        Self::Abs(p)
    }
}

impl From<PassParameter> for FilterParameter {
    fn from(p: PassParameter) -> Self {
        Self::Pass(p)
    }
}

/// Check that a chain fits the device filter configuration memory.
///
/// # Returns
/// The number of bytes used.
pub fn check_memory(parameters: &[FilterParameter]) -> Result<usize, Error> {
    let needed: usize = parameters
        .iter()
        .map(|p| p.function().footprint())
        .sum();
    if needed > FILTER_MEMORY {
        Err(Error::Memory {
            needed,
            available: FILTER_MEMORY,
        })
    } else {
        Ok(needed)
    }
}
