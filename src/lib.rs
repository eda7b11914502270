//! Host reference of the DyNeuMo fixed-point signal conditioning chain.
//!
//! The filters here reproduce the device arithmetic bit for bit: DC removal,
//! exponential moving average, biquad sections and rectification on signed
//! 16 bit samples. They compose into cascades and can be characterized by
//! time and frequency response measurements.

mod error;
pub use error::*;
mod filter;
pub use filter::*;
mod param;
pub use param::*;
mod cascade;
pub use cascade::*;
pub mod response;

#[cfg(test)]
pub mod testing;

/// Native sample of the signal chain.
pub type Sample = i16;
