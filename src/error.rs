/// Failures building filters or characterizing them.
///
/// Overflow while filtering is not an error: it saturates and is counted by
/// [`Filter::saturations`](crate::Filter::saturations).
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// The shift is not smaller than the width of the operand it is applied to.
    #[error("Shift {shift} undefined for a {width} bit operand")]
    UndefinedShift { shift: u8, width: u32 },
    /// A cascade needs at least one stage.
    #[error("Cascade without stages")]
    EmptyCascade,
    /// Probe frequency outside `[0, Nyquist)`.
    #[error("Invalid probe frequency {0}")]
    InvalidFrequency(f64),
    /// Sample rate not positive and finite.
    #[error("Invalid sample rate {0}")]
    InvalidSampleRate(f64),
    /// Probe amplitude is zero, or negative for a cosine probe.
    #[error("Invalid probe amplitude {0}")]
    InvalidAmplitude(i16),
    /// A second order section record field the filter can not represent.
    #[error("Unsupported section field {field} = {value}")]
    UnsupportedSection { field: &'static str, value: i32 },
    /// The chain does not fit into the device filter configuration memory.
    #[error("Filter chain needs {needed} bytes, {available} available")]
    Memory { needed: usize, available: usize },
}
