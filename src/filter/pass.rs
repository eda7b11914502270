use super::Filter;
use crate::Sample;

/// Pass-through block, the output is the input.
#[derive(Copy, Clone, Debug, Default)]
pub struct Pass;

impl Filter for Pass {
    #[inline]
    fn next(&mut self, x: Sample) -> Sample {
        x
    }

    fn settling_time(&self) -> u32 {
        0
    }

    fn saturations(&self) -> u32 {
        0
    }
}
