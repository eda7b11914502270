use super::Filter;
use crate::Sample;

/// Full wave rectifier.
///
/// `Sample::MIN` has no positive counterpart and saturates to `Sample::MAX`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Abs {
    saturations: u32,
}

impl Filter for Abs {
    #[inline]
    fn next(&mut self, x: Sample) -> Sample {
        if x == Sample::MIN {
            self.saturations = self.saturations.saturating_add(1);
        }
        x.saturating_abs()
    }

    fn settling_time(&self) -> u32 {
        0
    }

    fn saturations(&self) -> u32 {
        self.saturations
    }
}
