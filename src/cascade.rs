use log::debug;

use crate::{
    BiquadParameter, Error, Filter, FilterInstance, FilterParameter,
    Sample, MAX_SETTLING_TIME,
};

/// Ordered chain of filters.
///
/// Each stage's output is the next stage's input. The stage order is fixed
/// at construction.
#[derive(Clone, Debug)]
pub struct Cascade {
    stages: Vec<FilterInstance>,
}

impl Cascade {
    /// Build a zero state cascade.
    pub fn build(parameters: &[FilterParameter]) -> Result<Self, Error> {
        if parameters.is_empty() {
            return Err(Error::EmptyCascade);
        }
        let stages = parameters
            .iter()
            .map(FilterParameter::build)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Cascade: {:?}",
            parameters.iter().map(|p| p.function()).collect::<Vec<_>>()
        );
        Ok(Self { stages })
    }

    /// Build a cascade of second order sections.
    pub fn from_biquads(sections: &[BiquadParameter]) -> Result<Self, Error> {
        let parameters: Vec<_> =
            sections.iter().copied().map(FilterParameter::from).collect();
        Self::build(&parameters)
    }

    pub fn stages(&self) -> &[FilterInstance] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`, a cascade has at least one stage.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Filter for Cascade {
    #[inline]
    fn next(&mut self, x: Sample) -> Sample {
        self.stages.iter_mut().fold(x, |x, stage| stage.next(x))
    }

    fn settling_time(&self) -> u32 {
        self.stages
            .iter()
            .fold(0u32, |t, stage| t.saturating_add(stage.settling_time()))
            .min(MAX_SETTLING_TIME)
    }

    fn saturations(&self) -> u32 {
        self.stages
            .iter()
            .fold(0u32, |n, stage| n.saturating_add(stage.saturations()))
    }
}
