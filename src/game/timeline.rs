use crate::error::SpecViolation;
use crate::game::beat::BeatSpec;

// Fraction of a beat's travel after which the next beat of the combo is released.
pub const DEFAULT_TRIGGER_DISTANCE_RATIO: f32 = 0.5;
// Added on top of every release delay so trigger windows rarely overlap.
pub const DEFAULT_SAFETY_MARGIN_S: f32 = 0.15;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReleasePacing {
    pub trigger_distance_ratio: f32,
    pub safety_margin_s: f32,
}

impl Default for ReleasePacing {
    fn default() -> Self {
        Self {
            trigger_distance_ratio: DEFAULT_TRIGGER_DISTANCE_RATIO,
            safety_margin_s: DEFAULT_SAFETY_MARGIN_S,
        }
    }
}

impl ReleasePacing {
    /// Delay between releasing `previous` and releasing the beat after it.
    #[inline(always)]
    pub fn delay_after(&self, previous: &BeatSpec) -> f32 {
        previous
            .travel_duration
            .mul_add(self.trigger_distance_ratio, self.safety_margin_s)
            .max(0.0)
    }
}

/// An ordered, validated beat list with the release offset of every beat,
/// measured in seconds from the moment the combo starts.
#[derive(Clone, Debug)]
pub struct BeatTimeline {
    specs: Vec<BeatSpec>,
    offsets: Vec<f64>,
}

impl BeatTimeline {
    pub fn build(specs: Vec<BeatSpec>, pacing: ReleasePacing) -> Result<Self, SpecViolation> {
        if specs.is_empty() {
            return Err(SpecViolation::EmptyCombo);
        }
        for (i, spec) in specs.iter().enumerate() {
            spec.validate(i)?;
        }

        let mut offsets = Vec::with_capacity(specs.len());
        let mut at = 0.0_f64;
        offsets.push(at);
        for prev in &specs[..specs.len() - 1] {
            at += f64::from(pacing.delay_after(prev));
            offsets.push(at);
        }
        Ok(Self { specs, offsets })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[inline(always)]
    pub fn spec(&self, index: usize) -> Option<&BeatSpec> {
        self.specs.get(index)
    }

    #[inline(always)]
    pub fn release_offset(&self, index: usize) -> Option<f64> {
        self.offsets.get(index).copied()
    }

    pub fn specs(&self) -> &[BeatSpec] {
        &self.specs
    }

    /// Offset of the last release; the combo cannot finish before this.
    pub fn release_span(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }
}
