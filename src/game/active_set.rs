use crate::game::beat::{Beat, BeatId};
use crate::game::combo::ComboId;
use crate::game::entity::EntityId;

/// Every beat currently in flight, across all running combos.
///
/// Iteration follows insertion order. Resolution marks a beat in place and
/// `sweep_resolved` drops it afterwards, so beats can be resolved while the
/// set is being walked.
#[derive(Debug, Default)]
pub struct ActiveBeatSet {
    beats: Vec<Beat>,
}

impl ActiveBeatSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Beat> {
        self.beats.iter()
    }

    pub fn get(&self, id: BeatId) -> Option<&Beat> {
        self.beats.iter().find(|b| b.id() == id)
    }

    pub fn count_for_combo(&self, combo: ComboId) -> usize {
        self.beats
            .iter()
            .filter(|b| b.combo() == combo && !b.is_resolved())
            .count()
    }

    pub fn count_for_owner(&self, owner: EntityId) -> usize {
        self.beats
            .iter()
            .filter(|b| b.owner() == owner && !b.is_resolved())
            .count()
    }

    pub(crate) fn insert(&mut self, beat: Beat) {
        self.beats.push(beat);
    }

    pub(crate) fn get_mut(&mut self, id: BeatId) -> Option<&mut Beat> {
        self.beats.iter_mut().find(|b| b.id() == id)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Beat> {
        self.beats.iter_mut()
    }

    /// Drops resolved beats, keeping the survivors in order.
    pub(crate) fn sweep_resolved(&mut self) -> usize {
        let before = self.beats.len();
        self.beats.retain(|b| !b.is_resolved());
        before - self.beats.len()
    }
}
