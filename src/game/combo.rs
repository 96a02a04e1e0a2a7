use serde::{Deserialize, Serialize};

use crate::game::beat::{BeatSpec, Resolution};
use crate::game::entity::EntityId;
use crate::game::timeline::BeatTimeline;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComboId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboOutcome {
    Perfect,
    Ended,
}

/// Final tally of one combo run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboReport {
    pub combo: ComboId,
    pub owner: EntityId,
    pub total_beats: usize,
    pub released: usize,
    pub perfect: usize,
    pub missed: usize,
    pub timed_out: usize,
    pub aborted: usize,
    pub outcome: ComboOutcome,
}

impl ComboReport {
    #[inline(always)]
    pub const fn resolved(&self) -> usize {
        self.perfect + self.missed + self.timed_out + self.aborted
    }

    #[inline(always)]
    pub const fn is_perfect(&self) -> bool {
        matches!(self.outcome, ComboOutcome::Perfect)
    }
}

/// One combo in flight: releases its beats on schedule and keeps the tally
/// until every released beat has resolved.
///
/// Waiting is explicit state (release cursor plus start time) advanced by the
/// engine tick, so a run can be stepped deterministically.
#[derive(Clone, Debug)]
pub struct ComboRunner {
    id: ComboId,
    owner: EntityId,
    timeline: BeatTimeline,
    started_at: f64,
    cursor: usize,
    perfect: usize,
    missed: usize,
    timed_out: usize,
    aborted: usize,
    still_perfect: bool,
    was_aborted: bool,
}

impl ComboRunner {
    pub(crate) fn new(id: ComboId, owner: EntityId, timeline: BeatTimeline, now: f64) -> Self {
        Self {
            id,
            owner,
            timeline,
            started_at: now,
            cursor: 0,
            perfect: 0,
            missed: 0,
            timed_out: 0,
            aborted: 0,
            still_perfect: true,
            was_aborted: false,
        }
    }

    #[inline(always)]
    pub const fn id(&self) -> ComboId {
        self.id
    }

    #[inline(always)]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    #[inline(always)]
    pub fn total_beats(&self) -> usize {
        self.timeline.len()
    }

    #[inline(always)]
    pub const fn released(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    pub const fn perfect_count(&self) -> usize {
        self.perfect
    }

    #[inline(always)]
    pub const fn is_still_perfect(&self) -> bool {
        self.still_perfect
    }

    /// True once nothing is left to release, either because every beat went
    /// out or because the run was aborted.
    #[inline(always)]
    pub fn all_released(&self) -> bool {
        self.was_aborted || self.cursor >= self.timeline.len()
    }

    pub fn next_release_at(&self) -> Option<f64> {
        if self.was_aborted {
            return None;
        }
        self.timeline
            .release_offset(self.cursor)
            .map(|offset| self.started_at + offset)
    }

    /// Hands out the next beat if its release time has come, together with
    /// its index and scheduled release time. Beats leave strictly in order.
    pub(crate) fn pop_due(&mut self, now: f64) -> Option<(usize, BeatSpec, f64)> {
        let at = self.next_release_at()?;
        if at > now {
            return None;
        }
        let index = self.cursor;
        let spec = *self.timeline.spec(index)?;
        self.cursor += 1;
        Some((index, spec, at))
    }

    pub(crate) fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::ParriedPerfect => self.perfect += 1,
            Resolution::ParriedMiss => self.missed += 1,
            Resolution::TimedOut => self.timed_out += 1,
            Resolution::Aborted => self.aborted += 1,
        }
        if resolution.breaks_perfection() {
            self.still_perfect = false;
        }
    }

    /// Stops further releases; returns how many beats were never released.
    pub(crate) fn abort(&mut self) -> usize {
        self.was_aborted = true;
        self.still_perfect = false;
        self.timeline.len().saturating_sub(self.cursor)
    }

    #[inline(always)]
    pub const fn was_aborted(&self) -> bool {
        self.was_aborted
    }

    pub(crate) fn finalize(&self) -> ComboReport {
        let total = self.timeline.len();
        let perfect = !self.was_aborted
            && self.still_perfect
            && total > 0
            && self.perfect == total;
        ComboReport {
            combo: self.id,
            owner: self.owner,
            total_beats: total,
            released: self.cursor,
            perfect: self.perfect,
            missed: self.missed,
            timed_out: self.timed_out,
            aborted: self.aborted,
            outcome: if perfect {
                ComboOutcome::Perfect
            } else {
                ComboOutcome::Ended
            },
        }
    }
}
