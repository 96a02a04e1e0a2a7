use std::collections::VecDeque;
use std::collections::vec_deque::Drain;

use glam::Vec2;
use log::{debug, info, trace, warn};
use smallvec::SmallVec;

use crate::config::Config;
use crate::error::RhythmError;
use crate::game::active_set::ActiveBeatSet;
use crate::game::beat::{Beat, BeatId, BeatSpec, BeatState, Direction, Resolution};
use crate::game::combo::{ComboId, ComboReport, ComboRunner};
use crate::game::entity::{EntityId, EntityTable};
use crate::game::matcher::{ParryMatcher, ParryVerdict};
use crate::game::notify::RhythmEvent;
use crate::game::timeline::{BeatTimeline, ReleasePacing};
use crate::game::track::BeatTrack;

// Finished combo reports kept for the session summary.
const REPORT_HISTORY_CAP: usize = 64;
const STATUS_LOG_INTERVAL_S: f32 = 1.0;

/// What an input did, for the input dispatcher's own feedback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParryOutcome {
    pub beat: BeatId,
    pub owner: EntityId,
    pub resolution: Resolution,
}

/// The rhythm-parry engine for one game session.
///
/// Owns every running combo and the shared set of beats in flight. It is
/// advanced by `tick` and fed by input calls, all on the same game clock;
/// nothing in here blocks or sleeps. Outbound notifications are queued and
/// handed out by `drain_events`.
#[derive(Debug)]
pub struct RhythmEngine {
    matcher: ParryMatcher,
    pacing: ReleasePacing,
    clock: f64,
    active: ActiveBeatSet,
    runners: Vec<ComboRunner>,
    next_beat_id: u64,
    next_combo_id: u64,
    events: VecDeque<RhythmEvent>,
    history: VecDeque<ComboReport>,
    status_timer: f32,
}

impl RhythmEngine {
    pub fn new(track: BeatTrack, pacing: ReleasePacing, ultimate_min_distance: f32) -> Self {
        Self {
            matcher: ParryMatcher::new(track, ultimate_min_distance),
            pacing,
            clock: 0.0,
            active: ActiveBeatSet::new(),
            runners: Vec::new(),
            next_beat_id: 0,
            next_combo_id: 0,
            events: VecDeque::new(),
            history: VecDeque::new(),
            status_timer: 0.0,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.track(), cfg.pacing(), cfg.ultimate_min_distance)
    }

    // --- Observation ---

    #[inline(always)]
    pub const fn now(&self) -> f64 {
        self.clock
    }

    #[inline(always)]
    pub const fn matcher(&self) -> &ParryMatcher {
        &self.matcher
    }

    #[inline(always)]
    pub const fn track(&self) -> &BeatTrack {
        self.matcher.track()
    }

    #[inline(always)]
    pub const fn active_beats(&self) -> &ActiveBeatSet {
        &self.active
    }

    #[inline(always)]
    pub fn active_beat_count(&self) -> usize {
        self.active.len()
    }

    #[inline(always)]
    pub fn running_combos(&self) -> usize {
        self.runners.len()
    }

    pub fn runner(&self, combo: ComboId) -> Option<&ComboRunner> {
        self.runners.iter().find(|r| r.id() == combo)
    }

    pub fn combos_of(&self, owner: EntityId) -> usize {
        self.runners.iter().filter(|r| r.owner() == owner).count()
    }

    pub fn history(&self) -> impl Iterator<Item = &ComboReport> {
        self.history.iter()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn drain_events(&mut self) -> Drain<'_, RhythmEvent> {
        self.events.drain(..)
    }

    // --- Inbound interface ---

    /// Starts a combo for `owner`. The first beat is released immediately;
    /// the rest follow on the timeline as the engine ticks.
    pub fn request_combo(
        &mut self,
        owner: EntityId,
        specs: Vec<BeatSpec>,
    ) -> Result<ComboId, RhythmError> {
        let timeline = match BeatTimeline::build(specs, self.pacing) {
            Ok(tl) => tl,
            Err(v) => {
                warn!("Rejected combo request from {owner}: {v}");
                return Err(v.into());
            }
        };

        let id = ComboId(self.next_combo_id);
        self.next_combo_id += 1;
        info!(
            "Combo {} started by {owner}: {} beats, releases span {:.2}s",
            id.0,
            timeline.len(),
            timeline.release_span()
        );
        self.events.push_back(RhythmEvent::ComboStarted {
            combo: id,
            owner,
            total_beats: timeline.len(),
        });
        self.runners
            .push(ComboRunner::new(id, owner, timeline, self.clock));
        self.release_due_beats();
        Ok(id)
    }

    pub fn tick(&mut self, delta_time: f32, entities: &dyn EntityTable) {
        let dt = if delta_time.is_finite() && delta_time > 0.0 {
            delta_time
        } else {
            0.0
        };
        self.clock += f64::from(dt);

        // Owners that vanished since the last tick take their combos with them
        // before any beat of theirs can time out.
        let mut gone: SmallVec<[EntityId; 4]> = SmallVec::new();
        for r in &self.runners {
            let owner = r.owner();
            if !entities.is_alive(owner) && !gone.contains(&owner) {
                gone.push(owner);
            }
        }
        for owner in gone {
            info!("{owner} is gone; aborting its combos");
            self.abort_combos_of(owner);
        }

        self.release_due_beats();
        self.advance_beats();
        self.finalize_drained();

        self.status_timer += dt;
        if self.status_timer >= STATUS_LOG_INTERVAL_S {
            trace!(
                "Time: {:.2}, Active Beats: {}, Running Combos: {}",
                self.clock,
                self.active.len(),
                self.runners.len()
            );
            self.status_timer -= STATUS_LOG_INTERVAL_S;
        }
    }

    /// Parries the beat nearest the trigger point with `direction`.
    /// Returns None when there was nothing to parry.
    pub fn submit_direction_input(
        &mut self,
        direction: Direction,
        entities: &dyn EntityTable,
    ) -> Option<ParryOutcome> {
        let Some(target) = self.matcher.select_directional(&self.active) else {
            trace!("Parry {direction:?} with nothing in flight");
            return None;
        };
        let beat = self.active.get(target.beat)?;
        let owner = beat.owner();
        let fallback_penalty = beat.spec().penalty_value;
        if !entities.is_alive(owner) {
            self.drop_stale_owner(owner, target.beat);
            return None;
        }

        match self.matcher.classify_direction(&target, direction) {
            ParryVerdict::Perfect => {
                info!("Perfect parry! beat {} ({direction:?})", target.beat.0);
                self.resolve_target(target.beat, Resolution::ParriedPerfect, None)
            }
            ParryVerdict::Miss => {
                let amount = entities
                    .standard_penalty(owner)
                    .unwrap_or(fallback_penalty);
                info!(
                    "Miss parry! beat {} wanted {:?}, got {direction:?} (distance {:.1})",
                    target.beat.0, target.required, target.distance
                );
                self.resolve_target(target.beat, Resolution::ParriedMiss, Some(amount))
            }
        }
    }

    /// Evades the ultimate beat nearest the trigger point by standing at
    /// `acting_position`.
    pub fn submit_proximity_action(
        &mut self,
        acting_position: Vec2,
        entities: &dyn EntityTable,
    ) -> Option<ParryOutcome> {
        let target = self.matcher.select_ultimate(&self.active)?;
        let beat = self.active.get(target.beat)?;
        let owner = beat.owner();
        let ultimate_penalty = beat.spec().penalty_value;
        let source = match entities.position(owner) {
            Some(p) if entities.is_alive(owner) => p,
            _ => {
                self.drop_stale_owner(owner, target.beat);
                return None;
            }
        };

        match self
            .matcher
            .classify_proximity(&target, acting_position, source)
        {
            ParryVerdict::Perfect => {
                info!(
                    "Ultimate evaded! beat {} at distance {:.2}",
                    target.beat.0,
                    acting_position.distance(source)
                );
                self.resolve_target(target.beat, Resolution::ParriedPerfect, None)
            }
            ParryVerdict::Miss => {
                info!(
                    "Ultimate hit! beat {} at distance {:.2}, in window: {}",
                    target.beat.0,
                    acting_position.distance(source),
                    target.within_window
                );
                self.resolve_target(target.beat, Resolution::ParriedMiss, Some(ultimate_penalty))
            }
        }
    }

    /// Aborts every combo of `owner`: beats in flight resolve as Aborted with
    /// no penalty, unreleased beats are dropped and the combos end at once.
    /// Returns how many combos were aborted.
    pub fn abort_combos_of(&mut self, owner: EntityId) -> usize {
        let mut affected = 0;
        let mut skipped = 0;
        for r in self.runners.iter_mut().filter(|r| r.owner() == owner) {
            skipped += r.abort();
            affected += 1;
        }

        let mut in_flight = 0;
        for beat in self.active.iter_mut().filter(|b| b.owner() == owner) {
            if settle(beat, Resolution::Aborted, None, &mut self.runners, &mut self.events) {
                in_flight += 1;
            }
        }
        self.active.sweep_resolved();

        if affected > 0 {
            info!(
                "Aborted {affected} combo(s) of {owner}: {in_flight} beats in flight, {skipped} never released"
            );
        }
        self.finalize_drained();
        affected
    }

    // --- Internals ---

    fn release_due_beats(&mut self) {
        let now = self.clock;
        for runner in &mut self.runners {
            while let Some((index, spec, at)) = runner.pop_due(now) {
                let id = BeatId(self.next_beat_id);
                self.next_beat_id += 1;
                debug!(
                    "Combo {} released beat {} ({}/{}): {:?}, travel {:.2}s",
                    runner.id().0,
                    id.0,
                    index + 1,
                    runner.total_beats(),
                    spec.direction,
                    spec.travel_duration
                );
                self.active
                    .insert(Beat::new(id, runner.id(), runner.owner(), spec, at));
                self.events.push_back(RhythmEvent::BeatReleased {
                    beat: id,
                    combo: runner.id(),
                    direction: spec.direction,
                });
            }
        }
    }

    fn advance_beats(&mut self) {
        let now = self.clock;
        let track = *self.matcher.track();
        for beat in self.active.iter_mut() {
            if let Some(state) = beat.advance(now, &track) {
                self.events.push_back(RhythmEvent::BeatStateChanged {
                    beat: beat.id(),
                    combo: beat.combo(),
                    state,
                });
            }
            if beat.has_expired() {
                let amount = beat.spec().penalty_value;
                if settle(
                    beat,
                    Resolution::TimedOut,
                    Some(amount),
                    &mut self.runners,
                    &mut self.events,
                ) {
                    info!(
                        "Beat {} timed out ({:?}), penalty {amount}",
                        beat.id().0,
                        beat.direction()
                    );
                }
            }
        }
        self.active.sweep_resolved();
    }

    fn resolve_target(
        &mut self,
        id: BeatId,
        resolution: Resolution,
        penalty: Option<f32>,
    ) -> Option<ParryOutcome> {
        let beat = self.active.get_mut(id)?;
        let owner = beat.owner();
        if !settle(beat, resolution, penalty, &mut self.runners, &mut self.events) {
            return None;
        }
        self.active.sweep_resolved();
        self.finalize_drained();
        Some(ParryOutcome {
            beat: id,
            owner,
            resolution,
        })
    }

    fn drop_stale_owner(&mut self, owner: EntityId, beat: BeatId) {
        debug!("Input targeted beat {} of {owner}, which no longer exists", beat.0);
        self.abort_combos_of(owner);
    }

    fn finalize_drained(&mut self) {
        let mut i = 0;
        while i < self.runners.len() {
            let r = &self.runners[i];
            if r.all_released() && self.active.count_for_combo(r.id()) == 0 {
                let runner = self.runners.remove(i);
                self.finish(&runner);
            } else {
                i += 1;
            }
        }
    }

    fn finish(&mut self, runner: &ComboRunner) {
        let report = runner.finalize();
        if report.is_perfect() {
            info!("Combo {} complete! {} perfect parries", report.combo.0, report.perfect);
            self.events.push_back(RhythmEvent::PerfectCombo {
                combo: report.combo,
                owner: report.owner,
            });
        } else {
            info!(
                "Combo {} ended: {}/{} perfect, {} missed, {} timed out, {} aborted",
                report.combo.0,
                report.perfect,
                report.total_beats,
                report.missed,
                report.timed_out,
                report.aborted
            );
        }
        self.events.push_back(RhythmEvent::ComboEnded {
            report: report.clone(),
        });
        if self.history.len() >= REPORT_HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(report);
    }
}

/// Resolves `beat` once, tallies it on its combo and queues the notifications.
/// Returns false, doing nothing, if the beat was already resolved.
fn settle(
    beat: &mut Beat,
    resolution: Resolution,
    penalty: Option<f32>,
    runners: &mut [ComboRunner],
    events: &mut VecDeque<RhythmEvent>,
) -> bool {
    if !beat.resolve(resolution) {
        return false;
    }
    if let Some(runner) = runners.iter_mut().find(|r| r.id() == beat.combo()) {
        runner.record(resolution);
    }
    events.push_back(RhythmEvent::BeatStateChanged {
        beat: beat.id(),
        combo: beat.combo(),
        state: BeatState::Resolved(resolution),
    });
    if let Some(amount) = penalty {
        events.push_back(RhythmEvent::Penalty {
            amount,
            source: beat.owner(),
            beat: beat.id(),
        });
    }
    true
}
