// Shared fixtures for unit tests.

use glam::Vec2;

use crate::game::beat::{BeatId, BeatSpec, BeatState, Direction};
use crate::game::engine::RhythmEngine;
use crate::game::entity::{EntityId, EntityRoster};
use crate::game::notify::{BeatObserver, PenaltyNotifier, RewardNotifier, RhythmEvent, dispatch};
use crate::game::timeline::ReleasePacing;
use crate::game::track::BeatTrack;

#[derive(Debug, Default)]
pub struct PenaltyLog(pub Vec<f32>);

impl PenaltyNotifier for PenaltyLog {
    fn apply_penalty(&mut self, amount: f32) {
        self.0.push(amount);
    }
}

#[derive(Debug, Default)]
pub struct RewardCount(pub u32);

impl RewardNotifier for RewardCount {
    fn apply_combo_reward(&mut self) {
        self.0 += 1;
    }
}

#[derive(Debug, Default)]
pub struct StateLog {
    pub released: Vec<(BeatId, Direction)>,
    pub changes: Vec<(BeatId, BeatState)>,
    pub combos_ended: Vec<bool>,
}

impl BeatObserver for StateLog {
    fn on_beat_released(&mut self, beat: BeatId, direction: Direction) {
        self.released.push((beat, direction));
    }

    fn on_beat_state_changed(&mut self, beat: BeatId, state: BeatState) {
        self.changes.push((beat, state));
    }

    fn on_combo_ended(&mut self, success: bool) {
        self.combos_ended.push(success);
    }
}

impl StateLog {
    pub fn resolutions_of(&self, beat: BeatId) -> usize {
        self.changes
            .iter()
            .filter(|(b, s)| *b == beat && matches!(s, BeatState::Resolved(_)))
            .count()
    }
}

/// Collects everything the engine emitted, both raw and routed to the ports.
#[derive(Debug, Default)]
pub struct Sink {
    pub events: Vec<RhythmEvent>,
    pub penalties: PenaltyLog,
    pub rewards: RewardCount,
    pub states: StateLog,
}

impl Sink {
    pub fn pump(&mut self, engine: &mut RhythmEngine) {
        let batch: Vec<RhythmEvent> = engine.drain_events().collect();
        dispatch(
            batch.iter().cloned(),
            &mut self.penalties,
            &mut self.rewards,
            &mut self.states,
        );
        self.events.extend(batch);
    }
}

pub const fn spec(direction: Direction, travel: f32, penalty: f32) -> BeatSpec {
    BeatSpec::new(direction, travel, penalty)
}

pub fn engine() -> RhythmEngine {
    RhythmEngine::new(BeatTrack::default(), ReleasePacing::default(), 3.0)
}

/// A roster with one attacker at the origin hitting for `damage`.
pub fn roster_with_attacker(damage: f32) -> (EntityRoster, EntityId) {
    let mut roster = EntityRoster::new();
    let id = roster.spawn(Vec2::ZERO, damage, 30);
    (roster, id)
}

/// Ticks the engine in fixed steps until `until` seconds of game time.
pub fn run_until(engine: &mut RhythmEngine, roster: &EntityRoster, until: f64, step: f32) {
    while engine.now() + 1e-9 < until {
        let remaining = (until - engine.now()) as f32;
        engine.tick(step.min(remaining), roster);
    }
}
