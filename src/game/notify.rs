// Outbound side of the engine. Every notification is queued as a RhythmEvent
// in the order it happened; collaborators receive them through the ports below
// after the engine call returns, so resolution never waits on them.

use serde::Serialize;

use crate::game::beat::{BeatId, BeatState, Direction};
use crate::game::combo::{ComboId, ComboReport};
use crate::game::entity::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RhythmEvent {
    ComboStarted {
        combo: ComboId,
        owner: EntityId,
        total_beats: usize,
    },
    BeatReleased {
        beat: BeatId,
        combo: ComboId,
        direction: Direction,
    },
    BeatStateChanged {
        beat: BeatId,
        combo: ComboId,
        state: BeatState,
    },
    Penalty {
        amount: f32,
        source: EntityId,
        beat: BeatId,
    },
    PerfectCombo {
        combo: ComboId,
        owner: EntityId,
    },
    ComboEnded {
        report: ComboReport,
    },
}

/// Noise/health system.
pub trait PenaltyNotifier {
    fn apply_penalty(&mut self, amount: f32);
}

/// Reward/buff system; called once per perfect combo.
pub trait RewardNotifier {
    fn apply_combo_reward(&mut self);
}

/// Presentation and bookkeeping. Advisory only.
pub trait BeatObserver {
    fn on_beat_released(&mut self, _beat: BeatId, _direction: Direction) {}
    fn on_beat_state_changed(&mut self, _beat: BeatId, _state: BeatState) {}
    fn on_combo_ended(&mut self, _success: bool) {}
}

impl PenaltyNotifier for () {
    fn apply_penalty(&mut self, _amount: f32) {}
}

impl RewardNotifier for () {
    fn apply_combo_reward(&mut self) {}
}

impl BeatObserver for () {}

pub fn dispatch<I>(
    events: I,
    penalty: &mut dyn PenaltyNotifier,
    reward: &mut dyn RewardNotifier,
    observer: &mut dyn BeatObserver,
) where
    I: IntoIterator<Item = RhythmEvent>,
{
    for ev in events {
        match ev {
            RhythmEvent::ComboStarted { .. } => {}
            RhythmEvent::BeatReleased {
                beat, direction, ..
            } => observer.on_beat_released(beat, direction),
            RhythmEvent::BeatStateChanged { beat, state, .. } => {
                observer.on_beat_state_changed(beat, state);
            }
            RhythmEvent::Penalty { amount, .. } => penalty.apply_penalty(amount),
            RhythmEvent::PerfectCombo { .. } => reward.apply_combo_reward(),
            RhythmEvent::ComboEnded { report } => observer.on_combo_ended(report.is_perfect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RhythmEvent, dispatch};
    use crate::game::beat::{BeatId, BeatState, Resolution};
    use crate::game::combo::{ComboId, ComboOutcome, ComboReport};
    use crate::game::entity::EntityId;
    use crate::test_support::{PenaltyLog, RewardCount, StateLog};

    #[test]
    fn dispatch_routes_each_event_to_its_port() {
        let report = ComboReport {
            combo: ComboId(1),
            owner: EntityId(2),
            total_beats: 1,
            released: 1,
            perfect: 1,
            missed: 0,
            timed_out: 0,
            aborted: 0,
            outcome: ComboOutcome::Perfect,
        };
        let events = vec![
            RhythmEvent::BeatStateChanged {
                beat: BeatId(4),
                combo: ComboId(1),
                state: BeatState::Resolved(Resolution::ParriedPerfect),
            },
            RhythmEvent::Penalty {
                amount: 3.0,
                source: EntityId(2),
                beat: BeatId(4),
            },
            RhythmEvent::PerfectCombo {
                combo: ComboId(1),
                owner: EntityId(2),
            },
            RhythmEvent::ComboEnded { report },
        ];

        let mut penalties = PenaltyLog::default();
        let mut rewards = RewardCount::default();
        let mut states = StateLog::default();
        dispatch(events, &mut penalties, &mut rewards, &mut states);

        assert_eq!(penalties.0, vec![3.0]);
        assert_eq!(rewards.0, 1);
        assert_eq!(states.combos_ended, vec![true]);
        assert_eq!(
            states.changes,
            vec![(BeatId(4), BeatState::Resolved(Resolution::ParriedPerfect))]
        );
    }
}
