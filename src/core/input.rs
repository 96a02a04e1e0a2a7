use glam::Vec2;
use log::trace;

use crate::config::Config;
use crate::game::beat::Direction;
use crate::game::engine::{ParryOutcome, RhythmEngine};
use crate::game::entity::EntityTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParryAction {
    Parry(Direction),
    // Evasion from ultimates, judged by where the player stands.
    Dash,
}

/// Maps a key name as reported by the platform layer ("ArrowUp", "KeyW",
/// "Space", ...) to a parry action. Case-insensitive.
#[inline(always)]
pub fn action_from_key_name(name: &str) -> Option<ParryAction> {
    match name.trim().to_ascii_lowercase().as_str() {
        "arrowup" | "up" | "keyw" | "w" => Some(ParryAction::Parry(Direction::Up)),
        "arrowdown" | "down" | "keys" | "s" => Some(ParryAction::Parry(Direction::Down)),
        "arrowleft" | "left" | "keya" | "a" => Some(ParryAction::Parry(Direction::Left)),
        "arrowright" | "right" | "keyd" | "d" => Some(ParryAction::Parry(Direction::Right)),
        "space" | " " => Some(ParryAction::Dash),
        _ => None,
    }
}

/// Debounces parry presses. After an accepted directional press further
/// ones are dropped until the cooldown has run out on the game clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParryInputGate {
    cooldown_s: f32,
    remaining_s: f32,
}

impl ParryInputGate {
    pub fn new(cooldown_s: f32) -> Self {
        Self {
            cooldown_s: cooldown_s.max(0.0),
            remaining_s: 0.0,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.parry_cooldown_s)
    }

    #[inline(always)]
    pub fn is_cooling_down(&self) -> bool {
        self.remaining_s > 0.0
    }

    pub fn tick(&mut self, delta_time: f32) {
        if delta_time > 0.0 {
            self.remaining_s = (self.remaining_s - delta_time).max(0.0);
        }
    }

    /// True if the action may go through. Dashes are never gated.
    pub fn try_accept(&mut self, action: ParryAction) -> bool {
        match action {
            ParryAction::Dash => true,
            ParryAction::Parry(_) if self.is_cooling_down() => false,
            ParryAction::Parry(_) => {
                self.remaining_s = self.cooldown_s;
                true
            }
        }
    }

    /// Gates `action` and forwards it to the engine. `player` is where the
    /// acting entity stands, used for dashes.
    pub fn submit(
        &mut self,
        action: ParryAction,
        player: Vec2,
        engine: &mut RhythmEngine,
        entities: &dyn EntityTable,
    ) -> Option<ParryOutcome> {
        if !self.try_accept(action) {
            trace!("Dropped {action:?}: parry on cooldown");
            return None;
        }
        match action {
            ParryAction::Parry(dir) => engine.submit_direction_input(dir, entities),
            ParryAction::Dash => engine.submit_proximity_action(player, entities),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ParryAction, ParryInputGate, action_from_key_name};
    use crate::game::beat::{Direction, Resolution};
    use crate::test_support::{engine, roster_with_attacker, run_until, spec};
    use glam::Vec2;

    #[test]
    fn key_names_map_to_actions() {
        assert_eq!(
            action_from_key_name("ArrowUp"),
            Some(ParryAction::Parry(Direction::Up))
        );
        assert_eq!(
            action_from_key_name("KeyA"),
            Some(ParryAction::Parry(Direction::Left))
        );
        assert_eq!(action_from_key_name("Space"), Some(ParryAction::Dash));
        assert_eq!(action_from_key_name("Enter"), None);
    }

    #[test]
    fn cooldown_drops_repeated_parries() {
        let mut gate = ParryInputGate::new(0.25);
        let up = ParryAction::Parry(Direction::Up);
        assert!(gate.try_accept(up));
        assert!(!gate.try_accept(up));
        assert!(gate.try_accept(ParryAction::Dash), "dash ignores the cooldown");
        gate.tick(0.2);
        assert!(!gate.try_accept(ParryAction::Parry(Direction::Down)));
        gate.tick(0.1);
        assert!(gate.try_accept(up));
    }

    #[test]
    fn gated_press_never_reaches_the_engine() {
        let mut e = engine();
        let (roster, owner) = roster_with_attacker(5.0);
        e.request_combo(
            owner,
            vec![spec(Direction::Up, 2.0, 1.0), spec(Direction::Up, 2.0, 1.0)],
        )
        .unwrap();
        let mut gate = ParryInputGate::new(0.25);

        run_until(&mut e, &roster, 1.0, 0.05);
        let up = ParryAction::Parry(Direction::Up);
        let out = gate.submit(up, Vec2::ZERO, &mut e, &roster).unwrap();
        assert_eq!(out.resolution, Resolution::ParriedPerfect);
        // Mashing right after is dropped before it reaches the engine.
        e.tick(0.05, &roster);
        gate.tick(0.05);
        assert!(gate.submit(up, Vec2::ZERO, &mut e, &roster).is_none());
        assert_eq!(e.active_beat_count(), 0);

        // The second beat sits on the trigger point at 1.15 + 1.0.
        run_until(&mut e, &roster, 2.15, 0.05);
        gate.tick(1.15);
        let out = gate.submit(up, Vec2::ZERO, &mut e, &roster).unwrap();
        assert_eq!(out.resolution, Resolution::ParriedPerfect);
        assert_eq!(e.history().last().map(|r| r.is_perfect()), Some(true));
    }
}
