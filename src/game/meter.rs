// Player-side consumers of engine notifications: the noise meter that acts
// as the player's health, and the stack of consecutive perfect parries.

use log::{info, warn};

use crate::config::Config;
use crate::game::beat::{BeatId, BeatState, Resolution};
use crate::game::notify::{BeatObserver, PenaltyNotifier};

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseMeter {
    current: u32,
    max: u32,
    decay_per_s: f32,
    decay_carry: f32,
    game_over: bool,
}

impl NoiseMeter {
    pub fn new(max: u32, decay_per_s: f32) -> Self {
        Self {
            current: 0,
            max: max.max(1),
            decay_per_s: decay_per_s.max(0.0),
            decay_carry: 0.0,
            game_over: false,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.max_noise, cfg.noise_decay_per_s)
    }

    #[inline(always)]
    pub const fn current(&self) -> u32 {
        self.current
    }

    #[inline(always)]
    pub const fn max(&self) -> u32 {
        self.max
    }

    #[inline(always)]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    /// Bleeds off noise at the configured rate. Whole points only; the
    /// remainder carries over to the next tick.
    pub fn tick(&mut self, delta_time: f32) {
        if self.game_over || self.decay_per_s <= 0.0 || delta_time.is_nan() || delta_time <= 0.0 {
            return;
        }
        self.decay_carry += self.decay_per_s * delta_time;
        let whole = self.decay_carry.floor();
        if whole >= 1.0 {
            self.decay_carry -= whole;
            self.current = self.current.saturating_sub(whole as u32);
        }
    }
}

impl PenaltyNotifier for NoiseMeter {
    fn apply_penalty(&mut self, amount: f32) {
        if self.game_over {
            return;
        }
        let points = amount.round().max(0.0) as u32;
        self.current = self.current.saturating_add(points).min(self.max);
        if self.current >= self.max {
            self.game_over = true;
            warn!("Noise meter full ({}/{}): game over", self.current, self.max);
        }
    }
}

/// Counts consecutive perfect parries toward a reward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParryStack {
    stack: u32,
    required: u32,
    per_level: u32,
    rewards_ready: u32,
}

impl ParryStack {
    pub fn new(required: u32, per_level: u32) -> Self {
        Self {
            stack: 0,
            required: required.max(1),
            per_level: per_level.max(1),
            rewards_ready: 0,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.required_parry_stacks, cfg.parries_per_level)
    }

    #[inline(always)]
    pub const fn stack(&self) -> u32 {
        self.stack
    }

    /// Display level, one step per `per_level` parries.
    pub fn level(&self) -> u32 {
        let max_level = self.required / self.per_level;
        (self.stack / self.per_level).min(max_level)
    }

    /// Consumes one pending reward, if any.
    pub fn take_reward(&mut self) -> bool {
        if self.rewards_ready == 0 {
            return false;
        }
        self.rewards_ready -= 1;
        true
    }

    #[inline(always)]
    pub const fn rewards_ready(&self) -> u32 {
        self.rewards_ready
    }
}

impl BeatObserver for ParryStack {
    fn on_beat_state_changed(&mut self, _beat: BeatId, state: BeatState) {
        match state {
            BeatState::Resolved(Resolution::ParriedPerfect) => {
                self.stack += 1;
                if self.stack >= self.required {
                    info!("Parry stack full ({}): reward ready", self.stack);
                    self.rewards_ready += 1;
                    self.stack = 0;
                }
            }
            BeatState::Resolved(r) if r.breaks_perfection() => self.stack = 0,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoiseMeter, ParryStack};
    use crate::game::beat::{BeatId, BeatState, Resolution};
    use crate::game::notify::{BeatObserver, PenaltyNotifier};

    #[test]
    fn penalties_round_and_latch_game_over() {
        let mut m = NoiseMeter::new(10, 0.0);
        m.apply_penalty(2.4);
        m.apply_penalty(2.6);
        assert_eq!(m.current(), 5);
        m.apply_penalty(-3.0);
        assert_eq!(m.current(), 5, "negative amounts are ignored");
        m.apply_penalty(40.0);
        assert_eq!(m.current(), 10);
        assert!(m.is_game_over());
        m.tick(10.0);
        assert_eq!(m.current(), 10, "no decay once the game is over");
    }

    #[test]
    fn decay_carries_fractions_between_ticks() {
        let mut m = NoiseMeter::new(100, 2.0);
        m.apply_penalty(10.0);
        for _ in 0..5 {
            m.tick(0.1);
        }
        // 5 * 0.1 * 2.0 = 1 whole point, give or take float error.
        m.tick(0.01);
        assert_eq!(m.current(), 9);
        m.tick(100.0);
        assert_eq!(m.current(), 0);
    }

    fn resolve(s: &mut ParryStack, r: Resolution) {
        s.on_beat_state_changed(BeatId(0), BeatState::Resolved(r));
    }

    #[test]
    fn stack_fills_then_resets() {
        let mut s = ParryStack::new(6, 3);
        for _ in 0..4 {
            resolve(&mut s, Resolution::ParriedPerfect);
        }
        assert_eq!((s.stack(), s.level()), (4, 1));
        resolve(&mut s, Resolution::Aborted);
        assert_eq!(s.stack(), 4, "aborts leave the stack alone");
        resolve(&mut s, Resolution::ParriedPerfect);
        resolve(&mut s, Resolution::ParriedPerfect);
        assert_eq!(s.stack(), 0);
        assert!(s.take_reward());
        assert!(!s.take_reward());
    }

    #[test]
    fn misses_and_timeouts_reset_the_stack() {
        let mut s = ParryStack::new(12, 3);
        resolve(&mut s, Resolution::ParriedPerfect);
        resolve(&mut s, Resolution::ParriedPerfect);
        resolve(&mut s, Resolution::ParriedMiss);
        assert_eq!(s.stack(), 0);
        resolve(&mut s, Resolution::ParriedPerfect);
        s.on_beat_state_changed(BeatId(1), BeatState::WithinWindow);
        assert_eq!(s.stack(), 1);
        resolve(&mut s, Resolution::TimedOut);
        assert_eq!(s.stack(), 0);
        assert_eq!(s.rewards_ready(), 0);
    }
}
