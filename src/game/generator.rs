use rand::Rng;

use crate::config::Config;
use crate::game::beat::{BeatSpec, Direction};

/// Rolls random attack combos for an attacker.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComboGenerator {
    pub min_hits: u8,
    pub max_hits: u8,
    pub ultimate_chance: f32,
    pub min_travel_s: f32,
    pub max_travel_s: f32,
    pub ultimate_travel_s: f32,
    pub ultimate_penalty: f32,
}

impl Default for ComboGenerator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ComboGenerator {
    pub const fn from_config(cfg: &Config) -> Self {
        Self {
            min_hits: cfg.min_hits_in_combo,
            max_hits: cfg.max_hits_in_combo,
            ultimate_chance: cfg.ultimate_chance,
            min_travel_s: cfg.min_travel_s,
            max_travel_s: cfg.max_travel_s,
            ultimate_travel_s: cfg.ultimate_travel_s,
            ultimate_penalty: cfg.ultimate_miss_penalty,
        }
    }

    /// Builds one combo. Normal beats cost `attacker_penalty` when they time
    /// out; ultimates cost the ultimate penalty and use a fixed travel time.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, attacker_penalty: f32) -> Vec<BeatSpec> {
        let lo = self.min_hits.max(1);
        let hi = self.max_hits.max(lo);
        let hits = rng.gen_range(lo..=hi);
        let chance = f64::from(self.ultimate_chance.clamp(0.0, 1.0));
        let penalty = attacker_penalty.max(0.0);

        (0..hits)
            .map(|_| {
                if rng.gen_bool(chance) {
                    BeatSpec::new(
                        Direction::Ultimate,
                        self.ultimate_travel_s,
                        self.ultimate_penalty,
                    )
                } else {
                    let dir = Direction::NORMAL[rng.gen_range(0..Direction::NORMAL.len())];
                    BeatSpec::new(dir, self.travel_time(rng), penalty)
                }
            })
            .collect()
    }

    fn travel_time<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max_travel_s > self.min_travel_s {
            rng.gen_range(self.min_travel_s..self.max_travel_s)
        } else {
            self.min_travel_s
        }
    }
}
