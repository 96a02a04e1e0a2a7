//! Headless play session: a handful of attackers, a scripted or random
//! stream of combos, and an auto-player pressing keys with a set accuracy.
//!
//! Everything runs on a fixed step, so a seed fully determines the outcome.

use std::path::Path;

use glam::Vec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::Config;
use crate::core::input::{ParryAction, ParryInputGate};
use crate::error::{RhythmError, ScriptError};
use crate::game::beat::{BeatId, BeatSpec, BeatState, Direction, Resolution};
use crate::game::combo::ComboReport;
use crate::game::engine::RhythmEngine;
use crate::game::entity::{EntityId, EntityRoster, EntityTable};
use crate::game::generator::ComboGenerator;
use crate::game::meter::{NoiseMeter, ParryStack};
use crate::game::notify::{RewardNotifier, RhythmEvent, dispatch};

const ATTACK_COOLDOWN_S: f32 = 5.0;
// Where the player dashes to, relative to the ultimate's source, on a good read.
const SAFE_DASH_OFFSET: f32 = 10.0;
const SUMMARY_REPORTS: usize = 8;

#[derive(Clone, Debug)]
pub struct SimOptions {
    pub seconds: f32,
    pub seed: u64,
    /// Chance (0..=1) that the auto-player answers a beat correctly.
    pub accuracy: f32,
    pub tick_hz: u32,
    pub script: Option<Vec<Vec<BeatSpec>>>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            seconds: 60.0,
            seed: 1,
            accuracy: 0.8,
            tick_hz: 60,
            script: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub seed: u64,
    pub seconds_simulated: f64,
    pub combos_started: usize,
    pub combos_finished: usize,
    pub perfect_combos: u32,
    pub beats_released: usize,
    pub perfect_parries: usize,
    pub missed_parries: usize,
    pub timed_out: usize,
    pub aborted: usize,
    pub penalty_total: f32,
    pub noise: u32,
    pub max_noise: u32,
    pub game_over: bool,
    pub parry_stack: u32,
    pub parry_level: u32,
    pub stack_rewards: u32,
    pub attackers_alive: usize,
    pub attackers_defeated: usize,
    pub recent_combos: Vec<ComboReport>,
}

/// Reads a JSON array of combos, each an array of beat specs.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<BeatSpec>>, ScriptError> {
    let text = std::fs::read_to_string(path)?;
    let combos: Vec<Vec<BeatSpec>> = serde_json::from_str(&text)?;
    if combos.is_empty() {
        return Err(ScriptError::Empty);
    }
    Ok(combos)
}

#[derive(Debug)]
struct Attacker {
    id: EntityId,
    cooldown: f32,
}

#[derive(Debug, Default)]
struct RewardTally(u32);

impl RewardNotifier for RewardTally {
    fn apply_combo_reward(&mut self) {
        self.0 += 1;
    }
}

pub fn run_session(cfg: &Config, opts: &SimOptions) -> Result<SessionSummary, RhythmError> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let dt = 1.0 / opts.tick_hz.max(1) as f32;
    let accuracy = f64::from(opts.accuracy.clamp(0.0, 1.0));
    let total_ticks = (opts.seconds.max(0.0) * opts.tick_hz.max(1) as f32).ceil() as u64;

    let mut engine = RhythmEngine::from_config(cfg);
    let generator = ComboGenerator::from_config(cfg);
    let mut gate = ParryInputGate::from_config(cfg);
    let mut meter = NoiseMeter::from_config(cfg);
    let mut stack = ParryStack::from_config(cfg);
    let mut rewards = RewardTally::default();

    let mut roster = EntityRoster::new();
    let mut attackers: Vec<Attacker> = [(-8.0, 4.0), (0.0, 6.0), (7.0, 8.0)]
        .iter()
        .enumerate()
        .map(|(i, &(x, damage))| Attacker {
            id: roster.spawn(Vec2::new(x, 0.0), damage, 30),
            cooldown: 0.5 + i as f32 * 1.7,
        })
        .collect();
    let player = Vec2::new(1.0, 0.0);

    let mut summary = SessionSummary {
        seed: opts.seed,
        max_noise: meter.max(),
        ..SessionSummary::default()
    };
    let mut decided: FxHashSet<BeatId> = FxHashSet::default();
    let mut script_cursor = 0usize;
    let kill_at = f64::from(opts.seconds) * 0.5;
    let mut killed = false;

    info!(
        "Session start: seed {}, {:.0}s at {} Hz, accuracy {:.2}",
        opts.seed, opts.seconds, opts.tick_hz, opts.accuracy
    );

    for _ in 0..total_ticks {
        gate.tick(dt);
        meter.tick(dt);

        // Attackers swing on their own cooldowns.
        for a in &mut attackers {
            if !roster.is_alive(a.id) {
                continue;
            }
            a.cooldown -= dt;
            if a.cooldown > 0.0 {
                continue;
            }
            a.cooldown = ATTACK_COOLDOWN_S;
            let specs = match &opts.script {
                Some(script) if !script.is_empty() => {
                    let combo = script[script_cursor % script.len()].clone();
                    script_cursor += 1;
                    combo
                }
                _ => {
                    let damage = roster.standard_penalty(a.id).unwrap_or(0.0);
                    generator.generate(&mut rng, damage)
                }
            };
            engine.request_combo(a.id, specs)?;
        }

        engine.tick(dt, &roster);
        auto_play(
            &mut engine,
            &roster,
            &mut gate,
            &mut rng,
            accuracy,
            player,
            &mut decided,
        );

        // Take out an attacker halfway through, mid-combo if possible.
        if !killed && engine.now() >= kill_at {
            let target = attackers
                .iter()
                .find(|a| roster.is_alive(a.id) && engine.combos_of(a.id) > 0);
            if let Some(a) = target {
                info!("{} defeated at {:.2}s", a.id, engine.now());
                roster.damage(a.id, i32::MAX);
                killed = true;
            }
        }

        let batch: Vec<RhythmEvent> = engine.drain_events().collect();
        tally(&mut summary, &batch);
        dispatch(batch, &mut meter, &mut rewards, &mut stack);
        decided.retain(|id| engine.active_beats().get(*id).is_some());

        if meter.is_game_over() {
            info!("Game over at {:.2}s", engine.now());
            break;
        }
    }

    summary.seconds_simulated = engine.now();
    summary.perfect_combos = rewards.0;
    summary.noise = meter.current();
    summary.game_over = meter.is_game_over();
    summary.parry_stack = stack.stack();
    summary.parry_level = stack.level();
    summary.stack_rewards = stack.rewards_ready();
    summary.attackers_alive = roster.alive_count();
    summary.attackers_defeated = attackers.len() - summary.attackers_alive;
    let history: Vec<ComboReport> = engine.history().cloned().collect();
    let skip = history.len().saturating_sub(SUMMARY_REPORTS);
    summary.recent_combos = history.into_iter().skip(skip).collect();
    Ok(summary)
}

/// Answers each beat once, as it enters the trigger window.
fn auto_play(
    engine: &mut RhythmEngine,
    roster: &EntityRoster,
    gate: &mut ParryInputGate,
    rng: &mut StdRng,
    accuracy: f64,
    player: Vec2,
    decided: &mut FxHashSet<BeatId>,
) {
    if let Some(t) = engine.matcher().select_ultimate(engine.active_beats())
        && t.within_window
        && decided.insert(t.beat)
    {
        let source = engine
            .active_beats()
            .get(t.beat)
            .and_then(|b| roster.position(b.owner()))
            .unwrap_or(Vec2::ZERO);
        let at = if rng.gen_bool(accuracy) {
            source + Vec2::new(SAFE_DASH_OFFSET, 0.0)
        } else {
            source
        };
        gate.submit(ParryAction::Dash, at, engine, roster);
    }

    if gate.is_cooling_down() {
        return;
    }
    let Some(t) = engine.matcher().select_directional(engine.active_beats()) else {
        return;
    };
    if !t.within_window || !decided.insert(t.beat) {
        return;
    }
    let pressed = if rng.gen_bool(accuracy) {
        t.required
    } else if rng.gen_bool(0.5) {
        // Freeze and let it time out.
        return;
    } else {
        let others: Vec<Direction> = Direction::NORMAL
            .into_iter()
            .filter(|d| *d != t.required)
            .collect();
        others[rng.gen_range(0..others.len())]
    };
    if let Some(out) = gate.submit(ParryAction::Parry(pressed), player, engine, roster) {
        debug!("Auto-player pressed {pressed:?}: {:?}", out.resolution);
    }
}

fn tally(summary: &mut SessionSummary, events: &[RhythmEvent]) {
    for ev in events {
        match ev {
            RhythmEvent::ComboStarted { .. } => summary.combos_started += 1,
            RhythmEvent::BeatReleased { .. } => summary.beats_released += 1,
            RhythmEvent::BeatStateChanged {
                state: BeatState::Resolved(r),
                ..
            } => match r {
                Resolution::ParriedPerfect => summary.perfect_parries += 1,
                Resolution::ParriedMiss => summary.missed_parries += 1,
                Resolution::TimedOut => summary.timed_out += 1,
                Resolution::Aborted => summary.aborted += 1,
            },
            RhythmEvent::BeatStateChanged { .. } | RhythmEvent::PerfectCombo { .. } => {}
            RhythmEvent::Penalty { amount, .. } => summary.penalty_total += amount,
            RhythmEvent::ComboEnded { .. } => summary.combos_finished += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SimOptions, load_script, run_session};
    use crate::config::Config;
    use crate::error::{RhythmError, ScriptError};
    use crate::game::beat::{BeatSpec, Direction};

    fn opts(seed: u64, accuracy: f32) -> SimOptions {
        SimOptions {
            seconds: 40.0,
            seed,
            accuracy,
            ..SimOptions::default()
        }
    }

    // A meter that never fills, so sessions run to the end.
    fn roomy() -> Config {
        Config {
            max_noise: 1_000_000,
            ..Config::default()
        }
    }

    #[test]
    fn same_seed_same_session() {
        let a = run_session(&roomy(), &opts(9, 0.7)).unwrap();
        let b = run_session(&roomy(), &opts(9, 0.7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn accuracy_drives_the_outcome() {
        let good = run_session(&roomy(), &opts(3, 1.0)).unwrap();
        let bad = run_session(&roomy(), &opts(3, 0.0)).unwrap();
        assert!(good.perfect_parries > bad.perfect_parries);
        assert_eq!(bad.perfect_parries, 0);
        assert_eq!(bad.perfect_combos, 0);
        assert!(bad.penalty_total > good.penalty_total);
    }

    #[test]
    fn session_accounts_for_every_beat() {
        let s = run_session(&roomy(), &opts(5, 0.6)).unwrap();
        assert!(s.combos_started > 0);
        assert_eq!(s.attackers_defeated, 1);
        let resolved = s.perfect_parries + s.missed_parries + s.timed_out + s.aborted;
        assert!(resolved <= s.beats_released);
        assert!(s.combos_finished <= s.combos_started);
        assert!(!s.recent_combos.is_empty());
    }

    #[test]
    fn full_meter_ends_the_session_early() {
        let cfg = Config {
            max_noise: 5,
            ..Config::default()
        };
        let s = run_session(&cfg, &opts(2, 0.0)).unwrap();
        assert!(s.game_over);
        assert_eq!(s.noise, 5);
        assert!(s.seconds_simulated < 40.0);
    }

    #[test]
    fn scripted_combos_are_validated() {
        let bad = SimOptions {
            script: Some(vec![vec![BeatSpec::new(Direction::Up, -1.0, 0.0)]]),
            ..opts(1, 1.0)
        };
        assert!(matches!(
            run_session(&roomy(), &bad),
            Err(RhythmError::InvalidSpec(_))
        ));
    }

    #[test]
    fn script_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("parrysync-script-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("combos.json");

        std::fs::write(
            &path,
            r#"[[{"direction":"Up","travel_duration":1.5},{"direction":"Ultimate","travel_duration":3.0,"penalty_value":20.0}]]"#,
        )
        .unwrap();
        let script = load_script(&path).unwrap();
        assert_eq!(script[0].len(), 2);
        assert_eq!(script[0][0].penalty_value, 0.0);

        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(load_script(&path), Err(ScriptError::Empty)));
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(load_script(&path), Err(ScriptError::Format(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
