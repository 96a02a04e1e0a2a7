use ini::Ini;
use log::{info, warn};
use std::path::Path;
use std::str::FromStr;

use crate::game::matcher::DEFAULT_ULTIMATE_MIN_DISTANCE;
use crate::game::timeline::{DEFAULT_SAFETY_MARGIN_S, DEFAULT_TRIGGER_DISTANCE_RATIO, ReleasePacing};
use crate::game::track::{
    BeatTrack, DEFAULT_END_X, DEFAULT_SPAWN_X, DEFAULT_TRIGGER_DISTANCE, DEFAULT_TRIGGER_X,
};

pub const CONFIG_PATH: &str = "parrysync.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    // [Track] lane geometry in pixels.
    pub spawn_x: f32,
    pub trigger_x: f32,
    pub end_x: f32,
    pub trigger_distance: f32,
    // [Timing]
    pub trigger_distance_ratio: f32,
    pub safety_margin_s: f32,
    pub min_travel_s: f32,
    pub max_travel_s: f32,
    pub ultimate_travel_s: f32,
    // [Ultimate]
    pub ultimate_miss_penalty: f32,
    /// World units the player must keep from the ultimate's source.
    pub ultimate_min_distance: f32,
    // [Combo]
    pub min_hits_in_combo: u8,
    pub max_hits_in_combo: u8,
    /// Chance for each generated beat to be an ultimate (0..=1).
    pub ultimate_chance: f32,
    // [Input]
    pub parry_cooldown_s: f32,
    // [Meter]
    pub max_noise: u32,
    pub noise_decay_per_s: f32,
    pub required_parry_stacks: u32,
    pub parries_per_level: u32,
    // [Log]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spawn_x: DEFAULT_SPAWN_X,
            trigger_x: DEFAULT_TRIGGER_X,
            end_x: DEFAULT_END_X,
            trigger_distance: DEFAULT_TRIGGER_DISTANCE,
            trigger_distance_ratio: DEFAULT_TRIGGER_DISTANCE_RATIO,
            safety_margin_s: DEFAULT_SAFETY_MARGIN_S,
            min_travel_s: 1.0,
            max_travel_s: 2.5,
            ultimate_travel_s: 3.0,
            ultimate_miss_penalty: 20.0,
            ultimate_min_distance: DEFAULT_ULTIMATE_MIN_DISTANCE,
            min_hits_in_combo: 3,
            max_hits_in_combo: 8,
            // One in five, as if Ultimate were drawn uniformly with the four directions.
            ultimate_chance: 0.2,
            parry_cooldown_s: 0.25,
            max_noise: 100,
            noise_decay_per_s: 0.0,
            required_parry_stacks: 12,
            parries_per_level: 3,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    pub const fn track(&self) -> BeatTrack {
        BeatTrack {
            spawn_x: self.spawn_x,
            trigger_x: self.trigger_x,
            end_x: self.end_x,
            trigger_distance: self.trigger_distance,
        }
    }

    pub const fn pacing(&self) -> ReleasePacing {
        ReleasePacing {
            trigger_distance_ratio: self.trigger_distance_ratio,
            safety_margin_s: self.safety_margin_s,
        }
    }

    /// Builds a config from an already parsed INI document. Missing or
    /// malformed keys keep their defaults; the result is sanitized.
    pub fn from_ini(conf: &Ini) -> Self {
        let d = Self::default();
        let mut cfg = Self {
            spawn_x: read(conf, "Track", "SpawnX", d.spawn_x),
            trigger_x: read(conf, "Track", "TriggerX", d.trigger_x),
            end_x: read(conf, "Track", "EndX", d.end_x),
            trigger_distance: read(conf, "Track", "TriggerDistance", d.trigger_distance),
            trigger_distance_ratio: read(
                conf,
                "Timing",
                "TriggerDistanceRatio",
                d.trigger_distance_ratio,
            ),
            safety_margin_s: read(conf, "Timing", "SafetyMargin", d.safety_margin_s),
            min_travel_s: read(conf, "Timing", "MinTravelTime", d.min_travel_s),
            max_travel_s: read(conf, "Timing", "MaxTravelTime", d.max_travel_s),
            ultimate_travel_s: read(conf, "Timing", "UltimateTravelTime", d.ultimate_travel_s),
            ultimate_miss_penalty: read(conf, "Ultimate", "MissPenalty", d.ultimate_miss_penalty),
            ultimate_min_distance: read(conf, "Ultimate", "MinDistance", d.ultimate_min_distance),
            min_hits_in_combo: read(conf, "Combo", "MinHits", d.min_hits_in_combo),
            max_hits_in_combo: read(conf, "Combo", "MaxHits", d.max_hits_in_combo),
            ultimate_chance: read(conf, "Combo", "UltimateChance", d.ultimate_chance),
            parry_cooldown_s: read(conf, "Input", "ParryCooldown", d.parry_cooldown_s),
            max_noise: read(conf, "Meter", "MaxNoise", d.max_noise),
            noise_decay_per_s: read(conf, "Meter", "DecayRate", d.noise_decay_per_s),
            required_parry_stacks: read(
                conf,
                "Meter",
                "RequiredParryStacks",
                d.required_parry_stacks,
            ),
            parries_per_level: read(conf, "Meter", "ParriesPerLevel", d.parries_per_level),
            log_level: conf
                .get_from(Some("Log"), "LogLevel")
                .and_then(|v| LogLevel::from_str(v).ok())
                .unwrap_or(d.log_level),
        };
        cfg.sanitize();
        cfg
    }

    pub fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        conf.with_section(Some("Track"))
            .set("SpawnX", self.spawn_x.to_string())
            .set("TriggerX", self.trigger_x.to_string())
            .set("EndX", self.end_x.to_string())
            .set("TriggerDistance", self.trigger_distance.to_string());
        conf.with_section(Some("Timing"))
            .set("TriggerDistanceRatio", self.trigger_distance_ratio.to_string())
            .set("SafetyMargin", self.safety_margin_s.to_string())
            .set("MinTravelTime", self.min_travel_s.to_string())
            .set("MaxTravelTime", self.max_travel_s.to_string())
            .set("UltimateTravelTime", self.ultimate_travel_s.to_string());
        conf.with_section(Some("Ultimate"))
            .set("MissPenalty", self.ultimate_miss_penalty.to_string())
            .set("MinDistance", self.ultimate_min_distance.to_string());
        conf.with_section(Some("Combo"))
            .set("MinHits", self.min_hits_in_combo.to_string())
            .set("MaxHits", self.max_hits_in_combo.to_string())
            .set("UltimateChance", self.ultimate_chance.to_string());
        conf.with_section(Some("Input"))
            .set("ParryCooldown", self.parry_cooldown_s.to_string());
        conf.with_section(Some("Meter"))
            .set("MaxNoise", self.max_noise.to_string())
            .set("DecayRate", self.noise_decay_per_s.to_string())
            .set("RequiredParryStacks", self.required_parry_stacks.to_string())
            .set("ParriesPerLevel", self.parries_per_level.to_string());
        conf.with_section(Some("Log"))
            .set("LogLevel", self.log_level.as_str());
        conf
    }

    /// Clamps values into ranges the engine can work with.
    fn sanitize(&mut self) {
        let d = Self::default();
        self.trigger_distance = finite_or(self.trigger_distance, d.trigger_distance).max(0.0);
        self.trigger_distance_ratio =
            finite_or(self.trigger_distance_ratio, d.trigger_distance_ratio).clamp(0.0, 1.0);
        self.safety_margin_s = finite_or(self.safety_margin_s, d.safety_margin_s).max(0.0);

        // Travel times must stay strictly positive or every generated combo is rejected.
        self.min_travel_s = positive_or(self.min_travel_s, d.min_travel_s);
        self.max_travel_s = positive_or(self.max_travel_s, d.max_travel_s).max(self.min_travel_s);
        self.ultimate_travel_s = positive_or(self.ultimate_travel_s, d.ultimate_travel_s);

        self.ultimate_miss_penalty =
            finite_or(self.ultimate_miss_penalty, d.ultimate_miss_penalty).max(0.0);
        self.ultimate_min_distance =
            finite_or(self.ultimate_min_distance, d.ultimate_min_distance).max(0.0);

        self.min_hits_in_combo = self.min_hits_in_combo.max(1);
        self.max_hits_in_combo = self.max_hits_in_combo.max(self.min_hits_in_combo);
        self.ultimate_chance = finite_or(self.ultimate_chance, d.ultimate_chance).clamp(0.0, 1.0);

        self.parry_cooldown_s = finite_or(self.parry_cooldown_s, d.parry_cooldown_s).max(0.0);
        self.max_noise = self.max_noise.max(1);
        self.noise_decay_per_s = finite_or(self.noise_decay_per_s, d.noise_decay_per_s).max(0.0);
        self.required_parry_stacks = self.required_parry_stacks.max(1);
        self.parries_per_level = self.parries_per_level.max(1);

        for v in [&mut self.spawn_x, &mut self.trigger_x, &mut self.end_x] {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        if (self.end_x - self.spawn_x).abs() <= f32::EPSILON {
            warn!("Track has no length; falling back to the default lane.");
            self.spawn_x = d.spawn_x;
            self.trigger_x = d.trigger_x;
            self.end_x = d.end_x;
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        self.to_ini().write_to_file(path)
    }
}

#[inline(always)]
fn read<T: FromStr>(conf: &Ini, section: &str, key: &str, default: T) -> T {
    conf.get_from(Some(section), key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[inline(always)]
fn finite_or(v: f32, default: f32) -> f32 {
    if v.is_finite() { v } else { default }
}

#[inline(always)]
fn positive_or(v: f32, default: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { default }
}

// --- File I/O ---

/// Loads the config at `path`, writing a default file first if none exists.
/// Any failure falls back to defaults; the game runs either way.
pub fn load<P: AsRef<Path>>(path: P) -> Config {
    let path = path.as_ref();
    if !path.exists() {
        info!("'{}' not found, creating with default values.", path.display());
        if let Err(e) = Config::default().save(path) {
            warn!("Failed to create default config file: {e}");
        }
        return Config::default();
    }

    match Ini::load_from_file(path) {
        Ok(conf) => {
            let cfg = Config::from_ini(&conf);
            info!("Configuration loaded from '{}'.", path.display());
            cfg
        }
        Err(e) => {
            warn!("Failed to load '{}': {e}. Using defaults.", path.display());
            Config::default()
        }
    }
}
