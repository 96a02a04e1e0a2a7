use serde::{Deserialize, Serialize};

use crate::error::SpecViolation;
use crate::game::combo::ComboId;
use crate::game::entity::EntityId;
use crate::game::track::BeatTrack;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    // Area attack: evaded by distance, never matched by a key press.
    Ultimate,
}

impl Direction {
    pub const NORMAL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
    pub const ALL: [Self; 5] = [Self::Up, Self::Down, Self::Left, Self::Right, Self::Ultimate];

    #[inline(always)]
    pub const fn is_ultimate(self) -> bool {
        matches!(self, Self::Ultimate)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Ultimate => "Ultimate",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "ultimate" => Ok(Self::Ultimate),
            _ => Err(()),
        }
    }
}

/// One required input event, as produced by a combo generator.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeatSpec {
    pub direction: Direction,
    /// Seconds from release until the beat reaches the end of the track.
    pub travel_duration: f32,
    /// Applied when the beat times out, or on any miss for an ultimate beat.
    #[serde(default)]
    pub penalty_value: f32,
}

impl BeatSpec {
    pub const fn new(direction: Direction, travel_duration: f32, penalty_value: f32) -> Self {
        Self {
            direction,
            travel_duration,
            penalty_value,
        }
    }

    pub fn validate(&self, index: usize) -> Result<(), SpecViolation> {
        if !self.travel_duration.is_finite() || self.travel_duration <= 0.0 {
            return Err(SpecViolation::TravelDuration {
                index,
                travel_duration: self.travel_duration,
            });
        }
        if !self.penalty_value.is_finite() || self.penalty_value < 0.0 {
            return Err(SpecViolation::PenaltyValue {
                index,
                penalty_value: self.penalty_value,
            });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeatId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    ParriedPerfect,
    ParriedMiss,
    TimedOut,
    Aborted,
}

impl Resolution {
    #[inline(always)]
    pub const fn breaks_perfection(self) -> bool {
        matches!(self, Self::ParriedMiss | Self::TimedOut)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeatState {
    Traveling,
    WithinWindow,
    Resolved(Resolution),
}

/// A released beat in flight.
#[derive(Clone, Debug)]
pub struct Beat {
    id: BeatId,
    combo: ComboId,
    owner: EntityId,
    spec: BeatSpec,
    start_time: f64,
    progress: f32,
    state: BeatState,
    // Set on the first tick the beat enters the window, never cleared.
    reached_trigger: bool,
}

impl Beat {
    pub(crate) const fn new(
        id: BeatId,
        combo: ComboId,
        owner: EntityId,
        spec: BeatSpec,
        start_time: f64,
    ) -> Self {
        Self {
            id,
            combo,
            owner,
            spec,
            start_time,
            progress: 0.0,
            state: BeatState::Traveling,
            reached_trigger: false,
        }
    }

    #[inline(always)]
    pub const fn id(&self) -> BeatId {
        self.id
    }

    #[inline(always)]
    pub const fn combo(&self) -> ComboId {
        self.combo
    }

    #[inline(always)]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    #[inline(always)]
    pub const fn spec(&self) -> &BeatSpec {
        &self.spec
    }

    #[inline(always)]
    pub const fn direction(&self) -> Direction {
        self.spec.direction
    }

    #[inline(always)]
    pub const fn start_time(&self) -> f64 {
        self.start_time
    }

    #[inline(always)]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    #[inline(always)]
    pub const fn state(&self) -> BeatState {
        self.state
    }

    #[inline(always)]
    pub const fn reached_trigger(&self) -> bool {
        self.reached_trigger
    }

    #[inline(always)]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.state, BeatState::Resolved(_))
    }

    pub const fn resolution(&self) -> Option<Resolution> {
        match self.state {
            BeatState::Resolved(r) => Some(r),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn has_expired(&self) -> bool {
        self.progress >= 1.0
    }

    #[inline(always)]
    pub fn distance_to_trigger(&self, track: &BeatTrack) -> f32 {
        track.distance_to_trigger(self.progress)
    }

    #[inline(always)]
    pub fn is_within_window(&self, track: &BeatTrack) -> bool {
        track.is_within_window(self.progress)
    }

    /// Recomputes progress for game time `now` and re-evaluates window
    /// membership. Returns the new state when it changed.
    pub(crate) fn advance(&mut self, now: f64, track: &BeatTrack) -> Option<BeatState> {
        if self.is_resolved() {
            return None;
        }
        let elapsed = (now - self.start_time).max(0.0);
        self.progress = (elapsed / f64::from(self.spec.travel_duration)).clamp(0.0, 1.0) as f32;

        let within = track.is_within_window(self.progress);
        if within {
            self.reached_trigger = true;
        }
        let next = if within {
            BeatState::WithinWindow
        } else {
            BeatState::Traveling
        };
        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }

    /// Moves the beat to its terminal state. A second call is a no-op and
    /// returns false.
    pub(crate) fn resolve(&mut self, resolution: Resolution) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.state = BeatState::Resolved(resolution);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Beat, BeatId, BeatSpec, BeatState, Direction, Resolution};
    use crate::error::SpecViolation;
    use crate::game::combo::ComboId;
    use crate::game::entity::EntityId;
    use crate::game::track::BeatTrack;

    fn beat(travel: f32) -> Beat {
        Beat::new(
            BeatId(1),
            ComboId(1),
            EntityId(0),
            BeatSpec::new(Direction::Up, travel, 5.0),
            10.0,
        )
    }

    #[test]
    fn enters_and_leaves_window_but_latch_sticks() {
        let track = BeatTrack::default();
        let mut b = beat(2.0);

        assert_eq!(b.advance(10.5, &track), None, "still traveling at 25%");
        assert_eq!(b.state(), BeatState::Traveling);

        assert_eq!(b.advance(11.0, &track), Some(BeatState::WithinWindow));
        assert!(b.reached_trigger());

        assert_eq!(b.advance(11.5, &track), Some(BeatState::Traveling));
        assert!(b.reached_trigger(), "latch must survive leaving the window");
        assert!(!b.has_expired());

        b.advance(12.5, &track);
        assert!(b.has_expired());
        assert!((b.progress() - 1.0).abs() <= f32::EPSILON, "progress is clamped");
    }

    #[test]
    fn resolves_exactly_once() {
        let mut b = beat(1.0);
        assert!(b.resolve(Resolution::Aborted));
        assert!(!b.resolve(Resolution::TimedOut), "second resolution is a no-op");
        assert_eq!(b.resolution(), Some(Resolution::Aborted));
        assert_eq!(
            b.advance(100.0, &BeatTrack::default()),
            None,
            "resolved beats no longer advance"
        );
    }

    #[test]
    fn spec_validation_rejects_bad_values() {
        assert!(BeatSpec::new(Direction::Left, 1.0, 0.0).validate(0).is_ok());
        assert!(matches!(
            BeatSpec::new(Direction::Left, 0.0, 1.0).validate(2),
            Err(SpecViolation::TravelDuration { index: 2, .. })
        ));
        assert!(matches!(
            BeatSpec::new(Direction::Left, f32::NAN, 1.0).validate(0),
            Err(SpecViolation::TravelDuration { .. })
        ));
        assert!(matches!(
            BeatSpec::new(Direction::Left, 1.0, -3.0).validate(1),
            Err(SpecViolation::PenaltyValue { index: 1, .. })
        ));
    }

    #[test]
    fn direction_parses_case_insensitively() {
        for d in Direction::ALL {
            assert_eq!(d.as_str().to_ascii_uppercase().parse::<Direction>(), Ok(d));
        }
        assert!("sideways".parse::<Direction>().is_err());
    }
}
