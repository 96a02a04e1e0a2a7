use std::cmp::Ordering;

use glam::Vec2;

use crate::game::active_set::ActiveBeatSet;
use crate::game::beat::{Beat, BeatId, Direction};
use crate::game::track::BeatTrack;

// Minimum distance (world units) the player must keep from an ultimate's source.
pub const DEFAULT_ULTIMATE_MIN_DISTANCE: f32 = 3.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParryVerdict {
    Perfect,
    Miss,
}

/// The beat an input is evaluated against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParryTarget {
    pub beat: BeatId,
    pub distance: f32,
    pub within_window: bool,
    pub required: Direction,
}

#[derive(Copy, Clone, Debug)]
pub struct ParryMatcher {
    track: BeatTrack,
    ultimate_min_distance: f32,
}

impl ParryMatcher {
    pub const fn new(track: BeatTrack, ultimate_min_distance: f32) -> Self {
        Self {
            track,
            ultimate_min_distance,
        }
    }

    #[inline(always)]
    pub const fn track(&self) -> &BeatTrack {
        &self.track
    }

    #[inline(always)]
    pub const fn ultimate_min_distance(&self) -> f32 {
        self.ultimate_min_distance
    }

    /// Nearest unresolved beat with a normal direction. Ultimate beats never
    /// take part in directional matching.
    pub fn select_directional(&self, set: &ActiveBeatSet) -> Option<ParryTarget> {
        self.nearest(set, |b| !b.direction().is_ultimate())
    }

    pub fn select_ultimate(&self, set: &ActiveBeatSet) -> Option<ParryTarget> {
        self.nearest(set, |b| b.direction().is_ultimate())
    }

    /// Picks the eligible beat closest to the trigger point. Ties go to the
    /// beat released first, then to the first one in iteration order.
    fn nearest<F>(&self, set: &ActiveBeatSet, eligible: F) -> Option<ParryTarget>
    where
        F: Fn(&Beat) -> bool,
    {
        let mut best: Option<(&Beat, f32)> = None;
        for b in set.iter().filter(|b| !b.is_resolved() && eligible(b)) {
            let d = b.distance_to_trigger(&self.track);
            let better = match best {
                None => true,
                Some((cur, cur_d)) => match d.total_cmp(&cur_d) {
                    Ordering::Less => true,
                    Ordering::Equal => b.start_time() < cur.start_time(),
                    Ordering::Greater => false,
                },
            };
            if better {
                best = Some((b, d));
            }
        }

        best.map(|(b, distance)| ParryTarget {
            beat: b.id(),
            distance,
            within_window: distance <= self.track.trigger_distance,
            required: b.direction(),
        })
    }

    #[inline(always)]
    pub fn classify_direction(&self, target: &ParryTarget, pressed: Direction) -> ParryVerdict {
        if target.within_window && pressed == target.required {
            ParryVerdict::Perfect
        } else {
            ParryVerdict::Miss
        }
    }

    /// An ultimate is evaded by being far enough from its source while it is
    /// inside the trigger window.
    #[inline(always)]
    pub fn classify_proximity(&self, target: &ParryTarget, acting: Vec2, source: Vec2) -> ParryVerdict {
        if target.within_window && acting.distance(source) > self.ultimate_min_distance {
            ParryVerdict::Perfect
        } else {
            ParryVerdict::Miss
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ParryMatcher, ParryVerdict};
    use crate::game::active_set::ActiveBeatSet;
    use crate::game::beat::{Beat, BeatId, BeatSpec, Direction, Resolution};
    use crate::game::combo::ComboId;
    use crate::game::entity::EntityId;
    use crate::game::track::BeatTrack;
    use glam::Vec2;

    fn matcher() -> ParryMatcher {
        ParryMatcher::new(BeatTrack::default(), 3.0)
    }

    // Inserts a beat released at `start` and advances it to `now`.
    fn push(set: &mut ActiveBeatSet, id: u64, dir: Direction, start: f64, now: f64) {
        let mut b = Beat::new(
            BeatId(id),
            ComboId(1),
            EntityId(0),
            BeatSpec::new(dir, 2.0, 4.0),
            start,
        );
        b.advance(now, &BeatTrack::default());
        set.insert(b);
    }

    #[test]
    fn empty_or_ineligible_set_yields_no_target() {
        let m = matcher();
        let mut set = ActiveBeatSet::new();
        assert!(m.select_directional(&set).is_none());

        push(&mut set, 1, Direction::Ultimate, 0.0, 1.0);
        assert!(
            m.select_directional(&set).is_none(),
            "ultimate beats are excluded from directional matching"
        );
        assert_eq!(m.select_ultimate(&set).map(|t| t.beat), Some(BeatId(1)));
    }

    #[test]
    fn nearest_beat_wins_regardless_of_direction() {
        let m = matcher();
        let mut set = ActiveBeatSet::new();
        // progress 0.25 → 200px from trigger
        push(&mut set, 1, Direction::Up, 0.5, 1.0);
        // progress 0.45 → 40px from trigger
        push(&mut set, 2, Direction::Down, 0.1, 1.0);
        let t = m.select_directional(&set).unwrap();
        assert_eq!(t.beat, BeatId(2));
        assert!(!t.within_window);
        assert_eq!(
            m.classify_direction(&t, Direction::Up),
            ParryVerdict::Miss,
            "pressing the far beat's direction still evaluates the near one"
        );
    }

    #[test]
    fn ties_break_on_earliest_start() {
        let m = matcher();
        let mut set = ActiveBeatSet::new();
        // Same distance: one before the trigger, one equally far past it.
        push(&mut set, 1, Direction::Left, 0.8, 1.8); // progress 0.5, on the point
        push(&mut set, 2, Direction::Right, 0.5, 1.0); // progress 0.25
        push(&mut set, 3, Direction::Right, 0.0, 1.5); // progress 0.75, same distance as #2
        set.get_mut(BeatId(1)).unwrap().resolve(Resolution::Aborted);

        let t = m.select_directional(&set).unwrap();
        assert_eq!(t.beat, BeatId(3), "#3 started earlier than #2");
    }

    #[test]
    fn perfect_needs_window_and_direction() {
        let m = matcher();
        let mut set = ActiveBeatSet::new();
        push(&mut set, 1, Direction::Left, 0.0, 1.0);
        let t = m.select_directional(&set).unwrap();
        assert!(t.within_window);
        assert_eq!(m.classify_direction(&t, Direction::Left), ParryVerdict::Perfect);
        assert_eq!(m.classify_direction(&t, Direction::Right), ParryVerdict::Miss);
    }

    #[test]
    fn proximity_needs_window_and_distance() {
        let m = matcher();
        let mut set = ActiveBeatSet::new();
        push(&mut set, 1, Direction::Ultimate, 0.0, 1.0);
        let t = m.select_ultimate(&set).unwrap();
        let source = Vec2::new(1.0, 0.0);
        assert_eq!(
            m.classify_proximity(&t, Vec2::new(5.0, 0.0), source),
            ParryVerdict::Perfect
        );
        assert_eq!(
            m.classify_proximity(&t, Vec2::new(2.0, 0.0), source),
            ParryVerdict::Miss
        );

        let mut early = ActiveBeatSet::new();
        push(&mut early, 2, Direction::Ultimate, 0.0, 0.2);
        let t = m.select_ultimate(&early).unwrap();
        assert_eq!(
            m.classify_proximity(&t, Vec2::new(50.0, 0.0), source),
            ParryVerdict::Miss,
            "dashing before the window opens is a miss"
        );
    }
}
