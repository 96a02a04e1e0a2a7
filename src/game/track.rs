// Beat lane geometry shared by the beat state machine and the parry matcher.

// All positions are in track pixels along a single lane.
pub const DEFAULT_SPAWN_X: f32 = 0.0;
pub const DEFAULT_TRIGGER_X: f32 = 400.0;
pub const DEFAULT_END_X: f32 = 800.0;
pub const DEFAULT_TRIGGER_DISTANCE: f32 = 30.0;

/// A beat travels from `spawn_x` to `end_x` as its progress goes from 0 to 1.
/// It is "on time" while it sits within `trigger_distance` of `trigger_x`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeatTrack {
    pub spawn_x: f32,
    pub trigger_x: f32,
    pub end_x: f32,
    pub trigger_distance: f32,
}

impl Default for BeatTrack {
    fn default() -> Self {
        Self {
            spawn_x: DEFAULT_SPAWN_X,
            trigger_x: DEFAULT_TRIGGER_X,
            end_x: DEFAULT_END_X,
            trigger_distance: DEFAULT_TRIGGER_DISTANCE,
        }
    }
}

impl BeatTrack {
    #[inline(always)]
    pub fn position_at(&self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);
        (self.end_x - self.spawn_x).mul_add(t, self.spawn_x)
    }

    #[inline(always)]
    pub fn distance_to_trigger(&self, progress: f32) -> f32 {
        (self.position_at(progress) - self.trigger_x).abs()
    }

    #[inline(always)]
    pub fn is_within_window(&self, progress: f32) -> bool {
        self.distance_to_trigger(progress) <= self.trigger_distance
    }

    /// Progress at which a beat sits exactly on the trigger point.
    /// Returns 0 for a degenerate lane with no length.
    pub fn trigger_progress(&self) -> f32 {
        let len = self.end_x - self.spawn_x;
        if len.abs() <= f32::EPSILON {
            return 0.0;
        }
        ((self.trigger_x - self.spawn_x) / len).clamp(0.0, 1.0)
    }
}
