use crate::model::{ScreenPoint, ScreenRect};
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
pub const DEFAULT_MIN_DISTANCE: f64 = 10.0;
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A pointer position accepted for lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPoint {
    pub position: ScreenPoint,
    pub at: Instant,
}

/// Rate and distance filter for pointer samples taken while a gesture is
/// held.
#[derive(Debug)]
pub struct MotionDebouncer {
    interval: Duration,
    min_distance: f64,
    active: bool,
    last_accepted: Option<TriggerPoint>,
    overlay_bounds: Option<ScreenRect>,
}

impl MotionDebouncer {
    /// `interval` is clamped to at least one millisecond.
    pub fn new(interval: Duration, min_distance: f64) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            min_distance,
            active: false,
            last_accepted: None,
            overlay_bounds: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start accepting samples; the next one is emitted unconditionally.
    pub fn activate(&mut self) {
        self.active = true;
        self.last_accepted = None;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.last_accepted = None;
    }

    /// Bounds of the overlay currently on screen, if any.
    pub fn set_overlay_bounds(&mut self, bounds: Option<ScreenRect>) {
        self.overlay_bounds = bounds;
    }

    pub fn last_accepted(&self) -> Option<TriggerPoint> {
        self.last_accepted
    }

    pub fn sample(&mut self, position: ScreenPoint, now: Instant) -> Option<TriggerPoint> {
        if !self.active {
            return None;
        }
        if self
            .overlay_bounds
            .is_some_and(|bounds| bounds.contains(position))
        {
            return None;
        }

        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last.at) < self.interval {
                return None;
            }
            let dx = (position.x - last.position.x).abs();
            let dy = (position.y - last.position.y).abs();
            if dx <= self.min_distance && dy <= self.min_distance {
                return None;
            }
        }

        let trigger = TriggerPoint { position, at: now };
        self.last_accepted = Some(trigger);
        Some(trigger)
    }
}

impl Default for MotionDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, DEFAULT_MIN_DISTANCE)
    }
}
