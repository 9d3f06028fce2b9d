use crate::hotkey::{ModifierFlags, ModifierKey, ModifierSpec};
use std::time::{Duration, Instant};

pub const DEFAULT_TRIGGER_DELAY: Duration = Duration::from_millis(120);
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(150);

/// Where the detector is in recognising a held-modifier gesture.
///
/// Pending timers live inside the state as deadlines; the owner polls
/// [`GestureDetector::poll`] once [`GestureDetector::next_deadline`] passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Armed {
        deadline: Instant,
        extra: ModifierFlags,
    },
    Active {
        extra: ModifierFlags,
    },
    PendingRelease {
        deadline: Instant,
        extra: ModifierFlags,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSignal {
    Activated { secondary: bool },
    /// The allowed additional modifier was pressed or released while active.
    ModeChanged { secondary: bool },
    Released,
    /// A non-modifier key interrupted an active gesture; the user is typing a
    /// shortcut.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chord {
    /// Target held with an accepted extra mask (empty or the allowed key).
    Target(ModifierFlags),
    /// Target held together with something it may not be combined with.
    Foreign,
    /// Target not held.
    Without,
}

#[derive(Debug)]
pub struct GestureDetector {
    spec: ModifierSpec,
    trigger_delay: Duration,
    release_delay: Duration,
    state: GestureState,
    other_key_held: bool,
}

impl GestureDetector {
    pub fn new(spec: ModifierSpec, trigger_delay: Duration, release_delay: Duration) -> Self {
        Self {
            spec,
            trigger_delay,
            release_delay,
            state: GestureState::Idle,
            other_key_held: false,
        }
    }

    pub fn with_defaults(spec: ModifierSpec) -> Self {
        Self::new(spec, DEFAULT_TRIGGER_DELAY, DEFAULT_RELEASE_DELAY)
    }

    pub fn spec(&self) -> ModifierSpec {
        self.spec
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// True while lookups may run: active or waiting to confirm a release.
    pub fn is_engaged(&self) -> bool {
        matches!(
            self.state,
            GestureState::Active { .. } | GestureState::PendingRelease { .. }
        )
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            GestureState::Armed { deadline, .. } | GestureState::PendingRelease { deadline, .. } => {
                Some(deadline)
            }
            _ => None,
        }
    }

    pub fn on_modifier_change(
        &mut self,
        flags: ModifierFlags,
        changed: Option<ModifierKey>,
        now: Instant,
    ) -> Option<GestureSignal> {
        let chord = self.classify(flags);
        match (self.state, chord) {
            (GestureState::Idle, Chord::Target(extra)) => {
                if self.other_key_held {
                    tracing::debug!(%flags, "modifier pressed while another key is held; not arming");
                    return None;
                }
                tracing::debug!(%flags, "gesture armed");
                self.state = GestureState::Armed {
                    deadline: now + self.trigger_delay,
                    extra,
                };
                None
            }
            (GestureState::Idle, _) => None,
            (GestureState::Armed { deadline, .. }, Chord::Target(extra)) => {
                self.state = GestureState::Armed { deadline, extra };
                None
            }
            (GestureState::Armed { .. }, _) => {
                tracing::debug!(%flags, "arming cancelled");
                self.state = GestureState::Idle;
                None
            }
            (GestureState::Active { extra: old }, Chord::Target(extra)) => {
                self.state = GestureState::Active { extra };
                self.mode_change(old, extra)
            }
            (GestureState::Active { .. }, Chord::Foreign) => {
                tracing::debug!(%flags, "extra modifier joined an active gesture; aborting");
                self.state = GestureState::Idle;
                Some(GestureSignal::Aborted)
            }
            (GestureState::Active { extra }, Chord::Without) => {
                if changed.is_some_and(|key| key != self.spec.target) {
                    // Another key's release does not end the gesture.
                    return None;
                }
                tracing::debug!("gesture modifier released; confirming");
                self.state = GestureState::PendingRelease {
                    deadline: now + self.release_delay,
                    extra,
                };
                None
            }
            (GestureState::PendingRelease { extra: old, .. }, Chord::Target(extra)) => {
                tracing::debug!("gesture modifier re-asserted; release cancelled");
                self.state = GestureState::Active { extra };
                self.mode_change(old, extra)
            }
            (GestureState::PendingRelease { .. }, Chord::Foreign) => {
                self.state = GestureState::Idle;
                Some(GestureSignal::Aborted)
            }
            (GestureState::PendingRelease { .. }, Chord::Without) => None,
        }
    }

    pub fn on_other_key(&mut self, is_down: bool, _now: Instant) -> Option<GestureSignal> {
        self.other_key_held = is_down;
        if !is_down {
            return None;
        }
        match self.state {
            GestureState::Idle => None,
            GestureState::Armed { .. } => {
                tracing::debug!("key pressed while armed; treating as shortcut");
                self.state = GestureState::Idle;
                None
            }
            GestureState::Active { .. } | GestureState::PendingRelease { .. } => {
                tracing::debug!("key pressed during gesture; aborting");
                self.state = GestureState::Idle;
                Some(GestureSignal::Aborted)
            }
        }
    }

    /// Fire whichever timer has expired by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<GestureSignal> {
        match self.state {
            GestureState::Armed { deadline, extra } if now >= deadline => {
                tracing::debug!("gesture activated");
                self.state = GestureState::Active { extra };
                Some(GestureSignal::Activated {
                    secondary: !extra.is_empty(),
                })
            }
            GestureState::PendingRelease { deadline, .. } if now >= deadline => {
                tracing::debug!("gesture released");
                self.state = GestureState::Idle;
                Some(GestureSignal::Released)
            }
            _ => None,
        }
    }

    /// Reset to idle. Returns whether a gesture was engaged.
    pub fn stop(&mut self) -> bool {
        let engaged = self.is_engaged();
        self.state = GestureState::Idle;
        self.other_key_held = false;
        engaged
    }

    fn classify(&self, flags: ModifierFlags) -> Chord {
        if !flags.contains(self.spec.target) {
            return Chord::Without;
        }
        let extra = flags.without(self.spec.target);
        if extra.is_empty() {
            return Chord::Target(extra);
        }
        match self.spec.allowed_additional {
            Some(allowed) if extra == ModifierFlags::from(allowed) => Chord::Target(extra),
            _ => Chord::Foreign,
        }
    }

    fn mode_change(&self, old: ModifierFlags, new: ModifierFlags) -> Option<GestureSignal> {
        if old.is_empty() == new.is_empty() {
            None
        } else {
            Some(GestureSignal::ModeChanged {
                secondary: !new.is_empty(),
            })
        }
    }
}
