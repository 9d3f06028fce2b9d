//! The coordinating event loop: turns input events into gesture signals,
//! debounced trigger points and lookup sessions.

use crate::collaborators::CursorProvider;
use crate::coordinator::LookupCoordinator;
use crate::gesture::{GestureDetector, GestureSignal, DEFAULT_RELEASE_DELAY, DEFAULT_TRIGGER_DELAY};
use crate::hotkey::ModifierSpec;
use crate::input::{InputBus, InputEvent, UserCommand};
use crate::model::ScreenPoint;
use crate::motion::{MotionDebouncer, DEFAULT_DEBOUNCE, DEFAULT_MIN_DISTANCE};
use crate::session::SessionMode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub spec: ModifierSpec,
    pub trigger_delay: Duration,
    pub release_delay: Duration,
    pub debounce: Duration,
    pub min_distance: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            spec: ModifierSpec::default(),
            trigger_delay: DEFAULT_TRIGGER_DELAY,
            release_delay: DEFAULT_RELEASE_DELAY,
            debounce: DEFAULT_DEBOUNCE,
            min_distance: DEFAULT_MIN_DISTANCE,
        }
    }
}

pub struct Runtime {
    detector: GestureDetector,
    debouncer: MotionDebouncer,
    coordinator: LookupCoordinator,
    cursor: Option<Arc<dyn CursorProvider>>,
    bus: InputBus,
    mode: SessionMode,
    last_pointer: Option<ScreenPoint>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, coordinator: LookupCoordinator, bus: InputBus) -> Self {
        Self {
            detector: GestureDetector::new(config.spec, config.trigger_delay, config.release_delay),
            debouncer: MotionDebouncer::new(config.debounce, config.min_distance),
            coordinator,
            cursor: None,
            bus,
            mode: SessionMode::Word,
            last_pointer: None,
        }
    }

    /// Poll `cursor` at the debounce interval while a gesture is active, so a
    /// stationary pointer still gets looked up after content scrolls beneath it.
    pub fn with_cursor(mut self, cursor: Arc<dyn CursorProvider>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn coordinator(&self) -> &LookupCoordinator {
        &self.coordinator
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Run until `shutdown` fires or every input sender is dropped. Returns
    /// the runtime so callers can inspect its final state.
    pub async fn run(mut self, shutdown: CancellationToken) -> Self {
        tracing::info!(spec = ?self.detector.spec(), "hover lookup runtime started");
        let mut sampler = tokio::time::interval(self.debouncer.interval());
        sampler.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.detector.next_deadline().map(Instant::from_std);
            let sampling = self.debouncer.is_active() && self.cursor.is_some();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.bus.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        tracing::info!("input bus closed");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(far_future)), if deadline.is_some() => {
                    let signal = self.detector.poll(now().into_std());
                    self.handle_signal(signal);
                }
                _ = sampler.tick(), if sampling => self.sample_cursor(),
                update = self.coordinator.next_update() => {
                    self.coordinator.apply(update);
                }
            }
            self.debouncer.set_overlay_bounds(self.coordinator.overlay_frame());
        }

        if self.detector.stop() {
            self.debouncer.deactivate();
            self.coordinator.gesture_ended();
        }
        self.coordinator.cancel_current();
        tracing::info!("hover lookup runtime stopped");
        self
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        let now = now();
        match event {
            InputEvent::ModifiersChanged { flags, changed } => {
                let signal = self.detector.on_modifier_change(flags, changed, now.into_std());
                self.handle_signal(signal);
            }
            InputEvent::Key { down } => {
                let signal = self.detector.on_other_key(down, now.into_std());
                self.handle_signal(signal);
            }
            InputEvent::PointerMoved(position) => {
                self.last_pointer = Some(position);
                self.offer(position);
            }
            InputEvent::Command(command) => self.handle_command(command),
        }
    }

    fn handle_signal(&mut self, signal: Option<GestureSignal>) {
        let Some(signal) = signal else {
            return;
        };
        tracing::debug!(?signal, "gesture signal");
        match signal {
            GestureSignal::Activated { secondary } => {
                self.mode = mode_for(secondary);
                self.debouncer.activate();
                if let Some(position) = self.pointer_position() {
                    self.offer(position);
                }
            }
            GestureSignal::ModeChanged { secondary } => {
                self.mode = mode_for(secondary);
                self.coordinator.set_mode(self.mode);
            }
            GestureSignal::Released => {
                self.debouncer.deactivate();
                self.coordinator.gesture_ended();
            }
            GestureSignal::Aborted => {
                self.debouncer.deactivate();
                self.coordinator.cancel_current();
            }
        }
    }

    fn handle_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::TogglePin => {
                self.coordinator.toggle_pin();
            }
            UserCommand::Dismiss => self.coordinator.dismiss(),
            UserCommand::SetLanguages(languages) => self.coordinator.set_languages(languages),
        }
    }

    fn sample_cursor(&mut self) {
        if let Some(position) = self.cursor.as_ref().and_then(|c| c.cursor_position()) {
            self.last_pointer = Some(position);
            self.offer(position);
        }
    }

    fn offer(&mut self, position: ScreenPoint) {
        if let Some(trigger) = self.debouncer.sample(position, now().into_std()) {
            self.coordinator.start(trigger, self.mode);
        }
    }

    fn pointer_position(&self) -> Option<ScreenPoint> {
        self.cursor
            .as_ref()
            .and_then(|c| c.cursor_position())
            .or(self.last_pointer)
    }
}

fn mode_for(secondary: bool) -> SessionMode {
    if secondary {
        SessionMode::SelectionOrParagraph
    } else {
        SessionMode::Word
    }
}

// tokio's clock so paused-time tests drive the deadlines too.
fn now() -> Instant {
    Instant::now()
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400)
}
