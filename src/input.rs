//! Typed input events and the bus that carries them from whatever captures
//! input (a global hook, a test script) to the coordinating event loop.

use crate::hotkey::{ModifierFlags, ModifierKey};
use crate::model::ScreenPoint;
use crate::session::LanguagePair;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The set of held modifiers changed. `changed` names the modifier whose
    /// key produced the event when the source knows it.
    ModifiersChanged {
        flags: ModifierFlags,
        changed: Option<ModifierKey>,
    },
    /// A non-modifier key went down or up.
    Key { down: bool },
    PointerMoved(ScreenPoint),
    Command(UserCommand),
}

/// Explicit user requests coming from the overlay or a tray menu.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    TogglePin,
    Dismiss,
    SetLanguages(LanguagePair),
}

/// Marks windows in which the app injects its own keystrokes, such as a
/// copy shortcut. Keyboard events seen by a muted sender during such a
/// window are dropped so they never reach the gesture detector.
#[derive(Debug, Clone, Default)]
pub struct SyntheticKeys {
    depth: Arc<AtomicUsize>,
}

impl SyntheticKeys {
    pub fn hold(&self) -> SyntheticKeysHold {
        self.depth.fetch_add(1, Ordering::SeqCst);
        SyntheticKeysHold {
            depth: Arc::clone(&self.depth),
        }
    }

    pub fn is_held(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

/// Releases the window on drop.
#[must_use]
#[derive(Debug)]
pub struct SyntheticKeysHold {
    depth: Arc<AtomicUsize>,
}

impl Drop for SyntheticKeysHold {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct InputSender {
    tx: UnboundedSender<InputEvent>,
    synthetic: Option<SyntheticKeys>,
}

impl InputSender {
    /// Drop modifier and key events while `synthetic` is held. Pointer and
    /// command events still pass.
    pub fn muted_by(mut self, synthetic: SyntheticKeys) -> Self {
        self.synthetic = Some(synthetic);
        self
    }

    /// Returns `false` once the bus has been dropped.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn modifiers(&self, flags: ModifierFlags, changed: Option<ModifierKey>) -> bool {
        if self.keyboard_muted() {
            return !self.tx.is_closed();
        }
        self.send(InputEvent::ModifiersChanged { flags, changed })
    }

    pub fn key(&self, down: bool) -> bool {
        if self.keyboard_muted() {
            return !self.tx.is_closed();
        }
        self.send(InputEvent::Key { down })
    }

    pub fn pointer(&self, x: f64, y: f64) -> bool {
        self.send(InputEvent::PointerMoved(ScreenPoint::new(x, y)))
    }

    pub fn command(&self, command: UserCommand) -> bool {
        self.send(InputEvent::Command(command))
    }

    fn keyboard_muted(&self) -> bool {
        self.synthetic.as_ref().is_some_and(SyntheticKeys::is_held)
    }
}

/// Receiving half; consumed by exactly one event loop.
#[derive(Debug)]
pub struct InputBus {
    rx: UnboundedReceiver<InputEvent>,
}

impl InputBus {
    pub async fn recv(&mut self) -> Option<InputEvent> {
        self.rx.recv().await
    }
}

pub fn input_bus() -> (InputSender, InputBus) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InputSender { tx, synthetic: None }, InputBus { rx })
}

/// Something that captures real input and forwards it onto the bus.
pub trait InputSource: Send {
    fn install(&mut self, sender: InputSender) -> anyhow::Result<()>;
    fn uninstall(&mut self) -> anyhow::Result<()>;
    fn is_installed(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn muted_sender_drops_keyboard_only_while_held() {
        let synthetic = SyntheticKeys::default();
        let (sender, mut bus) = input_bus();
        let sender = sender.muted_by(synthetic.clone());

        {
            let _hold = synthetic.hold();
            assert!(sender.key(true));
            assert!(sender.modifiers(ModifierFlags::from(ModifierKey::Control), None));
            assert!(sender.pointer(1.0, 2.0));
        }
        assert!(!synthetic.is_held());
        assert!(sender.key(false));

        assert_eq!(bus.recv().await, Some(InputEvent::PointerMoved(ScreenPoint::new(1.0, 2.0))));
        assert_eq!(bus.recv().await, Some(InputEvent::Key { down: false }));
    }
}
