//! Desktop collaborators: a global input hook, screen capture around the
//! cursor and a clipboard-based selection probe.

use crate::collaborators::{CursorProvider, ScreenCapture, SelectionProbe};
use crate::error::BackendError;
use crate::hotkey::{ModifierFlags, ModifierKey};
use crate::input::{InputSender, InputSource, SyntheticKeys};
use crate::model::{CapturedImage, ScreenPoint, ScreenRect};
use anyhow::anyhow;
use async_trait::async_trait;
use rdev::{listen, EventType, Key};
use screenshots::Screen;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub fn modifier_for_key(key: Key) -> Option<ModifierKey> {
    match key {
        Key::ShiftLeft | Key::ShiftRight => Some(ModifierKey::Shift),
        Key::ControlLeft | Key::ControlRight => Some(ModifierKey::Control),
        Key::Alt | Key::AltGr => Some(ModifierKey::Alt),
        Key::MetaLeft | Key::MetaRight => Some(ModifierKey::Meta),
        Key::Function => Some(ModifierKey::Function),
        _ => None,
    }
}

/// Cursor position as last reported by the input hook.
#[derive(Debug, Clone, Default)]
pub struct TrackedCursor {
    last: Arc<Mutex<Option<ScreenPoint>>>,
}

impl TrackedCursor {
    fn update(&self, point: ScreenPoint) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(point);
        }
    }
}

impl CursorProvider for TrackedCursor {
    fn cursor_position(&self) -> Option<ScreenPoint> {
        self.last.lock().ok().and_then(|last| *last)
    }
}

/// Global keyboard and pointer hook built on `rdev::listen`.
///
/// `listen` cannot be stopped once started, so uninstalling only stops
/// forwarding events.
#[derive(Debug, Default)]
pub struct RdevInputSource {
    forwarding: Arc<AtomicBool>,
    started: bool,
    cursor: TrackedCursor,
}

impl RdevInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> TrackedCursor {
        self.cursor.clone()
    }
}

impl InputSource for RdevInputSource {
    fn install(&mut self, sender: InputSender) -> anyhow::Result<()> {
        self.forwarding.store(true, Ordering::SeqCst);
        if self.started {
            return Ok(());
        }
        self.started = true;
        let forwarding = Arc::clone(&self.forwarding);
        let cursor = self.cursor.clone();
        thread::Builder::new()
            .name("input-hook".into())
            .spawn(move || loop {
                let mut flags = ModifierFlags::empty();
                let mut held: Vec<Key> = Vec::new();
                let forwarding = Arc::clone(&forwarding);
                let cursor = cursor.clone();
                let sender = sender.clone();

                let result = listen(move |event| {
                    match event.event_type {
                        EventType::MouseMove { x, y } => {
                            let point = ScreenPoint::new(x, y);
                            cursor.update(point);
                            if forwarding.load(Ordering::Relaxed) {
                                sender.pointer(point.x, point.y);
                            }
                        }
                        EventType::KeyPress(key) => match modifier_for_key(key) {
                            Some(modifier) => {
                                let next = flags.with(modifier);
                                if next != flags {
                                    flags = next;
                                    if forwarding.load(Ordering::Relaxed) {
                                        sender.modifiers(flags, Some(modifier));
                                    }
                                }
                            }
                            None => {
                                if !held.contains(&key) {
                                    held.push(key);
                                }
                                if forwarding.load(Ordering::Relaxed) {
                                    sender.key(true);
                                }
                            }
                        },
                        EventType::KeyRelease(key) => match modifier_for_key(key) {
                            Some(modifier) => {
                                let next = flags.without(modifier);
                                if next != flags {
                                    flags = next;
                                    if forwarding.load(Ordering::Relaxed) {
                                        sender.modifiers(flags, Some(modifier));
                                    }
                                }
                            }
                            None => {
                                held.retain(|k| *k != key);
                                if held.is_empty() && forwarding.load(Ordering::Relaxed) {
                                    sender.key(false);
                                }
                            }
                        },
                        _ => {}
                    }
                });

                match result {
                    Ok(()) => tracing::warn!("Input hook exited unexpectedly. Restarting shortly"),
                    Err(e) => tracing::warn!("Input hook failed: {:?}. Retrying shortly", e),
                }
                thread::sleep(Duration::from_millis(500));
            })?;
        tracing::debug!("input hook installed");
        Ok(())
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        self.forwarding.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.started && self.forwarding.load(Ordering::SeqCst)
    }
}

/// Captures a fixed-size region centred on the cursor and encodes it as PNG.
#[derive(Debug, Clone)]
pub struct ScreenshotCapture {
    width: f64,
    height: f64,
}

impl ScreenshotCapture {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

fn capture_blocking(cursor: ScreenPoint, width: f64, height: f64) -> Result<Option<CapturedImage>, BackendError> {
    let Ok(screen) = Screen::from_point(cursor.x as i32, cursor.y as i32) else {
        return Ok(None);
    };
    let info = &screen.display_info;
    let display = ScreenRect::new(
        f64::from(info.x),
        f64::from(info.y),
        f64::from(info.width),
        f64::from(info.height),
    );
    let wanted = ScreenRect::centered_on(cursor, width, height);
    let x = wanted.x.clamp(display.x, (display.x + display.width - width).max(display.x));
    let y = wanted.y.clamp(display.y, (display.y + display.height - height).max(display.y));
    let region = ScreenRect::new(x, y, width.min(display.width), height.min(display.height));

    let img = screen
        .capture_area(
            (region.x - display.x) as i32,
            (region.y - display.y) as i32,
            region.width as u32,
            region.height as u32,
        )
        .map_err(|e| {
            let text = format!("{e:#}");
            if text.to_lowercase().contains("permission") {
                BackendError::PermissionDenied(text)
            } else {
                BackendError::Failed(e)
            }
        })?;

    let (w, h) = img.dimensions();
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .map_err(|e| BackendError::Failed(anyhow!("encode capture: {e}")))?;
    Ok(Some(CapturedImage {
        png,
        width: w,
        height: h,
        region,
    }))
}

#[async_trait]
impl ScreenCapture for ScreenshotCapture {
    async fn capture_around(&self, cursor: ScreenPoint) -> Result<Option<CapturedImage>, BackendError> {
        let (width, height) = (self.width, self.height);
        tokio::task::spawn_blocking(move || capture_blocking(cursor, width, height))
            .await
            .map_err(|e| BackendError::Failed(anyhow!("capture task failed: {e}")))?
    }
}

/// Reads the selection by issuing a copy shortcut and watching the
/// clipboard. The previous clipboard text is restored afterwards.
///
/// The injected shortcut is bracketed by `synthetic`; the input hook's
/// sender must be muted by the same handle or the shortcut aborts the
/// gesture that asked for the selection.
#[derive(Debug, Clone)]
pub struct ClipboardSelectionProbe {
    settle: Duration,
    synthetic: SyntheticKeys,
}

impl ClipboardSelectionProbe {
    pub fn new(synthetic: SyntheticKeys) -> Self {
        Self {
            settle: Duration::from_millis(80),
            synthetic,
        }
    }
}

#[cfg(target_os = "macos")]
const COPY_MODIFIER: Key = Key::MetaLeft;
#[cfg(not(target_os = "macos"))]
const COPY_MODIFIER: Key = Key::ControlLeft;

fn send_copy_shortcut() -> anyhow::Result<()> {
    for event in [
        EventType::KeyPress(COPY_MODIFIER),
        EventType::KeyPress(Key::KeyC),
        EventType::KeyRelease(Key::KeyC),
        EventType::KeyRelease(COPY_MODIFIER),
    ] {
        rdev::simulate(&event).map_err(|e| anyhow!("simulate {event:?}: {e:?}"))?;
        thread::sleep(Duration::from_millis(10));
    }
    Ok(())
}

fn probe_blocking(settle: Duration, synthetic: SyntheticKeys) -> anyhow::Result<Option<String>> {
    let mut clipboard = arboard::Clipboard::new()?;
    let previous = clipboard.get_text().ok();
    clipboard.clear()?;
    {
        let _hold = synthetic.hold();
        send_copy_shortcut()?;
        thread::sleep(settle);
    }
    let copied = clipboard.get_text().ok().filter(|t| !t.trim().is_empty());
    if let Some(previous) = previous {
        clipboard.set_text(previous)?;
    }
    Ok(copied)
}

#[async_trait]
impl SelectionProbe for ClipboardSelectionProbe {
    async fn selected_text(&self, _at: ScreenPoint) -> Option<String> {
        let (settle, synthetic) = (self.settle, self.synthetic.clone());
        match tokio::task::spawn_blocking(move || probe_blocking(settle, synthetic)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                tracing::warn!("clipboard selection probe failed: {err:#}");
                None
            }
            Err(err) => {
                tracing::warn!(?err, "clipboard selection probe panicked");
                None
            }
        }
    }
}
