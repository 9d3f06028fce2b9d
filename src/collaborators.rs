//! Seams to the outside world. Each trait is a narrow call/return contract;
//! implementations live in `cloud`, `dictionary`, `ocr`, `platform` or in
//! tests.

use crate::error::BackendError;
use crate::model::{CapturedImage, DictionaryEntry, RecognizedWord, ScreenPoint, ScreenRect};
use crate::overlay::OverlayModel;
use crate::session::LanguagePair;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Capture a region around `cursor`. `Ok(None)` means there was nothing
    /// to capture, such as no display under the cursor.
    async fn capture_around(&self, cursor: ScreenPoint) -> Result<Option<CapturedImage>, BackendError>;
}

#[async_trait]
pub trait WordRecognizer: Send + Sync {
    async fn recognize_words(
        &self,
        image: &CapturedImage,
        language_hint: &str,
    ) -> Result<Vec<RecognizedWord>, BackendError>;
}

/// Best-effort probe for text the user has selected.
#[async_trait]
pub trait SelectionProbe: Send + Sync {
    async fn selected_text(&self, at: ScreenPoint) -> Option<String>;
}

#[async_trait]
pub trait Dictionary: Send + Sync {
    /// Try `candidates` in order and return the first entry found.
    async fn lookup(&self, candidates: &[String], preferred_source: &str) -> Option<DictionaryEntry>;
}

#[async_trait]
pub trait OnDeviceTranslator: Send + Sync {
    async fn is_language_pair_installed(&self, pair: &LanguagePair) -> bool;
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTranslation {
    pub text: String,
    pub detected_language: Option<String>,
}

#[async_trait]
pub trait CloudTranslator: Send + Sync {
    /// Whether credentials are configured at all.
    fn is_configured(&self) -> bool;
    /// `None` covers both "not configured" and soft failures.
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Option<CloudTranslation>;
}

/// Receives overlay transitions. Must tolerate repeated identical states.
pub trait OverlaySink: Send + Sync {
    fn present(&self, overlay: &OverlayModel, anchor: Option<ScreenPoint>);
    /// Frame of the visible overlay, used to ignore pointer motion over it.
    fn frame(&self) -> Option<ScreenRect> {
        None
    }
}

pub trait CursorProvider: Send + Sync {
    fn cursor_position(&self) -> Option<ScreenPoint>;
}

/// Collaborators used while turning a trigger point into text.
#[derive(Clone)]
pub struct Collaborators {
    pub capture: Arc<dyn ScreenCapture>,
    pub recognizer: Arc<dyn WordRecognizer>,
    pub accessibility: Option<Arc<dyn SelectionProbe>>,
    pub clipboard: Option<Arc<dyn SelectionProbe>>,
}

impl Collaborators {
    pub fn new(capture: Arc<dyn ScreenCapture>, recognizer: Arc<dyn WordRecognizer>) -> Self {
        Self {
            capture,
            recognizer,
            accessibility: None,
            clipboard: None,
        }
    }

    pub fn with_accessibility(mut self, probe: Arc<dyn SelectionProbe>) -> Self {
        self.accessibility = Some(probe);
        self
    }

    pub fn with_clipboard(mut self, probe: Arc<dyn SelectionProbe>) -> Self {
        self.clipboard = Some(probe);
        self
    }
}
