#![allow(dead_code)]

use async_trait::async_trait;
use hover_translate::collaborators::{
    CloudTranslation, CloudTranslator, Collaborators, CursorProvider, Dictionary,
    OnDeviceTranslator, OverlaySink, ScreenCapture, SelectionProbe, WordRecognizer,
};
use hover_translate::coordinator::{CoordinatorConfig, LookupCoordinator};
use hover_translate::error::BackendError;
use hover_translate::model::{
    CapturedImage, Definition, DictionaryEntry, NormalizedRect, RecognizedWord, ScreenPoint,
    ScreenRect,
};
use hover_translate::overlay::{OverlayModel, OverlayState};
use hover_translate::resolver::{FallbackResolver, ResolverBackends};
use hover_translate::session::LanguagePair;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CAPTURE_WIDTH: f64 = 200.0;
pub const CAPTURE_HEIGHT: f64 = 100.0;

/// Captures a fixed-size region around the cursor.
#[derive(Default)]
pub struct MockCapture {
    pub latency: Duration,
    pub fail_with: Mutex<Option<BackendError>>,
    calls: AtomicUsize,
}

impl MockCapture {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, err: BackendError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl ScreenCapture for MockCapture {
    async fn capture_around(&self, cursor: ScreenPoint) -> Result<Option<CapturedImage>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(Some(CapturedImage {
            png: Vec::new(),
            width: CAPTURE_WIDTH as u32,
            height: CAPTURE_HEIGHT as u32,
            region: ScreenRect::centered_on(cursor, CAPTURE_WIDTH, CAPTURE_HEIGHT),
        }))
    }
}

/// Recognises one word spanning the centre of the capture, chosen by the
/// capture's horizontal centre.
#[derive(Default)]
pub struct MockRecognizer {
    words: Mutex<HashMap<i64, String>>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn word_at(self, x: f64, word: &str) -> Self {
        self.words.lock().unwrap().insert(x.round() as i64, word.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WordRecognizer for MockRecognizer {
    async fn recognize_words(
        &self,
        image: &CapturedImage,
        _language_hint: &str,
    ) -> Result<Vec<RecognizedWord>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let center = image.region.x + image.region.width / 2.0;
        let words = self.words.lock().unwrap();
        Ok(words
            .get(&(center.round() as i64))
            .map(|text| {
                vec![RecognizedWord {
                    text: text.clone(),
                    bounds: NormalizedRect::new(0.4, 0.4, 0.2, 0.2),
                }]
            })
            .unwrap_or_default())
    }
}

pub struct MockProbe {
    pub text: Option<String>,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn new(text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SelectionProbe for MockProbe {
    async fn selected_text(&self, _at: ScreenPoint) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text.clone()
    }
}

#[derive(Default)]
pub struct MockDictionary {
    entries: HashMap<String, DictionaryEntry>,
    pub latency: Duration,
    calls: AtomicUsize,
}

impl MockDictionary {
    pub fn with_entry(mut self, entry: DictionaryEntry) -> Self {
        self.entries.insert(entry.headword.to_lowercase(), entry);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dictionary for MockDictionary {
    async fn lookup(&self, candidates: &[String], _preferred_source: &str) -> Option<DictionaryEntry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        candidates
            .iter()
            .find_map(|c| self.entries.get(&c.to_lowercase()).cloned())
    }
}

/// Translates by looking text up in a table. Unknown text becomes
/// `"<target>:<text>"`.
#[derive(Default)]
pub struct MockOnDevice {
    installed: Vec<LanguagePair>,
    table: HashMap<String, String>,
    latency: HashMap<String, Duration>,
    failing: Vec<String>,
    availability_checks: AtomicUsize,
    translations: AtomicUsize,
}

impl MockOnDevice {
    pub fn installed(mut self, pair: LanguagePair) -> Self {
        self.installed.push(pair);
        self
    }

    pub fn translates(mut self, text: &str, translated: &str) -> Self {
        self.table.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn delay(mut self, text: &str, latency: Duration) -> Self {
        self.latency.insert(text.to_string(), latency);
        self
    }

    pub fn fails_on(mut self, text: &str) -> Self {
        self.failing.push(text.to_string());
        self
    }

    pub fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }

    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OnDeviceTranslator for MockOnDevice {
    async fn is_language_pair_installed(&self, pair: &LanguagePair) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.installed.contains(pair)
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, BackendError> {
        self.translations.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency.get(text) {
            tokio::time::sleep(*latency).await;
        }
        if self.failing.iter().any(|t| t == text) {
            return Err(BackendError::Failed(anyhow::anyhow!("model crashed")));
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("{}:{}", pair.target, text)))
    }
}

#[derive(Default)]
pub struct MockCloud {
    pub configured: bool,
    table: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockCloud {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn translates(mut self, text: &str, translated: &str) -> Self {
        self.table.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudTranslator for MockCloud {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Option<CloudTranslation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return None;
        }
        Some(CloudTranslation {
            text: self
                .table
                .get(text)
                .cloned()
                .unwrap_or_else(|| format!("cloud-{}:{}", pair.target, text)),
            detected_language: Some(pair.source.clone()),
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    presented: Mutex<Vec<OverlayModel>>,
    pub frame: Mutex<Option<ScreenRect>>,
}

impl RecordingSink {
    pub fn presented(&self) -> Vec<OverlayModel> {
        self.presented.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Headwords of every result that reached the screen, in order.
    pub fn shown_headwords(&self) -> Vec<String> {
        self.presented()
            .into_iter()
            .filter_map(|m| match m.state {
                OverlayState::Result(outcome) => Some(outcome.headword),
                _ => None,
            })
            .collect()
    }
}

impl OverlaySink for RecordingSink {
    fn present(&self, overlay: &OverlayModel, _anchor: Option<ScreenPoint>) {
        if let Ok(mut presented) = self.presented.lock() {
            presented.push(overlay.clone());
        }
    }

    fn frame(&self) -> Option<ScreenRect> {
        *self.frame.lock().unwrap()
    }
}

#[derive(Default)]
pub struct ScriptedCursor {
    pub position: Mutex<Option<ScreenPoint>>,
}

impl ScriptedCursor {
    pub fn move_to(&self, x: f64, y: f64) {
        *self.position.lock().unwrap() = Some(ScreenPoint::new(x, y));
    }
}

impl CursorProvider for ScriptedCursor {
    fn cursor_position(&self) -> Option<ScreenPoint> {
        *self.position.lock().unwrap()
    }
}

pub fn entry(headword: &str, meanings: &[&str]) -> DictionaryEntry {
    DictionaryEntry {
        headword: headword.to_string(),
        phonetics: Vec::new(),
        definitions: meanings.iter().map(|m| Definition::new(None, m)).collect(),
        rich_content: None,
    }
}

pub fn en_zh() -> LanguagePair {
    LanguagePair::new("en", "zh-Hans")
}

/// A coordinator over mock collaborators, with handles kept for assertions.
pub struct Harness {
    pub capture: Arc<MockCapture>,
    pub recognizer: Arc<MockRecognizer>,
    pub on_device: Arc<MockOnDevice>,
    pub sink: Arc<RecordingSink>,
    pub coordinator: LookupCoordinator,
}

impl Harness {
    pub fn new(recognizer: MockRecognizer, on_device: MockOnDevice) -> Self {
        Self::build(recognizer, on_device, None, CoordinatorConfig::default())
    }

    pub fn build(
        recognizer: MockRecognizer,
        on_device: MockOnDevice,
        probe: Option<Arc<MockProbe>>,
        config: CoordinatorConfig,
    ) -> Self {
        let capture = Arc::new(MockCapture::default());
        let recognizer = Arc::new(recognizer);
        let on_device = Arc::new(on_device.installed(en_zh()));
        let sink = Arc::new(RecordingSink::default());
        let mut collaborators = Collaborators::new(capture.clone(), recognizer.clone());
        if let Some(probe) = probe {
            collaborators = collaborators.with_accessibility(probe);
        }
        let resolver = Arc::new(FallbackResolver::new(ResolverBackends {
            dictionary: None,
            on_device: Some(on_device.clone()),
            cloud: None,
        }));
        let coordinator =
            LookupCoordinator::new(collaborators, resolver, sink.clone(), en_zh(), config);
        Self {
            capture,
            recognizer,
            on_device,
            sink,
            coordinator,
        }
    }
}
