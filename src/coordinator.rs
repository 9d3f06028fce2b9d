use crate::collaborators::{Collaborators, OverlaySink};
use crate::error::{BackendError, LookupError};
use crate::model::{LookupOutcome, ScreenPoint, ScreenRect};
use crate::motion::TriggerPoint;
use crate::overlay::{reduce, OverlayEvent, OverlayModel, OverlayState};
use crate::resolver::FallbackResolver;
use crate::selection::{lookup_token, select_word, DEFAULT_HIT_TOLERANCE};
use crate::session::{LanguagePair, Session, SessionId, SessionMode, SessionTracker};
use hashlink::LruCache;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Show "no word found" instead of leaving the overlay untouched.
    pub show_debug_regions: bool,
    pub word_hit_tolerance: f64,
    pub cache_size: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            show_debug_regions: false,
            word_hit_tolerance: DEFAULT_HIT_TOLERANCE,
            cache_size: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    pair: LanguagePair,
    mode: SessionMode,
}

impl CacheKey {
    fn new(text: &str, pair: &LanguagePair, mode: SessionMode) -> Self {
        Self {
            text: text.trim().to_lowercase(),
            pair: pair.clone(),
            mode,
        }
    }
}

type OutcomeCache = Arc<Mutex<LruCache<CacheKey, LookupOutcome>>>;

/// Message from a session task back to the coordinating context.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub session: SessionId,
    pub event: OverlayEvent,
    cache_key: Option<CacheKey>,
}

/// Owns the current session and the overlay model. All mutation happens on
/// the task that owns this value; session tasks only send updates back.
pub struct LookupCoordinator {
    collaborators: Collaborators,
    resolver: Arc<FallbackResolver>,
    sink: Arc<dyn OverlaySink>,
    config: CoordinatorConfig,
    tracker: SessionTracker,
    overlay: OverlayModel,
    anchor: Option<ScreenPoint>,
    languages: LanguagePair,
    last_trigger: Option<(TriggerPoint, SessionMode)>,
    cache: OutcomeCache,
    updates_tx: UnboundedSender<SessionUpdate>,
    updates_rx: UnboundedReceiver<SessionUpdate>,
    tasks: JoinSet<()>,
}

impl LookupCoordinator {
    pub fn new(
        collaborators: Collaborators,
        resolver: Arc<FallbackResolver>,
        sink: Arc<dyn OverlaySink>,
        languages: LanguagePair,
        config: CoordinatorConfig,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let cache = Arc::new(Mutex::new(LruCache::new(config.cache_size.max(1))));
        Self {
            collaborators,
            resolver,
            sink,
            config,
            tracker: SessionTracker::new(),
            overlay: OverlayModel::default(),
            anchor: None,
            languages,
            last_trigger: None,
            cache,
            updates_tx,
            updates_rx,
            tasks: JoinSet::new(),
        }
    }

    pub fn overlay(&self) -> &OverlayModel {
        &self.overlay
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.tracker.current_id()
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    pub fn overlay_frame(&self) -> Option<ScreenRect> {
        if self.overlay.state.is_idle() {
            None
        } else {
            self.sink.frame()
        }
    }

    /// Supersede whatever is running and start a lookup at `trigger`.
    pub fn start(&mut self, trigger: TriggerPoint, mode: SessionMode) -> SessionId {
        let session = self.tracker.begin(mode, self.languages.clone());
        let id = session.id();
        self.anchor = Some(trigger.position);
        self.last_trigger = Some((trigger, mode));
        tracing::info!(session = %id, ?mode, x = trigger.position.x, y = trigger.position.y, "lookup session started");

        let pipeline = SessionPipeline {
            collaborators: self.collaborators.clone(),
            resolver: Arc::clone(&self.resolver),
            cache: Arc::clone(&self.cache),
            updates: self.updates_tx.clone(),
            show_debug_regions: self.config.show_debug_regions,
            tolerance: self.config.word_hit_tolerance,
        };
        self.tasks.spawn(pipeline.run(session, trigger));
        id
    }

    /// Start again at the last trigger point, e.g. after a language change.
    pub fn restart(&mut self) -> Option<SessionId> {
        let (trigger, mode) = self.last_trigger?;
        Some(self.start(trigger, mode))
    }

    pub fn cancel_current(&mut self) -> Option<SessionId> {
        let cancelled = self.tracker.cancel_current();
        if let Some(id) = cancelled {
            tracing::debug!(session = %id, "lookup session cancelled");
        }
        cancelled
    }

    /// The gesture that drove lookups has ended.
    pub fn gesture_ended(&mut self) {
        self.cancel_current();
        self.last_trigger = None;
        self.apply_event(OverlayEvent::GestureEnded);
    }

    pub fn dismiss(&mut self) {
        self.cancel_current();
        self.last_trigger = None;
        self.apply_event(OverlayEvent::Dismiss);
    }

    /// Only a finished lookup can be pinned; a pinned overlay ignores
    /// lifecycle events until it is unpinned or dismissed.
    pub fn toggle_pin(&mut self) -> bool {
        let pinnable = matches!(self.overlay.state, OverlayState::Result(_) | OverlayState::Error(_));
        if !self.overlay.pinned && !pinnable {
            return false;
        }
        self.overlay.pinned = !self.overlay.pinned;
        tracing::debug!(pinned = self.overlay.pinned, "overlay pin toggled");
        self.sink.present(&self.overlay, self.anchor);
        self.overlay.pinned
    }

    pub fn set_languages(&mut self, languages: LanguagePair) {
        if languages == self.languages {
            return;
        }
        tracing::info!(from = %self.languages, to = %languages, "language pair changed");
        self.languages = languages;
        if self.tracker.current_id().is_some() || self.showing_unpinned() {
            self.restart();
        }
    }

    pub fn set_mode(&mut self, mode: SessionMode) {
        let Some((trigger, previous)) = self.last_trigger else {
            return;
        };
        if previous != mode {
            self.start(trigger, mode);
        }
    }

    /// Wait for the next update from a session task, reaping finished tasks
    /// along the way. Pending forever while nothing is in flight.
    pub async fn next_update(&mut self) -> SessionUpdate {
        loop {
            tokio::select! {
                Some(update) = self.updates_rx.recv() => return update,
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => reap(joined),
            }
        }
    }

    /// Apply an update if its session is still current. Returns whether it
    /// was applied.
    pub fn apply(&mut self, update: SessionUpdate) -> bool {
        if !self.tracker.is_current(update.session) {
            tracing::debug!(session = %update.session, "discarding update from superseded session");
            return false;
        }
        if let (Some(key), OverlayEvent::Result { outcome, .. }) = (&update.cache_key, &update.event) {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(key.clone(), outcome.clone());
            }
        }
        self.apply_event(update.event);
        true
    }

    /// Run until every session task has finished and all updates are applied.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            reap(joined);
            self.drain_updates();
        }
        self.drain_updates();
    }

    fn drain_updates(&mut self) {
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply(update);
        }
    }

    fn apply_event(&mut self, event: OverlayEvent) {
        let next = reduce(&self.overlay, event, self.overlay.pinned);
        if next != self.overlay {
            tracing::debug!(from = self.overlay.state.name(), to = next.state.name(), "overlay transition");
            self.overlay = next;
            self.sink.present(&self.overlay, self.anchor);
        }
    }

    fn showing_unpinned(&self) -> bool {
        !self.overlay.pinned && !self.overlay.state.is_idle()
    }
}

fn reap(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        if err.is_panic() {
            tracing::error!(?err, "lookup session task panicked");
        }
    }
}

/// Everything one session task needs; cheap to clone handles only.
struct SessionPipeline {
    collaborators: Collaborators,
    resolver: Arc<FallbackResolver>,
    cache: OutcomeCache,
    updates: UnboundedSender<SessionUpdate>,
    show_debug_regions: bool,
    tolerance: f64,
}

impl SessionPipeline {
    async fn run(self, session: Session, trigger: TriggerPoint) {
        match self.execute(&session, trigger).await {
            Ok(()) => {}
            Err(err) if !err.is_user_visible() => {
                tracing::debug!(session = %session.id(), %err, "session superseded");
            }
            Err(err) => {
                tracing::error!(session = %session.id(), %err, "lookup failed");
                let message = err.user_message();
                self.emit(&session, OverlayEvent::Error { session: session.id(), message }, None);
            }
        }
    }

    async fn execute(&self, session: &Session, trigger: TriggerPoint) -> Result<(), LookupError> {
        let mut mode = session.mode();
        let mut text = None;

        if mode == SessionMode::SelectionOrParagraph {
            text = self.probe_selection(session, trigger.position).await?;
            if text.is_none() {
                tracing::debug!(session = %session.id(), "no selection found; falling back to word mode");
                mode = SessionMode::Word;
            }
        }

        let text = match text {
            Some(text) => text,
            None => match self.recognize_word(session, trigger.position).await? {
                Some(word) => word,
                None => {
                    tracing::debug!(session = %session.id(), "no word under cursor");
                    if self.show_debug_regions {
                        self.emit(session, OverlayEvent::NoWordFound { session: session.id() }, None);
                    }
                    return Ok(());
                }
            },
        };

        let pair = session.languages();
        self.emit(
            session,
            OverlayEvent::Loading {
                session: session.id(),
                label: Some(text.clone()),
            },
            None,
        );

        let key = CacheKey::new(&text, pair, mode);
        if let Some(outcome) = self.cached(&key) {
            tracing::debug!(session = %session.id(), text = %text, "serving cached outcome");
            self.emit(session, OverlayEvent::Result { session: session.id(), outcome }, None);
            return Ok(());
        }

        let outcome = self.resolver.resolve(&text, pair, mode, session).await?;
        session.checkpoint()?;
        tracing::info!(
            session = %session.id(),
            headword = %outcome.headword,
            elapsed_ms = session.elapsed().as_millis() as u64,
            "lookup resolved"
        );
        self.emit(session, OverlayEvent::Result { session: session.id(), outcome }, Some(key));
        Ok(())
    }

    async fn probe_selection(&self, session: &Session, at: ScreenPoint) -> Result<Option<String>, LookupError> {
        let probes = [&self.collaborators.accessibility, &self.collaborators.clipboard];
        for probe in probes.into_iter().flatten() {
            let selected = session.guard(probe.selected_text(at)).await?;
            if let Some(text) = selected.filter(|t| !t.trim().is_empty()) {
                return Ok(Some(text.trim().to_string()));
            }
        }
        Ok(None)
    }

    async fn recognize_word(&self, session: &Session, cursor: ScreenPoint) -> Result<Option<String>, LookupError> {
        let captured = session.guard(self.collaborators.capture.capture_around(cursor)).await?;
        let image = match captured {
            Ok(Some(image)) => image,
            Ok(None) => return Ok(None),
            Err(err @ BackendError::PermissionDenied(_)) | Err(err @ BackendError::Failed(_)) => {
                return Err(LookupError::from_backend("Screen capture", err));
            }
            Err(err) => {
                tracing::warn!(%err, "screen capture unavailable");
                return Ok(None);
            }
        };

        let recognized = session
            .guard(
                self.collaborators
                    .recognizer
                    .recognize_words(&image, &session.languages().source),
            )
            .await?;
        let words = match recognized {
            Ok(words) => words,
            Err(err @ BackendError::Timeout(_)) => {
                tracing::warn!(%err, "text recognition timed out");
                return Ok(None);
            }
            Err(err) => return Err(LookupError::from_backend("Text recognition", err)),
        };

        let Some(point) = image.region.normalize(cursor) else {
            return Ok(None);
        };
        Ok(select_word(&words, point, self.tolerance).and_then(|word| lookup_token(&word.text)))
    }

    fn cached(&self, key: &CacheKey) -> Option<LookupOutcome> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(key).cloned()
    }

    fn emit(&self, session: &Session, event: OverlayEvent, cache_key: Option<CacheKey>) {
        if !session.is_current() {
            return;
        }
        let _ = self.updates.send(SessionUpdate {
            session: session.id(),
            event,
            cache_key,
        });
    }
}
