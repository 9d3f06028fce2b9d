use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Monotonically increasing session token. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Word,
    SelectionOrParagraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.trim().to_string(),
            target: target.trim().to_string(),
        }
    }

    /// True when no translation is needed.
    ///
    /// Regional variants (`en` / `en-GB`) count as the same language; Chinese
    /// scripts (`zh-Hans` / `zh-Hant`) do not.
    pub fn is_same_language(&self) -> bool {
        if self.source.eq_ignore_ascii_case(&self.target) {
            return true;
        }
        let src = primary_subtag(&self.source);
        let dst = primary_subtag(&self.target);
        src == dst && src != "zh"
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

pub(crate) fn primary_subtag(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// One lookup attempt.
///
/// Clones are handed to the task running the pipeline; they can observe
/// whether the session is still current but never change it.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    mode: SessionMode,
    languages: LanguagePair,
    created_at: Instant,
    cancel: CancellationToken,
    current: Arc<AtomicU64>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_current(&self) -> bool {
        !self.cancel.is_cancelled() && self.current.load(Ordering::Acquire) == self.id.0
    }

    /// Fails with [`LookupError::Superseded`] once a newer session exists.
    pub fn checkpoint(&self) -> Result<(), LookupError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(LookupError::Superseded)
        }
    }

    /// Await `fut` unless the session is cancelled first, then re-check
    /// currency at the resumption point.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, LookupError>
    where
        F: Future,
    {
        self.checkpoint()?;
        let output = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(LookupError::Superseded),
            output = fut => output,
        };
        self.checkpoint()?;
        Ok(output)
    }
}

/// Owns the generation counter. Only the coordinating context holds one.
#[derive(Debug)]
pub struct SessionTracker {
    next_id: u64,
    current: Arc<AtomicU64>,
    active: Option<Session>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            current: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    /// Supersede the current session (if any) and make a new one current.
    pub fn begin(&mut self, mode: SessionMode, languages: LanguagePair) -> Session {
        self.cancel_current();
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let session = Session {
            id,
            mode,
            languages,
            created_at: Instant::now(),
            cancel: CancellationToken::new(),
            current: Arc::clone(&self.current),
        };
        self.current.store(id.0, Ordering::Release);
        self.active = Some(session.clone());
        session
    }

    /// Cancel the current session without starting another.
    pub fn cancel_current(&mut self) -> Option<SessionId> {
        let previous = self.active.take()?;
        previous.cancel.cancel();
        self.current.store(0, Ordering::Release);
        Some(previous.id)
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|s| s.id)
    }

    pub fn current(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.current_id() == Some(id)
    }
}
