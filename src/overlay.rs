use crate::collaborators::OverlaySink;
use crate::model::{LookupOutcome, ScreenPoint};
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayState {
    #[default]
    Idle,
    Loading(Option<String>),
    Result(LookupOutcome),
    Error(String),
    NoWordFound,
}

impl OverlayState {
    pub fn is_idle(&self) -> bool {
        matches!(self, OverlayState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OverlayState::Idle => "idle",
            OverlayState::Loading(_) => "loading",
            OverlayState::Result(_) => "result",
            OverlayState::Error(_) => "error",
            OverlayState::NoWordFound => "no_word_found",
        }
    }
}

/// Lifecycle events fed to [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Loading {
        session: SessionId,
        label: Option<String>,
    },
    Result {
        session: SessionId,
        outcome: LookupOutcome,
    },
    Error {
        session: SessionId,
        message: String,
    },
    NoWordFound {
        session: SessionId,
    },
    /// The gesture ended; hides anything that is not pinned.
    GestureEnded,
    /// Explicit user dismissal; always hides and clears the pin.
    Dismiss,
}

impl OverlayEvent {
    pub fn session(&self) -> Option<SessionId> {
        match self {
            OverlayEvent::Loading { session, .. }
            | OverlayEvent::Result { session, .. }
            | OverlayEvent::Error { session, .. }
            | OverlayEvent::NoWordFound { session } => Some(*session),
            OverlayEvent::GestureEnded | OverlayEvent::Dismiss => None,
        }
    }
}

/// What the overlay shows, which session put it there, and how it behaves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayModel {
    pub state: OverlayState,
    pub session: Option<SessionId>,
    pub pinned: bool,
    /// Results and errors accept pointer interaction (expand, copy, pin).
    pub interactive: bool,
}

impl OverlayModel {
    fn showing(state: OverlayState, session: SessionId, pinned: bool, interactive: bool) -> Self {
        Self {
            state,
            session: Some(session),
            pinned,
            interactive,
        }
    }
}

/// Apply one lifecycle event.
///
/// A pinned overlay ignores everything except dismissal and pin changes.
/// Events from a session older than the one on screen are ignored. A result
/// is only accepted on top of the same session's loading state.
pub fn reduce(current: &OverlayModel, event: OverlayEvent, is_pinned: bool) -> OverlayModel {
    match event {
        OverlayEvent::Dismiss => return OverlayModel::default(),
        OverlayEvent::GestureEnded => {
            return if is_pinned {
                OverlayModel {
                    pinned: true,
                    ..current.clone()
                }
            } else {
                OverlayModel::default()
            };
        }
        _ => {}
    }

    if is_pinned {
        return OverlayModel {
            pinned: true,
            ..current.clone()
        };
    }
    if let (Some(incoming), Some(shown)) = (event.session(), current.session) {
        if incoming < shown {
            return current.clone();
        }
    }

    match event {
        OverlayEvent::Loading { session, label } => {
            let same_session = current.session == Some(session);
            match current.state {
                OverlayState::Result(_) | OverlayState::Error(_) if same_session => current.clone(),
                _ => OverlayModel::showing(OverlayState::Loading(label), session, false, false),
            }
        }
        OverlayEvent::Result { session, outcome } => match current.state {
            OverlayState::Loading(_) if current.session == Some(session) => {
                OverlayModel::showing(OverlayState::Result(outcome), session, false, true)
            }
            _ => current.clone(),
        },
        OverlayEvent::Error { session, message } => {
            OverlayModel::showing(OverlayState::Error(message), session, false, true)
        }
        OverlayEvent::NoWordFound { session } => {
            OverlayModel::showing(OverlayState::NoWordFound, session, false, false)
        }
        OverlayEvent::GestureEnded | OverlayEvent::Dismiss => current.clone(),
    }
}

/// Sink that only logs transitions. Used when no overlay window exists.
#[derive(Debug, Default)]
pub struct TracingOverlaySink;

impl OverlaySink for TracingOverlaySink {
    fn present(&self, overlay: &OverlayModel, anchor: Option<ScreenPoint>) {
        match &overlay.state {
            OverlayState::Result(outcome) => tracing::info!(
                headword = %outcome.headword,
                translation = %outcome.translation,
                definitions = outcome.definitions.len(),
                pinned = overlay.pinned,
                ?anchor,
                "overlay result"
            ),
            OverlayState::Error(message) => tracing::info!(%message, ?anchor, "overlay error"),
            state => tracing::debug!(state = state.name(), pinned = overlay.pinned, "overlay state"),
        }
    }
}
