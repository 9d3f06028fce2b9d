use crate::session::LanguagePair;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Outcome of a failed lookup session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{what} permission has not been granted")]
    PermissionDenied { what: String, hint: String },
    #[error("{0} is unavailable")]
    CapabilityUnavailable(String),
    #[error("{backend} failed: {message}")]
    TransientBackend {
        backend: &'static str,
        message: String,
    },
    #[error("session superseded")]
    Superseded,
    #[error("no definition found for \"{0}\"")]
    NoDefinition(String),
    #[error("{}", unavailable_message(.pair, .missing_language_pack, .missing_cloud_key))]
    TranslationUnavailable {
        pair: LanguagePair,
        missing_language_pack: bool,
        missing_cloud_key: bool,
    },
}

impl LookupError {
    /// Classify a collaborator failure for the named pipeline stage.
    pub fn from_backend(stage: &'static str, err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(detail) => LookupError::PermissionDenied {
                what: stage.to_string(),
                hint: permission_hint(stage, &detail),
            },
            BackendError::Unavailable(detail) => {
                LookupError::CapabilityUnavailable(format!("{stage} ({detail})"))
            }
            BackendError::Timeout(after) => LookupError::TransientBackend {
                backend: stage,
                message: format!("timed out after {} ms", after.as_millis()),
            },
            BackendError::Failed(err) => LookupError::TransientBackend {
                backend: stage,
                message: format!("{err:#}"),
            },
        }
    }

    /// Supersession is a cancellation artifact and is never shown.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, LookupError::Superseded)
    }

    /// Text suitable for the overlay's error state.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::PermissionDenied { what, hint } => {
                format!("{what} permission is required. {hint}")
            }
            other => {
                let mut text = other.to_string();
                if let Some(first) = text.get(..1) {
                    let upper = first.to_uppercase();
                    text.replace_range(..1, &upper);
                }
                text
            }
        }
    }
}

fn permission_hint(stage: &str, detail: &str) -> String {
    let base = format!(
        "Grant {} access to this application in the system privacy settings, then try again.",
        stage.to_lowercase()
    );
    if detail.trim().is_empty() {
        base
    } else {
        format!("{base} ({detail})")
    }
}

fn unavailable_message(
    pair: &LanguagePair,
    missing_language_pack: &bool,
    missing_cloud_key: &bool,
) -> String {
    let mut remedies = Vec::new();
    if *missing_cloud_key {
        remedies.push("configure a cloud translation API key".to_string());
    }
    if *missing_language_pack {
        remedies.push(format!(
            "install the offline language pack for {} to {}",
            pair.source, pair.target
        ));
    }
    match remedies.len() {
        0 => format!(
            "translation from {} to {} failed on every available service",
            pair.source, pair.target
        ),
        _ => format!(
            "translation from {} to {} is unavailable: {}",
            pair.source,
            pair.target,
            remedies.join(" or ")
        ),
    }
}
