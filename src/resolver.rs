use crate::collaborators::{CloudTranslator, Dictionary, OnDeviceTranslator};
use crate::error::LookupError;
use crate::model::{Definition, DictionaryEntry, LookupOutcome, TranslationBackend};
use crate::script::has_content_in;
use crate::session::{LanguagePair, Session, SessionMode};
use crate::stems::candidate_forms;
use futures::future::join_all;
use std::sync::{Arc, Mutex};

/// Backends the resolver may fall back across. Any of them may be missing.
#[derive(Clone, Default)]
pub struct ResolverBackends {
    pub dictionary: Option<Arc<dyn Dictionary>>,
    pub on_device: Option<Arc<dyn OnDeviceTranslator>>,
    pub cloud: Option<Arc<dyn CloudTranslator>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TranslationHit {
    text: String,
    backend: TranslationBackend,
    detected_language: Option<String>,
}

pub struct FallbackResolver {
    backends: ResolverBackends,
    /// Last answer to "is this pair installed on device", one entry only.
    availability: Mutex<Option<(LanguagePair, bool)>>,
}

impl FallbackResolver {
    pub fn new(backends: ResolverBackends) -> Self {
        Self {
            backends,
            availability: Mutex::new(None),
        }
    }

    pub async fn resolve(
        &self,
        text: &str,
        pair: &LanguagePair,
        mode: SessionMode,
        session: &Session,
    ) -> Result<LookupOutcome, LookupError> {
        let text = text.trim();
        let single_token = !text.contains(char::is_whitespace);
        match mode {
            SessionMode::Word => self.resolve_word(text, pair, session).await,
            SessionMode::SelectionOrParagraph if single_token => {
                self.resolve_word(text, pair, session).await
            }
            SessionMode::SelectionOrParagraph => self.resolve_passage(text, pair, session).await,
        }
    }

    async fn resolve_word(
        &self,
        word: &str,
        pair: &LanguagePair,
        session: &Session,
    ) -> Result<LookupOutcome, LookupError> {
        let entry = match &self.backends.dictionary {
            Some(dictionary) => {
                let candidates = candidate_forms(word);
                session
                    .guard(dictionary.lookup(&candidates, &pair.source))
                    .await?
            }
            None => None,
        };
        tracing::debug!(word, found = entry.is_some(), "dictionary lookup");

        if pair.is_same_language() {
            return same_language_outcome(word, pair, entry);
        }

        let translation = session.guard(self.translate_text(word, pair)).await?;
        match (translation, entry) {
            (Some(hit), Some(entry)) => {
                let definitions = session
                    .guard(self.translate_definitions(entry.definitions.clone(), pair))
                    .await?;
                Ok(LookupOutcome {
                    headword: entry.headword,
                    phonetics: entry.phonetics,
                    translation: hit.text,
                    definitions,
                    rich_content: entry.rich_content,
                    translated_by: Some(hit.backend),
                    detected_language: hit.detected_language,
                })
            }
            (Some(hit), None) => Ok(LookupOutcome {
                headword: word.to_string(),
                translation: hit.text,
                translated_by: Some(hit.backend),
                detected_language: hit.detected_language,
                ..LookupOutcome::default()
            }),
            (None, Some(entry)) => {
                tracing::debug!(word, "no translation backend succeeded; using dictionary text");
                Ok(synthesized_outcome(word, pair, entry))
            }
            (None, None) => Err(self.unavailable(pair)),
        }
    }

    async fn resolve_passage(
        &self,
        text: &str,
        pair: &LanguagePair,
        session: &Session,
    ) -> Result<LookupOutcome, LookupError> {
        if pair.is_same_language() {
            return Ok(LookupOutcome {
                headword: text.to_string(),
                translation: text.to_string(),
                ..LookupOutcome::default()
            });
        }
        match session.guard(self.translate_text(text, pair)).await? {
            Some(hit) => Ok(LookupOutcome {
                headword: text.to_string(),
                translation: hit.text,
                translated_by: Some(hit.backend),
                detected_language: hit.detected_language,
                ..LookupOutcome::default()
            }),
            None => Err(self.unavailable(pair)),
        }
    }

    /// On-device first when the pair is installed, then the cloud service.
    async fn translate_text(&self, text: &str, pair: &LanguagePair) -> Option<TranslationHit> {
        if let Some(on_device) = &self.backends.on_device {
            if self.pair_installed(on_device.as_ref(), pair).await {
                match on_device.translate(text, pair).await {
                    Ok(translated) if !translated.trim().is_empty() => {
                        return Some(TranslationHit {
                            text: translated,
                            backend: TranslationBackend::OnDevice,
                            detected_language: None,
                        });
                    }
                    Ok(_) => tracing::warn!(%pair, "on-device translation returned nothing"),
                    Err(err) => tracing::warn!(%pair, %err, "on-device translation failed"),
                }
            }
        }

        if let Some(cloud) = &self.backends.cloud {
            match cloud.translate(text, pair).await {
                Some(result) if !result.text.trim().is_empty() => {
                    return Some(TranslationHit {
                        text: result.text,
                        backend: TranslationBackend::Cloud,
                        detected_language: result.detected_language,
                    });
                }
                _ => tracing::debug!(%pair, "cloud translation unavailable"),
            }
        }
        None
    }

    /// One translation per definition, run concurrently and reassembled in
    /// input order. A failed translation keeps the definition's existing
    /// text.
    async fn translate_definitions(
        &self,
        definitions: Vec<Definition>,
        pair: &LanguagePair,
    ) -> Vec<Definition> {
        let translations =
            join_all(definitions.iter().map(|def| self.translate_text(&def.meaning, pair))).await;
        definitions
            .into_iter()
            .zip(translations)
            .map(|(mut def, hit)| {
                def.translation = match hit {
                    Some(hit) => Some(hit.text),
                    None => def
                        .translation
                        .filter(|t| !t.trim().is_empty())
                        .or_else(|| Some(def.meaning.clone())),
                };
                def
            })
            .collect()
    }

    async fn pair_installed(&self, on_device: &dyn OnDeviceTranslator, pair: &LanguagePair) -> bool {
        if let Some(known) = self.cached_availability(pair) {
            return known;
        }
        let installed = on_device.is_language_pair_installed(pair).await;
        if let Ok(mut guard) = self.availability.lock() {
            *guard = Some((pair.clone(), installed));
        }
        installed
    }

    fn cached_availability(&self, pair: &LanguagePair) -> Option<bool> {
        let guard = self.availability.lock().ok()?;
        match guard.as_ref() {
            Some((cached, installed)) if cached == pair => Some(*installed),
            _ => None,
        }
    }

    fn unavailable(&self, pair: &LanguagePair) -> LookupError {
        let missing_language_pack = match &self.backends.on_device {
            Some(_) => self.cached_availability(pair) != Some(true),
            None => true,
        };
        let missing_cloud_key = match &self.backends.cloud {
            Some(cloud) => !cloud.is_configured(),
            None => true,
        };
        tracing::warn!(
            %pair,
            missing_language_pack,
            missing_cloud_key,
            "no translation available"
        );
        LookupError::TranslationUnavailable {
            pair: pair.clone(),
            missing_language_pack,
            missing_cloud_key,
        }
    }
}

fn same_language_outcome(
    word: &str,
    pair: &LanguagePair,
    entry: Option<DictionaryEntry>,
) -> Result<LookupOutcome, LookupError> {
    let entry = entry.ok_or_else(|| LookupError::NoDefinition(word.to_string()))?;
    let definitions: Vec<Definition> = entry
        .definitions
        .into_iter()
        .filter(|def| has_content_in(&def.meaning, &pair.source))
        .collect();
    if definitions.is_empty() {
        return Err(LookupError::NoDefinition(word.to_string()));
    }
    Ok(LookupOutcome {
        headword: entry.headword,
        phonetics: entry.phonetics,
        translation: word.to_string(),
        definitions,
        rich_content: entry.rich_content,
        translated_by: None,
        detected_language: None,
    })
}

fn synthesized_outcome(word: &str, pair: &LanguagePair, entry: DictionaryEntry) -> LookupOutcome {
    let translations = || {
        entry
            .definitions
            .iter()
            .filter_map(|def| def.translation.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    };
    let primary = translations()
        .find(|t| has_content_in(t, &pair.target))
        .or_else(|| translations().next())
        .unwrap_or(word)
        .to_string();

    let definitions = entry
        .definitions
        .into_iter()
        .map(|mut def| {
            if def.translation.as_deref().map_or(true, |t| t.trim().is_empty()) {
                def.translation = Some(def.meaning.clone());
            }
            def
        })
        .collect();

    LookupOutcome {
        headword: entry.headword,
        phonetics: entry.phonetics,
        translation: primary,
        definitions,
        rich_content: entry.rich_content,
        translated_by: None,
        detected_language: None,
    }
}
