//! Local dictionary backed by a JSON entry file.

use crate::collaborators::Dictionary;
use crate::model::DictionaryEntry;
use crate::session::primary_subtag;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DictionaryRecord {
    /// Language the headword and meanings are written in.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(flatten)]
    pub entry: DictionaryEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DictionaryFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub entries: Vec<DictionaryRecord>,
}

impl Default for DictionaryFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

fn default_language() -> String {
    "en".into()
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

pub fn load_dictionary(path: &str) -> anyhow::Result<DictionaryFile> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    if content.trim().is_empty() {
        return Ok(DictionaryFile::default());
    }
    let file: DictionaryFile = serde_json::from_str(&content)?;
    if file.schema_version != SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unsupported dictionary schema version {}",
            file.schema_version
        ));
    }
    Ok(file)
}

pub fn save_dictionary(path: &str, file: &DictionaryFile) -> anyhow::Result<()> {
    let mut file = file.clone();
    file.schema_version = SCHEMA_VERSION;
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// In-memory index over a dictionary file, keyed by lowercased headword.
#[derive(Debug, Default)]
pub struct JsonDictionary {
    index: HashMap<String, Vec<DictionaryRecord>>,
}

impl JsonDictionary {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let file = load_dictionary(path)?;
        let dictionary = Self::from_records(file.entries);
        tracing::info!(path, headwords = dictionary.len(), "dictionary loaded");
        Ok(dictionary)
    }

    pub fn from_records(records: impl IntoIterator<Item = DictionaryRecord>) -> Self {
        let mut index: HashMap<String, Vec<DictionaryRecord>> = HashMap::new();
        for record in records {
            let key = record.entry.headword.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            index.entry(key).or_default().push(record);
        }
        Self { index }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Candidates are tried in order in the preferred language first, then in
    /// any language.
    pub fn find(&self, candidates: &[String], preferred_source: &str) -> Option<&DictionaryEntry> {
        let preferred = primary_subtag(preferred_source);
        let records = |candidate: &String| {
            self.index
                .get(&candidate.trim().to_lowercase())
                .into_iter()
                .flatten()
        };
        candidates
            .iter()
            .find_map(|c| records(c).find(|r| primary_subtag(&r.language) == preferred))
            .or_else(|| candidates.iter().find_map(|c| records(c).next()))
            .map(|record| &record.entry)
    }
}

#[async_trait]
impl Dictionary for JsonDictionary {
    async fn lookup(&self, candidates: &[String], preferred_source: &str) -> Option<DictionaryEntry> {
        self.find(candidates, preferred_source).cloned()
    }
}
