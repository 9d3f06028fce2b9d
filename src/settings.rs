use crate::coordinator::CoordinatorConfig;
use crate::hotkey::{parse_modifier_spec, ModifierSpec};
use crate::runtime::RuntimeConfig;
use crate::session::LanguagePair;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no cloud key is configured.
pub const CLOUD_KEY_ENV: &str = "HOVER_TRANSLATE_API_KEY";

const MIN_DEBOUNCE_MS: u64 = 1;
pub const DEFAULT_CLOUD_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Modifier that must be held alone to start hover lookups.
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
    /// Additional modifier that switches to selection/paragraph mode. `None`
    /// disables the secondary mode.
    #[serde(default = "default_paragraph_modifier")]
    pub paragraph_modifier: Option<String>,
    #[serde(default = "default_trigger_delay_ms")]
    pub trigger_delay_ms: u64,
    #[serde(default = "default_release_delay_ms")]
    pub release_delay_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_move_distance")]
    pub min_move_distance: f64,
    /// Slack around recognised word boxes, in capture-relative units.
    #[serde(default = "default_word_hit_tolerance")]
    pub word_hit_tolerance: f64,
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Show a "no word found" state instead of staying silent.
    #[serde(default)]
    pub show_debug_regions: bool,
    #[serde(default)]
    pub cloud_api_key: Option<String>,
    #[serde(default = "default_cloud_endpoint")]
    pub cloud_endpoint: String,
    #[serde(default = "default_cloud_timeout_ms")]
    pub cloud_timeout_ms: u64,
    /// JSON dictionary file. If `None`, no local dictionary is used.
    #[serde(default)]
    pub dictionary_path: Option<String>,
    /// Command used for text recognition, split like a shell would.
    #[serde(default = "default_ocr_command")]
    pub ocr_command: String,
    #[serde(default = "default_ocr_timeout_ms")]
    pub ocr_timeout_ms: u64,
    #[serde(default = "default_capture_width")]
    pub capture_width: f64,
    #[serde(default = "default_capture_height")]
    pub capture_height: f64,
    #[serde(default = "default_result_cache_size")]
    pub result_cache_size: usize,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Also write logs to this file.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_hotkey() -> String {
    "Alt".into()
}

fn default_paragraph_modifier() -> Option<String> {
    Some("Shift".into())
}

fn default_trigger_delay_ms() -> u64 {
    120
}

fn default_release_delay_ms() -> u64 {
    150
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_min_move_distance() -> f64 {
    10.0
}

fn default_word_hit_tolerance() -> f64 {
    0.01
}

fn default_source_language() -> String {
    "en".into()
}

fn default_target_language() -> String {
    "zh-Hans".into()
}

fn default_cloud_endpoint() -> String {
    DEFAULT_CLOUD_ENDPOINT.into()
}

fn default_cloud_timeout_ms() -> u64 {
    4000
}

fn default_ocr_command() -> String {
    "tesseract".into()
}

fn default_ocr_timeout_ms() -> u64 {
    3000
}

fn default_capture_width() -> f64 {
    420.0
}

fn default_capture_height() -> f64 {
    140.0
}

fn default_result_cache_size() -> usize {
    64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            paragraph_modifier: default_paragraph_modifier(),
            trigger_delay_ms: default_trigger_delay_ms(),
            release_delay_ms: default_release_delay_ms(),
            debounce_ms: default_debounce_ms(),
            min_move_distance: default_min_move_distance(),
            word_hit_tolerance: default_word_hit_tolerance(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            show_debug_regions: false,
            cloud_api_key: None,
            cloud_endpoint: default_cloud_endpoint(),
            cloud_timeout_ms: default_cloud_timeout_ms(),
            dictionary_path: None,
            ocr_command: default_ocr_command(),
            ocr_timeout_ms: default_ocr_timeout_ms(),
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            result_cache_size: default_result_cache_size(),
            debug_logging: false,
            log_file: None,
        }
    }
}

/// `settings.json` under the platform config directory, falling back to the
/// working directory.
pub fn default_settings_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("hover_translate"))
        .unwrap_or_default()
        .join("settings.json")
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn modifier_spec(&self) -> ModifierSpec {
        match parse_modifier_spec(&self.hotkey, self.paragraph_modifier.as_deref()) {
            Some(spec) => spec,
            None => {
                tracing::warn!(
                    "provided hotkey '{}' with paragraph modifier {:?} is invalid; using default Alt+Shift",
                    self.hotkey,
                    self.paragraph_modifier
                );
                ModifierSpec::default()
            }
        }
    }

    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(&self.source_language, &self.target_language)
    }

    /// Configured key, or the environment fallback. Blank values count as
    /// unset.
    pub fn cloud_api_key(&self) -> Option<String> {
        let usable = |key: String| {
            let key = key.trim().to_string();
            (!key.is_empty()).then_some(key)
        };
        self.cloud_api_key
            .clone()
            .and_then(usable)
            .or_else(|| std::env::var(CLOUD_KEY_ENV).ok().and_then(usable))
    }

    pub fn cloud_timeout(&self) -> Duration {
        Duration::from_millis(self.cloud_timeout_ms)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            spec: self.modifier_spec(),
            trigger_delay: Duration::from_millis(self.trigger_delay_ms),
            release_delay: Duration::from_millis(self.release_delay_ms),
            debounce: Duration::from_millis(self.debounce_ms.max(MIN_DEBOUNCE_MS)),
            min_distance: self.min_move_distance,
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            show_debug_regions: self.show_debug_regions,
            word_hit_tolerance: self.word_hit_tolerance,
            cache_size: self.result_cache_size,
        }
    }
}
