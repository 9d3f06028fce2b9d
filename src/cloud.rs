//! Cloud translation over the Google Cloud Translation v2 JSON API.

use crate::collaborators::{CloudTranslation, CloudTranslator};
use crate::session::{primary_subtag, LanguagePair};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize, PartialEq)]
pub struct TranslateRequest<'a> {
    pub q: [&'a str; 1],
    pub source: String,
    pub target: String,
    pub format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

/// Language code as the service expects it. Script subtags for Chinese map
/// to the region codes the API uses; everything else keeps its primary
/// subtag.
pub fn cloud_language_code(code: &str) -> String {
    let lower = code.trim().to_ascii_lowercase().replace('_', "-");
    match lower.as_str() {
        "zh-hans" | "zh-cn" | "zh-sg" => "zh-CN".into(),
        "zh-hant" | "zh-tw" | "zh-hk" | "zh-mo" => "zh-TW".into(),
        "zh" => "zh-CN".into(),
        _ => primary_subtag(&lower),
    }
}

pub fn build_request_body<'a>(text: &'a str, pair: &LanguagePair) -> TranslateRequest<'a> {
    TranslateRequest {
        q: [text],
        source: cloud_language_code(&pair.source),
        target: cloud_language_code(&pair.target),
        format: "text",
    }
}

/// Extract the first translation from a response body.
pub fn parse_response(body: &str) -> Result<CloudTranslation> {
    let response: TranslateResponse =
        serde_json::from_str(body).context("invalid translation response")?;
    let first = response
        .data
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("translation response contained no translations"))?;
    Ok(CloudTranslation {
        text: first.translated_text,
        detected_language: first.detected_source_language,
    })
}

pub struct GoogleCloudTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GoogleCloudTranslator {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("hover_translate")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn request_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("invalid cloud endpoint {}", self.endpoint))?;
        url.query_pairs_mut().append_pair("key", key);
        Ok(url)
    }

    async fn request(&self, key: &str, text: &str, pair: &LanguagePair) -> Result<CloudTranslation> {
        let url = self.request_url(key)?;
        let response = self
            .client
            .post(url)
            .json(&build_request_body(text, pair))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("translation service returned {status}: {}", body.trim()));
        }
        parse_response(&body)
    }
}

#[async_trait]
impl CloudTranslator for GoogleCloudTranslator {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Option<CloudTranslation> {
        let key = self.api_key.as_deref()?;
        match self.request(key, text, pair).await {
            Ok(result) => Some(result),
            Err(err) => {
                tracing::warn!(%pair, "cloud translation failed: {err:#}");
                None
            }
        }
    }
}
