//! Machine translation of free text.
//!
//! User-entered text is stored in English with its detected source language; readers may
//! ask for it back in another language. All of that goes through [`Translator`] so no
//! service handles languages itself. Translation is best effort: a failed call keeps the
//! text as entered.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TranslateConfig;

pub const STORAGE_LANGUAGE: &str = "en";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Translation service returned HTTP {0}")]
    HttpStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Language the input was detected as, when the service reports it.
    pub source_language: Option<String>,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<Translation, TranslateError>;
}

/// Returns text unchanged.
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str, _target: &str) -> Result<Translation, TranslateError> {
        Ok(Translation {
            text: text.to_string(),
            source_language: None,
        })
    }
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
pub struct HttpTranslator {
    config: TranslateConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
    detected_language: Option<DetectedLanguage>,
}

#[derive(Deserialize)]
struct DetectedLanguage {
    language: String,
}

impl HttpTranslator {
    pub fn new(config: TranslateConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<Translation, TranslateError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&TranslateRequest {
                q: text,
                source: "auto",
                target,
                format: "text",
                api_key: self.config.api_key.as_deref(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TranslateError::HttpStatus(response.status().as_u16()));
        }
        let body: TranslateResponse = response.json().await?;
        Ok(Translation {
            text: body.translated_text,
            source_language: body.detected_language.map(|d| d.language),
        })
    }
}

pub fn from_config(config: Option<TranslateConfig>) -> Arc<dyn Translator> {
    match config {
        Some(config) => Arc::new(HttpTranslator::new(config)),
        None => Arc::new(IdentityTranslator),
    }
}

/// Text prepared for storage: English text plus the language it was entered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredText {
    pub text: String,
    pub source_language: Option<String>,
}

pub async fn for_storage(translator: &dyn Translator, text: &str) -> StoredText {
    match translator.translate(text, STORAGE_LANGUAGE).await {
        Ok(t) => StoredText {
            text: t.text,
            source_language: t.source_language,
        },
        Err(err) => {
            tracing::warn!(error = %err, "translation failed, storing text as entered");
            StoredText {
                text: text.to_string(),
                source_language: None,
            }
        }
    }
}

/// Render stored English text in `lang`. `None` or `en` returns the text untouched.
pub async fn for_display(translator: &dyn Translator, text: &str, lang: Option<&str>) -> String {
    let Some(lang) = lang.filter(|l| !l.is_empty() && *l != STORAGE_LANGUAGE) else {
        return text.to_string();
    };
    match translator.translate(text, lang).await {
        Ok(t) => t.text,
        Err(err) => {
            tracing::warn!(error = %err, lang, "translation for display failed");
            text.to_string()
        }
    }
}
