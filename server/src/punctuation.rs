//! Optional punctuation-restoration model, invoked during `format_text`
//! (SPEC_FULL.md §4: adjust_space -> punctuation model -> chinese_to_num ->
//! adjust_space). Narrow and swappable so a deployment can run without one.

use async_trait::async_trait;
use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PunctuationError {
    #[error("punctuation model request failed: {0}")]
    Request(String),
    #[error("failed to parse punctuation model response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PunctuationError {
    fn from(e: reqwest::Error) -> Self {
        PunctuationError::Request(e.to_string())
    }
}

#[async_trait]
pub trait PunctuationModel: Send + Sync {
    async fn punctuate(&self, text: &str) -> Result<String, PunctuationError>;
}

/// Default model: no punctuation restoration, text passes through
/// unchanged. Used whenever `ServerConfig::punctuation_model` is unset.
pub struct NullPunctuationModel;

#[async_trait]
impl PunctuationModel for NullPunctuationModel {
    async fn punctuate(&self, text: &str) -> Result<String, PunctuationError> {
        Ok(text.to_string())
    }
}

/// Calls out to an HTTP endpoint that takes raw text and returns punctuated
/// text. The endpoint's shape is deployment-specific; this client only
/// assumes a `POST {endpoint}` with a JSON `{"text": ...}` body and a JSON
/// `{"text": ...}` response.
pub struct HttpPunctuationModel {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpPunctuationModel {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(serde::Serialize)]
struct PunctuateRequest<'a> {
    text: &'a str,
}

#[derive(serde::Deserialize)]
struct PunctuateResponse {
    text: String,
}

#[async_trait]
impl PunctuationModel for HttpPunctuationModel {
    async fn punctuate(&self, text: &str) -> Result<String, PunctuationError> {
        if text.is_empty() {
            return Ok(text.to_string());
        }

        let result = async {
            let resp = self
                .client
                .post(&self.endpoint)
                .json(&PunctuateRequest { text })
                .send()
                .await?
                .error_for_status()?;
            resp.json::<PunctuateResponse>()
                .await
                .map_err(|e| PunctuationError::Parse(e.to_string()))
        }
        .await;

        match result {
            Ok(resp) => Ok(resp.text),
            Err(e) => {
                warn!("punctuation model request failed, passing text through unpunctuated: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_model_passes_text_through() {
        let model = NullPunctuationModel;
        assert_eq!(model.punctuate("你好").await.unwrap(), "你好");
    }
}
