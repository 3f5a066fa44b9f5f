use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;

/// Chunked result body, persisted by the caller without buffering the
/// whole document in memory.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ProviderError>> + Send>>;

/// Provider-specific language codes for the ISO-ish codes accepted by the
/// API. Unknown codes fall back to US English.
pub fn provider_lang_code(code: &str) -> &'static str {
    match code {
        "pt" => "PT",
        "en" => "EN-US",
        _ => "EN-US",
    }
}

/// Remote handle for a submitted document; both parts are required by every
/// follow-up call.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentHandle {
    pub document_id: String,
    pub document_key: String,
}

/// Remote translation state as reported by a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    Done,
    Error,
    Translating,
    Queued,
    Unknown(String),
}

impl RemoteState {
    fn parse(raw: &str) -> Self {
        match raw {
            "done" => RemoteState::Done,
            "error" => RemoteState::Error,
            "translating" => RemoteState::Translating,
            "queued" => RemoteState::Queued,
            other => RemoteState::Unknown(other.to_string()),
        }
    }
}

/// One status poll result.
#[derive(Debug, Clone)]
pub struct DocumentStatus {
    pub state: RemoteState,
    pub seconds_remaining: Option<u64>,
    pub message: Option<String>,
}

/// Narrow interface over the remote translation service.
///
/// All three operations are single attempts with no implicit retry; the job
/// runner owns retry and timeout policy.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Upload a document for translation.
    async fn submit_document(
        &self,
        file: Vec<u8>,
        filename: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<DocumentHandle, ProviderError>;

    /// Check translation state of a previously submitted document.
    async fn poll_status(&self, doc: &DocumentHandle) -> Result<DocumentStatus, ProviderError>;

    /// Open a download of the translated document.
    async fn fetch_result(&self, doc: &DocumentHandle) -> Result<ByteStream, ProviderError>;
}

/// Client for the DeepL document translation API.
pub struct DeepLClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
    seconds_remaining: Option<u64>,
    message: Option<String>,
}

impl DeepLClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// Convert a non-success response into `ProviderError::Api`, pulling the
    /// provider's message out of the body when there is one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TranslationProvider for DeepLClient {
    async fn submit_document(
        &self,
        file: Vec<u8>,
        filename: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<DocumentHandle, ProviderError> {
        let part = reqwest::multipart::Part::bytes(file).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("target_lang", target_lang.to_string())
            .text("source_lang", source_lang.to_string());

        let response = self
            .http
            .post(format!("{}/document", self.base_url))
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await?;

        let handle = Self::check(response).await?.json::<DocumentHandle>().await?;
        Ok(handle)
    }

    async fn poll_status(&self, doc: &DocumentHandle) -> Result<DocumentStatus, ProviderError> {
        let response = self
            .http
            .post(format!("{}/document/{}", self.base_url, doc.document_id))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "document_key": doc.document_key }))
            .send()
            .await?;

        let body = Self::check(response).await?.json::<StatusBody>().await?;
        Ok(DocumentStatus {
            state: RemoteState::parse(&body.status),
            seconds_remaining: body.seconds_remaining,
            message: body.message,
        })
    }

    async fn fetch_result(&self, doc: &DocumentHandle) -> Result<ByteStream, ProviderError> {
        let response = self
            .http
            .post(format!(
                "{}/document/{}/result",
                self.base_url, doc.document_id
            ))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "document_key": doc.document_key }))
            .send()
            .await?;

        let stream = Self::check(response)
            .await?
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ProviderError::Http));
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_lang_codes_map_to_provider_codes() {
        assert_eq!(provider_lang_code("pt"), "PT");
        assert_eq!(provider_lang_code("en"), "EN-US");
    }

    #[test]
    fn unknown_lang_code_falls_back_to_english() {
        assert_eq!(provider_lang_code("xx"), "EN-US");
    }

    #[test]
    fn remote_state_parsing_keeps_unknown_value() {
        assert_eq!(RemoteState::parse("done"), RemoteState::Done);
        assert_eq!(RemoteState::parse("queued"), RemoteState::Queued);
        assert_eq!(
            RemoteState::parse("exploded"),
            RemoteState::Unknown("exploded".to_string())
        );
    }
}
