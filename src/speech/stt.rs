//! Speech-to-text (STT) processing

use std::path::Path;

use async_trait::async_trait;

use super::Transcribe;
use crate::{Error, Result};

/// Response from the OpenAI transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes speech to text via the OpenAI transcription endpoint
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Transcribe for SpeechToText {
    async fn transcribe(&self, path: &Path) -> Result<String> {
        let audio = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Stt(format!("failed to read {}: {e}", path.display())))?;

        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let file_name = path
            .file_name()
            .map_or_else(|| "audio.ogg".to_string(), |n| n.to_string_lossy().into_owned());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio).file_name(file_name),
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                Error::Stt(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            Error::Stt(e.to_string())
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
