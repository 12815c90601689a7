//! Text-to-speech (TTS) processing

use std::path::Path;

use async_trait::async_trait;

use super::Synthesize;
use crate::{Error, Result};

/// Synthesizes speech from text via the OpenAI speech endpoint
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    model: String,
    voice: String,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String, voice: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            voice,
        })
    }
}

#[async_trait]
impl Synthesize for TextToSpeech {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;

        tokio::fs::write(output, &audio)
            .await
            .map_err(|e| Error::Tts(format!("failed to write {}: {e}", output.display())))?;

        tracing::debug!(bytes = audio.len(), path = %output.display(), "speech synthesized");
        Ok(())
    }
}
