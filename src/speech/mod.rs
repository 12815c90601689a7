//! Speech processing adapters (STT and TTS)

pub mod stt;
pub mod tts;

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

pub use stt::SpeechToText;
pub use tts::TextToSpeech;

/// Seam for speech-to-text
#[async_trait]
pub trait Transcribe: Send + Sync {
    /// Transcribe the audio file at `path` to text
    ///
    /// # Errors
    ///
    /// Returns `Error::Stt` if reading or recognition fails
    async fn transcribe(&self, path: &Path) -> Result<String>;
}

/// Seam for text-to-speech
#[async_trait]
pub trait Synthesize: Send + Sync {
    /// Synthesize `text` as speech, writing MP3 bytes to `output`
    ///
    /// # Errors
    ///
    /// Returns `Error::Tts` if synthesis or the local write fails
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;
}
