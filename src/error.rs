//! Error types for voicebridge

use thiserror::Error;

/// Result type alias for voicebridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voicebridge
///
/// Pipeline stages each have their own variant so the orchestrator can map
/// a failure to exactly one user-facing reply without string matching.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote file fetch or local write error
    #[error("download error: {0}")]
    Download(String),

    /// Speech-to-text error (including an empty transcript)
    #[error("STT error: {0}")]
    Stt(String),

    /// Assistant persona/thread/run error
    #[error("assistant error: {0}")]
    Assistant(String),

    /// Assistant run did not complete within the allotted attempts
    #[error("assistant run timed out after {0} poll attempts")]
    AssistantTimeout(u32),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Telegram channel error (API call or reply delivery)
    #[error("channel error: {0}")]
    Channel(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
