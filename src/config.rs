//! Configuration management for voicebridge
//!
//! All assistant and speech settings are required at startup with no
//! defaults; only staging and polling tuning have fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Default staging root for per-request audio files
const DEFAULT_STAGING_ROOT: &str = "temp";

/// Default assistant run poll interval (1s)
const DEFAULT_RUN_POLL_INTERVAL_MS: u64 = 1000;

/// Default maximum assistant run poll attempts
const DEFAULT_RUN_POLL_MAX_ATTEMPTS: u32 = 60;

/// Default getUpdates polling interval (1s)
const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1000;

/// Voicebridge configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,

    /// OpenAI API key (shared by STT, assistant, and TTS)
    pub openai_api_key: String,

    /// Assistant configuration
    pub assistant: AssistantConfig,

    /// Speech processing configuration
    pub speech: SpeechConfig,

    /// Root directory for per-request staging files
    pub staging_root: PathBuf,

    /// getUpdates polling interval
    pub update_interval: Duration,
}

/// Assistant persona and run-poll configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Model identifier for the assistant persona
    pub model: String,

    /// System instructions for the persona
    pub instructions: String,

    /// Display name for the persona
    pub name: String,

    /// Interval between run status polls
    pub poll_interval: Duration,

    /// Maximum run status polls before giving up
    pub poll_max_attempts: u32,
}

/// Speech-to-text and text-to-speech configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// STT model identifier (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model identifier (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier (e.g. "nova")
    pub tts_voice: String,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Reads a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any required variable is missing
    pub fn load() -> Result<Self> {
        // Absent .env is fine; env vars may be set directly
        let _ = dotenvy::dotenv();

        Ok(Self {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            assistant: AssistantConfig {
                model: required("ASSISTANT_MODEL")?,
                instructions: required("ASSISTANT_INSTRUCTIONS")?,
                name: required("ASSISTANT_NAME")?,
                poll_interval: Duration::from_millis(
                    env_u64("VOICEBRIDGE_RUN_POLL_INTERVAL_MS", DEFAULT_RUN_POLL_INTERVAL_MS),
                ),
                poll_max_attempts: env_u32(
                    "VOICEBRIDGE_RUN_POLL_MAX_ATTEMPTS",
                    DEFAULT_RUN_POLL_MAX_ATTEMPTS,
                ),
            },
            speech: SpeechConfig {
                stt_model: required("STT_MODEL")?,
                tts_model: required("TTS_MODEL")?,
                tts_voice: required("TTS_VOICE")?,
            },
            staging_root: std::env::var("VOICEBRIDGE_STAGING_ROOT")
                .map_or_else(|_| PathBuf::from(DEFAULT_STAGING_ROOT), PathBuf::from),
            update_interval: Duration::from_millis(env_u64(
                "VOICEBRIDGE_UPDATE_INTERVAL_MS",
                DEFAULT_UPDATE_INTERVAL_MS,
            )),
        })
    }
}

/// Read a required environment variable
fn required(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("missing required environment variable {name}")))
}

/// Read a u64 environment variable with a default
fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a u32 environment variable with a default
fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
