//! Voicebridge - Telegram voice assistant bot
//!
//! A user sends a voice message, audio file, or MP3 document; the bot
//! downloads it, transcribes it, asks a conversational assistant for a
//! reply, synthesizes the reply as speech, and sends it back as a voice
//! message.
//!
//! # Architecture
//!
//! ```text
//! Telegram getUpdates ──► dispatch loop ──► Handler (one task per message)
//!                                             │
//!                         download ► STT ► assistant run ► TTS ► sendVoice
//!                                             │
//!                                  per-request staging dir (always removed)
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod handler;
pub mod speech;
pub mod staging;
pub mod telegram;

pub use assistant::{AssistantClient, Converse, RunPhase, RunStatus};
pub use config::Config;
pub use error::{Error, Result};
pub use handler::Handler;
pub use speech::{SpeechToText, Synthesize, TextToSpeech, Transcribe};
pub use staging::{RequestStaging, Staging};
pub use telegram::{Messenger, TelegramChannel};
