//! Telegram channel adapter
//!
//! Uses getUpdates polling for receiving messages and the Bot API for
//! sending replies and downloading attachments.

mod api;
pub mod polling;
pub mod types;

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::Result;
pub use types::{Audio, Chat, Document, Message, Update, User, Voice};

/// Buffer size for the update fan-in channel
const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// Seam between the orchestrator and the chat platform
///
/// `TelegramChannel` is the production implementation; tests substitute
/// mocks to exercise the pipeline without the network.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain-text reply
    ///
    /// # Errors
    ///
    /// Returns error if delivery fails
    async fn reply_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()>;

    /// Send a local audio file as a voice message
    ///
    /// # Errors
    ///
    /// Returns error if reading the file or delivery fails
    async fn reply_voice(&self, chat_id: i64, audio: &Path, reply_to: Option<i64>) -> Result<()>;

    /// Send a chat action (typing/recording indicator)
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    async fn chat_action(&self, chat_id: i64, action: &str) -> Result<()>;

    /// Download a remote file by id into `destination`
    ///
    /// # Errors
    ///
    /// Returns `Error::Download` if the fetch or local write fails
    async fn fetch_file(&self, file_id: &str, destination: &Path) -> Result<()>;
}

/// Telegram channel adapter
#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    client: Client,
    update_tx: Option<mpsc::Sender<Update>>,
}

impl TelegramChannel {
    /// Create a new Telegram channel adapter (send-only)
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: Client::new(),
            update_tx: None,
        }
    }

    /// Create with an update receiver for polling mode
    ///
    /// Returns the channel and a receiver for incoming updates
    #[must_use]
    pub fn with_receiver(token: String) -> (Self, mpsc::Receiver<Update>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let channel = Self {
            token,
            client: Client::new(),
            update_tx: Some(tx),
        };
        (channel, rx)
    }

    /// Validate connectivity and the bot token
    ///
    /// # Errors
    ///
    /// Returns error if the token is rejected by the Bot API
    pub async fn connect(&self) -> Result<()> {
        self.get_me().await?;
        tracing::info!("Telegram channel connected");
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramChannel {
    async fn reply_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        self.send_message(chat_id, text, reply_to).await
    }

    async fn reply_voice(&self, chat_id: i64, audio: &Path, reply_to: Option<i64>) -> Result<()> {
        self.send_voice(chat_id, audio, reply_to).await
    }

    async fn chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        self.send_chat_action(chat_id, action).await
    }

    async fn fetch_file(&self, file_id: &str, destination: &Path) -> Result<()> {
        self.download_file(file_id, destination).await
    }
}
