//! Telegram Bot API request/response types

use serde::{Deserialize, Serialize};

/// Telegram Bot API base URL
pub(crate) const API_BASE: &str = "https://api.telegram.org/bot";

/// Telegram file download base URL
pub(crate) const FILE_BASE: &str = "https://api.telegram.org/file/bot";

/// Telegram sendMessage request
#[derive(Serialize)]
pub(crate) struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

/// Telegram sendChatAction request
#[derive(Serialize)]
pub(crate) struct SendChatActionRequest {
    pub chat_id: i64,
    pub action: String,
}

/// Telegram getFile request
#[derive(Serialize)]
pub(crate) struct GetFileRequest {
    pub file_id: String,
}

/// File metadata from Telegram getFile response
#[derive(Debug, Deserialize)]
pub(crate) struct TelegramFile {
    #[allow(dead_code)]
    pub file_id: String,
    pub file_path: Option<String>,
}

/// Telegram API response wrapper
#[derive(Deserialize)]
#[allow(dead_code)]
pub(crate) struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// Response from Telegram getUpdates API
#[derive(Debug, Deserialize)]
pub(crate) struct GetUpdatesResponse {
    #[allow(dead_code)]
    pub ok: bool,
    pub result: Vec<Update>,
}

/// A single update from getUpdates
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// An incoming Telegram message
#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub voice: Option<Voice>,
    pub audio: Option<Audio>,
    pub document: Option<Document>,
}

/// Chat info from an incoming message
#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// User info from an incoming message
#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
}

/// Voice note attachment
#[derive(Debug, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub mime_type: Option<String>,
}

/// Audio file attachment
#[derive(Debug, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

/// Generic document attachment
#[derive(Debug, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}
