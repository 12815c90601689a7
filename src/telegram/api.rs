//! Raw Telegram Bot API calls

use std::path::Path;

use super::types::{
    GetFileRequest, SendChatActionRequest, SendMessageRequest, TelegramFile, TelegramResponse,
    API_BASE, FILE_BASE,
};
use crate::{Error, Result};

impl super::TelegramChannel {
    /// Validate the bot token by calling `getMe`
    ///
    /// # Errors
    ///
    /// Returns error if the token is invalid
    pub async fn get_me(&self) -> Result<()> {
        let url = format!("{API_BASE}{}/getMe", self.token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram getMe error: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Channel("Invalid Telegram bot token".to_string()));
        }

        Ok(())
    }

    /// Send a plain-text message to a chat
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        let url = format!("{API_BASE}{}/sendMessage", self.token);

        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            reply_to_message_id: reply_to,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram API error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!(
                "Telegram API error: {status} - {body}"
            )));
        }

        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Send a chat action (e.g. `record_voice` while the pipeline runs)
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        let url = format!("{API_BASE}{}/sendChatAction", self.token);

        let request = SendChatActionRequest {
            chat_id,
            action: action.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram sendChatAction error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!(
                "Telegram sendChatAction error: {status} - {body}"
            )));
        }

        Ok(())
    }

    /// Download a file from Telegram by `file_id` into `destination`.
    ///
    /// Calls `getFile` to resolve the file path, then fetches from
    /// `https://api.telegram.org/file/bot{token}/{file_path}` and writes the
    /// bytes to `destination`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Download` if the API request, fetch, or local write fails
    pub async fn download_file(&self, file_id: &str, destination: &Path) -> Result<()> {
        let url = format!("{API_BASE}{}/getFile", self.token);

        let request = GetFileRequest {
            file_id: file_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Download(format!("Telegram getFile error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::Download(format!("Telegram getFile response read error: {e}")))?;

        let parsed: TelegramResponse<TelegramFile> = serde_json::from_str(&body)
            .map_err(|e| Error::Download(format!("Telegram getFile parse error: {e}")))?;

        let file = parsed.result.ok_or_else(|| {
            Error::Download(format!(
                "Telegram getFile error: {}",
                parsed.description.unwrap_or_default()
            ))
        })?;

        let file_path = file
            .file_path
            .ok_or_else(|| Error::Download("Telegram getFile returned no file_path".to_string()))?;

        let download_url = format!("{FILE_BASE}{}/{file_path}", self.token);
        let data = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| Error::Download(format!("Telegram file download error: {e}")))?
            .bytes()
            .await
            .map_err(|e| Error::Download(format!("Telegram file download read error: {e}")))?;

        tokio::fs::write(destination, &data)
            .await
            .map_err(|e| Error::Download(format!("failed to write {}: {e}", destination.display())))?;

        tracing::debug!(
            file_id,
            bytes = data.len(),
            path = %destination.display(),
            "Telegram file downloaded"
        );
        Ok(())
    }

    /// Send a local audio file as a voice message (multipart upload)
    ///
    /// # Errors
    ///
    /// Returns error if reading the file or the API request fails
    pub async fn send_voice(&self, chat_id: i64, audio: &Path, reply_to: Option<i64>) -> Result<()> {
        let url = format!("{API_BASE}{}/sendVoice", self.token);

        let data = tokio::fs::read(audio)
            .await
            .map_err(|e| Error::Channel(format!("failed to read {}: {e}", audio.display())))?;

        let part = reqwest::multipart::Part::bytes(data)
            .file_name("response.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| Error::Channel(format!("Telegram sendVoice part error: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("voice", part);
        if let Some(id) = reply_to {
            form = form.text("reply_to_message_id", id.to_string());
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram sendVoice error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!(
                "Telegram sendVoice error: {status} - {body}"
            )));
        }

        tracing::debug!(chat_id, "Telegram voice message sent");
        Ok(())
    }
}
