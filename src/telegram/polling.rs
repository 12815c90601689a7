//! Telegram polling mode — getUpdates loop feeding the dispatch channel

use tokio::sync::mpsc;

use super::types::{GetUpdatesResponse, Update, API_BASE};

impl super::TelegramChannel {
    /// Spawn a background task that polls Telegram's getUpdates API
    ///
    /// Polls every `interval` and forwards received messages into the mpsc
    /// channel. Deletes any existing webhook before starting to avoid
    /// conflicts.
    pub fn start_polling(&self, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let token = self.token.clone();
        let client = self.client.clone();
        let tx = self
            .update_tx
            .clone()
            .expect("start_polling requires an update_tx (use with_receiver)");

        tokio::spawn(async move {
            polling_loop(token, client, tx, interval).await;
        })
    }
}

/// Run the polling loop (background task)
async fn polling_loop(
    token: String,
    client: reqwest::Client,
    tx: mpsc::Sender<Update>,
    interval: std::time::Duration,
) {
    // Delete any existing webhook so getUpdates works
    let delete_url = format!("{API_BASE}{token}/deleteWebhook");
    if let Err(e) = client.post(&delete_url).send().await {
        tracing::warn!(error = %e, "failed to delete Telegram webhook before polling");
    }

    let mut offset: Option<i64> = None;

    loop {
        let url = format!("{API_BASE}{token}/getUpdates");
        let mut params = serde_json::json!({
            "timeout": 30,
            "allowed_updates": ["message"],
        });
        if let Some(off) = offset {
            params["offset"] = serde_json::json!(off);
        }

        match client.post(&url).json(&params).send().await {
            Ok(resp) => {
                if let Ok(body) = resp.text().await {
                    if let Ok(updates) = serde_json::from_str::<GetUpdatesResponse>(&body) {
                        for update in updates.result {
                            // Advance offset past this update
                            offset = Some(update.update_id + 1);

                            // Skip messages authored by bots
                            if update
                                .message
                                .as_ref()
                                .and_then(|m| m.from.as_ref())
                                .is_some_and(|u| u.is_bot)
                            {
                                continue;
                            }

                            if let Err(e) = tx.send(update).await {
                                tracing::warn!(error = %e, "failed to forward Telegram update");
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telegram getUpdates error");
            }
        }

        tokio::time::sleep(interval).await;
    }
}
