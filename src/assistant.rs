//! Conversational assistant adapter (OpenAI Assistants v2)
//!
//! One request drives the full persona lifecycle: create the assistant,
//! open a thread, post the user text, start a run, poll it to completion,
//! and read back the reply. The poll is bounded by a configured interval
//! and attempt count, so a hung run resolves to a timeout instead of
//! stalling the request forever.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;
use crate::{Error, Result};

/// OpenAI API base URL
const OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Beta header required by the Assistants v2 API
const ASSISTANTS_BETA: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Seam for the conversational assistant
#[async_trait]
pub trait Converse: Send + Sync {
    /// Submit user text, return the assistant's reply text
    ///
    /// # Errors
    ///
    /// Returns `Error::Assistant` on any persona/thread/run failure,
    /// or `Error::AssistantTimeout` if the run never completes
    async fn ask(&self, text: &str) -> Result<String>;
}

/// Run status reported by the Assistants API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    RequiresAction,
    Unknown,
}

impl RunStatus {
    /// Parse an API status string
    #[must_use]
    pub fn from_api(status: &str) -> Self {
        match status {
            "queued" => Self::Queued,
            "in_progress" | "cancelling" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "expired" => Self::Expired,
            "incomplete" => Self::Incomplete,
            "requires_action" => Self::RequiresAction,
            _ => Self::Unknown,
        }
    }
}

/// Phase of the run-poll state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Run created, no status observed yet
    Submitted,
    /// Waiting on a non-terminal status
    Polling,
    /// Run finished successfully
    Completed,
    /// Run reached a terminal status other than completed
    Failed,
    /// Attempt budget exhausted before a terminal status
    TimedOut,
}

/// Advance the poll state machine after observing `status` on `attempt`
/// (1-based) of `max_attempts`.
#[must_use]
pub fn phase_after_poll(status: RunStatus, attempt: u32, max_attempts: u32) -> RunPhase {
    match status {
        RunStatus::Completed => RunPhase::Completed,
        RunStatus::Failed
        | RunStatus::Cancelled
        | RunStatus::Expired
        | RunStatus::Incomplete
        | RunStatus::RequiresAction => RunPhase::Failed,
        RunStatus::Queued | RunStatus::InProgress | RunStatus::Unknown => {
            if attempt >= max_attempts {
                RunPhase::TimedOut
            } else {
                RunPhase::Polling
            }
        }
    }
}

/// OpenAI Assistants API client
pub struct AssistantClient {
    client: reqwest::Client,
    api_key: String,
    config: AssistantConfig,
}

impl AssistantClient {
    /// Create a new assistant client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: AssistantConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for assistant".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            config,
        })
    }

    /// POST a JSON body to an Assistants endpoint, parse the JSON response
    async fn post<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(format!("{OPENAI_BASE}{path}"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(ASSISTANTS_BETA.0, ASSISTANTS_BETA.1)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Assistant(format!("request to {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(format!(
                "API error on {path}: {status} - {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Assistant(format!("failed to parse {path} response: {e}")))
    }

    /// GET an Assistants endpoint, parse the JSON response
    async fn get<R: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<R> {
        let response = self
            .client
            .get(format!("{OPENAI_BASE}{path}"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(ASSISTANTS_BETA.0, ASSISTANTS_BETA.1)
            .send()
            .await
            .map_err(|e| Error::Assistant(format!("request to {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Assistant(format!(
                "API error on {path}: {status} - {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Assistant(format!("failed to parse {path} response: {e}")))
    }

    /// Create the assistant persona from the configured instructions/name/model
    async fn create_assistant(&self) -> Result<String> {
        let request = CreateAssistantRequest {
            model: &self.config.model,
            name: &self.config.name,
            instructions: &self.config.instructions,
        };
        let created: ObjectId = self.post("/assistants", &request).await?;
        Ok(created.id)
    }

    /// Open a fresh conversation thread
    async fn create_thread(&self) -> Result<String> {
        let created: ObjectId = self.post("/threads", &serde_json::json!({})).await?;
        Ok(created.id)
    }

    /// Post the user's text into the thread
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<()> {
        let request = CreateMessageRequest {
            role: "user",
            content: text,
        };
        let _: ObjectId = self
            .post(&format!("/threads/{thread_id}/messages"), &request)
            .await?;
        Ok(())
    }

    /// Start a run of the persona against the thread
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let request = CreateRunRequest { assistant_id };
        let created: ObjectId = self
            .post(&format!("/threads/{thread_id}/runs"), &request)
            .await?;
        Ok(created.id)
    }

    /// Fetch the current run status
    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus> {
        let run: RunStatusResponse = self
            .get(&format!("/threads/{thread_id}/runs/{run_id}"))
            .await?;
        Ok(RunStatus::from_api(&run.status))
    }

    /// Poll the run until the state machine reaches a terminal phase
    async fn await_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        let max = self.config.poll_max_attempts;
        let mut phase = RunPhase::Submitted;

        for attempt in 1..=max {
            tokio::time::sleep(self.config.poll_interval).await;

            let status = self.run_status(thread_id, run_id).await?;
            phase = phase_after_poll(status, attempt, max);
            tracing::debug!(?status, ?phase, attempt, "assistant run polled");

            match phase {
                RunPhase::Completed => return Ok(()),
                RunPhase::Failed => {
                    return Err(Error::Assistant(format!(
                        "run {run_id} ended with status {status:?}"
                    )));
                }
                RunPhase::TimedOut => return Err(Error::AssistantTimeout(max)),
                RunPhase::Submitted | RunPhase::Polling => {}
            }
        }

        // max_attempts >= 1, so the loop always resolves before falling out
        Err(Error::AssistantTimeout(max))
    }

    /// Read the newest message's first text content block
    async fn latest_reply(&self, thread_id: &str) -> Result<String> {
        let list: MessageList = self.get(&format!("/threads/{thread_id}/messages")).await?;

        list.data
            .first()
            .and_then(|m| m.content.first())
            .and_then(|c| c.text.as_ref())
            .map(|t| t.value.clone())
            .ok_or_else(|| Error::Assistant("thread has no text reply".to_string()))
    }
}

#[async_trait]
impl Converse for AssistantClient {
    async fn ask(&self, text: &str) -> Result<String> {
        let assistant_id = self.create_assistant().await?;
        let thread_id = self.create_thread().await?;
        self.add_user_message(&thread_id, text).await?;
        let run_id = self.create_run(&thread_id, &assistant_id).await?;

        self.await_run(&thread_id, &run_id).await?;

        let reply = self.latest_reply(&thread_id).await?;
        tracing::info!(thread_id = %thread_id, "assistant reply received");
        Ok(reply)
    }
}

#[derive(Serialize)]
struct CreateAssistantRequest<'a> {
    model: &'a str,
    name: &'a str,
    instructions: &'a str,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Deserialize)]
struct RunStatusResponse {
    status: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<TextValue>,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(RunStatus::from_api("queued"), RunStatus::Queued);
        assert_eq!(RunStatus::from_api("in_progress"), RunStatus::InProgress);
        assert_eq!(RunStatus::from_api("completed"), RunStatus::Completed);
        assert_eq!(RunStatus::from_api("failed"), RunStatus::Failed);
        assert_eq!(RunStatus::from_api("expired"), RunStatus::Expired);
        assert_eq!(RunStatus::from_api("something_new"), RunStatus::Unknown);
    }

    #[test]
    fn completed_wins_even_on_last_attempt() {
        assert_eq!(
            phase_after_poll(RunStatus::Completed, 60, 60),
            RunPhase::Completed
        );
    }

    #[test]
    fn terminal_failures_map_to_failed() {
        for status in [
            RunStatus::Failed,
            RunStatus::Cancelled,
            RunStatus::Expired,
            RunStatus::Incomplete,
            RunStatus::RequiresAction,
        ] {
            assert_eq!(phase_after_poll(status, 1, 60), RunPhase::Failed);
        }
    }

    #[test]
    fn nonterminal_keeps_polling_until_budget() {
        assert_eq!(
            phase_after_poll(RunStatus::InProgress, 1, 3),
            RunPhase::Polling
        );
        assert_eq!(
            phase_after_poll(RunStatus::InProgress, 2, 3),
            RunPhase::Polling
        );
        assert_eq!(
            phase_after_poll(RunStatus::InProgress, 3, 3),
            RunPhase::TimedOut
        );
    }
}
