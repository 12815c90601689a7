//! Message handler — the pipeline orchestrator
//!
//! Routes incoming Telegram messages, drives download → transcription →
//! assistant → synthesis → voice reply, and maps each failure kind to
//! exactly one user-facing reply. The request staging directory is removed
//! after every accepted message, whatever the outcome.

use crate::assistant::Converse;
use crate::speech::{Synthesize, Transcribe};
use crate::staging::{RequestStaging, Staging};
use crate::telegram::{Message, Messenger};
use crate::{Error, Result};

/// Welcome reply for /start
pub const WELCOME_TEXT: &str =
    "🎉 Добро пожаловать! 🎧\nОтправьте голосовое сообщение или аудиофайл, и давайте пообщаемся!";

/// Rejection reply for documents that are not MPEG audio
pub const REJECT_NON_MP3: &str = "Пожалуйста, отправьте MP3 файл";

/// Stage error replies
pub const ERR_DOWNLOAD: &str = "❌ Ошибка загрузки файла";
pub const ERR_TRANSCRIPTION: &str = "❌ Ошибка расшифровки аудио";
pub const ERR_PROCESSING: &str = "❌ Ошибка обработки запроса";
pub const ERR_SYNTHESIS: &str = "❌ Ошибка генерации аудио";
pub const ERR_SEND: &str = "❌ Ошибка отправки";

/// Chat action shown while the pipeline runs
const PROCESSING_ACTION: &str = "record_voice";

/// Routing decision for an incoming message, first match wins
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// /start command
    Start,
    /// Accepted audio with derived input filename
    Accept(AudioRef),
    /// Document with a non-MPEG content type
    RejectDocument,
    /// Everything else: no reply
    Ignore,
}

/// Remote audio reference accepted for processing
#[derive(Debug, PartialEq, Eq)]
pub struct AudioRef {
    /// Telegram file id for download
    pub file_id: String,
    /// Derived input filename inside the staging directory
    pub filename: String,
}

/// Route a message: /start, then voice, then audio, then document
#[must_use]
pub fn dispatch(msg: &Message) -> Dispatch {
    if let Some(text) = &msg.text {
        // Commands may carry a bot suffix ("/start@somebot")
        let command = text
            .split_whitespace()
            .next()
            .and_then(|w| w.split('@').next());
        if command == Some("/start") {
            return Dispatch::Start;
        }
    }

    if let Some(voice) = &msg.voice {
        return Dispatch::Accept(AudioRef {
            file_id: voice.file_id.clone(),
            filename: format!("voice_{}.ogg", voice.file_id),
        });
    }

    if let Some(audio) = &msg.audio {
        return Dispatch::Accept(AudioRef {
            file_id: audio.file_id.clone(),
            filename: audio
                .file_name
                .clone()
                .unwrap_or_else(|| format!("audio_{}.mp3", audio.file_id)),
        });
    }

    if let Some(document) = &msg.document {
        if document.mime_type.as_deref() != Some("audio/mpeg") {
            return Dispatch::RejectDocument;
        }
        return Dispatch::Accept(AudioRef {
            file_id: document.file_id.clone(),
            filename: document
                .file_name
                .clone()
                .unwrap_or_else(|| format!("document_{}.mp3", document.file_id)),
        });
    }

    Dispatch::Ignore
}

/// Map a pipeline error to its user-facing reply
#[must_use]
pub fn stage_reply(error: &Error) -> &'static str {
    match error {
        // Staging allocation surfaces as Io; it is a local write failure
        Error::Download(_) | Error::Io(_) => ERR_DOWNLOAD,
        Error::Stt(_) => ERR_TRANSCRIPTION,
        Error::Tts(_) => ERR_SYNTHESIS,
        Error::Channel(_) => ERR_SEND,
        Error::Assistant(_)
        | Error::AssistantTimeout(_)
        | Error::Config(_)
        | Error::Http(_)
        | Error::Serialization(_) => ERR_PROCESSING,
    }
}

/// Pipeline orchestrator, generic over its adapter seams
pub struct Handler<M, T, A, S> {
    messenger: M,
    stt: T,
    assistant: A,
    tts: S,
    staging: Staging,
}

impl<M, T, A, S> Handler<M, T, A, S>
where
    M: Messenger,
    T: Transcribe,
    A: Converse,
    S: Synthesize,
{
    /// Create a handler over the given adapters
    pub fn new(messenger: M, stt: T, assistant: A, tts: S, staging: Staging) -> Self {
        Self {
            messenger,
            stt,
            assistant,
            tts,
            staging,
        }
    }

    /// Handle one incoming message end to end
    pub async fn handle(&self, msg: Message) {
        let chat_id = msg.chat.id;
        let reply_to = Some(msg.message_id);

        match dispatch(&msg) {
            Dispatch::Start => {
                if let Err(e) = self.messenger.reply_text(chat_id, WELCOME_TEXT, reply_to).await {
                    tracing::warn!(chat_id, error = %e, "failed to send welcome");
                }
            }
            Dispatch::RejectDocument => {
                if let Err(e) = self
                    .messenger
                    .reply_text(chat_id, REJECT_NON_MP3, reply_to)
                    .await
                {
                    tracing::warn!(chat_id, error = %e, "failed to send rejection");
                }
            }
            Dispatch::Accept(audio) => self.handle_audio(&msg, &audio).await,
            Dispatch::Ignore => {}
        }
    }

    /// Run the audio pipeline for an accepted message
    async fn handle_audio(&self, msg: &Message, audio: &AudioRef) {
        let chat_id = msg.chat.id;
        let reply_to = Some(msg.message_id);
        let user_id = msg.from.as_ref().map_or(chat_id, |u| u.id);

        let request = match self.staging.begin(user_id, &audio.filename).await {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(user_id, error = %e, "staging allocation failed");
                self.send_error(chat_id, &e, reply_to).await;
                return;
            }
        };

        // Progress indicator; a failure here never gates the pipeline
        if let Err(e) = self.messenger.chat_action(chat_id, PROCESSING_ACTION).await {
            tracing::debug!(chat_id, error = %e, "chat action failed");
        }

        let outcome = self
            .run_pipeline(chat_id, reply_to, &audio.file_id, &request)
            .await;

        // Input and output files go away regardless of outcome
        request.cleanup().await;

        if let Err(e) = outcome {
            tracing::warn!(chat_id, user_id, error = %e, "pipeline failed");
            self.send_error(chat_id, &e, reply_to).await;
        }
    }

    /// The five pipeline stages, each gated on the previous one
    async fn run_pipeline(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        file_id: &str,
        request: &RequestStaging,
    ) -> Result<()> {
        self.messenger
            .fetch_file(file_id, request.input_path())
            .await?;

        let transcript = self.stt.transcribe(request.input_path()).await?;
        if transcript.trim().is_empty() {
            return Err(Error::Stt("empty transcript".to_string()));
        }

        let reply = self.assistant.ask(&transcript).await?;

        self.tts.synthesize(&reply, request.output_path()).await?;

        self.messenger
            .reply_voice(chat_id, request.output_path(), reply_to)
            .await?;

        tracing::info!(chat_id, "voice reply delivered");
        Ok(())
    }

    /// Best-effort delivery of the stage error reply
    async fn send_error(&self, chat_id: i64, error: &Error, reply_to: Option<i64>) {
        let text = stage_reply(error);
        if let Err(e) = self.messenger.reply_text(chat_id, text, reply_to).await {
            tracing::warn!(chat_id, error = %e, "failed to send error reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::types::{Audio, Chat, Document, Voice};

    fn bare_message() -> Message {
        Message {
            message_id: 1,
            chat: Chat { id: 10 },
            from: None,
            text: None,
            voice: None,
            audio: None,
            document: None,
        }
    }

    #[test]
    fn start_command_dispatches_first() {
        let mut msg = bare_message();
        msg.text = Some("/start".to_string());
        assert_eq!(dispatch(&msg), Dispatch::Start);

        msg.text = Some("/start@voicebridge_bot".to_string());
        assert_eq!(dispatch(&msg), Dispatch::Start);
    }

    #[test]
    fn plain_text_is_ignored() {
        let mut msg = bare_message();
        msg.text = Some("привет".to_string());
        assert_eq!(dispatch(&msg), Dispatch::Ignore);
    }

    #[test]
    fn voice_filename_uses_fixed_pattern() {
        let mut msg = bare_message();
        msg.voice = Some(Voice {
            file_id: "abc".to_string(),
            mime_type: Some("audio/ogg".to_string()),
        });

        assert_eq!(
            dispatch(&msg),
            Dispatch::Accept(AudioRef {
                file_id: "abc".to_string(),
                filename: "voice_abc.ogg".to_string(),
            })
        );
    }

    #[test]
    fn audio_prefers_declared_filename() {
        let mut msg = bare_message();
        msg.audio = Some(Audio {
            file_id: "f1".to_string(),
            file_name: Some("song.mp3".to_string()),
            mime_type: Some("audio/mpeg".to_string()),
        });
        match dispatch(&msg) {
            Dispatch::Accept(a) => assert_eq!(a.filename, "song.mp3"),
            other => panic!("unexpected dispatch: {other:?}"),
        }

        msg.audio = Some(Audio {
            file_id: "f1".to_string(),
            file_name: None,
            mime_type: None,
        });
        match dispatch(&msg) {
            Dispatch::Accept(a) => assert_eq!(a.filename, "audio_f1.mp3"),
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn document_gated_on_mpeg_mime() {
        let mut msg = bare_message();
        msg.document = Some(Document {
            file_id: "d1".to_string(),
            file_name: None,
            mime_type: Some("application/pdf".to_string()),
        });
        assert_eq!(dispatch(&msg), Dispatch::RejectDocument);

        msg.document = Some(Document {
            file_id: "d1".to_string(),
            file_name: None,
            mime_type: None,
        });
        assert_eq!(dispatch(&msg), Dispatch::RejectDocument);

        msg.document = Some(Document {
            file_id: "d1".to_string(),
            file_name: None,
            mime_type: Some("audio/mpeg".to_string()),
        });
        match dispatch(&msg) {
            Dispatch::Accept(a) => assert_eq!(a.filename, "document_d1.mp3"),
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn voice_outranks_document() {
        let mut msg = bare_message();
        msg.voice = Some(Voice {
            file_id: "v".to_string(),
            mime_type: None,
        });
        msg.document = Some(Document {
            file_id: "d".to_string(),
            file_name: None,
            mime_type: Some("application/pdf".to_string()),
        });
        match dispatch(&msg) {
            Dispatch::Accept(a) => assert_eq!(a.file_id, "v"),
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn every_error_kind_has_one_reply() {
        assert_eq!(stage_reply(&Error::Download("x".into())), ERR_DOWNLOAD);
        assert_eq!(stage_reply(&Error::Stt("x".into())), ERR_TRANSCRIPTION);
        assert_eq!(stage_reply(&Error::Assistant("x".into())), ERR_PROCESSING);
        assert_eq!(stage_reply(&Error::AssistantTimeout(60)), ERR_PROCESSING);
        assert_eq!(stage_reply(&Error::Tts("x".into())), ERR_SYNTHESIS);
        assert_eq!(stage_reply(&Error::Channel("x".into())), ERR_SEND);
    }
}
