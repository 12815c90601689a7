use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicebridge::{AssistantClient, Config, Handler, SpeechToText, Staging, TelegramChannel, TextToSpeech};

/// Voicebridge - Telegram voice assistant bot
#[derive(Parser)]
#[command(name = "voicebridge", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voicebridge=info",
        1 => "info,voicebridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::info!(staging_root = %config.staging_root.display(), "starting voicebridge");

    tokio::fs::create_dir_all(&config.staging_root).await?;

    let (channel, mut updates) = TelegramChannel::with_receiver(config.bot_token.clone());
    channel.connect().await?;

    let stt = SpeechToText::new(config.openai_api_key.clone(), config.speech.stt_model.clone())?;
    let assistant = AssistantClient::new(config.openai_api_key.clone(), config.assistant.clone())?;
    let tts = TextToSpeech::new(
        config.openai_api_key.clone(),
        config.speech.tts_model.clone(),
        config.speech.tts_voice.clone(),
    )?;
    let staging = Staging::new(config.staging_root.clone());

    let handler = Arc::new(Handler::new(channel.clone(), stt, assistant, tts, staging));

    channel.start_polling(config.update_interval);
    tracing::info!("voicebridge ready");

    // One task per incoming message; a failed request never affects others
    while let Some(update) = updates.recv().await {
        if let Some(message) = update.message {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                handler.handle(message).await;
            });
        }
    }

    Ok(())
}
