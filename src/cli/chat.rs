//! The `chat` command: one prompt in, one reply out.

use std::error::Error;
use std::io::{self, Write};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::ChatArgs;
use crate::core::client::{ChatClient, Reply};
use crate::core::config::data::BASE_URL_ENV;
use crate::core::config::Config;
use crate::core::credentials::KeyringCredentialStore;
use crate::core::error::ClientError;
use crate::core::params::ChatConfig;
use crate::core::preferences::ConfigPreferenceStore;
use crate::core::session::{resolve_credential, resolve_model, API_KEY_ENV};
use crate::core::transport::HttpTransport;
use crate::utils::logging::TranscriptLog;

/// What was printed, and whether the user cut it short.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub text: String,
    pub cancelled: bool,
}

pub async fn run_chat(args: ChatArgs, log_file: Option<String>) -> Result<(), Box<dyn Error>> {
    let prompt = args.input.clone().unwrap_or_default();
    if prompt.is_empty() {
        return Err(Box::new(ClientError::EmptyInput));
    }

    let config = Config::load()?;
    let credential = resolve_credential(
        args.key.clone(),
        &KeyringCredentialStore::default(),
        std::env::var(API_KEY_ENV).ok(),
    )?;
    let model = resolve_model(
        args.model.clone(),
        &ConfigPreferenceStore::from_default_location()?,
    )?;
    let transcript = log_file.map(TranscriptLog::new).transpose()?;

    let base_url = config.effective_base_url(std::env::var(BASE_URL_ENV).ok());
    let client = ChatClient::new(HttpTransport::new(&base_url, config.request_timeout())?);
    let chat_config = build_config(&args, prompt.clone(), model.clone(), credential);

    let cancel_token = CancellationToken::new();
    let ctrl_c = {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let reply = tokio::select! {
        reply = client.send(chat_config) => reply,
        _ = cancel_token.cancelled() => {
            eprintln!("\n⚠️  Cancelled");
            return Ok(());
        }
    };

    let mut stdout = io::stdout();
    let rendered = render_reply(reply?, &cancel_token, &mut stdout).await;
    ctrl_c.abort();
    let rendered = rendered?;

    if rendered.cancelled {
        eprintln!("⚠️  Cancelled");
    }
    if let Some(log) = transcript {
        log.record(&model, &prompt, &rendered.text)?;
        debug!(path = %log.path().display(), "transcript updated");
    }
    Ok(())
}

pub(crate) fn build_config(
    args: &ChatArgs,
    prompt: String,
    model: String,
    credential: String,
) -> ChatConfig {
    ChatConfig {
        prompt,
        model,
        temperature: args.temperature,
        max_completion_tokens: args.max_completion_tokens,
        top_p: args.top_p,
        frequency_penalty: args.frequency_penalty,
        presence_penalty: args.presence_penalty,
        stream: args.stream,
        credential,
    }
}

/// Print a reply to `out`. Streamed fragments are flushed as they arrive;
/// once `cancel` fires nothing more is written and the stream is dropped.
pub(crate) async fn render_reply<W: Write>(
    reply: Reply,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<Rendered, Box<dyn Error>> {
    let mut stream = match reply {
        Reply::Complete(text) => {
            writeln!(out, "\n{text}\n")?;
            return Ok(Rendered {
                text,
                cancelled: false,
            });
        }
        Reply::Stream(stream) => stream,
    };

    let mut text = String::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                writeln!(out)?;
                return Ok(Rendered { text, cancelled: true });
            }
            next = stream.next() => match next {
                Some(Ok(fragment)) => {
                    write!(out, "{fragment}")?;
                    out.flush()?;
                    text.push_str(&fragment);
                }
                Some(Err(err)) => {
                    writeln!(out)?;
                    return Err(Box::new(err));
                }
                None => break,
            }
        }
    }

    writeln!(out)?;
    Ok(Rendered {
        text,
        cancelled: false,
    })
}
