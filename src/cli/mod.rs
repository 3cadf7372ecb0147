//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod settings;

use std::error::Error;
use std::process::ExitCode;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};

use crate::cli::chat::run_chat;
use crate::cli::settings::{delete_api_key, set_api_key, set_model};
use crate::core::error::ClientError;
use crate::core::params::{
    DEFAULT_FREQUENCY_PENALTY, DEFAULT_MAX_COMPLETION_TOKENS, DEFAULT_PRESENCE_PENALTY,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
use crate::core::session::ResolveError;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "quickgpt", version)]
#[command(about = "Send a prompt to an OpenAI-compatible chat API and print the reply")]
#[command(
    long_about = "quickgpt sends a single prompt to a chat completion API and prints the reply, \
either streamed token by token or as one block.\n\n\
Defaults:\n\
  Store a default model with 'quickgpt set-model <model>' and a default API key \
in the system keyring with 'quickgpt set-api-key <key>'.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    API key used when no --key is given and none is stored\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\
  QUICKGPT_LOG      tracing filter for diagnostics on stderr (e.g. quickgpt=debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub chat: ChatArgs,

    /// Print debug diagnostics to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Append the prompt and reply to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Makes a request with the given input. If no model is provided, the default is used (default)
    Chat(ChatArgs),
    /// Sets a default model for easier requests
    SetModel {
        /// Model to be set as default
        #[arg(default_value = "gpt-4o")]
        model: String,
    },
    /// Sets the default API key, stored in the system keyring
    SetApiKey {
        /// API key to be set as default
        key: String,
    },
    /// Deletes the default API key from the system keyring
    DeleteApiKey,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Your input for the model: a question, a request, a greeting or anything else in text form
    pub input: Option<String>,

    /// API key to use. Not needed if a default key was set
    #[arg(short = 'k', long)]
    pub key: Option<String>,

    /// Model to use, or none to use the default model
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Sampling temperature; lower is more deterministic. Between 0 and 1
    #[arg(short = 't', long, default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Maximum number of tokens to generate. Between 1 and 16383
    #[arg(long, default_value_t = DEFAULT_MAX_COMPLETION_TOKENS)]
    pub max_completion_tokens: u32,

    /// Probability mass of tokens considered at each step. Between 0 and 1
    #[arg(long, default_value_t = DEFAULT_TOP_P, allow_negative_numbers = true)]
    pub top_p: f64,

    /// Penalize tokens by how often they already appeared. Between 0 and 2
    #[arg(short = 'f', long, default_value_t = DEFAULT_FREQUENCY_PENALTY, allow_negative_numbers = true)]
    pub frequency_penalty: f64,

    /// Penalize tokens that already appeared at all. Between 0 and 2
    #[arg(short = 'p', long, default_value_t = DEFAULT_PRESENCE_PENALTY, allow_negative_numbers = true)]
    pub presence_penalty: f64,

    /// Whether to stream the response
    #[arg(short = 's', long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub stream: bool,
}

pub fn main() -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("❌ Failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(err.as_ref()),
    }
}

fn report_error(err: &(dyn Error + 'static)) -> ExitCode {
    eprintln!("❌ {err}");
    if let Some(client_err) = err.downcast_ref::<ClientError>() {
        return ExitCode::from(client_err.exit_code());
    }
    if let Some(resolve_err) = err.downcast_ref::<ResolveError>() {
        let fixes = resolve_err.quick_fixes();
        if !fixes.is_empty() {
            eprintln!();
            eprintln!("💡 Quick fixes:");
            for fix in fixes {
                eprintln!("  • {fix}");
            }
        }
    }
    ExitCode::FAILURE
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Some(Commands::Chat(chat)) => run_chat(chat, args.log).await,
        None => run_chat(args.chat, args.log).await,
        Some(Commands::SetModel { model }) => set_model(&model),
        Some(Commands::SetApiKey { key }) => set_api_key(&key),
        Some(Commands::DeleteApiKey) => delete_api_key(),
    }
}
