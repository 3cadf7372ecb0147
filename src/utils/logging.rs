use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "QUICKGPT_LOG";

/// Install the stderr `tracing` subscriber.
///
/// `QUICKGPT_LOG` wins when set; otherwise `verbose` selects `debug` over the
/// default `warn`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "quickgpt=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber may already be installed (tests, embedding callers).
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

/// Appends each exchange (prompt and reply) to a transcript file.
pub struct TranscriptLog {
    file_path: PathBuf,
}

impl TranscriptLog {
    /// Open `path` for appending, failing early if it is not writable.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let file_path = path.into();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;
        Ok(Self { file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn record(&self, model: &str, prompt: &str, reply: &str) -> Result<(), std::io::Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "## {model}")?;
        writeln!(writer)?;
        for line in prompt.lines() {
            writeln!(writer, "> {line}")?;
        }
        writeln!(writer)?;
        for line in reply.lines() {
            writeln!(writer, "{line}")?;
        }
        // Blank line between exchanges
        writeln!(writer)?;

        writer.flush()
    }
}
