use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::url::DEFAULT_BASE_URL;

/// Environment variable that overrides [`Config::base_url`].
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model used when `chat` is run without `--model`
    pub default_model: Option<String>,
    /// API base URL, e.g. "https://api.openai.com/v1"
    pub base_url: Option<String>,
    /// Give up on a request after this many seconds; unset waits indefinitely
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Base URL to use: `env_override` (normally `OPENAI_BASE_URL`), then the
    /// config file, then the OpenAI default. Blank values are ignored.
    pub fn effective_base_url(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                self.base_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
