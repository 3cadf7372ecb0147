//! Works out which credential and model an invocation uses.

use std::error::Error;
use std::fmt;

use crate::core::config::ConfigError;
use crate::core::credentials::{CredentialStore, DEFAULT_API_KEY_ENTRY};
use crate::core::error::ClientError;
use crate::core::keyring::KeyringAccessError;
use crate::core::preferences::PreferenceStore;

/// Environment variable consulted when neither `--key` nor the keyring
/// provides a credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const QUICK_FIXES: &[&str] = &[
    "quickgpt set-api-key sk-...      # Store a default key in the keyring",
    "quickgpt chat -k sk-... \"...\"    # Pass a key for one request",
    "export OPENAI_API_KEY=sk-...     # Use environment variable",
];

#[derive(Debug)]
pub enum ResolveError {
    /// Nothing to use; carries the same message the client would give.
    Missing(ClientError),
    /// The keyring could not be read.
    Keyring(KeyringAccessError),
    /// The preference file could not be read.
    Config(ConfigError),
}

impl ResolveError {
    pub fn quick_fixes(&self) -> &'static [&'static str] {
        match self {
            ResolveError::Missing(ClientError::MissingCredential) | ResolveError::Keyring(_) => {
                QUICK_FIXES
            }
            _ => &[],
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Missing(err) => write!(f, "{err}"),
            ResolveError::Keyring(err) => write!(f, "Could not read the API key from the keyring: {err}"),
            ResolveError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResolveError::Missing(err) => Some(err),
            ResolveError::Keyring(err) => Some(err),
            ResolveError::Config(err) => Some(err),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Pick the credential: `explicit`, then the stored default, then `env`.
///
/// A recoverable keyring outage falls through to `env`; if that is also
/// empty, the keyring error is reported.
pub fn resolve_credential<C: CredentialStore + ?Sized>(
    explicit: Option<String>,
    store: &C,
    env: Option<String>,
) -> Result<String, ResolveError> {
    if let Some(key) = non_blank(explicit) {
        return Ok(key);
    }

    let keyring_error = match store.retrieve(DEFAULT_API_KEY_ENTRY) {
        Ok(Some(key)) if !key.trim().is_empty() => return Ok(key),
        Ok(_) => None,
        Err(err) if err.is_recoverable() => Some(err),
        Err(err) => return Err(ResolveError::Keyring(err)),
    };

    match (non_blank(env), keyring_error) {
        (Some(key), _) => Ok(key),
        (None, Some(err)) => Err(ResolveError::Keyring(err)),
        (None, None) => Err(ResolveError::Missing(ClientError::MissingCredential)),
    }
}

/// Pick the model: `explicit`, then the stored default.
pub fn resolve_model<P: PreferenceStore + ?Sized>(
    explicit: Option<String>,
    prefs: &P,
) -> Result<String, ResolveError> {
    if let Some(model) = non_blank(explicit) {
        return Ok(model);
    }
    non_blank(prefs.get_default().map_err(ResolveError::Config)?)
        .ok_or(ResolveError::Missing(ClientError::MissingModel))
}
