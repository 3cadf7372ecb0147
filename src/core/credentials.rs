//! Storage for the default API key.

use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;
use tracing::debug;

use crate::core::keyring::KeyringAccessError;

pub const KEYRING_SERVICE: &str = "quickgpt";

/// Logical name the default API key is stored under.
pub const DEFAULT_API_KEY_ENTRY: &str = "quickgpt-defaults-defaultApiKey";

/// A place to keep secrets between runs.
pub trait CredentialStore {
    /// Store `value` under `key`, replacing any previous value.
    fn store(&self, key: &str, value: &str) -> Result<(), KeyringAccessError>;

    fn retrieve(&self, key: &str) -> Result<Option<String>, KeyringAccessError>;

    /// Remove `key`. Returns `false` when there was nothing to remove.
    fn delete(&self, key: &str) -> Result<bool, KeyringAccessError>;
}

/// [`CredentialStore`] backed by the platform keyring.
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, KeyringAccessError> {
        Entry::new(&self.service, key).map_err(KeyringAccessError::from)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn store(&self, key: &str, value: &str) -> Result<(), KeyringAccessError> {
        debug!(service = %self.service, key, "keyring store");
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<String>, KeyringAccessError> {
        match self.entry(key)?.get_password() {
            Ok(value) => {
                debug!(service = %self.service, key, "keyring lookup result=present");
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, key, "keyring lookup result=missing");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, KeyringAccessError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local [`CredentialStore`], for tests and for callers that supply
/// their own persistence.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn store(&self, key: &str, value: &str) -> Result<(), KeyringAccessError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<String>, KeyringAccessError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool, KeyringAccessError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.remove(key).is_some())
    }
}
