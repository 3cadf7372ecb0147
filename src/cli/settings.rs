//! `set-model`, `set-api-key` and `delete-api-key`.

use std::error::Error;

use crate::core::credentials::{CredentialStore, KeyringCredentialStore, DEFAULT_API_KEY_ENTRY};
use crate::core::preferences::{ConfigPreferenceStore, PreferenceStore};

pub fn set_model(model: &str) -> Result<(), Box<dyn Error>> {
    let prefs = ConfigPreferenceStore::from_default_location()?;
    println!("{}", store_default_model(&prefs, model)?);
    Ok(())
}

pub fn set_api_key(key: &str) -> Result<(), Box<dyn Error>> {
    let store = KeyringCredentialStore::default();
    for line in store_default_key(&store, key)? {
        println!("{line}");
    }
    Ok(())
}

pub fn delete_api_key() -> Result<(), Box<dyn Error>> {
    let store = KeyringCredentialStore::default();
    println!("{}", remove_default_key(&store)?);
    Ok(())
}

pub(crate) fn store_default_model<P: PreferenceStore + ?Sized>(
    prefs: &P,
    model: &str,
) -> Result<String, Box<dyn Error>> {
    let model = model.trim();
    if model.is_empty() {
        return Err("Model name cannot be empty.".into());
    }

    prefs.set_default(model)?;
    match prefs.get_default()? {
        Some(value) => Ok(format!("✅ The model {value} is now default for requests.")),
        None => Err("The default model could not be read back after saving.".into()),
    }
}

pub(crate) fn store_default_key<C: CredentialStore + ?Sized>(
    store: &C,
    key: &str,
) -> Result<Vec<String>, Box<dyn Error>> {
    let key = key.trim();
    if key.is_empty() {
        return Err("API key cannot be empty.".into());
    }

    let mut lines = Vec::new();
    if store.retrieve(DEFAULT_API_KEY_ENTRY).ok().flatten().is_some() {
        lines.push("Updating API key...".to_string());
    }

    store.store(DEFAULT_API_KEY_ENTRY, key).map_err(|err| {
        format!(
            "Something went wrong when storing your key to the keyring ({err}). \
Try making a chat request with your API key using the option -k, --key."
        )
    })?;

    match store.retrieve(DEFAULT_API_KEY_ENTRY)? {
        Some(value) => {
            lines.push(format!(
                "✅ The API key {} is now default for requests.",
                mask_key(&value)
            ));
            Ok(lines)
        }
        None => Err("The API key could not be read back after saving.".into()),
    }
}

pub(crate) fn remove_default_key<C: CredentialStore + ?Sized>(
    store: &C,
) -> Result<String, Box<dyn Error>> {
    match store.delete(DEFAULT_API_KEY_ENTRY) {
        Ok(true) => Ok("✅ Your API key was removed with success.".to_string()),
        Ok(false) => Ok("No default API key is stored.".to_string()),
        Err(err) => Err(format!(
            "Something went wrong when removing your key from the keyring ({err}). \
You can remove it manually via the \"{DEFAULT_API_KEY_ENTRY}\" identifier."
        )
        .into()),
    }
}

/// Show only the last four characters of a key.
pub(crate) fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}
