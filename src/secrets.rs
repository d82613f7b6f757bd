//! API keys kept in the OS keychain, keyed by profile name.
use std::{cell::RefCell, collections::HashMap};

use keyring::Entry;
use tracing::debug;

use crate::lib::errors::SecretError;

/// Service name used in OS keychain entries.
pub const SERVICE_NAME: &str = "codezure";
/// Service name of entries written by earlier `codzure` releases; read and removed, never written.
pub const LEGACY_SERVICE_NAME: &str = "codzure";

/// Abstraction over secret storage so callers can be exercised without a keychain.
pub trait SecretStore {
    fn save(&self, profile: &str, secret: &str) -> Result<(), SecretError>;
    fn get(&self, profile: &str) -> Result<String, SecretError>;
    fn delete(&self, profile: &str) -> Result<(), SecretError>;
}

/// Store backed by the platform keychain.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringSecretStore;

impl KeyringSecretStore {
    fn entry(service: &str, profile: &str) -> Result<Entry, SecretError> {
        if profile.is_empty() {
            return Err(SecretError::EmptyProfile);
        }
        Entry::new(service, profile).map_err(SecretError::Store)
    }
}

impl SecretStore for KeyringSecretStore {
    fn save(&self, profile: &str, secret: &str) -> Result<(), SecretError> {
        if secret.is_empty() {
            return Err(SecretError::EmptySecret);
        }
        Self::entry(SERVICE_NAME, profile)?
            .set_password(secret)
            .map_err(SecretError::Store)?;
        debug!(target: "codezure::secrets", profile, "Stored API key in keychain");
        Ok(())
    }

    fn get(&self, profile: &str) -> Result<String, SecretError> {
        with_legacy_fallback(profile, |service| {
            Self::entry(service, profile)?
                .get_password()
                .map_err(|err| map_missing(profile, err))
        })
    }

    fn delete(&self, profile: &str) -> Result<(), SecretError> {
        with_legacy_fallback(profile, |service| {
            Self::entry(service, profile)?
                .delete_credential()
                .map_err(|err| map_missing(profile, err))
        })?;
        debug!(target: "codezure::secrets", profile, "Removed API key from keychain");
        Ok(())
    }
}

/// Run `op` against the current service, then the legacy one if the entry is missing.
fn with_legacy_fallback<T>(
    profile: &str,
    op: impl Fn(&str) -> Result<T, SecretError>,
) -> Result<T, SecretError> {
    match op(SERVICE_NAME) {
        Err(SecretError::NotFound(_)) => {
            let value = op(LEGACY_SERVICE_NAME)?;
            debug!(
                target: "codezure::secrets",
                profile,
                service = LEGACY_SERVICE_NAME,
                "Using keychain entry from legacy service"
            );
            Ok(value)
        }
        other => other,
    }
}

fn map_missing(profile: &str, err: keyring::Error) -> SecretError {
    match err {
        keyring::Error::NoEntry => SecretError::NotFound(profile.to_string()),
        other => SecretError::Store(other),
    }
}

/// In-process store used when no keychain should be touched.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn with_entry(profile: &str, secret: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .insert(profile.to_string(), secret.to_string());
        store
    }
}

impl SecretStore for MemorySecretStore {
    fn save(&self, profile: &str, secret: &str) -> Result<(), SecretError> {
        if profile.is_empty() {
            return Err(SecretError::EmptyProfile);
        }
        if secret.is_empty() {
            return Err(SecretError::EmptySecret);
        }
        self.entries
            .borrow_mut()
            .insert(profile.to_string(), secret.to_string());
        Ok(())
    }

    fn get(&self, profile: &str) -> Result<String, SecretError> {
        if profile.is_empty() {
            return Err(SecretError::EmptyProfile);
        }
        self.entries
            .borrow()
            .get(profile)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(profile.to_string()))
    }

    fn delete(&self, profile: &str) -> Result<(), SecretError> {
        if profile.is_empty() {
            return Err(SecretError::EmptyProfile);
        }
        self.entries
            .borrow_mut()
            .remove(profile)
            .map(|_| ())
            .ok_or_else(|| SecretError::NotFound(profile.to_string()))
    }
}

/// Copy a stored key to another profile name. Returns false if `from` has none.
pub fn copy_secret(store: &dyn SecretStore, from: &str, to: &str) -> Result<bool, SecretError> {
    let secret = match store.get(from) {
        Ok(secret) => secret,
        Err(SecretError::NotFound(_)) => return Ok(false),
        Err(other) => return Err(other),
    };
    store.save(to, &secret)?;
    Ok(true)
}

/// Move a stored key from one profile name to another.
///
/// A missing source entry is not an error; there is simply nothing to move.
pub fn move_secret(store: &dyn SecretStore, from: &str, to: &str) -> Result<bool, SecretError> {
    if !copy_secret(store, from, to)? {
        return Ok(false);
    }
    store.delete(from)?;
    Ok(true)
}

/// Remove a profile's key, treating an absent entry as already removed.
pub fn forget_secret(store: &dyn SecretStore, profile: &str) -> Result<bool, SecretError> {
    match store.delete(profile) {
        Ok(()) => Ok(true),
        Err(SecretError::NotFound(_)) => Ok(false),
        Err(other) => Err(other),
    }
}
