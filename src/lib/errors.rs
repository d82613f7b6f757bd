use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;
use zip::result::ZipError;

use crate::profiles::AuthMode;

/// Errors raised by the profile store and configuration documents.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No active profile has been selected yet.
    #[error("no current profile configured; run 'codezure manage config'")]
    NoCurrentProfile,
    /// The named profile document is missing or unreadable.
    #[error("profile `{name}` not found at {path}: {detail}")]
    NotFound {
        name: String,
        path: PathBuf,
        detail: String,
    },
    /// The `auth` discriminator is not one of the recognized modes.
    #[error("unknown auth mode: {0}")]
    UnknownAuthMode(String),
    /// Required fields for the auth mode are blank.
    #[error("{fields} must be set for auth mode `{auth}`; run 'codezure manage config'")]
    Incomplete {
        auth: AuthMode,
        fields: &'static str,
    },
    #[error("invalid profile name `{name}`: {reason}")]
    InvalidProfileName { name: String, reason: &'static str },
    #[error("cannot delete current profile `{0}`; switch to another profile first")]
    DeleteCurrent(String),
    #[error("profile `{0}` already exists")]
    AlreadyExists(String),
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),
    #[error("I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize profile {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ProfileError {
    /// Helper to wrap an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of an interactive prompt that did not produce a value.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("selection cancelled")]
    SelectionCancelled,
    #[error("input cancelled")]
    InputCancelled,
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),
}

impl PromptError {
    /// Returns true when the user aborted the prompt.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::SelectionCancelled | Self::InputCancelled)
    }
}

/// Failures while talking to the Azure CLI.
#[derive(Debug, Error)]
pub enum AzureError {
    #[error("{tool} not found on PATH. {hint}")]
    ExternalToolMissing {
        tool: &'static str,
        hint: &'static str,
    },
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited abnormally (exit={exit_code:?}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("Failed to parse output of `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("resource `{0}` is not in the listed resources")]
    ResourceNotFound(String),
}

/// Failures from the OS keychain wrapper.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("profile name required for keyring entry")]
    EmptyProfile,
    #[error("API key cannot be empty")]
    EmptySecret,
    #[error("no API key stored in keychain for profile `{0}`")]
    NotFound(String),
    #[error("keychain access failed: {0}")]
    Store(#[source] keyring::Error),
}

/// Failures while resolving credentials or spawning the downstream CLI.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{tool} CLI not found on PATH; install it and ensure it's on your PATH")]
    ExternalToolMissing { tool: String },
    #[error("endpoint not set in profile `{0}`; run 'codezure manage config' to configure")]
    MissingEndpoint(String),
    #[error("failed to retrieve API key from keychain for profile `{profile}`: {source}")]
    Secret {
        profile: String,
        #[source]
        source: SecretError,
    },
    #[error(transparent)]
    Discovery(#[from] AzureError),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures during update checks and self-replacement.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("cannot update development build")]
    DevelopmentBuild,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API returned status {0}")]
    Status(u16),
    #[error("no binary found for platform {os}/{arch}")]
    NoAsset { os: String, arch: String },
    #[error("checksum mismatch for {asset}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },
    #[error("binary `{0}` not found in archive")]
    BinaryNotInArchive(String),
    #[error("Failed to read zip archive: {0}")]
    Archive(#[from] ZipError),
    #[error("I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UpdateError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while loading or validating `settings.toml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to build (read) the settings sources.
    #[error("Failed to read settings file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize settings into a struct.
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Settings file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl SettingsError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_variants_are_recoverable() {
        assert!(PromptError::SelectionCancelled.is_cancelled());
        assert!(PromptError::InputCancelled.is_cancelled());
        let terminal = PromptError::Terminal(io::Error::new(io::ErrorKind::Other, "tty gone"));
        assert!(!terminal.is_cancelled());
    }

    #[test]
    fn incomplete_message_names_fields_and_mode() {
        let error = ProfileError::Incomplete {
            auth: AuthMode::ApiKey,
            fields: "endpoint/deployment",
        };
        let message = error.to_string();
        assert!(message.contains("endpoint/deployment"), "{message}");
        assert!(message.contains("api-key"), "{message}");
    }
}
