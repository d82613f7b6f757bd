use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::lib::errors::ProfileError;

/// How credentials for a profile are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Key and endpoint are fetched through the Azure CLI.
    #[default]
    AzureCli,
    /// Key lives in the OS keychain; endpoint is stored in the profile.
    ApiKey,
}

impl AuthMode {
    pub const ALL: [AuthMode; 2] = [AuthMode::AzureCli, AuthMode::ApiKey];

    pub const fn as_str(&self) -> &'static str {
        match self {
            AuthMode::AzureCli => "azure-cli",
            AuthMode::ApiKey => "api-key",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = ProfileError;

    /// Blank input maps to the default mode for older documents.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "azure-cli" => Ok(AuthMode::AzureCli),
            "api-key" => Ok(AuthMode::ApiKey),
            other => Err(ProfileError::UnknownAuthMode(other.to_string())),
        }
    }
}

/// Reasoning-effort levels offered by the wizard.
pub const THINKING_LEVELS: [&str; 3] = ["low", "medium", "high"];

/// One profile's configuration document (`profiles/<name>.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub subscription: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    /// low|medium|high for reasoning models.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thinking: String,
    /// `azure-cli` (default when empty) or `api-key`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth: String,
}

/// Keys accepted by `manage config set`.
pub const SETTABLE_KEYS: [&str; 8] = [
    "subscription",
    "group",
    "resource",
    "location",
    "endpoint",
    "deployment",
    "thinking",
    "auth",
];

impl ProfileConfig {
    /// Parse the `auth` field, treating blank as `azure-cli`.
    pub fn auth_mode(&self) -> Result<AuthMode, ProfileError> {
        self.auth.parse()
    }

    /// Check that the fields required by the auth mode are present.
    pub fn validate(&self) -> Result<AuthMode, ProfileError> {
        let auth = self.auth_mode()?;
        let complete = match auth {
            AuthMode::AzureCli => [&self.subscription, &self.group, &self.resource]
                .iter()
                .all(|value| !value.trim().is_empty()),
            AuthMode::ApiKey => [&self.endpoint, &self.deployment]
                .iter()
                .all(|value| !value.trim().is_empty()),
        };
        if complete {
            return Ok(auth);
        }

        let fields = match auth {
            AuthMode::AzureCli => "subscription/group/resource",
            AuthMode::ApiKey => "endpoint/deployment",
        };
        Err(ProfileError::Incomplete { auth, fields })
    }

    /// Assign a single field by its JSON key.
    pub fn set_field(&mut self, key: &str, value: String) -> Result<(), ProfileError> {
        match key.to_ascii_lowercase().as_str() {
            "subscription" => self.subscription = value,
            "group" => self.group = value,
            "resource" => self.resource = value,
            "location" => self.location = value,
            "endpoint" => self.endpoint = value,
            "deployment" => self.deployment = value,
            "thinking" => self.thinking = value,
            "auth" => {
                let mode: AuthMode = value.parse()?;
                self.auth = mode.as_str().to_string();
            }
            other => return Err(ProfileError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}
