//! Azure resource and credential discovery.
use serde::Deserialize;
use serde_json::Value;

use crate::lib::errors::AzureError;

mod cli;

pub use cli::AzureCli;

/// Resource kinds that can serve OpenAI deployments.
const OPENAI_KINDS: [&str; 2] = ["OpenAI", "AIServices"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiResource {
    pub name: String,
    pub resource_group: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub name: String,
    pub model_name: String,
}

/// API key plus endpoint for one resource.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub endpoint: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Abstraction for Azure lookups so the wizard and launcher can run without `az`.
pub trait ResourceDiscovery {
    fn list_subscriptions(&self) -> Result<Vec<Subscription>, AzureError>;
    fn list_openai_resources(&self, subscription: &str)
        -> Result<Vec<OpenAiResource>, AzureError>;
    fn list_deployments(
        &self,
        subscription: &str,
        resource: &str,
        group: &str,
    ) -> Result<Vec<Deployment>, AzureError>;
    fn endpoint(&self, subscription: &str, resource: &str, group: &str)
        -> Result<String, AzureError>;
    fn fetch_key_and_endpoint(
        &self,
        subscription: &str,
        resource: &str,
        group: &str,
    ) -> Result<Credentials, AzureError>;
}

pub(crate) fn parse_subscriptions(command: &str, raw: &[u8]) -> Result<Vec<Subscription>, AzureError> {
    serde_json::from_slice(raw).map_err(|source| AzureError::Parse {
        command: command.to_string(),
        source,
    })
}

/// Keep OpenAI-capable accounts from `az cognitiveservices account list`.
pub(crate) fn parse_openai_resources(
    command: &str,
    raw: &[u8],
) -> Result<Vec<OpenAiResource>, AzureError> {
    let entries = parse_array(command, raw)?;
    Ok(entries
        .iter()
        .filter(|entry| {
            entry
                .get("kind")
                .and_then(Value::as_str)
                .is_some_and(|kind| OPENAI_KINDS.contains(&kind))
        })
        .map(|entry| OpenAiResource {
            name: string_at(entry, &["name"]),
            resource_group: string_at(entry, &["resourceGroup"]),
            location: string_at(entry, &["location"]),
        })
        .collect())
}

/// Read deployment names and `properties.model.name`.
pub(crate) fn parse_deployments(command: &str, raw: &[u8]) -> Result<Vec<Deployment>, AzureError> {
    let entries = parse_array(command, raw)?;
    Ok(entries
        .iter()
        .map(|entry| Deployment {
            name: string_at(entry, &["name"]),
            model_name: string_at(entry, &["properties", "model", "name"]),
        })
        .collect())
}

fn parse_array(command: &str, raw: &[u8]) -> Result<Vec<Value>, AzureError> {
    serde_json::from_slice(raw).map_err(|source| AzureError::Parse {
        command: command.to_string(),
        source,
    })
}

fn string_at(value: &Value, path: &[&str]) -> String {
    path.iter()
        .try_fold(value, |node, key| node.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
