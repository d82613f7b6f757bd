//! Guided setup that builds a profile from prompts, Azure discovery, and the keychain.
use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{Prompter, SelectOption};
use crate::{
    azure::{OpenAiResource, ResourceDiscovery},
    lib::errors::{AzureError, ProfileError, PromptError, SecretError},
    profiles::{AuthMode, ProfileConfig, ProfileStore, DEFAULT_PROFILE, THINKING_LEVELS},
    secrets::SecretStore,
};

/// What the wizard wrote, rendered for the user by `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSummary {
    pub profile: String,
    pub auth: AuthMode,
    pub config: ProfileConfig,
    /// True when a new API key was written to the keychain.
    pub key_stored: bool,
}

impl fmt::Display for WizardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key_stored {
            writeln!(
                f,
                "✓ API key stored in OS keychain for profile '{}'",
                self.profile
            )?;
        }
        writeln!(
            f,
            "✓ Configuration saved successfully to profile '{}'!",
            self.profile
        )?;
        writeln!(f)?;
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Auth Mode:    {}", self.auth)?;
        if self.auth == AuthMode::AzureCli {
            writeln!(f, "  Subscription: {}", self.config.subscription)?;
            writeln!(f, "  ResourceGrp:  {}", self.config.group)?;
            writeln!(f, "  Resource:     {}", self.config.resource)?;
            writeln!(f, "  Region:       {}", self.config.location)?;
        }
        writeln!(f, "  Endpoint:     {}", self.config.endpoint)?;
        write!(f, "  Deployment:   {}", self.config.deployment)?;
        if !self.config.thinking.is_empty() {
            write!(f, "\n  Thinking:     {}", self.config.thinking)?;
        }
        Ok(())
    }
}

pub struct ConfigWizard<'a> {
    store: &'a ProfileStore,
    prompter: &'a mut dyn Prompter,
    discovery: &'a dyn ResourceDiscovery,
    secrets: &'a dyn SecretStore,
    app_version: &'a str,
}

impl<'a> ConfigWizard<'a> {
    pub fn new(
        store: &'a ProfileStore,
        prompter: &'a mut dyn Prompter,
        discovery: &'a dyn ResourceDiscovery,
        secrets: &'a dyn SecretStore,
        app_version: &'a str,
    ) -> Self {
        Self {
            store,
            prompter,
            discovery,
            secrets,
            app_version,
        }
    }

    /// Prompt for every field, save into the current profile, and summarize.
    pub fn run(mut self) -> Result<WizardSummary> {
        let (prior, has_prior) = match self.store.load_current(self.app_version) {
            Ok(config) => (config, true),
            Err(ProfileError::NoCurrentProfile) => (ProfileConfig::default(), false),
            Err(err @ ProfileError::NotFound { .. }) => {
                warn!(target: "codezure::wizard", error = %err, "Current profile unreadable; starting fresh");
                (ProfileConfig::default(), false)
            }
            Err(other) => return Err(other).context("failed to load current profile"),
        };

        let auth = self.select_auth(&prior, has_prior)?;
        let (config, new_key) = match auth {
            AuthMode::AzureCli => (self.azure_cli_flow(&prior)?, None),
            AuthMode::ApiKey => self.api_key_flow(&prior)?,
        };

        let profile = self
            .store
            .save_current(&config)
            .context("failed to save config")?;
        let key_stored = match new_key {
            Some(key) => {
                self.secrets
                    .save(&profile, &key)
                    .context("failed to store API key in keychain")?;
                true
            }
            None => false,
        };
        debug!(target: "codezure::wizard", profile = %profile, auth = %auth, "Wizard saved profile");

        Ok(WizardSummary {
            profile,
            auth,
            config,
            key_stored,
        })
    }

    fn select_auth(&mut self, prior: &ProfileConfig, has_prior: bool) -> Result<AuthMode> {
        let options = [
            SelectOption::new(AuthMode::AzureCli.as_str(), "Azure CLI (recommended)"),
            SelectOption::new(AuthMode::ApiKey.as_str(), "Keychain API Key (manual)"),
        ];
        let prior_mode = prior.auth_mode().unwrap_or_default();
        let fallback = if has_prior { prior_mode.as_str() } else { "" };
        let chosen = keep_prior(
            self.prompter.select(
                "Select Authentication Method",
                "Choose auth mode...",
                &options,
                prior_mode.as_str(),
            ),
            fallback,
        )
        .context("authentication selection failed")?;
        Ok(chosen.parse()?)
    }

    fn azure_cli_flow(&mut self, prior: &ProfileConfig) -> Result<ProfileConfig> {
        let subscriptions = self
            .discovery
            .list_subscriptions()
            .context("failed to list subscriptions")?;
        let options: Vec<_> = subscriptions
            .iter()
            .map(|sub| SelectOption::new(&sub.id, format!("{} ({})", sub.name, sub.id)))
            .collect();
        let subscription = keep_prior(
            self.prompter.select(
                "Select Subscription",
                "Type to filter subscriptions...",
                &options,
                &prior.subscription,
            ),
            &prior.subscription,
        )
        .context("subscription selection failed")?;

        let resources = self
            .discovery
            .list_openai_resources(&subscription)
            .context("failed to list resources")?;
        let options: Vec<_> = resources
            .iter()
            .map(|res| {
                SelectOption::new(
                    &res.name,
                    format!(
                        "{} — rg={}, region={}",
                        res.name, res.resource_group, res.location
                    ),
                )
            })
            .collect();
        let resource_name = keep_prior(
            self.prompter.select(
                "Select Azure OpenAI Resource",
                "Type to filter resources...",
                &options,
                &prior.resource,
            ),
            &prior.resource,
        )
        .context("resource selection failed")?;
        let resource = find_resource(&resources, &resource_name, prior)?;

        let endpoint = self
            .discovery
            .endpoint(&subscription, &resource.name, &resource.resource_group)
            .context("failed to get endpoint")?;

        let deployments = self
            .discovery
            .list_deployments(&subscription, &resource.name, &resource.resource_group)
            .context("failed to list deployments")?;
        let options: Vec<_> = deployments
            .iter()
            .map(|dep| SelectOption::new(&dep.name, format!("{} — model={}", dep.name, dep.model_name)))
            .collect();
        let deployment = keep_prior(
            self.prompter.select(
                "Select Model Deployment",
                "Type to filter models...",
                &options,
                &prior.deployment,
            ),
            &prior.deployment,
        )
        .context("deployment selection failed")?;

        let thinking = self.select_thinking(prior)?;

        Ok(ProfileConfig {
            subscription,
            group: resource.resource_group,
            resource: resource.name,
            location: resource.location,
            endpoint,
            deployment,
            thinking,
            auth: AuthMode::AzureCli.as_str().to_string(),
        })
    }

    /// Returns the document and, when the user typed one, a new API key.
    fn api_key_flow(&mut self, prior: &ProfileConfig) -> Result<(ProfileConfig, Option<String>)> {
        let endpoint = keep_prior(
            self.prompter.input(
                "Enter Azure OpenAI Endpoint",
                "https://<resource>.openai.azure.com",
                &prior.endpoint,
            ),
            &prior.endpoint,
        )
        .context("endpoint input failed")?;
        let deployment = keep_prior(
            self.prompter
                .input("Enter Model Deployment Name", "<deployment>", &prior.deployment),
            &prior.deployment,
        )
        .context("deployment input failed")?;

        let target = self
            .store
            .current_name()
            .unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        let new_key = match self
            .prompter
            .password("Enter API Key (stored in OS keychain)", "paste API key...")
        {
            Ok(key) if !key.is_empty() => Some(key),
            Ok(_) if self.has_stored_key(&target)? => None,
            Ok(_) => return Err(SecretError::EmptySecret).context("API key input failed"),
            Err(err) if err.is_cancelled() && self.has_stored_key(&target)? => None,
            Err(err) => return Err(err).context("API key input failed"),
        };

        let thinking = self.select_thinking(prior)?;

        let config = ProfileConfig {
            endpoint,
            deployment,
            thinking,
            auth: AuthMode::ApiKey.as_str().to_string(),
            ..ProfileConfig::default()
        };
        Ok((config, new_key))
    }

    fn has_stored_key(&self, profile: &str) -> Result<bool> {
        match self.secrets.get(profile) {
            Ok(_) => Ok(true),
            Err(SecretError::NotFound(_)) => Ok(false),
            Err(other) => Err(other).context("failed to read keychain"),
        }
    }

    /// Cancelling keeps the prior level, which may be empty.
    fn select_thinking(&mut self, prior: &ProfileConfig) -> Result<String> {
        let options: Vec<_> = THINKING_LEVELS
            .iter()
            .map(|level| SelectOption::new(*level, thinking_label(level)))
            .collect();
        match self.prompter.select(
            "Select Thinking Level",
            "Type to filter levels...",
            &options,
            &prior.thinking,
        ) {
            Ok(level) => Ok(level),
            Err(err) if err.is_cancelled() => Ok(prior.thinking.clone()),
            Err(err) => Err(err).context("thinking level selection failed"),
        }
    }
}

fn thinking_label(level: &str) -> String {
    match level {
        "low" => "low — fastest, cheapest".to_string(),
        "medium" => "medium — balanced".to_string(),
        "high" => "high — deepest reasoning".to_string(),
        other => other.to_string(),
    }
}

/// On cancellation fall back to `prior` when there is one.
fn keep_prior(result: Result<String, PromptError>, prior: &str) -> Result<String, PromptError> {
    match result {
        Err(err) if err.is_cancelled() && !prior.trim().is_empty() => Ok(prior.to_string()),
        other => other,
    }
}

/// Look the chosen resource up in the listing; the prior profile's own
/// resource is accepted even if it was not listed.
fn find_resource(
    resources: &[OpenAiResource],
    name: &str,
    prior: &ProfileConfig,
) -> Result<OpenAiResource, AzureError> {
    if let Some(found) = resources.iter().find(|res| res.name == name) {
        return Ok(found.clone());
    }
    if name == prior.resource && !prior.group.is_empty() {
        return Ok(OpenAiResource {
            name: name.to_string(),
            resource_group: prior.group.clone(),
            location: prior.location.clone(),
        });
    }
    Err(AzureError::ResourceNotFound(name.to_string()))
}
