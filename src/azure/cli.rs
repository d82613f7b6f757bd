use std::{path::PathBuf, process::Command};

use tracing::debug;

use super::{
    parse_deployments, parse_openai_resources, parse_subscriptions, Credentials, Deployment,
    OpenAiResource, ResourceDiscovery, Subscription,
};
use crate::lib::errors::AzureError;

const AZ_BINARY: &str = "az";
const AZ_INSTALL_HINT: &str = "Install from https://aka.ms/azcli and run 'az login'.";

/// Discovery that shells out to the Azure CLI.
#[derive(Debug, Clone, Default)]
pub struct AzureCli;

impl AzureCli {
    fn locate() -> Result<PathBuf, AzureError> {
        which::which(AZ_BINARY).map_err(|_| AzureError::ExternalToolMissing {
            tool: "Azure CLI (az)",
            hint: AZ_INSTALL_HINT,
        })
    }

    /// Run `az <args>` and return stdout, failing on a non-zero exit.
    fn run(args: &[&str]) -> Result<(String, Vec<u8>), AzureError> {
        let program = Self::locate()?;
        let command = format!("{AZ_BINARY} {}", args.join(" "));
        debug!(target: "codezure::azure", command = %command, "Running Azure CLI");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| AzureError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(AzureError::CommandFailed {
                command,
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok((command, output.stdout))
    }

    fn run_text(args: &[&str]) -> Result<String, AzureError> {
        let (_, stdout) = Self::run(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    fn select_subscription(subscription: &str) -> Result<(), AzureError> {
        Self::run(&["account", "set", "--subscription", subscription]).map(|_| ())
    }
}

impl ResourceDiscovery for AzureCli {
    fn list_subscriptions(&self) -> Result<Vec<Subscription>, AzureError> {
        let (command, stdout) = Self::run(&["account", "list", "-o", "json"])?;
        parse_subscriptions(&command, &stdout)
    }

    fn list_openai_resources(
        &self,
        subscription: &str,
    ) -> Result<Vec<OpenAiResource>, AzureError> {
        Self::select_subscription(subscription)?;
        let (command, stdout) = Self::run(&[
            "cognitiveservices",
            "account",
            "list",
            "--subscription",
            subscription,
            "-o",
            "json",
        ])?;
        parse_openai_resources(&command, &stdout)
    }

    fn list_deployments(
        &self,
        subscription: &str,
        resource: &str,
        group: &str,
    ) -> Result<Vec<Deployment>, AzureError> {
        Self::select_subscription(subscription)?;
        let (command, stdout) = Self::run(&[
            "cognitiveservices",
            "account",
            "deployment",
            "list",
            "--name",
            resource,
            "--resource-group",
            group,
            "--subscription",
            subscription,
            "-o",
            "json",
        ])?;
        parse_deployments(&command, &stdout)
    }

    fn endpoint(
        &self,
        subscription: &str,
        resource: &str,
        group: &str,
    ) -> Result<String, AzureError> {
        Self::select_subscription(subscription)?;
        Self::run_text(&[
            "cognitiveservices",
            "account",
            "show",
            "--name",
            resource,
            "--resource-group",
            group,
            "--query",
            "properties.endpoint",
            "-o",
            "tsv",
        ])
    }

    fn fetch_key_and_endpoint(
        &self,
        subscription: &str,
        resource: &str,
        group: &str,
    ) -> Result<Credentials, AzureError> {
        Self::select_subscription(subscription)?;
        let api_key = Self::run_text(&[
            "cognitiveservices",
            "account",
            "keys",
            "list",
            "--name",
            resource,
            "--resource-group",
            group,
            "--query",
            "key1",
            "-o",
            "tsv",
        ])?;
        let endpoint = self.endpoint(subscription, resource, group)?;
        Ok(Credentials { api_key, endpoint })
    }
}
