//! Resolve credentials for a profile and run Codex against the deployment.
use std::{fmt, path::PathBuf, process::Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::{
    azure::{Credentials, ResourceDiscovery},
    lib::{
        errors::LaunchError,
        telemetry::{emit_launch, LaunchTelemetry},
    },
    profiles::{AuthMode, ProfileConfig},
    secrets::SecretStore,
};

/// Environment variable the child reads the API key from.
pub const API_KEY_ENV: &str = "CODEZURE_API_KEY";
/// Provider id registered through `--config` overrides.
const PROVIDER_ID: &str = "codezure";
const PROVIDER_NAME: &str = "Codezure";

/// Fully resolved child invocation.
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub api_key: String,
    pub injected_overrides: usize,
}

impl fmt::Debug for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchPlan")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("api_key", &"<redacted>")
            .field("injected_overrides", &self.injected_overrides)
            .finish()
    }
}

pub struct Launcher<'a> {
    secrets: &'a dyn SecretStore,
    discovery: &'a dyn ResourceDiscovery,
    codex_binary: &'a str,
}

impl<'a> Launcher<'a> {
    pub fn new(
        secrets: &'a dyn SecretStore,
        discovery: &'a dyn ResourceDiscovery,
        codex_binary: &'a str,
    ) -> Self {
        Self {
            secrets,
            discovery,
            codex_binary,
        }
    }

    /// Resolve credentials, locate the binary, and build the argument list.
    pub fn plan(
        &self,
        profile: &str,
        config: &ProfileConfig,
        auth: AuthMode,
        passthrough: &[String],
    ) -> Result<LaunchPlan, LaunchError> {
        let credentials = resolve_credentials(profile, config, auth, self.secrets, self.discovery)?;
        let program = locate_binary(self.codex_binary)?;
        let args = build_codex_args(passthrough, &credentials.endpoint, config);
        let injected_overrides = (args.len() - passthrough.len()) / 2;

        emit_launch(&LaunchTelemetry {
            profile,
            auth: auth.as_str(),
            deployment: config.deployment.trim(),
            program: &program.to_string_lossy(),
            injected_overrides,
            passthrough,
        });

        Ok(LaunchPlan {
            program,
            args,
            api_key: credentials.api_key,
            injected_overrides,
        })
    }
}

/// Obtain the API key and endpoint according to the profile's auth mode.
pub fn resolve_credentials(
    profile: &str,
    config: &ProfileConfig,
    auth: AuthMode,
    secrets: &dyn SecretStore,
    discovery: &dyn ResourceDiscovery,
) -> Result<Credentials, LaunchError> {
    match auth {
        AuthMode::ApiKey => {
            let api_key = secrets.get(profile).map_err(|source| LaunchError::Secret {
                profile: profile.to_string(),
                source,
            })?;
            let endpoint = config.endpoint.trim();
            if endpoint.is_empty() {
                return Err(LaunchError::MissingEndpoint(profile.to_string()));
            }
            Ok(Credentials {
                api_key,
                endpoint: endpoint.to_string(),
            })
        }
        AuthMode::AzureCli => Ok(discovery.fetch_key_and_endpoint(
            &config.subscription,
            &config.resource,
            &config.group,
        )?),
    }
}

pub fn locate_binary(name: &str) -> Result<PathBuf, LaunchError> {
    which::which(name).map_err(|_| LaunchError::ExternalToolMissing {
        tool: name.to_string(),
    })
}

/// Passthrough args followed by `--config` overrides the user did not set.
pub fn build_codex_args(passthrough: &[String], endpoint: &str, config: &ProfileConfig) -> Vec<String> {
    let mut args = passthrough.to_vec();
    let mut push_override = |key: &str, value: &str| {
        args.push("--config".to_string());
        args.push(format!("{key}={}", quote(value)));
    };

    if !has_override_key(passthrough, "model_provider") {
        let base_url = format!("{}/openai/v1", endpoint.trim().trim_end_matches('/'));
        push_override("model_provider", PROVIDER_ID);
        push_override(&format!("model_providers.{PROVIDER_ID}.name"), PROVIDER_NAME);
        push_override(&format!("model_providers.{PROVIDER_ID}.base_url"), &base_url);
        push_override(&format!("model_providers.{PROVIDER_ID}.env_key"), API_KEY_ENV);
        push_override(&format!("model_providers.{PROVIDER_ID}.wire_api"), "responses");
    }

    let deployment = config.deployment.trim();
    if !deployment.is_empty()
        && !has_override_key(passthrough, "model")
        && !has_model_flag(passthrough)
    {
        push_override("model", deployment);
    }

    let thinking = config.thinking.trim();
    if !thinking.is_empty() && !has_override_key(passthrough, "model_reasoning_effort") {
        push_override("model_reasoning_effort", thinking);
    }
    args
}

/// Double-quoted, escaped value for a `--config key=value` override.
fn quote(value: &str) -> String {
    format!("{value:?}")
}

/// True if a `-c`/`--config` override sets `key` or a path below it.
pub fn has_override_key(args: &[String], key: &str) -> bool {
    let sets_key = |value: &str| {
        value
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('=') || rest.starts_with('.'))
    };
    args.iter().enumerate().any(|(index, arg)| {
        if arg == "--config" || arg == "-c" {
            return args.get(index + 1).is_some_and(|value| sets_key(value.as_str()));
        }
        arg.strip_prefix("--config=").is_some_and(sets_key)
    })
}

/// True if `--model`/`-m` appears in any form.
pub fn has_model_flag(args: &[String]) -> bool {
    args.iter().any(|arg| {
        arg == "--model" || arg == "-m" || arg.starts_with("--model=") || arg.starts_with("-m=")
    })
}

/// Run the child with inherited stdio and return its exit code.
pub async fn run(plan: LaunchPlan) -> Result<i32, LaunchError> {
    debug!(
        target: "codezure::launcher",
        program = %plan.program.display(),
        args = ?plan.args,
        "Spawning downstream CLI"
    );
    let status = Command::new(&plan.program)
        .args(&plan.args)
        .env(API_KEY_ENV, &plan.api_key)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| LaunchError::Spawn {
            program: plan.program.clone(),
            source,
        })?;
    let code = status.code().unwrap_or(1);
    debug!(target: "codezure::launcher", code, "Downstream CLI exited");
    Ok(code)
}
