//! CLI entrypoint module structure.
use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::{
    azure::{AzureCli, ResourceDiscovery},
    interactive::{ConfigWizard, TerminalPrompter},
    lib::errors::SecretError,
    profiles::{AuthMode, ProfileStore},
    runtime::AppContext,
    secrets::{copy_secret, forget_secret, move_secret, KeyringSecretStore, SecretStore},
    updater::{UpdateOutcome, Updater},
};

pub mod args;
pub mod profile;

pub use args::{
    CliCommand, ConfigArgs, ConfigCommand, LaunchArgs, ManageArgs, ManageCommand, ModelsArgs,
    ModelsCommand, ParsedCommand,
};
pub use profile::{
    is_sole_meta_flag, split_passthrough_args, LaunchRequest, SplitArgs, MANAGE_COMMAND,
    OWN_FLAG_PREFIX,
};

/// Execute a management command and return the text to print.
pub async fn execute_cli_command(command: CliCommand, ctx: &AppContext) -> Result<String> {
    let CliCommand::Manage(manage) = command;
    match manage.command {
        ManageCommand::Config(ConfigArgs { command: None }) => run_wizard(ctx),
        ManageCommand::Config(ConfigArgs {
            command: Some(command),
        }) => execute_config_command(command, ctx, &KeyringSecretStore),
        ManageCommand::Models(ModelsArgs {
            command: ModelsCommand::List,
        }) => list_models(ctx, &AzureCli),
        ManageCommand::Profiles => list_profiles(&ctx.store),
        ManageCommand::Version => Ok(format!("codezure version {}", ctx.version)),
        ManageCommand::Update => run_update(ctx).await,
    }
}

fn run_wizard(ctx: &AppContext) -> Result<String> {
    let mut prompter = TerminalPrompter::new();
    let summary = ConfigWizard::new(
        &ctx.store,
        &mut prompter,
        &AzureCli,
        &KeyringSecretStore,
        ctx.version,
    )
    .run()?;
    Ok(summary.to_string())
}

/// `manage config <subcommand>`; keychain entries follow api-key profiles.
fn execute_config_command(
    command: ConfigCommand,
    ctx: &AppContext,
    secrets: &dyn SecretStore,
) -> Result<String> {
    let store = &ctx.store;
    match command {
        ConfigCommand::List => {
            let config = store.load_current(ctx.version)?;
            let name = store.current_name()?;
            let mut out = String::from("Current Configuration:\n");
            writeln!(out, "  profile:      {name}")?;
            writeln!(out, "  auth:         {}", config.auth_mode()?)?;
            writeln!(out, "  subscription: {}", config.subscription)?;
            writeln!(out, "  group:        {}", config.group)?;
            writeln!(out, "  resource:     {}", config.resource)?;
            writeln!(out, "  location:     {}", config.location)?;
            writeln!(out, "  endpoint:     {}", config.endpoint)?;
            write!(out, "  deployment:   {}", config.deployment)?;
            if !config.thinking.is_empty() {
                write!(out, "\n  thinking:     {}", config.thinking)?;
            }
            Ok(out)
        }
        ConfigCommand::Set { key, value } => {
            let mut config = store.load_current(ctx.version)?;
            config.set_field(&key, value.clone())?;
            let name = store.save_current(&config)?;
            Ok(format!("Set {} = {value} in profile '{name}'", key.to_ascii_lowercase()))
        }
        ConfigCommand::Save { name } => {
            let config = store.load_current(ctx.version)?;
            let current = store.current_name()?;
            store
                .save(&name, &config)
                .with_context(|| format!("failed to save profile '{name}'"))?;
            if config.auth_mode()? == AuthMode::ApiKey && current != name {
                carry_secret(copy_secret(secrets, &current, &name), &name);
            }
            Ok(format!("Saved current configuration as profile '{name}'"))
        }
        ConfigCommand::Switch { name } => {
            store.switch(&name)?;
            Ok(format!("Switched to profile '{name}'"))
        }
        ConfigCommand::Delete { name } => {
            let api_key = uses_api_key(store, &name);
            store.delete(&name)?;
            if api_key {
                if let Err(err) = forget_secret(secrets, &name) {
                    warn!(target: "codezure::cli", profile = %name, error = %err, "Failed to remove API key from keychain");
                }
            }
            Ok(format!("Deleted profile '{name}'"))
        }
        ConfigCommand::Rename { old, new } => {
            let api_key = uses_api_key(store, &old);
            store.rename(&old, &new)?;
            if api_key {
                carry_secret(move_secret(secrets, &old, &new), &new);
            }
            Ok(format!("Renamed profile '{old}' to '{new}'"))
        }
        ConfigCommand::Copy {
            source,
            destination,
        } => {
            let api_key = uses_api_key(store, &source);
            store.copy(&source, &destination)?;
            if api_key {
                carry_secret(copy_secret(secrets, &source, &destination), &destination);
            }
            Ok(format!("Copied profile '{source}' to '{destination}'"))
        }
    }
}

fn uses_api_key(store: &ProfileStore, name: &str) -> bool {
    store
        .load(name)
        .ok()
        .and_then(|config| config.auth_mode().ok())
        == Some(AuthMode::ApiKey)
}

/// Keychain follow-ups never fail the profile operation itself.
fn carry_secret(result: Result<bool, SecretError>, profile: &str) {
    match result {
        Ok(true) => {}
        Ok(false) => {
            warn!(target: "codezure::cli", profile, "No API key in keychain to carry over")
        }
        Err(err) => {
            warn!(target: "codezure::cli", profile, error = %err, "Failed to carry API key over in keychain")
        }
    }
}

fn list_models(ctx: &AppContext, discovery: &dyn ResourceDiscovery) -> Result<String> {
    let config = ctx.store.load_current(ctx.version)?;
    if config.auth_mode()? != AuthMode::AzureCli {
        bail!("listing deployments requires an azure-cli profile");
    }
    let deployments = discovery
        .list_deployments(&config.subscription, &config.resource, &config.group)
        .context("failed to list deployments")?;

    let mut out = String::from("Available deployments:");
    for deployment in deployments {
        write!(
            out,
            "\n  {} (model={})",
            deployment.name, deployment.model_name
        )?;
    }
    Ok(out)
}

fn list_profiles(store: &ProfileStore) -> Result<String> {
    let entries = store.list()?;
    if entries.is_empty() {
        return Ok("No profiles configured; run 'codezure manage config'".to_string());
    }
    Ok(entries
        .iter()
        .map(|entry| {
            if entry.current {
                format!("{} *", entry.name)
            } else {
                entry.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn run_update(ctx: &AppContext) -> Result<String> {
    eprintln!("Checking for updates...");
    let updater = Updater::new(&ctx.settings.update.repository, ctx.version)?;
    let outcome = updater
        .update()
        .await
        .context("failed to update")?;
    Ok(match outcome {
        UpdateOutcome::AlreadyCurrent(version) => format!("Already on latest version: {version}"),
        UpdateOutcome::Updated { from, to } => {
            format!("Successfully updated to version {to} (was {from})")
        }
    })
}
