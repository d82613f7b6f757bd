//! CLI argument definitions and launch request construction.
use std::{env, ffi::OsString, iter};

use clap::{error::ErrorKind, Args, Parser, Subcommand};

use super::{is_sole_meta_flag, split_passthrough_args, LaunchRequest, MANAGE_COMMAND};
use crate::APP_VERSION;

/// Parsed command intent from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Launch(LaunchRequest),
    Cli(CliCommand),
}

/// Top-level commands handled by codezure itself.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Manage profiles, settings, and the installation.
    Manage(ManageArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
#[command(about = "Manage codezure profiles and installation")]
pub struct ManageArgs {
    #[command(subcommand)]
    pub command: ManageCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ManageCommand {
    /// Run the setup wizard, or manage profiles with a subcommand.
    Config(ConfigArgs),
    /// Model deployment operations.
    Models(ModelsArgs),
    /// List profiles; the current one is marked with `*`.
    Profiles,
    /// Show version information.
    Version,
    /// Check for updates and install if available.
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
#[command(
    about = "Interactive configuration",
    after_help = "Without a subcommand the interactive setup wizard runs."
)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigCommand {
    /// Show the current configuration.
    List,
    /// Set one field of the current profile.
    Set {
        /// subscription|group|resource|location|endpoint|deployment|thinking|auth
        key: String,
        value: String,
    },
    /// Save the current configuration as a named profile.
    Save { name: String },
    /// Make another profile current.
    Switch { name: String },
    /// Delete a profile other than the current one.
    Delete { name: String },
    /// Rename a profile.
    Rename { old: String, new: String },
    /// Copy a profile.
    Copy { source: String, destination: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ModelsCommand {
    /// List deployments in the current profile's resource.
    List,
}

/// Command-line arguments owned by codezure.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "codezure",
    version = APP_VERSION,
    about = "Launch Codex CLI with Azure OpenAI configuration",
    long_about = "codezure configures Azure OpenAI credentials and launches Codex CLI.\n\nArguments other than --codezure-* flags are passed through to Codex unchanged.",
    override_usage = "codezure [--codezure-profile <NAME>] [CODEX_ARGS]...\n       codezure manage <COMMAND>"
)]
pub struct LaunchArgs {
    /// Use a specific codezure profile for this run.
    #[arg(long = "codezure-profile", value_name = "NAME")]
    pub profile: Option<String>,
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchArgs {
    /// Parse the process arguments.
    pub fn parse_env() -> Result<ParsedCommand, clap::Error> {
        Self::parse_argv(utf8_args(env::args_os())?)
    }

    /// Split own flags from Codex passthrough, then let clap parse what is ours.
    ///
    /// Management commands and a lone help/version flag go to clap in full;
    /// anything else is a launch and keeps its arguments for Codex.
    pub fn parse_argv(argv: Vec<String>) -> Result<ParsedCommand, clap::Error> {
        let mut argv = argv.into_iter();
        let binary = argv.next().unwrap_or_else(|| "codezure".to_string());
        let rest: Vec<String> = argv.collect();
        let split = split_passthrough_args(&rest);

        let handled_here = split.passthrough.first().map(String::as_str) == Some(MANAGE_COMMAND)
            || is_sole_meta_flag(&split.passthrough);
        if handled_here {
            let args = Self::try_parse_from(
                iter::once(binary)
                    .chain(split.own)
                    .chain(split.passthrough),
            )?;
            return Ok(args.into_command(Vec::new()));
        }

        let args = Self::try_parse_from(iter::once(binary).chain(split.own))?;
        Ok(args.into_command(split.passthrough))
    }

    fn into_command(self, passthrough: Vec<String>) -> ParsedCommand {
        match self.command {
            Some(command) => ParsedCommand::Cli(command),
            None => ParsedCommand::Launch(LaunchRequest {
                profile_override: self.profile,
                passthrough,
            }),
        }
    }
}

/// Arguments are forwarded verbatim, so they must be valid UTF-8.
fn utf8_args(raw: impl IntoIterator<Item = OsString>) -> Result<Vec<String>, clap::Error> {
    raw.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|arg| {
                clap::Error::raw(
                    ErrorKind::InvalidUtf8,
                    format!("argument is not valid UTF-8: {}\n", arg.to_string_lossy()),
                )
            })
        })
        .collect()
}
