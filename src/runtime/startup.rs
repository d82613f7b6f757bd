use std::process::ExitCode;

use anyhow::{Context, Error};
use tracing::info;

use super::AppContext;
use crate::{
    azure::AzureCli,
    cli::LaunchRequest,
    interactive::{ConfigWizard, TerminalPrompter},
    launcher::{self, Launcher},
    lib::errors::ProfileError,
    profiles::ProfileConfig,
    secrets::KeyringSecretStore,
    updater::spawn_update_check,
};

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("Error: {err:#}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Map a child's exit status onto our own exit code.
pub fn child_exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Resolve the profile for this run and hand the terminal to Codex.
pub async fn run_launch(request: LaunchRequest, ctx: &AppContext) -> Result<ExitCode, RuntimeExit> {
    if ctx.settings.update.check_on_launch {
        // Detached; never awaited.
        let _ = spawn_update_check(ctx.settings.update.repository.clone(), ctx.version.to_string());
    }

    let (profile, config) = resolve_profile(&request, ctx).map_err(RuntimeExit::from_error)?;
    let auth = config
        .validate()
        .context("invalid configuration")
        .map_err(RuntimeExit::from_error)?;

    let secrets = KeyringSecretStore;
    let discovery = AzureCli;
    let plan = Launcher::new(&secrets, &discovery, &ctx.settings.launcher.codex_binary)
        .plan(&profile, &config, auth, &request.passthrough)
        .map_err(RuntimeExit::from_error)?;
    let code = launcher::run(plan).await.map_err(RuntimeExit::from_error)?;
    Ok(child_exit_code(code))
}

/// The profile named on the command line, else the current one.
///
/// A first run without any profile goes through the setup wizard.
fn resolve_profile(request: &LaunchRequest, ctx: &AppContext) -> anyhow::Result<(String, ProfileConfig)> {
    if let Some(name) = &request.profile_override {
        let config = ctx
            .store
            .load(name)
            .with_context(|| format!("failed to load profile '{name}'"))?;
        println!("Using profile: {name}\n");
        return Ok((name.clone(), config));
    }

    ctx.store
        .migrate_legacy()
        .context("failed to migrate legacy configuration")?;
    let name = match ctx.store.current_name() {
        Ok(name) => name,
        Err(ProfileError::NoCurrentProfile) => {
            info!(target: "codezure::runtime", "No current profile; starting setup wizard");
            let mut prompter = TerminalPrompter::new();
            let summary = ConfigWizard::new(
                &ctx.store,
                &mut prompter,
                &AzureCli,
                &KeyringSecretStore,
                ctx.version,
            )
            .run()?;
            println!("{summary}\n");
            summary.profile
        }
        Err(other) => return Err(other).context("failed to read current profile"),
    };
    let config = ctx
        .store
        .load(&name)
        .context("failed to load config")?;
    Ok((name, config))
}
