//! Telemetry initialization and launch logging helpers.

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "CODEZURE_LOG";
/// Default directives; the launched CLI owns the terminal, so stay quiet.
const DEFAULT_DIRECTIVES: &str = "warn";

/// Initialize `tracing` and format developer logs on stderr.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Payload describing a resolved launch as structured telemetry.
#[derive(Debug, Serialize)]
pub struct LaunchTelemetry<'a> {
    pub profile: &'a str,
    pub auth: &'a str,
    pub deployment: &'a str,
    pub program: &'a str,
    pub injected_overrides: usize,
    pub passthrough: &'a [String],
}

/// Emit the launch plan to `tracing`. The API key is never part of it.
pub fn emit_launch(telemetry: &LaunchTelemetry<'_>) {
    info!(
        target: "codezure::launcher",
        profile = telemetry.profile,
        auth = telemetry.auth,
        deployment = telemetry.deployment,
        program = telemetry.program,
        injected_overrides = telemetry.injected_overrides,
        passthrough = ?telemetry.passthrough,
        "Launching downstream CLI"
    );
}
