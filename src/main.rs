//! Entry point for codezure.
use std::process::ExitCode;

use codezure::{
    cli::{execute_cli_command, CliCommand, LaunchArgs, LaunchRequest, ParsedCommand},
    lib::telemetry,
    runtime::{self, AppContext, RuntimeExit},
    APP_VERSION,
};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(code) => code,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<ExitCode, RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let command = LaunchArgs::parse_env().unwrap_or_else(|err| err.exit());
    let ctx = AppContext::bootstrap(APP_VERSION).map_err(RuntimeExit::from_error)?;

    match command {
        ParsedCommand::Launch(request) => launch(request, &ctx).await,
        ParsedCommand::Cli(command) => handle_cli_command(command, &ctx).await,
    }
}

async fn launch(request: LaunchRequest, ctx: &AppContext) -> Result<ExitCode, RuntimeExit> {
    runtime::run_launch(request, ctx).await
}

async fn handle_cli_command(command: CliCommand, ctx: &AppContext) -> Result<ExitCode, RuntimeExit> {
    let message = execute_cli_command(command, ctx)
        .await
        .map_err(RuntimeExit::from_error)?;
    println!("{message}");
    Ok(ExitCode::SUCCESS)
}
