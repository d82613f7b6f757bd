use std::{
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use anyhow::{Context, Result};
use codezure::profiles::{ProfileConfig, ProfileStore};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_codezure");

/// A `codezure` invocation isolated under `home`, with no update check and no TTY.
pub fn codezure(home: &Path) -> Command {
    let mut command = Command::new(BINARY_PATH);
    command
        .env("CODEZURE_HOME", home)
        .env("CODEZURE__UPDATE__CHECK_ON_LAUNCH", "false")
        .env("CODEZURE_LOG", "off")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

pub fn run(home: &Path, args: &[&str]) -> Result<Output> {
    codezure(home)
        .args(args)
        .output()
        .context("failed to run codezure")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Save `config` as `name` and optionally make it current.
pub fn seed_profile(home: &Path, name: &str, config: &ProfileConfig, current: bool) -> Result<()> {
    let store = ProfileStore::open(home)?;
    store.save(name, config)?;
    if current {
        store.set_current_name(name)?;
    }
    Ok(())
}

pub fn azure_profile(resource: &str) -> ProfileConfig {
    ProfileConfig {
        subscription: "sub-1".into(),
        group: "rg-ai".into(),
        resource: resource.into(),
        location: "westeurope".into(),
        deployment: "gpt-4o".into(),
        ..ProfileConfig::default()
    }
}

pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}
