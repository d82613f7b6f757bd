#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use anyhow::Result;
use codezure::profiles::ProfileStore;
use tempfile::tempdir;

use crate::common::{azure_profile, codezure, seed_profile, stderr, stdout};

const FAKE_AZ: &str = r#"#!/bin/sh
if [ "$1 $2" = "account set" ]; then
  exit 0
fi
case "$3" in
  keys) echo "sk-from-az" ;;
  show) echo "https://oai-work.openai.azure.com/" ;;
  *) echo "unexpected az call: $*" >&2; exit 3 ;;
esac
"#;

/// Prints its arguments one per line plus the key it received, then exits 7.
const FAKE_CODEX: &str = r#"#!/bin/sh
for arg in "$@"; do
  echo "arg:$arg"
done
echo "key:$CODEZURE_API_KEY"
exit 7
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, body)?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

fn fake_bin_dir(root: &Path) -> Result<PathBuf> {
    let bin = root.join("bin");
    fs::create_dir_all(&bin)?;
    write_script(&bin, "az", FAKE_AZ)?;
    write_script(&bin, "codex", FAKE_CODEX)?;
    Ok(bin)
}

fn path_with(bin: &Path) -> String {
    let existing = std::env::var("PATH").unwrap_or_default();
    format!("{}:{existing}", bin.display())
}

#[test]
fn launch_passes_arguments_key_and_exit_code_through() -> Result<()> {
    let home = tempdir()?;
    let bin = fake_bin_dir(home.path())?;
    seed_profile(home.path(), "work", &azure_profile("oai-work"), true)?;

    let output = codezure(home.path())
        .env("PATH", path_with(&bin))
        .args(["--codezure-profile", "work", "exec", "--full-auto", "hello"])
        .output()?;

    assert_eq!(output.status.code(), Some(7), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let args: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("arg:"))
        .collect();
    assert_eq!(&args[..3], ["exec", "--full-auto", "hello"]);
    assert!(args.contains(&"model_provider=\"codezure\""));
    assert!(args.contains(
        &"model_providers.codezure.base_url=\"https://oai-work.openai.azure.com/openai/v1\""
    ));
    assert!(args.contains(&"model=\"gpt-4o\""));
    assert!(!args.iter().any(|arg| arg.starts_with("--codezure")));
    assert!(text.contains("key:sk-from-az"));
    assert!(text.contains("Using profile: work"));
    Ok(())
}

#[test]
fn explicit_model_flag_suppresses_deployment_override() -> Result<()> {
    let home = tempdir()?;
    let bin = fake_bin_dir(home.path())?;
    seed_profile(home.path(), "default", &azure_profile("oai-work"), true)?;

    let output = codezure(home.path())
        .env("PATH", path_with(&bin))
        .args(["-m", "o3"])
        .output()?;

    assert_eq!(output.status.code(), Some(7), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("arg:o3"));
    assert!(!text.contains("arg:model=\"gpt-4o\""));
    Ok(())
}

#[test]
fn missing_codex_binary_is_reported() -> Result<()> {
    let home = tempdir()?;
    let bin = home.path().join("bin");
    fs::create_dir_all(&bin)?;
    write_script(&bin, "az", FAKE_AZ)?;
    seed_profile(home.path(), "default", &azure_profile("oai-work"), true)?;

    let output = codezure(home.path())
        .env("PATH", bin.display().to_string())
        .env("CODEZURE__LAUNCHER__CODEX_BINARY", "codex-not-installed")
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("codex-not-installed"));
    Ok(())
}

#[test]
fn first_run_without_terminal_cannot_start_wizard() -> Result<()> {
    let home = tempdir()?;
    let bin = fake_bin_dir(home.path())?;

    let output = codezure(home.path())
        .env("PATH", path_with(&bin))
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("Error:"));
    assert!(ProfileStore::open(home.path())?.list()?.is_empty());
    Ok(())
}
