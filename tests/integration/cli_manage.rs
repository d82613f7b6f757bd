use anyhow::Result;
use codezure::profiles::ProfileStore;
use tempfile::tempdir;

use crate::common::{azure_profile, run, seed_profile, stderr, stdout};

#[test]
fn version_command_prints_version() -> Result<()> {
    let home = tempdir()?;
    let output = run(home.path(), &["manage", "version"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("codezure version "));
    Ok(())
}

#[test]
fn profiles_lists_names_with_current_marker() -> Result<()> {
    let home = tempdir()?;
    seed_profile(home.path(), "work", &azure_profile("oai-work"), true)?;
    seed_profile(home.path(), "home", &azure_profile("oai-home"), false)?;

    let output = run(home.path(), &["manage", "profiles"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "home\nwork *");
    Ok(())
}

#[test]
fn config_set_switch_and_rename_persist() -> Result<()> {
    let home = tempdir()?;
    seed_profile(home.path(), "default", &azure_profile("oai"), true)?;
    seed_profile(home.path(), "other", &azure_profile("oai-2"), false)?;

    let set = run(home.path(), &["manage", "config", "set", "deployment", "gpt-5"])?;
    assert!(set.status.success(), "stderr: {}", stderr(&set));

    let switch = run(home.path(), &["manage", "config", "switch", "other"])?;
    assert_eq!(stdout(&switch), "Switched to profile 'other'");

    let rename = run(home.path(), &["manage", "config", "rename", "other", "renamed"])?;
    assert!(rename.status.success(), "stderr: {}", stderr(&rename));

    let store = ProfileStore::open(home.path())?;
    assert_eq!(store.load("default")?.deployment, "gpt-5");
    assert_eq!(store.current_name()?, "renamed");
    assert!(!store.exists("other"));
    Ok(())
}

#[test]
fn deleting_current_profile_fails() -> Result<()> {
    let home = tempdir()?;
    seed_profile(home.path(), "default", &azure_profile("oai"), true)?;

    let output = run(home.path(), &["manage", "config", "delete", "default"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot delete current profile"));
    assert!(ProfileStore::open(home.path())?.exists("default"));
    Ok(())
}

#[test]
fn config_list_migrates_legacy_env_file() -> Result<()> {
    let home = tempdir()?;
    std::fs::write(
        home.path().join("current.env"),
        "CODZURE_SUBSCRIPTION=sub-legacy\nCODZURE_GROUP=rg\nCODZURE_RESOURCE=oai-legacy\n",
    )?;

    let output = run(home.path(), &["manage", "config", "list"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("profile:      default"));
    assert!(text.contains("resource:     oai-legacy"));
    assert!(home.path().join("current.env.bak").exists());
    Ok(())
}

#[test]
fn unknown_manage_command_is_a_usage_error() -> Result<()> {
    let home = tempdir()?;
    let output = run(home.path(), &["manage", "frobnicate"])?;

    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn broken_settings_file_fails_startup() -> Result<()> {
    let home = tempdir()?;
    std::fs::copy(
        crate::common::fixture("tests/fixtures/settings_invalid_repository.toml"),
        home.path().join("settings.toml"),
    )?;

    let output = run(home.path(), &["manage", "version"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("update.repository"));
    Ok(())
}
