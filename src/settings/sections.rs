use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::SettingsError;

pub const DEFAULT_CODEX_BINARY: &str = "codex";
pub const DEFAULT_RELEASE_REPOSITORY: &str = "OlaHulleberg/codezure";

/// How the downstream CLI is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSection {
    /// Program name looked up on `PATH`, or an explicit path.
    pub codex_binary: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLauncherSection {
    pub codex_binary: Option<String>,
}

/// Release checks and self-update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSection {
    pub check_on_launch: bool,
    /// GitHub `owner/name` that publishes releases.
    pub repository: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawUpdateSection {
    pub check_on_launch: Option<bool>,
    pub repository: Option<String>,
}

pub fn parse_launcher_section(
    raw: Option<RawLauncherSection>,
    path: &Path,
) -> Result<LauncherSection, SettingsError> {
    let raw = raw.unwrap_or_default();
    let codex_binary = match raw.codex_binary {
        Some(value) if value.trim().is_empty() => {
            return Err(SettingsError::InvalidField {
                path: path.to_path_buf(),
                field: "launcher.codex_binary",
                message: "Provide a program name or path, or remove the key".into(),
            })
        }
        Some(value) => value.trim().to_string(),
        None => DEFAULT_CODEX_BINARY.to_string(),
    };
    Ok(LauncherSection { codex_binary })
}

pub fn parse_update_section(
    raw: Option<RawUpdateSection>,
    path: &Path,
) -> Result<UpdateSection, SettingsError> {
    let raw = raw.unwrap_or_default();
    let repository = raw
        .repository
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_RELEASE_REPOSITORY.to_string());
    validate_repository(&repository, path)?;
    Ok(UpdateSection {
        check_on_launch: raw.check_on_launch.unwrap_or(true),
        repository,
    })
}

fn validate_repository(repository: &str, path: &Path) -> Result<(), SettingsError> {
    let valid = matches!(
        repository.split_once('/'),
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
    );
    if valid {
        return Ok(());
    }

    Err(SettingsError::InvalidField {
        path: path.to_path_buf(),
        field: "update.repository",
        message: "Use the GitHub `owner/name` form".into(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let path = PathBuf::from("settings.toml");
        let launcher = parse_launcher_section(None, &path).expect("defaults");
        let update = parse_update_section(None, &path).expect("defaults");

        assert_eq!(launcher.codex_binary, DEFAULT_CODEX_BINARY);
        assert!(update.check_on_launch);
        assert_eq!(update.repository, DEFAULT_RELEASE_REPOSITORY);
    }

    #[test]
    fn repository_needs_owner_and_name() {
        let path = PathBuf::from("settings.toml");
        for bad in ["solo", "/name", "owner/", "a/b/c"] {
            let raw = RawUpdateSection {
                check_on_launch: None,
                repository: Some(bad.into()),
            };
            match parse_update_section(Some(raw), &path) {
                Err(SettingsError::InvalidField { field, .. }) => {
                    assert_eq!(field, "update.repository")
                }
                other => panic!("Unexpected result for {bad}: {other:?}"),
            }
        }
    }
}
