//! Tool-level settings from `settings.toml` and `CODEZURE__*` environment variables.
use std::path::{Path, PathBuf};

use config::{Environment, File, Map};
use serde::Deserialize;
use tracing::error;

use crate::lib::{errors::SettingsError, paths::SETTINGS_FILE};

pub mod sections;
mod telemetry;

pub use sections::{
    parse_launcher_section, parse_update_section, LauncherSection, RawLauncherSection,
    RawUpdateSection, UpdateSection, DEFAULT_CODEX_BINARY, DEFAULT_RELEASE_REPOSITORY,
};

/// Environment prefix; `CODEZURE__UPDATE__CHECK_ON_LAUNCH=false` maps to `update.check_on_launch`.
pub const ENV_PREFIX: &str = "CODEZURE";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone)]
pub struct Settings {
    pub launcher: LauncherSection,
    pub update: UpdateSection,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    launcher: Option<RawLauncherSection>,
    update: Option<RawUpdateSection>,
}

impl Settings {
    /// Load `<config_dir>/settings.toml` layered under the process environment.
    pub fn load(config_dir: &Path) -> Result<Self, SettingsError> {
        Self::load_with_env(config_dir.join(SETTINGS_FILE), None)
    }

    /// Load from `path`; `env` replaces the process environment when given.
    pub fn load_with_env(
        path: PathBuf,
        env: Option<Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        telemetry::log_source(&path, path.is_file());

        let builder = config::Config::builder()
            .add_source(File::from(path.clone()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            );
        let document = builder.build().map_err(|err| {
            let error = SettingsError::from_read_error(path.clone(), err);
            error!(
                target: "codezure::settings",
                path = %path.display(),
                reason = %error,
                "Failed to read settings"
            );
            error
        })?;

        let raw: RawSettings = document.try_deserialize().map_err(|err| {
            let error = SettingsError::from_parse_error(path.clone(), err);
            error!(
                target: "codezure::settings",
                path = %path.display(),
                reason = %error,
                "Failed to parse settings"
            );
            error
        })?;

        let settings = Self::from_raw(raw, path)?;
        telemetry::log_loaded(&settings);
        Ok(settings)
    }

    fn from_raw(raw: RawSettings, path: PathBuf) -> Result<Self, SettingsError> {
        let launcher = parse_launcher_section(raw.launcher, &path)?;
        let update = parse_update_section(raw.update, &path)?;
        Ok(Self {
            launcher,
            update,
            source_path: path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use config::Map;
    use tempfile::tempdir;

    use super::*;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn no_env() -> Option<Map<String, String>> {
        Some(Map::new())
    }

    #[test]
    fn load_valid_settings() {
        let settings = Settings::load_with_env(fixture_path("settings_valid.toml"), no_env())
            .expect("settings_valid.toml should load");

        assert_eq!(settings.launcher.codex_binary, "/opt/codex/bin/codex");
        assert!(!settings.update.check_on_launch);
        assert_eq!(settings.update.repository, "example/codezure-fork");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().expect("can create temp directory");
        let settings = Settings::load_with_env(temp.path().join(SETTINGS_FILE), no_env())
            .expect("absent settings file is fine");

        assert_eq!(settings.launcher.codex_binary, DEFAULT_CODEX_BINARY);
        assert!(settings.update.check_on_launch);
        assert_eq!(settings.update.repository, DEFAULT_RELEASE_REPOSITORY);
    }

    #[test]
    fn environment_overrides_file() {
        let env = Map::from([
            (
                "CODEZURE__LAUNCHER__CODEX_BINARY".to_string(),
                "codex-nightly".to_string(),
            ),
            (
                "CODEZURE__UPDATE__CHECK_ON_LAUNCH".to_string(),
                "true".to_string(),
            ),
            ("CODEZURE_HOME".to_string(), "/ignored".to_string()),
        ]);
        let settings = Settings::load_with_env(fixture_path("settings_valid.toml"), Some(env))
            .expect("settings load with env layer");

        assert_eq!(settings.launcher.codex_binary, "codex-nightly");
        assert!(settings.update.check_on_launch);
        assert_eq!(settings.update.repository, "example/codezure-fork");
    }

    #[test]
    fn invalid_repository_returns_error() {
        let error =
            Settings::load_with_env(fixture_path("settings_invalid_repository.toml"), no_env())
                .expect_err("should reject repository without owner");

        match error {
            SettingsError::InvalidField { field, .. } => assert_eq!(field, "update.repository"),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_binary_returns_error() {
        let error = Settings::load_with_env(fixture_path("settings_blank_binary.toml"), no_env())
            .expect_err("should reject blank binary");

        match error {
            SettingsError::InvalidField { field, .. } => {
                assert_eq!(field, "launcher.codex_binary")
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let error = Settings::load_with_env(fixture_path("settings_wrong_type.toml"), no_env())
            .expect_err("should reject non-boolean");

        assert!(matches!(error, SettingsError::Parse { .. }), "{error:?}");
    }
}
