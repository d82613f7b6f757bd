//! Per-user directory layout shared by the profile store and settings loader.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Environment variable that relocates the whole config directory.
pub const CODEZURE_HOME_ENV: &str = "CODEZURE_HOME";
/// Directory name created under the user's home.
const CONFIG_DIR_NAME: &str = ".codezure";

pub const PROFILES_DIR: &str = "profiles";
pub const CURRENT_PROFILE_FILE: &str = "current-profile.txt";
pub const LEGACY_ENV_FILE: &str = "current.env";
pub const LEGACY_BACKUP_SUFFIX: &str = ".bak";
pub const SETTINGS_FILE: &str = "settings.toml";

/// Resolve the config directory.
///
/// Resolution order:
/// 1. `$CODEZURE_HOME` when set and non-empty.
/// 2. `<home>/.codezure` otherwise.
pub fn resolve_config_dir() -> Result<PathBuf, &'static str> {
    resolve_config_dir_from(
        env::var_os(CODEZURE_HOME_ENV),
        dirs::home_dir().map(PathBuf::into_os_string),
    )
}

/// Resolve the config directory from explicit values (testable helper).
pub fn resolve_config_dir_from(
    explicit: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf, &'static str> {
    if let Some(explicit) = explicit.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(explicit));
    }

    if let Some(home) = home {
        return Ok(PathBuf::from(home).join(CONFIG_DIR_NAME));
    }

    Err("CODEZURE_HOME is unset and the home directory could not be determined")
}

/// Returns true if `name` is usable as a single path component.
pub fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && Path::new(name).components().count() == 1
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_home_takes_precedence() {
        let dir = resolve_config_dir_from(Some("/tmp/cz".into()), Some("/home/me".into()))
            .expect("resolution succeeds");
        assert_eq!(dir, PathBuf::from("/tmp/cz"));
    }

    #[test]
    fn empty_explicit_value_falls_back_to_home() {
        let dir = resolve_config_dir_from(Some(OsString::new()), Some("/home/me".into()))
            .expect("resolution succeeds");
        assert_eq!(dir, PathBuf::from("/home/me/.codezure"));
    }

    #[test]
    fn missing_everything_is_an_error() {
        assert!(resolve_config_dir_from(None, None).is_err());
    }

    #[test]
    fn file_stems_reject_traversal() {
        assert!(is_safe_file_stem("work-eu_2"));
        assert!(is_safe_file_stem("v1.2"));
        assert!(!is_safe_file_stem(""));
        assert!(!is_safe_file_stem(".."));
        assert!(!is_safe_file_stem(".hidden"));
        assert!(!is_safe_file_stem("a/b"));
        assert!(!is_safe_file_stem("a\\b"));
        assert!(!is_safe_file_stem("with space"));
    }
}
