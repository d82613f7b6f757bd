//! Parser for the deprecated `current.env` key/value format.

use super::ProfileConfig;

/// Prefixes used by older releases; the project was renamed once.
const LEGACY_PREFIXES: [&str; 2] = ["CODZURE_", "CODEZURE_"];

/// Parse `KEY=value` lines into a configuration document.
///
/// Blank lines, `#` comments, lines without `=`, and unrecognized keys are
/// skipped. Keys are matched case-insensitively.
pub fn parse_legacy_env(contents: &str) -> ProfileConfig {
    let mut config = ProfileConfig::default();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_uppercase();
        let Some(field) = LEGACY_PREFIXES
            .iter()
            .find_map(|prefix| key.strip_prefix(prefix))
        else {
            continue;
        };
        let value = value.trim().to_string();
        match field {
            "SUBSCRIPTION" => config.subscription = value,
            "GROUP" => config.group = value,
            "RESOURCE" => config.resource = value,
            "LOCATION" => config.location = value,
            "ENDPOINT" => config.endpoint = value,
            "DEPLOYMENT" => config.deployment = value,
            "THINKING" => config.thinking = value,
            _ => {}
        }
    }
    config
}
