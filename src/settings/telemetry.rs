use std::path::Path;

use tracing::debug;

use super::{Settings, ENV_PREFIX};

pub fn log_source(path: &Path, exists: bool) {
    if exists {
        debug!(
            target: "codezure::settings",
            path = %path.display(),
            "Loading settings file"
        );
    } else {
        debug!(
            target: "codezure::settings",
            path = %path.display(),
            env_prefix = ENV_PREFIX,
            "No settings file; using defaults and environment"
        );
    }
}

pub fn log_loaded(settings: &Settings) {
    debug!(
        target: "codezure::settings",
        path = %settings.source_path.display(),
        codex_binary = %settings.launcher.codex_binary,
        check_on_launch = settings.update.check_on_launch,
        repository = %settings.update.repository,
        "Settings loaded"
    );
}
