use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::{lib::paths::resolve_config_dir, profiles::ProfileStore, settings::Settings};

/// Everything a command needs, built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub store: ProfileStore,
    pub settings: Settings,
    pub version: &'static str,
}

impl AppContext {
    pub fn new(store: ProfileStore, settings: Settings, version: &'static str) -> Self {
        Self {
            store,
            settings,
            version,
        }
    }

    /// Resolve the config directory, open the profile store, and load settings.
    pub fn bootstrap(version: &'static str) -> Result<Self> {
        let root = resolve_config_dir().map_err(|message| anyhow!(message))?;
        let store = ProfileStore::open(&root)
            .with_context(|| format!("failed to open config directory {}", root.display()))?;
        let settings = Settings::load(&root)?;
        debug!(
            target: "codezure::runtime",
            root = %root.display(),
            version,
            "Application context ready"
        );
        Ok(Self::new(store, settings, version))
    }
}
