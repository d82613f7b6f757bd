//! Named configuration documents, the current-profile pointer, and legacy migration.
use std::{fs, path::PathBuf};

use tracing::{debug, info};

use crate::lib::{
    errors::ProfileError,
    fs::{list_file_stems, read_optional, write_atomic},
    paths::{
        is_safe_file_stem, CURRENT_PROFILE_FILE, LEGACY_BACKUP_SUFFIX, LEGACY_ENV_FILE,
        PROFILES_DIR,
    },
};

pub mod document;
pub mod legacy;

pub use document::{AuthMode, ProfileConfig, SETTABLE_KEYS, THINKING_LEVELS};
pub use legacy::parse_legacy_env;

/// Name used for the first profile and for migrated legacy files.
pub const DEFAULT_PROFILE: &str = "default";
const PROFILE_EXTENSION: &str = "json";

/// Listing entry returned by [`ProfileStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub name: String,
    pub current: bool,
}

/// Filesystem-backed profile store rooted at the config directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
    profiles_dir: PathBuf,
}

impl ProfileStore {
    /// Open (and create if needed) the store under `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ProfileError> {
        let root = root.into();
        let profiles_dir = root.join(PROFILES_DIR);
        fs::create_dir_all(&profiles_dir)
            .map_err(|source| ProfileError::io(&profiles_dir, source))?;
        Ok(Self { root, profiles_dir })
    }

    fn current_pointer_path(&self) -> PathBuf {
        self.root.join(CURRENT_PROFILE_FILE)
    }

    fn legacy_env_path(&self) -> PathBuf {
        self.root.join(LEGACY_ENV_FILE)
    }

    /// Path of the legacy file after archival.
    pub fn legacy_backup_path(&self) -> PathBuf {
        self.root
            .join(format!("{LEGACY_ENV_FILE}{LEGACY_BACKUP_SUFFIX}"))
    }

    /// Path of a profile document. The name is not validated here.
    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.{PROFILE_EXTENSION}"))
    }

    /// Read the current-profile pointer.
    pub fn current_name(&self) -> Result<String, ProfileError> {
        let path = self.current_pointer_path();
        let contents = read_optional(&path).map_err(|source| ProfileError::io(&path, source))?;
        match contents.map(|raw| raw.trim().to_string()) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ProfileError::NoCurrentProfile),
        }
    }

    /// Overwrite the current-profile pointer.
    pub fn set_current_name(&self, name: &str) -> Result<(), ProfileError> {
        validate_profile_name(name)?;
        let path = self.current_pointer_path();
        write_atomic(&path, format!("{name}\n").as_bytes())
            .map_err(|source| ProfileError::io(&path, source))?;
        debug!(target: "codezure::profiles", profile = name, "Current profile pointer updated");
        Ok(())
    }

    /// Convert `current.env` into the `default` profile once.
    ///
    /// Returns true when a migration happened. Nothing is done if the legacy
    /// file is absent or a `default` document already exists.
    pub fn migrate_legacy(&self) -> Result<bool, ProfileError> {
        let legacy_path = self.legacy_env_path();
        let Some(contents) =
            read_optional(&legacy_path).map_err(|source| ProfileError::io(&legacy_path, source))?
        else {
            return Ok(false);
        };
        if self.exists(DEFAULT_PROFILE) {
            debug!(
                target: "codezure::profiles",
                path = %legacy_path.display(),
                "Legacy file present but default profile exists; skipping migration"
            );
            return Ok(false);
        }

        let config = parse_legacy_env(&contents);
        self.save(DEFAULT_PROFILE, &config)?;
        self.set_current_name(DEFAULT_PROFILE)?;
        let backup = self.legacy_backup_path();
        fs::rename(&legacy_path, &backup).map_err(|source| ProfileError::io(&legacy_path, source))?;

        info!(
            target: "codezure::profiles",
            from = %legacy_path.display(),
            backup = %backup.display(),
            "Migrated legacy configuration into the default profile"
        );
        Ok(true)
    }

    /// Load the current profile, migrating the legacy file first.
    pub fn load_current(&self, app_version: &str) -> Result<ProfileConfig, ProfileError> {
        self.migrate_legacy()?;
        let name = self.current_name()?;
        debug!(
            target: "codezure::profiles",
            profile = %name,
            app_version,
            "Loading current profile"
        );
        self.load(&name)
    }

    /// Save into the current profile, pointing at `default` if none is set.
    ///
    /// Returns the profile name that was written.
    pub fn save_current(&self, config: &ProfileConfig) -> Result<String, ProfileError> {
        let name = match self.current_name() {
            Ok(name) => name,
            Err(ProfileError::NoCurrentProfile) => {
                self.set_current_name(DEFAULT_PROFILE)?;
                DEFAULT_PROFILE.to_string()
            }
            Err(other) => return Err(other),
        };
        self.save(&name, config)?;
        Ok(name)
    }

    /// Read one profile document.
    pub fn load(&self, name: &str) -> Result<ProfileConfig, ProfileError> {
        validate_profile_name(name)?;
        let path = self.profile_path(name);
        let not_found = |detail: String| ProfileError::NotFound {
            name: name.to_string(),
            path: path.clone(),
            detail,
        };
        let contents = read_optional(&path)
            .map_err(|source| ProfileError::io(&path, source))?
            .ok_or_else(|| not_found("file does not exist".to_string()))?;
        serde_json::from_str(&contents).map_err(|err| not_found(format!("malformed JSON: {err}")))
    }

    /// Write one profile document as pretty-printed JSON (full overwrite).
    pub fn save(&self, name: &str, config: &ProfileConfig) -> Result<(), ProfileError> {
        validate_profile_name(name)?;
        let path = self.profile_path(name);
        let mut body = serde_json::to_vec_pretty(config).map_err(|source| {
            ProfileError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        body.push(b'\n');
        write_atomic(&path, &body).map_err(|source| ProfileError::io(&path, source))?;
        debug!(target: "codezure::profiles", profile = name, path = %path.display(), "Profile saved");
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        is_safe_file_stem(name) && self.profile_path(name).is_file()
    }

    /// All profile documents, sorted by name, with the current one flagged.
    pub fn list(&self) -> Result<Vec<ProfileEntry>, ProfileError> {
        let current = self.current_name().ok();
        let names = list_file_stems(&self.profiles_dir, PROFILE_EXTENSION)
            .map_err(|source| ProfileError::io(&self.profiles_dir, source))?;
        Ok(names
            .into_iter()
            .map(|name| ProfileEntry {
                current: current.as_deref() == Some(name.as_str()),
                name,
            })
            .collect())
    }

    /// Point the current profile at an existing document.
    pub fn switch(&self, name: &str) -> Result<(), ProfileError> {
        self.ensure_exists(name)?;
        self.set_current_name(name)
    }

    /// Delete a document. The current profile cannot be deleted.
    pub fn delete(&self, name: &str) -> Result<(), ProfileError> {
        if self.current_name().ok().as_deref() == Some(name) {
            return Err(ProfileError::DeleteCurrent(name.to_string()));
        }
        self.ensure_exists(name)?;
        let path = self.profile_path(name);
        fs::remove_file(&path).map_err(|source| ProfileError::io(&path, source))?;
        info!(target: "codezure::profiles", profile = name, "Profile deleted");
        Ok(())
    }

    /// Rename a document; the pointer follows if it named `old`.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), ProfileError> {
        self.ensure_exists(old)?;
        self.ensure_vacant(new)?;
        let from = self.profile_path(old);
        let to = self.profile_path(new);
        fs::rename(&from, &to).map_err(|source| ProfileError::io(&from, source))?;
        if self.current_name().ok().as_deref() == Some(old) {
            self.set_current_name(new)?;
        }
        info!(target: "codezure::profiles", from = old, to = new, "Profile renamed");
        Ok(())
    }

    /// Duplicate a document under a new name.
    pub fn copy(&self, source: &str, destination: &str) -> Result<(), ProfileError> {
        let config = self.load(source)?;
        self.ensure_vacant(destination)?;
        self.save(destination, &config)
    }

    fn ensure_exists(&self, name: &str) -> Result<(), ProfileError> {
        validate_profile_name(name)?;
        if self.exists(name) {
            return Ok(());
        }
        Err(ProfileError::NotFound {
            name: name.to_string(),
            path: self.profile_path(name),
            detail: "file does not exist".to_string(),
        })
    }

    fn ensure_vacant(&self, name: &str) -> Result<(), ProfileError> {
        validate_profile_name(name)?;
        if self.exists(name) {
            return Err(ProfileError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }
}

/// Reject names that are not a single safe path component.
pub fn validate_profile_name(name: &str) -> Result<(), ProfileError> {
    if is_safe_file_stem(name) {
        return Ok(());
    }
    Err(ProfileError::InvalidProfileName {
        name: name.to_string(),
        reason: "use letters, digits, '-', '_' or '.', not starting with '.'",
    })
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::{tempdir, TempDir};

    use super::*;

    fn store() -> (TempDir, ProfileStore) {
        let temp = tempdir().expect("can create temp directory");
        let store = ProfileStore::open(temp.path()).expect("can open store");
        (temp, store)
    }

    fn sample(deployment: &str) -> ProfileConfig {
        ProfileConfig {
            subscription: "sub".into(),
            group: "rg".into(),
            resource: "res".into(),
            location: "eastus".into(),
            endpoint: "https://res.openai.azure.com/".into(),
            deployment: deployment.into(),
            thinking: "high".into(),
            auth: "azure-cli".into(),
        }
    }

    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current).expect("can list") {
                let path = entry.expect("entry").path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    let bytes = fs::read(&path).expect("can read");
                    files.push((path, bytes));
                }
            }
        }
        files.sort();
        files
    }

    #[test]
    fn fresh_store_has_no_current_profile() {
        let (_temp, store) = store();
        assert!(matches!(
            store.current_name(),
            Err(ProfileError::NoCurrentProfile)
        ));
        assert!(matches!(
            store.load_current("dev"),
            Err(ProfileError::NoCurrentProfile)
        ));
    }

    #[test]
    fn pointer_is_trimmed_and_blank_counts_as_unset() {
        let (temp, store) = store();
        fs::write(temp.path().join(CURRENT_PROFILE_FILE), "  work \n").expect("can write");
        assert_eq!(store.current_name().expect("pointer set"), "work");

        fs::write(temp.path().join(CURRENT_PROFILE_FILE), "\n").expect("can write");
        assert!(matches!(
            store.current_name(),
            Err(ProfileError::NoCurrentProfile)
        ));
    }

    #[test]
    fn save_current_defaults_pointer_and_round_trips() {
        let (_temp, store) = store();
        let config = sample("gpt-5");

        let written = store.save_current(&config).expect("save succeeds");

        assert_eq!(written, DEFAULT_PROFILE);
        assert_eq!(store.current_name().expect("pointer set"), DEFAULT_PROFILE);
        assert_eq!(store.load_current("dev").expect("load succeeds"), config);
    }

    #[test]
    fn saved_document_is_pretty_printed() {
        let (_temp, store) = store();
        store.save("work", &sample("gpt-5")).expect("save succeeds");
        let raw = fs::read_to_string(store.profile_path("work")).expect("can read");
        assert!(raw.contains("\n  \"deployment\": \"gpt-5\""), "{raw}");
    }

    #[test]
    fn load_reports_missing_and_malformed_as_not_found() {
        let (_temp, store) = store();
        assert!(matches!(
            store.load("ghost"),
            Err(ProfileError::NotFound { name, .. }) if name == "ghost"
        ));

        fs::write(store.profile_path("broken"), "{ not json").expect("can write");
        match store.load("broken") {
            Err(ProfileError::NotFound { detail, .. }) => {
                assert!(detail.contains("malformed"), "{detail}")
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn legacy_file_migrates_once_into_default() {
        let (temp, store) = store();
        let legacy = temp.path().join(LEGACY_ENV_FILE);
        fs::write(
            &legacy,
            "CODZURE_SUBSCRIPTION=s1\nCODZURE_GROUP=g1\nCODZURE_RESOURCE=r1\nCODZURE_LOCATION=l1\nCODZURE_DEPLOYMENT=d1\nJUNK=1\n",
        )
        .expect("can write legacy file");

        let loaded = store.load_current("1.0.0").expect("migration succeeds");

        assert_eq!(
            loaded,
            ProfileConfig {
                subscription: "s1".into(),
                group: "g1".into(),
                resource: "r1".into(),
                location: "l1".into(),
                deployment: "d1".into(),
                ..ProfileConfig::default()
            }
        );
        assert!(!legacy.exists(), "legacy file must be archived");
        assert!(store.legacy_backup_path().exists());
        assert_eq!(store.current_name().expect("pointer set"), DEFAULT_PROFILE);

        assert!(!store.migrate_legacy().expect("second run succeeds"));
        assert_eq!(store.load_current("1.0.0").expect("reload"), loaded);
    }

    #[test]
    fn legacy_file_is_left_alone_when_default_exists() {
        let (temp, store) = store();
        store.save(DEFAULT_PROFILE, &sample("kept")).expect("save");
        store.set_current_name(DEFAULT_PROFILE).expect("pointer");
        let legacy = temp.path().join(LEGACY_ENV_FILE);
        fs::write(&legacy, "CODZURE_DEPLOYMENT=legacy\n").expect("can write");

        let loaded = store.load_current("dev").expect("load succeeds");

        assert_eq!(loaded.deployment, "kept");
        assert!(legacy.exists());
    }

    #[test]
    fn switch_requires_existing_document() {
        let (_temp, store) = store();
        store.save("a", &sample("model-a")).expect("save a");
        store.save("b", &sample("model-b")).expect("save b");
        store.set_current_name("a").expect("pointer");

        assert!(matches!(
            store.switch("missing"),
            Err(ProfileError::NotFound { .. })
        ));
        assert_eq!(store.current_name().expect("unchanged"), "a");

        store.switch("b").expect("switch succeeds");
        assert_eq!(store.current_name().expect("pointer"), "b");
        assert_eq!(
            store.load_current("dev").expect("load").deployment,
            "model-b"
        );
    }

    #[test]
    fn deleting_current_profile_touches_nothing() {
        let (temp, store) = store();
        store.save_current(&sample("gpt-5")).expect("save");
        let before = snapshot(temp.path());

        assert!(matches!(
            store.delete(DEFAULT_PROFILE),
            Err(ProfileError::DeleteCurrent(name)) if name == DEFAULT_PROFILE
        ));
        assert_eq!(snapshot(temp.path()), before);
    }

    #[test]
    fn delete_removes_other_profiles() {
        let (_temp, store) = store();
        store.save_current(&sample("gpt-5")).expect("save");
        store.save("scratch", &sample("x")).expect("save scratch");

        store.delete("scratch").expect("delete succeeds");

        assert!(!store.exists("scratch"));
        assert!(matches!(
            store.delete("scratch"),
            Err(ProfileError::NotFound { .. })
        ));
    }

    #[test]
    fn rename_moves_pointer_and_refuses_overwrite() {
        let (_temp, store) = store();
        store.save_current(&sample("gpt-5")).expect("save");
        store.save("other", &sample("x")).expect("save other");

        assert!(matches!(
            store.rename(DEFAULT_PROFILE, "other"),
            Err(ProfileError::AlreadyExists(_))
        ));

        store.rename(DEFAULT_PROFILE, "work").expect("rename succeeds");
        assert_eq!(store.current_name().expect("pointer"), "work");
        assert!(!store.exists(DEFAULT_PROFILE));
        assert_eq!(store.load("work").expect("load").deployment, "gpt-5");
    }

    #[test]
    fn copy_duplicates_document() {
        let (_temp, store) = store();
        store.save("src", &sample("gpt-5")).expect("save");

        store.copy("src", "dst").expect("copy succeeds");

        assert_eq!(
            store.load("dst").expect("load dst"),
            store.load("src").expect("load src")
        );
        assert!(matches!(
            store.copy("src", "dst"),
            Err(ProfileError::AlreadyExists(_))
        ));
    }

    #[test]
    fn list_marks_current_profile() {
        let (_temp, store) = store();
        store.save("zeta", &sample("z")).expect("save");
        store.save("alpha", &sample("a")).expect("save");
        store.set_current_name("zeta").expect("pointer");

        let entries = store.list().expect("list succeeds");

        assert_eq!(
            entries,
            vec![
                ProfileEntry {
                    name: "alpha".into(),
                    current: false
                },
                ProfileEntry {
                    name: "zeta".into(),
                    current: true
                },
            ]
        );
    }

    #[test]
    fn unsafe_names_are_rejected() {
        let (_temp, store) = store();
        assert!(matches!(
            store.save("../escape", &sample("x")),
            Err(ProfileError::InvalidProfileName { .. })
        ));
        assert!(matches!(
            store.switch("a/b"),
            Err(ProfileError::InvalidProfileName { .. })
        ));
    }
}
