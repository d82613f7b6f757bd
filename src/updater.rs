//! Release checks against GitHub and in-place self-update.
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use semver::Version;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::lib::{
    errors::UpdateError,
    fs::{compute_sha256, extract_from_tar_gz, extract_from_zip},
};

/// Version string of builds made without a release tag.
pub const DEV_VERSION: &str = "dev";
const GITHUB_API: &str = "https://api.github.com";
const CHECKSUMS_ASSET: &str = "checksums.txt";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Result of `manage update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    AlreadyCurrent(String),
    Updated { from: String, to: String },
}

/// Release archive name for a Rust `(OS, ARCH)` pair, if one is published.
pub fn asset_name(os: &str, arch: &str) -> Option<String> {
    let os_name = match os {
        "macos" => "darwin",
        "linux" => "linux",
        "windows" => "windows",
        _ => return None,
    };
    let arch_name = match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        _ => return None,
    };
    let extension = if os == "windows" { "zip" } else { "tar.gz" };
    Some(format!("codezure_{os_name}_{arch_name}.{extension}"))
}

pub fn binary_name(os: &str) -> &'static str {
    if os == "windows" {
        "codezure.exe"
    } else {
        "codezure"
    }
}

/// True when `latest` should replace `current`.
///
/// Both sides are compared as semver with a leading `v` stripped; tags that
/// are not semver fall back to plain inequality.
pub fn is_newer(latest: &str, current: &str) -> bool {
    let latest = latest.trim().trim_start_matches('v');
    let current = current.trim().trim_start_matches('v');
    if latest.is_empty() {
        return false;
    }
    match (Version::parse(latest), Version::parse(current)) {
        (Ok(latest), Ok(current)) => latest > current,
        _ => latest != current,
    }
}

/// Find the SHA-256 for `asset` in a `sha256sum`-style listing.
pub fn parse_checksum(listing: &str, asset: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let digest = parts.next()?;
        let name = parts.next()?.trim_start_matches('*');
        (name == asset).then(|| digest.to_ascii_lowercase())
    })
}

/// Two-line stderr notice printed by the background check.
pub fn update_notice(latest: &str, current: &str) -> String {
    format!(
        "\n⚠️  New version available: {latest} (current: {current})\n   Run 'codezure manage update' to upgrade\n"
    )
}

pub struct Updater {
    client: reqwest::Client,
    repository: String,
    version: String,
}

impl Updater {
    pub fn new(repository: &str, version: &str) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("codezure/{version}"))
            .build()?;
        Ok(Self {
            client,
            repository: repository.to_string(),
            version: version.to_string(),
        })
    }

    pub async fn latest_release(&self) -> Result<Release, UpdateError> {
        let url = format!("{GITHUB_API}/repos/{}/releases/latest", self.repository);
        debug!(target: "codezure::updater", url = %url, "Fetching latest release");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UpdateError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Newer release tag, if any. Development builds never check.
    pub async fn check(&self) -> Result<Option<String>, UpdateError> {
        if self.version == DEV_VERSION {
            return Ok(None);
        }
        let release = self.latest_release().await?;
        Ok(is_newer(&release.tag_name, &self.version).then_some(release.tag_name))
    }

    /// Download the platform archive and replace the running executable.
    pub async fn update(&self) -> Result<UpdateOutcome, UpdateError> {
        if self.version == DEV_VERSION {
            return Err(UpdateError::DevelopmentBuild);
        }
        let release = self.latest_release().await?;
        if !is_newer(&release.tag_name, &self.version) {
            return Ok(UpdateOutcome::AlreadyCurrent(self.version.clone()));
        }

        let (os, arch) = (env::consts::OS, env::consts::ARCH);
        let no_asset = || UpdateError::NoAsset {
            os: os.to_string(),
            arch: arch.to_string(),
        };
        let name = asset_name(os, arch).ok_or_else(no_asset)?;
        let asset = release.asset(&name).ok_or_else(no_asset)?;

        let current_exe = env::current_exe().map_err(|source| UpdateError::io("current executable", source))?;
        let install_dir = current_exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let staging = tempfile::Builder::new()
            .prefix(".codezure-update-")
            .tempdir_in(&install_dir)
            .map_err(|source| UpdateError::io(&install_dir, source))?;

        info!(target: "codezure::updater", asset = %name, tag = %release.tag_name, "Downloading release");
        let archive = staging.path().join(&name);
        self.download(&asset.browser_download_url, &archive).await?;
        self.verify_checksum(&release, &name, &archive).await?;

        let extracted_dir = staging.path().join("extracted");
        let binary = binary_name(os);
        let extracted = if name.ends_with(".zip") {
            extract_from_zip(&archive, binary, &extracted_dir)?
        } else {
            extract_from_tar_gz(&archive, binary, &extracted_dir)?
        };
        replace_executable(&extracted, &current_exe)?;

        info!(target: "codezure::updater", from = %self.version, to = %release.tag_name, "Updated executable");
        Ok(UpdateOutcome::Updated {
            from: self.version.clone(),
            to: release.tag_name,
        })
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<(), UpdateError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(UpdateError::Status(response.status().as_u16()));
        }
        let body = response.bytes().await?;
        fs::write(destination, &body).map_err(|source| UpdateError::io(destination, source))
    }

    /// Verify against `checksums.txt` when the release publishes one.
    async fn verify_checksum(
        &self,
        release: &Release,
        asset: &str,
        archive: &Path,
    ) -> Result<(), UpdateError> {
        let Some(checksums) = release.asset(CHECKSUMS_ASSET) else {
            warn!(target: "codezure::updater", "Release has no checksums.txt; skipping verification");
            return Ok(());
        };
        let response = self.client.get(&checksums.browser_download_url).send().await?;
        if !response.status().is_success() {
            return Err(UpdateError::Status(response.status().as_u16()));
        }
        let listing = response.text().await?;
        let actual = compute_sha256(archive)?;
        match parse_checksum(&listing, asset) {
            Some(expected) if expected == actual => Ok(()),
            expected => Err(UpdateError::ChecksumMismatch {
                asset: asset.to_string(),
                expected: expected.unwrap_or_else(|| "no entry in checksums.txt".to_string()),
                actual,
            }),
        }
    }
}

/// Move `new_binary` over `current`. Windows cannot overwrite a running
/// executable, so the old one is parked at `<current>.old` first.
pub fn replace_executable(new_binary: &Path, current: &Path) -> Result<(), UpdateError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(new_binary, fs::Permissions::from_mode(0o755))
            .map_err(|source| UpdateError::io(new_binary, source))?;
    }

    if cfg!(windows) {
        let mut parked = current.as_os_str().to_owned();
        parked.push(".old");
        let parked = PathBuf::from(parked);
        fs::rename(current, &parked).map_err(|source| UpdateError::io(current, source))?;
        if let Err(source) = fs::rename(new_binary, current) {
            let _ = fs::rename(&parked, current);
            return Err(UpdateError::io(current, source));
        }
        let _ = fs::remove_file(&parked);
        return Ok(());
    }

    fs::rename(new_binary, current).map_err(|source| UpdateError::io(current, source))
}

/// Detached release check; prints a notice on stderr when a newer tag exists.
///
/// Returns `None` for development builds. Failures are logged at debug level.
pub fn spawn_update_check(repository: String, version: String) -> Option<JoinHandle<()>> {
    if version == DEV_VERSION {
        return None;
    }
    Some(tokio::spawn(async move {
        let updater = match Updater::new(&repository, &version) {
            Ok(updater) => updater,
            Err(err) => {
                debug!(target: "codezure::updater", error = %err, "Update check skipped");
                return;
            }
        };
        match updater.check().await {
            Ok(Some(latest)) => eprint!("{}", update_notice(&latest, &version)),
            Ok(None) => {}
            Err(err) => debug!(target: "codezure::updater", error = %err, "Update check failed"),
        }
    }))
}
