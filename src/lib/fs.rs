//! Utilities for the config directory and downloaded release archives.

use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use zip::ZipArchive;

use crate::lib::errors::UpdateError;

/// Write `contents` to `path` through a sibling temp file and a rename.
///
/// Creates the parent directory when missing.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Read a file to string, returning `None` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>, io::Error> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// List file stems in `dir` whose extension equals `extension`, sorted.
///
/// A missing directory yields an empty list.
pub fn list_file_stems(dir: &Path, extension: &str) -> Result<Vec<String>, io::Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut stems = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            stems.push(stem.to_string());
        }
    }
    stems.sort();
    Ok(stems)
}

/// Return the SHA256 of any file as a hex string.
pub fn compute_sha256(path: &Path) -> Result<String, UpdateError> {
    let mut file = File::open(path).map_err(|source| UpdateError::io(path, source))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|source| UpdateError::io(path, source))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Extract the regular file whose base name is `binary_name` from a `.tar.gz`
/// archive into `destination_dir`, returning the written path.
pub fn extract_from_tar_gz(
    archive: &Path,
    binary_name: &str,
    destination_dir: &Path,
) -> Result<PathBuf, UpdateError> {
    let file = File::open(archive).map_err(|source| UpdateError::io(archive, source))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    let entries = tar
        .entries()
        .map_err(|source| UpdateError::io(archive, source))?;

    for entry in entries {
        let mut entry = entry.map_err(|source| UpdateError::io(archive, source))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .map_err(|source| UpdateError::io(archive, source))?
            .file_name()
            .and_then(|name| name.to_str())
            == Some(binary_name);
        if matches {
            return write_entry(&mut entry, binary_name, destination_dir);
        }
    }

    Err(UpdateError::BinaryNotInArchive(binary_name.to_string()))
}

/// Extract the file whose base name is `binary_name` from a `.zip` archive.
pub fn extract_from_zip(
    archive: &Path,
    binary_name: &str,
    destination_dir: &Path,
) -> Result<PathBuf, UpdateError> {
    let file = File::open(archive).map_err(|source| UpdateError::io(archive, source))?;
    let mut zip = ZipArchive::new(file)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let base_name = Path::new(entry.name())
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        if base_name.as_deref() == Some(binary_name) {
            return write_entry(&mut entry, binary_name, destination_dir);
        }
    }

    Err(UpdateError::BinaryNotInArchive(binary_name.to_string()))
}

fn write_entry(
    reader: &mut impl Read,
    binary_name: &str,
    destination_dir: &Path,
) -> Result<PathBuf, UpdateError> {
    fs::create_dir_all(destination_dir)
        .map_err(|source| UpdateError::io(destination_dir, source))?;
    let target = destination_dir.join(binary_name);
    let mut out = File::create(&target).map_err(|source| UpdateError::io(&target, source))?;
    io::copy(reader, &mut out).map_err(|source| UpdateError::io(&target, source))?;
    Ok(target)
}
