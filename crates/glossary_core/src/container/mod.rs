//! Resource-container access.
//!
//! # Responsibility
//! - Open scripture resource-container zips and read their manifest.
//! - Read project (book) files on demand.
//!
//! # Invariants
//! - The manifest lives at the archive root or exactly one directory deep.
//! - Project paths are resolved relative to the manifest's directory.
//! - The zip is reopened per read; a `ResourceContainer` holds no file handle.

pub mod manifest;
pub mod usfm;
pub mod workbook;

use crate::model::reference::VerseRef;
use manifest::{Manifest, Project};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use usfm::UsfmError;
use zip::ZipArchive;

const MANIFEST_FILE_NAME: &str = "manifest.yaml";

pub type ContainerResult<T> = Result<T, ContainerError>;

/// Resource-container access error.
#[derive(Debug)]
pub enum ContainerError {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
    MissingManifest(PathBuf),
    InvalidManifest(String),
    ProjectNotFound(String),
    ChapterNotFound { book: String, chapter: u32 },
    VerseNotFound(VerseRef),
    Usfm { project: String, source: UsfmError },
}

impl Display for ContainerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Zip(err) => write!(f, "invalid container archive: {err}"),
            Self::MissingManifest(path) => {
                write!(f, "container `{}` has no manifest.yaml", path.display())
            }
            Self::InvalidManifest(message) => write!(f, "invalid container manifest: {message}"),
            Self::ProjectNotFound(slug) => write!(f, "book not found: {slug}"),
            Self::ChapterNotFound { book, chapter } => {
                write!(f, "chapter not found: {book} {chapter}")
            }
            Self::VerseNotFound(location) => write!(f, "verse not found: {location}"),
            Self::Usfm { project, source } => write!(f, "invalid usfm in `{project}`: {source}"),
        }
    }
}

impl Error for ContainerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Zip(err) => Some(err),
            Self::Usfm { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ContainerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<zip::result::ZipError> for ContainerError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Zip(value)
    }
}

/// An opened resource-container zip.
#[derive(Debug, Clone)]
pub struct ResourceContainer {
    path: PathBuf,
    /// Directory prefix of `manifest.yaml` inside the archive, `""` or `"dir/"`.
    root: String,
    manifest: Manifest,
}

impl ResourceContainer {
    /// Opens the archive and parses its manifest.
    pub fn open(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut archive = open_archive(&path)?;

        let manifest_name = archive
            .file_names()
            .filter(|name| is_manifest_entry(name))
            .min_by_key(|name| name.len())
            .map(str::to_string)
            .ok_or_else(|| ContainerError::MissingManifest(path.clone()))?;
        let root = manifest_name
            .strip_suffix(MANIFEST_FILE_NAME)
            .unwrap_or_default()
            .to_string();

        let source = read_entry(&mut archive, &manifest_name)?;
        let manifest =
            Manifest::parse(&source).map_err(|err| ContainerError::InvalidManifest(err.to_string()))?;

        Ok(Self {
            path,
            root,
            manifest,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Language slug declared by the manifest.
    pub fn language_slug(&self) -> &str {
        &self.manifest.dublin_core.language.identifier
    }

    /// Resource type declared by the manifest, e.g. `ulb`.
    pub fn resource_kind(&self) -> &str {
        &self.manifest.dublin_core.identifier
    }

    pub fn version(&self) -> &str {
        &self.manifest.dublin_core.version
    }

    pub fn project(&self, slug: &str) -> ContainerResult<&Project> {
        self.manifest
            .project(slug)
            .ok_or_else(|| ContainerError::ProjectNotFound(slug.to_string()))
    }

    /// Reads one project's raw USFM text.
    pub fn read_project(&self, project: &Project) -> ContainerResult<String> {
        let mut archive = open_archive(&self.path)?;
        let entry = format!("{}{}", self.root, project.relative_path());
        read_entry(&mut archive, &entry)
    }
}

fn open_archive(path: &Path) -> ContainerResult<ZipArchive<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

fn read_entry(
    archive: &mut ZipArchive<BufReader<File>>,
    name: &str,
) -> ContainerResult<String> {
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

fn is_manifest_entry(name: &str) -> bool {
    match name.strip_suffix(MANIFEST_FILE_NAME) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('/') && prefix.matches('/').count() == 1,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_manifest_entry;

    #[test]
    fn manifest_entry_is_root_or_one_level_deep() {
        assert!(is_manifest_entry("manifest.yaml"));
        assert!(is_manifest_entry("en_ulb/manifest.yaml"));
        assert!(!is_manifest_entry("a/b/manifest.yaml"));
        assert!(!is_manifest_entry("en_ulb/old_manifest.yaml"));
    }
}
