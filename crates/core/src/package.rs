//! Serialize validated projects into downloadable artifacts.
//!
//! Both encodings walk the file-set in path order with fixed encoding
//! parameters, so packaging the same project twice is byte-identical.

use crate::validate::ValidatedProject;
use base64::Engine;
use flate2::{Compression, GzBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use tar::{Builder, EntryType, Header};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageMode {
    /// JSON object of path to content.
    #[default]
    Mapping,
    /// Gzip-compressed tar archive.
    Archive,
}

impl std::str::FromStr for PackageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapping" => Ok(PackageMode::Mapping),
            "archive" => Ok(PackageMode::Archive),
            other => Err(format!("Unknown package mode: {other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error("failed to write archive entry '{path}': {source}")]
    Archive {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to finish archive: {0}")]
    Finish(#[source] std::io::Error),

    #[error("failed to serialize mapping: {0}")]
    Mapping(#[from] serde_json::Error),
}

/// Packaged project bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub mode: PackageMode,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn content_type(&self) -> &'static str {
        match self.mode {
            PackageMode::Mapping => "application/json",
            PackageMode::Archive => "application/gzip",
        }
    }

    pub fn file_name(&self, stem: &str) -> String {
        match self.mode {
            PackageMode::Mapping => format!("{stem}.json"),
            PackageMode::Archive => format!("{stem}.tar.gz"),
        }
    }

    /// For transports that cannot carry raw binary.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Package a validated project in the requested mode.
pub fn package(project: &ValidatedProject, mode: PackageMode) -> Result<Artifact, PackagingError> {
    let bytes = match mode {
        PackageMode::Mapping => serde_json::to_vec(project.files())?,
        PackageMode::Archive => archive(project)?,
    };

    Ok(Artifact { mode, bytes })
}

/// Structured path→content mapping, ready to embed in a JSON response.
pub fn to_mapping(project: &ValidatedProject) -> Result<serde_json::Value, PackagingError> {
    Ok(serde_json::to_value(project.files())?)
}

/// Content address of a project within a session: the first 16 hex
/// characters of the SHA-256 of the session id, a NUL separator and the
/// mapping encoding.
///
/// Identical files recorded by two sessions get distinct ids, so neither
/// record overwrites the other.
pub fn project_id(session_id: &str, project: &ValidatedProject) -> Result<String, PackagingError> {
    let mapping = serde_json::to_vec(project.files())?;
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(&mapping);
    let hex: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    Ok(hex[..16].to_string())
}

fn archive(project: &ValidatedProject) -> Result<Vec<u8>, PackagingError> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for (path, content) in project.files().iter() {
        let bytes = content.as_bytes();

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();

        builder
            .append_data(&mut header, path, bytes)
            .map_err(|source| PackagingError::Archive {
                path: path.clone(),
                source,
            })?;
    }

    let mut encoder = builder.into_inner().map_err(PackagingError::Finish)?;
    encoder.flush().map_err(PackagingError::Finish)?;
    encoder.finish().map_err(PackagingError::Finish)
}
