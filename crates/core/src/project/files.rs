use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Content of a single project file.
///
/// Text is stored as UTF-8. Binary payloads are tagged explicitly so that no
/// encoder ever attempts to transcode them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    pub fn text(content: impl Into<String>) -> Self {
        FileContent::Text(content.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(text) => Some(text),
            FileContent::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Binary(bytes) => bytes,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, FileContent::Binary(_))
    }

    /// Empty text content marks a path for deletion in edit mode.
    pub fn is_deletion_marker(&self) -> bool {
        matches!(self, FileContent::Text(text) if text.is_empty())
    }
}

impl From<&str> for FileContent {
    fn from(value: &str) -> Self {
        FileContent::Text(value.to_string())
    }
}

impl From<String> for FileContent {
    fn from(value: String) -> Self {
        FileContent::Text(value)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(value: Vec<u8>) -> Self {
        FileContent::Binary(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FileContentRepr {
    Text(String),
    Binary { base64: String },
}

impl Serialize for FileContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            FileContent::Text(text) => FileContentRepr::Text(text.clone()),
            FileContent::Binary(bytes) => FileContentRepr::Binary {
                base64: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FileContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match FileContentRepr::deserialize(deserializer)? {
            FileContentRepr::Text(text) => Ok(FileContent::Text(text)),
            FileContentRepr::Binary { base64 } => base64::engine::general_purpose::STANDARD
                .decode(base64.as_bytes())
                .map(FileContent::Binary)
                .map_err(|e| serde::de::Error::custom(format!("invalid base64 payload: {e}"))),
        }
    }
}

/// Mapping from relative, forward-slash separated paths to file content.
///
/// Keys are unique and kept in lexicographic order, which is the order every
/// consumer (validator, packager, prompt builder) walks them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectFileSet(BTreeMap<String, FileContent>);

impl ProjectFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<FileContent>) {
        self.0.insert(path.into(), content.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<FileContent> {
        self.0.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&FileContent> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileContent)> {
        self.0.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Paths that live under `dir` (a normalized relative directory).
    pub fn paths_under<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.paths().filter(move |path| is_under(path, dir))
    }
}

impl<P: Into<String>, C: Into<FileContent>> FromIterator<(P, C)> for ProjectFileSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        ProjectFileSet(
            iter.into_iter()
                .map(|(path, content)| (path.into(), content.into()))
                .collect(),
        )
    }
}

impl IntoIterator for ProjectFileSet {
    type Item = (String, FileContent);
    type IntoIter = std::collections::btree_map::IntoIter<String, FileContent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Why a path cannot be part of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathViolation {
    Empty,
    Absolute,
    Backslash,
    EmptySegment,
    CurrentDir,
    ParentTraversal,
}

impl std::fmt::Display for PathViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            PathViolation::Empty => "path is empty",
            PathViolation::Absolute => "path must be relative",
            PathViolation::Backslash => "path must use forward slashes",
            PathViolation::EmptySegment => "path contains an empty segment",
            PathViolation::CurrentDir => "path contains a '.' segment",
            PathViolation::ParentTraversal => "path contains a '..' segment",
        };
        f.write_str(reason)
    }
}

/// Check a project path against the structural rules.
///
/// Traversal is reported ahead of the other violations so that a path like
/// `/../etc` is always flagged as escaping the root.
pub fn check_path(path: &str) -> Option<PathViolation> {
    if path.is_empty() {
        return Some(PathViolation::Empty);
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Some(PathViolation::ParentTraversal);
    }
    if path.starts_with('/') || has_drive_prefix(path) {
        return Some(PathViolation::Absolute);
    }
    if path.contains('\\') {
        return Some(PathViolation::Backslash);
    }
    if path.split('/').any(str::is_empty) {
        return Some(PathViolation::EmptySegment);
    }
    // `a/./b` would alias `a/b` once written to disk or an archive.
    if path.split('/').any(|segment| segment == ".") {
        return Some(PathViolation::CurrentDir);
    }
    None
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Normalize a configured directory: strip `./` prefixes and trailing slashes.
///
/// The project root normalizes to the empty string.
pub fn normalize_dir(dir: &str) -> &str {
    let mut dir = dir.trim();
    while let Some(rest) = dir.strip_prefix("./") {
        dir = rest;
    }
    let dir = dir.trim_end_matches('/');
    if dir == "." {
        ""
    } else {
        dir
    }
}

/// Whether `path` sits inside the normalized directory `dir`.
pub fn is_under(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Join a normalized directory and a file name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
