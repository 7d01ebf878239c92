//! Project directories on disk.

use crate::prelude::*;
use ignore::WalkBuilder;
use std::path::Path;
use weaver_core::project::{check_path, FileContent, ProjectFileSet};

/// Directories never read into a project.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Read every file under `root` into a file-set keyed by forward-slash
/// relative paths. UTF-8 files become text, everything else binary.
pub fn read_project(root: &Path) -> Result<ProjectFileSet> {
    if !root.is_dir() {
        return Err(eyre!("{} is not a directory", root.display()));
    }

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .require_git(false)
        .filter_entry(|entry| {
            !(entry.file_type().is_some_and(|t| t.is_dir())
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
        })
        .build();

    let mut files = ProjectFileSet::new();

    for entry in walker {
        let entry = entry.wrap_err("Failed to walk project directory")?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .wrap_err("Walked outside the project directory")?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let bytes = std::fs::read(entry.path())
            .wrap_err_with(|| f!("Failed to read {}", entry.path().display()))?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => FileContent::Text(text),
            Err(err) => FileContent::Binary(err.into_bytes()),
        };

        files.insert(key, content);
    }

    Ok(files)
}

/// Write a file-set under `root`, refusing paths that would escape it.
pub fn write_project(root: &Path, files: &ProjectFileSet) -> Result<()> {
    for path in files.paths() {
        if let Some(violation) = check_path(path) {
            return Err(eyre!("Refusing to write '{path}': {violation}"));
        }
    }

    for (path, content) in files.iter() {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| f!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, content.as_bytes())
            .wrap_err_with(|| f!("Failed to write {}", target.display()))?;
    }

    Ok(())
}
