use crate::project::ProjectFileSet;

/// Merge generated output into a prior project.
///
/// Generated entries overwrite prior ones, prior entries missing from the
/// output are retained, and an empty-string entry deletes the path.
pub fn merge_edit(prior: &ProjectFileSet, generated: ProjectFileSet) -> ProjectFileSet {
    let mut merged = prior.clone();

    for (path, content) in generated {
        if content.is_deletion_marker() {
            merged.remove(&path);
        } else {
            merged.insert(path, content);
        }
    }

    merged
}

/// Drop deletion markers from a freshly generated project.
pub fn strip_deletion_markers(generated: ProjectFileSet) -> ProjectFileSet {
    generated
        .into_iter()
        .filter(|(_, content)| !content.is_deletion_marker())
        .collect()
}

/// Lay `top` over `base`; entries of `top` win.
pub fn overlay(base: ProjectFileSet, top: &ProjectFileSet) -> ProjectFileSet {
    let mut merged = base;
    for (path, content) in top.iter() {
        merged.insert(path.clone(), content.clone());
    }
    merged
}
