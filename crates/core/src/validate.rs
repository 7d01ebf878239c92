//! Deployability rules for generated projects.
//!
//! [`validate`] is a pure classifier: it borrows the file-set and deploy
//! configuration, runs every rule, and reports every violation at once so a
//! caller can fix all of them in one round-trip. [`accept`] wraps a passing
//! project in [`ValidatedProject`], the only input the packager takes.

use crate::project::files::{check_path, is_under, join, normalize_dir, PathViolation};
use crate::project::{
    parse_descriptor, DeployConfig, FileContent, ProjectFileSet, DESCRIPTOR_PATH, ENTRY_POINT,
    MANIFEST_PATH,
};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HANDLER_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:module\.)?exports\.handler\s*=|export\s+(?:const|let|var)\s+handler\b|export\s+(?:async\s+)?function\s+handler\b|export\s*\{[^}]*\bhandler\b[^}]*\}",
    )
    .expect("handler export pattern is valid")
});

/// A single failed requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("invalid path '{path}': {violation}")]
    InvalidPath {
        path: String,
        violation: PathViolation,
    },

    #[error("invalid {field} '{value}': {reason}")]
    InvalidDeployPath {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing deployment descriptor '{path}'")]
    MissingDescriptor { path: String },

    #[error("malformed deployment descriptor '{path}': {reason}")]
    MalformedDescriptor { path: String, reason: String },

    #[error("missing entry point: expected one of {}", .expected.join(", "))]
    MissingEntryPoint { expected: Vec<String> },

    #[error("missing dependency manifest '{path}' required by functions in '{functions_dir}'")]
    MissingManifest { path: String, functions_dir: String },

    #[error("function '{path}' does not export a handler")]
    MissingHandler { path: String },

    #[error("invalid environment variable name '{name}'")]
    InvalidEnvVar { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "errors", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<ValidationError>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }
}

/// A project that passed validation. It cannot be mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProject {
    files: ProjectFileSet,
    deploy: DeployConfig,
}

impl ValidatedProject {
    pub fn files(&self) -> &ProjectFileSet {
        &self.files
    }

    pub fn deploy(&self) -> &DeployConfig {
        &self.deploy
    }

    pub fn into_parts(self) -> (ProjectFileSet, DeployConfig) {
        (self.files, self.deploy)
    }
}

/// Validate, then take ownership of a passing project.
pub fn accept(
    files: ProjectFileSet,
    deploy: DeployConfig,
) -> Result<ValidatedProject, Vec<ValidationError>> {
    match validate(&files, &deploy) {
        ValidationResult::Valid => Ok(ValidatedProject { files, deploy }),
        ValidationResult::Invalid(errors) => Err(errors),
    }
}

/// Run every rule and collect all violations.
pub fn validate(files: &ProjectFileSet, deploy: &DeployConfig) -> ValidationResult {
    let mut errors = Vec::new();

    for path in files.paths() {
        if let Some(violation) = check_path(path) {
            errors.push(ValidationError::InvalidPath {
                path: path.to_string(),
                violation,
            });
        }
    }

    let publish_dir = checked_dir("publish_dir", &deploy.publish_dir, true, &mut errors);
    let functions_dir = deploy
        .functions_dir
        .as_deref()
        .and_then(|dir| checked_dir("functions_dir", dir, false, &mut errors));

    check_required_files(files, publish_dir, functions_dir, &mut errors);
    check_descriptor_shape(files, &mut errors);

    if let Some(dir) = functions_dir {
        check_handlers(files, dir, &mut errors);
    }

    for name in deploy.environment_variables.keys() {
        if !is_env_var_name(name) {
            errors.push(ValidationError::InvalidEnvVar { name: name.clone() });
        }
    }

    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(errors)
    }
}

/// Normalize a configured directory, recording an error when it is unusable.
fn checked_dir<'a>(
    field: &str,
    value: &'a str,
    root_allowed: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a str> {
    let dir = normalize_dir(value);

    let reason = if dir.is_empty() {
        (!root_allowed).then(|| "must not be the project root".to_string())
    } else {
        check_path(dir).map(|violation| violation.to_string())
    };

    match reason {
        Some(reason) => {
            errors.push(ValidationError::InvalidDeployPath {
                field: field.to_string(),
                value: value.to_string(),
                reason,
            });
            None
        }
        None => Some(dir),
    }
}

fn check_required_files(
    files: &ProjectFileSet,
    publish_dir: Option<&str>,
    functions_dir: Option<&str>,
    errors: &mut Vec<ValidationError>,
) {
    if !files.contains(DESCRIPTOR_PATH) {
        errors.push(ValidationError::MissingDescriptor {
            path: DESCRIPTOR_PATH.to_string(),
        });
    }

    let mut expected = vec![ENTRY_POINT.to_string()];
    if let Some(dir) = publish_dir.filter(|dir| !dir.is_empty()) {
        expected.push(join(dir, ENTRY_POINT));
    }
    if !expected.iter().any(|path| files.contains(path)) {
        errors.push(ValidationError::MissingEntryPoint { expected });
    }

    if let Some(dir) = functions_dir {
        if files.paths_under(dir).next().is_some() && !files.contains(MANIFEST_PATH) {
            errors.push(ValidationError::MissingManifest {
                path: MANIFEST_PATH.to_string(),
                functions_dir: dir.to_string(),
            });
        }
    }
}

fn check_descriptor_shape(files: &ProjectFileSet, errors: &mut Vec<ValidationError>) {
    let Some(content) = files.get(DESCRIPTOR_PATH) else {
        return;
    };

    let reason = match content {
        FileContent::Binary(_) => Some("descriptor must be text".to_string()),
        FileContent::Text(text) => parse_descriptor(text)
            .err()
            .map(|e| e.message().trim().to_string()),
    };

    if let Some(reason) = reason {
        errors.push(ValidationError::MalformedDescriptor {
            path: DESCRIPTOR_PATH.to_string(),
            reason,
        });
    }
}

fn check_handlers(files: &ProjectFileSet, functions_dir: &str, errors: &mut Vec<ValidationError>) {
    for (path, content) in files.iter() {
        if !is_under(path, functions_dir) {
            continue;
        }

        let exported = content
            .as_text()
            .is_some_and(|text| HANDLER_EXPORT.is_match(text));

        if !exported {
            errors.push(ValidationError::MissingHandler { path: path.clone() });
        }
    }
}

fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
