//! Pure steps of project building.
//!
//! The shell calls the generation backend and hands its result to
//! [`assemble`], which either turns the response into a file-set plus deploy
//! configuration or falls back to the static template. Nothing here performs
//! I/O; backend failures arrive as values and are absorbed.

pub mod extract;
pub mod fallback;
pub mod images;
pub mod merge;
pub mod prompt;

pub use extract::{parse_generation, GeneratedOutput};
pub use fallback::fallback_template;
pub use images::{extract_keywords, image_context, ImageContext};
pub use merge::{merge_edit, overlay, strip_deletion_markers};
pub use prompt::{build_prompt, SYSTEM_PROMPT};

use crate::project::{
    files::normalize_dir, parse_descriptor, parse_env_example, render_descriptor,
    render_env_example, DeployConfig, FileContent, GenerationRequest, ProjectFileSet,
    DEFAULT_FUNCTIONS_DIR, DESCRIPTOR_PATH, ENV_EXAMPLE_PATH,
};
use serde::Serialize;

/// Failure of the external generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GenerationBackendError {
    #[error("generation timed out after {0}s")]
    Timeout(u64),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Result of the build step, ready for validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub files: ProjectFileSet,
    pub deploy: DeployConfig,
    pub used_fallback: bool,
    /// The absorbed backend failure when the fallback template was used.
    pub backend_error: Option<GenerationBackendError>,
}

/// Turn a backend result into a candidate project.
///
/// Malformed responses and backend errors both take the fallback branch. In
/// edit mode the fallback keeps the prior project laid over the template.
pub fn assemble(
    request: &GenerationRequest,
    response: Result<String, GenerationBackendError>,
) -> BuildOutcome {
    match response.and_then(|text| parse_generation(&text)) {
        Ok(output) => from_output(request, output),
        Err(err) => from_fallback(request, err),
    }
}

fn prior_project(request: &GenerationRequest) -> Option<&ProjectFileSet> {
    request
        .current_project
        .as_ref()
        .filter(|_| request.edit_mode)
}

fn from_output(request: &GenerationRequest, output: GeneratedOutput) -> BuildOutcome {
    let mut files = match prior_project(request) {
        Some(prior) => merge_edit(prior, output.files),
        None => strip_deletion_markers(output.files),
    };

    let deploy = output
        .deploy
        .unwrap_or_else(|| deploy_from_files(&files));

    complete_project(&mut files, &deploy);

    BuildOutcome {
        files,
        deploy,
        used_fallback: false,
        backend_error: None,
    }
}

fn from_fallback(request: &GenerationRequest, err: GenerationBackendError) -> BuildOutcome {
    let (template, template_deploy) = fallback_template(&request.prompt);

    let (files, deploy) = match prior_project(request) {
        Some(prior) => {
            let files = overlay(template, prior);
            let deploy = deploy_from_files(&files);
            (files, deploy)
        }
        None => (template, template_deploy),
    };

    BuildOutcome {
        files,
        deploy,
        used_fallback: true,
        backend_error: Some(err),
    }
}

/// Recover a deploy configuration from the files themselves.
///
/// Reads the descriptor (and `.env.example`) when present; otherwise uses the
/// defaults, dropping the functions directory when no function file exists.
pub fn deploy_from_files(files: &ProjectFileSet) -> DeployConfig {
    let parsed = files
        .get(DESCRIPTOR_PATH)
        .and_then(FileContent::as_text)
        .and_then(|text| parse_descriptor(text).ok());

    let mut deploy = match parsed {
        Some(deploy) => deploy,
        None => {
            let mut deploy = DeployConfig::default();
            if files.paths_under(DEFAULT_FUNCTIONS_DIR).next().is_none() {
                deploy.functions_dir = None;
            }
            deploy
        }
    };

    if let Some(env) = files.get(ENV_EXAMPLE_PATH).and_then(FileContent::as_text) {
        deploy.environment_variables = parse_env_example(env);
    }

    deploy
}

/// Render the descriptor and `.env.example` when the output lacks them.
fn complete_project(files: &mut ProjectFileSet, deploy: &DeployConfig) {
    if !files.contains(DESCRIPTOR_PATH) {
        if let Ok(descriptor) = render_descriptor(deploy) {
            files.insert(DESCRIPTOR_PATH, descriptor);
        }
    }

    if !deploy.environment_variables.is_empty() && !files.contains(ENV_EXAMPLE_PATH) {
        files.insert(ENV_EXAMPLE_PATH, render_env_example(deploy));
    }
}

/// Whether any file lives under the configured functions directory.
pub fn has_functions(files: &ProjectFileSet, deploy: &DeployConfig) -> bool {
    match deploy.functions_dir.as_deref().map(normalize_dir) {
        Some(dir) if !dir.is_empty() => files.paths_under(dir).next().is_some(),
        _ => false,
    }
}
