//! Request to package workflow.
//!
//! Drives one request through the flow stages: build, validate, then either
//! package and record the project or reject it with every validation error.

use crate::builder::ProjectSpecBuilder;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use weaver_core::builder::deploy_from_files;
use weaver_core::flow::{Event, Stage};
use weaver_core::package::{package, project_id, to_mapping, Artifact, PackageMode};
use weaver_core::project::{DeployConfig, GenerationRequest, ProjectFileSet};
use weaver_core::store::{validate_session_id, ProjectStore, StoredProject};
use weaver_core::validate::{accept, validate, ValidationResult};

/// Response body for a successful generation.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedProject {
    pub project_id: String,
    pub session_id: String,
    pub files: serde_json::Value,
    pub deploy: DeployConfig,
    pub created_at: DateTime<Utc>,
    pub used_fallback: bool,
}

pub struct Pipeline {
    builder: ProjectSpecBuilder,
    store: Arc<dyn ProjectStore>,
}

fn advance(stage: Stage, event: Event, session_id: &str) -> Result<Stage, Error> {
    let next = stage.advance(event)?;
    log::debug!("session={session_id} {stage:?} -> {next:?}");
    Ok(next)
}

impl Pipeline {
    pub fn new(builder: ProjectSpecBuilder, store: Arc<dyn ProjectStore>) -> Self {
        Self { builder, store }
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedProject, Error> {
        validate_session_id(&request.session_id)?;
        let session_id = request.session_id.clone();

        let stage = Stage::Requested;
        let outcome = self.builder.build(&request).await?;
        let stage = advance(stage, Event::Build, &session_id)?;

        let validated = match accept(outcome.files, outcome.deploy) {
            Ok(validated) => validated,
            Err(errors) => {
                let stage = advance(stage, Event::Validate { valid: false }, &session_id)?;
                advance(stage, Event::Reject, &session_id)?;
                log::warn!(
                    "session={session_id} project rejected with {} error(s)",
                    errors.len()
                );
                return Err(Error::Rejected {
                    errors,
                    used_fallback: outcome.used_fallback,
                });
            }
        };
        let stage = advance(stage, Event::Validate { valid: true }, &session_id)?;

        let files = to_mapping(&validated)?;
        let id = project_id(&session_id, &validated)?;
        let created_at = Utc::now();
        let (file_set, deploy) = validated.into_parts();

        self.store.put(&StoredProject {
            project_id: id.clone(),
            session_id: session_id.clone(),
            files: file_set,
            deploy: deploy.clone(),
            created_at,
            used_fallback: outcome.used_fallback,
        })?;
        advance(stage, Event::Package, &session_id)?;

        log::info!(
            "session={session_id} packaged project {id} (fallback: {})",
            outcome.used_fallback
        );

        Ok(GeneratedProject {
            project_id: id,
            session_id,
            files,
            deploy,
            created_at,
            used_fallback: outcome.used_fallback,
        })
    }

    pub fn latest(&self, session_id: &str) -> Result<StoredProject, Error> {
        self.store
            .latest(session_id)?
            .ok_or_else(|| Error::NotFound(format!("no project for session '{session_id}'")))
    }

    pub fn get(&self, project_id: &str) -> Result<StoredProject, Error> {
        self.store
            .get(project_id)?
            .ok_or_else(|| Error::NotFound(format!("unknown project '{project_id}'")))
    }

    /// Package a stored project. Stored projects are re-validated so a
    /// tampered data directory never yields an artifact.
    pub fn download(&self, project_id: &str, mode: PackageMode) -> Result<Artifact, Error> {
        let stored = self.get(project_id)?;
        let validated =
            accept(stored.files, stored.deploy).map_err(|errors| Error::Rejected {
                errors,
                used_fallback: stored.used_fallback,
            })?;
        Ok(package(&validated, mode)?)
    }
}

/// Validate a file-set, deriving the deploy configuration from its
/// descriptor when none is given.
pub fn validate_files(files: &ProjectFileSet, deploy: Option<DeployConfig>) -> ValidationResult {
    let deploy = deploy.unwrap_or_else(|| deploy_from_files(files));
    validate(files, &deploy)
}
