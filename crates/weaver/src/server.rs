use crate::backend::BackendOptions;
use crate::config::StoreOptions;
use crate::pipeline::{validate_files, GeneratedProject, Pipeline};
use crate::prelude::{eprintln, *};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use weaver_core::package::PackageMode;
use weaver_core::project::{DeployConfig, GenerationRequest, ProjectFileSet};
use weaver_core::store::StoredProject;
use weaver_core::validate::ValidationResult;

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "WEAVER_PORT", default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "WEAVER_HOST", default_value = "127.0.0.1")]
    host: String,

    #[clap(flatten)]
    backend: BackendOptions,

    #[clap(flatten)]
    store: StoreOptions,
}

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Raw,
    Base64,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    mode: PackageMode,
    #[serde(default)]
    encoding: Encoding,
}

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    files: ProjectFileSet,
    #[serde(default)]
    deploy: Option<DeployConfig>,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/sessions/{session_id}/latest", get(latest_handler))
        .route("/api/projects/{project_id}/download", get(download_handler))
        .route("/api/validate", post(validate_handler))
        .layer(cors)
        .with_state(AppState { pipeline })
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let pipeline = Arc::new(crate::config::pipeline(&options.backend, &options.store)?);
    let addr = format!("{}:{}", options.host, options.port);

    if global.verbose {
        eprintln!("Starting weaver API on http://{}", addr);
        eprintln!("Generate endpoint: POST http://{}/api/generate", addr);
        eprintln!("Validate endpoint: POST http://{}/api/validate", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("listening on {addr}");

    axum::serve(listener, router(pipeline))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

async fn generate_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> std::result::Result<Json<GeneratedProject>, Error> {
    let Json(request) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    Ok(Json(state.pipeline.generate(request).await?))
}

async fn latest_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<StoredProject>, Error> {
    Ok(Json(state.pipeline.latest(&session_id)?))
}

async fn download_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> std::result::Result<Response, Error> {
    let artifact = state.pipeline.download(&project_id, query.mode)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        artifact.file_name(&project_id)
    );

    let response = match query.encoding {
        Encoding::Raw => (
            [
                (header::CONTENT_TYPE, artifact.content_type().to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            artifact.bytes,
        )
            .into_response(),
        Encoding::Base64 => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string())],
            artifact.to_base64(),
        )
            .into_response(),
    };

    Ok(response)
}

async fn validate_handler(
    payload: std::result::Result<Json<ValidateBody>, JsonRejection>,
) -> std::result::Result<Json<ValidationResult>, Error> {
    let Json(body) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    Ok(Json(validate_files(&body.files, body.deploy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::{FakeBackend, COFFEE_SHOP_RESPONSE};
    use crate::builder::ProjectSpecBuilder;
    use axum::http::StatusCode;
    use base64::Engine;
    use std::time::Duration;
    use weaver_core::store::MemoryStore;

    fn state(response: &str) -> AppState {
        AppState {
            pipeline: Arc::new(Pipeline::new(
                ProjectSpecBuilder::new(
                    Arc::new(FakeBackend::replying(response)),
                    Duration::from_secs(1),
                ),
                Arc::new(MemoryStore::new()),
            )),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn generate(state: &AppState, prompt: &str) -> GeneratedProject {
        generate_handler(
            State(state.clone()),
            Ok(Json(GenerationRequest::new("s1", prompt))),
        )
        .await
        .unwrap()
        .0
    }

    // ====================================================================
    // POST /api/generate
    // ====================================================================

    #[tokio::test]
    async fn test_generate_returns_project() {
        let state = state(COFFEE_SHOP_RESPONSE);
        let project = generate(&state, "landing page for a coffee shop").await;

        assert_eq!(project.session_id, "s1");
        assert!(project.files.get("index.html").is_some());
    }

    #[tokio::test]
    async fn test_generate_rejection_is_422_with_errors() {
        let state = state(r#"{"files": {"../x.html": "x", "index.html": "<html></html>"}}"#);

        let err = generate_handler(
            State(state),
            Ok(Json(GenerationRequest::new("s1", "site"))),
        )
        .await
        .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let errors = body["errors"].as_array().unwrap();
        assert!(errors
            .iter()
            .any(|e| e["rule"] == "invalid_path" && e["path"] == "../x.html"));
        assert_eq!(body["used_fallback"], false);
    }

    #[tokio::test]
    async fn test_generate_empty_prompt_is_400() {
        let state = state(COFFEE_SHOP_RESPONSE);

        let err = generate_handler(State(state), Ok(Json(GenerationRequest::new("s1", "  "))))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    // ====================================================================
    // GET /api/sessions/{session_id}/latest
    // ====================================================================

    #[tokio::test]
    async fn test_latest_after_generate() {
        let state = state(COFFEE_SHOP_RESPONSE);
        let project = generate(&state, "landing page for a coffee shop").await;

        let Json(latest) = latest_handler(State(state), Path("s1".to_string()))
            .await
            .unwrap();

        assert_eq!(latest.project_id, project.project_id);
    }

    #[tokio::test]
    async fn test_latest_unknown_session_is_404() {
        let state = state(COFFEE_SHOP_RESPONSE);

        let err = latest_handler(State(state), Path("nobody".to_string()))
            .await
            .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].is_string());
    }

    // ====================================================================
    // GET /api/projects/{project_id}/download
    // ====================================================================

    #[tokio::test]
    async fn test_download_mapping_raw() {
        let state = state(COFFEE_SHOP_RESPONSE);
        let project = generate(&state, "landing page for a coffee shop").await;

        let response = download_handler(
            State(state),
            Path(project.project_id.clone()),
            Query(DownloadQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_json(response).await, project.files);
    }

    #[tokio::test]
    async fn test_download_archive_base64() {
        let state = state(COFFEE_SHOP_RESPONSE);
        let project = generate(&state, "landing page for a coffee shop").await;

        let response = download_handler(
            State(state),
            Path(project.project_id),
            Query(DownloadQuery {
                mode: PackageMode::Archive,
                encoding: Encoding::Base64,
            }),
        )
        .await
        .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&bytes)
            .unwrap();
        // gzip magic
        assert_eq!(&decoded[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn test_download_unknown_is_404() {
        let state = state(COFFEE_SHOP_RESPONSE);

        let err = download_handler(
            State(state),
            Path("0123456789abcdef".to_string()),
            Query(DownloadQuery::default()),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    // ====================================================================
    // POST /api/validate
    // ====================================================================

    #[tokio::test]
    async fn test_validate_reports_missing_handler() {
        let body: ValidateBody = serde_json::from_value(serde_json::json!({
            "files": {
                "index.html": "<html></html>",
                "netlify.toml": "[build]\npublish = \".\"\nfunctions = \"netlify/functions\"\n",
                "package.json": "{}",
                "netlify/functions/contact.js": "module.exports = {};"
            }
        }))
        .unwrap();

        let Json(result) = validate_handler(Ok(Json(body))).await.unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "invalid");
        assert_eq!(value["errors"][0]["rule"], "missing_handler");
        assert_eq!(value["errors"][0]["path"], "netlify/functions/contact.js");
    }
}
