use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use weaver_core::flow::TransitionError;
use weaver_core::package::PackagingError;
use weaver_core::project::RequestError;
use weaver_core::store::StoreError;
use weaver_core::validate::ValidationError;

#[derive(thiserror::Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Project rejected with {} validation error(s)", .errors.len())]
    Rejected {
        errors: Vec<ValidationError>,
        used_fallback: bool,
    },

    #[error("Packaging failed: {0}")]
    Packaging(#[from] PackagingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Pipeline error: {0}")]
    Transition(#[from] TransitionError),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Request(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Store(StoreError::InvalidSessionId(_) | StoreError::InvalidProjectId(_)) => {
                StatusCode::BAD_REQUEST
            }
            Error::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Packaging(_) | Error::Store(_) | Error::Transition(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Error::Rejected {
                errors,
                used_fallback,
            } => serde_json::json!({
                "error": self.to_string(),
                "errors": errors,
                "used_fallback": used_fallback,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        if status.is_server_error() {
            log::error!("{self}");
        }

        (status, Json(body)).into_response()
    }
}
