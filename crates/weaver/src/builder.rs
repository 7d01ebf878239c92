use crate::backend::{BackendRequest, GenerationBackend};
use std::sync::Arc;
use std::time::Duration;
use weaver_core::builder::{
    assemble, build_prompt, image_context, BuildOutcome, GenerationBackendError, SYSTEM_PROMPT,
};
use weaver_core::project::{GenerationRequest, RequestError};

/// Turns generation requests into candidate projects.
///
/// The backend call is bounded by `timeout`; every backend failure is handed
/// to the core, which falls back to the static template.
#[derive(Clone)]
pub struct ProjectSpecBuilder {
    backend: Arc<dyn GenerationBackend>,
    timeout: Duration,
}

impl ProjectSpecBuilder {
    pub fn new(backend: Arc<dyn GenerationBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub async fn build(&self, request: &GenerationRequest) -> Result<BuildOutcome, RequestError> {
        request.check()?;

        let images = image_context(&request.prompt);
        let prompt = build_prompt(request, &images);

        log::debug!(
            "session={} model={} edit_mode={} prompt_chars={}",
            request.session_id,
            request.model,
            request.edit_mode,
            prompt.len()
        );

        let call = self.backend.generate(BackendRequest {
            model: request.model,
            system: SYSTEM_PROMPT,
            prompt: &prompt,
        });

        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GenerationBackendError::Timeout(self.timeout.as_secs())),
        };

        let outcome = assemble(request, response);

        if let Some(err) = &outcome.backend_error {
            log::warn!(
                "session={} generation failed, using fallback template: {err}",
                request.session_id
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use weaver_core::project::{FileContent, ProjectFileSet};
    use weaver_core::validate::validate;

    /// Backend that answers every call with a fixed response.
    pub struct FakeBackend {
        response: Result<String, GenerationBackendError>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub fn replying(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(err: GenerationBackendError) -> Self {
            Self {
                response: Err(err),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl GenerationBackend for FakeBackend {
        fn generate<'a>(
            &'a self,
            request: BackendRequest<'a>,
        ) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.prompt.to_string());
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    /// Backend that never answers.
    pub struct HangingBackend;

    impl GenerationBackend for HangingBackend {
        fn generate<'a>(
            &'a self,
            _request: BackendRequest<'a>,
        ) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
            Box::pin(futures::future::pending())
        }
    }

    pub const COFFEE_SHOP_RESPONSE: &str = r#"```json
{
  "files": {
    "index.html": "<!DOCTYPE html><html><head><link rel=\"stylesheet\" href=\"styles.css\"></head><body><h1>Bean There</h1><form id=\"contact\"></form><script src=\"script.js\"></script></body></html>",
    "styles.css": "body { background: #3e2723; }",
    "script.js": "fetch('/api/contact', { method: 'POST' });",
    "netlify/functions/contact.js": "exports.handler = async (event, context) => {\n  return { statusCode: 200, headers: { 'Content-Type': 'application/json' }, body: JSON.stringify({ ok: true }) };\n};\n",
    "package.json": "{\"name\": \"bean-there\", \"dependencies\": {}}"
  },
  "deploy": {
    "build_command": "",
    "publish_dir": ".",
    "functions_dir": "netlify/functions",
    "environment_variables": {"CONTACT_EMAIL": "owner@example.com"}
  }
}
```"#;

    fn builder(backend: impl GenerationBackend + 'static) -> ProjectSpecBuilder {
        ProjectSpecBuilder::new(Arc::new(backend), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_build_from_backend_response() {
        let builder = builder(FakeBackend::replying(COFFEE_SHOP_RESPONSE));
        let request = GenerationRequest::new("s1", "landing page for a coffee shop");

        let outcome = builder.build(&request).await.unwrap();

        assert!(!outcome.used_fallback);
        assert!(outcome.files.contains("index.html"));
        assert!(outcome.files.contains("netlify.toml"));
        assert!(outcome.files.contains("package.json"));
        assert!(outcome.files.contains(".env.example"));
        assert!(validate(&outcome.files, &outcome.deploy).is_valid());
    }

    #[tokio::test]
    async fn test_prompt_carries_imagery_and_request() {
        let backend = Arc::new(FakeBackend::replying(COFFEE_SHOP_RESPONSE));
        let builder = ProjectSpecBuilder::new(backend.clone(), Duration::from_secs(1));

        builder
            .build(&GenerationRequest::new("s1", "landing page for a coffee shop"))
            .await
            .unwrap();

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("source.unsplash.com"));
        assert!(prompts[0].contains("landing page for a coffee shop"));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_valid_template() {
        let builder = builder(HangingBackend);
        let request = GenerationRequest::new("s1", "landing page for a coffee shop");

        let outcome = builder.build(&request).await.unwrap();

        assert!(outcome.used_fallback);
        assert_eq!(outcome.backend_error, Some(GenerationBackendError::Timeout(0)));
        assert!(!outcome.files.is_empty());
        assert!(outcome.files.contains("index.html"));
        assert!(outcome.files.contains("netlify.toml"));
        assert!(validate(&outcome.files, &outcome.deploy).is_valid());
    }

    #[tokio::test]
    async fn test_backend_error_falls_back() {
        let builder = builder(FakeBackend::failing(GenerationBackendError::Status {
            status: 529,
            body: "overloaded".to_string(),
        }));

        let outcome = builder
            .build(&GenerationRequest::new("s1", "bakery"))
            .await
            .unwrap();

        assert!(outcome.used_fallback);
        assert!(validate(&outcome.files, &outcome.deploy).is_valid());
    }

    #[tokio::test]
    async fn test_edit_mode_merge_through_builder() {
        let prior: ProjectFileSet = [("a", "1"), ("b", "2")].into_iter().collect();
        let builder = builder(FakeBackend::replying(r#"{"files": {"b": "3", "c": "4"}}"#));
        let request = GenerationRequest::new("s1", "edit").editing(prior);

        let outcome = builder.build(&request).await.unwrap();

        assert_eq!(outcome.files.get("a"), Some(&FileContent::text("1")));
        assert_eq!(outcome.files.get("b"), Some(&FileContent::text("3")));
        assert_eq!(outcome.files.get("c"), Some(&FileContent::text("4")));
    }

    #[tokio::test]
    async fn test_request_errors_are_not_absorbed() {
        let builder = builder(FakeBackend::replying(COFFEE_SHOP_RESPONSE));
        let mut request = GenerationRequest::new("s1", "edit");
        request.edit_mode = true;

        assert_eq!(
            builder.build(&request).await.unwrap_err(),
            RequestError::MissingCurrentProject
        );
    }
}
