use super::{BackendRequest, GenerationBackend, MAX_TOKENS};
use futures::future::BoxFuture;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use weaver_core::builder::GenerationBackendError;

/// OpenAI-compatible chat completions backend.
pub struct OpenAiBackend {
    client: openai::CompletionsClient,
}

impl OpenAiBackend {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, GenerationBackendError> {
        let client = openai::CompletionsClient::builder()
            .api_key(api_key)
            .base_url(base_url)
            .build()
            .map_err(|e| GenerationBackendError::Unavailable(format!("OpenAI client: {e}")))?;

        Ok(Self { client })
    }
}

impl GenerationBackend for OpenAiBackend {
    fn generate<'a>(
        &'a self,
        request: BackendRequest<'a>,
    ) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
        Box::pin(async move {
            let model = super::provider_model(request.model, "OpenAI")?;
            let agent = self
                .client
                .agent(model)
                .preamble(request.system)
                .max_tokens(MAX_TOKENS)
                .build();

            agent
                .prompt(request.prompt)
                .await
                .map_err(|e| {
                    GenerationBackendError::Transport(format!("OpenAI generation failed: {e}"))
                })
        })
    }
}
