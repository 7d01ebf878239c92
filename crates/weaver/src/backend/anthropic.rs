use super::{BackendRequest, GenerationBackend, MAX_TOKENS};
use futures::future::BoxFuture;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::anthropic;
use weaver_core::builder::GenerationBackendError;

pub struct AnthropicBackend {
    client: anthropic::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: &str) -> Result<Self, GenerationBackendError> {
        let client = anthropic::Client::builder()
            .api_key(api_key)
            .build()
            .map_err(|e| GenerationBackendError::Unavailable(format!("Anthropic client: {e}")))?;

        Ok(Self { client })
    }
}

impl GenerationBackend for AnthropicBackend {
    fn generate<'a>(
        &'a self,
        request: BackendRequest<'a>,
    ) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
        Box::pin(async move {
            let model = super::provider_model(request.model, "Anthropic")?;
            let agent = self
                .client
                .agent(model)
                .preamble(request.system)
                .max_tokens(MAX_TOKENS)
                .build();

            agent.prompt(request.prompt).await.map_err(|e| {
                GenerationBackendError::Transport(format!("Anthropic generation failed: {e}"))
            })
        })
    }
}
