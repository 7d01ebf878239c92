use super::{BackendRequest, GenerationBackend};
use futures::future::BoxFuture;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;
use weaver_core::builder::GenerationBackendError;

/// Local model served by Ollama.
pub struct OllamaBackend {
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
        }
    }
}

fn create_client(ollama_url: &str) -> Result<ollama::Client, GenerationBackendError> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| GenerationBackendError::Unavailable(format!("Ollama client: {e}")))
}

impl GenerationBackend for OllamaBackend {
    fn generate<'a>(
        &'a self,
        request: BackendRequest<'a>,
    ) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
        Box::pin(async move {
            let client = create_client(&self.base_url)?;
            let agent = client
                .agent(&self.model)
                .preamble(request.system)
                .build();

            agent
                .prompt(request.prompt)
                .await
                .map_err(|e| GenerationBackendError::Transport(format!("Ollama generation failed: {e}")))
        })
    }
}
