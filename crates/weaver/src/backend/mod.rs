//! Generation backends.
//!
//! Every provider is reached through [`GenerationBackend`]. [`ModelRouter`]
//! picks the provider for a request's [`Model`] and reports unconfigured
//! providers as `Unavailable`, which the builder absorbs like any other
//! backend failure.

mod anthropic;
mod gemini;
mod ollama;
mod openai;

use futures::future::BoxFuture;
use std::time::Duration;
use weaver_core::builder::GenerationBackendError;
use weaver_core::project::{Model, Provider};

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// Completion token budget for every hosted model.
const MAX_TOKENS: u64 = 8192;

/// A single call to a generation backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'a> {
    pub model: Model,
    pub system: &'a str,
    pub prompt: &'a str,
}

pub trait GenerationBackend: Send + Sync {
    fn generate<'a>(
        &'a self,
        request: BackendRequest<'a>,
    ) -> BoxFuture<'a, Result<String, GenerationBackendError>>;
}

#[derive(Debug, Clone, clap::Args)]
pub struct BackendOptions {
    /// OpenAI API key (enables gpt-4o)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Anthropic API key (enables claude-sonnet)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Gemini API key (enables gemini-pro)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Ollama base URL (used by the local model)
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Ollama model name for the local model
    #[arg(long, env = "WEAVER_LOCAL_MODEL", default_value = "qwen2.5-coder")]
    pub local_model: String,

    /// Seconds to wait for a backend before falling back to the template
    #[arg(long, env = "WEAVER_TIMEOUT_SECS", default_value = "120")]
    pub timeout: u64,
}

impl BackendOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

/// Dispatches requests to the provider behind each model.
#[derive(Default)]
pub struct ModelRouter {
    anthropic: Option<AnthropicBackend>,
    openai: Option<OpenAiBackend>,
    gemini: Option<GeminiBackend>,
    ollama: Option<OllamaBackend>,
}

impl ModelRouter {
    pub fn from_options(options: &BackendOptions) -> Result<Self, GenerationBackendError> {
        Ok(Self {
            anthropic: options
                .anthropic_api_key
                .as_deref()
                .map(AnthropicBackend::new)
                .transpose()?,
            openai: options
                .openai_api_key
                .as_deref()
                .map(|key| OpenAiBackend::new(&options.openai_base_url, key))
                .transpose()?,
            gemini: options
                .gemini_api_key
                .as_deref()
                .map(GeminiBackend::new)
                .transpose()?,
            ollama: Some(OllamaBackend::new(&options.ollama_url, &options.local_model)),
        })
    }

    /// Providers that can currently serve requests.
    pub fn configured(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.anthropic.is_some() {
            providers.push(Provider::Anthropic);
        }
        if self.openai.is_some() {
            providers.push(Provider::OpenAi);
        }
        if self.gemini.is_some() {
            providers.push(Provider::Gemini);
        }
        if self.ollama.is_some() {
            providers.push(Provider::Ollama);
        }
        providers
    }
}

fn unavailable<'a>(model: Model) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
    Box::pin(async move {
        Err(GenerationBackendError::Unavailable(format!(
            "no credentials configured for {model}"
        )))
    })
}

impl GenerationBackend for ModelRouter {
    fn generate<'a>(
        &'a self,
        request: BackendRequest<'a>,
    ) -> BoxFuture<'a, Result<String, GenerationBackendError>> {
        match request.model.provider() {
            Provider::Anthropic => match &self.anthropic {
                Some(backend) => backend.generate(request),
                None => unavailable(request.model),
            },
            Provider::OpenAi => match &self.openai {
                Some(backend) => backend.generate(request),
                None => unavailable(request.model),
            },
            Provider::Gemini => match &self.gemini {
                Some(backend) => backend.generate(request),
                None => unavailable(request.model),
            },
            Provider::Ollama => match &self.ollama {
                Some(backend) => backend.generate(request),
                None => unavailable(request.model),
            },
        }
    }
}

/// Provider-side model name, or `Unavailable` when `model` belongs to a
/// different provider.
fn provider_model(model: Model, provider: &str) -> Result<&'static str, GenerationBackendError> {
    model.provider_model().ok_or_else(|| {
        GenerationBackendError::Unavailable(format!("{model} is not a {provider} model"))
    })
}
