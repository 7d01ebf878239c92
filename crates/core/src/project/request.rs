use super::files::ProjectFileSet;
use serde::{Deserialize, Serialize};

/// Generation backend provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Gemini,
    Ollama,
}

/// Which backend/model a request should be generated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "claude-sonnet")]
    ClaudeSonnet,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gemini-pro")]
    GeminiPro,
    #[serde(rename = "local")]
    Local,
}

impl Model {
    pub fn provider(&self) -> Provider {
        match self {
            Model::ClaudeSonnet => Provider::Anthropic,
            Model::Gpt4o => Provider::OpenAi,
            Model::GeminiPro => Provider::Gemini,
            Model::Local => Provider::Ollama,
        }
    }

    /// Model name sent to the provider. `None` for the local model, whose
    /// name is configured by the operator.
    pub fn provider_model(&self) -> Option<&'static str> {
        match self {
            Model::ClaudeSonnet => Some("claude-sonnet-4-20250514"),
            Model::Gpt4o => Some("gpt-4o"),
            Model::GeminiPro => Some("gemini-1.5-pro"),
            Model::Local => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::ClaudeSonnet => "claude-sonnet",
            Model::Gpt4o => "gpt-4o",
            Model::GeminiPro => "gemini-pro",
            Model::Local => "local",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude-sonnet" => Ok(Model::ClaudeSonnet),
            "gpt-4o" => Ok(Model::Gpt4o),
            "gemini-pro" => Ok(Model::GeminiPro),
            "local" => Ok(Model::Local),
            other => Err(format!("Unknown model: {other}")),
        }
    }
}

/// A "generate project" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Correlation tag supplied by the caller.
    pub session_id: String,
    pub prompt: String,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub edit_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_project: Option<ProjectFileSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("edit mode requires the current project")]
    MissingCurrentProject,
}

impl GenerationRequest {
    pub fn new(session_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            prompt: prompt.into(),
            model: Model::default(),
            edit_mode: false,
            current_project: None,
        }
    }

    /// Turn this request into an edit of `current`.
    pub fn editing(mut self, current: ProjectFileSet) -> Self {
        self.edit_mode = true;
        self.current_project = Some(current);
        self
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Reject requests that cannot be generated at all.
    pub fn check(&self) -> Result<(), RequestError> {
        if self.prompt.trim().is_empty() {
            return Err(RequestError::EmptyPrompt);
        }
        if self.edit_mode && self.current_project.is_none() {
            return Err(RequestError::MissingCurrentProject);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_wire_names() {
        let model: Model = serde_json::from_str("\"gpt-4o\"").unwrap();
        assert_eq!(model, Model::Gpt4o);
        assert_eq!(serde_json::to_string(&Model::Local).unwrap(), "\"local\"");
        assert_eq!("gemini-pro".parse::<Model>().unwrap(), Model::GeminiPro);
        assert!("gpt-5".parse::<Model>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"session_id": "s1", "prompt": "landing page for a coffee shop"}"#,
        )
        .unwrap();

        assert_eq!(request.model, Model::ClaudeSonnet);
        assert!(!request.edit_mode);
        assert!(request.current_project.is_none());
        assert!(request.check().is_ok());
    }

    #[test]
    fn test_edit_mode_requires_current_project() {
        let mut request = GenerationRequest::new("s1", "make the header blue");
        request.edit_mode = true;
        assert_eq!(request.check(), Err(RequestError::MissingCurrentProject));

        let request = request.editing(ProjectFileSet::new());
        assert!(request.check().is_ok());
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let request = GenerationRequest::new("s1", "   ");
        assert_eq!(request.check(), Err(RequestError::EmptyPrompt));
    }
}
