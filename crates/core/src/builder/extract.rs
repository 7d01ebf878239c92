use super::GenerationBackendError;
use crate::project::{DeployConfig, ProjectFileSet};
use serde::Deserialize;

/// Files and optional deploy settings extracted from a backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedOutput {
    pub files: ProjectFileSet,
    pub deploy: Option<DeployConfig>,
}

#[derive(Deserialize)]
struct RawOutput {
    files: ProjectFileSet,
    #[serde(default)]
    deploy: Option<DeployConfig>,
}

/// Extract the JSON object from a model response.
///
/// Strips markdown fences plus leading and trailing commentary by slicing
/// from the first `{` to the last `}`.
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&trimmed[start..=end])
}

/// Parse a backend response into a path→content mapping.
///
/// Anything that is not an object with a non-empty `files` mapping is
/// malformed. Paths are only stripped of a leading `./`; every other check is
/// left to the validator.
pub fn parse_generation(response: &str) -> Result<GeneratedOutput, GenerationBackendError> {
    if response.trim().is_empty() {
        return Err(GenerationBackendError::Malformed(
            "empty response".to_string(),
        ));
    }

    let json = extract_json(response).ok_or_else(|| {
        GenerationBackendError::Malformed("no JSON object in response".to_string())
    })?;

    let raw: RawOutput = serde_json::from_str(json)
        .map_err(|e| GenerationBackendError::Malformed(format!("invalid project JSON: {e}")))?;

    if raw.files.is_empty() {
        return Err(GenerationBackendError::Malformed(
            "response contains no files".to_string(),
        ));
    }

    let files = raw
        .files
        .into_iter()
        .map(|(path, content)| {
            let path = path.strip_prefix("./").map(str::to_string).unwrap_or(path);
            (path, content)
        })
        .collect();

    Ok(GeneratedOutput {
        files,
        deploy: raw.deploy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::FileContent;

    #[test]
    fn test_plain_json_response() {
        let response = r#"{"files": {"index.html": "<h1>Hi</h1>", "styles.css": "body{}"}}"#;
        let output = parse_generation(response).unwrap();

        assert_eq!(output.files.len(), 2);
        assert_eq!(
            output.files.get("index.html"),
            Some(&FileContent::text("<h1>Hi</h1>"))
        );
        assert!(output.deploy.is_none());
    }

    #[test]
    fn test_fenced_response_with_commentary() {
        let response = "Here's your site:\n```json\n{\"files\": {\"index.html\": \"x\"}, \"deploy\": {\"publish_dir\": \"public\"}}\n```\nEnjoy!";
        let output = parse_generation(response).unwrap();

        assert!(output.files.contains("index.html"));
        assert_eq!(output.deploy.unwrap().publish_dir, "public");
    }

    #[test]
    fn test_leading_dot_slash_is_stripped() {
        let output = parse_generation(r#"{"files": {"./index.html": "x", "../evil": "y"}}"#).unwrap();

        assert!(output.files.contains("index.html"));
        assert!(output.files.contains("../evil"));
    }

    #[test]
    fn test_binary_entries_are_decoded() {
        let output =
            parse_generation(r#"{"files": {"favicon.ico": {"base64": "AAEC"}}}"#).unwrap();
        assert_eq!(
            output.files.get("favicon.ico"),
            Some(&FileContent::Binary(vec![0, 1, 2]))
        );
    }

    #[test]
    fn test_malformed_responses() {
        for response in [
            "",
            "   ",
            "I cannot help with that.",
            "{\"files\": []}",
            "{\"files\": {}}",
            "{\"pages\": {\"index.html\": \"x\"}}",
            "} nothing {",
            "{\"files\": {\"index.html\": 42}}",
        ] {
            assert!(
                matches!(
                    parse_generation(response),
                    Err(GenerationBackendError::Malformed(_))
                ),
                "expected malformed for {response:?}"
            );
        }
    }
}
