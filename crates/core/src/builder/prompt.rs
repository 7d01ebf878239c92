use super::images::ImageContext;
use crate::project::{FileContent, GenerationRequest};

/// System prompt enforcing the deployable project shape.
pub const SYSTEM_PROMPT: &str = "\
You are a web developer generating complete, deployable static websites.
You output ONLY a single JSON object. No markdown fences. No explanations.

The JSON object has this shape:
{
  \"files\": { \"<relative/path>\": \"<file content>\" },
  \"deploy\": {
    \"build_command\": \"\",
    \"publish_dir\": \".\",
    \"functions_dir\": \"netlify/functions\",
    \"environment_variables\": { \"NAME\": \"placeholder value\" }
  }
}

Rules:
- Always include index.html at the project root, plus styles.css and script.js.
- Always include netlify.toml with a [build] section (publish, functions) and a
  [[redirects]] rule from \"/api/*\" to \"/.netlify/functions/:splat\" with status 200
  when the site needs a backend.
- Backend logic goes in netlify/functions/<name>.js. Each function file exports
  `exports.handler = async (event, context) => { ... }` and returns an object with
  statusCode (number), headers (object) and body (string).
- When any function exists, include package.json listing its dependencies.
- Paths are relative, use forward slashes and never contain \"..\".
- Secrets are never hard-coded; list them in deploy.environment_variables with
  placeholder values and read them from process.env.
- When editing an existing project, output only the files that change. To delete a
  file, output its path with an empty string as content.";

/// Build the user prompt for a generation request.
///
/// In edit mode the current project's text files are included verbatim so the
/// backend can return only the files it changes.
pub fn build_prompt(request: &GenerationRequest, images: &ImageContext) -> String {
    let mut parts = Vec::new();

    if request.edit_mode {
        if let Some(current) = &request.current_project {
            let mut project = String::from("## Current project");
            for (path, content) in current.iter() {
                match content {
                    FileContent::Text(text) => {
                        project.push_str(&format!("\n\n### {path}\n{text}"));
                    }
                    FileContent::Binary(bytes) => {
                        project.push_str(&format!("\n\n### {path}\n(binary, {} bytes)", bytes.len()));
                    }
                }
            }
            parts.push(project);
        }
    }

    let mut imagery = format!(
        "## Suggested imagery\nHero image: {}",
        images.hero_image
    );
    for image in &images.section_images {
        imagery.push_str(&format!("\nSection image: {} ({})", image.url, image.description));
    }
    parts.push(imagery);

    let heading = if request.edit_mode {
        "## Requested changes"
    } else {
        "## Website request"
    };
    parts.push(format!("{heading}\n{}", request.prompt.trim()));

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::images::image_context;
    use crate::project::ProjectFileSet;

    #[test]
    fn test_create_prompt_has_imagery_and_request() {
        let request = GenerationRequest::new("s1", "landing page for a coffee shop");
        let prompt = build_prompt(&request, &image_context(&request.prompt));

        assert!(!prompt.contains("## Current project"));
        assert!(prompt.contains("Hero image: https://source.unsplash.com/1920x1080/?landing"));
        assert!(prompt.ends_with("## Website request\nlanding page for a coffee shop"));
    }

    #[test]
    fn test_edit_prompt_includes_current_files() {
        let current: ProjectFileSet = [
            ("index.html", FileContent::text("<h1>Coffee</h1>")),
            ("logo.png", FileContent::Binary(vec![1, 2, 3])),
        ]
        .into_iter()
        .collect();
        let request = GenerationRequest::new("s1", "make the heading red").editing(current);

        let prompt = build_prompt(&request, &image_context(&request.prompt));

        assert!(prompt.starts_with("## Current project"));
        assert!(prompt.contains("### index.html\n<h1>Coffee</h1>"));
        assert!(prompt.contains("### logo.png\n(binary, 3 bytes)"));
        assert!(prompt.ends_with("## Requested changes\nmake the heading red"));
    }

    #[test]
    fn test_system_prompt_names_required_files() {
        for required in ["index.html", "netlify.toml", "package.json", "exports.handler"] {
            assert!(SYSTEM_PROMPT.contains(required), "missing {required}");
        }
    }
}
