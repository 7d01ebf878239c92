use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deployment descriptor read by the hosting platform.
pub const DESCRIPTOR_PATH: &str = "netlify.toml";

/// Dependency manifest required whenever serverless functions are present.
pub const MANIFEST_PATH: &str = "package.json";

/// Front-end entry point, at the root or under the publish directory.
pub const ENTRY_POINT: &str = "index.html";

/// Placeholder environment file rendered from `environment_variables`.
pub const ENV_EXAMPLE_PATH: &str = ".env.example";

pub const DEFAULT_FUNCTIONS_DIR: &str = "netlify/functions";

/// Path-rewrite rule mapping an external prefix onto a function invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
    pub status: u16,
}

impl RewriteRule {
    /// `/api/*` forwarded to the platform's function endpoint.
    pub fn api_to_functions() -> Self {
        Self {
            from: "/api/*".to_string(),
            to: "/.netlify/functions/:splat".to_string(),
            status: 200,
        }
    }
}

/// Build and deploy settings for a generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Empty means there is no build step.
    pub build_command: String,
    pub publish_dir: String,
    pub functions_dir: Option<String>,
    /// Variable name to example/placeholder value.
    pub environment_variables: BTreeMap<String, String>,
    pub redirects: Vec<RewriteRule>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            build_command: String::new(),
            publish_dir: ".".to_string(),
            functions_dir: Some(DEFAULT_FUNCTIONS_DIR.to_string()),
            environment_variables: BTreeMap::new(),
            redirects: Vec::new(),
        }
    }
}

impl DeployConfig {
    /// Rewrite rules to emit, falling back to the `/api/*` rule when a
    /// functions directory is configured and no rule was given.
    pub fn effective_redirects(&self) -> Vec<RewriteRule> {
        if self.redirects.is_empty() && self.functions_dir.is_some() {
            vec![RewriteRule::api_to_functions()]
        } else {
            self.redirects.clone()
        }
    }
}

#[derive(Serialize)]
struct Descriptor<'a> {
    build: BuildSection<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    redirects: Vec<RewriteRule>,
}

#[derive(Serialize)]
struct BuildSection<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a str>,
    publish: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a str>,
}

/// Render the `netlify.toml` descriptor for a deploy configuration.
pub fn render_descriptor(config: &DeployConfig) -> Result<String, toml::ser::Error> {
    let descriptor = Descriptor {
        build: BuildSection {
            command: Some(config.build_command.as_str()).filter(|c| !c.trim().is_empty()),
            publish: &config.publish_dir,
            functions: config.functions_dir.as_deref(),
        },
        redirects: config.effective_redirects(),
    };

    toml::to_string(&descriptor)
}

/// Render `.env.example` with one `NAME=placeholder` line per variable.
pub fn render_env_example(config: &DeployConfig) -> String {
    config
        .environment_variables
        .iter()
        .map(|(name, placeholder)| format!("{name}={placeholder}\n"))
        .collect()
}

#[derive(Deserialize)]
struct DescriptorIn {
    build: BuildIn,
    #[serde(default)]
    redirects: Vec<RewriteRule>,
}

#[derive(Deserialize)]
struct BuildIn {
    #[serde(default)]
    command: String,
    publish: String,
    functions: Option<String>,
}

/// Read a deploy configuration back out of a `netlify.toml` descriptor.
///
/// Requires a `[build]` table with a `publish` string. Environment variables
/// are not part of the descriptor and come back empty.
pub fn parse_descriptor(text: &str) -> Result<DeployConfig, toml::de::Error> {
    let descriptor: DescriptorIn = toml::from_str(text)?;

    Ok(DeployConfig {
        build_command: descriptor.build.command,
        publish_dir: descriptor.build.publish,
        functions_dir: descriptor.build.functions,
        environment_variables: BTreeMap::new(),
        redirects: descriptor.redirects,
    })
}

/// Parse `NAME=value` lines, skipping blanks and `#` comments.
pub fn parse_env_example(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_descriptor_default_config() {
        let rendered = render_descriptor(&DeployConfig::default()).unwrap();
        let value: toml::Value = toml::from_str(&rendered).unwrap();

        let build = value["build"].as_table().unwrap();
        assert!(!build.contains_key("command"));
        assert_eq!(build["publish"].as_str(), Some("."));
        assert_eq!(build["functions"].as_str(), Some("netlify/functions"));

        let redirects = value["redirects"].as_array().unwrap();
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0]["from"].as_str(), Some("/api/*"));
        assert_eq!(redirects[0]["to"].as_str(), Some("/.netlify/functions/:splat"));
        assert_eq!(redirects[0]["status"].as_integer(), Some(200));
    }

    #[test]
    fn test_render_descriptor_static_site_has_no_redirects() {
        let config = DeployConfig {
            build_command: "npm run build".to_string(),
            publish_dir: "dist".to_string(),
            functions_dir: None,
            ..DeployConfig::default()
        };

        let rendered = render_descriptor(&config).unwrap();
        let value: toml::Value = toml::from_str(&rendered).unwrap();

        assert_eq!(value["build"]["command"].as_str(), Some("npm run build"));
        assert_eq!(value["build"]["publish"].as_str(), Some("dist"));
        assert!(value.get("redirects").is_none());
    }

    #[test]
    fn test_explicit_redirects_are_kept() {
        let rule = RewriteRule {
            from: "/v1/*".to_string(),
            to: "/.netlify/functions/api/:splat".to_string(),
            status: 301,
        };
        let config = DeployConfig {
            redirects: vec![rule.clone()],
            ..DeployConfig::default()
        };

        assert_eq!(config.effective_redirects(), vec![rule]);
    }

    #[test]
    fn test_render_env_example_is_sorted() {
        let mut config = DeployConfig::default();
        config
            .environment_variables
            .insert("STRIPE_KEY".to_string(), "sk_test_xxx".to_string());
        config
            .environment_variables
            .insert("MONGODB_URL".to_string(), "mongodb://localhost:27017".to_string());

        assert_eq!(
            render_env_example(&config),
            "MONGODB_URL=mongodb://localhost:27017\nSTRIPE_KEY=sk_test_xxx\n"
        );
    }

    #[test]
    fn test_parse_descriptor_reads_back_rendered_config() {
        let config = DeployConfig {
            build_command: "npm run build".to_string(),
            publish_dir: "dist".to_string(),
            ..DeployConfig::default()
        };
        let rendered = render_descriptor(&config).unwrap();

        let parsed = parse_descriptor(&rendered).unwrap();
        assert_eq!(parsed.build_command, "npm run build");
        assert_eq!(parsed.publish_dir, "dist");
        assert_eq!(parsed.functions_dir.as_deref(), Some("netlify/functions"));
        assert_eq!(parsed.redirects, vec![RewriteRule::api_to_functions()]);
    }

    #[test]
    fn test_parse_descriptor_requires_build_publish() {
        assert!(parse_descriptor("[build]\ncommand = \"make\"\n").is_err());
        assert!(parse_descriptor("[[redirects]]\nfrom = \"/a\"\nto = \"/b\"\nstatus = 301\n").is_err());
        assert!(parse_descriptor("not toml at all [").is_err());
    }

    #[test]
    fn test_parse_env_example() {
        let vars = parse_env_example("# comment\nAPI_KEY=changeme\n\nDB_URL = postgres://x\nnoequals\n");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["API_KEY"], "changeme");
        assert_eq!(vars["DB_URL"], "postgres://x");
    }

    #[test]
    fn test_partial_deploy_object_uses_defaults() {
        let config: DeployConfig = serde_json::from_str(r#"{"publish_dir": "public"}"#).unwrap();
        assert_eq!(config.publish_dir, "public");
        assert_eq!(config.functions_dir.as_deref(), Some("netlify/functions"));
        assert!(config.build_command.is_empty());
    }
}
