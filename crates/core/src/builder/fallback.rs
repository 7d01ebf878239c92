use crate::project::{DeployConfig, FileContent, ProjectFileSet, DESCRIPTOR_PATH, ENTRY_POINT};

const FALLBACK_DESCRIPTOR: &str = "[build]\npublish = \".\"\n";

const FALLBACK_STYLES: &str = "\
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, sans-serif; line-height: 1.6; color: #222; }
header, main, footer { max-width: 960px; margin: 0 auto; padding: 2rem 1rem; }
h1 { font-size: 2.5rem; }
";

const FALLBACK_SCRIPT: &str = "\
document.addEventListener('DOMContentLoaded', () => {
  const year = document.getElementById('year');
  if (year) {
    year.textContent = new Date().getFullYear();
  }
});
";

/// Minimal deployable project used when generation fails.
///
/// The prompt is HTML-escaped into the page heading.
pub fn fallback_template(prompt: &str) -> (ProjectFileSet, DeployConfig) {
    let title = html_escape::encode_text(prompt.trim()).into_owned();

    let index = format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
  <meta charset=\"UTF-8\">
  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
  <title>{title}</title>
  <link rel=\"stylesheet\" href=\"styles.css\">
</head>
<body>
  <header><h1>{title}</h1></header>
  <main><p>This site is being prepared. Check back soon.</p></main>
  <footer><p>&copy; <span id=\"year\"></span></p></footer>
  <script src=\"script.js\"></script>
</body>
</html>
"
    );

    let files = [
        (ENTRY_POINT, FileContent::Text(index)),
        ("styles.css", FileContent::text(FALLBACK_STYLES)),
        ("script.js", FileContent::text(FALLBACK_SCRIPT)),
        (DESCRIPTOR_PATH, FileContent::text(FALLBACK_DESCRIPTOR)),
    ]
    .into_iter()
    .collect();

    let deploy = DeployConfig {
        functions_dir: None,
        ..DeployConfig::default()
    };

    (files, deploy)
}
