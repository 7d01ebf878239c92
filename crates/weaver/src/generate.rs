use crate::backend::BackendOptions;
use crate::config::StoreOptions;
use crate::pipeline::Pipeline;
use crate::prelude::{eprintln, println, *};
use std::path::PathBuf;
use weaver_core::package::PackageMode;
use weaver_core::project::{GenerationRequest, Model};

#[derive(Debug, clap::Args)]
pub struct GenerateOptions {
    /// Natural-language description of the website (or of the changes in edit mode)
    #[clap(value_name = "PROMPT")]
    pub prompt: String,

    /// Session the project is recorded under
    #[arg(short, long, env = "WEAVER_SESSION", default_value = "cli")]
    pub session: String,

    /// Model: claude-sonnet, gpt-4o, gemini-pro or local
    #[arg(long, default_value = "claude-sonnet")]
    pub model: Model,

    /// Edit the project in this directory instead of creating a new one
    #[arg(long, value_name = "DIR")]
    pub edit: Option<PathBuf>,

    /// Write the generated files into this directory
    #[arg(long, value_name = "DIR")]
    pub write: Option<PathBuf>,

    /// Artifact format: mapping (JSON) or archive (tar.gz)
    #[arg(short, long, default_value = "mapping")]
    pub mode: PackageMode,

    /// Write the artifact to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit the artifact as base64 text
    #[arg(long)]
    pub base64: bool,

    /// Print the full generation response as JSON instead of the artifact
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub backend: BackendOptions,

    #[clap(flatten)]
    pub store: StoreOptions,
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let pipeline = crate::config::pipeline(&options.backend, &options.store)?;

    let mut request = GenerationRequest::new(options.session.clone(), options.prompt.clone())
        .with_model(options.model);
    if let Some(dir) = &options.edit {
        request = request.editing(crate::workdir::read_project(dir)?);
    }

    if global.verbose {
        eprintln!(
            "Generating with {} (session {}, {})...",
            options.model,
            options.session,
            if request.edit_mode { "edit" } else { "create" }
        );
    }

    generate_with(&pipeline, request, &options, &global).await
}

async fn generate_with(
    pipeline: &Pipeline,
    request: GenerationRequest,
    options: &GenerateOptions,
    global: &crate::Global,
) -> Result<()> {
    let generated = match pipeline.generate(request).await {
        Ok(generated) => generated,
        Err(Error::Rejected { errors, .. }) => {
            for error in &errors {
                eprintln!("  - {error}");
            }
            return Err(eyre!(
                "Generated project failed validation with {} error(s)",
                errors.len()
            ));
        }
        Err(err) => return Err(err.into()),
    };

    if generated.used_fallback {
        eprintln!("Generation backend failed; the fallback template was used");
    }
    if global.verbose {
        eprintln!("Project {} recorded", generated.project_id);
    }

    if let Some(dir) = &options.write {
        let stored = pipeline.get(&generated.project_id)?;
        crate::workdir::write_project(dir, &stored.files)?;
        if global.verbose {
            eprintln!("Wrote {} file(s) to {}", stored.files.len(), dir.display());
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&generated)?);
        return Ok(());
    }

    let artifact = pipeline.download(&generated.project_id, options.mode)?;
    crate::package::emit(&artifact, options.output.as_deref(), options.base64)
}
