use crate::prelude::{eprintln, *};
use std::io::Write;
use std::path::{Path, PathBuf};
use weaver_core::builder::deploy_from_files;
use weaver_core::package::{package, Artifact, PackageMode};
use weaver_core::validate::accept;

#[derive(Debug, clap::Args)]
pub struct PackageOptions {
    /// Project directory to package
    #[clap(value_name = "DIR")]
    pub dir: PathBuf,

    /// Artifact format: mapping (JSON) or archive (tar.gz)
    #[arg(short, long, default_value = "archive")]
    pub mode: PackageMode,

    /// Write the artifact to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit the artifact as base64 text
    #[arg(long)]
    pub base64: bool,
}

pub async fn run(options: PackageOptions, global: crate::Global) -> Result<()> {
    let files = crate::workdir::read_project(&options.dir)?;
    let deploy = deploy_from_files(&files);

    let validated = match accept(files, deploy) {
        Ok(validated) => validated,
        Err(errors) => {
            for error in &errors {
                eprintln!("  - {error}");
            }
            return Err(eyre!(
                "{} failed validation with {} error(s)",
                options.dir.display(),
                errors.len()
            ));
        }
    };

    let artifact = package(&validated, options.mode)?;

    if global.verbose {
        eprintln!(
            "Packaged {} ({} file(s), {} bytes)",
            options.dir.display(),
            validated.files().len(),
            artifact.bytes.len()
        );
    }

    emit(&artifact, options.output.as_deref(), options.base64)
}

/// Write an artifact to a file or stdout, optionally as base64 text.
pub fn emit(artifact: &Artifact, output: Option<&Path>, base64: bool) -> Result<()> {
    let bytes = if base64 {
        artifact.to_base64().into_bytes()
    } else {
        artifact.bytes.clone()
    };

    match output {
        Some(path) => std::fs::write(path, &bytes)
            .wrap_err_with(|| f!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            if base64 {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_core::project::ProjectFileSet;

    fn write_site(dir: &Path) {
        let files: ProjectFileSet = [
            ("index.html", "<html></html>"),
            ("netlify.toml", "[build]\npublish = \".\"\n"),
        ]
        .into_iter()
        .collect();
        crate::workdir::write_project(dir, &files).unwrap();
    }

    #[test]
    fn test_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("site.json");
        let artifact = Artifact {
            mode: PackageMode::Mapping,
            bytes: b"{}".to_vec(),
        };

        emit(&artifact, Some(target.as_path()), false).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"{}");

        emit(&artifact, Some(target.as_path()), true).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "e30=");
    }

    #[tokio::test]
    async fn test_run_refuses_invalid_project() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());
        std::fs::remove_file(dir.path().join("netlify.toml")).unwrap();
        let output = dir.path().join("site.tar.gz");

        let result = run(
            PackageOptions {
                dir: dir.path().to_path_buf(),
                mode: PackageMode::Archive,
                output: Some(output.clone()),
                base64: false,
            },
            crate::Global { verbose: false },
        )
        .await;

        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_run_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        write_site(&site);
        let output = dir.path().join("site.tar.gz");

        run(
            PackageOptions {
                dir: site,
                mode: PackageMode::Archive,
                output: Some(output.clone()),
                base64: false,
            },
            crate::Global { verbose: false },
        )
        .await
        .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }
}
