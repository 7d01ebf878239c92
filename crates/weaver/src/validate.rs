use crate::pipeline::validate_files;
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use std::path::PathBuf;
use weaver_core::validate::ValidationResult;

#[derive(Debug, clap::Args)]
pub struct ValidateOptions {
    /// Project directory to validate
    #[clap(value_name = "DIR")]
    pub dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ValidateOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Reading project from {}...", options.dir.display());
    }

    let files = crate::workdir::read_project(&options.dir)?;

    if global.verbose {
        eprintln!("Validating {} file(s)...", files.len());
    }

    let result = validate_files(&files, None);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output_formatted(&result);
    }

    match result {
        ValidationResult::Valid => Ok(()),
        ValidationResult::Invalid(errors) => Err(eyre!(
            "{} failed validation with {} error(s)",
            options.dir.display(),
            errors.len()
        )),
    }
}

fn output_formatted(result: &ValidationResult) {
    match result {
        ValidationResult::Valid => println!("{}", "Project is valid".green().bold()),
        ValidationResult::Invalid(errors) => {
            println!("{}", "Project is invalid".red().bold());
            for error in errors {
                println!("  {} {}", "-".red(), error);
            }
        }
    }
}
