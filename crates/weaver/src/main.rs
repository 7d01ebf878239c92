use crate::prelude::*;
use clap::Parser;

mod backend;
mod builder;
mod config;
mod error;
mod generate;
mod package;
mod pipeline;
mod prelude;
mod server;
mod validate;
mod workdir;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate, validate and package deployable websites"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "WEAVER_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Serve the generation HTTP API
    Serve(crate::server::ServeOptions),

    /// Generate a project from a prompt and package it
    Generate(crate::generate::GenerateOptions),

    /// Validate a project directory
    Validate(crate::validate::ValidateOptions),

    /// Validate then package a project directory
    Package(crate::package::PackageOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
        SubCommands::Validate(options) => crate::validate::run(options, app.global).await,
        SubCommands::Package(options) => crate::package::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
