use crate::backend::{BackendOptions, ModelRouter};
use crate::builder::ProjectSpecBuilder;
use crate::pipeline::Pipeline;
use crate::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use weaver_core::store::{FsStore, MemoryStore, ProjectStore};

#[derive(Debug, Clone, clap::Args)]
pub struct StoreOptions {
    /// Directory holding stored projects and session pointers
    #[arg(long, env = "WEAVER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep projects in memory only
    #[arg(long, conflicts_with = "data_dir")]
    pub ephemeral: bool,
}

/// Platform data directory joined with `weaver`.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs_next::data_dir()
        .map(|dir| dir.join("weaver"))
        .ok_or_eyre("Could not determine a data directory; pass --data-dir")
}

impl StoreOptions {
    pub fn open(&self) -> Result<Arc<dyn ProjectStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }

        let root = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&root)
            .wrap_err_with(|| f!("Failed to create data directory {}", root.display()))?;

        log::debug!("using data directory {}", root.display());
        Ok(Arc::new(FsStore::new(root)))
    }
}

/// Wire the model router and the store into a pipeline.
pub fn pipeline(backend: &BackendOptions, store: &StoreOptions) -> Result<Pipeline> {
    let router = ModelRouter::from_options(backend)?;
    log::debug!("configured providers: {:?}", router.configured());

    let builder = ProjectSpecBuilder::new(Arc::new(router), backend.timeout());
    Ok(Pipeline::new(builder, store.open()?))
}
