pub mod deploy;
pub mod files;
pub mod request;

pub use deploy::{
    parse_descriptor, parse_env_example, render_descriptor, render_env_example, DeployConfig,
    RewriteRule, DEFAULT_FUNCTIONS_DIR, DESCRIPTOR_PATH, ENTRY_POINT, ENV_EXAMPLE_PATH,
    MANIFEST_PATH,
};
pub use files::{check_path, normalize_dir, FileContent, PathViolation, ProjectFileSet};
pub use request::{GenerationRequest, Model, Provider, RequestError};
