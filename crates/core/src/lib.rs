//! Core library for weaver
//!
//! This crate implements the **Functional Core** of the weaver application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The weaver project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`weaver_core`** (this crate): Domain types and transformation functions
//! - **`weaver`**: Backend calls, HTTP serving and orchestration (the Imperative Shell)
//!
//! A generated website moves through three steps:
//!
//! 1. **Build**: the shell asks a generation backend for files; [`builder::assemble`]
//!    turns the response (or the backend failure) into a candidate file-set and
//!    deploy configuration, falling back to a static template when needed.
//! 2. **Validate**: [`validate::validate`] checks required files, function shape,
//!    path safety and environment variable names, collecting every violation.
//! 3. **Package**: [`package::package`] serializes a [`validate::ValidatedProject`]
//!    into a JSON mapping or a reproducible `.tar.gz` archive.
//!
//! Persistence is reached only through the [`store::ProjectStore`] trait, so the
//! core never owns a database.
//!
//! # Module Organization
//!
//! - [`project`]: File-sets, deploy configuration, and generation requests
//! - [`builder`]: Prompt assembly, response extraction, edit-mode merge, fallback
//! - [`validate`]: Deployability rules
//! - [`package`]: Mapping and archive encodings
//! - [`flow`]: Stages of a generation-to-package flow
//! - [`store`]: Session/project persistence interface and implementations
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use weaver_core::builder::{assemble, GenerationBackendError};
//! use weaver_core::package::{package, PackageMode};
//! use weaver_core::project::GenerationRequest;
//! use weaver_core::validate::accept;
//!
//! let request = GenerationRequest::new("session-1", "landing page for a coffee shop");
//!
//! // A backend timeout still yields a deployable project
//! let outcome = assemble(&request, Err(GenerationBackendError::Timeout(120)));
//! let project = accept(outcome.files, outcome.deploy).expect("fallback validates");
//!
//! let artifact = package(&project, PackageMode::Archive)?;
//! ```

pub mod builder;
pub mod flow;
pub mod package;
pub mod project;
pub mod store;
pub mod validate;
