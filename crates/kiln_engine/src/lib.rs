//! # kiln_engine
//!
//! Whole-manifest resolution for Kiln.
//!
//! A [`Manifest`] names a service, its environment and compliance framework,
//! and the components it is built from. The [`ResolutionPipeline`]:
//!
//! 1. builds the [`BindGraph`] and rejects duplicate names, missing or
//!    ambiguous bind targets and cycles,
//! 2. creates and configures every component,
//! 3. checks each binding has a published capability and a strategy,
//! 4. walks the graph targets-first, synthesizing each component and then
//!    binding it to its targets.
//!
//! Nothing is provisioned before step 4, and the first failure aborts the run.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_engine::{default_binder_registry, default_component_registry, Manifest, ResolutionPipeline};
//!
//! let manifest = Manifest::from_file(Path::new("kiln.yaml"))?;
//! let components = default_component_registry()?;
//! let binders = default_binder_registry();
//! let resolved = ResolutionPipeline::new(&components, &binders)
//!     .resolve_manifest(&manifest, scope, settings)
//!     .await?;
//! ```

pub mod defaults;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod pipeline;

pub use defaults::{default_binder_registry, default_component_registry};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use graph::{BindEdge, BindGraph};
pub use manifest::Manifest;
pub use pipeline::{
    PlannedBinding, PlannedComponent, ResolutionPipeline, ResolutionPlan, ResolvedManifest,
};
