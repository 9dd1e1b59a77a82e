//! # kiln_core
//!
//! Component model for Kiln.
//!
//! # Architecture
//!
//! - **Specs**: `ComponentSpec` and `BindingDirective` describe what a manifest asks for
//! - **Creators**: `ComponentCreator` turns a spec into a configured `Component`
//! - **Registry**: `ComponentRegistry` maps type discriminators to creators
//! - **Components**: carry resolved config, then capabilities and construct handles
//!   once synthesized through the `Provisioner` collaborator
//! - **Bindings**: `BindingResult` artifacts merged into a component after wiring
//!
//! # Lifecycle
//!
//! ```text
//! Created -> Configured -> Synthesized -> Bound
//! ```
//!
//! Capabilities and constructs are unreadable until a component is synthesized.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kiln_core::{ComponentContext, ComponentRegistry};
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register(Arc::new(MyQueueCreator))?;
//!
//! let mut component = registry.create_component(&spec, &context)?;
//! component.synth().await?;
//! let queue = component.capability("queue:sqs")?;
//! ```

pub mod binding;
pub mod capability;
pub mod component;
pub mod construct;
pub mod context;
pub mod creator;
pub mod error;
pub mod provision;
pub mod registry;
pub mod spec;

pub use binding::{BindingResult, Effect, NetworkRule, PolicyCondition, PolicyStatement};
pub use capability::{Capability, CapabilityContract, CapabilityContracts};
pub use component::{Component, ComponentArtifact, ComponentState, Synthesis};
pub use construct::ConstructHandle;
pub use context::ComponentContext;
pub use creator::{process_component, ComponentCreator, SpecValidator};
pub use error::{CoreError, CoreResult};
pub use provision::{GrantRequest, ProvisionedResource, Provisioner, ResourceRequest};
pub use registry::ComponentRegistry;
pub use spec::{AccessLevel, BindingDirective, ComponentSpec, TargetSelector};

pub use kiln_config::{ComplianceFramework, PlatformSettings, ResolvedConfig};
