//! The binder strategy trait and the context strategies run in.

use async_trait::async_trait;

use kiln_config::ComplianceFramework;
use kiln_core::{
    AccessLevel, BindingDirective, BindingResult, Capability, CapabilityContracts, Component,
    ConstructHandle, CoreError, PolicyCondition,
};

use crate::error::{BinderError, BinderResult};
use crate::hardening::ComplianceHardening;

/// Component types that run code and can consume capabilities.
pub const COMPUTE_SOURCES: &[&str] = &["lambda-api", "lambda-worker"];

/// Everything a strategy needs to wire one source to one target.
pub struct BindingContext<'a> {
    pub source: &'a Component,
    pub target: &'a Component,
    pub directive: &'a BindingDirective,
    pub access: AccessLevel,
}

impl<'a> BindingContext<'a> {
    pub fn new(
        source: &'a Component,
        target: &'a Component,
        directive: &'a BindingDirective,
        access: AccessLevel,
    ) -> Self {
        Self {
            source,
            target,
            directive,
            access,
        }
    }

    pub fn framework(&self) -> ComplianceFramework {
        self.source.context().compliance_framework
    }

    pub fn network(&self) -> Option<&ConstructHandle> {
        self.source.context().network.as_ref()
    }

    /// The target's capability, checked against its contract.
    pub fn capability(&self, key: &str) -> BinderResult<&'a Capability> {
        let capability = self.target.capability(key)?;
        CapabilityContracts::validate(capability)?;
        Ok(capability)
    }

    /// Compliance conditions for statements against `service`.
    pub fn hardening(&self, service: &str) -> BinderResult<Vec<PolicyCondition>> {
        ComplianceHardening::conditions(
            self.framework(),
            service,
            &self.source.context().region,
            self.network(),
        )
        .ok_or_else(|| BinderError::NetworkRequired {
            component: self.source.name().to_string(),
            capability: self.directive.capability.clone(),
        })
    }

    /// Add `field` from the capability as an environment variable.
    pub fn export(
        &self,
        result: BindingResult,
        capability: &Capability,
        field: &str,
        default_name: &str,
    ) -> BinderResult<BindingResult> {
        let value = capability.field_string(field)?;
        Ok(result.with_env(self.directive.env_name(field, default_name), value))
    }

    /// A construct registered on the source, or `None` if it has no such construct.
    pub fn source_construct(&self, name: &str) -> BinderResult<Option<&'a ConstructHandle>> {
        match self.source.construct(name) {
            Ok(handle) => Ok(Some(handle)),
            Err(CoreError::ConstructNotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for BindingContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field("capability", &self.directive.capability)
            .field("access", &self.access)
            .finish()
    }
}

/// Wires a class of source types to one capability.
#[async_trait]
pub trait BinderStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Source component types this strategy accepts.
    fn source_types(&self) -> &[String];

    /// Capability key this strategy binds.
    fn capability(&self) -> &str;

    fn can_handle(&self, source_type: &str, capability: &str) -> bool {
        capability == self.capability() && self.source_types().iter().any(|s| s == source_type)
    }

    /// Every `(source type, capability)` pair this strategy handles.
    fn supported_pairs(&self) -> Vec<(String, String)> {
        self.source_types()
            .iter()
            .map(|source| (source.clone(), self.capability().to_string()))
            .collect()
    }

    /// Produce the connection artifacts for one directive.
    ///
    /// Strategies only describe the wiring; nothing reaches the provisioner
    /// until [`crate::ComponentBinder::wire`] runs.
    async fn bind(&self, context: &BindingContext<'_>) -> BinderResult<BindingResult>;
}

pub(crate) fn compute_sources() -> Vec<String> {
    COMPUTE_SOURCES.iter().map(|s| s.to_string()).collect()
}
