//! Service manifests: the YAML document a resolution starts from.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use kiln_config::{ComplianceFramework, PlatformSettings};
use kiln_core::{ComponentContext, ComponentSpec, ConstructHandle, Provisioner};

use crate::error::{EngineError, EngineResult};

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_account() -> String {
    "000000000000".to_string()
}

/// A service manifest.
///
/// ```yaml
/// service: shop
/// environment: prod
/// complianceFramework: moderate
/// components:
///   - name: jobs
///     type: sqs-queue
///   - name: api
///     type: lambda-api
///     binds:
///       - to: jobs
///         capability: queue:sqs
///         access: write
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub service: String,
    pub environment: String,
    #[serde(default)]
    pub compliance_framework: ComplianceFramework,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_account")]
    pub account: String,
    /// Identifier of the shared network the service runs in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl Manifest {
    pub fn new(service: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            environment: environment.into(),
            compliance_framework: ComplianceFramework::default(),
            region: default_region(),
            account: default_account(),
            network: None,
            components: Vec::new(),
        }
    }

    pub fn with_framework(mut self, framework: ComplianceFramework) -> Self {
        self.compliance_framework = framework;
        self
    }

    pub fn with_component(mut self, spec: ComponentSpec) -> Self {
        self.components.push(spec);
        self
    }

    /// Load a manifest from a YAML file.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::from_yaml_str(&content)?;
        debug!(
            "Loaded manifest for '{}' with {} components from {}",
            manifest.service,
            manifest.components.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_yaml(&self) -> EngineResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check the manifest-level fields. Component specs are checked by their creators.
    pub fn validate(&self) -> EngineResult<()> {
        if self.service.trim().is_empty() {
            return Err(EngineError::InvalidManifest("service is required".to_string()));
        }
        if self.environment.trim().is_empty() {
            return Err(EngineError::InvalidManifest(
                "environment is required".to_string(),
            ));
        }
        Ok(())
    }

    /// The context every component in this manifest is resolved in.
    pub fn context(&self, scope: Arc<dyn Provisioner>, settings: PlatformSettings) -> ComponentContext {
        let mut context = ComponentContext::new(
            self.service.clone(),
            self.environment.clone(),
            self.compliance_framework,
            scope,
        )
        .with_region(self.region.clone())
        .with_account(self.account.clone())
        .with_settings(settings);
        if let Some(network) = &self.network {
            context = context.with_network(ConstructHandle::new(network.clone(), "AWS::EC2::VPC"));
        }
        context
    }
}
