//! Deployment context shared by every component in a manifest.

use std::sync::Arc;

use kiln_config::{BuildContext, ComplianceFramework, PlatformSettings};

use crate::construct::ConstructHandle;
use crate::provision::Provisioner;

/// Context a manifest is resolved in.
#[derive(Clone)]
pub struct ComponentContext {
    pub service_name: String,
    pub environment: String,
    pub compliance_framework: ComplianceFramework,
    pub region: String,
    pub account: String,
    /// Provisioning scope components synthesize into.
    pub scope: Arc<dyn Provisioner>,
    /// Shared network, when the service runs inside one.
    pub network: Option<ConstructHandle>,
    pub settings: PlatformSettings,
}

impl ComponentContext {
    /// The environment is stored trimmed and lowercased, so `Prod` and `prod`
    /// select the same defaults and the same governance.
    pub fn new(
        service_name: impl Into<String>,
        environment: impl Into<String>,
        compliance_framework: ComplianceFramework,
        scope: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            environment: environment.into().trim().to_lowercase(),
            compliance_framework,
            region: "us-east-1".to_string(),
            account: "000000000000".to_string(),
            scope,
            network: None,
            settings: PlatformSettings::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_network(mut self, network: ConstructHandle) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_settings(mut self, settings: PlatformSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The part of the context configuration resolution depends on.
    pub fn build_context(&self) -> BuildContext {
        BuildContext::new(self.environment.clone(), self.compliance_framework)
    }

    /// Physical resource name: `<service>-<environment>-<component>`.
    pub fn resource_name(&self, component: &str) -> String {
        format!("{}-{}-{}", self.service_name, self.environment, component)
    }
}

impl std::fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentContext")
            .field("service_name", &self.service_name)
            .field("environment", &self.environment)
            .field("compliance_framework", &self.compliance_framework)
            .field("region", &self.region)
            .field("account", &self.account)
            .field("network", &self.network)
            .finish()
    }
}
