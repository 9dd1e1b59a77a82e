//! Compliance-driven policy conditions.

use kiln_config::ComplianceFramework;
use kiln_core::{ConstructHandle, PolicyCondition};

/// Conditions appended to every statement a binder emits.
///
/// Hardening is cumulative: every tier keeps the conditions of the tiers
/// below it and only adds to them.
pub struct ComplianceHardening;

impl ComplianceHardening {
    /// Whether statements at `framework` must be pinned to a shared network.
    pub fn requires_network(framework: ComplianceFramework) -> bool {
        framework == ComplianceFramework::High
    }

    /// Conditions for a statement against `service` (e.g. `sqs`, `s3`).
    ///
    /// Returns `None` when the tier requires a network the context lacks.
    pub fn conditions(
        framework: ComplianceFramework,
        service: &str,
        region: &str,
        network: Option<&ConstructHandle>,
    ) -> Option<Vec<PolicyCondition>> {
        let mut conditions = vec![PolicyCondition::new("Bool", "aws:SecureTransport", "true")];

        if framework.is_regulated() {
            conditions.push(PolicyCondition::new(
                "StringEquals",
                "kms:ViaService",
                format!("{}.{}.amazonaws.com", service, region),
            ));
        }

        if Self::requires_network(framework) {
            conditions.push(PolicyCondition::new(
                "StringEquals",
                "aws:SourceVpc",
                network?.id.clone(),
            ));
        }

        Some(conditions)
    }
}
