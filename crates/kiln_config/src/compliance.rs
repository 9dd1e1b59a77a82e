//! Compliance frameworks and the defaults each tier imposes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Governance profile selecting increasingly strict defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceFramework {
    #[serde(alias = "commercial")]
    Baseline,
    #[serde(alias = "fedramp-moderate")]
    Moderate,
    #[serde(alias = "fedramp-high")]
    High,
}

impl Default for ComplianceFramework {
    fn default() -> Self {
        Self::Baseline
    }
}

impl ComplianceFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceFramework::Baseline => "baseline",
            ComplianceFramework::Moderate => "moderate",
            ComplianceFramework::High => "high",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            ComplianceFramework::Baseline,
            ComplianceFramework::Moderate,
            ComplianceFramework::High,
        ]
    }

    /// Regulated tiers require customer-managed encryption keys.
    pub fn is_regulated(&self) -> bool {
        !matches!(self, ComplianceFramework::Baseline)
    }

    /// Defaults contributed by this tier.
    pub fn posture(&self) -> CompliancePosture {
        match self {
            ComplianceFramework::Baseline => CompliancePosture {
                customer_managed_key: false,
                log_retention_days: 30,
                backup_retention_days: 7,
                monitoring_required: false,
                detailed_monitoring: false,
            },
            ComplianceFramework::Moderate => CompliancePosture {
                customer_managed_key: true,
                log_retention_days: 365,
                backup_retention_days: 14,
                monitoring_required: true,
                detailed_monitoring: false,
            },
            ComplianceFramework::High => CompliancePosture {
                customer_managed_key: true,
                log_retention_days: 2555,
                backup_retention_days: 35,
                monitoring_required: true,
                detailed_monitoring: true,
            },
        }
    }
}

impl std::str::FromStr for ComplianceFramework {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "commercial" => Ok(ComplianceFramework::Baseline),
            "moderate" | "fedramp-moderate" => Ok(ComplianceFramework::Moderate),
            "high" | "fedramp-high" => Ok(ComplianceFramework::High),
            other => Err(ConfigError::UnknownFramework(other.to_string())),
        }
    }
}

impl std::fmt::Display for ComplianceFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concrete defaults a compliance tier contributes to every component profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompliancePosture {
    pub customer_managed_key: bool,
    pub log_retention_days: u32,
    pub backup_retention_days: u32,
    pub monitoring_required: bool,
    pub detailed_monitoring: bool,
}

impl CompliancePosture {
    /// True when every field is at least as strict as `other`.
    pub fn is_at_least(&self, other: &CompliancePosture) -> bool {
        self.customer_managed_key >= other.customer_managed_key
            && self.log_retention_days >= other.log_retention_days
            && self.backup_retention_days >= other.backup_retention_days
            && self.monitoring_required >= other.monitoring_required
            && self.detailed_monitoring >= other.detailed_monitoring
    }
}
