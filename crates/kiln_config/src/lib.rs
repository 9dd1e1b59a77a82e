//! # kiln_config
//!
//! Layered configuration resolution for Kiln components.
//!
//! A component's final configuration is assembled from prioritized layers:
//!
//! | Layer                          | Priority |
//! |--------------------------------|---------:|
//! | hardcoded fallback             | 0        |
//! | compliance-tier defaults       | 100      |
//! | environment defaults           | 200      |
//! | platform environment defaults  | 250      |
//! | manifest values                | 300      |
//! | governance overrides           | 400      |
//!
//! Layers are deep-merged in ascending priority order. Maps merge key by key,
//! arrays and scalars are replaced wholesale, and `null` never overrides a
//! value from a lower layer. The merged document is completed with derived
//! defaults, checked against the profile's JSON Schema, and finally checked
//! for attempts to disable governance-critical flags or to lower retention
//! below the tier posture in restricted environments.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_config::{BuildContext, ComplianceFramework, ConfigBuilder, PlatformSettings};
//!
//! let settings = PlatformSettings::default();
//! let context = BuildContext::new("prod", ComplianceFramework::High);
//! let resolved = ConfigBuilder::new("orders-table", &profile, &context, &settings)
//!     .with_manifest(serde_json::json!({ "readCapacity": 5 }))
//!     .build()?;
//! ```

pub mod builder;
pub mod compliance;
pub mod error;
pub mod layer;
pub mod profile;
pub mod settings;
pub mod validator;

pub use builder::{BuildContext, ConfigBuilder, ResolvedConfig};
pub use compliance::{ComplianceFramework, CompliancePosture};
pub use error::{ConfigError, ConfigResult};
pub use layer::{deep_merge, merge_layers, ConfigLayer, LayerPriority};
pub use profile::{ConfigProfile, ConfigViolation, RetentionFloor};
pub use settings::PlatformSettings;
pub use validator::{GovernanceValidator, SchemaValidator};
