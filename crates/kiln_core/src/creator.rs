//! Component creators: the factory method behind the registry.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use kiln_config::{ConfigBuilder, ConfigProfile};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::component::{Component, Synthesis};
use crate::context::ComponentContext;
use crate::error::{CoreError, CoreResult};
use crate::spec::ComponentSpec;

/// Component names: lowercase, start with a letter, hyphens allowed.
pub const NAME_PATTERN: &str = "^[a-z][a-z0-9-]{0,62}$";

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("component name pattern is valid"))
}

/// Builds components of one type.
///
/// Implementations supply the configuration profile, the capability keys they
/// publish and the synthesis step. Spec validation has a shape-checking default.
#[async_trait]
pub trait ComponentCreator: Send + Sync {
    /// Type discriminator this creator is registered under.
    fn component_type(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn profile(&self) -> &dyn ConfigProfile;

    /// Capability keys published after synthesis.
    fn capability_keys(&self) -> Vec<&'static str>;

    fn validate_spec(&self, spec: &ComponentSpec) -> CoreResult<()> {
        SpecValidator::validate(spec)?;
        if spec.component_type != self.component_type() {
            return Err(CoreError::SpecValidation {
                component: spec.name.clone(),
                message: format!(
                    "type '{}' cannot be built by the '{}' creator",
                    spec.component_type,
                    self.component_type()
                ),
            });
        }
        Ok(())
    }

    /// Materialize resources through the context's provisioner.
    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis>;
}

/// Validate the spec, resolve its configuration and return a `Configured` component.
pub fn process_component(
    creator: Arc<dyn ComponentCreator>,
    spec: &ComponentSpec,
    context: &ComponentContext,
) -> CoreResult<Component> {
    creator.validate_spec(spec)?;

    let build_context = context.build_context();
    let resolved = ConfigBuilder::new(&spec.name, creator.profile(), &build_context, &context.settings)
        .with_component_type(&spec.component_type)
        .with_manifest(spec.config.clone())
        .build()?;

    debug!("Processed component '{}' ({})", spec.name, spec.component_type);
    let mut component = Component::new(spec.clone(), context.clone(), creator);
    component.configure(resolved)?;
    Ok(component)
}

/// Shape checks every spec must pass regardless of type.
pub struct SpecValidator;

impl SpecValidator {
    pub fn validate(spec: &ComponentSpec) -> CoreResult<()> {
        let fail = |message: String| CoreError::SpecValidation {
            component: spec.name.clone(),
            message,
        };

        if spec.name.is_empty() {
            return Err(fail("name is required".to_string()));
        }
        if !name_regex().is_match(&spec.name) {
            return Err(fail(format!(
                "name '{}' must match {}",
                spec.name, NAME_PATTERN
            )));
        }
        if spec.component_type.trim().is_empty() {
            return Err(fail("type is required".to_string()));
        }
        if !matches!(spec.config, Value::Null | Value::Object(_)) {
            return Err(fail("config must be a map".to_string()));
        }

        for (index, directive) in spec.binds.iter().enumerate() {
            match (&directive.to, &directive.select) {
                (Some(_), Some(_)) => {
                    return Err(fail(format!(
                        "binds[{}] sets both 'to' and 'select'",
                        index
                    )));
                }
                (None, None) => {
                    return Err(fail(format!("binds[{}] has no target", index)));
                }
                _ => {}
            }
            if directive.capability.trim().is_empty() {
                return Err(fail(format!("binds[{}] has no capability", index)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::BindingDirective;

    #[test]
    fn test_valid_names() {
        for name in ["api", "orders-db", "q1"] {
            assert!(SpecValidator::validate(&ComponentSpec::new(name, "sqs-queue")).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "Orders", "1queue", "orders_db", "-x"] {
            let err = SpecValidator::validate(&ComponentSpec::new(name, "sqs-queue")).unwrap_err();
            assert!(matches!(err, CoreError::SpecValidation { .. }), "{name}");
        }
    }

    #[test]
    fn test_type_required() {
        assert!(SpecValidator::validate(&ComponentSpec::new("api", " ")).is_err());
    }

    #[test]
    fn test_config_must_be_map() {
        let spec = ComponentSpec::new("api", "lambda-api").with_config(serde_json::json!([1]));
        assert!(SpecValidator::validate(&spec).is_err());
    }

    #[test]
    fn test_bind_needs_exactly_one_target() {
        let mut directive = BindingDirective::to("jobs", "queue:sqs", "read");
        directive.to = None;
        let spec = ComponentSpec::new("api", "lambda-api").with_bind(directive);

        let err = SpecValidator::validate(&spec).unwrap_err();
        assert!(err.to_string().contains("binds[0] has no target"));
    }
}
