//! Registries assembled from the built-in component types and strategies.

use kiln_binder::BinderRegistry;
use kiln_core::ComponentRegistry;

use crate::error::EngineResult;

/// A fresh registry holding every built-in component type.
pub fn default_component_registry() -> EngineResult<ComponentRegistry> {
    Ok(kiln_components::builtin_registry()?)
}

/// A fresh registry holding the built-in binder strategies.
pub fn default_binder_registry() -> BinderRegistry {
    BinderRegistry::with_builtin_strategies()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registries_are_independent_instances() {
        let mut first = default_component_registry().unwrap();
        let second = default_component_registry().unwrap();
        let extra = kiln_components::LambdaFunctionCreator::worker();

        assert!(first.register(std::sync::Arc::new(extra)).is_err());
        assert_eq!(first.types(), second.types());
        assert_eq!(
            second.types(),
            vec![
                "dynamodb-table",
                "lambda-api",
                "lambda-worker",
                "rds-postgres",
                "s3-bucket",
                "sqs-queue"
            ]
        );
        assert_eq!(default_binder_registry().len(), 4);
    }

    #[test]
    fn test_every_binder_pair_can_resolve() {
        let components = default_component_registry().unwrap();
        let pairs = default_binder_registry().registered_pairs();
        assert_eq!(pairs.len(), 8);

        for (source_type, capability) in pairs {
            assert!(
                components.get(&source_type).is_some(),
                "no component type '{}' for {} binding",
                source_type,
                capability
            );
            assert!(
                components
                    .types()
                    .into_iter()
                    .filter_map(|t| components.get(t))
                    .any(|c| c.capability_keys().contains(&capability.as_str())),
                "nothing publishes {}",
                capability
            );
        }
    }
}
