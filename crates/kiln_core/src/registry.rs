//! Component registry mapping type discriminators to creators.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::component::Component;
use crate::context::ComponentContext;
use crate::creator::{process_component, ComponentCreator};
use crate::error::{CoreError, CoreResult};
use crate::spec::ComponentSpec;

/// A registry of component creators.
///
/// New component kinds are added by registering a creator; existing entries
/// can never be replaced. Resolution borrows the registry immutably, so it
/// cannot change while a manifest is being resolved.
#[derive(Default)]
pub struct ComponentRegistry {
    creators: BTreeMap<String, Arc<dyn ComponentCreator>>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            creators: BTreeMap::new(),
        }
    }

    /// Register a creator under its `component_type()`.
    pub fn register(&mut self, creator: Arc<dyn ComponentCreator>) -> CoreResult<()> {
        let component_type = creator.component_type().to_string();
        if self.creators.contains_key(&component_type) {
            return Err(CoreError::DuplicateComponentType(component_type));
        }
        debug!("Registering component type: {}", component_type);
        self.creators.insert(component_type, creator);
        Ok(())
    }

    /// Get a creator by type.
    pub fn get(&self, component_type: &str) -> Option<Arc<dyn ComponentCreator>> {
        self.creators.get(component_type).cloned()
    }

    /// Get a creator by type, listing the known types if missing.
    pub fn get_required(&self, component_type: &str) -> CoreResult<Arc<dyn ComponentCreator>> {
        self.get(component_type)
            .ok_or_else(|| CoreError::UnknownComponentType {
                component_type: component_type.to_string(),
                known: self.types().into_iter().map(String::from).collect(),
            })
    }

    pub fn contains(&self, component_type: &str) -> bool {
        self.creators.contains_key(component_type)
    }

    /// Registered types in sorted order.
    pub fn types(&self) -> Vec<&str> {
        self.creators.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    /// Look up the creator for `spec.type` and produce a configured component.
    pub fn create_component(
        &self,
        spec: &ComponentSpec,
        context: &ComponentContext,
    ) -> CoreResult<Component> {
        let creator = self.get_required(&spec.component_type)?;
        process_component(creator, spec, context)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.types())
            .finish()
    }
}
