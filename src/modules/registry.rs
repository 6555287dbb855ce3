use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Module, ModuleType};
use crate::error::{ApplicationError, ApplicationResult, ModuleError, ModuleResult};

/// Constructor for one module type.
pub type ModuleFactory = Arc<dyn Fn(&Value) -> ModuleResult<Box<dyn Module>> + Send + Sync>;

/// Module registry - maps type identifiers to factories
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the same type.
    pub fn register(&mut self, type_id: &str, factory: ModuleFactory) {
        self.factories.insert(type_id.to_string(), factory);
    }

    /// Register a typed module; parameters are deserialized into `T::Par`.
    pub fn register_type<T: ModuleType>(&mut self) {
        self.register(
            T::TYPE_ID,
            Arc::new(|params: &Value| -> ModuleResult<Box<dyn Module>> {
                let par: T::Par = serde_json::from_value(params.clone())
                    .map_err(|e| ModuleError::InvalidParameters(e.to_string()))?;
                Ok(Box::new(T::from_par(par)?))
            }),
        );
    }

    /// Build a module instance from a parameter payload.
    ///
    /// The `module` field of a returned `InvalidParameters` carries the type
    /// identifier; callers that know the declaration name replace it.
    pub fn create(&self, type_id: &str, params: &Value) -> ApplicationResult<Box<dyn Module>> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| ApplicationError::UnknownModuleType(type_id.to_string()))?;
        factory(params).map_err(|e| ApplicationError::InvalidParameters {
            module: type_id.to_string(),
            reason: match e {
                ModuleError::InvalidParameters(reason) => reason,
                other => other.to_string(),
            },
        })
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// All registered type identifiers, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }
}

/// Create a registry with every built-in module type.
pub fn create_default_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    super::builtin::register_builtin_modules(&mut registry);
    registry
}
