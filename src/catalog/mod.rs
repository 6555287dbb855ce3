//! Module catalog: the live module declarations of one run, keyed by name and
//! kept in registration order.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ApplicationError, ApplicationResult};
use crate::modules::{Module, ModuleRegistry, OutputDecl};

/// A registered module: name, type, parameters, declared inputs and outputs.
pub struct ModuleDeclaration {
    name: String,
    module_type: String,
    parameters: Value,
    inputs: Vec<String>,
    outputs: Vec<OutputDecl>,
    instance: Box<dyn Module>,
}

impl ModuleDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_type(&self) -> &str {
        &self.module_type
    }

    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Product names this module reads, without duplicates, in declaration order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputDecl] {
        &self.outputs
    }

    pub fn instance(&self) -> &dyn Module {
        self.instance.as_ref()
    }
}

impl fmt::Debug for ModuleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDeclaration")
            .field("name", &self.name)
            .field("module_type", &self.module_type)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Catalog of module declarations
pub struct ModuleCatalog {
    registry: Arc<ModuleRegistry>,
    declarations: Vec<ModuleDeclaration>,
    index: HashMap<String, usize>,
}

impl ModuleCatalog {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            declarations: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Construct and store a module under `name`.
    ///
    /// The module's own declared inputs come first, followed by any
    /// `extra_inputs`; repeated names are kept once.
    pub fn add_module(
        &mut self,
        name: &str,
        module_type: &str,
        parameters: Value,
        extra_inputs: Vec<String>,
    ) -> ApplicationResult<&ModuleDeclaration> {
        if name.trim().is_empty() {
            return Err(ApplicationError::InvalidParameters {
                module: name.to_string(),
                reason: "module name must not be empty".to_string(),
            });
        }
        if self.index.contains_key(name) {
            return Err(ApplicationError::DuplicateName(name.to_string()));
        }

        let instance = self
            .registry
            .create(module_type, &parameters)
            .map_err(|e| match e {
                ApplicationError::InvalidParameters { reason, .. } => {
                    ApplicationError::InvalidParameters {
                        module: name.to_string(),
                        reason,
                    }
                }
                other => other,
            })?;

        let mut inputs: Vec<String> = Vec::new();
        for input in instance.inputs().into_iter().chain(extra_inputs) {
            if !inputs.contains(&input) {
                inputs.push(input);
            }
        }
        let outputs = instance.outputs(name);

        tracing::debug!(
            module = %name,
            module_type = %module_type,
            inputs = ?inputs,
            "module registered"
        );

        let position = self.declarations.len();
        self.declarations.push(ModuleDeclaration {
            name: name.to_string(),
            module_type: module_type.to_string(),
            parameters,
            inputs,
            outputs,
            instance,
        });
        self.index.insert(name.to_string(), position);
        Ok(&self.declarations[position])
    }

    pub fn get_module(&self, name: &str) -> ApplicationResult<&ModuleDeclaration> {
        self.position(name)
            .map(|i| &self.declarations[i])
            .ok_or_else(|| ApplicationError::UnknownModule(name.to_string()))
    }

    /// Registration position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get_by_index(&self, index: usize) -> Option<&ModuleDeclaration> {
        self.declarations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDeclaration> {
        self.declarations.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.declarations.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::create_default_registry;
    use serde_json::json;

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new(Arc::new(create_default_registry()))
    }

    #[test]
    fn test_add_and_get_module() {
        let mut catalog = catalog();
        catalog
            .add_module("gauge", "MIO::LoadNersc", json!({"file": "cfg"}), vec![])
            .unwrap();
        catalog
            .add_module(
                "adjgauge",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "gauge"}),
                vec![],
            )
            .unwrap();

        let decl = catalog.get_module("adjgauge").unwrap();
        assert_eq!(decl.module_type(), "MGauge::FundtoAdjoint");
        assert_eq!(decl.inputs(), ["gauge".to_string()]);
        assert_eq!(decl.outputs()[0].name, "adjgauge");
        assert_eq!(catalog.names(), vec!["gauge", "adjgauge"]);
        assert_eq!(catalog.position("adjgauge"), Some(1));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut catalog = catalog();
        catalog
            .add_module("gauge", "MIO::LoadNersc", json!({"file": "a"}), vec![])
            .unwrap();
        let result = catalog.add_module("gauge", "MIO::LoadNersc", json!({"file": "b"}), vec![]);
        assert!(matches!(result, Err(ApplicationError::DuplicateName(n)) if n == "gauge"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_unknown_module() {
        let catalog = catalog();
        assert!(matches!(
            catalog.get_module("nope"),
            Err(ApplicationError::UnknownModule(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_carry_module_name() {
        let mut catalog = catalog();
        let result = catalog.add_module(
            "cg",
            "MSolver::RBPrecCGAdj",
            json!({"action": "a", "residual": 1e-8, "maxIteration": 0}),
            vec![],
        );
        match result {
            Err(ApplicationError::InvalidParameters { module, .. }) => assert_eq!(module, "cg"),
            other => panic!("unexpected: {:?}", other.map(|d| d.name().to_string())),
        }
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_extra_inputs_are_merged() {
        let mut catalog = catalog();
        let decl = catalog
            .add_module(
                "adjgauge",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "gauge"}),
                vec!["gauge".to_string(), "extra".to_string()],
            )
            .unwrap();
        assert_eq!(decl.inputs(), ["gauge".to_string(), "extra".to_string()]);
    }
}
