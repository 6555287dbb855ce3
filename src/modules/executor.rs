use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};

/// A named product a module promises to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDecl {
    /// Product name, unique across the catalog.
    pub name: String,
    /// Free-form kind tag (e.g. `gauge_field`, `propagator`).
    pub kind: String,
}

impl OutputDecl {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// A materialized data object held by the product store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub kind: String,
    pub data: Value,
}

impl Product {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// Read-only view of the products a module declared as inputs.
#[derive(Debug, Default)]
pub struct ModuleInputs {
    products: HashMap<String, Arc<Product>>,
}

impl ModuleInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, product: Arc<Product>) {
        self.products.insert(name.into(), product);
    }

    /// Borrow an input product by name.
    pub fn get(&self, name: &str) -> ModuleResult<&Product> {
        self.products
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| ModuleError::MissingInput(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.products.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Products returned by one module execution, keyed by product name.
#[derive(Debug, Default)]
pub struct ModuleOutputs {
    products: Vec<(String, Product)>,
}

impl ModuleOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, product: Product) -> Self {
        self.insert(name, product);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, product: Product) {
        let name = name.into();
        self.products.retain(|(existing, _)| existing != &name);
        self.products.push((name, product));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.products.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub(crate) fn into_products(self) -> Vec<(String, Product)> {
        self.products
    }
}

/// Uniform capability interface shared by every module kind.
///
/// Construction must stay cheap: no I/O and no heavy computation. All real
/// work happens in [`execute`](Module::execute), which receives borrowed
/// inputs and the read-only run context.
#[async_trait]
pub trait Module: Send + Sync {
    /// Type identifier the module was registered under.
    fn module_type(&self) -> &str;

    /// Names of the products this module consumes.
    fn inputs(&self) -> Vec<String>;

    /// Products this module publishes when declared under `name`.
    fn outputs(&self, name: &str) -> Vec<OutputDecl>;

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs>;
}

/// A module kind with a typed parameter structure.
///
/// Implementing this lets drivers declare modules as
/// `app.create_module::<LoadNersc>("gauge", par)`.
pub trait ModuleType: Module + Sized + 'static {
    const TYPE_ID: &'static str;
    type Par: Serialize + DeserializeOwned;

    fn from_par(par: Self::Par) -> ModuleResult<Self>;
}
