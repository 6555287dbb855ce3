#![allow(dead_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use modgraph::{
    create_default_registry, GlobalContext, Module, ModuleCatalog, ModuleError, ModuleInputs,
    ModuleOutputs, ModuleRegistry, ModuleResult, ModuleType, OutputDecl, Product,
};

/// Generic test module: consumes `deps`, produces one product named after
/// itself, optionally fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepPar {
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub fail: bool,
    /// Skip producing the declared output.
    #[serde(default)]
    pub skip_output: bool,
    /// Products declared in addition to the module's own name.
    #[serde(default)]
    pub extra_outputs: Vec<String>,
    /// Products emitted at run time without being declared.
    #[serde(default)]
    pub undeclared_outputs: Vec<String>,
}

#[derive(Debug)]
pub struct Step {
    par: StepPar,
}

impl ModuleType for Step {
    const TYPE_ID: &'static str = "Test::Step";
    type Par = StepPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        Ok(Self { par })
    }
}

#[async_trait]
impl Module for Step {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        self.par.deps.clone()
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        let mut outputs = vec![OutputDecl::new(name, "step")];
        for extra in &self.par.extra_outputs {
            outputs.push(OutputDecl::new(extra.as_str(), "step"));
        }
        outputs
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        if self.par.fail {
            return Err(ModuleError::Execution(format!("{} failed", name)));
        }
        let mut upstream = Vec::new();
        for dep in &self.par.deps {
            upstream.push(inputs.get(dep)?.data.clone());
        }
        if self.par.skip_output {
            return Ok(ModuleOutputs::new());
        }
        let mut outputs = ModuleOutputs::new().with(
            name,
            Product::new(
                "step",
                json!({"name": name, "trajectory": context.trajectory(), "upstream": upstream}),
            ),
        );
        for extra in self
            .par
            .extra_outputs
            .iter()
            .chain(&self.par.undeclared_outputs)
        {
            outputs.insert(extra.as_str(), Product::new("step", json!({"name": extra})));
        }
        Ok(outputs)
    }
}

pub fn registry() -> ModuleRegistry {
    let mut registry = create_default_registry();
    registry.register_type::<Step>();
    registry
}

pub fn catalog() -> ModuleCatalog {
    ModuleCatalog::new(Arc::new(registry()))
}

pub fn step(deps: &[&str]) -> Value {
    json!({"deps": deps})
}

pub fn failing(deps: &[&str]) -> Value {
    json!({"deps": deps, "fail": true})
}

/// loadGauge -> transform -> source -> solve -> correlate, with correlate
/// also reading transform directly.
pub fn chain_catalog() -> ModuleCatalog {
    let mut catalog = catalog();
    add(&mut catalog, "loadGauge", step(&[]));
    add(&mut catalog, "transform", step(&["loadGauge"]));
    add(&mut catalog, "source", step(&["transform"]));
    add(&mut catalog, "solve", step(&["transform", "source"]));
    add(&mut catalog, "correlate", step(&["solve", "transform"]));
    catalog
}

pub fn add(catalog: &mut ModuleCatalog, name: &str, params: Value) {
    catalog
        .add_module(name, Step::TYPE_ID, params, Vec::new())
        .unwrap();
}
