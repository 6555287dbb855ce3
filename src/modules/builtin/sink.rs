use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe, parse_components};
use crate::core::global_context::GlobalContext;
use crate::error::ModuleResult;
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarPointPar {
    /// Sink momentum as three integers, e.g. `"0 0 0"`.
    pub mom: String,
}

/// Point sink with a fixed momentum.
#[derive(Debug)]
pub struct ScalarPoint {
    par: ScalarPointPar,
    momentum: Vec<i32>,
}

impl ModuleType for ScalarPoint {
    const TYPE_ID: &'static str = "MSink::ScalarPoint";
    type Par = ScalarPointPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        let momentum = parse_components("mom", &par.mom, 3)?;
        Ok(Self { par, momentum })
    }
}

#[async_trait]
impl Module for ScalarPoint {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "sink")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let mut product = describe("sink", name, Self::TYPE_ID, &self.par, inputs, &[], context)?;
        product.data["momentum"] = serde_json::to_value(&self.momentum)?;
        Ok(ModuleOutputs::new().with(name, product))
    }
}
