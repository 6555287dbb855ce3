use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::describe;
use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z2AdjPar {
    #[serde(rename = "tA")]
    pub t_a: u32,
    #[serde(rename = "tB")]
    pub t_b: u32,
}

/// Z2 wall source in the adjoint representation, on timeslices `tA..=tB`.
#[derive(Debug)]
pub struct Z2Adj {
    par: Z2AdjPar,
}

impl ModuleType for Z2Adj {
    const TYPE_ID: &'static str = "MSource::Z2Adj";
    type Par = Z2AdjPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        if par.t_a > par.t_b {
            return Err(ModuleError::InvalidParameters(format!(
                "tA ({}) must not exceed tB ({})",
                par.t_a, par.t_b
            )));
        }
        Ok(Self { par })
    }
}

#[async_trait]
impl Module for Z2Adj {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "source")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let mut product = describe("source", name, Self::TYPE_ID, &self.par, inputs, &[], context)?;
        product.data["timeslices"] = (self.par.t_b - self.par.t_a + 1).into();
        Ok(ModuleOutputs::new().with(name, product))
    }
}
