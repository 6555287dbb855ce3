use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe, require_reference};
use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RBPrecCGAdjPar {
    pub action: String,
    pub residual: f64,
    #[serde(rename = "maxIteration")]
    pub max_iteration: u32,
}

/// Red-black preconditioned conjugate gradient solver.
#[derive(Debug)]
pub struct RBPrecCGAdj {
    par: RBPrecCGAdjPar,
}

impl ModuleType for RBPrecCGAdj {
    const TYPE_ID: &'static str = "MSolver::RBPrecCGAdj";
    type Par = RBPrecCGAdjPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        require_reference("action", &par.action)?;
        if !(par.residual > 0.0 && par.residual.is_finite()) {
            return Err(ModuleError::InvalidParameters(format!(
                "residual must be positive, got {}",
                par.residual
            )));
        }
        if par.max_iteration == 0 {
            return Err(ModuleError::InvalidParameters(
                "maxIteration must be positive".to_string(),
            ));
        }
        Ok(Self { par })
    }
}

#[async_trait]
impl Module for RBPrecCGAdj {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        vec![self.par.action.clone()]
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "solver")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let product = describe(
            "solver",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &[self.par.action.as_str()],
            context,
        )?;
        Ok(ModuleOutputs::new().with(name, product))
    }
}
