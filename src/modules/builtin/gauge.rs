use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe, require_reference};
use crate::core::global_context::GlobalContext;
use crate::error::ModuleResult;
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundtoAdjointPar {
    /// Name of the fundamental gauge field module.
    pub gaugeconf: String,
}

/// Fundamental to adjoint representation gauge transform.
#[derive(Debug)]
pub struct FundtoAdjoint {
    par: FundtoAdjointPar,
}

impl ModuleType for FundtoAdjoint {
    const TYPE_ID: &'static str = "MGauge::FundtoAdjoint";
    type Par = FundtoAdjointPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        require_reference("gaugeconf", &par.gaugeconf)?;
        Ok(Self { par })
    }
}

#[async_trait]
impl Module for FundtoAdjoint {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        vec![self.par.gaugeconf.clone()]
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "adjoint_gauge_field")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let product = describe(
            "adjoint_gauge_field",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &[self.par.gaugeconf.as_str()],
            context,
        )?;
        Ok(ModuleOutputs::new().with(name, product))
    }
}
