use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe, require_reference};
use crate::core::global_context::GlobalContext;
use crate::error::ModuleResult;
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugePropAdjPar {
    pub solver: String,
    pub source: String,
}

/// Propagator from a solver and a source.
///
/// Publishes the 4d propagator under the module name and the 5d solution
/// under `<name>_5d`.
#[derive(Debug)]
pub struct GaugePropAdj {
    par: GaugePropAdjPar,
}

impl GaugePropAdj {
    pub fn five_d_name(name: &str) -> String {
        format!("{}_5d", name)
    }
}

impl ModuleType for GaugePropAdj {
    const TYPE_ID: &'static str = "MFermion::GaugePropAdj";
    type Par = GaugePropAdjPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        require_reference("solver", &par.solver)?;
        require_reference("source", &par.source)?;
        Ok(Self { par })
    }
}

#[async_trait]
impl Module for GaugePropAdj {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        vec![self.par.solver.clone(), self.par.source.clone()]
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![
            OutputDecl::new(name, "propagator"),
            OutputDecl::new(Self::five_d_name(name), "propagator_5d"),
        ]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let upstream = [self.par.solver.as_str(), self.par.source.as_str()];
        let prop = describe(
            "propagator",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &upstream,
            context,
        )?;
        let prop_5d = describe(
            "propagator_5d",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &upstream,
            context,
        )?;
        Ok(ModuleOutputs::new()
            .with(name, prop)
            .with(Self::five_d_name(name), prop_5d))
    }
}
