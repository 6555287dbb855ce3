use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::describe;
use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadNerscPar {
    /// Configuration file stem; the trajectory index is appended at run time.
    pub file: String,
}

/// Gauge configuration loader (NERSC format).
#[derive(Debug)]
pub struct LoadNersc {
    par: LoadNerscPar,
}

impl ModuleType for LoadNersc {
    const TYPE_ID: &'static str = "MIO::LoadNersc";
    type Par = LoadNerscPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        if par.file.trim().is_empty() {
            return Err(ModuleError::InvalidParameters(
                "file must not be empty".to_string(),
            ));
        }
        Ok(Self { par })
    }
}

#[async_trait]
impl Module for LoadNersc {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "gauge_field")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let mut product = describe(
            "gauge_field",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &[],
            context,
        )?;
        product.data["file"] = format!("{}.{}", self.par.file, context.trajectory()).into();
        Ok(ModuleOutputs::new().with(name, product))
    }
}
