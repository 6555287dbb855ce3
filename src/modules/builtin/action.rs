use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe, parse_components, require_reference};
use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobiusDWFAdjPar {
    pub gauge: String,
    #[serde(rename = "Ls")]
    pub ls: u32,
    pub mass: f64,
    #[serde(rename = "M5")]
    pub m5: f64,
    pub b: f64,
    pub c: f64,
    /// Boundary phases, four components.
    pub boundary: String,
    /// Twist angles, four components.
    #[serde(default = "default_twist")]
    pub twist: String,
}

fn default_twist() -> String {
    "0. 0. 0. 0.".to_string()
}

/// Mobius domain-wall fermion action in the adjoint representation.
#[derive(Debug)]
pub struct MobiusDWFAdj {
    par: MobiusDWFAdjPar,
    boundary: Vec<f64>,
    twist: Vec<f64>,
}

impl ModuleType for MobiusDWFAdj {
    const TYPE_ID: &'static str = "MAction::MobiusDWFAdj";
    type Par = MobiusDWFAdjPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        require_reference("gauge", &par.gauge)?;
        if par.ls == 0 {
            return Err(ModuleError::InvalidParameters(
                "Ls must be positive".to_string(),
            ));
        }
        if !(par.mass >= 0.0) {
            return Err(ModuleError::InvalidParameters(format!(
                "mass must be non-negative, got {}",
                par.mass
            )));
        }
        if !par.m5.is_finite() || !par.b.is_finite() || !par.c.is_finite() {
            return Err(ModuleError::InvalidParameters(
                "M5, b and c must be finite".to_string(),
            ));
        }
        let boundary = parse_components("boundary", &par.boundary, 4)?;
        let twist = parse_components("twist", &par.twist, 4)?;
        Ok(Self {
            par,
            boundary,
            twist,
        })
    }
}

#[async_trait]
impl Module for MobiusDWFAdj {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        vec![self.par.gauge.clone()]
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "fermion_action")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let mut product = describe(
            "fermion_action",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &[self.par.gauge.as_str()],
            context,
        )?;
        product.data["boundary_phases"] = serde_json::to_value(&self.boundary)?;
        product.data["twist_angles"] = serde_json::to_value(&self.twist)?;
        Ok(ModuleOutputs::new().with(name, product))
    }
}
