use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe, require_reference};
use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};
use crate::modules::{Module, ModuleInputs, ModuleOutputs, ModuleType, OutputDecl};

const GAMMA_NAMES: [&str; 16] = [
    "Identity",
    "Gamma5",
    "GammaX",
    "GammaY",
    "GammaZ",
    "GammaT",
    "GammaXGamma5",
    "GammaYGamma5",
    "GammaZGamma5",
    "GammaTGamma5",
    "SigmaXY",
    "SigmaXZ",
    "SigmaXT",
    "SigmaYZ",
    "SigmaYT",
    "SigmaZT",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MesonAdjPar {
    /// Result file stem, relative to the run output directory.
    pub output: String,
    pub q1: String,
    pub q2: String,
    /// `"all"` or a list of `(sink source)` pairs, e.g. `"(Gamma5 Gamma5)(GammaX GammaX)"`.
    pub gammas: String,
    pub sink: String,
}

/// Meson two-point contraction. Writes its correlator to a result file.
#[derive(Debug)]
pub struct MesonAdj {
    par: MesonAdjPar,
    gammas: Vec<(String, String)>,
}

impl ModuleType for MesonAdj {
    const TYPE_ID: &'static str = "MContraction::MesonAdj";
    type Par = MesonAdjPar;

    fn from_par(par: Self::Par) -> ModuleResult<Self> {
        require_reference("q1", &par.q1)?;
        require_reference("q2", &par.q2)?;
        require_reference("sink", &par.sink)?;
        if par.output.trim().is_empty() {
            return Err(ModuleError::InvalidParameters(
                "output must not be empty".to_string(),
            ));
        }
        let gammas = parse_gammas(&par.gammas)?;
        Ok(Self { par, gammas })
    }
}

fn parse_gammas(text: &str) -> ModuleResult<Vec<(String, String)>> {
    let text = text.trim();
    if text == "all" {
        return Ok(GAMMA_NAMES
            .iter()
            .flat_map(|snk| {
                GAMMA_NAMES
                    .iter()
                    .map(move |src| (snk.to_string(), src.to_string()))
            })
            .collect());
    }

    let mut pairs = Vec::new();
    for chunk in text.split(')') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let body = chunk.strip_prefix('(').ok_or_else(|| {
            ModuleError::InvalidParameters(format!("gammas: malformed pair '{}'", chunk))
        })?;
        let names: Vec<&str> = body.split_whitespace().collect();
        let [snk, src] = names.as_slice() else {
            return Err(ModuleError::InvalidParameters(format!(
                "gammas: expected two names in '({})'",
                body
            )));
        };
        for name in [snk, src] {
            if !GAMMA_NAMES.contains(name) {
                return Err(ModuleError::InvalidParameters(format!(
                    "gammas: unknown gamma '{}'",
                    name
                )));
            }
        }
        pairs.push((snk.to_string(), src.to_string()));
    }

    if pairs.is_empty() {
        return Err(ModuleError::InvalidParameters(
            "gammas: no gamma pairs given".to_string(),
        ));
    }
    Ok(pairs)
}

#[async_trait]
impl Module for MesonAdj {
    fn module_type(&self) -> &str {
        Self::TYPE_ID
    }

    fn inputs(&self) -> Vec<String> {
        let mut inputs = vec![self.par.q1.clone()];
        for name in [&self.par.q2, &self.par.sink] {
            if !inputs.contains(name) {
                inputs.push(name.clone());
            }
        }
        inputs
    }

    fn outputs(&self, name: &str) -> Vec<OutputDecl> {
        vec![OutputDecl::new(name, "correlator")]
    }

    async fn execute(
        &self,
        name: &str,
        inputs: &ModuleInputs,
        context: &GlobalContext,
    ) -> ModuleResult<ModuleOutputs> {
        let upstream = self.inputs();
        let upstream: Vec<&str> = upstream.iter().map(String::as_str).collect();
        let mut product = describe(
            "correlator",
            name,
            Self::TYPE_ID,
            &self.par,
            inputs,
            &upstream,
            context,
        )?;
        product.data["gammas"] = serde_json::to_value(&self.gammas)?;

        let path = context.write_result(&self.par.output, &product.data)?;
        product.data["file"] = path.display().to_string().into();
        Ok(ModuleOutputs::new().with(name, product))
    }
}
