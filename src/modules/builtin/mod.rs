//! Built-in reference module types.
//!
//! These cover the measurement chain of a typical driver: gauge loading,
//! fundamental-to-adjoint transform, sources and sinks, action, solver,
//! propagator and meson contraction. Numerical kernels are not part of this
//! crate; each module validates its parameters, declares its reference fields
//! as inputs, and publishes a provenance descriptor as its product.

mod action;
mod contraction;
mod fermion;
mod gauge;
mod io;
mod sink;
mod solver;
mod source;

pub use action::{MobiusDWFAdj, MobiusDWFAdjPar};
pub use contraction::{MesonAdj, MesonAdjPar};
pub use fermion::{GaugePropAdj, GaugePropAdjPar};
pub use gauge::{FundtoAdjoint, FundtoAdjointPar};
pub use io::{LoadNersc, LoadNerscPar};
pub use sink::{ScalarPoint, ScalarPointPar};
pub use solver::{RBPrecCGAdj, RBPrecCGAdjPar};
pub use source::{Z2Adj, Z2AdjPar};

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;

use super::{ModuleInputs, ModuleRegistry, Product};
use crate::core::global_context::GlobalContext;
use crate::error::{ModuleError, ModuleResult};

/// Register every built-in module type.
pub fn register_builtin_modules(registry: &mut ModuleRegistry) {
    registry.register_type::<LoadNersc>();
    registry.register_type::<FundtoAdjoint>();
    registry.register_type::<Z2Adj>();
    registry.register_type::<ScalarPoint>();
    registry.register_type::<MobiusDWFAdj>();
    registry.register_type::<RBPrecCGAdj>();
    registry.register_type::<GaugePropAdj>();
    registry.register_type::<MesonAdj>();
}

/// Build a provenance descriptor for a product of `name`.
pub(crate) fn describe<P: Serialize>(
    kind: &str,
    name: &str,
    module_type: &str,
    par: &P,
    inputs: &ModuleInputs,
    upstream: &[&str],
    context: &GlobalContext,
) -> ModuleResult<Product> {
    let mut lineage = Map::new();
    for input in upstream {
        let product = inputs.get(input)?;
        lineage.insert(
            (*input).to_string(),
            json!({
                "kind": product.kind,
                "producer": product.data.get("producer").cloned().unwrap_or(Value::Null),
            }),
        );
    }

    Ok(Product::new(
        kind,
        json!({
            "producer": name,
            "module_type": module_type,
            "parameters": serde_json::to_value(par)?,
            "run_id": context.run_id(),
            "trajectory": context.trajectory(),
            "upstream": Value::Object(lineage),
        }),
    ))
}

/// Parse a whitespace separated list of exactly `expected` values.
pub(crate) fn parse_components<T: FromStr>(
    field: &str,
    text: &str,
    expected: usize,
) -> ModuleResult<Vec<T>> {
    let values = text
        .split_whitespace()
        .map(|part| {
            part.parse::<T>().map_err(|_| {
                ModuleError::InvalidParameters(format!("{}: cannot parse '{}'", field, part))
            })
        })
        .collect::<ModuleResult<Vec<T>>>()?;

    if values.len() != expected {
        return Err(ModuleError::InvalidParameters(format!(
            "{}: expected {} components, found {}",
            field,
            expected,
            values.len()
        )));
    }
    Ok(values)
}

pub(crate) fn require_reference(field: &str, value: &str) -> ModuleResult<()> {
    if value.trim().is_empty() {
        return Err(ModuleError::InvalidParameters(format!(
            "{} must name another module",
            field
        )));
    }
    Ok(())
}
