//! Parameter parser: converts raw YAML/JSON/TOML text into [`RunParameters`].

use std::path::Path;

use super::schema::RunParameters;
use crate::error::{ApplicationError, ApplicationResult};

/// Supported parameter file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl ParameterFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> ApplicationResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(ParameterFormat::Yaml),
            Some("json") => Ok(ParameterFormat::Json),
            Some("toml") => Ok(ParameterFormat::Toml),
            other => Err(ApplicationError::ParameterParse(format!(
                "unsupported parameter file extension: {:?}",
                other
            ))),
        }
    }
}

/// Parse parameter content into RunParameters
pub fn parse_parameters(
    content: &str,
    format: ParameterFormat,
) -> ApplicationResult<RunParameters> {
    let params: RunParameters = match format {
        ParameterFormat::Yaml => serde_saphyr::from_str(content)
            .map_err(|e| ApplicationError::ParameterParse(e.to_string()))?,
        ParameterFormat::Json => serde_json::from_str(content)
            .map_err(|e| ApplicationError::ParameterParse(e.to_string()))?,
        ParameterFormat::Toml => {
            // Module options are serde_json::Value, so go through JSON.
            let toml_val: toml::Value = toml::from_str(content)
                .map_err(|e| ApplicationError::ParameterParse(e.to_string()))?;
            serde_json::from_value(toml_value_to_json(toml_val))
                .map_err(|e| ApplicationError::ParameterParse(e.to_string()))?
        }
    };
    params.global.validate()?;
    Ok(params)
}

/// Read and parse a parameter file, inferring the format from its extension.
pub fn read_parameters_file(path: &Path) -> ApplicationResult<RunParameters> {
    let format = ParameterFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| {
        ApplicationError::ParameterParse(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_parameters(&content, format)
}

/// Convert a [`toml::Value`] into a [`serde_json::Value`].
///
/// TOML datetimes are stringified.
fn toml_value_to_json(val: toml::Value) -> serde_json::Value {
    match val {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_value_to_json).collect())
        }
        toml::Value::Table(tbl) => serde_json::Value::Object(
            tbl.into_iter()
                .map(|(k, v)| (k, toml_value_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
    }
}
