#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

const EMBEDDED_CATALOG: &str = include_str!("../../../assets/models.json");

pub const FALLBACK_ASPECT_RATIOS: [&str; 6] = ["1:1", "16:9", "9:16", "4:3", "3:2", "21:9"];
pub const FALLBACK_RESOLUTIONS: [&str; 3] = ["1K", "2K", "4K"];

fn default_kind() -> String {
    return "string".to_string();
}

/// Describes a single input accepted by a model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterSpec {
    /// A fixed set of legal values. The first value is the one selected by
    /// default in pickers.
    Enum {
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// A numeric parameter bounded by `min` and `max`.
    Range {
        min: f64,
        max: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
    },
    /// Anything else, such as the prompt itself or a seed.
    Free {
        #[serde(default = "default_kind")]
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<serde_json::Value>,
    },
}

impl ParameterSpec {
    pub fn enum_values(&self) -> Option<&[String]> {
        if let ParameterSpec::Enum { values, .. } = self {
            if !values.is_empty() {
                return Some(values);
            }
        }

        return None;
    }

    pub fn describe(&self) -> String {
        match self {
            ParameterSpec::Enum { values, default } => {
                let mut res = format!("one of [{}]", values.join(", "));
                if let Some(val) = default {
                    res = format!("{res}, default {val}");
                }
                return res;
            }
            ParameterSpec::Range {
                min,
                max,
                step,
                default,
            } => {
                let mut res = format!("{min} to {max}");
                if let Some(val) = step {
                    res = format!("{res} in steps of {val}");
                }
                if let Some(val) = default {
                    res = format!("{res}, default {val}");
                }
                return res;
            }
            ParameterSpec::Free { kind, default } => {
                if let Some(val) = default {
                    return format!("{kind}, default {val}");
                }
                return kind.to_string();
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub inputs: BTreeMap<String, ParameterSpec>,
}

impl ModelDescriptor {
    /// Path segment the remote service exposes this model under.
    pub fn endpoint(&self) -> &str {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.is_empty() {
                return endpoint;
            }
        }

        return &self.id;
    }

    pub fn enum_input(&self, name: &str) -> Option<&[String]> {
        return self.inputs.get(name).and_then(|spec| return spec.enum_values());
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    models: Vec<ModelDescriptor>,
}

impl Catalog {
    pub fn from_json(payload: &str) -> Result<Catalog> {
        let models: Vec<ModelDescriptor> = serde_json::from_str(payload)?;
        if models.is_empty() {
            bail!("Model catalog does not contain any models");
        }

        let mut seen = HashSet::new();
        for model in models.iter() {
            if model.id.trim().is_empty() {
                bail!(format!("Model catalog entry '{}' has an empty id", model.name));
            }
            if !seen.insert(model.id.to_string()) {
                bail!(format!("Model catalog contains duplicate id '{}'", model.id));
            }
        }

        return Ok(Catalog { models });
    }

    pub fn embedded() -> Result<Catalog> {
        return Catalog::from_json(EMBEDDED_CATALOG);
    }

    /// Loads the catalog shipped with the binary, or the JSON file at
    /// `catalog_file` when one is configured.
    pub fn load(catalog_file: &str) -> Result<Catalog> {
        if catalog_file.is_empty() {
            return Catalog::embedded();
        }

        let payload = fs::read_to_string(catalog_file)?;
        let catalog = Catalog::from_json(&payload)?;
        tracing::debug!(
            catalog_file = catalog_file,
            models = catalog.models.len(),
            "loaded model catalog"
        );

        return Ok(catalog);
    }

    pub fn list(&self) -> &[ModelDescriptor] {
        return &self.models;
    }

    pub fn default_model(&self) -> &ModelDescriptor {
        return &self.models[0];
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ModelDescriptor> {
        return self.models.iter().find(|model| return model.id == id);
    }

    pub fn aspect_ratios_for(&self, id: &str) -> Vec<String> {
        if let Some(values) = self
            .find_by_id(id)
            .and_then(|model| return model.enum_input("aspect_ratio"))
        {
            return values.to_vec();
        }

        return FALLBACK_ASPECT_RATIOS
            .iter()
            .map(|ratio| return ratio.to_string())
            .collect();
    }

    pub fn resolutions_for(&self, id: &str) -> Vec<String> {
        if let Some(model) = self.find_by_id(id) {
            if let Some(values) = model.enum_input("resolution") {
                return values.iter().map(|val| return val.to_uppercase()).collect();
            }
            if let Some(values) = model.enum_input("megapixels") {
                return values.to_vec();
            }
        }

        if id.contains("flux") || id.contains("midjourney") {
            return vec!["1K".to_string()];
        }

        return FALLBACK_RESOLUTIONS
            .iter()
            .map(|res| return res.to_string())
            .collect();
    }

    /// Resolution pickers are only shown for models that declare a
    /// `resolution` or `megapixels` enum.
    pub fn has_resolution_control(&self, id: &str) -> bool {
        if let Some(model) = self.find_by_id(id) {
            return model.enum_input("resolution").is_some()
                || model.enum_input("megapixels").is_some();
        }

        return false;
    }
}
