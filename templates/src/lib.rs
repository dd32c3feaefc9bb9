//! Loading and holding the template YAML file: `{ templates: {id: text},
//! step_types: {code: label} }`. Kept separate from the core decoder crate
//! the way the teacher keeps its on-disk program format (`vexfile`)
//! separate from the instruction set it serializes (`vcpu`).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TemplatesError {
    #[error("failed to read template file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to parse template YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTemplateFile {
    #[serde(default)]
    templates: HashMap<String, String>,
    #[serde(default)]
    step_types: HashMap<String, String>,
}

/// A loaded template set: raw template text keyed by `template_id`, and
/// optional human labels for numeric step-type codes.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: HashMap<String, String>,
    step_types: HashMap<i32, String>,
}

impl TemplateSet {
    pub fn load_str(yaml: &str) -> Result<TemplateSet, TemplatesError> {
        let raw: RawTemplateFile = serde_yaml::from_str(yaml)?;
        let step_types = raw
            .step_types
            .into_iter()
            .filter_map(|(k, v)| k.parse::<i32>().ok().map(|k| (k, v)))
            .collect();
        Ok(TemplateSet { templates: raw.templates, step_types })
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<TemplateSet, TemplatesError> {
        let path_ref = path.as_ref();
        let text = std::fs::read_to_string(path_ref).map_err(|source| TemplatesError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        TemplateSet::load_str(&text)
    }

    /// The bundled default set, so the decoder works without a
    /// host-supplied template file.
    pub fn default_bundled() -> TemplateSet {
        TemplateSet::load_str(include_str!("templates.yml"))
            .expect("bundled templates.yml is valid YAML")
    }

    pub fn template(&self, id: &str) -> Option<&str> {
        self.templates.get(id).map(String::as_str)
    }

    pub fn step_type_label(&self, code: i32) -> Option<&str> {
        self.step_types.get(&code).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_yaml() {
        let set = TemplateSet::load_str(
            "templates:\n  JUMP: 'Go to {{target}}'\nstep_types:\n  1: 'Numeric If'\n",
        )
        .unwrap();
        assert_eq!(set.template("JUMP"), Some("Go to {{target}}"));
        assert_eq!(set.step_type_label(1), Some("Numeric If"));
        assert_eq!(set.template("MISSING"), None);
    }

    #[test]
    fn bundled_defaults_cover_every_template_id_the_parser_emits() {
        let set = TemplateSet::default_bundled();
        for id in ["ASSIGNMENT", "IF_COMPARE", "FUNCTION_CALL", "JUMP", "DATE_DIFF", "TYPE_CHECK"] {
            assert!(set.template(id).is_some(), "missing template {id}");
        }
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(TemplateSet::load_str("templates: [this, is, not, a, map]").is_err());
    }
}
