//! Naming and binding-rendering knobs. Every field has a default, so an empty
//! `{}` config file is valid.
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub naming: NamingConfig,
    pub binding: BindingStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// Appended to title-cased field names and overrides (`bar` → `BarType`).
    pub type_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self { type_suffix: "Type".into() }
    }
}

/// How binding paths are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingStyle {
    pub separator: String,
    /// Placeholder inside `[...]` for an array field with no concrete index.
    pub wildcard: String,
    pub template_open: String,
    pub template_close: String,
    pub back_reference_prefix: String,
}

impl Default for BindingStyle {
    fn default() -> Self {
        Self {
            separator: ".".into(),
            wildcard: "*".into(),
            template_open: "{{".into(),
            template_close: "}}".into(),
            back_reference_prefix: "$".into(),
        }
    }
}

impl Config {
    pub fn from_json_str(src: &str) -> Result<Self, String> {
        from_str_with_path(src)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let src = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        from_str_with_path(&src).map_err(|e| format!("{}: {e}", path.display()))
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = Config::from_json_str(r#"{ "binding": { "separator": "/" } }"#).unwrap();
        assert_eq!(cfg.binding.separator, "/");
        assert_eq!(cfg.binding.wildcard, "*");
        assert_eq!(cfg.naming.type_suffix, "Type");
    }

    #[test]
    fn errors_name_the_json_path() {
        let err = Config::from_json_str(r#"{ "naming": { "type_suffix": 7 } }"#).unwrap_err();
        assert!(err.contains("naming.type_suffix"), "{err}");
        let err = Config::from_json_str(r#"{ "binding": { "sep": "/" } }"#).unwrap_err();
        assert!(err.contains("binding"), "{err}");
    }
}
