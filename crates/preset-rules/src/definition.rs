//! 声明式规则定义
//!
//! 以 JSON 描述基础规则与预设步骤，无需编写代码即可接入解析器：
//!
//! ```json
//! {
//!   "rules": { "email": "required|string" },
//!   "presets": {
//!     "onCreate": [
//!       { "op": "set_entry", "field": "email", "entry": "email" },
//!       { "op": "put", "field": "password", "value": "required|min:8" }
//!     ]
//!   }
//! }
//! ```

use crate::entry::RuleEntry;
use crate::error::{Result, RuleError};
use crate::resolver::{PresetRegistry, RuleDefinition};
use crate::rule_set::{RuleSet, RuleValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// 预设步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PresetOperation {
    /// 写入字段约束
    Put { field: String, value: RuleValue },
    /// 以字面值覆盖已有字段
    Replace { field: String, value: RuleValue },
    /// 在已有字段中插入或更新一条约束
    SetEntry { field: String, entry: String },
    /// 从已有字段中移除一条约束
    RemoveEntry { field: String, name: String },
    /// 移除字段
    Forget { field: String },
    /// 合并一组字段约束
    Merge { rules: IndexMap<String, RuleValue> },
}

impl PresetOperation {
    pub fn apply(&self, rules: &mut RuleSet) {
        match self {
            Self::Put { field, value } => {
                rules.put(field.clone(), value.clone());
            }
            Self::Replace { field, value } => {
                rules.replace(field, value.clone());
            }
            Self::SetEntry { field, entry } => {
                rules.replace_with(field, |mut entries| {
                    entries.insert(RuleEntry::new(entry.clone()));
                    entries
                });
            }
            Self::RemoveEntry { field, name } => {
                rules.replace_with(field, |mut entries| {
                    entries.forget(name);
                    entries
                });
            }
            Self::Forget { field } => {
                rules.forget(field);
            }
            Self::Merge { rules: other } => {
                rules.merge(other.clone());
            }
        }
    }

    fn validate(&self, preset: &str) -> Result<()> {
        let field = match self {
            Self::Put { field, .. }
            | Self::Replace { field, .. }
            | Self::SetEntry { field, .. }
            | Self::RemoveEntry { field, .. }
            | Self::Forget { field } => field,
            Self::Merge { .. } => return Ok(()),
        };

        if field.is_empty() {
            return Err(RuleError::DefinitionError(format!(
                "预设 '{}' 中的字段名不能为空",
                preset
            )));
        }

        match self {
            Self::SetEntry { entry, .. } if entry.is_empty() => Err(RuleError::DefinitionError(
                format!("预设 '{}' 的 set_entry 约束不能为空", preset),
            )),
            Self::RemoveEntry { name, .. } if name.is_empty() => Err(RuleError::DefinitionError(
                format!("预设 '{}' 的 remove_entry 约束名不能为空", preset),
            )),
            _ => Ok(()),
        }
    }
}

fn empty_rules() -> Value {
    Value::Object(Default::default())
}

/// 声明式规则定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDefinition {
    #[serde(default = "empty_rules")]
    pub rules: Value,
    #[serde(default)]
    pub presets: IndexMap<String, Vec<PresetOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess: Option<bool>,
}

impl RuleSetDefinition {
    /// 从 JSON 字符串加载
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// 从 JSON 文件加载
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let definition = Self::from_json(&content)?;

        info!(
            path = %path.display(),
            presets = definition.presets.len(),
            "规则定义已加载"
        );
        Ok(definition)
    }

    /// 校验预设步骤
    pub fn validate(&self) -> Result<()> {
        for (name, operations) in &self.presets {
            if name.is_empty() {
                return Err(RuleError::DefinitionError("预设名不能为空".to_string()));
            }
            for operation in operations {
                operation.validate(name)?;
            }
        }
        Ok(())
    }
}

impl RuleDefinition for RuleSetDefinition {
    fn rules(&self) -> Value {
        self.rules.clone()
    }

    fn register_presets(&self, registry: &mut PresetRegistry<Self>) {
        for (name, operations) in &self.presets {
            let operations = operations.clone();
            registry.register(name.clone(), move |_, rules| {
                for operation in &operations {
                    operation.apply(rules);
                }
            });
        }
    }

    fn guess(&self) -> bool {
        self.guess.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use serde_json::json;

    const DEFINITION: &str = r#"
    {
        "rules": {
            "email": "required|string",
            "age": ["numeric"]
        },
        "presets": {
            "onCreate": [
                { "op": "set_entry", "field": "email", "entry": "email" },
                { "op": "put", "field": "password", "value": "required|min:8" }
            ],
            "onUpdate": [
                { "op": "replace", "field": "password", "value": "nullable|min:8" },
                { "op": "remove_entry", "field": "email", "name": "required" },
                { "op": "forget", "field": "age" }
            ],
            "withProfile": [
                { "op": "merge", "rules": { "bio": "nullable|max:500", "email": "sometimes" } }
            ]
        }
    }
    "#;

    #[test]
    fn test_parse_definition() {
        let definition = RuleSetDefinition::from_json(DEFINITION).unwrap();
        assert_eq!(definition.presets.len(), 3);
        assert_eq!(
            definition.presets["onCreate"][0],
            PresetOperation::SetEntry {
                field: "email".to_string(),
                entry: "email".to_string(),
            }
        );
        assert_eq!(definition.guess, None);
    }

    #[test]
    fn test_declarative_presets_apply_in_order() {
        let definition = RuleSetDefinition::from_json(DEFINITION).unwrap();
        let mut resolver = Resolver::with_presets(definition, ["onCreate", "onUpdate"]).unwrap();
        let rules = resolver.get_rules().to_string_map();

        assert_eq!(rules["email"], "string|email");
        assert_eq!(rules["password"], "nullable|min:8");
        assert!(!rules.contains_key("age"));
    }

    #[test]
    fn test_merge_keeps_existing_positions() {
        let definition = RuleSetDefinition::from_json(DEFINITION).unwrap();
        let mut resolver = Resolver::with_presets(definition, "withProfile").unwrap();
        let rules = resolver.get_rules();

        assert_eq!(rules.keys().collect::<Vec<_>>(), vec!["email", "age", "bio"]);
        assert_eq!(rules.get("email").unwrap(), &"sometimes");
    }

    #[test]
    fn test_invalid_operation_rejected() {
        let err = RuleSetDefinition::from_json(
            r#"{ "presets": { "p": [ { "op": "set_entry", "field": "email", "entry": "" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::DefinitionError(_)));

        let err = RuleSetDefinition::from_json(
            r#"{ "presets": { "p": [ { "op": "explode", "field": "email" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::JsonError(_)));
    }

    #[test]
    fn test_non_mapping_rules_fail_at_resolver() {
        let definition = RuleSetDefinition::from_json(r#"{ "rules": ["required"] }"#).unwrap();
        let err = Resolver::new(definition).unwrap_err();
        assert!(matches!(err, RuleError::InvalidInput(_)));
    }

    #[test]
    fn test_guess_flag_from_definition() {
        let definition = RuleSetDefinition::from_json(r#"{ "guess": false }"#).unwrap();
        assert_eq!(definition.rules, json!({}));

        let resolver = Resolver::new(definition).unwrap();
        assert!(!resolver.guess());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, DEFINITION).unwrap();

        let definition = RuleSetDefinition::from_path(&path).unwrap();
        assert!(definition.presets.contains_key("onUpdate"));

        let err = RuleSetDefinition::from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, RuleError::Io(_)));
    }
}
