//! 预设规则组装
//!
//! 以具名预设组合字段约束字符串，提供：
//! - `|` 分隔约束的解析与拼接
//! - 带覆盖语义的规则集合
//! - 按声明顺序执行的预设解析器
//! - 按调用方动作名推断预设的约定层
//! - JSON 声明式规则定义

pub mod config;
pub mod definition;
pub mod entry;
pub mod error;
pub mod facade;
pub mod observability;
pub mod resolver;
pub mod rule_set;

pub use definition::{PresetOperation, RuleSetDefinition};
pub use entry::{parse_rule_string, parse_rules, ParsedRules, RuleEntry};
pub use error::{Result, RuleError};
pub use facade::SmartRule;
pub use resolver::{IntoPresets, PresetHandler, PresetRegistry, Resolver, RuleDefinition};
pub use rule_set::{Override, RuleMap, RuleSet, RuleValue, Transformed};
