//! 规则集合与覆盖引擎
//!
//! `RuleSet` 是按字段有序的约束容器，提供通用的映射操作以及唯一带覆盖语义的 `replace`。

use crate::entry::{parse_rule_string, parse_rules, ParsedRules, RULE_SEPARATOR};
use crate::error::{Result, RuleError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// 交给外部校验引擎的最终映射：字段 -> 约束
pub type RuleMap = IndexMap<String, RuleValue>;

/// 字段约束值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// `|` 分隔的约束字符串
    Text(String),
    /// 约束序列
    List(Vec<String>),
    /// 其他字面值，原样保存
    Other(Value),
}

impl RuleValue {
    /// 是否为空值（空字符串、"0"、空序列、null/false/0 等）
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty() || s == "0",
            Self::List(items) => items.is_empty(),
            Self::Other(value) => match value {
                Value::Null => true,
                Value::Bool(b) => !b,
                Value::Number(n) => n.as_f64() == Some(0.0),
                Value::String(s) => s.is_empty() || s == "0",
                Value::Array(arr) => arr.is_empty(),
                Value::Object(map) => map.is_empty(),
            },
        }
    }

    /// 解析为约束条目
    pub fn parse(&self) -> ParsedRules {
        match self {
            Self::Text(s) => parse_rule_string(s),
            Self::List(items) => parse_rules(items),
            Self::Other(Value::String(s)) => parse_rule_string(s),
            Self::Other(Value::Array(items)) => parse_rules(items.iter().map(scalar_token)),
            Self::Other(value @ (Value::Number(_) | Value::Bool(_))) => {
                parse_rule_string(&value.to_string())
            }
            Self::Other(_) => ParsedRules::new(),
        }
    }

    /// 转换为约束字符串，序列以 `|` 拼接，null 为空串
    pub fn to_rule_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(RULE_SEPARATOR),
            Self::Other(Value::Array(items)) => items
                .iter()
                .map(scalar_token)
                .filter(|token| !token.is_empty())
                .collect::<Vec<_>>()
                .join(RULE_SEPARATOR),
            Self::Other(value) => scalar_token(value),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rule_string())
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for RuleValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for RuleValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<ParsedRules> for RuleValue {
    fn from(parsed: ParsedRules) -> Self {
        Self::Text(parsed.to_rule_string())
    }
}

impl From<Value> for RuleValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Array(arr) if arr.iter().all(Value::is_string) => Self::List(
                arr.into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            other => Self::Other(other),
        }
    }
}

impl PartialEq<&str> for RuleValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// 变换函数的返回值
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    /// 约束条目，写回时按顺序拼接原文
    Entries(ParsedRules),
    /// 任意字面值，原样写回
    Value(RuleValue),
}

impl From<ParsedRules> for Transformed {
    fn from(parsed: ParsedRules) -> Self {
        Self::Entries(parsed)
    }
}

impl From<RuleValue> for Transformed {
    fn from(value: RuleValue) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Transformed {
    fn from(s: &str) -> Self {
        Self::Value(s.into())
    }
}

impl From<String> for Transformed {
    fn from(s: String) -> Self {
        Self::Value(s.into())
    }
}

impl From<Value> for Transformed {
    fn from(value: Value) -> Self {
        Self::Value(value.into())
    }
}

type TransformFn<'a> = Box<dyn FnOnce(ParsedRules) -> Transformed + 'a>;

/// `replace` 的覆盖方式
pub enum Override<'a> {
    /// 直接写入字面值
    Literal(RuleValue),
    /// 对当前约束条目应用变换
    Transform(TransformFn<'a>),
}

impl<'a> Override<'a> {
    pub fn literal(value: impl Into<RuleValue>) -> Self {
        Self::Literal(value.into())
    }

    pub fn transform<F, T>(f: F) -> Self
    where
        F: FnOnce(ParsedRules) -> T + 'a,
        T: Into<Transformed>,
    {
        Self::Transform(Box::new(move |parsed| f(parsed).into()))
    }
}

impl fmt::Debug for Override<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<&str> for Override<'_> {
    fn from(s: &str) -> Self {
        Self::literal(s)
    }
}

impl From<String> for Override<'_> {
    fn from(s: String) -> Self {
        Self::literal(s)
    }
}

impl From<RuleValue> for Override<'_> {
    fn from(value: RuleValue) -> Self {
        Self::Literal(value)
    }
}

/// 有序的字段约束集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: IndexMap<String, RuleValue>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 映射构建，非对象输入返回 `InvalidInput`
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(RuleError::InvalidInput(format!(
                "基础规则必须是字段映射，实际为 {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&RuleValue> {
        self.rules.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    /// 写入字段约束，已有字段保持原位置
    pub fn put(&mut self, field: impl Into<String>, value: impl Into<RuleValue>) -> &mut Self {
        self.rules.insert(field.into(), value.into());
        self
    }

    pub fn forget(&mut self, field: &str) -> &mut Self {
        self.rules.shift_remove(field);
        self
    }

    /// 覆盖已有字段的约束
    ///
    /// 字段不存在或为空时不做任何修改。变换返回 [`Transformed::Entries`] 时按顺序拼接各条目原文，
    /// 否则原样写入返回值。字段位置保持不变。
    pub fn replace<'a>(&mut self, field: &str, value: impl Into<Override<'a>>) -> &mut Self {
        let Some(current) = self.rules.get(field).filter(|v| !v.is_blank()) else {
            debug!(field = %field, "字段不存在或为空，跳过覆盖");
            return self;
        };

        let value = match value.into() {
            Override::Literal(value) => value,
            Override::Transform(transform) => match transform(current.parse()) {
                Transformed::Entries(parsed) => RuleValue::Text(parsed.to_rule_string()),
                Transformed::Value(value) => value,
            },
        };

        if let Some(slot) = self.rules.get_mut(field) {
            *slot = value;
        }
        self
    }

    /// 以变换函数覆盖字段约束
    pub fn replace_with<F, T>(&mut self, field: &str, transform: F) -> &mut Self
    where
        F: FnOnce(ParsedRules) -> T,
        T: Into<Transformed>,
    {
        self.replace(field, Override::transform(transform))
    }

    /// 合并另一组约束，已有字段原位覆盖，新字段追加到末尾
    pub fn merge<I, K, V>(&mut self, rules: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RuleValue>,
    {
        for (field, value) in rules {
            self.put(field, value);
        }
        self
    }

    /// 重写所有字段的约束
    pub fn map_values<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&str, RuleValue) -> RuleValue,
    {
        self.rules = std::mem::take(&mut self.rules)
            .into_iter()
            .map(|(field, value)| {
                let value = f(field.as_str(), value);
                (field, value)
            })
            .collect();
        self
    }

    /// 仅保留满足条件的字段
    pub fn filter<F>(&mut self, mut keep: F) -> &mut Self
    where
        F: FnMut(&str, &RuleValue) -> bool,
    {
        self.rules.retain(|field, value| keep(field.as_str(), value));
        self
    }

    /// 仅保留指定字段
    pub fn only(&mut self, fields: &[&str]) -> &mut Self {
        self.filter(|field, _| fields.contains(&field))
    }

    /// 移除指定字段
    pub fn except(&mut self, fields: &[&str]) -> &mut Self {
        self.filter(|field, _| !fields.contains(&field))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleValue)> {
        self.rules.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// 转换为普通映射
    pub fn into_map(self) -> RuleMap {
        self.rules
    }

    /// 转换为字段 -> 约束字符串映射
    pub fn to_string_map(&self) -> IndexMap<String, String> {
        self.rules
            .iter()
            .map(|(field, value)| (field.clone(), value.to_rule_string()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for RuleSet
where
    K: Into<String>,
    V: Into<RuleValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rule_set = Self::new();
        rule_set.merge(iter);
        rule_set
    }
}

impl TryFrom<Value> for RuleSet {
    type Error = RuleError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<RuleSet> for RuleMap {
    fn from(rule_set: RuleSet) -> Self {
        rule_set.into_map()
    }
}

/// 单个 JSON 值的约束原文
fn scalar_token(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
