//! 规则条目编解码
//!
//! 将 `|` 分隔的约束字符串解析成按名称去重、保持首次出现顺序的条目集合，
//! 并支持反向拼接回原始字符串。

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// 约束分隔符
pub const RULE_SEPARATOR: &str = "|";

/// 约束名与参数之间的分隔符
pub const PARAM_SEPARATOR: char = ':';

/// 单条约束
///
/// `name` 为 `raw` 中第一个 `:` 之前的部分，没有 `:` 时等于整个 `raw`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub name: String,
    pub raw: String,
}

impl RuleEntry {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let name = raw
            .split_once(PARAM_SEPARATOR)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| raw.clone());

        Self { name, raw }
    }

    /// 约束参数（`max:10` 中的 `10`）
    pub fn params(&self) -> Option<&str> {
        self.raw.split_once(PARAM_SEPARATOR).map(|(_, params)| params)
    }
}

impl From<&str> for RuleEntry {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// 解析后的约束集合：约束名 -> 原始约束
///
/// 键顺序为各约束名首次出现的顺序；重复的约束名更新为最后一次出现的原文，
/// 位置保持在首次出现处。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParsedRules {
    entries: IndexMap<String, String>,
}

impl ParsedRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按约束名获取原始约束
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 插入或更新一条约束，约束名由原文推导
    pub fn put(&mut self, raw: impl Into<String>) -> &mut Self {
        let entry = RuleEntry::new(raw);
        self.insert(entry);
        self
    }

    /// 插入或更新一条约束，已有同名约束时保持其位置
    pub fn insert(&mut self, entry: RuleEntry) -> Option<String> {
        self.entries.insert(entry.name, entry.raw)
    }

    /// 移除约束，其余约束保持原有顺序
    pub fn forget(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = RuleEntry> + '_ {
        self.entries.iter().map(|(name, raw)| RuleEntry {
            name: name.clone(),
            raw: raw.clone(),
        })
    }

    /// 按顺序拼接所有约束原文（不含约束名）
    pub fn to_rule_string(&self) -> String {
        self.values().collect::<Vec<_>>().join(RULE_SEPARATOR)
    }
}

impl fmt::Display for ParsedRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rule_string())
    }
}

impl<S: AsRef<str>> FromIterator<S> for ParsedRules {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        parse_rules(iter)
    }
}

/// 解析约束序列
///
/// 空约束被跳过，空输入得到空集合。
pub fn parse_rules<I, S>(tokens: I) -> ParsedRules
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedRules::new();

    for token in tokens {
        let token = token.as_ref();
        if token.is_empty() {
            continue;
        }
        parsed.put(token);
    }

    parsed
}

/// 解析 `|` 分隔的约束字符串
pub fn parse_rule_string(rules: &str) -> ParsedRules {
    parse_rules(rules.split(RULE_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_before_first_separator() {
        let entry = RuleEntry::new("regex:^a:b$");
        assert_eq!(entry.name, "regex");
        assert_eq!(entry.params(), Some("^a:b$"));

        let entry = RuleEntry::from("required");
        assert_eq!(entry.name, "required");
        assert_eq!(entry.params(), None);
    }

    #[test]
    fn test_parse_single_parameterized_rule() {
        let parsed = parse_rule_string("in:a,b,c");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("in"), Some("in:a,b,c"));
    }

    #[test]
    fn test_repeated_name_keeps_first_position_last_value() {
        let parsed = parse_rule_string("max:10|required|string|max:20");
        assert_eq!(parsed.names().collect::<Vec<_>>(), vec!["max", "required", "string"]);
        assert_eq!(parsed.to_rule_string(), "max:20|required|string");
    }

    #[test]
    fn test_parse_sequence_matches_string() {
        let from_tokens = parse_rules(["required", "min:3", "max:10"]);
        let from_string = parse_rule_string("required|min:3|max:10");
        assert_eq!(from_tokens, from_string);
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        assert!(parse_rule_string("").is_empty());
        assert!(parse_rules(Vec::<String>::new()).is_empty());
        assert_eq!(parse_rule_string("a||b").to_rule_string(), "a|b");
    }

    #[test]
    fn test_put_and_forget() {
        let mut parsed = parse_rule_string("required|max:10|string");
        parsed.put("max:5").put("email");
        assert_eq!(parsed.to_rule_string(), "required|max:5|string|email");

        assert_eq!(parsed.forget("string"), Some("string".to_string()));
        assert!(!parsed.has("string"));
        assert_eq!(parsed.to_string(), "required|max:5|email");
    }
}
