//! 预设解析器
//!
//! 领域对象通过 [`RuleDefinition`] 声明基础规则并注册具名预设，
//! [`Resolver`] 按声明顺序依次执行预设，累积出最终的 [`RuleSet`]。

use crate::error::Result;
use crate::rule_set::RuleSet;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument};

/// 预设处理函数：读取定义，原地修改规则集合
pub type PresetHandler<D> = Box<dyn Fn(&D, &mut RuleSet)>;

/// 预设注册表：预设名 -> 处理函数
pub struct PresetRegistry<D> {
    handlers: IndexMap<String, PresetHandler<D>>,
}

impl<D> PresetRegistry<D> {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// 注册预设，同名预设会被覆盖
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&D, &mut RuleSet) + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PresetHandler<D>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<D> Default for PresetRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for PresetRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("presets", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 规则定义：由领域对象实现
pub trait RuleDefinition: Sized {
    /// 基础规则，必须是字段映射
    fn rules(&self) -> Value {
        Value::Object(Default::default())
    }

    /// 注册本定义提供的预设
    fn register_presets(&self, registry: &mut PresetRegistry<Self>);

    /// 未显式声明预设时是否按调用方推断
    fn guess(&self) -> bool {
        true
    }
}

/// 预设名输入：单个名称或名称序列
pub trait IntoPresets {
    fn into_presets(self) -> Vec<String>;
}

impl IntoPresets for &str {
    fn into_presets(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoPresets for String {
    fn into_presets(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: Into<String>> IntoPresets for Vec<S> {
    fn into_presets(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoPresets for [S; N] {
    fn into_presets(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: AsRef<str>> IntoPresets for &[S] {
    fn into_presets(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

/// 预设解析器
pub struct Resolver<D: RuleDefinition> {
    definition: D,
    registry: PresetRegistry<D>,
    presets: Vec<String>,
    base: RuleSet,
    rules: RuleSet,
    guess: bool,
}

impl<D: RuleDefinition> Resolver<D> {
    /// 创建解析器，基础规则不是字段映射时返回 `InvalidInput`
    pub fn new(definition: D) -> Result<Self> {
        let base = RuleSet::from_value(definition.rules())?;

        let mut registry = PresetRegistry::new();
        definition.register_presets(&mut registry);

        let guess = definition.guess();

        Ok(Self {
            definition,
            registry,
            presets: Vec::new(),
            rules: base.clone(),
            base,
            guess,
        })
    }

    /// 创建解析器并显式声明预设
    pub fn with_presets(definition: D, presets: impl IntoPresets) -> Result<Self> {
        let mut resolver = Self::new(definition)?;
        resolver.set_presets(presets);
        Ok(resolver)
    }

    pub fn set_presets(&mut self, presets: impl IntoPresets) -> &mut Self {
        self.presets = presets.into_presets();
        self
    }

    pub fn get_presets(&self) -> &[String] {
        &self.presets
    }

    pub fn guess(&self) -> bool {
        self.guess
    }

    pub fn set_guess(&mut self, guess: bool) -> &mut Self {
        self.guess = guess;
        self
    }

    pub fn registry(&self) -> &PresetRegistry<D> {
        &self.registry
    }

    /// 当前规则集合（最近一次组装的结果）
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// 按声明顺序执行预设并返回组装后的规则
    ///
    /// 每次调用都从基础规则重新开始，未注册的预设直接跳过。
    #[instrument(skip(self), fields(presets = ?self.presets))]
    pub fn get_rules(&mut self) -> &RuleSet {
        self.rules = self.base.clone();

        for name in &self.presets {
            match self.registry.get(name) {
                Some(handler) => {
                    debug!(preset = %name, "执行预设");
                    handler(&self.definition, &mut self.rules);
                }
                None => debug!(preset = %name, "预设未注册，跳过"),
            }
        }

        &self.rules
    }
}

impl<D: RuleDefinition + fmt::Debug> fmt::Debug for Resolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("definition", &self.definition)
            .field("registry", &self.registry)
            .field("presets", &self.presets)
            .field("rules", &self.rules)
            .field("guess", &self.guess)
            .finish()
    }
}
