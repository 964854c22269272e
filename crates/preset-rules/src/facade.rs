//! 约定层
//!
//! 未显式声明预设且允许推断时，以调用方的动作名作为预设名，
//! 驱动解析器组装规则，并转换为交给外部校验引擎的普通映射。

use crate::resolver::{RuleDefinition, Resolver};
use crate::rule_set::{RuleMap, RuleSet};
use tracing::{debug, instrument};

/// 展开为所在函数的名称，供 [`rules`] 的 `action` 参数使用
///
/// 在闭包中展开时得到的是外层函数名。
#[macro_export]
macro_rules! action_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.rsplit("::")
            .find(|segment| *segment != "{{closure}}")
            .unwrap_or(name)
    }};
}

/// 组装规则
///
/// `action` 为调用方动作名，仅在解析器没有预设且 `guess` 为真时作为预设名。
pub fn rules<D: RuleDefinition>(resolver: &mut Resolver<D>, action: &str) -> RuleMap {
    assemble(resolver, action, None::<fn(RuleSet) -> RuleSet>)
}

/// 组装规则，并在转换前对结果应用回调
pub fn rules_with<D, F>(resolver: &mut Resolver<D>, action: &str, callback: F) -> RuleMap
where
    D: RuleDefinition,
    F: FnOnce(RuleSet) -> RuleSet,
{
    assemble(resolver, action, Some(callback))
}

#[instrument(skip(resolver, callback))]
fn assemble<D, F>(resolver: &mut Resolver<D>, action: &str, callback: Option<F>) -> RuleMap
where
    D: RuleDefinition,
    F: FnOnce(RuleSet) -> RuleSet,
{
    if resolver.get_presets().is_empty() && resolver.guess() {
        debug!(preset = %action, "未声明预设，按调用方推断");
        resolver.set_presets(action);
    }

    let mut rules = resolver.get_rules().clone();

    if let Some(callback) = callback {
        rules = callback(rules);
    }

    rules.into_map()
}

/// 为领域对象提供规则组装入口
///
/// 实现该 trait 的类型（通常是处理请求的控制器）即可在各动作中调用
/// `self.rules(&mut resolver, action_name!())`。
pub trait SmartRule {
    fn rules<D: RuleDefinition>(&self, resolver: &mut Resolver<D>, action: &str) -> RuleMap {
        rules(resolver, action)
    }

    fn rules_with<D, F>(&self, resolver: &mut Resolver<D>, action: &str, callback: F) -> RuleMap
    where
        D: RuleDefinition,
        F: FnOnce(RuleSet) -> RuleSet,
    {
        rules_with(resolver, action, callback)
    }
}
