//! 规则组装性能基准测试
//!
//! 覆盖约束解析、字段覆盖与多预设组装。

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use preset_rules::{facade, parse_rule_string, Resolver, RuleSet, RuleSetDefinition};
use std::hint::black_box;

fn create_rule_string(count: usize) -> String {
    (0..count)
        .map(|i| format!("rule{}:{}", i % 16, i))
        .collect::<Vec<_>>()
        .join("|")
}

fn create_definition(presets: usize) -> RuleSetDefinition {
    let steps: Vec<String> = (0..presets)
        .map(|i| {
            format!(
                r#""p{i}": [ {{ "op": "set_entry", "field": "amount", "entry": "max:{i}" }}, {{ "op": "put", "field": "f{i}", "value": "required" }} ]"#
            )
        })
        .collect();
    let json = format!(
        r#"{{ "rules": {{ "amount": "required|numeric|max:10" }}, "presets": {{ {} }} }}"#,
        steps.join(",")
    );
    RuleSetDefinition::from_json(&json).expect("valid definition")
}

/// 约束解析基准
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rules");

    for size in [4, 32, 256] {
        let input = create_rule_string(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| parse_rule_string(black_box(input)))
        });
    }

    group.finish();
}

/// 字段覆盖基准
fn bench_replace(c: &mut Criterion) {
    let mut base = RuleSet::new();
    base.put("amount", create_rule_string(32));

    c.bench_function("replace_with", |b| {
        b.iter(|| {
            let mut rules = base.clone();
            rules.replace_with(black_box("amount"), |mut entries| {
                entries.put("max:99");
                entries
            });
            rules
        })
    });
}

/// 多预设组装基准
fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for presets in [1, 8, 64] {
        let definition = create_definition(presets);
        let names: Vec<String> = (0..presets).map(|i| format!("p{i}")).collect();
        let mut resolver =
            Resolver::with_presets(definition, names).expect("valid resolver");

        group.bench_function(BenchmarkId::from_parameter(presets), |b| {
            b.iter(|| facade::rules(black_box(&mut resolver), "bench"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_replace, bench_assemble);
criterion_main!(benches);
