//! Benchmarks for rule parsing, evaluation and combination

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rule_engine_core::engine::RuleEngine;
use rule_engine_core::rule::{combine, evaluate, parse, ParseCache};
use serde_json::{json, Map, Value};

fn sample_rules() -> Vec<&'static str> {
    vec![
        "age > 30",
        "age > 30 AND status = 'active'",
        "age < 18 OR status = 'retired'",
        "(age > 30 AND department = 'Sales') OR (age < 25 AND department = 'Marketing')",
        "((age > 30 AND salary >= 50000) OR experience > 5) AND status != 'inactive'",
    ]
}

fn sample_record() -> Map<String, Value> {
    match json!({
        "age": 35,
        "department": "Sales",
        "salary": 60000,
        "experience": 3,
        "status": "active"
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn benchmark_parsing(c: &mut Criterion) {
    let rules = sample_rules();

    c.bench_function("rule_parsing_cold", |b| {
        b.iter(|| {
            for rule in &rules {
                let _ = black_box(parse(rule));
            }
        })
    });

    let cache = ParseCache::new(64);
    c.bench_function("rule_parsing_cached", |b| {
        b.iter(|| {
            for rule in &rules {
                let _ = black_box(cache.get_or_parse(rule));
            }
        })
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let record = sample_record();
    let asts: Vec<_> = sample_rules().iter().map(|r| parse(r).unwrap()).collect();

    c.bench_function("rule_evaluation", |b| {
        b.iter(|| {
            for ast in &asts {
                let _ = black_box(evaluate(ast, black_box(&record)));
            }
        })
    });

    let engine = RuleEngine::default();
    let id = engine.create_rule("bench", sample_rules()[4]).unwrap();
    c.bench_function("stored_rule_evaluation", |b| {
        b.iter(|| black_box(engine.evaluate_rule(id, black_box(&record))))
    });
}

fn benchmark_combination(c: &mut Criterion) {
    let rules = sample_rules();

    c.bench_function("rule_combination_and_render", |b| {
        b.iter(|| {
            let ast = combine(black_box(rules.as_slice())).unwrap();
            black_box(ast.to_string())
        })
    });
}

criterion_group!(benches, benchmark_parsing, benchmark_evaluation, benchmark_combination);
criterion_main!(benches);
