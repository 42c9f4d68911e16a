use clavis::{Couplet, CoupletKind, DecisionGraph, Key, KeyConfig, Record, Rule, RuleSet};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// A chain of `depth` couplets: couplet `i` continues on rule `i` and otherwise
/// ends in class `1000 + i`. Every rule tests its own attribute.
fn build_key(depth: u32) -> (Key, Record) {
    let mut rules = RuleSet::builder();
    let mut graph = DecisionGraph::builder("Chain");
    let mut record = Record::new();

    for i in 1..=depth {
        let attribute = format!("f{i}");
        rules = rules.rule(i, Rule::new("1", &attribute, ">=", &format!("r{i}"), "").unwrap());
        record = record.set(&attribute, 10_i64);

        let input = i64::from(i) - 1;
        let next = if i == depth {
            Couplet::new(9999_i64, CoupletKind::Class, "End")
        } else {
            Couplet::new(i64::from(i), CoupletKind::Couplet, format!("C{i}"))
        };
        graph = graph
            .edge(input, &i.to_string(), next)
            .edge(
                input,
                &format!("not {i}"),
                Couplet::new(1000 + i64::from(i), CoupletKind::Class, format!("Stop{i}")),
            );
    }

    let key = Key::new(
        rules.build().unwrap(),
        graph.build(true).unwrap(),
        KeyConfig::new("Chain"),
    );
    (key, record)
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_depth");
    for &depth in &[4_u32, 16, 64] {
        let (key, record) = build_key(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &record, |b, record| {
            b.iter(|| key.classify(black_box(record)).unwrap());
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let (key, record) = build_key(16);
    let records: Vec<Record> = (0..1000_i64)
        .map(|i| record.clone().set("id", i).set("f8", i % 2))
        .collect();
    c.bench_function("classify_all_1000", |b| {
        b.iter(|| key.classify_all(black_box(&records)));
    });
}

fn bench_expressions(c: &mut Criterion) {
    let (key, record) = build_key(8);
    let rules = key.rules();
    let source = "not (1 and 2) or (3 and not 4) or 5 and 6 and 7 and 8";
    let compiled = rules.compile(source).unwrap();

    let mut group = c.benchmark_group("expression");
    group.bench_function("parse", |b| b.iter(|| rules.compile(black_box(source)).unwrap()));
    group.bench_function("evaluate_compiled", |b| {
        b.iter(|| rules.evaluate(&compiled, black_box(&record)).unwrap());
    });
    group.bench_function("test_cached", |b| {
        b.iter(|| rules.test(black_box(source), black_box(&record)).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_classify, bench_batch, bench_expressions);
criterion_main!(benches);
