use std::{env, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use lryacc::{build_table, first_sets::FirstSets, lr1::Automaton, Grammar};

criterion_main!(benches);
criterion_group!(benches, bench_expressions, bench_json);

fn bench_expressions(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic");
    bench_table_gen(c, "boolean");
}

fn bench_json(c: &mut Criterion) {
    bench_table_gen(c, "json");
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar = Grammar::<()>::from_file(
        project_root.join(format!("tests/grammars/{}.lry", grammar_name)),
    )
    .unwrap();
    let cfg = grammar.cfg();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("first_sets", |b| {
        b.iter(|| FirstSets::new(cfg));
    });
    group.bench_function("automaton", |b| {
        let first_sets = FirstSets::new(cfg);
        b.iter(|| Automaton::generate(cfg, &first_sets));
    });
    group.bench_function("table", |b| {
        b.iter(|| build_table(&grammar).unwrap());
    });
    group.finish();
}
