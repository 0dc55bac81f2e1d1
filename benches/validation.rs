//! Benchmarks for content model compilation and validation

use contentmodel::Compiler;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const DOCBOOKISH: &str =
    "title,subtitle?,(para|list|table)*,(section,(para|list)*)+ ,appendix?";
const COUNTED: &str = "(a[2,3],b[2,3])[5,6]";

fn compile(expression: &str) -> contentmodel::CompiledModel {
    let mut compiler = Compiler::new("bench");
    compiler.parse(expression).unwrap();
    compiler.compile().unwrap()
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_plain", |b| {
        b.iter(|| compile(black_box(DOCBOOKISH)))
    });
    c.bench_function("compile_counted", |b| {
        b.iter(|| compile(black_box(COUNTED)))
    });
}

fn bench_validate_plain(c: &mut Criterion) {
    let model = compile(DOCBOOKISH);
    let mut input = String::from("title,subtitle");
    for _ in 0..50 {
        input.push_str(",para,list,table");
    }
    for _ in 0..20 {
        input.push_str(",section,para,list,para");
    }
    input.push_str(",appendix");
    assert!(model.validate(&input));

    c.bench_function("validate_plain", |b| {
        b.iter(|| model.validate(black_box(&input)))
    });
}

fn bench_validate_counted(c: &mut Criterion) {
    let model = compile(COUNTED);
    let input = "a,a,b,b,a,a,a,b,b,b,a,a,b,b,b,a,a,a,b,b,a,a,a,b,b,b";
    assert!(model.validate(input));

    c.bench_function("validate_counted", |b| {
        b.iter(|| model.validate(black_box(input)))
    });
}

fn bench_step_hot_path(c: &mut Criterion) {
    let model = compile("(a|b)+");

    c.bench_function("step_loop", |b| {
        b.iter(|| {
            let mut cursor = model.initial_state();
            for _ in 0..64 {
                cursor.step(black_box("a"));
                cursor.step(black_box("b"));
            }
            cursor.accepting()
        })
    });
}

criterion_group!(
    benches,
    bench_compile,
    bench_validate_plain,
    bench_validate_counted,
    bench_step_hot_path
);
criterion_main!(benches);
