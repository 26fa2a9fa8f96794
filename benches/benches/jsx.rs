// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sandpit_frame::{ErrorBoundary, RenderFrame};
use sandpit_jsx::{Function, Scope, Value, compile, evaluate, format_code, render};

/// A card list with `rows` entries, written the way people paste it: no
/// indentation, mixed quotes.
fn source(rows: usize) -> String {
    let mut src = String::from("<Stack space='medium'>\n");
    for i in 0..rows {
        src.push_str(&format!(
            "<Card tone=\"neutral\" key={{{i}}}><Heading level={{3}}>Item {i}</Heading>\n<Text>Some words about item {i} and {{items.length}} more</Text></Card>\n"
        ));
    }
    src.push_str("</Stack>");
    src
}

fn library(rows: usize) -> Scope {
    let passthrough = |name: &'static str| {
        Function::native(name, |args| {
            Ok(match args.first() {
                Some(Value::Object(props)) => props.get("children").cloned().unwrap_or_default(),
                _ => Value::Undefined,
            })
        })
    };
    Scope::new()
        .with("Stack", passthrough("Stack"))
        .with("Card", passthrough("Card"))
        .with("Heading", passthrough("Heading"))
        .with("Text", passthrough("Text"))
        .with("items", Value::array((0..rows).map(|i| Value::from(i as f64))))
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("jsx/compile");
    for rows in [1_usize, 16, 128] {
        let src = source(rows);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &src, |b, src| {
            b.iter(|| black_box(compile(black_box(src))));
        });
    }
    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("jsx/format");
    for rows in [1_usize, 16, 128] {
        let src = source(rows);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &src, |b, src| {
            b.iter(|| black_box(format_code(black_box(src), src.len() / 2)));
        });
    }
    group.finish();
}

fn bench_evaluate_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("jsx/evaluate_render");
    for rows in [1_usize, 16, 128] {
        let scope = library(rows);
        let Ok(artifact) = compile(&source(rows)) else {
            panic!("bench source must compile");
        };
        group.bench_with_input(BenchmarkId::from_parameter(rows), &artifact, |b, artifact| {
            b.iter(|| {
                let value = evaluate(artifact, &scope).ok();
                black_box(value.and_then(|v| render(&v).ok()))
            });
        });
    }
    group.finish();
}

// One keystroke in a live frame: recompile, then render through the boundary.
fn bench_keystroke(c: &mut Criterion) {
    let rows = 16;
    let scope = library(rows);
    let valid = source(rows);
    let broken = valid.trim_end_matches('>').to_string();
    c.bench_function("frame/keystroke", |b| {
        let mut frame = RenderFrame::with_source(&valid);
        let mut boundary = ErrorBoundary::new();
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            frame.on_source_change(if flip { &broken } else { &valid });
            black_box(boundary.render(frame.artifact(), &scope).is_fallback());
        });
    });
}

criterion_group!(
    benches,
    bench_compile,
    bench_format,
    bench_evaluate_render,
    bench_keystroke
);
criterion_main!(benches);
