use std::hint::black_box;
use std::time::Instant;

use chainlint_core::analysis::AnalysisEngine;
use chainlint_core::fixer::apply_fixes_until_stable;
use chainlint_core::parser::ParsedFile;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures");

fn generate_500_loc_typescript() -> String {
    let mut code = String::with_capacity(20000);
    code.push_str("// Generated 500 LOC TypeScript file for benchmarking\n\n");

    for i in 0..25 {
        code.push_str(&format!(
            r#"interface Entity{i} {{
    id: number;
    name: string;
    owner?: {{ profile: {{ email: string }} | null }};
    metadata?: Record<string, unknown>;
}}

declare const current{i}: Entity{i} | undefined;

function ownerEmail{i}(entity: Entity{i} | null): string | undefined {{
    if (entity && entity.owner && entity.owner.profile) {{
        return entity.owner.profile.email;
    }}
    return undefined;
}}

function hasMetadata{i}(): boolean {{
    return current{i} != null && current{i}.metadata != null && current{i}.metadata.size !== 0;
}}

function isMissing{i}(entity: Entity{i}): boolean {{
    return !entity.owner || !entity.owner.profile;
}}

const fallback{i} = (current{i} ?? {{}}).name;

"#,
            i = i
        ));
    }

    code
}

fn generate_100_files() -> Vec<(String, String)> {
    (0..100)
        .map(|i| {
            let filename = format!("file_{}.ts", i);
            let content = format!(
                r#"interface Item{i} {{
    id: number;
    value?: {{ text: string }};
}}

function process{i}(item: Item{i} | null): string | undefined {{
    return item && item.value && item.value.text;
}}

export {{ Item{i}, process{i} }};
"#,
                i = i
            );
            (filename, content)
        })
        .collect()
}

fn read_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("{}/{}", FIXTURES_DIR, path))
        .unwrap_or_else(|_| panic!("Failed to read fixture: {}", path))
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let code_500 = generate_500_loc_typescript();
    let lines_500 = code_500.lines().count();

    group.throughput(Throughput::Elements(lines_500 as u64));
    group.bench_function("parse_500_loc", |b| {
        b.iter(|| ParsedFile::from_source(black_box("benchmark.ts"), black_box(&code_500)))
    });

    let tsx_code = read_fixture("typescript/component.tsx");
    group.bench_function("parse_tsx_component", |b| {
        b.iter(|| ParsedFile::from_source(black_box("component.tsx"), black_box(&tsx_code)))
    });

    group.finish();
}

fn bench_rule(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule");

    let engine = AnalysisEngine::new();

    let guards_code = read_fixture("typescript/guards.ts");
    let guards_file = ParsedFile::from_source("guards.ts", &guards_code);
    group.bench_function("typed_guards", |b| {
        b.iter(|| engine.analyze(black_box(&guards_file)))
    });

    let untyped_code = read_fixture("javascript/untyped.js");
    let untyped_file = ParsedFile::from_source("untyped.js", &untyped_code);
    group.bench_function("untyped_guards", |b| {
        b.iter(|| engine.analyze(black_box(&untyped_file)))
    });

    let clean_code = r#"
const PI = 3.14159;

function calculateArea(radius: number): number {
    return PI * radius * radius;
}

function label(user?: { name?: string }): string {
    return user?.name ?? "anonymous";
}

export { calculateArea, label };
"#;

    let clean_file = ParsedFile::from_source("clean.ts", clean_code);
    group.bench_function("clean_code", |b| {
        b.iter(|| engine.analyze(black_box(&clean_file)))
    });

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    let engine = AnalysisEngine::new();
    let code_500 = generate_500_loc_typescript();
    let file_500 = ParsedFile::from_source("large.ts", &code_500);

    group.bench_function("analyze_500_loc", |b| {
        b.iter(|| engine.analyze(black_box(&file_500)))
    });

    group.bench_function("fix_500_loc", |b| {
        b.iter(|| apply_fixes_until_stable(&engine, "large.ts", black_box(&code_500), false))
    });

    let files_100 = generate_100_files();
    let parsed_files: Vec<ParsedFile> = files_100
        .iter()
        .map(|(name, content)| ParsedFile::from_source(name, content))
        .collect();

    for size in [10, 25, 50, 100] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("project_size", size), &size, |b, &size| {
            let subset: Vec<_> = parsed_files.iter().take(size).collect();
            b.iter(|| {
                for file in &subset {
                    let _ = engine.analyze(black_box(file));
                }
            })
        });
    }

    group.finish();
}

fn bench_latency_percentiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency");

    let engine = AnalysisEngine::new();
    let code_500 = generate_500_loc_typescript();

    group.bench_function("p95_500_loc_parse_analyze", |b| {
        b.iter_custom(|iters| {
            let mut durations: Vec<_> = (0..iters)
                .map(|_| {
                    let start = Instant::now();
                    let file =
                        ParsedFile::from_source(black_box("benchmark.ts"), black_box(&code_500));
                    let _ = engine.analyze(black_box(&file));
                    start.elapsed()
                })
                .collect();
            durations.sort();
            let p95_idx = ((iters as f64) * 0.95) as usize;
            let p95_idx = p95_idx.min(durations.len().saturating_sub(1));
            durations[p95_idx]
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parsing,
    bench_rule,
    bench_analysis,
    bench_latency_percentiles
);
criterion_main!(benches);
