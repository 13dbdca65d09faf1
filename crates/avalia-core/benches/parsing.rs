use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_exam_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("exam_parsing");

    let small_toml = generate_exam_toml(5);
    let medium_toml = generate_exam_toml(50);
    let large_toml = generate_exam_toml(200);

    group.bench_function("5_questions", |b| {
        b.iter(|| {
            avalia_core::parser::parse_exam_str(
                black_box(&small_toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.bench_function("50_questions", |b| {
        b.iter(|| {
            avalia_core::parser::parse_exam_str(
                black_box(&medium_toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.bench_function("200_questions", |b| {
        b.iter(|| {
            avalia_core::parser::parse_exam_str(
                black_box(&large_toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.finish();
}

fn bench_evaluation_parsing(c: &mut Criterion) {
    let toml = r#"
[student]
id = "2025001"
name = "Ana Costa"
class = "1º Ano A"

[current.accessibility]
rating = "excellent"
comment = "Always on time."

[current.participation]
rating = "good"

[current.responsibility]
rating = "needs_improvement"

[current.sociability]
rating = "good"

[prior]
accessibility = "good"
participation = "good"
"#;

    c.bench_function("evaluation_parsing", |b| {
        b.iter(|| {
            avalia_core::parser::parse_evaluation_str(
                black_box(toml),
                black_box("bench.toml".as_ref()),
            )
        })
    });
}

fn generate_exam_toml(n: usize) -> String {
    let mut s = String::new();
    s.push_str(
        r#"[exam]
id = "bench"
title = "Benchmark"
subject = "Mathematics"
start_date = "2025-11-01"
end_date = "2025-11-15"
duration_minutes = 60
"#,
    );
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[questions]]
id = "q{i}"
prompt = "What is {i} + 1?"
kind = "multiple_choice"
options = ["{i}", "{}", "{}", "0"]
correct_answer = "{}"
explanation = """
Adding one to {i} gives the next integer.
"""
"#,
            i + 1,
            i + 2,
            i + 1
        ));
    }
    s
}

criterion_group!(benches, bench_exam_parsing, bench_evaluation_parsing);
criterion_main!(benches);
