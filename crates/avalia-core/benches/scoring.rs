use criterion::{black_box, criterion_group, criterion_main, Criterion};

use avalia_core::evaluation::{average_rating, trends, EvaluationSummary};
use avalia_core::exam::{score, ExamSession};
use avalia_core::model::{
    Criterion as Criteria, Difficulty, EvaluationSnapshot, ExamDefinition,
    PriorEvaluationSnapshot, Question, QuestionKind, Rating,
};
use chrono::NaiveDate;

fn make_exam(questions: usize) -> ExamDefinition {
    ExamDefinition {
        id: "bench".into(),
        title: "Benchmark".into(),
        subject: "Mathematics".into(),
        description: String::new(),
        start_date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(),
        duration_minutes: 60,
        questions: (0..questions)
            .map(|i| Question {
                id: format!("q{i}"),
                prompt: format!("Question {i}"),
                kind: QuestionKind::MultipleChoice,
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "b".into(),
                explanation: None,
                subject: "Mathematics".into(),
                topic: "Arithmetic".into(),
                difficulty: Difficulty::Medium,
                shared: false,
                author: String::new(),
            })
            .collect(),
    }
}

fn answered_session(exam: &ExamDefinition) -> ExamSession {
    let mut session = ExamSession::start(exam, "bench").unwrap();
    for (i, q) in exam.questions.iter().enumerate() {
        let option = if i % 3 == 0 { "a" } else { "b" };
        session = session.select_answer(exam, &q.id, option).unwrap();
    }
    session.submit().unwrap()
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    let current = EvaluationSnapshot::new(Rating::Good)
        .rate(Criteria::Participation, Rating::Excellent)
        .rate(Criteria::Sociability, Rating::NeedsImprovement);
    let prior = PriorEvaluationSnapshot::from_ratings([
        (Criteria::Accessibility, Rating::Good),
        (Criteria::Participation, Rating::Good),
    ]);

    group.bench_function("average_rating", |b| {
        b.iter(|| average_rating(black_box(&current)))
    });

    group.bench_function("trends", |b| {
        b.iter(|| trends(black_box(&current), black_box(&prior)))
    });

    group.bench_function("summary", |b| {
        b.iter(|| EvaluationSummary::compute(black_box(&current), black_box(&prior)))
    });

    group.finish();
}

fn bench_exam_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("exam_score");

    for n in [10, 50, 200] {
        let exam = make_exam(n);
        let session = answered_session(&exam);
        group.bench_function(format!("{n}_questions"), |b| {
            b.iter(|| score(black_box(&session), black_box(&exam)))
        });
    }

    group.bench_function("tick_full_hour", |b| {
        let exam = make_exam(10);
        let start = ExamSession::start(&exam, "bench").unwrap();
        b.iter(|| {
            let mut session = start.clone();
            while !session.is_submitted() {
                session = session.tick().unwrap();
            }
            session
        })
    });

    group.finish();
}

criterion_group!(benches, bench_evaluation, bench_exam_score);
criterion_main!(benches);
