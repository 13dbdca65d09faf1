//! End-to-end pipeline tests over the bundled sample data.
//!
//! These tests drive the library the way the CLI does: parse → replay or
//! evaluate → statistics → report → JSON/HTML.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use avalia_core::clock::{ClockStop, ExamClock, SharedBook, DEFAULT_TICK};
use avalia_core::exam::{ExamEvent, ExamResult, SessionBook, SessionKey, SubmissionCause};
use avalia_core::i18n::Locale;
use avalia_core::model::{Criterion, Rating, Trend};
use avalia_core::parser;
use avalia_core::report::{EvaluationReport, ExamReport, ExamSummary};
use avalia_core::statistics::{EvaluationStatistics, ExamStatistics};
use avalia_report::html::{generate_evaluation_html, generate_exam_html};

const MATH_EXAM: &str = "../../data/exams/mathematics-q1.toml";
const MATH_SHEETS: &str = "../../data/sheets/mathematics-q1.toml";
const ANA: &str = "../../data/evaluations/ana-costa.toml";

fn graded_math_report() -> ExamReport {
    let exam = parser::parse_exam(Path::new(MATH_EXAM)).unwrap();
    let sheets = parser::parse_answer_sheets(Path::new(MATH_SHEETS)).unwrap();
    assert!(parser::validate_answer_sheets(&exam, &sheets).is_empty());

    let mut results = Vec::new();
    let mut remaining_seconds = Vec::new();
    for sheet in &sheets {
        let session = sheet.replay(&exam).unwrap();
        remaining_seconds.push(session.remaining_seconds());
        results.push(ExamResult::compute(&session, &exam).unwrap());
    }
    let statistics = ExamStatistics::compute(&exam, &results).unwrap();

    ExamReport {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        exam: ExamSummary::from(&exam),
        locale: Locale::En,
        results,
        remaining_seconds,
        ungraded: vec![],
        statistics,
    }
}

#[test]
fn e2e_grade_sample_sheets() {
    let report = graded_math_report();

    let grades: Vec<String> = report.results.iter().map(|r| r.grade.to_string()).collect();
    assert_eq!(grades, vec!["10.0", "6.0", "2.0"]);
    assert_eq!(report.remaining_seconds, vec![1200, 300, 0]);
    assert_eq!(report.results[0].cause, Some(SubmissionCause::Manual));
    assert_eq!(report.results[2].cause, Some(SubmissionCause::TimeExpired));

    let stats = &report.statistics;
    assert_eq!(stats.participants, 3);
    assert_eq!(stats.class_average.to_string(), "6.0");
    assert!((stats.success_rate - 0.6).abs() < 1e-9);
    assert_eq!(stats.hardest_question().unwrap().question_id, "q4");
}

#[test]
fn e2e_exam_report_roundtrip_and_render() {
    let report = graded_math_report();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("math-q1.json");

    report.save_json(&path).unwrap();
    let loaded = ExamReport::load_json(&path).unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.results.len(), 3);
    assert_eq!(loaded.statistics.class_average, report.statistics.class_average);

    let md = loaded.to_markdown();
    assert!(md.contains("Mathematics Simulation - Q1"));
    assert!(md.contains("2025003"));

    let html = generate_exam_html(&loaded);
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("2025002"));
    assert!(html.contains("<svg"));
}

#[test]
fn e2e_evaluation_report() {
    let mut evaluation = parser::parse_evaluation(Path::new(ANA)).unwrap();
    assert!(parser::validate_evaluation(&evaluation).is_empty());

    let report = EvaluationReport::new(&evaluation, Locale::Pt).unwrap();
    assert_eq!(report.summary.average.to_string(), "3.3");
    let trend = |c: Criterion| {
        report
            .summary
            .criteria
            .iter()
            .find(|line| line.criterion == c)
            .unwrap()
            .trend
    };
    assert_eq!(trend(Criterion::Accessibility), Trend::Improved);
    assert_eq!(trend(Criterion::Participation), Trend::Maintained);
    assert_eq!(trend(Criterion::Responsibility), Trend::Declined);
    assert_eq!(trend(Criterion::Sociability), Trend::Maintained);

    evaluation.current = evaluation
        .current
        .rate(Criterion::Responsibility, Rating::Good);
    let rerated = EvaluationReport::new(&evaluation, Locale::En).unwrap();
    assert_eq!(rerated.summary.average.to_string(), "3.5");
    assert_eq!(rerated.summary.declined, 0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ana.json");
    rerated.save_json(&path).unwrap();
    let loaded = EvaluationReport::load_json(&path).unwrap();
    assert_eq!(loaded.summary, rerated.summary);

    let html = generate_evaluation_html(&loaded);
    assert!(html.contains("Ana Costa"));
    assert!(html.contains("lang=\"en\""));

    let class = EvaluationStatistics::compute(&[evaluation]);
    assert_eq!(class.students, 1);
    assert_eq!(class.trends.improved, 1);
}

#[tokio::test(start_paused = true)]
async fn e2e_clock_driven_session() {
    let exam = parser::parse_exam(Path::new(MATH_EXAM)).unwrap();
    let book: SharedBook = Arc::new(Mutex::new(SessionBook::new()));
    book.lock().unwrap().start(&exam, "2025001").unwrap();
    let key = SessionKey::new(&exam.id, "2025001");

    let clock = ExamClock::spawn(Arc::clone(&book), key.clone(), DEFAULT_TICK);

    {
        let mut guard = book.lock().unwrap();
        guard
            .apply(
                &key,
                &ExamEvent::SelectAnswer {
                    question_id: "q1".into(),
                    option: "96".into(),
                },
            )
            .unwrap();
        guard.apply(&key, &ExamEvent::GoTo(4)).unwrap();
        guard
            .apply(
                &key,
                &ExamEvent::SelectAnswer {
                    question_id: "q5".into(),
                    option: "20 cm".into(),
                },
            )
            .unwrap();
    }

    // Nobody submits: the clock runs the 45 minutes out.
    assert_eq!(clock.finished().await, ClockStop::Submitted);

    let session = book.lock().unwrap().get(&key).cloned().unwrap();
    assert_eq!(session.remaining_seconds(), 0);
    assert_eq!(session.current_question_index(), 4);

    let result = ExamResult::compute(&session, &exam).unwrap();
    assert_eq!(result.cause, Some(SubmissionCause::TimeExpired));
    assert_eq!(result.correct, 2);
    assert_eq!(result.grade.to_string(), "4.0");

    // A submitted session refuses further input.
    let err = book
        .lock()
        .unwrap()
        .apply(&key, &ExamEvent::Next)
        .unwrap_err();
    assert!(err.is_invalid_state());
}
