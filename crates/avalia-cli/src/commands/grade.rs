//! The `avalia grade` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use avalia_core::exam::{format_remaining, AnswerSheet, ExamResult, SubmissionCause};
use avalia_core::i18n::{lookup, Locale};
use avalia_core::identity::Role;
use avalia_core::model::ExamDefinition;
use avalia_core::parser;
use avalia_core::report::{ExamReport, ExamSummary, UngradedSheet};
use avalia_core::statistics::ExamStatistics;
use avalia_report::html::write_exam_html;

use super::{emit, load_settings, require_role, Global};

pub fn execute(
    exam_path: PathBuf,
    sheets_path: PathBuf,
    lang: Option<String>,
    format: String,
    output: Option<PathBuf>,
    global: &Global,
) -> Result<()> {
    let config = load_settings(global, lang.as_deref())?;
    require_role(&config.viewer, Role::can_manage_exams, "grade exams")?;
    let exam = parser::parse_exam(&exam_path)?;
    exam.ensure_takeable()?;
    let sheets = parser::parse_answer_sheets(&sheets_path)?;

    for w in parser::validate_exam(&exam) {
        eprintln!("WARNING: {}", w.message);
    }
    for w in parser::validate_answer_sheets(&exam, &sheets) {
        eprintln!("WARNING: {}", w.message);
    }

    let report = grade(&exam, &sheets, config.locale)?;

    match format.as_str() {
        "json" => emit(
            output.as_ref(),
            &exam.id,
            "json",
            &serde_json::to_string_pretty(&report)?,
        )?,
        "markdown" | "md" => emit(output.as_ref(), &exam.id, "md", &report.to_markdown())?,
        "html" => {
            let dir = output.unwrap_or(config.output_dir);
            let path = dir.join(format!("{}.html", exam.id));
            write_exam_html(&report, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        "text" => print_summary(&report),
        other => anyhow::bail!("unknown format: {other}"),
    }

    Ok(())
}

/// Replay every sheet through a fresh session and aggregate the results.
///
/// Sheets that cannot be graded are kept in the report with the reason.
fn grade(exam: &ExamDefinition, sheets: &[AnswerSheet], locale: Locale) -> Result<ExamReport> {
    let mut results = Vec::new();
    let mut remaining_seconds = Vec::new();
    let mut ungraded = Vec::new();
    let mut seen = HashSet::new();

    for sheet in sheets {
        if !seen.insert(sheet.student_id.as_str()) {
            ungraded.push(UngradedSheet {
                student_id: sheet.student_id.clone(),
                reason: "duplicate sheet for this student".into(),
            });
            continue;
        }
        let graded = sheet
            .replay(exam)
            .and_then(|session| Ok((ExamResult::compute(&session, exam)?, session)));
        match graded {
            Ok((result, session)) => {
                tracing::debug!(
                    student = %result.student_id,
                    correct = result.correct,
                    total = result.total,
                    "sheet graded"
                );
                remaining_seconds.push(session.remaining_seconds());
                results.push(result);
            }
            Err(e) => {
                tracing::warn!(student = %sheet.student_id, "sheet not graded: {e}");
                ungraded.push(UngradedSheet {
                    student_id: sheet.student_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let statistics = ExamStatistics::compute(exam, &results)?;

    Ok(ExamReport {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        exam: ExamSummary::from(exam),
        locale,
        results,
        remaining_seconds,
        ungraded,
        statistics,
    })
}

fn print_summary(report: &ExamReport) {
    use comfy_table::{Cell, Table};

    let locale = report.locale;
    let t = |key: &str| lookup(key, locale).to_string();

    println!(
        "{} ({}, {} min)",
        report.exam.title, report.exam.subject, report.exam.duration_minutes
    );

    let mut table = Table::new();
    table.set_header(vec![
        t("sim.student"),
        t("sim.score"),
        t("sim.questionsAnswered"),
        t("sim.timeRemaining"),
        "Status".to_string(),
    ]);
    for (i, r) in report.results.iter().enumerate() {
        let status = match r.cause {
            Some(SubmissionCause::TimeExpired) => "time expired",
            _ => "submitted",
        };
        table.add_row(vec![
            Cell::new(&r.student_id),
            Cell::new(format!("{}/10 ({}/{})", r.grade, r.correct, r.total)),
            Cell::new(format!("{}/{}", r.answered, r.total)),
            Cell::new(
                report
                    .remaining_seconds
                    .get(i)
                    .map(|s| format_remaining(*s))
                    .unwrap_or_default(),
            ),
            Cell::new(status),
        ]);
    }
    for u in &report.ungraded {
        table.add_row(vec![
            Cell::new(&u.student_id),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(format!("not graded: {}", u.reason)),
        ]);
    }
    println!("{table}");

    let stats = &report.statistics;
    println!(
        "{}: {} | {}: {}/10 | {}: {:.1}%",
        t("sim.participants"),
        stats.participants,
        t("sim.classAverage"),
        stats.class_average,
        t("sim.successRate"),
        stats.success_rate * 100.0
    );
    if let Some(hardest) = stats.hardest_question() {
        println!(
            "Hardest question: {} ({:.1}% correct)",
            hardest.question_id,
            hardest.correct_rate * 100.0
        );
    }
}
