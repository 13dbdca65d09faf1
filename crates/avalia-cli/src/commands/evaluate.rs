//! The `avalia evaluate` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use avalia_core::i18n::{lookup, Locale, TranslationKey};
use avalia_core::identity::Role;
use avalia_core::model::{Criterion, Rating};
use avalia_core::parser;
use avalia_core::report::EvaluationReport;
use avalia_core::statistics::EvaluationStatistics;
use avalia_report::html::write_evaluation_html;

use super::{emit, load_settings, require_role, split_assignment, Global};

pub fn execute(
    evaluation_path: PathBuf,
    rates: Vec<String>,
    comments: Vec<String>,
    lang: Option<String>,
    format: String,
    output: Option<PathBuf>,
    global: &Global,
) -> Result<()> {
    let config = load_settings(global, lang.as_deref())?;
    require_role(&config.viewer, Role::can_evaluate_students, "evaluate students")?;

    if evaluation_path.is_dir() {
        if !rates.is_empty() || !comments.is_empty() {
            anyhow::bail!("--rate and --comment need a single evaluation file");
        }
        return class_statistics(&evaluation_path, config.locale, &format);
    }

    let mut evaluation = parser::parse_evaluation(&evaluation_path)?;

    for arg in &rates {
        let (criterion, rating) = split_assignment(arg, "rate")?;
        let criterion: Criterion = criterion.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let rating: Rating = rating.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        evaluation.current = evaluation.current.rate(criterion, rating);
        tracing::debug!(%criterion, %rating, "criterion re-rated");
    }
    for arg in &comments {
        let (criterion, text) = split_assignment(arg, "comment")?;
        let criterion: Criterion = criterion.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        evaluation.current = evaluation.current.set_comment(criterion, text);
    }

    for w in parser::validate_evaluation(&evaluation) {
        eprintln!("WARNING: {}", w.message);
    }

    let report = EvaluationReport::new(&evaluation, config.locale)?;
    let stem = report.student.id.clone();

    match format.as_str() {
        "json" => emit(
            output.as_ref(),
            &stem,
            "json",
            &serde_json::to_string_pretty(&report)?,
        )?,
        "markdown" | "md" => emit(output.as_ref(), &stem, "md", &report.to_markdown())?,
        "html" => {
            let dir = output.unwrap_or(config.output_dir);
            let path = dir.join(format!("{stem}.html"));
            write_evaluation_html(&report, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        "text" => print_summary(&report),
        other => anyhow::bail!("unknown format: {other}"),
    }

    Ok(())
}

/// Criterion averages and trend counts over every evaluation in `dir`.
fn class_statistics(dir: &Path, locale: Locale, format: &str) -> Result<()> {
    use comfy_table::{Cell, Table};

    let evaluations = parser::load_evaluation_directory(dir)?;
    if evaluations.is_empty() {
        anyhow::bail!("no evaluations found in {}", dir.display());
    }
    let stats = EvaluationStatistics::compute(&evaluations);
    tracing::info!(students = stats.students, "class statistics computed");

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        "text" => {
            let t = |key: &str| lookup(key, locale).to_string();
            println!("{}: {}", t("sim.participants"), stats.students);

            let mut table = Table::new();
            table.set_header(vec![t("eval.criterion"), t("dashboard.average")]);
            for line in &stats.per_criterion {
                table.add_row(vec![
                    Cell::new(line.criterion.label(locale)),
                    Cell::new(
                        line.average
                            .map(|a| format!("{a} / 4.0 ({})", line.rated))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]);
            }
            println!("{table}");

            println!(
                "{}: {} | {}: {} | {}: {} | {}: {}",
                t("eval.improved"),
                stats.trends.improved,
                t("eval.maintained"),
                stats.trends.maintained,
                t("eval.declined"),
                stats.trends.declined,
                t("eval.new"),
                stats.trends.new
            );
        }
        other => anyhow::bail!("unknown format: {other}"),
    }
    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let locale = report.locale;
    let t = |key: &str| lookup(key, locale).to_string();

    println!(
        "{}: {} ({})",
        t("eval.title"),
        report.student.name,
        report.student.id
    );

    let mut table = Table::new();
    table.set_header(vec![
        t("eval.criterion"),
        t("eval.rating"),
        t("eval.previous"),
        t("eval.trend"),
        t("eval.comments"),
    ]);
    for line in &report.summary.criteria {
        table.add_row(vec![
            Cell::new(line.criterion.label(locale)),
            Cell::new(format!(
                "{} {} ({:.0}%)",
                line.rating.glyph(),
                line.rating.label(locale),
                line.percentage
            )),
            Cell::new(line.prior.map(|p| p.label(locale)).unwrap_or("-")),
            Cell::new(line.trend.label(locale)),
            Cell::new(&line.comment),
        ]);
    }
    println!("{table}");

    println!(
        "{}: {} / 4.0 | {}: {} | {}: {}",
        t("dashboard.average"),
        report.summary.average,
        t("eval.improved"),
        report.summary.improved,
        t("eval.declined"),
        report.summary.declined
    );
}
