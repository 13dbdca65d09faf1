//! Report types with JSON persistence and Markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::evaluation::EvaluationSummary;
use crate::exam::{format_remaining, ExamResult};
use crate::i18n::{lookup, Locale, TranslationKey};
use crate::model::{ExamDefinition, Student, StudentEvaluation};
use crate::statistics::ExamStatistics;

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse report JSON")
}

/// Performance report of one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub student: Student,
    /// Language the report is rendered in.
    #[serde(default)]
    pub locale: Locale,
    pub summary: EvaluationSummary,
}

impl EvaluationReport {
    pub fn new(evaluation: &StudentEvaluation, locale: Locale) -> CoreResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            student: evaluation.student.clone(),
            locale,
            summary: EvaluationSummary::of(evaluation)?,
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let t = |key: &str| lookup(key, self.locale).to_string();
        let mut md = String::new();

        md.push_str(&format!(
            "# {}: {}\n\n",
            t("eval.performanceReport"),
            self.student.name
        ));
        if !self.student.class.is_empty() {
            md.push_str(&format!("{} · {}\n\n", self.student.id, self.student.class));
        }
        md.push_str(&format!(
            "**{}:** {} / 4.0 · {} {} · {} {}\n\n",
            t("dashboard.average"),
            self.summary.average,
            self.summary.improved,
            t("eval.improved"),
            self.summary.declined,
            t("eval.declined"),
        ));

        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            t("eval.criterion"),
            t("eval.rating"),
            t("eval.previous"),
            t("eval.trend"),
        ));
        md.push_str("|---|---|---|---|\n");
        for line in &self.summary.criteria {
            let prior = line
                .prior
                .map(|p| p.label(self.locale).to_string())
                .unwrap_or_else(|| "-".into());
            md.push_str(&format!(
                "| {} | {} {} ({:.0}%) | {} | {} |\n",
                line.criterion.label(self.locale),
                line.rating.glyph(),
                line.rating.label(self.locale),
                line.percentage,
                prior,
                line.trend.label(self.locale),
            ));
        }

        let comments: Vec<_> = self
            .summary
            .criteria
            .iter()
            .filter(|c| !c.comment.trim().is_empty())
            .collect();
        if !comments.is_empty() {
            md.push_str(&format!("\n### {}\n\n", t("eval.comments")));
            for line in comments {
                md.push_str(&format!(
                    "- **{}:** {}\n",
                    line.criterion.label(self.locale),
                    line.comment
                ));
            }
        }

        md
    }
}

/// Summary of an exam (without the question bodies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_minutes: u32,
    pub question_count: usize,
}

impl From<&ExamDefinition> for ExamSummary {
    fn from(exam: &ExamDefinition) -> Self {
        Self {
            id: exam.id.clone(),
            title: exam.title.clone(),
            subject: exam.subject.clone(),
            start_date: exam.start_date,
            end_date: exam.end_date,
            duration_minutes: exam.duration_minutes,
            question_count: exam.question_count(),
        }
    }
}

/// A sheet that could not be graded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UngradedSheet {
    pub student_id: String,
    pub reason: String,
}

/// Graded results of one exam for a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub exam: ExamSummary,
    #[serde(default)]
    pub locale: Locale,
    pub results: Vec<ExamResult>,
    /// Remaining seconds per graded student, in result order.
    #[serde(default)]
    pub remaining_seconds: Vec<u32>,
    #[serde(default)]
    pub ungraded: Vec<UngradedSheet>,
    pub statistics: ExamStatistics,
}

impl ExamReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let t = |key: &str| lookup(key, self.locale).to_string();
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.exam.title));
        md.push_str(&format!(
            "{} · {} – {} · {} min · {} {}\n\n",
            self.exam.subject,
            self.exam.start_date,
            self.exam.end_date,
            self.exam.duration_minutes,
            self.exam.question_count,
            t("sim.question").to_lowercase(),
        ));
        md.push_str(&format!(
            "**{}:** {} · **{}:** {}/10 · **{}:** {:.1}%\n\n",
            t("sim.participants"),
            self.statistics.participants,
            t("sim.classAverage"),
            self.statistics.class_average,
            t("sim.successRate"),
            self.statistics.success_rate * 100.0,
        ));

        if !self.results.is_empty() {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                t("sim.student"),
                t("sim.score"),
                t("sim.questionsAnswered"),
                t("sim.timeRemaining"),
            ));
            md.push_str("|---|---|---|---|\n");
            for (i, r) in self.results.iter().enumerate() {
                let remaining = self
                    .remaining_seconds
                    .get(i)
                    .map(|s| format_remaining(*s))
                    .unwrap_or_else(|| "-".into());
                md.push_str(&format!(
                    "| {} | {}/10 ({}/{}) | {}/{} | {} |\n",
                    r.student_id, r.grade, r.correct, r.total, r.answered, r.total, remaining
                ));
            }
            md.push('\n');
        }

        if !self.statistics.per_question.is_empty() {
            md.push_str(&format!("### {}\n\n", t("sim.successRate")));
            md.push_str(&format!("| {} | % |\n|---|---|\n", t("sim.question")));
            for q in &self.statistics.per_question {
                md.push_str(&format!("| {} | {:.1}% |\n", q.question_id, q.correct_rate * 100.0));
            }
        }

        if !self.ungraded.is_empty() {
            md.push_str("\n### Ungraded\n\n");
            for u in &self.ungraded {
                md.push_str(&format!("- {}: {}\n", u.student_id, u.reason));
            }
        }

        md
    }
}
