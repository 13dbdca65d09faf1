//! TOML data source.
//!
//! Loads exams, student evaluations and answer sheets from TOML files and
//! directories, and validates them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::exam::AnswerSheet;
use crate::model::{
    Criterion, CriterionEvaluation, Difficulty, EvaluationSnapshot, ExamDefinition,
    PriorEvaluationSnapshot, Question, QuestionKind, Rating, Student, StudentEvaluation,
};

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    title: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    description: String,
    start_date: String,
    end_date: String,
    #[serde(default = "default_duration")]
    duration_minutes: u32,
}

fn default_duration() -> u32 {
    60
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    prompt: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    correct_answer: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    shared: bool,
    #[serde(default)]
    author: String,
}

/// Intermediate TOML structure for parsing evaluation files.
#[derive(Debug, Deserialize)]
struct TomlEvaluationFile {
    student: TomlStudent,
    #[serde(default)]
    recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    current: BTreeMap<String, TomlCriterionEntry>,
    #[serde(default)]
    prior: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    name: String,
    #[serde(default)]
    class: String,
}

#[derive(Debug, Deserialize)]
struct TomlCriterionEntry {
    rating: String,
    #[serde(default)]
    comment: String,
}

/// Intermediate TOML structure for parsing answer-sheet files.
#[derive(Debug, Deserialize)]
struct TomlSheetFile {
    #[serde(default)]
    sheets: Vec<AnswerSheet>,
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid {field} '{value}', expected YYYY-MM-DD"))
}

fn read_toml<T: DeserializeOwned>(content: &str, source_path: &Path) -> Result<T> {
    toml::from_str(content).with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// Parse a single TOML file into an `ExamDefinition`.
pub fn parse_exam(path: &Path) -> Result<ExamDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `ExamDefinition` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<ExamDefinition> {
    let parsed: TomlExamFile = read_toml(content, source_path)?;

    let exam_subject = parsed.exam.subject.clone();
    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind = q
                .kind
                .map(|k| k.parse().map_err(|e: String| anyhow::anyhow!("{}", e)))
                .transpose()?
                .unwrap_or(QuestionKind::MultipleChoice);
            let difficulty: Difficulty = q
                .difficulty
                .map(|d| d.parse().map_err(|e: String| anyhow::anyhow!("{}: {e}", q.id)))
                .transpose()?
                .unwrap_or_default();
            let subject = if q.subject.trim().is_empty() {
                exam_subject.clone()
            } else {
                q.subject
            };
            Ok(Question {
                id: q.id,
                prompt: q.prompt,
                kind,
                options: q.options,
                correct_answer: q.correct_answer,
                explanation: q.explanation,
                subject,
                topic: q.topic,
                difficulty,
                shared: q.shared,
                author: q.author,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExamDefinition {
        start_date: parse_date(&parsed.exam.start_date, "start_date")?,
        end_date: parse_date(&parsed.exam.end_date, "end_date")?,
        id: parsed.exam.id,
        title: parsed.exam.title,
        subject: parsed.exam.subject,
        description: parsed.exam.description,
        duration_minutes: parsed.exam.duration_minutes,
        questions,
    })
}

/// Parse a single TOML file into a `StudentEvaluation`.
pub fn parse_evaluation(path: &Path) -> Result<StudentEvaluation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read evaluation file: {}", path.display()))?;

    parse_evaluation_str(&content, path)
}

/// Parse a TOML string into a `StudentEvaluation`.
///
/// The current snapshot may be partial; [`validate_evaluation`] reports
/// missing criteria.
pub fn parse_evaluation_str(content: &str, source_path: &Path) -> Result<StudentEvaluation> {
    let parsed: TomlEvaluationFile = read_toml(content, source_path)?;
    let recorded_at = parsed.recorded_at.unwrap_or_else(Utc::now);

    let mut current = Vec::with_capacity(parsed.current.len());
    let mut seen = HashSet::new();
    for (name, entry) in parsed.current {
        let criterion: Criterion = name.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
        if !seen.insert(criterion) {
            anyhow::bail!("criterion {criterion} listed more than once");
        }
        let rating: Rating = entry
            .rating
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{criterion}: {e}"))?;
        let mut evaluation = CriterionEvaluation::new(criterion, rating).with_comment(entry.comment);
        evaluation.recorded_at = recorded_at;
        current.push(evaluation);
    }

    let prior = parsed
        .prior
        .into_iter()
        .map(|(name, rating)| {
            let criterion: Criterion =
                name.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
            let rating: Rating = rating
                .parse()
                .map_err(|e: String| anyhow::anyhow!("prior {criterion}: {e}"))?;
            Ok((criterion, rating))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StudentEvaluation {
        student: Student {
            id: parsed.student.id,
            name: parsed.student.name,
            class: parsed.student.class,
        },
        current: EvaluationSnapshot::from(current),
        prior: PriorEvaluationSnapshot::from_ratings(prior),
    })
}

/// Parse a single TOML file of answer sheets.
pub fn parse_answer_sheets(path: &Path) -> Result<Vec<AnswerSheet>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheets: {}", path.display()))?;

    parse_answer_sheets_str(&content, path)
}

/// Parse a TOML string of answer sheets.
pub fn parse_answer_sheets_str(content: &str, source_path: &Path) -> Result<Vec<AnswerSheet>> {
    let parsed: TomlSheetFile = read_toml(content, source_path)?;
    Ok(parsed.sheets)
}

/// Recursively load all `.toml` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<ExamDefinition>> {
    load_directory(dir, &parse_exam)
}

/// Recursively load all `.toml` evaluation files from a directory.
pub fn load_evaluation_directory(dir: &Path) -> Result<Vec<StudentEvaluation>> {
    load_directory(dir, &parse_evaluation)
}

fn load_directory<T>(dir: &Path, parse: &dyn Fn(&Path) -> Result<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            items.extend(load_directory(&path, parse)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse(&path) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(items)
}

/// A warning from data validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question or criterion the warning is about (if applicable).
    pub subject_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn about(subject_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            message: message.into(),
        }
    }

    fn general(message: impl Into<String>) -> Self {
        Self {
            subject_id: None,
            message: message.into(),
        }
    }
}

/// Validate an exam for common issues.
pub fn validate_exam(exam: &ExamDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning::general("exam has no questions"));
    }
    if exam.duration_minutes == 0 {
        warnings.push(ValidationWarning::general("duration_minutes is zero"));
    }
    if exam.end_date < exam.start_date {
        warnings.push(ValidationWarning::general(format!(
            "end_date {} is before start_date {}",
            exam.end_date, exam.start_date
        )));
    }

    let mut seen_ids = HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning::about(
                &question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
    }

    for question in &exam.questions {
        if question.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::about(&question.id, "prompt is empty"));
        }
    }

    for question in &exam.questions {
        match question.kind {
            QuestionKind::MultipleChoice if question.options.is_empty() => {
                warnings.push(ValidationWarning::about(
                    &question.id,
                    "multiple choice question has no options",
                ));
            }
            _ if !question.options.is_empty() && !question.accepts(&question.correct_answer) => {
                warnings.push(ValidationWarning::about(
                    &question.id,
                    format!(
                        "correct answer '{}' is not among the options",
                        question.correct_answer
                    ),
                ));
            }
            _ => {}
        }
    }

    warnings
}

/// Validate a student evaluation for common issues.
pub fn validate_evaluation(evaluation: &StudentEvaluation) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if evaluation.student.id.trim().is_empty() {
        warnings.push(ValidationWarning::general("student id is empty"));
    }
    for criterion in evaluation.current.missing() {
        warnings.push(ValidationWarning::about(
            criterion.to_string(),
            format!("criterion {criterion} has no current rating"),
        ));
    }

    warnings
}

/// Validate answer sheets against the exam they answer.
pub fn validate_answer_sheets(
    exam: &ExamDefinition,
    sheets: &[AnswerSheet],
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_students = HashSet::new();
    for sheet in sheets {
        if !seen_students.insert(&sheet.student_id) {
            warnings.push(ValidationWarning::about(
                &sheet.student_id,
                format!("duplicate sheet for student {}", sheet.student_id),
            ));
        }
        for question_id in sheet.answers.keys() {
            if exam.question(question_id).is_none() {
                warnings.push(ValidationWarning::about(
                    &sheet.student_id,
                    format!("answer to unknown question {question_id}"),
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_EXAM: &str = r#"
[exam]
id = "math-q1"
title = "Mathematics Simulation - Q1"
subject = "Mathematics"
description = "First quarter assessment"
start_date = "2025-11-01"
end_date = "2025-11-15"
duration_minutes = 60

[[questions]]
id = "q1"
prompt = "What is 2 + 2?"
options = ["3", "4", "5", "6"]
correct_answer = "4"
explanation = "Two plus two is four."
topic = "Arithmetic"
difficulty = "easy"
shared = true
author = "Prof. Ana Lima"

[[questions]]
id = "q2"
prompt = "Is zero an even number?"
kind = "true_false"
options = ["True", "False"]
correct_answer = "True"
subject = "Number Theory"
"#;

    const VALID_EVALUATION: &str = r#"
recorded_at = "2025-11-10T09:00:00Z"

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
comment = "Homework often late."

[current.sociability]
rating = "good"

[prior]
accessibility = "good"
participation = "good"
responsibility = "good"
"#;

    #[test]
    fn parse_valid_exam() {
        let exam = parse_exam_str(VALID_EXAM, &PathBuf::from("exam.toml")).unwrap();
        assert_eq!(exam.id, "math-q1");
        assert_eq!(exam.duration_seconds(), 3600);
        assert_eq!(exam.start_date, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(exam.questions.len(), 2);
        assert_eq!(exam.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(exam.questions[1].kind, QuestionKind::TrueFalse);
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_question_bank_fields() {
        let exam = parse_exam_str(VALID_EXAM, &PathBuf::from("exam.toml")).unwrap();
        let first = &exam.questions[0];
        assert_eq!(first.subject, "Mathematics");
        assert_eq!(first.topic, "Arithmetic");
        assert_eq!(first.difficulty, Difficulty::Easy);
        assert!(first.shared);
        assert_eq!(first.author, "Prof. Ana Lima");

        let second = &exam.questions[1];
        assert_eq!(second.subject, "Number Theory");
        assert_eq!(second.difficulty, Difficulty::Medium);
        assert!(!second.shared);
    }

    #[test]
    fn unknown_difficulty_is_an_error() {
        let bad = VALID_EXAM.replace("difficulty = \"easy\"", "difficulty = \"brutal\"");
        let err = parse_exam_str(&bad, &PathBuf::from("exam.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown difficulty: brutal"));
    }

    #[test]
    fn parse_bad_date() {
        let bad = VALID_EXAM.replace("2025-11-15", "15/11/2025");
        let err = parse_exam_str(&bad, &PathBuf::from("exam.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("end_date"));
    }

    #[test]
    fn validate_exam_issues() {
        let toml = r#"
[exam]
id = "broken"
title = "Broken"
start_date = "2025-11-15"
end_date = "2025-11-01"

[[questions]]
id = "same"
prompt = ""
options = ["a", "b"]
correct_answer = "c"

[[questions]]
id = "same"
prompt = "Pick one"
options = []
correct_answer = "a"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("broken.toml")).unwrap();
        let messages: Vec<String> = validate_exam(&exam).into_iter().map(|w| w.message).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("prompt is empty")));
        assert!(messages.iter().any(|m| m.contains("not among the options")));
        assert!(messages.iter().any(|m| m.contains("no options")));
        assert!(messages.iter().any(|m| m.contains("before start_date")));
    }

    #[test]
    fn validate_empty_exam() {
        let toml = r#"
[exam]
id = "empty"
title = "Empty"
start_date = "2025-11-01"
end_date = "2025-11-02"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("empty.toml")).unwrap();
        assert!(validate_exam(&exam)
            .iter()
            .any(|w| w.message.contains("no questions")));
    }

    #[test]
    fn parse_valid_evaluation() {
        let evaluation =
            parse_evaluation_str(VALID_EVALUATION, &PathBuf::from("ana.toml")).unwrap();
        assert_eq!(evaluation.student.name, "Ana Costa");
        assert!(evaluation.current.validate().is_ok());
        assert_eq!(
            evaluation.current.rating(Criterion::Responsibility),
            Some(Rating::NeedsImprovement)
        );
        assert_eq!(
            evaluation.current.get(Criterion::Accessibility).unwrap().comment,
            "Always on time."
        );
        assert_eq!(evaluation.prior.len(), 3);
        assert_eq!(evaluation.prior.rating(Criterion::Sociability), None);
        assert!(validate_evaluation(&evaluation).is_empty());
    }

    #[test]
    fn partial_evaluation_is_reported() {
        let toml = r#"
[student]
id = "2025002"
name = "Bruno Lima"

[current.accessibility]
rating = "good"
"#;
        let evaluation = parse_evaluation_str(toml, &PathBuf::from("bruno.toml")).unwrap();
        let warnings = validate_evaluation(&evaluation);
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].subject_id.as_deref(), Some("participation"));
    }

    #[test]
    fn unknown_criterion_is_an_error() {
        let toml = r#"
[student]
id = "x"
name = "X"

[current.punctuality]
rating = "good"
"#;
        assert!(parse_evaluation_str(toml, &PathBuf::from("x.toml")).is_err());
    }

    #[test]
    fn parse_sheets() {
        let toml = r#"
[[sheets]]
student_id = "2025001"
elapsed_seconds = 1200

[sheets.answers]
q1 = "4"
q2 = "A"

[[sheets]]
student_id = "2025002"
submit = false
"#;
        let sheets = parse_answer_sheets_str(toml, &PathBuf::from("sheets.toml")).unwrap();
        assert_eq!(sheets.len(), 2);
        assert!(sheets[0].submit);
        assert_eq!(sheets[0].answers.get("q2").map(String::as_str), Some("A"));
        assert!(!sheets[1].submit);
        assert!(sheets[1].answers.is_empty());

        let exam = parse_exam_str(VALID_EXAM, &PathBuf::from("exam.toml")).unwrap();
        assert!(validate_answer_sheets(&exam, &sheets).is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_exam_str(bad, &PathBuf::from("bad.toml")).is_err());
        assert!(parse_evaluation_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("math.toml"), VALID_EXAM).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("term2");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("math2.toml"),
            VALID_EXAM.replace("math-q1", "math-q2"),
        )
        .unwrap();

        let exams = load_exam_directory(dir.path()).unwrap();
        let ids: Vec<&str> = exams.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["math-q1", "math-q2"]);
    }

    #[test]
    fn load_evaluation_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ana.toml"), VALID_EVALUATION).unwrap();
        let evaluations = load_evaluation_directory(dir.path()).unwrap();
        assert_eq!(evaluations.len(), 1);
        assert!(load_evaluation_directory(&dir.path().join("ana.toml")).is_err());
    }
}
