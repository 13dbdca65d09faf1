//! Core data model types for AVALIA+.
//!
//! Ratings and criteria are closed enumerations; evaluations and exams are
//! plain values that the rest of the crate transforms without aliasing.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// Ratings and criteria
// ---------------------------------------------------------------------------

/// Four-level ordinal rating used by behavioural evaluations.
///
/// The derived ordering follows the rank: `VeryLow < NeedsImprovement < Good
/// < Excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    VeryLow,
    NeedsImprovement,
    Good,
    Excellent,
}

impl Rating {
    /// All ratings, lowest first.
    pub const ALL: [Rating; 4] = [
        Rating::VeryLow,
        Rating::NeedsImprovement,
        Rating::Good,
        Rating::Excellent,
    ];

    /// Highest possible rank.
    pub const MAX_RANK: u8 = 4;

    /// Numeric rank in `1..=4`. This is the only value used in computation.
    pub fn rank(self) -> u8 {
        match self {
            Rating::VeryLow => 1,
            Rating::NeedsImprovement => 2,
            Rating::Good => 3,
            Rating::Excellent => 4,
        }
    }

    /// Display glyph shown next to the rating.
    pub fn glyph(self) -> &'static str {
        match self {
            Rating::VeryLow => "😞",
            Rating::NeedsImprovement => "😐",
            Rating::Good => "🙂",
            Rating::Excellent => "😃",
        }
    }

    /// Look up a rating by its rank.
    pub fn from_rank(rank: u8) -> Option<Rating> {
        Rating::ALL.into_iter().find(|r| r.rank() == rank)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::VeryLow => write!(f, "very_low"),
            Rating::NeedsImprovement => write!(f, "needs_improvement"),
            Rating::Good => write!(f, "good"),
            Rating::Excellent => write!(f, "excellent"),
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "verylow" | "1" => Ok(Rating::VeryLow),
            "needsimprovement" | "2" => Ok(Rating::NeedsImprovement),
            "good" | "3" => Ok(Rating::Good),
            "excellent" | "4" => Ok(Rating::Excellent),
            _ => Err(format!("unknown rating: {s}")),
        }
    }
}

/// Behavioural evaluation criterion. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Presence and punctuality.
    Accessibility,
    /// Engagement in classes and activities.
    Participation,
    /// Completion of tasks and commitments.
    Responsibility,
    /// Respect, cooperation, and coexistence.
    Sociability,
}

impl Criterion {
    /// All criteria in display order.
    pub const ALL: [Criterion; 4] = [
        Criterion::Accessibility,
        Criterion::Participation,
        Criterion::Responsibility,
        Criterion::Sociability,
    ];
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Accessibility => write!(f, "accessibility"),
            Criterion::Participation => write!(f, "participation"),
            Criterion::Responsibility => write!(f, "responsibility"),
            Criterion::Sociability => write!(f, "sociability"),
        }
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accessibility" => Ok(Criterion::Accessibility),
            "participation" => Ok(Criterion::Participation),
            "responsibility" => Ok(Criterion::Responsibility),
            "sociability" => Ok(Criterion::Sociability),
            other => Err(format!("unknown criterion: {other}")),
        }
    }
}

/// Direction of change between a prior and a current rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improved,
    Maintained,
    Declined,
    /// No prior rating exists for the criterion.
    New,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improved => write!(f, "improved"),
            Trend::Maintained => write!(f, "maintained"),
            Trend::Declined => write!(f, "declined"),
            Trend::New => write!(f, "new"),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluations
// ---------------------------------------------------------------------------

/// The student an evaluation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Enrolment number.
    pub id: String,
    pub name: String,
    /// Class label, e.g. "1º Ano A".
    #[serde(default)]
    pub class: String,
}

/// Rating and comment recorded for one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionEvaluation {
    pub criterion: Criterion,
    pub rating: Rating,
    /// Free-text comment. Empty is a valid value.
    #[serde(default)]
    pub comment: String,
    pub recorded_at: DateTime<Utc>,
}

impl CriterionEvaluation {
    pub fn new(criterion: Criterion, rating: Rating) -> Self {
        Self {
            criterion,
            rating,
            comment: String::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// The current, in-progress evaluation of one student.
///
/// Snapshots built through [`EvaluationSnapshot::new`] or
/// [`EvaluationSnapshot::from_evaluations`] cover every criterion. Snapshots
/// deserialized from external data may be partial; [`validate`] reports that.
///
/// [`validate`]: EvaluationSnapshot::validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<CriterionEvaluation>",
    into = "Vec<CriterionEvaluation>"
)]
pub struct EvaluationSnapshot {
    entries: BTreeMap<Criterion, CriterionEvaluation>,
}

impl EvaluationSnapshot {
    /// A total snapshot with every criterion set to `initial`.
    pub fn new(initial: Rating) -> Self {
        let entries = Criterion::ALL
            .into_iter()
            .map(|c| (c, CriterionEvaluation::new(c, initial)))
            .collect();
        Self { entries }
    }

    /// Build a snapshot from one evaluation per criterion.
    ///
    /// Fails on duplicated or missing criteria.
    pub fn from_evaluations(
        evaluations: impl IntoIterator<Item = CriterionEvaluation>,
    ) -> CoreResult<Self> {
        let mut entries = BTreeMap::new();
        for evaluation in evaluations {
            let criterion = evaluation.criterion;
            if entries.insert(criterion, evaluation).is_some() {
                return Err(CoreError::invariant(format!(
                    "criterion {criterion} evaluated more than once"
                )));
            }
        }
        let snapshot = Self { entries };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Evaluation recorded for `criterion`, if any.
    pub fn get(&self, criterion: Criterion) -> Option<&CriterionEvaluation> {
        self.entries.get(&criterion)
    }

    /// Rating recorded for `criterion`, if any.
    pub fn rating(&self, criterion: Criterion) -> Option<Rating> {
        self.get(criterion).map(|e| e.rating)
    }

    /// Evaluations in criterion order.
    pub fn iter(&self) -> impl Iterator<Item = &CriterionEvaluation> {
        self.entries.values()
    }

    /// Criteria with no evaluation.
    pub fn missing(&self) -> Vec<Criterion> {
        Criterion::ALL
            .into_iter()
            .filter(|c| !self.entries.contains_key(c))
            .collect()
    }

    /// Check that every criterion is present.
    pub fn validate(&self) -> CoreResult<()> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
        Err(CoreError::invariant(format!(
            "evaluation snapshot is missing criteria: {}",
            names.join(", ")
        )))
    }

    /// Return a copy with `criterion` rated `rating`.
    ///
    /// The comment and all other criteria are left as they were.
    pub fn rate(&self, criterion: Criterion, rating: Rating) -> Self {
        let mut next = self.clone();
        let entry = next
            .entries
            .entry(criterion)
            .or_insert_with(|| CriterionEvaluation::new(criterion, rating));
        entry.rating = rating;
        entry.recorded_at = Utc::now();
        next
    }

    /// Return a copy with the comment of `criterion` replaced by `text`.
    ///
    /// An empty `text` is stored as an empty comment.
    pub fn set_comment(&self, criterion: Criterion, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        match next.entries.get_mut(&criterion) {
            Some(entry) => entry.comment = text.into(),
            None => {
                tracing::debug!(%criterion, "comment on unrated criterion ignored");
            }
        }
        next
    }
}

impl From<Vec<CriterionEvaluation>> for EvaluationSnapshot {
    fn from(evaluations: Vec<CriterionEvaluation>) -> Self {
        let entries = evaluations.into_iter().map(|e| (e.criterion, e)).collect();
        Self { entries }
    }
}

impl From<EvaluationSnapshot> for Vec<CriterionEvaluation> {
    fn from(snapshot: EvaluationSnapshot) -> Self {
        snapshot.entries.into_values().collect()
    }
}

/// One entry of a prior evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorRating {
    pub criterion: Criterion,
    pub rating: Rating,
}

/// The most recently saved evaluation. Read-only.
///
/// A criterion that was never evaluated before has no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PriorRating>", into = "Vec<PriorRating>")]
pub struct PriorEvaluationSnapshot {
    ratings: BTreeMap<Criterion, Rating>,
}

impl PriorEvaluationSnapshot {
    /// An empty prior: every criterion is new.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ratings(ratings: impl IntoIterator<Item = (Criterion, Rating)>) -> Self {
        Self {
            ratings: ratings.into_iter().collect(),
        }
    }

    /// Freeze a current snapshot as the prior of the next evaluation.
    pub fn from_snapshot(snapshot: &EvaluationSnapshot) -> Self {
        Self::from_ratings(snapshot.iter().map(|e| (e.criterion, e.rating)))
    }

    pub fn rating(&self, criterion: Criterion) -> Option<Rating> {
        self.ratings.get(&criterion).copied()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

impl From<Vec<PriorRating>> for PriorEvaluationSnapshot {
    fn from(entries: Vec<PriorRating>) -> Self {
        Self::from_ratings(entries.into_iter().map(|p| (p.criterion, p.rating)))
    }
}

impl From<PriorEvaluationSnapshot> for Vec<PriorRating> {
    fn from(prior: PriorEvaluationSnapshot) -> Self {
        prior
            .ratings
            .into_iter()
            .map(|(criterion, rating)| PriorRating { criterion, rating })
            .collect()
    }
}

/// A student's current evaluation together with the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEvaluation {
    pub student: Student,
    pub current: EvaluationSnapshot,
    #[serde(default)]
    pub prior: PriorEvaluationSnapshot,
}

// ---------------------------------------------------------------------------
// Exams
// ---------------------------------------------------------------------------

/// How a question is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
            QuestionKind::TrueFalse => write!(f, "true_false"),
            QuestionKind::ShortAnswer => write!(f, "short_answer"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "multiplechoice" | "mc" => Ok(QuestionKind::MultipleChoice),
            "truefalse" | "tf" => Ok(QuestionKind::TrueFalse),
            "shortanswer" | "short" => Ok(QuestionKind::ShortAnswer),
            _ => Err(format!("unknown question kind: {s}")),
        }
    }
}

/// Difficulty tag of a question-bank entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A single exam question. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub kind: QuestionKind,
    /// Answer options in display order. Empty for open questions.
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Subject of the question; inside an exam file it defaults to the
    /// exam's subject.
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Visible to other teachers in the shared bank.
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub author: String,
}

impl Question {
    /// Whether `option` is an acceptable answer text for this question.
    ///
    /// Questions without options accept any text.
    pub fn accepts(&self, option: &str) -> bool {
        self.options.is_empty() || self.options.iter().any(|o| o == option)
    }

    /// Resolve an option letter (`A`, `b`, ...) to its text.
    pub fn option_by_label(&self, label: &str) -> Option<&str> {
        let mut chars = label.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !letter.is_ascii_uppercase() {
            return None;
        }
        let index = (letter as u8 - b'A') as usize;
        self.options.get(index).map(String::as_str)
    }
}

/// Letter shown in front of the option at `index` (`A`, `B`, ...).
pub fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Publication window status of an exam relative to a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Scheduled,
    Active,
    Finished,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Scheduled => write!(f, "scheduled"),
            Availability::Active => write!(f, "active"),
            Availability::Finished => write!(f, "finished"),
        }
    }
}

/// A published, timed exam. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDefinition {
    pub id: String,
    pub title: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_minutes: u32,
    pub questions: Vec<Question>,
}

impl ExamDefinition {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Total time allowed, in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Position of a question in the exam.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    /// Status of the exam's date window on `today`.
    pub fn availability(&self, today: NaiveDate) -> Availability {
        if today < self.start_date {
            Availability::Scheduled
        } else if today > self.end_date {
            Availability::Finished
        } else {
            Availability::Active
        }
    }

    /// Check that a session can be run on this exam.
    pub fn ensure_takeable(&self) -> CoreResult<()> {
        if self.questions.is_empty() {
            return Err(CoreError::invariant(format!(
                "exam {} has no questions",
                self.id
            )));
        }
        if self.duration_minutes == 0 {
            return Err(CoreError::invariant(format!(
                "exam {} has a zero duration",
                self.id
            )));
        }
        // answers are keyed by question id, so ids must be unique
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.questions.iter().find(|q| !seen.insert(q.id.as_str())) {
            return Err(CoreError::invariant(format!(
                "exam {} has duplicate question id {}",
                self.id, duplicate.id
            )));
        }
        Ok(())
    }
}
