//! Timed multiple-choice exam sessions.
//!
//! An [`ExamSession`] is an immutable value. Every event is applied by
//! [`ExamSession::apply`], which returns the next session or an error and
//! never touches the receiver. The hosting layer owns the mutable slot, in
//! practice a [`SessionBook`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::evaluation::OneDecimal;
use crate::model::ExamDefinition;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    /// Terminal. Answers are frozen.
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::InProgress => write!(f, "in progress"),
            SessionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

/// Why a session was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionCause {
    /// The student pressed submit.
    Manual,
    /// The countdown reached zero.
    TimeExpired,
}

/// Input events of the exam state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamEvent {
    SelectAnswer { question_id: String, option: String },
    GoTo(usize),
    Next,
    Previous,
    /// One second of wall-clock time elapsed.
    Tick,
    Submit,
}

impl ExamEvent {
    fn operation(&self) -> &'static str {
        match self {
            ExamEvent::SelectAnswer { .. } => "select an answer",
            ExamEvent::GoTo(_) => "navigate",
            ExamEvent::Next => "go to the next question",
            ExamEvent::Previous => "go to the previous question",
            ExamEvent::Tick => "tick",
            ExamEvent::Submit => "submit",
        }
    }
}

/// One student's run through one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSession {
    pub id: Uuid,
    pub exam_id: String,
    pub student_id: String,
    question_ids: Vec<String>,
    current_question_index: usize,
    answers: BTreeMap<String, String>,
    remaining_seconds: u32,
    status: SessionStatus,
    #[serde(default)]
    submission: Option<SubmissionCause>,
}

impl ExamSession {
    /// Start a fresh session on `exam`.
    ///
    /// Fails if the exam has no questions or no time, since the index and
    /// countdown invariants could not hold.
    pub fn start(exam: &ExamDefinition, student_id: impl Into<String>) -> CoreResult<Self> {
        exam.ensure_takeable()?;
        let session = Self {
            id: Uuid::new_v4(),
            exam_id: exam.id.clone(),
            student_id: student_id.into(),
            question_ids: exam.questions.iter().map(|q| q.id.clone()).collect(),
            current_question_index: 0,
            answers: BTreeMap::new(),
            remaining_seconds: exam.duration_seconds(),
            status: SessionStatus::InProgress,
            submission: None,
        };
        tracing::debug!(
            session = %session.id,
            exam = %session.exam_id,
            student = %session.student_id,
            seconds = session.remaining_seconds,
            "exam session started"
        );
        Ok(session)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_submitted(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    pub fn submission_cause(&self) -> Option<SubmissionCause> {
        self.submission
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    /// Id of the question currently displayed.
    pub fn current_question_id(&self) -> &str {
        &self.question_ids[self.current_question_index]
    }

    pub fn question_count(&self) -> usize {
        self.question_ids.len()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Recorded answers, keyed by question id.
    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Position in the exam as a percentage, counting the current question.
    pub fn progress(&self) -> f64 {
        (self.current_question_index + 1) as f64 / self.question_count() as f64 * 100.0
    }

    /// Apply one event and return the resulting session.
    ///
    /// A submitted session rejects every event with `InvalidState`. Failed
    /// guards leave the receiver untouched; the caller keeps its old value.
    pub fn apply(&self, event: &ExamEvent) -> CoreResult<Self> {
        if self.is_submitted() {
            return Err(CoreError::invalid_state(event.operation(), self.status));
        }

        let len = self.question_count();
        let mut next = self.clone();
        match event {
            ExamEvent::SelectAnswer {
                question_id,
                option,
            } => {
                if !self.question_ids.contains(question_id) {
                    return Err(CoreError::invariant(format!(
                        "question {question_id} is not part of exam {}",
                        self.exam_id
                    )));
                }
                next.answers.insert(question_id.clone(), option.clone());
            }
            ExamEvent::GoTo(index) => {
                if *index >= len {
                    return Err(CoreError::OutOfBounds { index: *index, len });
                }
                next.current_question_index = *index;
            }
            ExamEvent::Next => {
                let index = self.current_question_index + 1;
                if index >= len {
                    return Err(CoreError::OutOfBounds { index, len });
                }
                next.current_question_index = index;
            }
            ExamEvent::Previous => {
                let Some(index) = self.current_question_index.checked_sub(1) else {
                    return Err(CoreError::OutOfBounds {
                        index: self.current_question_index,
                        len,
                    });
                };
                next.current_question_index = index;
            }
            ExamEvent::Tick => {
                next.remaining_seconds = self.remaining_seconds.saturating_sub(1);
                if next.remaining_seconds == 0 {
                    next.freeze(SubmissionCause::TimeExpired);
                }
            }
            ExamEvent::Submit => next.freeze(SubmissionCause::Manual),
        }
        Ok(next)
    }

    fn freeze(&mut self, cause: SubmissionCause) {
        self.status = SessionStatus::Submitted;
        self.submission = Some(cause);
        tracing::info!(
            session = %self.id,
            exam = %self.exam_id,
            student = %self.student_id,
            answered = self.answers.len(),
            ?cause,
            "exam session submitted"
        );
    }

    /// Record `option` as the answer to `question_id`, checked against the
    /// exam's options.
    pub fn select_answer(
        &self,
        exam: &ExamDefinition,
        question_id: &str,
        option: &str,
    ) -> CoreResult<Self> {
        if !self.is_submitted() {
            self.ensure_exam(exam)?;
            if let Some(question) = exam.question(question_id) {
                if !question.accepts(option) {
                    return Err(CoreError::invariant(format!(
                        "'{option}' is not an option of question {question_id}"
                    )));
                }
            }
        }
        self.apply(&ExamEvent::SelectAnswer {
            question_id: question_id.to_string(),
            option: option.to_string(),
        })
    }

    pub fn go_to(&self, index: usize) -> CoreResult<Self> {
        self.apply(&ExamEvent::GoTo(index))
    }

    pub fn next(&self) -> CoreResult<Self> {
        self.apply(&ExamEvent::Next)
    }

    pub fn previous(&self) -> CoreResult<Self> {
        self.apply(&ExamEvent::Previous)
    }

    pub fn tick(&self) -> CoreResult<Self> {
        self.apply(&ExamEvent::Tick)
    }

    pub fn submit(&self) -> CoreResult<Self> {
        self.apply(&ExamEvent::Submit)
    }

    fn ensure_exam(&self, exam: &ExamDefinition) -> CoreResult<()> {
        if exam.id != self.exam_id {
            return Err(CoreError::invariant(format!(
                "session belongs to exam {}, not {}",
                self.exam_id, exam.id
            )));
        }
        Ok(())
    }
}

/// Fraction of the exam's questions answered correctly.
///
/// Only defined once answers are frozen: an in-progress session fails with
/// `InvalidState`.
pub fn score(session: &ExamSession, exam: &ExamDefinition) -> CoreResult<f64> {
    Ok(ExamResult::compute(session, exam)?.fraction)
}

/// Graded outcome of a submitted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub session_id: Uuid,
    pub exam_id: String,
    pub student_id: String,
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
    /// `correct / total`.
    pub fraction: f64,
    /// Grade on the 0–10 scale.
    pub grade: OneDecimal,
    /// Ids of the questions answered correctly.
    pub correct_questions: Vec<String>,
    /// Ids of every answered question.
    #[serde(default)]
    pub answered_questions: Vec<String>,
    pub cause: Option<SubmissionCause>,
}

impl ExamResult {
    pub fn compute(session: &ExamSession, exam: &ExamDefinition) -> CoreResult<Self> {
        if !session.is_submitted() {
            return Err(CoreError::invalid_state("score", session.status));
        }
        session.ensure_exam(exam)?;

        let total = exam.question_count();
        if total == 0 {
            return Err(CoreError::invariant(format!(
                "exam {} has no questions",
                exam.id
            )));
        }

        let correct_questions: Vec<String> = exam
            .questions
            .iter()
            .filter(|q| session.answer(&q.id) == Some(q.correct_answer.as_str()))
            .map(|q| q.id.clone())
            .collect();
        let correct = correct_questions.len();

        Ok(Self {
            session_id: session.id,
            exam_id: exam.id.clone(),
            student_id: session.student_id.clone(),
            correct,
            answered: session.answered_count(),
            total,
            fraction: correct as f64 / total as f64,
            grade: OneDecimal::from_ratio(correct as u64 * 10, total as u64).unwrap_or_default(),
            correct_questions,
            answered_questions: session.answers().keys().cloned().collect(),
            cause: session.submission_cause(),
        })
    }
}

/// A recorded run of one student through an exam, replayed to grade it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub student_id: String,
    /// Seconds of exam time used before the sheet ends.
    #[serde(default)]
    pub elapsed_seconds: u32,
    /// Whether the student pressed submit. A sheet that was not submitted
    /// only ends up graded if its time ran out.
    #[serde(default = "default_submit")]
    pub submit: bool,
    /// Question id to option text or option letter.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

fn default_submit() -> bool {
    true
}

impl AnswerSheet {
    /// Drive a fresh session through this sheet.
    ///
    /// Answers are selected in exam order, then the elapsed time is ticked
    /// off, then the session is submitted if requested and still open.
    pub fn replay(&self, exam: &ExamDefinition) -> CoreResult<ExamSession> {
        if let Some(unknown) = self.answers.keys().find(|q| exam.question(q).is_none()) {
            return Err(CoreError::invariant(format!(
                "question {unknown} is not part of exam {}",
                exam.id
            )));
        }
        let mut session = ExamSession::start(exam, &self.student_id)?;
        for question in &exam.questions {
            let Some(given) = self.answers.get(&question.id) else {
                continue;
            };
            let option = if question.accepts(given) {
                given.as_str()
            } else {
                question.option_by_label(given).unwrap_or(given.as_str())
            };
            session = session.select_answer(exam, &question.id, option)?;
        }

        for _ in 0..self.elapsed_seconds {
            if session.is_submitted() {
                break;
            }
            session = session.tick()?;
        }
        if self.submit && !session.is_submitted() {
            session = session.submit()?;
        }
        Ok(session)
    }
}

/// Countdown display as `MM:SS`.
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Key of a session inside a [`SessionBook`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub exam_id: String,
    pub student_id: String,
}

impl SessionKey {
    pub fn new(exam_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            student_id: student_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exam_id, self.student_id)
    }
}

/// The sessions owned by one viewer, at most one per (exam, student).
#[derive(Debug, Default)]
pub struct SessionBook {
    sessions: HashMap<SessionKey, ExamSession>,
}

impl SessionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session for (`exam`, `student_id`).
    ///
    /// Fails with `InvalidState` if one already exists, whatever its status.
    pub fn start(&mut self, exam: &ExamDefinition, student_id: &str) -> CoreResult<&ExamSession> {
        let key = SessionKey::new(&exam.id, student_id);
        if let Some(existing) = self.sessions.get(&key) {
            return Err(CoreError::invalid_state("start", existing.status));
        }
        let session = ExamSession::start(exam, student_id)?;
        Ok(self.sessions.entry(key).or_insert(session))
    }

    pub fn get(&self, key: &SessionKey) -> Option<&ExamSession> {
        self.sessions.get(key)
    }

    /// Apply `event` to the stored session, replacing it on success.
    pub fn apply(&mut self, key: &SessionKey, event: &ExamEvent) -> CoreResult<&ExamSession> {
        let slot = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| CoreError::invariant(format!("no session for {key}")))?;
        *slot = slot.apply(event)?;
        Ok(&*slot)
    }

    /// Drop a session, e.g. when the viewer navigates away.
    pub fn remove(&mut self, key: &SessionKey) -> Option<ExamSession> {
        self.sessions.remove(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
