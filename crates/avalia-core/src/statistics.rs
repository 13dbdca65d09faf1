//! Class-level aggregate statistics.
//!
//! Exam statistics summarize the graded results of one exam; evaluation
//! statistics summarize the behavioural ratings of a class.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::evaluation::{trends, OneDecimal};
use crate::exam::ExamResult;
use crate::model::{Criterion, ExamDefinition, StudentEvaluation, Trend};

/// Aggregate results of one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamStatistics {
    pub exam_id: String,
    /// Number of graded sessions.
    pub participants: usize,
    /// Mean grade on the 0–10 scale.
    pub class_average: OneDecimal,
    /// Mean fraction of correct answers, in `[0, 1]`.
    pub success_rate: f64,
    /// One entry per question, in exam order.
    pub per_question: Vec<QuestionStatistics>,
}

/// How a single question fared across the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStatistics {
    pub question_id: String,
    /// Students who answered it at all.
    pub answered: usize,
    pub correct: usize,
    /// `correct / participants`.
    pub correct_rate: f64,
}

impl ExamStatistics {
    /// Aggregate `results` of `exam`.
    ///
    /// Every result must belong to `exam`. An empty slice yields zero
    /// participants and zero rates.
    pub fn compute(exam: &ExamDefinition, results: &[ExamResult]) -> CoreResult<Self> {
        if let Some(foreign) = results.iter().find(|r| r.exam_id != exam.id) {
            return Err(CoreError::invariant(format!(
                "result of exam {} cannot be aggregated into exam {}",
                foreign.exam_id, exam.id
            )));
        }

        let participants = results.len();
        let grade_tenths: u64 = results.iter().map(|r| r.grade.tenths() as u64).sum();
        let class_average =
            OneDecimal::from_ratio(grade_tenths, participants as u64 * 10).unwrap_or_default();
        let success_rate = if participants == 0 {
            0.0
        } else {
            results.iter().map(|r| r.fraction).sum::<f64>() / participants as f64
        };

        let per_question = exam
            .questions
            .iter()
            .map(|q| {
                let correct = results
                    .iter()
                    .filter(|r| r.correct_questions.contains(&q.id))
                    .count();
                QuestionStatistics {
                    question_id: q.id.clone(),
                    answered: results
                        .iter()
                        .filter(|r| r.answered_questions.contains(&q.id))
                        .count(),
                    correct,
                    correct_rate: if participants == 0 {
                        0.0
                    } else {
                        correct as f64 / participants as f64
                    },
                }
            })
            .collect();

        Ok(Self {
            exam_id: exam.id.clone(),
            participants,
            class_average,
            success_rate,
            per_question,
        })
    }

    /// The question with the lowest correct rate, if any.
    pub fn hardest_question(&self) -> Option<&QuestionStatistics> {
        self.per_question
            .iter()
            .min_by(|a, b| a.correct_rate.total_cmp(&b.correct_rate))
    }
}

/// Class average of one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStatistics {
    pub criterion: Criterion,
    /// Number of students rated on this criterion.
    pub rated: usize,
    /// Mean rank in `[1.0, 4.0]`; absent when nobody was rated.
    pub average: Option<OneDecimal>,
}

/// Counts of each trend across a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendCounts {
    pub improved: usize,
    pub maintained: usize,
    pub declined: usize,
    pub new: usize,
}

impl TrendCounts {
    fn record(&mut self, trend: Trend) {
        match trend {
            Trend::Improved => self.improved += 1,
            Trend::Maintained => self.maintained += 1,
            Trend::Declined => self.declined += 1,
            Trend::New => self.new += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.improved + self.maintained + self.declined + self.new
    }
}

/// Aggregate behavioural ratings of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStatistics {
    pub students: usize,
    pub per_criterion: Vec<CriterionStatistics>,
    pub trends: TrendCounts,
}

impl EvaluationStatistics {
    pub fn compute(evaluations: &[StudentEvaluation]) -> Self {
        let per_criterion = Criterion::ALL
            .into_iter()
            .map(|criterion| {
                let ranks: Vec<u64> = evaluations
                    .iter()
                    .filter_map(|e| e.current.rating(criterion))
                    .map(|r| r.rank() as u64)
                    .collect();
                CriterionStatistics {
                    criterion,
                    rated: ranks.len(),
                    average: OneDecimal::from_ratio(ranks.iter().sum(), ranks.len() as u64),
                }
            })
            .collect();

        let mut counts = TrendCounts::default();
        for evaluation in evaluations {
            for (_, trend) in trends(&evaluation.current, &evaluation.prior) {
                counts.record(trend);
            }
        }

        Self {
            students: evaluations.len(),
            per_criterion,
            trends: counts,
        }
    }
}
