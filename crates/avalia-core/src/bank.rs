//! Question bank: every question across the loaded exams, searchable.

use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, ExamDefinition, Question};

/// Criteria for narrowing the question bank. All set criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFilter {
    /// Case-insensitive substring of the prompt or the topic.
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive substring of the subject.
    pub subject: Option<String>,
    /// Keep only questions shared with other teachers.
    pub shared_only: bool,
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        self.matches_search(question)
            && self.difficulty.map_or(true, |d| question.difficulty == d)
            && self.matches_subject(question)
            && (!self.shared_only || question.shared)
    }

    fn matches_search(&self, question: &Question) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.to_lowercase();
        question.prompt.to_lowercase().contains(&needle)
            || question.topic.to_lowercase().contains(&needle)
    }

    fn matches_subject(&self, question: &Question) -> bool {
        let Some(subject) = self.subject.as_deref() else {
            return true;
        };
        question
            .subject
            .to_lowercase()
            .contains(&subject.to_lowercase())
    }

    /// Matching questions of `exams`, paired with the id of the exam they
    /// come from, in file order.
    pub fn apply<'a>(&self, exams: &'a [ExamDefinition]) -> Vec<(&'a str, &'a Question)> {
        exams
            .iter()
            .flat_map(|exam| exam.questions.iter().map(move |q| (exam.id.as_str(), q)))
            .filter(|(_, q)| self.matches(q))
            .collect()
    }
}
