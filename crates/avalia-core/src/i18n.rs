//! Static bilingual string table.
//!
//! Logic code only hands stable keys to [`lookup`]; it never builds display
//! strings itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::exam::SessionStatus;
use crate::model::{Availability, Criterion, Difficulty, Rating, Trend};

/// Display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Pt,
    En,
}

impl Locale {
    pub fn toggle(self) -> Self {
        match self {
            Locale::Pt => Locale::En,
            Locale::En => Locale::Pt,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Pt => write!(f, "pt"),
            Locale::En => write!(f, "en"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt" | "pt-br" | "portuguese" => Ok(Locale::Pt),
            "en" | "en-us" | "english" => Ok(Locale::En),
            other => Err(format!("unknown locale: {other}")),
        }
    }
}

/// Types that have a stable translation key.
pub trait TranslationKey {
    fn translation_key(&self) -> &'static str;

    /// Localized label for this value.
    fn label(&self, locale: Locale) -> &'static str {
        lookup(self.translation_key(), locale)
    }
}

impl TranslationKey for Rating {
    fn translation_key(&self) -> &'static str {
        match self {
            Rating::VeryLow => "level.veryLow",
            Rating::NeedsImprovement => "level.needsImprovement",
            Rating::Good => "level.good",
            Rating::Excellent => "level.excellent",
        }
    }
}

impl TranslationKey for Criterion {
    fn translation_key(&self) -> &'static str {
        match self {
            Criterion::Accessibility => "criteria.accessibility",
            Criterion::Participation => "criteria.participation",
            Criterion::Responsibility => "criteria.responsibility",
            Criterion::Sociability => "criteria.sociability",
        }
    }
}

impl Criterion {
    /// Key of the one-line description shown under the criterion name.
    pub fn description_key(self) -> &'static str {
        match self {
            Criterion::Accessibility => "criteria.accessibility.desc",
            Criterion::Participation => "criteria.participation.desc",
            Criterion::Responsibility => "criteria.responsibility.desc",
            Criterion::Sociability => "criteria.sociability.desc",
        }
    }
}

impl TranslationKey for Trend {
    fn translation_key(&self) -> &'static str {
        match self {
            Trend::Improved => "eval.improved",
            Trend::Maintained => "eval.maintained",
            Trend::Declined => "eval.declined",
            Trend::New => "eval.new",
        }
    }
}

impl TranslationKey for Availability {
    fn translation_key(&self) -> &'static str {
        match self {
            Availability::Scheduled => "sim.scheduled",
            Availability::Active => "sim.active",
            Availability::Finished => "sim.finished",
        }
    }
}

impl TranslationKey for SessionStatus {
    fn translation_key(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "sim.inProgress",
            SessionStatus::Submitted => "sim.submitted",
        }
    }
}

impl TranslationKey for Difficulty {
    fn translation_key(&self) -> &'static str {
        match self {
            Difficulty::Easy => "difficulty.easy",
            Difficulty::Medium => "difficulty.medium",
            Difficulty::Hard => "difficulty.hard",
        }
    }
}

/// `(key, en, pt)`
const TABLE: &[(&str, &str, &str)] = &[
    ("level.veryLow", "Very Low", "Muito Baixo"),
    ("level.needsImprovement", "Needs Improvement", "Precisa Melhorar"),
    ("level.good", "Good", "Bom"),
    ("level.excellent", "Excellent", "Excelente"),
    ("criteria.accessibility", "Accessibility", "Acessibilidade"),
    ("criteria.participation", "Participation", "Participação"),
    ("criteria.responsibility", "Responsibility", "Responsabilidade"),
    ("criteria.sociability", "Sociability", "Sociabilidade"),
    (
        "criteria.accessibility.desc",
        "Presence and punctuality",
        "Presença e pontualidade",
    ),
    (
        "criteria.participation.desc",
        "Engagement in classes and activities",
        "Engajamento nas aulas e atividades",
    ),
    (
        "criteria.responsibility.desc",
        "Completion of tasks and commitments",
        "Cumprimento de tarefas e compromissos",
    ),
    (
        "criteria.sociability.desc",
        "Respect, cooperation, and coexistence",
        "Respeito, convivência e cooperação",
    ),
    ("eval.title", "Student Evaluation", "Avaliação do Aluno"),
    ("eval.performanceReport", "Performance Report", "Relatório de Desempenho"),
    ("eval.evolutionTrend", "Evolution Trend", "Tendência de Evolução"),
    ("eval.improved", "Improved", "Melhorou"),
    ("eval.maintained", "Maintained", "Manteve"),
    ("eval.declined", "Declined", "Piorou"),
    ("eval.new", "New", "Novo"),
    ("eval.criterion", "Criterion", "Critério"),
    ("eval.rating", "Rating", "Nível"),
    ("eval.previous", "Previous", "Anterior"),
    ("eval.trend", "Trend", "Tendência"),
    ("eval.comments", "Comments", "Comentários"),
    ("dashboard.average", "Average", "Média"),
    ("sim.title", "Simulations & Tests", "Simulados e Provas"),
    ("sim.scheduled", "Scheduled", "Agendado"),
    ("sim.active", "Active", "Ativo"),
    ("sim.finished", "Finished", "Finalizado"),
    ("sim.inProgress", "In Progress", "Em Andamento"),
    ("sim.submitted", "Submitted", "Enviado"),
    ("sim.question", "Question", "Questão"),
    ("sim.of", "of", "de"),
    ("sim.timeRemaining", "Time Remaining", "Tempo Restante"),
    ("sim.submitTest", "Submit Test", "Enviar Prova"),
    ("sim.score", "Score", "Pontuação"),
    ("sim.questionsAnswered", "Questions Answered", "Questões Respondidas"),
    ("sim.classAverage", "Class Average", "Média da Turma"),
    ("sim.successRate", "Success Rate", "Taxa de Acerto"),
    ("sim.participants", "Participants", "Participantes"),
    ("sim.student", "Student", "Aluno"),
    ("difficulty.easy", "Easy", "Fácil"),
    ("difficulty.medium", "Medium", "Médio"),
    ("difficulty.hard", "Hard", "Difícil"),
    ("qbank.title", "Question Bank", "Banco de Questões"),
    ("qbank.sharedQuestions", "Shared Questions", "Questões Compartilhadas"),
    ("qbank.subject", "Subject", "Disciplina"),
    ("qbank.topic", "Topic", "Tópico"),
    ("qbank.difficulty", "Difficulty", "Dificuldade"),
    ("qbank.shared", "Shared", "Compartilhada"),
    ("qbank.private", "Private", "Privada"),
];

/// Localized text for `key`, or the key itself when it is unknown.
pub fn lookup(key: &str, locale: Locale) -> &str {
    TABLE
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, en, pt)| match locale {
            Locale::En => *en,
            Locale::Pt => *pt,
        })
        .unwrap_or(key)
}
