//! The `avalia questions` command: search the question bank.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use avalia_core::bank::QuestionFilter;
use avalia_core::i18n::{lookup, TranslationKey};
use avalia_core::identity::Role;
use avalia_core::model::Difficulty;
use avalia_core::parser;

use super::{load_settings, require_role, Global};

pub fn execute(
    data_path: Option<PathBuf>,
    search: Option<String>,
    difficulty: Option<String>,
    subject: Option<String>,
    shared: bool,
    lang: Option<String>,
    global: &Global,
) -> Result<()> {
    let config = load_settings(global, lang.as_deref())?;
    require_role(&config.viewer, Role::can_manage_exams, "browse the question bank")?;
    let locale = config.locale;
    let t = |key: &str| lookup(key, locale).to_string();

    let filter = QuestionFilter {
        search,
        difficulty: difficulty
            .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!(e)))
            .transpose()?,
        subject,
        shared_only: shared,
    };

    let data_path = data_path.unwrap_or_else(|| {
        let exams = config.data_dir.join("exams");
        if exams.is_dir() {
            exams
        } else {
            config.data_dir.clone()
        }
    });
    let exams = if data_path.is_dir() {
        parser::load_exam_directory(&data_path)?
    } else {
        vec![parser::parse_exam(&data_path)?]
    };

    let hits = filter.apply(&exams);
    tracing::debug!(exams = exams.len(), hits = hits.len(), "question bank filtered");

    if shared {
        println!("{}", t("qbank.sharedQuestions"));
    } else {
        println!("{}", t("qbank.title"));
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Exam".to_string(),
        "ID".to_string(),
        t("qbank.subject"),
        t("qbank.topic"),
        t("qbank.difficulty"),
        String::new(),
        t("sim.question"),
    ]);
    for (exam_id, question) in &hits {
        let visibility = if question.shared {
            t("qbank.shared")
        } else {
            t("qbank.private")
        };
        table.add_row(vec![
            Cell::new(exam_id),
            Cell::new(&question.id),
            Cell::new(&question.subject),
            Cell::new(&question.topic),
            Cell::new(question.difficulty.label(locale)),
            Cell::new(visibility),
            Cell::new(&question.prompt),
        ]);
    }
    println!("{table}");
    println!("{} question(s)", hits.len());

    Ok(())
}
