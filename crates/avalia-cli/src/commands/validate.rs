//! The `avalia validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use avalia_core::parser::{self, ValidationWarning};

use super::{load_settings, Global};

/// What a data file holds, judged by its top-level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataKind {
    Exam,
    Evaluation,
    Sheets,
}

fn detect_kind(content: &str) -> Option<DataKind> {
    let value: toml::Table = toml::from_str(content).ok()?;
    if value.contains_key("exam") {
        Some(DataKind::Exam)
    } else if value.contains_key("student") {
        Some(DataKind::Evaluation)
    } else if value.contains_key("sheets") {
        Some(DataKind::Sheets)
    } else {
        None
    }
}

pub fn execute(data_path: Option<PathBuf>, global: &Global) -> Result<()> {
    let data_path = match data_path {
        Some(path) => path,
        None => load_settings(global, None)?.data_dir,
    };
    if !data_path.exists() {
        anyhow::bail!("no such file or directory: {}", data_path.display());
    }

    let mut files = Vec::new();
    collect_toml_files(&data_path, &mut files)?;

    let mut total_warnings = 0;
    let mut failures = 0;

    for path in &files {
        match validate_file(path) {
            Ok(Some(warnings)) => {
                for w in &warnings {
                    let prefix = w
                        .subject_id
                        .as_ref()
                        .map(|id| format!("  [{id}]"))
                        .unwrap_or_else(|| "  ".to_string());
                    println!("{prefix} WARNING: {}", w.message);
                }
                total_warnings += warnings.len();
            }
            Ok(None) => println!("Skipping {}: not an AVALIA+ data file", path.display()),
            Err(e) => {
                println!("{}: ERROR: {e:#}", path.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} file(s) could not be parsed");
    }
    if total_warnings == 0 {
        println!("All data files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

/// Parse one file and return its warnings, or `None` for unrelated TOML.
fn validate_file(path: &Path) -> Result<Option<Vec<ValidationWarning>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let Some(kind) = detect_kind(&content) else {
        // Surface syntax errors instead of silently skipping the file.
        toml::from_str::<toml::Table>(&content)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        return Ok(None);
    };

    let warnings = match kind {
        DataKind::Exam => {
            let exam = parser::parse_exam_str(&content, path)?;
            println!("Exam: {} ({} questions)", exam.title, exam.questions.len());
            parser::validate_exam(&exam)
        }
        DataKind::Evaluation => {
            let evaluation = parser::parse_evaluation_str(&content, path)?;
            println!("Evaluation: {}", evaluation.student.name);
            parser::validate_evaluation(&evaluation)
        }
        DataKind::Sheets => {
            let sheets = parser::parse_answer_sheets_str(&content, path)?;
            println!("Answer sheets: {} ({} sheets)", path.display(), sheets.len());
            Vec::new()
        }
    };
    Ok(Some(warnings))
}

fn collect_toml_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_file() {
        files.push(path.to_path_buf());
        return Ok(());
    }

    let mut entries = std::fs::read_dir(path)
        .with_context(|| format!("failed to read directory: {}", path.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            collect_toml_files(&entry, files)?;
        } else if entry.extension().is_some_and(|ext| ext == "toml") {
            files.push(entry);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_data_kinds() {
        assert_eq!(
            detect_kind("[exam]\nid = \"x\"\n"),
            Some(DataKind::Exam)
        );
        assert_eq!(
            detect_kind("[student]\nid = \"1\"\nname = \"Ana\"\n"),
            Some(DataKind::Evaluation)
        );
        assert_eq!(
            detect_kind("[[sheets]]\nstudent_id = \"1\"\n"),
            Some(DataKind::Sheets)
        );
        assert_eq!(detect_kind("locale = \"en\"\n"), None);
        assert_eq!(detect_kind("not toml ["), None);
    }
}
