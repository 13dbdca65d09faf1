//! The `avalia init` command.

use std::path::Path;

use anyhow::{Context, Result};

const SAMPLE_CONFIG: &str = r#"# avalia configuration

# Display language: "pt" or "en"
locale = "pt"

# Where exams, evaluations and answer sheets live
data_dir = "./data"

# Where HTML reports are written (supports ${VAR} references)
output_dir = "./avalia-reports"

# Exam clock period in milliseconds (1000 = real time)
tick_interval_ms = 1000

# Who runs the commands. Teachers and administrators evaluate, grade and
# browse the question bank; students take exams.
[viewer]
id = ""
name = ""
role = "teacher"
"#;

const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "data/exams/mathematics-q1.toml",
        include_str!("../../../../data/exams/mathematics-q1.toml"),
    ),
    (
        "data/exams/science.toml",
        include_str!("../../../../data/exams/science.toml"),
    ),
    (
        "data/evaluations/ana-costa.toml",
        include_str!("../../../../data/evaluations/ana-costa.toml"),
    ),
    (
        "data/sheets/mathematics-q1.toml",
        include_str!("../../../../data/sheets/mathematics-q1.toml"),
    ),
];

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("avalia.toml"), SAMPLE_CONFIG)?;

    for (path, content) in SAMPLE_FILES {
        write_if_missing(Path::new(path), content)?;
    }

    println!("\nNext steps:");
    println!("  1. Edit avalia.toml to pick your language");
    println!("  2. Run: avalia validate --data data");
    println!("  3. Run: avalia evaluate --evaluation data/evaluations/ana-costa.toml");
    println!(
        "  4. Run: avalia grade --exam data/exams/mathematics-q1.toml --sheets data/sheets/mathematics-q1.toml"
    );
    println!("  5. Run: avalia take --exam data/exams/mathematics-q1.toml --student 2025001");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}
