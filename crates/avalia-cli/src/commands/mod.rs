pub mod evaluate;
pub mod grade;
pub mod init;
pub mod questions;
pub mod take;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use avalia_core::config::{load_config_from, AvaliaConfig};
use avalia_core::i18n::Locale;
use avalia_core::identity::{Role, Viewer};

/// Options accepted by every subcommand.
pub(crate) struct Global {
    pub config: Option<PathBuf>,
    pub role: Option<String>,
}

/// Load the config and apply the `--role` and `--lang` overrides.
pub(crate) fn load_settings(global: &Global, lang: Option<&str>) -> Result<AvaliaConfig> {
    let mut config = load_config_from(global.config.as_deref())?;
    if let Some(role) = &global.role {
        config.viewer.role = role.parse::<Role>().map_err(|e| anyhow::anyhow!("{e}"))?;
    }
    if let Some(lang) = lang {
        config.locale = lang
            .parse::<Locale>()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }
    Ok(config)
}

/// Fail unless the viewer's role passes `allowed`.
pub(crate) fn require_role(
    viewer: &Viewer,
    allowed: fn(Role) -> bool,
    action: &str,
) -> Result<()> {
    if !allowed(viewer.role) {
        anyhow::bail!("role {} cannot {action}", viewer.role);
    }
    tracing::debug!(role = %viewer.role, action, "access granted");
    Ok(())
}

/// Split a `key=value` command-line assignment.
pub(crate) fn split_assignment<'a>(arg: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    arg.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .with_context(|| format!("--{flag} expects key=value, got '{arg}'"))
}

/// Where a rendered report goes: stdout, or `<dir>/<stem>.<ext>` when an
/// output directory is given.
pub(crate) fn emit(output: Option<&PathBuf>, stem: &str, ext: &str, content: &str) -> Result<()> {
    match output {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(format!("{stem}.{ext}"));
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report written to: {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_parsing() {
        assert_eq!(
            split_assignment("participation = excellent", "rate").unwrap(),
            ("participation", "excellent")
        );
        assert_eq!(
            split_assignment("sociability=a=b", "comment").unwrap(),
            ("sociability", "a=b")
        );
        assert!(split_assignment("participation", "rate").is_err());
    }

    #[test]
    fn role_requirement() {
        let mut viewer = Viewer {
            role: Role::Parent,
            ..Default::default()
        };
        let err = require_role(&viewer, Role::can_evaluate_students, "evaluate students")
            .unwrap_err();
        assert_eq!(err.to_string(), "role parent cannot evaluate students");

        viewer.role = Role::Administrator;
        assert!(require_role(&viewer, Role::can_evaluate_students, "evaluate students").is_ok());
        assert!(require_role(&viewer, Role::can_take_exams, "take exams").is_err());
    }
}
