//! Dashboard configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::i18n::Locale;
use crate::identity::Viewer;

/// Top-level avalia configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvaliaConfig {
    /// Display language.
    #[serde(default)]
    pub locale: Locale,
    /// Root of the exam, evaluation and answer-sheet files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Exam clock period in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Who is running the commands. Decides which of them are allowed.
    #[serde(default)]
    pub viewer: Viewer,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./avalia-reports")
}
fn default_tick_interval() -> u64 {
    1000
}

impl Default for AvaliaConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            tick_interval_ms: default_tick_interval(),
            viewer: Viewer::default(),
        }
    }
}

impl AvaliaConfig {
    /// Exam clock period. Zero is treated as one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables expand to the empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    // Substituted values are never scanned again.
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `avalia.toml` in the current directory
/// 2. `~/.config/avalia/config.toml`
///
/// Environment variable overrides: `AVALIA_LOCALE`, `AVALIA_OUTPUT_DIR`,
/// `AVALIA_ROLE`.
pub fn load_config() -> Result<AvaliaConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AvaliaConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("avalia.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AvaliaConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AvaliaConfig::default(),
    };

    if let Ok(locale) = std::env::var("AVALIA_LOCALE") {
        config.locale = locale
            .parse()
            .map_err(|e: String| anyhow::anyhow!("AVALIA_LOCALE: {e}"))?;
    }
    if let Ok(dir) = std::env::var("AVALIA_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Ok(role) = std::env::var("AVALIA_ROLE") {
        config.viewer.role = role
            .parse()
            .map_err(|e: String| anyhow::anyhow!("AVALIA_ROLE: {e}"))?;
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.output_dir = resolve_path(&config.output_dir);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("avalia"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_AVALIA_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_AVALIA_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_AVALIA_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_AVALIA_UNSET_VAR}/x"), "/x");
        assert_eq!(resolve_env_vars("no ${ close"), "no ${ close");
        std::env::remove_var("_AVALIA_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values() {
        std::env::set_var("_AVALIA_TEST_NESTED", "${_AVALIA_TEST_NESTED}");
        assert_eq!(
            resolve_env_vars("a/${_AVALIA_TEST_NESTED}/b"),
            "a/${_AVALIA_TEST_NESTED}/b"
        );
        std::env::set_var("_AVALIA_TEST_OPEN", "${");
        assert_eq!(resolve_env_vars("${_AVALIA_TEST_OPEN}}x"), "${}x");
        std::env::remove_var("_AVALIA_TEST_NESTED");
        std::env::remove_var("_AVALIA_TEST_OPEN");
    }

    #[test]
    fn default_config() {
        let config = AvaliaConfig::default();
        assert_eq!(config.locale, Locale::Pt);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn parse_partial_config() {
        let config: AvaliaConfig = toml::from_str(
            r#"
locale = "en"
tick_interval_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.output_dir, PathBuf::from("./avalia-reports"));
        assert_eq!(config.viewer.role, Role::Teacher);
    }

    #[test]
    fn parse_viewer_section() {
        let config: AvaliaConfig = toml::from_str(
            r#"
[viewer]
id = "2025001"
name = "Ana Costa"
role = "student"
"#,
        )
        .unwrap();
        assert_eq!(config.viewer.id, "2025001");
        assert_eq!(config.viewer.role, Role::Student);
    }

    #[test]
    fn load_explicit_file_expands_paths() {
        std::env::set_var("_AVALIA_TEST_ROOT", "/srv/school");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avalia.toml");
        std::fs::write(&path, "data_dir = \"${_AVALIA_TEST_ROOT}/data\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/school/data"));
        std::env::remove_var("_AVALIA_TEST_ROOT");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_from(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
