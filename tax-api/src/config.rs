//! TOML configuration.
//!
//! ```toml
//! [tax]
//! year = 2024
//! brackets_csv = "data/brackets.csv"
//! standard_deductions_csv = "data/std.csv"
//! due_date_rule = "next_business_day"
//!
//! [logging]
//! level = "debug"
//! file = "taxscope.log"
//! ```
//!
//! Every key is optional. Relative paths are resolved against the directory
//! holding the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tax_core::TaxTables;
use tax_core::calculations::DueDateRule;
use tax_data::{LoaderError, TaxTableLoader};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("brackets_csv is set but standard_deductions_csv is not")]
    MissingStandardDeductions,

    #[error("failed to load tax tables: {0}")]
    Tables(#[from] LoaderError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxSettings {
    /// Tax year used when a request does not name one.
    pub year: i32,
    /// Replaces the built-in tables when set.
    pub brackets_csv: Option<PathBuf>,
    pub standard_deductions_csv: Option<PathBuf>,
    pub due_date_rule: DueDateRule,
}

fn default_year() -> i32 {
    2024
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            year: default_year(),
            brackets_csv: None,
            standard_deductions_csv: None,
            due_date_rule: DueDateRule::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Appended to when set.
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub tax: TaxSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path` and resolves relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// [`AppConfig::load`] when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn resolve_paths(
        &mut self,
        base: &Path,
    ) {
        let resolve = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut().filter(|p| p.is_relative()) {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.tax.brackets_csv);
        resolve(&mut self.tax.standard_deductions_csv);
        resolve(&mut self.logging.file);
    }

    /// The configured tables: loaded from CSV when `brackets_csv` is set,
    /// the built-in tables otherwise.
    pub fn tax_tables(&self) -> Result<TaxTables, ConfigError> {
        match (&self.tax.brackets_csv, &self.tax.standard_deductions_csv) {
            (None, _) => Ok(TaxTables::builtin()),
            (Some(_), None) => Err(ConfigError::MissingStandardDeductions),
            (Some(brackets), Some(deductions)) => {
                Ok(TaxTableLoader::load_files(brackets, deductions)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tax_core::BracketTableProvider;

    use super::*;

    const BRACKETS_2025: &str = "tax_year,schedule,min_income,max_income,rate
2025,X,0,11925,0.10
2025,X,11925,,0.12
";

    const DEDUCTIONS_2025: &str = "tax_year,filing_status,amount
2025,single,15000
";

    // =========================================================================
    // parsing
    // =========================================================================

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tax.year, 2024);
        assert_eq!(config.tax.due_date_rule, DueDateRule::Statutory);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_config_merges_with_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [tax]
            due_date_rule = "next_business_day"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.tax.year, 2024);
        assert_eq!(config.tax.due_date_rule, DueDateRule::NextBusinessDay);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = AppConfig::from_toml_str("[tax]\nyeer = 2025\n");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unknown_due_date_rule_is_rejected() {
        let result = AppConfig::from_toml_str("[tax]\ndue_date_rule = \"whenever\"\n");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // =========================================================================
    // loading from disk
    // =========================================================================

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = AppConfig::load(&dir.path().join("missing.toml"));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxscope.toml");
        std::fs::write(
            &path,
            "[tax]\nbrackets_csv = \"data/b.csv\"\n\n[logging]\nfile = \"/var/log/t.log\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.tax.brackets_csv, Some(dir.path().join("data/b.csv")));
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/t.log")));
    }

    // =========================================================================
    // tax tables
    // =========================================================================

    #[test]
    fn tax_tables_default_to_builtin() {
        let tables = AppConfig::default().tax_tables().unwrap();

        assert_eq!(tables, TaxTables::builtin());
    }

    #[test]
    fn tax_tables_require_standard_deductions() {
        let mut config = AppConfig::default();
        config.tax.brackets_csv = Some(PathBuf::from("brackets.csv"));

        assert!(matches!(
            config.tax_tables(),
            Err(ConfigError::MissingStandardDeductions)
        ));
    }

    #[test]
    fn tax_tables_load_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("brackets.csv"), BRACKETS_2025).unwrap();
        std::fs::write(dir.path().join("std.csv"), DEDUCTIONS_2025).unwrap();
        let path = dir.path().join("taxscope.toml");
        std::fs::write(
            &path,
            "[tax]\nyear = 2025\nbrackets_csv = \"brackets.csv\"\nstandard_deductions_csv = \"std.csv\"\n",
        )
        .unwrap();

        let tables = AppConfig::load(&path).unwrap().tax_tables().unwrap();

        assert_eq!(tables.years(), vec![2025]);
        assert_eq!(
            tables.standard_deduction(tax_core::FilingStatus::Single, 2025),
            Ok(rust_decimal::Decimal::from(15000))
        );
    }
}
