//! Configuration loader
//!
//! Loads and validates the YAML configuration file.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::types::CheckerConfig;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "DOCCHECK_CONFIG";

/// File picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "doccheck.yaml";

pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load from an explicit file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Loader that always yields the built-in defaults
    pub fn defaults() -> Self {
        Self { path: None }
    }

    /// Create loader from DOCCHECK_CONFIG or the working directory
    ///
    /// Path resolution order:
    /// 1. DOCCHECK_CONFIG environment variable (explicit override)
    /// 2. `doccheck.yaml` in the working directory
    /// 3. Built-in defaults
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::new(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::new(DEFAULT_CONFIG_FILE);
        }

        Self::defaults()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<CheckerConfig> {
        let Some(path) = &self.path else {
            info!("No configuration file, using defaults");
            return Ok(CheckerConfig::default());
        };

        info!("Loading checker configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: CheckerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Self::validate(&config).with_context(|| format!("Invalid {}", path.display()))?;

        info!(
            "Loaded configuration: {} disabled rules, {} severity overrides, {} required sections",
            config.disabled_rules.len(),
            config.severity_overrides.len(),
            config.required_sections.len()
        );

        Ok(config)
    }

    fn validate(config: &CheckerConfig) -> Result<()> {
        if config.product_name.trim().is_empty() {
            return Err(anyhow!("product_name must not be empty"));
        }
        if config
            .disabled_rules
            .iter()
            .any(|rule| config.severity_overrides.contains_key(rule))
        {
            return Err(anyhow!(
                "a rule cannot be both disabled and given a severity override"
            ));
        }
        if config.max_line_length == Some(0) {
            return Err(anyhow!("max_line_length must be at least 1"));
        }
        if let Some(blank) = config
            .required_sections
            .iter()
            .chain(&config.described_sections)
            .find(|name| name.trim().is_empty())
        {
            return Err(anyhow!("section names must not be empty, found {:?}", blank));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Rule;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ConfigLoader::defaults().load().unwrap();
        assert_eq!(config, CheckerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "disabled_rules:\n  - Title.MissingH1").unwrap();

        let config = ConfigLoader::new(file.path()).load().unwrap();
        assert_eq!(config.disabled_rules, vec![Rule::TitleMissingH1]);
        assert_eq!(config.product_name, "HuaweiCloud");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = ConfigLoader::new("/definitely/not/here.yaml")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_empty_product_name_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "product_name: \"  \"").unwrap();
        let err = ConfigLoader::new(file.path()).load().unwrap_err();
        assert!(format!("{:#}", err).contains("product_name must not be empty"));
    }

    #[test]
    fn test_conflicting_rule_settings_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "disabled_rules: [Title.MissingH1]\nseverity_overrides:\n  Title.MissingH1: WARNING"
        )
        .unwrap();
        assert!(ConfigLoader::new(file.path()).load().is_err());
    }

    #[test]
    fn test_zero_line_length_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_line_length: 0").unwrap();
        let err = ConfigLoader::new(file.path()).load().unwrap_err();
        assert!(format!("{:#}", err).contains("max_line_length"));
    }

    #[test]
    fn test_blank_section_name_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "required_sections: [Example Usage, \"  \"]").unwrap();
        assert!(ConfigLoader::new(file.path()).load().is_err());
    }
}
