use md_jinja_engine::config::JinjaConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User configuration, stored as TOML.
///
/// ```toml
/// default_document = "~/notes/letter.md"
///
/// [jinja]
/// enable = true
/// doc_link = "https://jinja.palletsprojects.com/"
///
/// [jinja.template_panel]
/// trigger = "{{"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_document: Option<PathBuf>,
    #[serde(default)]
    pub jinja: JinjaConfig,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.default_document = config
            .default_document
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/md-jinja");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_jinja_engine::config::{TemplatePanelConfig, TemplatePanelSetting};
    use md_jinja_engine::templates::TemplateEntry;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/md-jinja/config.toml"));
    }

    #[test]
    fn test_empty_file_is_default_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.default_document, None);
        assert_eq!(config.jinja, JinjaConfig::default());
        assert!(!config.jinja.enable);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("MD_JINJA_TEST_VAR", "/test/env/path");
        }

        let expanded = Config::expand_path(&PathBuf::from("$MD_JINJA_TEST_VAR/subdir")).unwrap();
        assert_eq!(expanded, PathBuf::from("/test/env/path/subdir"));

        unsafe {
            env::remove_var("MD_JINJA_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        assert_eq!(Config::expand_path(&path).unwrap(), path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[jinja\nenable = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let test_config = Config {
            default_document: Some(PathBuf::from("/tmp/letter.md")),
            jinja: JinjaConfig {
                enable: true,
                doc_link: Some("https://example.com/guide".into()),
                template_panel: TemplatePanelSetting::Custom(TemplatePanelConfig {
                    trigger: Some("{{".into()),
                    items: Some(vec![TemplateEntry::new("Name", Some("the name"), "{{ name }}")]),
                    ..Default::default()
                }),
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config.default_document, test_config.default_document);
        assert_eq!(loaded_config.jinja, test_config.jinja);
    }

    #[test]
    fn test_template_panel_can_be_switched_off() {
        let config: Config = toml::from_str(
            r#"
[jinja]
enable = true
template_panel = false
"#,
        )
        .unwrap();

        assert!(config.jinja.enable);
        assert!(!config.jinja.panel_enabled());
    }

    #[test]
    fn test_camel_case_keys_are_accepted() {
        let config: Config = toml::from_str(
            r#"
[jinja]
enable = true
docLink = "https://example.com/docs"

[jinja.templatePanel]
notFoundContent = "Nothing to insert"

[[jinja.templatePanel.items]]
title = "Greeting"
template = "Hello {{ name }}"
"#,
        )
        .unwrap();

        assert_eq!(config.jinja.doc_link.as_deref(), Some("https://example.com/docs"));
        let panel = config.jinja.panel().unwrap();
        assert_eq!(panel.not_found_content.as_deref(), Some("Nothing to insert"));
        assert_eq!(
            panel.items.as_deref(),
            Some(&[TemplateEntry::new("Greeting", None, "Hello {{ name }}")][..])
        );
    }

    #[test]
    fn test_default_document_with_env_var_in_toml() {
        unsafe {
            env::set_var("MD_JINJA_NOTES", "/custom/notes");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "default_document = \"$MD_JINJA_NOTES/letter.md\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(
            config.default_document,
            Some(PathBuf::from("/custom/notes/letter.md"))
        );

        unsafe {
            env::remove_var("MD_JINJA_NOTES");
        }
    }
}
