use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
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

    #[error("Invalid expansion file pattern '{pattern}': {source}")]
    PatternError {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Inline comment placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    pub position: usize,
    pub threshold: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            position: 60,
            threshold: 50,
        }
    }
}

/// Indentation used for expansion text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentConfig {
    pub width: usize,
    pub use_tabs: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            width: 4,
            use_tabs: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub comment: CommentConfig,
    pub indent: IndentConfig,
    /// Glob patterns of TOML files holding more `name = "template"` pairs
    pub expansion_files: Vec<String>,
    pub expansions: BTreeMap<String, String>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }
        let config = read_toml(config_path)?;
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
        let config_dir = shellexpand::tilde("~/.config/katefmt");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expansion templates from the expansion files (in pattern and file
    /// name order) and then the inline table; later definitions win.
    pub fn all_expansions(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut expansions = BTreeMap::new();
        for pattern in &self.expansion_files {
            for path in Self::expansion_paths(pattern)? {
                let from_file: BTreeMap<String, String> = read_toml(&path)?;
                expansions.extend(from_file);
            }
        }
        expansions.extend(
            self.expansions
                .iter()
                .map(|(name, text)| (name.clone(), text.clone())),
        );
        Ok(expansions)
    }

    fn expansion_paths(pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
        let expanded = Self::expand_path(Path::new(pattern))
            .unwrap_or_else(|| PathBuf::from(pattern));
        let expanded = expanded.to_string_lossy();
        let paths = glob::glob(&expanded).map_err(|source| ConfigError::PatternError {
            pattern: pattern.to_string(),
            source,
        })?;
        // Unreadable entries surface later as read errors
        let mut paths: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
        paths.sort();
        Ok(paths)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigReadError {
        config_path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
        config_path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/katefmt/config.toml"));
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config: Config = toml::from_str("[comment]\nposition = 72\n").unwrap();

        assert_eq!(config.comment.position, 72);
        assert_eq!(config.comment.threshold, 50);
        assert_eq!(config.indent, IndentConfig::default());
        assert!(config.expansions.is_empty());
    }

    #[test]
    fn test_expansion_templates_keep_escapes() {
        let config_content = r#"
[expansions]
fori = "for (int {0} = 0; {0} < {1}; ++{0})\n{\n\t%{cursor}\n}"
"#;
        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(
            config.expansions["fori"],
            "for (int {0} = 0; {0} < {1}; ++{0})\n{\n\t%{cursor}\n}"
        );
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[comment\nposition = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains(&*config_file.to_string_lossy()));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::default();
        test_config.indent.use_tabs = true;
        test_config
            .expansions
            .insert("todo".into(), "// TODO({0}): %{cursor}".into());

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_expansion_files_are_merged() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("a.toml"),
            "fori = \"for-a\"\nwhilei = \"while\"\n",
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("b.toml"), "fori = \"for-b\"\n").unwrap();

        let mut config = Config {
            expansion_files: vec![format!("{}/*.toml", temp_dir.path().display())],
            ..Config::default()
        };
        config.expansions.insert("whilei".into(), "inline".into());

        let all = config.all_expansions().unwrap();

        assert_eq!(all["fori"], "for-b");
        assert_eq!(all["whilei"], "inline");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_expansion_file_pattern_with_env_var() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("cpp.toml"), "ctor = \"{0}()\"\n").unwrap();
        unsafe {
            env::set_var("KATEFMT_TEST_EXPANSIONS", temp_dir.path());
        }

        let config = Config {
            expansion_files: vec!["$KATEFMT_TEST_EXPANSIONS/*.toml".into()],
            ..Config::default()
        };
        let all = config.all_expansions().unwrap();

        assert_eq!(all["ctor"], "{0}()");

        unsafe {
            env::remove_var("KATEFMT_TEST_EXPANSIONS");
        }
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let config = Config {
            expansion_files: vec!["/tmp/[".into()],
            ..Config::default()
        };

        let err = config.all_expansions().unwrap_err();

        assert!(matches!(err, ConfigError::PatternError { .. }));
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }
}
