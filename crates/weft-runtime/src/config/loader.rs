//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML files (`weft.toml`, `config.toml`)
//! - `yaml-config`: enables YAML files (`weft.yaml`, `weft.yml`, …)
//!
//! Both may be enabled; each format is searched independently.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic configuration passed to [`ConfigLoader::merge`]
//! 3. Profile-specific config file (`weft.{profile}.toml` / `weft.{profile}.yaml`)
//! 4. Main config file (`weft.toml` / `weft.yaml`)
//! 5. Environment variables (`WEFT_*`)
//!
//! # Environment Variable Mapping
//!
//! `WEFT_` prefix, `__` as the nesting separator:
//!
//! - `WEFT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `WEFT_PLUGINS__SLASH__PLACEHOLDER=...` → `plugins.slash.placeholder = "..."`
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/weft.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::WeftConfig;
use super::validation::validate_config;

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// Name used in profile file names (`weft.{name}.toml`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `WEFT_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("WEFT_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader for the profile in `WEFT_PROFILE`, with environment
    /// variables enabled and the default search paths.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Selects the profile whose `weft.{profile}.*` file is layered under the
    /// main file.  `prod`/`dev` are accepted as aliases.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load, skipping the search.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables `WEFT_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Ignores `WEFT_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges programmatic configuration on top of the built-in defaults.
    ///
    /// Files and environment variables still override it.
    pub fn merge(mut self, config: WeftConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<WeftConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: WeftConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            plugin_sections = config.plugins.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(WeftConfig::default()));

        let programmatic = std::mem::take(&mut self.figment);
        figment = figment.merge(programmatic);

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with WEFT_ prefix");
            figment = figment.merge(Env::prefixed("WEFT_").split("__"));
        }

        Ok(figment)
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("weft"));
        }
        paths
    }

    /// Tries a profile-specific variant, then the base file, for each
    /// `search_paths × base_names` pair.  Stops at the first base file found.
    ///
    /// The returned flag is set if any file, profile-specific or not, was
    /// merged.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        let mut found = false;
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                    found = true;
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, found)
    }

    fn load_config_files(&self, #[allow(unused_mut)] mut figment: Figment) -> Figment {
        #[allow(unused_variables)]
        let search_paths = self.resolve_search_paths();
        #[allow(unused_mut)]
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["weft.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["weft.yaml", "weft.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::LogLevel;

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new()
            .search_path(std::env::temp_dir().join("weft-config-test-missing"))
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let mut overrides = WeftConfig::default();
        overrides.logging.level = LogLevel::Debug;
        overrides
            .plugins
            .insert("slash".into(), serde_json::json!({ "limit": 3 }));

        let config = ConfigLoader::new()
            .search_path(std::env::temp_dir().join("weft-config-test-missing"))
            .without_env()
            .merge(overrides)
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.plugins["slash"]["limit"], 3);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .file("/definitely/not/here/weft.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_sources_layer_in_priority_order() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "weft.staging.toml",
                r#"
                [logging]
                level = "warn"
                format = "pretty"
                max_files = 3
                "#,
            )?;
            jail.create_file(
                "weft.toml",
                r#"
                [logging]
                file_location = true
                max_files = 7

                [plugins.slash]
                items = ["heading"]
                "#,
            )?;

            let mut programmatic = WeftConfig::default();
            programmatic.logging.level = LogLevel::Debug;
            programmatic.logging.thread_ids = true;

            let config = ConfigLoader::new()
                .profile("staging")
                .search_path(jail.directory())
                .without_env()
                .merge(programmatic)
                .load()
                .map_err(|e| e.to_string())?;

            // profile file over programmatic, main file over profile file
            assert_eq!(config.logging.level, LogLevel::Warn);
            assert_eq!(config.logging.format, crate::config::LogFormat::Pretty);
            assert_eq!(config.logging.max_files, 7);
            assert!(config.logging.thread_ids);
            assert!(config.logging.file_location);
            assert_eq!(config.plugins["slash"]["items"][0], "heading");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_env_overrides_files_with_nesting() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "weft.toml",
                r#"
                [logging]
                level = "warn"

                [plugins.slash]
                items = ["heading"]
                "#,
            )?;
            jail.set_env("WEFT_LOGGING__LEVEL", "trace");
            jail.set_env("WEFT_PLUGINS__SLASH__ITEMS", "[x, y]");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.level, LogLevel::Trace);
            assert_eq!(
                config.plugins["slash"],
                serde_json::json!({ "items": ["x", "y"] })
            );
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_explicit_file_skips_search() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("weft.toml", "[logging]\nlevel = \"error\"")?;
            jail.create_file("custom.toml", "[logging]\nlevel = \"debug\"")?;

            let config = ConfigLoader::new()
                .file(jail.directory().join("custom.toml"))
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_lone_profile_file_counts_as_found() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("weft.production.toml", "[logging]\nlevel = \"error\"")?;

            let loader = ConfigLoader::new().profile("prod");
            let (figment, found) = loader.load_format_files(
                Figment::new(),
                &[jail.directory().to_path_buf()],
                &["weft.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            assert!(found);
            assert_eq!(figment.extract_inner::<LogLevel>("logging.level")?, LogLevel::Error);

            let (_, found) = ConfigLoader::new().profile("staging").load_format_files(
                Figment::new(),
                &[jail.directory().to_path_buf()],
                &["weft.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            assert!(!found);
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert!(matches!(Profile::parse("PROD"), Profile::Production));
        assert!(matches!(Profile::parse("dev"), Profile::Development));
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
