//! Configuration management for html2fortitude.
//!
//! Parses `html2fortitude.toml` files with serde and discovers them in the
//! current directory or its parents. Command-line values are applied on
//! top via [`CliSettings`].
//!
//! ```toml
//! [widget]
//! superclass = "Views::Base"
//! method = "content"
//! assigns = "required_needs"
//! block_style = "do_end"
//! hash_style = "modern"
//!
//! [output]
//! class_base = "app"
//!
//! [helpers]
//! self_outputting = ["render_card"]
//! ```
//!
//! `widget.superclass` and `output.class_base` support `${VAR}` and
//! `${VAR:-default}` expansion.

mod expand;

use std::path::{Path, PathBuf};

use h2f_renderer::{
    AssignsMode, BlockStyle, Converter, ConverterBuilder, DEFAULT_METHOD, DEFAULT_SUPERCLASS,
    HashStyle, HelperRegistry, RenderOptions,
};
use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "html2fortitude.toml";

/// Command-line values that override the configuration file.
///
/// Only `Some` values override.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub superclass: Option<String>,
    pub method: Option<String>,
    pub assigns: Option<AssignsMode>,
    pub block_style: Option<BlockStyle>,
    pub hash_style: Option<HashStyle>,
    /// Translate ERB directives.
    pub erb: Option<bool>,
    /// Directory class names are derived relative to.
    pub class_base: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generated class settings.
    pub widget: WidgetConfig,
    /// Output settings (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Self-outputting helper settings.
    pub helpers: HelpersConfig,

    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Generated class settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Superclass of every generated widget.
    pub superclass: String,
    /// Name of the generated method.
    pub method: String,
    pub assigns: AssignsMode,
    pub block_style: BlockStyle,
    pub hash_style: HashStyle,
    /// Translate ERB directives.
    pub erb: bool,
    /// Render `<%== %>` with `rawtext`.
    pub raw_output: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            superclass: DEFAULT_SUPERCLASS.to_owned(),
            method: DEFAULT_METHOD.to_owned(),
            assigns: options.assigns,
            block_style: options.block_style,
            hash_style: options.hash_style,
            erb: options.directives,
            raw_output: options.raw_output,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputConfigRaw {
    class_base: Option<String>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug, Default)]
pub struct OutputConfig {
    /// Directory class names are derived relative to. When unset, it is
    /// inferred from an `app/views` path.
    pub class_base: Option<PathBuf>,
}

/// Self-outputting helper settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HelpersConfig {
    /// Start from the built-in Rails helper list.
    pub defaults: bool,
    /// Additional helpers whose calls output their own result.
    pub self_outputting: Vec<String>,
}

impl Default for HelpersConfig {
    fn default() -> Self {
        Self {
            defaults: true,
            self_outputting: Vec::new(),
        }
    }
}

impl HelpersConfig {
    /// Registry holding the configured helpers.
    #[must_use]
    pub fn registry(&self) -> HelperRegistry {
        let base = if self.defaults {
            HelperRegistry::new()
        } else {
            HelperRegistry::empty()
        };
        base.with_helpers(self.self_outputting.iter().cloned())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`widget.superclass`").
        field: String,
        /// Error message (e.g., "${`BASE_WIDGET`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_identifier(value: &str, field: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid_start = chars.next().is_some_and(|c| c == '_' || c.is_ascii_lowercase());
    let rest = chars.as_str();
    let body = rest.strip_suffix(['?', '!']).unwrap_or(rest);
    if !valid_start || !body.chars().all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "{field} must be a Ruby method name, got {value:?}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is given, loads that file; otherwise searches for
    /// `html2fortitude.toml` in the current directory and its parents, and
    /// falls back to defaults. CLI settings are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` does not exist, or the
    /// file cannot be read, parsed or validated.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Search for a config file in `start` and its parents.
    #[must_use]
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Found configuration file");
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(superclass) = &settings.superclass {
            self.widget.superclass.clone_from(superclass);
        }
        if let Some(method) = &settings.method {
            self.widget.method.clone_from(method);
        }
        if let Some(assigns) = settings.assigns {
            self.widget.assigns = assigns;
        }
        if let Some(block_style) = settings.block_style {
            self.widget.block_style = block_style;
        }
        if let Some(hash_style) = settings.hash_style {
            self.widget.hash_style = hash_style;
        }
        if let Some(erb) = settings.erb {
            self.widget.erb = erb;
        }
        if let Some(class_base) = &settings.class_base {
            self.output_resolved.class_base = Some(class_base.clone());
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an empty superclass, a method
    /// or helper name that is not a Ruby method name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.widget.superclass, "widget.superclass")?;
        require_identifier(&self.widget.method, "widget.method")?;
        for helper in &self.helpers.self_outputting {
            require_identifier(helper, "helpers.self_outputting")?;
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.widget.superclass = expand::expand_env(&self.widget.superclass, "widget.superclass")?;
        if let Some(ref base) = self.output.class_base {
            self.output.class_base = Some(expand::expand_env(base, "output.class_base")?);
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        self.output_resolved = OutputConfig {
            class_base: self.output.class_base.as_deref().map(|base| config_dir.join(base)),
        };
    }

    /// Rendering options from the `[widget]` section.
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            directives: self.widget.erb,
            block_style: self.widget.block_style,
            hash_style: self.widget.hash_style,
            assigns: self.widget.assigns,
            raw_output: self.widget.raw_output,
        }
    }

    /// Converter builder with everything but the class name set.
    #[must_use]
    pub fn converter_builder(&self) -> ConverterBuilder {
        Converter::builder()
            .superclass(self.widget.superclass.clone())
            .method_name(self.widget.method.clone())
            .options(self.render_options())
            .helpers(self.helpers.registry())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.widget.superclass, "Fortitude::Widget::Html5");
        assert_eq!(config.widget.method, "content");
        assert_eq!(config.widget.assigns, AssignsMode::NeedsDefaultedToNil);
        assert!(config.widget.erb);
        assert!(config.helpers.defaults);
        assert!(config.output_resolved.class_base.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.widget.superclass, "Fortitude::Widget::Html5");
        assert_eq!(config.widget.block_style, BlockStyle::Brace);
    }

    #[test]
    fn test_parse_widget_config() {
        let toml = r#"
[widget]
superclass = "Views::Base"
method = "body"
assigns = "instance_variables"
block_style = "do_end"
hash_style = "modern"
erb = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.widget.superclass, "Views::Base");
        assert_eq!(config.widget.method, "body");
        assert_eq!(config.widget.assigns, AssignsMode::InstanceVariables);
        assert_eq!(config.widget.block_style, BlockStyle::DoEnd);
        assert_eq!(config.widget.hash_style, HashStyle::Modern);
        assert!(!config.render_options().directives);
    }

    #[test]
    fn test_unknown_assigns_mode_rejected() {
        let result: Result<Config, _> = toml::from_str("[widget]\nassigns = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_helpers_registry() {
        let toml = r#"
[helpers]
defaults = false
self_outputting = ["render_card"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let registry = config.helpers.registry();
        assert!(registry.is_self_outputting("render_card"));
        assert!(!registry.is_self_outputting("image_tag"));
    }

    #[test]
    fn test_resolve_class_base() {
        let mut config: Config = toml::from_str("[output]\nclass_base = \"app\"\n").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(
            config.output_resolved.class_base,
            Some(PathBuf::from("/project/app"))
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let settings = CliSettings {
            superclass: Some("My::Base".to_owned()),
            hash_style: Some(HashStyle::Modern),
            erb: Some(false),
            class_base: Some(PathBuf::from("/src/app")),
            ..Default::default()
        };

        config.apply_cli_settings(&settings);

        assert_eq!(config.widget.superclass, "My::Base");
        assert_eq!(config.widget.method, "content"); // Unchanged
        assert_eq!(config.widget.hash_style, HashStyle::Modern);
        assert!(!config.widget.erb);
        assert_eq!(
            config.output_resolved.class_base,
            Some(PathBuf::from("/src/app"))
        );
    }

    #[test]
    fn test_validate_empty_superclass() {
        let mut config = Config::default();
        config.widget.superclass = "  ".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("widget.superclass"));
    }

    #[test]
    fn test_validate_method_name() {
        let mut config = Config::default();
        config.widget.method = "render-me".to_owned();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.widget.method = "content?".to_owned();
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("app/views/users");
        fs::create_dir_all(&nested).unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "[widget]\nsuperclass = \"Views::Base\"\n\n[output]\nclass_base = \"app\"\n",
        )
        .unwrap();

        assert_eq!(Config::discover_from(&nested), Some(path.clone()));

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.widget.superclass, "Views::Base");
        assert_eq!(config.output_resolved.class_base, Some(dir.path().join("app")));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/html2fortitude.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_converter_builder_uses_settings() {
        let mut config = Config::default();
        config.widget.superclass = "Views::Base".to_owned();
        let converter = config.converter_builder().class_name("Views::Home").build().unwrap();
        let output = converter.convert("hi").unwrap().output;
        assert!(output.starts_with("class Views::Home < Views::Base\n"));
    }
}
