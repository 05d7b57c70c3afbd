//! Engine configuration
//!
//! Grid tuning constants and rendering options, loadable from TOML:
//!
//! ```toml
//! [grid]
//! min_column_units = 2
//! max_columns = 4
//!
//! [render]
//! mobile_width = 375
//! asset_base_url = "https://cdn.example.com/assets"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Column grid tuning used by the mutation engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Smallest width a resize may leave a column with
    pub min_column_units: u8,
    /// A column must be at least this wide to donate width to a new column
    pub donor_min_units: u8,
    /// Width taken from the donor when adding a column
    pub new_column_units: u8,
    /// Columns allowed per row
    pub max_columns: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_column_units: 2,
            donor_min_units: 3,
            new_column_units: 2,
            max_columns: 4,
        }
    }
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_column_units(mut self, units: u8) -> Self {
        self.min_column_units = units;
        self
    }

    pub fn with_max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns;
        self
    }

    pub fn with_donor_min_units(mut self, units: u8) -> Self {
        self.donor_min_units = units;
        self
    }
}

/// Options for HTML export
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Width used instead of the document width in mobile view
    pub mobile_width: u32,
    /// Whether to format output with indentation
    pub pretty_print: bool,
    /// Indentation unit when pretty-printing
    pub indent: String,
    /// Base URL joined with company asset keys
    pub asset_base_url: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mobile_width: 375,
            pretty_print: true,
            indent: "  ".to_string(),
            asset_base_url: None,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    pub fn with_mobile_width(mut self, width: u32) -> Self {
        self.mobile_width = width;
        self
    }

    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.asset_base_url = Some(url.into());
        self
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.grid.min_column_units, 2);
        assert_eq!(config.grid.donor_min_units, 3);
        assert_eq!(config.grid.new_column_units, 2);
        assert_eq!(config.grid.max_columns, 4);
        assert_eq!(config.render.mobile_width, 375);
        assert!(config.render.pretty_print);
        assert_eq!(config.render.asset_base_url, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_str(
            r#"
[grid]
max_columns = 6

[render]
asset_base_url = "https://cdn.example.com"
"#,
        )
        .expect("Should parse");
        assert_eq!(config.grid.max_columns, 6);
        assert_eq!(config.grid.min_column_units, 2);
        assert_eq!(
            config.render.asset_base_url.as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(config.render.mobile_width, 375);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_str("").expect("Should parse");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = EngineConfig::from_str("this is not valid toml {{{{");
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_grid(GridConfig::new().with_min_column_units(3).with_max_columns(3))
            .with_render(RenderConfig::new().with_pretty_print(false));
        assert_eq!(config.grid.min_column_units, 3);
        assert_eq!(config.grid.max_columns, 3);
        assert!(!config.render.pretty_print);
    }
}
