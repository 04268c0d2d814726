use crate::config::{DEFAULT_OUTPUT_PATH, MAX_ZOOM, MIN_ZOOM};
use crate::core::controls::ControlOptions;
use crate::domain::ports::{
    ConfigProvider, DEFAULT_CATEGORIES_ENDPOINT, DEFAULT_DOMAINS_ENDPOINT,
    DEFAULT_LOCATIONS_ENDPOINT, DEFAULT_MAP_CONFIG_ENDPOINT, DEFAULT_MAP_DATA_ENDPOINT,
    DEFAULT_SEARCH_ENDPOINT,
};
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    pub view: Option<ViewConfig>,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub domains_endpoint: Option<String>,
    pub categories_endpoint: Option<String>,
    pub locations_endpoint: Option<String>,
    pub search_endpoint: Option<String>,
    pub map_config_endpoint: Option<String>,
    pub map_data_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    pub zoom_level: Option<u8>,
    pub fit_padding: Option<u32>,
    pub auto_load: Option<bool>,
    pub auto_select_first: Option<bool>,
    pub show_stats: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: String,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| MapError::Config {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("backend.base_url", &self.backend.base_url)?;

        if let Some(seconds) = self.backend.timeout_seconds {
            validation::validate_positive_number("backend.timeout_seconds", seconds, 1)?;
        }

        let endpoints = [
            ("backend.domains_endpoint", &self.backend.domains_endpoint),
            ("backend.categories_endpoint", &self.backend.categories_endpoint),
            ("backend.locations_endpoint", &self.backend.locations_endpoint),
            ("backend.search_endpoint", &self.backend.search_endpoint),
            ("backend.map_config_endpoint", &self.backend.map_config_endpoint),
            ("backend.map_data_endpoint", &self.backend.map_data_endpoint),
        ];
        for (field, path) in endpoints {
            if let Some(path) = path {
                validation::validate_endpoint_path(field, path)?;
            }
        }

        if let Some(zoom) = self.view.as_ref().and_then(|v| v.zoom_level) {
            validation::validate_range("view.zoom_level", zoom, MIN_ZOOM, MAX_ZOOM)?;
        }

        if let Some(export) = &self.export {
            validation::validate_path("export.output_path", &export.output_path)?;
        }

        Ok(())
    }

    fn view(&self) -> ViewConfig {
        self.view.clone().unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        &self.backend.base_url
    }

    fn output_path(&self) -> &str {
        self.export
            .as_ref()
            .map(|e| e.output_path.as_str())
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.backend.timeout_seconds
    }

    fn zoom_level(&self) -> u8 {
        self.view()
            .zoom_level
            .unwrap_or(ControlOptions::default().zoom_level)
    }

    fn fit_padding(&self) -> u32 {
        self.view()
            .fit_padding
            .unwrap_or(ControlOptions::default().fit_padding)
    }

    fn auto_load(&self) -> bool {
        self.view().auto_load.unwrap_or(true)
    }

    fn auto_select_first(&self) -> bool {
        self.view().auto_select_first.unwrap_or(true)
    }

    fn show_stats(&self) -> bool {
        self.view().show_stats.unwrap_or(true)
    }

    fn domains_endpoint(&self) -> &str {
        self.backend
            .domains_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_DOMAINS_ENDPOINT)
    }

    fn categories_endpoint(&self) -> &str {
        self.backend
            .categories_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_CATEGORIES_ENDPOINT)
    }

    fn locations_endpoint(&self) -> &str {
        self.backend
            .locations_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_LOCATIONS_ENDPOINT)
    }

    fn search_endpoint(&self) -> &str {
        self.backend
            .search_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_SEARCH_ENDPOINT)
    }

    fn map_config_endpoint(&self) -> &str {
        self.backend
            .map_config_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_MAP_CONFIG_ENDPOINT)
    }

    fn map_data_endpoint(&self) -> &str {
        self.backend
            .map_data_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_MAP_DATA_ENDPOINT)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[backend]
base_url = "https://maps.example.com"
timeout_seconds = 20
locations_endpoint = "/v2/locations/"

[view]
zoom_level = 12
fit_padding = 24
auto_select_first = false

[export]
output_path = "./exports"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.base_url(), "https://maps.example.com");
        assert_eq!(config.timeout_seconds(), Some(20));
        assert_eq!(config.locations_endpoint(), "/v2/locations/");
        assert_eq!(config.domains_endpoint(), DEFAULT_DOMAINS_ENDPOINT);
        assert_eq!(config.zoom_level(), 12);
        assert_eq!(config.fit_padding(), 24);
        assert!(!config.auto_select_first());
        assert!(config.auto_load());
        assert_eq!(config.output_path(), "./exports");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "http://localhost:8000"
"#,
        )
        .unwrap();

        assert_eq!(config.zoom_level(), 15);
        assert_eq!(config.fit_padding(), 10);
        assert_eq!(config.output_path(), DEFAULT_OUTPUT_PATH);
        assert_eq!(config.timeout_seconds(), None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HMAP_TEST_BASE_URL", "https://env.example.com");

        let config = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "${HMAP_TEST_BASE_URL}"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url(), "https://env.example.com");

        std::env::remove_var("HMAP_TEST_BASE_URL");
    }

    #[test]
    fn test_config_validation() {
        let bad_url = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_url.validate().is_err());

        let bad_endpoint = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "http://localhost:8000"
search_endpoint = "search?q=1"
"#,
        )
        .unwrap();
        assert!(bad_endpoint.validate().is_err());

        let bad_zoom = TomlConfig::from_toml_str(
            r#"
[backend]
base_url = "http://localhost:8000"

[view]
zoom_level = 40
"#,
        )
        .unwrap();
        assert!(matches!(
            bad_zoom.validate(),
            Err(MapError::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_missing_backend_is_parse_error() {
        let err = TomlConfig::from_toml_str("[view]\nzoom_level = 3\n").unwrap_err();
        assert!(matches!(err, MapError::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[backend]\nbase_url = \"http://127.0.0.1:9000\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }
}
