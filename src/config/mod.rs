pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::controls::ControlOptions;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 20;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "hierarchical-map")]
#[command(about = "Browse a domain → category → location map backend from the terminal")]
pub struct CliConfig {
    #[arg(long, help = "Load backend and view settings from a TOML file")]
    pub config: Option<String>,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, help = "Domain to select (defaults to the first one)")]
    pub domain: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Keep only these categories selected")]
    pub categories: Vec<String>,

    #[arg(long, help = "Center the view on a location id")]
    pub zoom_to: Option<String>,

    #[arg(long, help = "Fit the view to every visible location")]
    pub fit: bool,

    #[arg(long, help = "Search locations by name instead of browsing")]
    pub search: Option<String>,

    #[arg(long, help = "Write the visible selection as JSON into this directory")]
    pub export: Option<String>,

    #[arg(long, help = "Print every visible location")]
    pub list: bool,

    #[arg(long, help = "Use the flat category viewer")]
    pub legacy: bool,

    #[arg(long, help = "Only draw featured locations (with --legacy)")]
    pub featured_only: bool,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, default_value = "15")]
    pub zoom_level: u8,

    #[arg(long, default_value = "10")]
    pub fit_padding: u32,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Export directory: `--export` wins over whatever `config` says.
    pub fn export_dir<'a, C: ConfigProvider>(&'a self, config: &'a C) -> &'a str {
        self.export
            .as_deref()
            .unwrap_or_else(|| config.output_path())
    }

    /// Panel options from `config`. An explicit `--domain` turns off
    /// selecting the first domain, so it is fetched only once.
    pub fn control_options<C: ConfigProvider>(&self, config: &C) -> ControlOptions {
        let mut options = ControlOptions::from_config(config);
        if self.domain.is_some() {
            options.auto_select_first = false;
        }
        options
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn output_path(&self) -> &str {
        self.export.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    fn fit_padding(&self) -> u32 {
        self.fit_padding
    }

    fn auto_load(&self) -> bool {
        true
    }

    fn auto_select_first(&self) -> bool {
        self.domain.is_none()
    }

    fn show_stats(&self) -> bool {
        true
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_range("zoom_level", self.zoom_level, MIN_ZOOM, MAX_ZOOM)?;
        if let Some(seconds) = self.timeout_seconds {
            validation::validate_positive_number("timeout_seconds", seconds, 1)?;
        }
        if let Some(dir) = &self.export {
            validation::validate_path("export", dir)?;
        }
        if let Some(domain) = &self.domain {
            validation::validate_non_empty_string("domain", domain)?;
        }
        Ok(())
    }
}
