pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::TomlConfig;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::HttpLocationSource, memory_surface::InMemorySurface};
pub use core::{
    controls::{ControlOptions, HierarchicalControls},
    flat_viewer::FlatLayerViewer,
    layers::CategoryLayers,
    selection::SelectionEngine,
};
pub use utils::error::{MapError, Result};
