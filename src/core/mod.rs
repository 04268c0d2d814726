pub mod controls;
pub mod flat_viewer;
pub mod layers;
pub mod popup;
pub mod renderer;
pub mod request;
pub mod selection;

pub use crate::domain::ports::{ConfigProvider, LocationSource, MapSurface, Storage};
pub use crate::utils::error::Result;
pub use layers::CategoryLayers;
