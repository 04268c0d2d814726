use crate::domain::model::{
    Bounds, Category, CategoryId, Coordinates, Domain, FlatMapData, Location, MapConfig,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub const DEFAULT_DOMAINS_ENDPOINT: &str = "/api/hierarchical/domains/";
pub const DEFAULT_CATEGORIES_ENDPOINT: &str = "/api/hierarchical/categories/";
pub const DEFAULT_LOCATIONS_ENDPOINT: &str = "/api/hierarchical/locations/";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "/api/hierarchical/search/";
pub const DEFAULT_MAP_CONFIG_ENDPOINT: &str = "/api/map-config/";
pub const DEFAULT_MAP_DATA_ENDPOINT: &str = "/api/map-data/";

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
    fn zoom_level(&self) -> u8;
    fn fit_padding(&self) -> u32;
    fn auto_load(&self) -> bool;
    fn auto_select_first(&self) -> bool;
    fn show_stats(&self) -> bool;

    fn domains_endpoint(&self) -> &str {
        DEFAULT_DOMAINS_ENDPOINT
    }

    fn categories_endpoint(&self) -> &str {
        DEFAULT_CATEGORIES_ENDPOINT
    }

    fn locations_endpoint(&self) -> &str {
        DEFAULT_LOCATIONS_ENDPOINT
    }

    fn search_endpoint(&self) -> &str {
        DEFAULT_SEARCH_ENDPOINT
    }

    fn map_config_endpoint(&self) -> &str {
        DEFAULT_MAP_CONFIG_ENDPOINT
    }

    fn map_data_endpoint(&self) -> &str {
        DEFAULT_MAP_DATA_ENDPOINT
    }
}

/// Read-only backend serving the three tiers.
///
/// `Ok(None)` means the response carried no payload key at all, which
/// callers treat as "no data" rather than as a failure.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn fetch_domains(&self) -> Result<Option<Vec<Domain>>>;

    async fn fetch_categories(&self, domain_id: &str) -> Result<Option<Vec<Category>>>;

    async fn fetch_locations(
        &self,
        domain_id: &str,
        category_ids: &[CategoryId],
    ) -> Result<Option<Vec<Location>>>;

    async fn search_locations(
        &self,
        query: &str,
        domain_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Location>>;

    async fn fetch_map_config(&self) -> Result<MapConfig>;

    async fn fetch_map_data(&self) -> Result<FlatMapData>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: String,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

/// Drawing capabilities borrowed from the host mapping library.
///
/// Markers and groups are opaque handles owned by the surface; the same
/// marker handle may be inserted into several groups.
pub trait MapSurface {
    type Marker: Clone;
    type Group;

    fn create_marker(&mut self, at: Coordinates, style: &MarkerStyle) -> Self::Marker;
    fn bind_popup(&mut self, marker: &Self::Marker, html: &str);
    fn create_group(&mut self) -> Self::Group;
    fn add_to_group(&mut self, group: &Self::Group, marker: &Self::Marker);
    fn clear_group(&mut self, group: &Self::Group);
    fn add_to_map(&mut self, group: &Self::Group);
    fn remove_from_map(&mut self, group: &Self::Group);
    fn fit_bounds(&mut self, bounds: &Bounds, padding: (u32, u32));
    fn set_view(&mut self, center: Coordinates, zoom: u8);
    fn open_popup(&mut self, marker: &Self::Marker);
}
