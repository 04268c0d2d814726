use crate::core::layers::CategoryLayers;
use crate::core::popup::{
    domain_details, stats_line, CategoryListItem, LocationListItem, CATEGORIES_PLACEHOLDER,
    LOCATIONS_PLACEHOLDER, NO_CATEGORIES, NO_VISIBLE_LOCATIONS,
};
use crate::core::renderer::{LayerRenderer, DEFAULT_FIT_PADDING, DEFAULT_ZOOM};
use crate::core::request::RequestToken;
use crate::core::selection::{LocationQuery, SelectionEngine};
use crate::domain::model::{CategoryId, ExportSnapshot, Location, SelectionStats};
use crate::domain::ports::{ConfigProvider, LocationSource, MapSurface, Storage};
use crate::utils::error::{MapError, Result};
use chrono::Utc;

pub const DOMAINS_ERROR: &str = "Unable to load domain data";
pub const CATEGORIES_ERROR: &str = "Unable to load categories";
pub const LOCATIONS_ERROR: &str = "Unable to load location data";
pub const SEARCH_ERROR: &str = "Unable to search locations";
pub const NOTHING_TO_FIT: &str = "No locations to display";

#[derive(Debug, Clone, PartialEq)]
pub struct ControlOptions {
    pub zoom_level: u8,
    pub fit_padding: u32,
    pub auto_load: bool,
    pub auto_select_first: bool,
    pub show_stats: bool,
    pub search_limit: usize,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM,
            fit_padding: DEFAULT_FIT_PADDING,
            auto_load: true,
            auto_select_first: true,
            show_stats: true,
            search_limit: 20,
        }
    }
}

impl ControlOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            zoom_level: config.zoom_level(),
            fit_padding: config.fit_padding(),
            auto_load: config.auto_load(),
            auto_select_first: config.auto_select_first(),
            show_stats: config.show_stats(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Expanded,
    Collapsed,
}

impl PanelState {
    pub fn toggled(self) -> Self {
        match self {
            PanelState::Expanded => PanelState::Collapsed,
            PanelState::Collapsed => PanelState::Expanded,
        }
    }
}

/// Last message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Info(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationSummary {
    pub visible: usize,
    pub total: usize,
}

/// Three-tier control panel: backend fetches, selection state and the
/// layer rebuilds that follow every change.
pub struct HierarchicalControls<S: LocationSource, M: MapSurface> {
    source: S,
    engine: SelectionEngine,
    renderer: LayerRenderer<M>,
    options: ControlOptions,
    panel: PanelState,
    list_visible: bool,
    notice: Option<Notice>,
}

impl<S: LocationSource, M: MapSurface> HierarchicalControls<S, M> {
    pub fn new(source: S, surface: M, options: ControlOptions) -> Self {
        Self {
            source,
            engine: SelectionEngine::new(),
            renderer: LayerRenderer::new(surface),
            options,
            panel: PanelState::default(),
            list_visible: true,
            notice: None,
        }
    }

    /// Loads domains and picks the first one, as configured.
    pub async fn init(&mut self) -> Result<()> {
        if !self.options.auto_load {
            return Ok(());
        }
        self.load_domains().await?;

        if self.options.auto_select_first {
            if let Some(first) = self.engine.domains().first().map(|d| d.id.clone()) {
                self.select_domain(Some(first.as_str())).await?;
            }
        }
        Ok(())
    }

    pub async fn load_domains(&mut self) -> Result<()> {
        let token = self.engine.begin_domains_load();
        match self.source.fetch_domains().await {
            Ok(Some(domains)) => {
                self.engine.apply_domains(token, domains);
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("Domain response carried no domain list");
                self.engine.abandon(token);
                Ok(())
            }
            Err(e) => Err(self.fail(token, DOMAINS_ERROR, e)),
        }
    }

    pub async fn select_domain(&mut self, domain_id: Option<&str>) -> Result<()> {
        let token = self.engine.select_domain(domain_id);
        self.renderer.clear();

        match token {
            Some(token) => self.fetch_categories(token).await,
            None => Ok(()),
        }
    }

    /// Re-fetches the categories of the selected domain.
    pub async fn load_categories(&mut self) -> Result<()> {
        let token = self.engine.begin_categories_load()?;
        self.fetch_categories(token).await
    }

    /// Re-fetches locations for the current category selection.
    pub async fn load_locations(&mut self) -> Result<()> {
        let query = self.engine.begin_locations_load()?;
        self.fetch_locations(query).await
    }

    async fn fetch_categories(&mut self, token: RequestToken) -> Result<()> {
        let domain_id = self
            .engine
            .selected_domain()
            .map(str::to_string)
            .ok_or(MapError::NoDomainSelected)?;

        match self.source.fetch_categories(&domain_id).await {
            Ok(Some(categories)) => match self.engine.apply_categories(token, categories) {
                Some(query) => {
                    self.renderer.clear();
                    self.fetch_locations(query).await
                }
                None => Ok(()),
            },
            Ok(None) => {
                tracing::warn!("Category response for {} carried no category list", domain_id);
                self.engine.abandon(token);
                Ok(())
            }
            Err(e) => Err(self.fail(token, CATEGORIES_ERROR, e)),
        }
    }

    async fn fetch_locations(&mut self, query: LocationQuery) -> Result<()> {
        let result = self
            .source
            .fetch_locations(&query.domain_id, &query.category_ids)
            .await;

        match result {
            Ok(Some(locations)) => {
                let received = locations.len();
                if self.engine.apply_locations(query.token, locations) {
                    self.rebuild();
                    tracing::info!(
                        "Locations loaded: {}, visible locations: {}",
                        received,
                        self.engine.visible_count()
                    );
                }
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("Location response carried no features");
                self.engine.abandon(query.token);
                Ok(())
            }
            Err(e) => Err(self.fail(query.token, LOCATIONS_ERROR, e)),
        }
    }

    fn fail(&mut self, token: RequestToken, message: &str, err: MapError) -> MapError {
        self.engine.abandon(token);
        tracing::error!("{}: {}", message, err);
        self.notice = Some(Notice::Error(message.to_string()));
        err
    }

    fn rebuild(&mut self) -> usize {
        self.renderer.rebuild_layers(&self.engine)
    }

    pub fn toggle_category(&mut self, category_id: &str, included: bool) -> Result<()> {
        self.engine.toggle_category(category_id, included)?;
        self.rebuild();
        Ok(())
    }

    pub fn select_all_categories(&mut self) {
        self.engine.select_all_categories();
        self.rebuild();
    }

    pub fn deselect_all_categories(&mut self) {
        self.engine.deselect_all_categories();
        self.rebuild();
    }

    pub fn zoom_to_location(&mut self, location_id: &str) -> Result<()> {
        self.renderer
            .zoom_to(&self.engine, location_id, self.options.zoom_level)
    }

    pub fn fit_to_visible(&mut self) -> bool {
        if self.renderer.fit_to_visible(&self.engine, self.options.fit_padding) {
            return true;
        }
        tracing::info!("{}", NOTHING_TO_FIT);
        self.notice = Some(Notice::Info(NOTHING_TO_FIT.to_string()));
        false
    }

    /// Backend search scoped to the selected domain.
    pub async fn search(&mut self, query: &str) -> Result<Vec<Location>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let domain = self.engine.selected_domain().map(str::to_string);
        match self
            .source
            .search_locations(query, domain.as_deref(), self.options.search_limit)
            .await
        {
            Ok(found) => Ok(found),
            Err(e) => {
                tracing::error!("{}: {}", SEARCH_ERROR, e);
                self.notice = Some(Notice::Error(SEARCH_ERROR.to_string()));
                Err(e)
            }
        }
    }

    pub fn export_visible_data(&self) -> ExportSnapshot {
        self.engine.export(Utc::now())
    }

    /// Writes the export as pretty JSON and returns the file name used.
    pub async fn export_to<St: Storage>(&self, storage: &St) -> Result<String> {
        let snapshot = self.export_visible_data();
        let file_name = format!("hierarchical_data_{}.json", Utc::now().timestamp_millis());
        let json = serde_json::to_string_pretty(&snapshot)?;

        storage.write_file(&file_name, json.as_bytes()).await?;
        tracing::info!(
            "Exported {} locations to {}",
            snapshot.locations.len(),
            file_name
        );
        Ok(file_name)
    }

    pub fn toggle_collapse(&mut self) -> PanelState {
        self.panel = self.panel.toggled();
        self.panel
    }

    pub fn panel_state(&self) -> PanelState {
        self.panel
    }

    pub fn toggle_location_list(&mut self) -> bool {
        self.list_visible = !self.list_visible;
        self.list_visible
    }

    pub fn is_location_list_visible(&self) -> bool {
        self.list_visible
    }

    pub fn location_summary(&self) -> LocationSummary {
        LocationSummary {
            visible: self.engine.visible_count(),
            total: self.engine.locations().len(),
        }
    }

    pub fn stats(&self) -> SelectionStats {
        self.engine.stats()
    }

    /// Stats banner, when enabled in the options.
    pub fn stats_line(&self) -> Option<String> {
        self.options
            .show_stats
            .then(|| stats_line(&self.engine.stats()))
    }

    pub fn domain_info(&self) -> Option<String> {
        let domain_id = self.engine.selected_domain()?;
        self.engine.domain(domain_id).map(domain_details)
    }

    pub fn category_list(&self) -> Vec<CategoryListItem> {
        self.engine
            .categories()
            .iter()
            .map(|c| CategoryListItem {
                id: c.id.clone(),
                name: c.name.clone(),
                color: c.color.clone(),
                location_count: c.location_count,
                checked: self.engine.is_category_selected(&c.id),
            })
            .collect()
    }

    pub fn category_placeholder(&self) -> Option<&'static str> {
        if self.engine.selected_domain().is_none() {
            Some(CATEGORIES_PLACEHOLDER)
        } else if self.engine.categories().is_empty() {
            Some(NO_CATEGORIES)
        } else {
            None
        }
    }

    pub fn location_list(&self) -> Vec<LocationListItem> {
        self.engine
            .visible_locations()
            .map(LocationListItem::from)
            .collect()
    }

    pub fn location_placeholder(&self) -> Option<&'static str> {
        if self.engine.selected_domain().is_none() {
            Some(LOCATIONS_PLACEHOLDER)
        } else if self.engine.visible_count() == 0 {
            Some(NO_VISIBLE_LOCATIONS)
        } else {
            None
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn renderer(&self) -> &LayerRenderer<M> {
        &self.renderer
    }

    pub fn surface(&self) -> &M {
        self.renderer.surface()
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    /// Removes every layer this panel put on the map.
    pub fn destroy(&mut self) {
        self.renderer.clear();
    }
}

impl<S: LocationSource, M: MapSurface> CategoryLayers for HierarchicalControls<S, M> {
    fn set_category_visible(&mut self, category_id: &str, visible: bool) -> Result<()> {
        self.toggle_category(category_id, visible)
    }

    fn show_all(&mut self) {
        self.select_all_categories();
    }

    fn hide_all(&mut self) {
        self.deselect_all_categories();
    }

    fn fit_all(&mut self) -> bool {
        self.fit_to_visible()
    }

    fn shown_categories(&self) -> Vec<CategoryId> {
        self.engine
            .selected_categories()
            .map(|c| c.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_surface::InMemorySurface;
    use crate::domain::model::{
        Category, CategoryRef, Coordinates, Domain, FlatMapData, MapConfig,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Canned backend keyed by domain id.
    #[derive(Default)]
    struct MockSource {
        domains: Option<Vec<Domain>>,
        categories: HashMap<String, Vec<Category>>,
        locations: HashMap<String, Vec<Location>>,
        fail_categories: bool,
        location_queries: Arc<Mutex<Vec<Vec<CategoryId>>>>,
    }

    #[async_trait::async_trait]
    impl LocationSource for MockSource {
        async fn fetch_domains(&self) -> Result<Option<Vec<Domain>>> {
            Ok(self.domains.clone())
        }

        async fn fetch_categories(&self, domain_id: &str) -> Result<Option<Vec<Category>>> {
            if self.fail_categories {
                return Err(MapError::Backend {
                    endpoint: "/api/hierarchical/categories/".to_string(),
                    status: 502,
                });
            }
            Ok(Some(self.categories.get(domain_id).cloned().unwrap_or_default()))
        }

        async fn fetch_locations(
            &self,
            domain_id: &str,
            category_ids: &[CategoryId],
        ) -> Result<Option<Vec<Location>>> {
            self.location_queries
                .lock()
                .unwrap()
                .push(category_ids.to_vec());
            Ok(Some(self.locations.get(domain_id).cloned().unwrap_or_default()))
        }

        async fn search_locations(
            &self,
            query: &str,
            _domain_id: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<Location>> {
            Ok(self
                .locations
                .values()
                .flatten()
                .filter(|l| l.name.contains(query))
                .cloned()
                .collect())
        }

        async fn fetch_map_config(&self) -> Result<MapConfig> {
            Ok(MapConfig::default())
        }

        async fn fetch_map_data(&self) -> Result<FlatMapData> {
            Ok(FlatMapData::default())
        }
    }

    fn domain(id: &str) -> Domain {
        Domain {
            id: id.to_string(),
            name: id.to_uppercase(),
            country: "Vietnam".to_string(),
            language: "vi".to_string(),
            icon: "🌍".to_string(),
            category_count: 2,
            location_count: 3,
        }
    }

    fn category(id: &str, color: &str) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_string(),
            color: color.to_string(),
            icon: "📂".to_string(),
            location_count: 2,
        }
    }

    fn location(id: &str, categories: &[&str], lat: f64) -> Location {
        Location {
            id: id.to_string(),
            name: format!("Shop {}", id),
            address: String::new(),
            phone: None,
            email: None,
            website: None,
            coordinates: Coordinates::new(lat, 105.85),
            categories: categories
                .iter()
                .map(|c| CategoryRef {
                    id: c.to_string(),
                    name: c.to_string(),
                    color: "#123456".to_string(),
                })
                .collect(),
        }
    }

    fn hanoi_source() -> MockSource {
        let mut source = MockSource {
            domains: Some(vec![domain("hanoi"), domain("hue")]),
            ..MockSource::default()
        };
        source.categories.insert(
            "hanoi".to_string(),
            vec![category("A", "red"), category("B", "blue")],
        );
        source.locations.insert(
            "hanoi".to_string(),
            vec![
                location("1", &["A"], 21.0),
                location("2", &["A", "B"], 21.1),
                location("3", &["B"], 21.2),
            ],
        );
        source
    }

    #[tokio::test]
    async fn test_init_auto_selects_first_domain() {
        let source = hanoi_source();
        let queries = source.location_queries.clone();
        let mut controls =
            HierarchicalControls::new(source, InMemorySurface::new(), ControlOptions::default());

        controls.init().await.unwrap();

        assert_eq!(controls.engine().selected_domain(), Some("hanoi"));
        assert_eq!(controls.location_summary(), LocationSummary { visible: 3, total: 3 });
        assert_eq!(controls.renderer().group_count(), 2);
        assert_eq!(queries.lock().unwrap().as_slice(), &[vec!["A".to_string(), "B".to_string()]]);
        assert_eq!(
            controls.stats_line().as_deref(),
            Some("2 domains | 2/2 categories | 3 locations")
        );
    }

    #[tokio::test]
    async fn test_init_without_auto_load_does_nothing() {
        let options = ControlOptions {
            auto_load: false,
            ..ControlOptions::default()
        };
        let mut controls = HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), options);

        controls.init().await.unwrap();

        assert!(controls.engine().domains().is_empty());
        assert_eq!(controls.category_placeholder(), Some(CATEGORIES_PLACEHOLDER));
        assert_eq!(controls.location_placeholder(), Some(LOCATIONS_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_toggle_rebuilds_layers() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());
        controls.init().await.unwrap();

        controls.toggle_category("B", false).unwrap();

        assert_eq!(controls.renderer().group_count(), 1);
        assert_eq!(controls.surface().marker_count(), 2);
        let ids: Vec<String> = controls.location_list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(!controls.category_list()[1].checked);
    }

    #[tokio::test]
    async fn test_repeated_include_still_redraws() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());
        controls.init().await.unwrap();
        let before = controls.surface().drawn_markers();
        let created = controls.surface().markers().len();

        controls.toggle_category("A", true).unwrap();

        let after = controls.surface().drawn_markers();
        assert_eq!(controls.renderer().group_count(), 2);
        assert_eq!(controls.surface().groups_on_map(), 2);
        assert_eq!(after.len(), 3);
        assert!(before.is_disjoint(&after));
        assert_eq!(controls.surface().markers().len(), created + 3);
    }

    #[tokio::test]
    async fn test_null_domain_clears_layers() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());
        controls.init().await.unwrap();

        controls.select_domain(None).await.unwrap();

        assert!(controls.engine().categories().is_empty());
        assert!(controls.engine().locations().is_empty());
        assert_eq!(controls.renderer().group_count(), 0);
        assert_eq!(controls.surface().groups_on_map(), 0);
    }

    #[tokio::test]
    async fn test_category_failure_keeps_domain_and_sets_notice() {
        let source = MockSource {
            fail_categories: true,
            ..hanoi_source()
        };
        let mut controls = HierarchicalControls::new(source, InMemorySurface::new(), ControlOptions::default());
        controls.load_domains().await.unwrap();

        let err = controls.select_domain(Some("hanoi")).await.unwrap_err();

        assert!(matches!(err, MapError::Backend { status: 502, .. }));
        assert_eq!(controls.engine().selected_domain(), Some("hanoi"));
        assert!(controls.engine().categories().is_empty());
        assert_eq!(controls.notice(), Some(&Notice::Error(CATEGORIES_ERROR.to_string())));
        assert_eq!(controls.category_placeholder(), Some(NO_CATEGORIES));
    }

    #[tokio::test]
    async fn test_missing_domain_list_is_no_data() {
        let source = MockSource::default();
        let mut controls = HierarchicalControls::new(source, InMemorySurface::new(), ControlOptions::default());

        controls.init().await.unwrap();

        assert!(controls.engine().domains().is_empty());
        assert!(controls.notice().is_none());
    }

    #[tokio::test]
    async fn test_fit_with_nothing_visible_sets_notice() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());
        controls.init().await.unwrap();
        controls.deselect_all_categories();

        assert!(!controls.fit_to_visible());
        assert_eq!(controls.notice(), Some(&Notice::Info(NOTHING_TO_FIT.to_string())));
        assert_eq!(controls.location_placeholder(), Some(NO_VISIBLE_LOCATIONS));

        controls.select_all_categories();
        assert!(controls.fit_to_visible());
        assert!(controls.surface().last_fit().is_some());
    }

    #[tokio::test]
    async fn test_zoom_uses_configured_level() {
        let options = ControlOptions {
            zoom_level: 17,
            ..ControlOptions::default()
        };
        let mut controls = HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), options);
        controls.init().await.unwrap();

        controls.zoom_to_location("3").unwrap();

        assert_eq!(controls.surface().view(), Some((Coordinates::new(21.2, 105.85), 17)));
    }

    #[tokio::test]
    async fn test_panel_toggles() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());

        assert_eq!(controls.panel_state(), PanelState::Expanded);
        assert_eq!(controls.toggle_collapse(), PanelState::Collapsed);
        assert_eq!(controls.toggle_collapse(), PanelState::Expanded);
        assert!(controls.is_location_list_visible());
        assert!(!controls.toggle_location_list());
    }

    #[tokio::test]
    async fn test_show_only_through_category_layers() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());
        controls.init().await.unwrap();

        controls.show_only("B").unwrap();

        assert_eq!(controls.shown_categories(), vec!["B".to_string()]);
        assert_eq!(controls.location_summary().visible, 2);
    }

    #[tokio::test]
    async fn test_empty_search_skips_backend() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());

        assert!(controls.search("   ").await.unwrap().is_empty());
        assert_eq!(controls.search("Shop 2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_domain_info() {
        let mut controls =
            HierarchicalControls::new(hanoi_source(), InMemorySurface::new(), ControlOptions::default());
        controls.init().await.unwrap();

        assert_eq!(
            controls.domain_info().as_deref(),
            Some("Location: Vietnam | Language: vi\nStats: 2 categories | 3 locations")
        );
    }
}
