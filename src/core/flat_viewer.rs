//! Single-tier viewer: every category of the flat map-data feed gets one
//! layer group that is shown or hidden as a unit. It keeps its own state and
//! never talks to the hierarchical controls.

use crate::core::controls::Notice;
use crate::core::layers::CategoryLayers;
use crate::core::popup::flat_location_popup;
use crate::domain::model::{Bounds, CategoryId, Coordinates, FlatCategory, FlatLocation, MapConfig};
use crate::domain::ports::{LocationSource, MapSurface, MarkerStyle};
use crate::utils::error::{MapError, Result};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MARKER_COLOR: &str = "#ff6b6b";
pub const FIT_PAD_RATIO: f64 = 0.1;
pub const DATA_ERROR: &str = "Failed to load location data.";

pub fn flat_marker_style(location: &FlatLocation) -> MarkerStyle {
    let color = location
        .category_color
        .clone()
        .unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string());
    MarkerStyle {
        radius: if location.featured { 10.0 } else { 8.0 },
        fill_color: color.clone(),
        color,
        weight: if location.featured { 3.0 } else { 2.0 },
        opacity: 1.0,
        fill_opacity: 0.8,
    }
}

pub struct FlatLayerViewer<S: LocationSource, M: MapSurface> {
    source: S,
    surface: M,
    config: MapConfig,
    categories: Vec<FlatCategory>,
    locations: Vec<FlatLocation>,
    groups: HashMap<CategoryId, M::Group>,
    points: HashMap<CategoryId, Vec<Coordinates>>,
    shown: HashSet<CategoryId>,
    featured_only: bool,
    notice: Option<Notice>,
}

impl<S: LocationSource, M: MapSurface> FlatLayerViewer<S, M> {
    pub fn new(source: S, surface: M) -> Self {
        Self {
            source,
            surface,
            config: MapConfig::default(),
            categories: Vec::new(),
            locations: Vec::new(),
            groups: HashMap::new(),
            points: HashMap::new(),
            shown: HashSet::new(),
            featured_only: false,
            notice: None,
        }
    }

    /// Applies the map config (or its defaults) and loads the flat feed.
    pub async fn init(&mut self) -> Result<()> {
        self.config = match self.source.fetch_map_config().await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default map config due to error: {}", e);
                MapConfig::default()
            }
        };
        self.surface
            .set_view(self.config.center(), self.config.zoom_level);

        self.load_data().await
    }

    pub async fn load_data(&mut self) -> Result<()> {
        let data = match self.source.fetch_map_data().await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Error loading map data: {}", e);
                self.notice = Some(Notice::Error(DATA_ERROR.to_string()));
                return Err(e);
            }
        };

        for group in self.groups.values() {
            self.surface.remove_from_map(group);
        }
        self.groups.clear();
        self.points.clear();

        self.categories = data.categories;
        self.locations = data.locations;
        for category in &self.categories {
            let group = self.surface.create_group();
            self.groups.insert(category.id.clone(), group);
        }

        self.populate();
        self.shown = self.categories.iter().map(|c| c.id.clone()).collect();
        for group in self.groups.values() {
            self.surface.add_to_map(group);
        }

        tracing::info!(
            "Map data loaded: {} categories, {} locations",
            self.categories.len(),
            self.locations.len()
        );
        self.fit_to_markers();
        Ok(())
    }

    fn populate(&mut self) {
        let featured_only = self.featured_only;
        for location in self.locations.iter().filter(|l| !featured_only || l.featured) {
            let Some(group) = self.groups.get(&location.category) else {
                tracing::debug!(
                    "Skipping '{}': category {} has no layer",
                    location.name,
                    location.category
                );
                continue;
            };

            let marker = self
                .surface
                .create_marker(location.coordinates, &flat_marker_style(location));
            self.surface
                .bind_popup(&marker, &flat_location_popup(location));
            self.surface.add_to_group(group, &marker);
            self.points
                .entry(location.category.clone())
                .or_default()
                .push(location.coordinates);
        }
    }

    pub fn toggle_layer(&mut self, category_id: &str, show: bool) -> Result<()> {
        let group = self
            .groups
            .get(category_id)
            .ok_or_else(|| MapError::UnknownCategory {
                id: category_id.to_string(),
            })?;

        if show {
            self.surface.add_to_map(group);
            self.shown.insert(category_id.to_string());
        } else {
            self.surface.remove_from_map(group);
            self.shown.remove(category_id);
        }
        Ok(())
    }

    pub fn show_category(&mut self, category_id: &str) -> Result<()> {
        self.toggle_layer(category_id, true)
    }

    pub fn hide_category(&mut self, category_id: &str) -> Result<()> {
        self.toggle_layer(category_id, false)
    }

    pub fn show_only_category(&mut self, category_id: &str) -> Result<()> {
        if !self.groups.contains_key(category_id) {
            return Err(MapError::UnknownCategory {
                id: category_id.to_string(),
            });
        }
        self.set_all(false);
        self.show_category(category_id)
    }

    pub fn show_all_categories(&mut self) {
        self.set_all(true);
    }

    fn set_all(&mut self, show: bool) {
        let ids: Vec<CategoryId> = self.categories.iter().map(|c| c.id.clone()).collect();
        for id in ids {
            // every id comes from self.categories, which all have a group
            let _ = self.toggle_layer(&id, show);
        }
    }

    /// Redraws the markers, optionally keeping featured locations only.
    /// Shown/hidden flags of the layers survive the redraw.
    pub fn filter_featured_only(&mut self, featured_only: bool) {
        for group in self.groups.values() {
            self.surface.clear_group(group);
        }
        self.points.clear();
        self.featured_only = featured_only;
        self.populate();

        for (id, group) in &self.groups {
            if self.shown.contains(id) {
                self.surface.add_to_map(group);
            }
        }
    }

    /// Frames every marker of every layer, padded by 10% of the span.
    pub fn fit_to_markers(&mut self) -> bool {
        let Some(bounds) = Bounds::from_points(self.points.values().flatten().copied()) else {
            return false;
        };
        self.surface.fit_bounds(&bounds.pad(FIT_PAD_RATIO), (0, 0));
        true
    }

    /// Marker count per category, in feed order.
    pub fn layer_counts(&self) -> Vec<(CategoryId, usize)> {
        self.categories
            .iter()
            .map(|c| {
                let count = self.points.get(&c.id).map(Vec::len).unwrap_or(0);
                (c.id.clone(), count)
            })
            .collect()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn categories(&self) -> &[FlatCategory] {
        &self.categories
    }

    pub fn is_shown(&self, category_id: &str) -> bool {
        self.shown.contains(category_id)
    }

    pub fn is_featured_only(&self) -> bool {
        self.featured_only
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }
}

impl<S: LocationSource, M: MapSurface> CategoryLayers for FlatLayerViewer<S, M> {
    fn set_category_visible(&mut self, category_id: &str, visible: bool) -> Result<()> {
        self.toggle_layer(category_id, visible)
    }

    fn show_all(&mut self) {
        self.show_all_categories();
    }

    fn hide_all(&mut self) {
        self.set_all(false);
    }

    fn fit_all(&mut self) -> bool {
        self.fit_to_markers()
    }

    fn shown_categories(&self) -> Vec<CategoryId> {
        self.categories
            .iter()
            .filter(|c| self.shown.contains(&c.id))
            .map(|c| c.id.clone())
            .collect()
    }
}
