use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub type DomainId = String;
pub type CategoryId = String;
pub type LocationId = String;

pub const DEFAULT_DOMAIN_ICON: &str = "🌍";
pub const DEFAULT_CATEGORY_ICON: &str = "📂";
pub const DEFAULT_CATEGORY_COLOR: &str = "#3388ff";

/// Top tier of the hierarchy, usually a city or locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub name: String,
    pub country: String,
    pub language: String,
    pub icon: String,
    pub category_count: u32,
    pub location_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub location_count: u32,
}

/// Membership reference carried by a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub coordinates: Coordinates,
    pub categories: Vec<CategoryRef>,
}

impl Location {
    pub fn belongs_to(&self, category_id: &str) -> bool {
        self.categories.iter().any(|c| c.id == category_id)
    }

    /// Fill color of the marker: the first category's color.
    pub fn primary_color(&self) -> &str {
        self.categories
            .first()
            .map(|c| c.color.as_str())
            .unwrap_or(DEFAULT_CATEGORY_COLOR)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Axis-aligned lat/lng box grown point by point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn around(point: Coordinates) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    pub fn extend(&mut self, point: Coordinates) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// `None` when there are no points.
    pub fn from_points<I: IntoIterator<Item = Coordinates>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut bounds = Self::around(iter.next()?);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Grows the box by `ratio` of its span on every side.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_pad = (self.north_east.lat - self.south_west.lat).abs() * ratio;
        let lng_pad = (self.north_east.lng - self.south_west.lng).abs() * ratio;
        Self {
            south_west: Coordinates::new(self.south_west.lat - lat_pad, self.south_west.lng - lng_pad),
            north_east: Coordinates::new(self.north_east.lat + lat_pad, self.north_east.lng + lng_pad),
        }
    }
}

/// Downloadable dump of the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub domain: Option<DomainId>,
    pub categories: Vec<CategoryId>,
    pub locations: Vec<Location>,
    pub exported_at: String,
}

impl ExportSnapshot {
    pub fn timestamp(now: DateTime<Utc>) -> String {
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionStats {
    pub domains: usize,
    pub categories: usize,
    pub selected_categories: usize,
    pub locations: usize,
    pub visible_locations: usize,
}

/// Initial viewport and tile settings served by the map-config endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom_level: u8,
    pub tile_layer: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub min_zoom: u8,
    pub show_zoom_control: bool,
    pub show_scale: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: 21.0285,
            center_longitude: 105.8542,
            zoom_level: 10,
            tile_layer: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            max_zoom: 18,
            min_zoom: 1,
            show_zoom_control: true,
            show_scale: true,
        }
    }
}

impl MapConfig {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.center_latitude, self.center_longitude)
    }
}

/// Category of the flat (single-tier) map data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatCategory {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
}

/// Location of the flat feed; belongs to exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatLocation {
    pub id: Option<LocationId>,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub category: CategoryId,
    pub category_color: Option<String>,
    pub featured: bool,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlatMapData {
    pub categories: Vec<FlatCategory>,
    pub locations: Vec<FlatLocation>,
}
