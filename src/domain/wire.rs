//! JSON shapes served by the map backend, and their conversion into the
//! domain model. Optional fields fall back to the same defaults the backend
//! views use.

use crate::domain::model::{
    Category, CategoryRef, Coordinates, Domain, FlatCategory, FlatLocation, FlatMapData, Location,
    MapConfig, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON, DEFAULT_DOMAIN_ICON,
};
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer};

/// Ids arrive as strings from some views and as integers from others.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}

/// Decimal columns come over as strings such as `"21.030000"`; plain
/// numbers are accepted too.
pub(crate) fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCoordinate {
        Number(f64),
        Text(String),
    }

    match RawCoordinate::deserialize(deserializer)? {
        RawCoordinate::Number(value) => Ok(value),
        RawCoordinate::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| D::Error::invalid_value(Unexpected::Str(&text), &"a decimal coordinate")),
    }
}

fn deserialize_optional_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_coordinate")] f64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Deserialize)]
pub struct DomainsResponse {
    pub domains: Option<Vec<DomainDto>>,
}

#[derive(Debug, Deserialize)]
pub struct DomainDto {
    #[serde(deserialize_with = "deserialize_id")]
    pub domain_id: String,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category_count: Option<u32>,
    #[serde(default)]
    pub location_count: Option<u32>,
}

impl From<DomainDto> for Domain {
    fn from(dto: DomainDto) -> Self {
        Self {
            id: dto.domain_id,
            name: dto.name,
            country: dto.country.unwrap_or_default(),
            language: dto.language.unwrap_or_default(),
            icon: non_empty_or(dto.icon, DEFAULT_DOMAIN_ICON),
            category_count: dto.category_count.unwrap_or(0),
            location_count: dto.location_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Option<Vec<CategoryDto>>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryDto {
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub location_count: Option<u32>,
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Self {
            id: dto.category_id,
            name: dto.name,
            color: non_empty_or(dto.color, DEFAULT_CATEGORY_COLOR),
            icon: non_empty_or(dto.icon, DEFAULT_CATEGORY_ICON),
            location_count: dto.location_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Option<Vec<Feature>>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct FeatureProperties {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryRefDto>>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRefDto {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<CategoryRefDto> for CategoryRef {
    fn from(dto: CategoryRefDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            color: non_empty_or(dto.color, DEFAULT_CATEGORY_COLOR),
        }
    }
}

/// GeoJSON point; coordinates are `[lng, lat]`.
#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub coordinates: [f64; 2],
}

impl From<Feature> for Location {
    fn from(feature: Feature) -> Self {
        let [lng, lat] = feature.geometry.coordinates;
        let props = feature.properties;
        Self {
            id: props.id,
            name: props.name,
            address: props.address.unwrap_or_default(),
            phone: props.phone.filter(|v| !v.is_empty()),
            email: props.email.filter(|v| !v.is_empty()),
            website: props.website.filter(|v| !v.is_empty()),
            coordinates: Coordinates::new(lat, lng),
            categories: props
                .categories
                .unwrap_or_default()
                .into_iter()
                .map(CategoryRef::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub locations: Vec<SearchLocationDto>,
}

#[derive(Debug, Deserialize)]
pub struct SearchLocationDto {
    #[serde(deserialize_with = "deserialize_id")]
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub categories: Vec<SearchCategoryDto>,
}

#[derive(Debug, Deserialize)]
pub struct SearchCategoryDto {
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<SearchLocationDto> for Location {
    fn from(dto: SearchLocationDto) -> Self {
        Self {
            id: dto.location_id,
            name: dto.name,
            address: dto.address.unwrap_or_default(),
            phone: dto.phone.filter(|v| !v.is_empty()),
            email: dto.email.filter(|v| !v.is_empty()),
            website: dto.website.filter(|v| !v.is_empty()),
            coordinates: Coordinates::new(dto.latitude, dto.longitude),
            categories: dto
                .categories
                .into_iter()
                .map(|c| CategoryRef {
                    id: c.category_id,
                    name: c.name,
                    color: non_empty_or(c.color, DEFAULT_CATEGORY_COLOR),
                })
                .collect(),
        }
    }
}

/// Every field is optional on the wire; gaps are filled from the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct MapConfigDto {
    #[serde(default, deserialize_with = "deserialize_optional_coordinate")]
    pub center_latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_coordinate")]
    pub center_longitude: Option<f64>,
    pub zoom_level: Option<u8>,
    pub tile_layer: Option<String>,
    pub attribution: Option<String>,
    pub max_zoom: Option<u8>,
    pub min_zoom: Option<u8>,
    pub show_zoom_control: Option<bool>,
    pub show_scale: Option<bool>,
}

impl From<MapConfigDto> for MapConfig {
    fn from(dto: MapConfigDto) -> Self {
        let defaults = MapConfig::default();
        Self {
            center_latitude: dto.center_latitude.unwrap_or(defaults.center_latitude),
            center_longitude: dto.center_longitude.unwrap_or(defaults.center_longitude),
            zoom_level: dto.zoom_level.unwrap_or(defaults.zoom_level),
            tile_layer: non_empty_or(dto.tile_layer, &defaults.tile_layer),
            attribution: dto.attribution.unwrap_or(defaults.attribution),
            max_zoom: dto.max_zoom.unwrap_or(defaults.max_zoom),
            min_zoom: dto.min_zoom.unwrap_or(defaults.min_zoom),
            show_zoom_control: dto.show_zoom_control.unwrap_or(defaults.show_zoom_control),
            show_scale: dto.show_scale.unwrap_or(defaults.show_scale),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FlatMapDataDto {
    #[serde(default)]
    pub categories: Vec<FlatCategoryDto>,
    #[serde(default)]
    pub locations: Vec<FlatLocationDto>,
}

#[derive(Debug, Deserialize)]
pub struct FlatCategoryDto {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlatLocationDto {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub longitude: f64,
    #[serde(deserialize_with = "deserialize_id")]
    pub category: String,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl From<FlatMapDataDto> for FlatMapData {
    fn from(dto: FlatMapDataDto) -> Self {
        Self {
            categories: dto
                .categories
                .into_iter()
                .map(|c| FlatCategory {
                    id: c.id,
                    name: c.name,
                    color: non_empty_or(c.color, DEFAULT_CATEGORY_COLOR),
                })
                .collect(),
            locations: dto
                .locations
                .into_iter()
                .map(|l| FlatLocation {
                    id: l.id,
                    name: l.name,
                    address: l.address.unwrap_or_default(),
                    coordinates: Coordinates::new(l.latitude, l.longitude),
                    category: l.category,
                    category_color: l.category_color.filter(|v| !v.is_empty()),
                    featured: l.featured.unwrap_or(false),
                    description: l.description.filter(|v| !v.is_empty()),
                    phone: l.phone.filter(|v| !v.is_empty()),
                    email: l.email.filter(|v| !v.is_empty()),
                    website: l.website.filter(|v| !v.is_empty()),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_string_coordinates() {
        let data: FlatMapDataDto = serde_json::from_value(json!({
            "categories": [{"id": 1, "name": "Museums"}],
            "locations": [{
                "name": "Fine Arts Museum",
                "latitude": "21.030000",
                "longitude": "105.836700",
                "category": 1
            }]
        }))
        .unwrap();
        let data = FlatMapData::from(data);
        assert_eq!(data.locations[0].coordinates, Coordinates::new(21.03, 105.8367));

        let found: SearchResponse = serde_json::from_value(json!({
            "locations": [{
                "location_id": 3, "name": "Pho 10",
                "latitude": "21.030000", "longitude": 105.85,
                "categories": []
            }]
        }))
        .unwrap();
        let location = Location::from(found.locations.into_iter().next().unwrap());
        assert_eq!(location.coordinates, Coordinates::new(21.03, 105.85));

        let config: MapConfigDto = serde_json::from_value(json!({
            "center_latitude": "52.520000",
            "center_longitude": "13.405000",
            "zoom_level": 12
        }))
        .unwrap();
        let config = MapConfig::from(config);
        assert_eq!(config.center(), Coordinates::new(52.52, 13.405));
        assert_eq!(config.zoom_level, 12);
    }

    #[test]
    fn test_non_numeric_coordinate_is_rejected() {
        let parsed: Result<SearchResponse, _> = serde_json::from_value(json!({
            "locations": [{
                "location_id": 3, "name": "Pho 10",
                "latitude": "north", "longitude": 105.85
            }]
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_domain_defaults_applied() {
        let response: DomainsResponse = serde_json::from_value(json!({
            "domains": [{"domain_id": "hanoi", "name": "Hanoi", "country": "VN", "language": "vi", "icon": ""}]
        }))
        .unwrap();

        let domain = Domain::from(response.domains.unwrap().remove(0));
        assert_eq!(domain.id, "hanoi");
        assert_eq!(domain.icon, DEFAULT_DOMAIN_ICON);
        assert_eq!(domain.category_count, 0);
        assert_eq!(domain.location_count, 0);
    }

    #[test]
    fn test_feature_swaps_lng_lat_and_accepts_numeric_ids() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "features": [{
                "properties": {
                    "id": 42,
                    "name": "Bakery",
                    "address": null,
                    "phone": "",
                    "categories": [{"id": 7, "name": "Food", "color": null}]
                },
                "geometry": {"type": "Point", "coordinates": [105.85, 21.03]}
            }]
        }))
        .unwrap();

        let location = Location::from(collection.features.unwrap().remove(0));
        assert_eq!(location.id, "42");
        assert_eq!(location.coordinates, Coordinates::new(21.03, 105.85));
        assert_eq!(location.address, "");
        assert_eq!(location.phone, None);
        assert_eq!(location.categories[0].id, "7");
        assert_eq!(location.categories[0].color, DEFAULT_CATEGORY_COLOR);
    }

    #[test]
    fn test_missing_features_key_is_not_an_error() {
        let collection: FeatureCollection = serde_json::from_value(json!({"type": "FeatureCollection"})).unwrap();
        assert!(collection.features.is_none());
    }

    #[test]
    fn test_partial_map_config_uses_defaults() {
        let dto: MapConfigDto = serde_json::from_value(json!({"zoom_level": 12})).unwrap();
        let config = MapConfig::from(dto);
        assert_eq!(config.zoom_level, 12);
        assert_eq!(config.center_latitude, 21.0285);
        assert_eq!(config.max_zoom, 18);
    }

    #[test]
    fn test_flat_location_optional_id() {
        let data: FlatMapDataDto = serde_json::from_value(json!({
            "categories": [{"id": 1, "name": "Shops", "color": "#ff0000"}],
            "locations": [
                {"name": "A", "latitude": 1.0, "longitude": 2.0, "category": 1, "featured": true},
                {"id": "b", "name": "B", "latitude": 1.5, "longitude": 2.5, "category": 1}
            ]
        }))
        .unwrap();

        let data = FlatMapData::from(data);
        assert_eq!(data.locations[0].id, None);
        assert!(data.locations[0].featured);
        assert_eq!(data.locations[1].id.as_deref(), Some("b"));
        assert_eq!(data.locations[1].category, "1");
    }
}
