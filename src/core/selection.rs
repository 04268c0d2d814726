//! Domain → category → location selection state.
//!
//! The engine is synchronous and does no I/O. Fetches are modelled as a
//! token handed out when the fetch starts (`select_domain`,
//! `apply_categories`, ...) and handed back together with the response.
//! A response whose token has been superseded is dropped, so a slow answer
//! to an earlier domain can never overwrite a later selection.

use crate::core::request::{RequestToken, RequestTracker, Tier};
use crate::domain::model::{
    Category, CategoryId, Domain, DomainId, ExportSnapshot, Location, LocationId, SelectionStats,
};
use crate::utils::error::{MapError, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Parameters of the location fetch that follows a category load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub token: RequestToken,
    pub domain_id: DomainId,
    pub category_ids: Vec<CategoryId>,
}

#[derive(Debug, Default)]
pub struct SelectionEngine {
    requests: RequestTracker,
    domains: Vec<Domain>,
    selected_domain: Option<DomainId>,
    categories: Vec<Category>,
    selected_categories: HashSet<CategoryId>,
    locations: Vec<Location>,
    location_index: HashMap<LocationId, usize>,
    visible_locations: HashSet<LocationId>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_domains_load(&mut self) -> RequestToken {
        self.requests.issue(Tier::Domains)
    }

    pub fn apply_domains(&mut self, token: RequestToken, domains: Vec<Domain>) -> bool {
        if !self.accept(token) {
            return false;
        }

        self.domains.clear();
        for domain in domains {
            match self.domains.iter().position(|d| d.id == domain.id) {
                Some(slot) => self.domains[slot] = domain,
                None => self.domains.push(domain),
            }
        }
        tracing::debug!("Domains loaded: {}", self.domains.len());
        true
    }

    /// Selects a domain (or clears the selection with `None`).
    ///
    /// Both cases empty the category and location tiers. A new selection
    /// returns the token the category fetch must carry.
    pub fn select_domain(&mut self, domain_id: Option<&str>) -> Option<RequestToken> {
        self.clear_categories();
        self.clear_locations();

        let Some(domain_id) = domain_id.filter(|id| !id.is_empty()) else {
            self.selected_domain = None;
            tracing::debug!("Domain selection cleared");
            return None;
        };

        if !self.domains.is_empty() && self.domain(domain_id).is_none() {
            tracing::warn!("Selecting domain '{}' which is not in the loaded list", domain_id);
        }

        self.selected_domain = Some(domain_id.to_string());
        tracing::debug!("Domain selected: {}", domain_id);
        Some(self.requests.issue(Tier::Categories))
    }

    /// Token for re-fetching the categories of the current domain.
    pub fn begin_categories_load(&mut self) -> Result<RequestToken> {
        if self.selected_domain.is_none() {
            return Err(MapError::NoDomainSelected);
        }
        Ok(self.requests.issue(Tier::Categories))
    }

    /// Replaces the category tier and selects every category in it.
    ///
    /// Returns the follow-up location query, or `None` when the token is
    /// stale.
    pub fn apply_categories(
        &mut self,
        token: RequestToken,
        categories: Vec<Category>,
    ) -> Option<LocationQuery> {
        if !self.accept(token) {
            return None;
        }
        let domain_id = self.selected_domain.clone()?;

        self.categories.clear();
        for category in categories {
            match self.categories.iter().position(|c| c.id == category.id) {
                Some(slot) => self.categories[slot] = category,
                None => self.categories.push(category),
            }
        }
        self.selected_categories = self.categories.iter().map(|c| c.id.clone()).collect();
        self.clear_locations();

        tracing::debug!(
            "Domain {}: {} categories loaded, {} selected",
            domain_id,
            self.categories.len(),
            self.selected_categories.len()
        );

        Some(LocationQuery {
            token: self.requests.issue(Tier::Locations),
            domain_id,
            category_ids: self.selected_category_ids(),
        })
    }

    /// Query for re-fetching locations with the current category selection.
    pub fn begin_locations_load(&mut self) -> Result<LocationQuery> {
        let domain_id = self
            .selected_domain
            .clone()
            .ok_or(MapError::NoDomainSelected)?;
        Ok(LocationQuery {
            token: self.requests.issue(Tier::Locations),
            domain_id,
            category_ids: self.selected_category_ids(),
        })
    }

    pub fn apply_locations(&mut self, token: RequestToken, locations: Vec<Location>) -> bool {
        if !self.accept(token) {
            return false;
        }

        self.clear_locations();
        for location in locations {
            match self.location_index.get(&location.id).copied() {
                Some(slot) => self.locations[slot] = location,
                None => {
                    self.location_index
                        .insert(location.id.clone(), self.locations.len());
                    self.locations.push(location);
                }
            }
        }
        self.recompute_visible();

        tracing::debug!(
            "Locations loaded: {}, visible: {}",
            self.locations.len(),
            self.visible_locations.len()
        );
        true
    }

    /// Forgets an outstanding fetch after it failed.
    pub fn abandon(&mut self, token: RequestToken) {
        self.requests.complete(token);
    }

    pub fn is_loading(&self, tier: Tier) -> bool {
        self.requests.is_pending(tier)
    }

    pub fn toggle_category(&mut self, category_id: &str, included: bool) -> Result<()> {
        if included {
            if self.category(category_id).is_none() {
                return Err(MapError::UnknownCategory {
                    id: category_id.to_string(),
                });
            }
            self.selected_categories.insert(category_id.to_string());
        } else {
            self.selected_categories.remove(category_id);
        }

        self.recompute_visible();
        tracing::debug!(
            "Category {} {}: {} visible locations",
            category_id,
            if included { "included" } else { "excluded" },
            self.visible_locations.len()
        );
        Ok(())
    }

    pub fn select_all_categories(&mut self) {
        self.selected_categories = self.categories.iter().map(|c| c.id.clone()).collect();
        self.recompute_visible();
        tracing::debug!(
            "Select all: {} categories, {} visible locations",
            self.selected_categories.len(),
            self.visible_locations.len()
        );
    }

    pub fn deselect_all_categories(&mut self) {
        self.selected_categories.clear();
        self.recompute_visible();
        tracing::debug!("Deselect all: {} visible locations", self.visible_locations.len());
    }

    /// Drops the selected domain and everything below it.
    pub fn clear(&mut self) {
        self.select_domain(None);
    }

    fn accept(&mut self, token: RequestToken) -> bool {
        if self.requests.complete(token) {
            return true;
        }
        tracing::debug!(
            "Discarding stale {:?} response (request #{})",
            token.tier(),
            token.seq()
        );
        false
    }

    fn clear_categories(&mut self) {
        self.requests.invalidate(Tier::Categories);
        self.categories.clear();
        self.selected_categories.clear();
    }

    fn clear_locations(&mut self) {
        self.requests.invalidate(Tier::Locations);
        self.locations.clear();
        self.location_index.clear();
        self.visible_locations.clear();
    }

    fn recompute_visible(&mut self) {
        let selected = &self.selected_categories;
        self.visible_locations = self
            .locations
            .iter()
            .filter(|l| l.categories.iter().any(|c| selected.contains(&c.id)))
            .map(|l| l.id.clone())
            .collect();
    }

    fn selected_category_ids(&self) -> Vec<CategoryId> {
        self.selected_categories().map(|c| c.id.clone()).collect()
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn domain(&self, domain_id: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.id == domain_id)
    }

    pub fn selected_domain(&self) -> Option<&str> {
        self.selected_domain.as_deref()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Selected categories in feed order.
    pub fn selected_categories(&self) -> impl Iterator<Item = &Category> + '_ {
        self.categories
            .iter()
            .filter(|c| self.selected_categories.contains(&c.id))
    }

    pub fn is_category_selected(&self, category_id: &str) -> bool {
        self.selected_categories.contains(category_id)
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: &str) -> Option<&Location> {
        self.location_index
            .get(location_id)
            .map(|&slot| &self.locations[slot])
    }

    /// Visible locations in feed order.
    pub fn visible_locations(&self) -> impl Iterator<Item = &Location> + '_ {
        self.locations
            .iter()
            .filter(|l| self.visible_locations.contains(&l.id))
    }

    pub fn is_visible(&self, location_id: &str) -> bool {
        self.visible_locations.contains(location_id)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_locations.len()
    }

    pub fn stats(&self) -> SelectionStats {
        SelectionStats {
            domains: self.domains.len(),
            categories: self.categories.len(),
            selected_categories: self.selected_categories.len(),
            locations: self.locations.len(),
            visible_locations: self.visible_locations.len(),
        }
    }

    pub fn export(&self, now: DateTime<Utc>) -> ExportSnapshot {
        ExportSnapshot {
            domain: self.selected_domain.clone(),
            categories: self.selected_category_ids(),
            locations: self.visible_locations().cloned().collect(),
            exported_at: ExportSnapshot::timestamp(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CategoryRef, Coordinates};
    use chrono::TimeZone;

    fn category(id: &str, color: &str) -> Category {
        Category {
            id: id.to_string(),
            name: format!("Category {}", id),
            color: color.to_string(),
            icon: "📂".to_string(),
            location_count: 0,
        }
    }

    fn location(id: &str, categories: &[&str]) -> Location {
        Location {
            id: id.to_string(),
            name: format!("Location {}", id),
            address: format!("{} Hang Bac", id),
            phone: None,
            email: None,
            website: None,
            coordinates: Coordinates::new(21.03, 105.85),
            categories: categories
                .iter()
                .map(|c| CategoryRef {
                    id: c.to_string(),
                    name: format!("Category {}", c),
                    color: "#000000".to_string(),
                })
                .collect(),
        }
    }

    fn hanoi_engine() -> SelectionEngine {
        let mut engine = SelectionEngine::new();
        let token = engine.select_domain(Some("hanoi")).unwrap();
        let query = engine
            .apply_categories(token, vec![category("A", "red"), category("B", "blue")])
            .unwrap();
        assert!(engine.apply_locations(
            query.token,
            vec![location("1", &["A"]), location("2", &["A", "B"]), location("3", &["B"])],
        ));
        engine
    }

    fn visible_ids(engine: &SelectionEngine) -> Vec<&str> {
        engine.visible_locations().map(|l| l.id.as_str()).collect()
    }

    fn selected_ids(engine: &SelectionEngine) -> Vec<&str> {
        engine.selected_categories().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_category_load_selects_everything_and_queries_locations() {
        let mut engine = SelectionEngine::new();
        let token = engine.select_domain(Some("hanoi")).unwrap();
        let query = engine
            .apply_categories(token, vec![category("A", "red"), category("B", "blue")])
            .unwrap();

        assert_eq!(query.domain_id, "hanoi");
        assert_eq!(query.category_ids, vec!["A", "B"]);
        assert_eq!(selected_ids(&engine), vec!["A", "B"]);
        assert!(engine.is_loading(Tier::Locations));
    }

    #[test]
    fn test_deselecting_b_keeps_shared_location() {
        let mut engine = hanoi_engine();
        assert_eq!(visible_ids(&engine), vec!["1", "2", "3"]);

        engine.toggle_category("B", false).unwrap();

        assert_eq!(visible_ids(&engine), vec!["1", "2"]);
    }

    #[test]
    fn test_select_all_then_deselect_all_empties_everything() {
        let mut engine = hanoi_engine();
        engine.select_all_categories();
        engine.deselect_all_categories();

        assert_eq!(engine.selected_categories().count(), 0);
        assert_eq!(engine.visible_count(), 0);
        assert_eq!(engine.locations().len(), 3);
    }

    #[test]
    fn test_reloading_categories_resets_selection() {
        let mut engine = hanoi_engine();
        engine.deselect_all_categories();

        let token = engine.begin_categories_load().unwrap();
        engine
            .apply_categories(token, vec![category("B", "blue"), category("C", "green")])
            .unwrap();

        assert_eq!(selected_ids(&engine), vec!["B", "C"]);
        assert!(engine.locations().is_empty());
    }

    #[test]
    fn test_null_domain_clears_all_tiers() {
        let mut engine = hanoi_engine();
        assert!(engine.select_domain(None).is_none());

        assert_eq!(engine.selected_domain(), None);
        assert!(engine.categories().is_empty());
        assert_eq!(engine.selected_categories().count(), 0);
        assert!(engine.locations().is_empty());
        assert_eq!(engine.visible_count(), 0);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let mut engine = hanoi_engine();
        let err = engine.toggle_category("Z", true).unwrap_err();

        assert!(matches!(err, MapError::UnknownCategory { .. }));
        assert_eq!(selected_ids(&engine), vec!["A", "B"]);
        assert!(engine.toggle_category("Z", false).is_ok());
    }

    #[test]
    fn test_stale_category_response_is_dropped() {
        let mut engine = SelectionEngine::new();
        let slow = engine.select_domain(Some("hanoi")).unwrap();
        let fast = engine.select_domain(Some("saigon")).unwrap();

        let query = engine.apply_categories(fast, vec![category("S", "red")]).unwrap();
        assert_eq!(query.domain_id, "saigon");

        assert!(engine.apply_categories(slow, vec![category("H", "blue")]).is_none());
        assert_eq!(engine.selected_domain(), Some("saigon"));
        assert_eq!(selected_ids(&engine), vec!["S"]);
    }

    #[test]
    fn test_stale_location_response_after_domain_clear() {
        let mut engine = SelectionEngine::new();
        let token = engine.select_domain(Some("hanoi")).unwrap();
        let query = engine.apply_categories(token, vec![category("A", "red")]).unwrap();

        engine.select_domain(None);

        assert!(!engine.apply_locations(query.token, vec![location("1", &["A"])]));
        assert!(engine.locations().is_empty());
    }

    #[test]
    fn test_duplicate_location_ids_keep_first_position() {
        let mut engine = SelectionEngine::new();
        let token = engine.select_domain(Some("hanoi")).unwrap();
        let query = engine.apply_categories(token, vec![category("A", "red")]).unwrap();
        let mut replacement = location("1", &["A"]);
        replacement.name = "Renamed".to_string();

        engine.apply_locations(
            query.token,
            vec![location("1", &["A"]), location("2", &["A"]), replacement],
        );

        assert_eq!(visible_ids(&engine), vec!["1", "2"]);
        assert_eq!(engine.location("1").unwrap().name, "Renamed");
    }

    #[test]
    fn test_export_with_only_a_selected() {
        let mut engine = hanoi_engine();
        engine.toggle_category("B", false).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let snapshot = engine.export(now);

        assert_eq!(snapshot.domain.as_deref(), Some("hanoi"));
        assert_eq!(snapshot.categories, vec!["A"]);
        let ids: Vec<&str> = snapshot.locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(snapshot.exported_at, "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_begin_locations_requires_domain() {
        let mut engine = SelectionEngine::new();
        assert!(matches!(
            engine.begin_locations_load(),
            Err(MapError::NoDomainSelected)
        ));
        assert!(engine.begin_categories_load().is_err());
    }
}
