use crate::core::popup::location_popup;
use crate::core::selection::SelectionEngine;
use crate::domain::model::{Bounds, CategoryId, LocationId};
use crate::domain::ports::{MapSurface, MarkerStyle};
use crate::utils::error::{MapError, Result};
use std::collections::HashMap;

pub const DEFAULT_ZOOM: u8 = 15;
pub const DEFAULT_FIT_PADDING: u32 = 10;

/// Circle marker style for a location of the hierarchical view.
pub fn location_marker_style(fill_color: &str) -> MarkerStyle {
    MarkerStyle {
        radius: 8.0,
        fill_color: fill_color.to_string(),
        color: "#fff".to_string(),
        weight: 2.0,
        opacity: 0.8,
        fill_opacity: 0.7,
    }
}

/// Turns engine snapshots into per-category layer groups on a surface.
pub struct LayerRenderer<M: MapSurface> {
    surface: M,
    groups: Vec<(CategoryId, M::Group)>,
    markers: HashMap<LocationId, M::Marker>,
}

impl<M: MapSurface> LayerRenderer<M> {
    pub fn new(surface: M) -> Self {
        Self {
            surface,
            groups: Vec::new(),
            markers: HashMap::new(),
        }
    }

    /// Drops every group and redraws from scratch.
    ///
    /// A location matching several selected categories gets one marker that
    /// is inserted into each matching group. Returns the number of
    /// insertions.
    pub fn rebuild_layers(&mut self, engine: &SelectionEngine) -> usize {
        self.clear();

        for category in engine.selected_categories() {
            let group = self.surface.create_group();
            self.surface.add_to_map(&group);
            self.groups.push((category.id.clone(), group));
        }

        let mut inserted = 0;
        for location in engine.visible_locations() {
            let marker = self
                .surface
                .create_marker(location.coordinates, &location_marker_style(location.primary_color()));
            self.surface.bind_popup(&marker, &location_popup(location));

            for (category_id, group) in &self.groups {
                if location.belongs_to(category_id) {
                    self.surface.add_to_group(group, &marker);
                    inserted += 1;
                }
            }
            self.markers.insert(location.id.clone(), marker);
        }

        tracing::debug!(
            "Rebuilt {} layer groups with {} marker insertions",
            self.groups.len(),
            inserted
        );
        inserted
    }

    pub fn clear(&mut self) {
        for (_, group) in self.groups.drain(..) {
            self.surface.remove_from_map(&group);
        }
        self.markers.clear();
    }

    pub fn zoom_to(&mut self, engine: &SelectionEngine, location_id: &str, zoom: u8) -> Result<()> {
        let location = engine
            .location(location_id)
            .ok_or_else(|| MapError::UnknownLocation {
                id: location_id.to_string(),
            })?;

        self.surface.set_view(location.coordinates, zoom);
        if let Some(marker) = self.markers.get(location_id) {
            self.surface.open_popup(marker);
        }
        Ok(())
    }

    /// Frames every visible location. Returns `false` when nothing is
    /// visible, leaving the view untouched.
    pub fn fit_to_visible(&mut self, engine: &SelectionEngine, padding: u32) -> bool {
        match Bounds::from_points(engine.visible_locations().map(|l| l.coordinates)) {
            Some(bounds) => {
                self.surface.fit_bounds(&bounds, (padding, padding));
                true
            }
            None => false,
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn has_group(&self, category_id: &str) -> bool {
        self.groups.iter().any(|(id, _)| id == category_id)
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }
}
