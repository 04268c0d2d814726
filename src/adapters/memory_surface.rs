use crate::domain::model::{Bounds, Coordinates};
use crate::domain::ports::{MapSurface, MarkerStyle};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMarker {
    pub id: MarkerId,
    pub at: Coordinates,
    pub style: MarkerStyle,
    pub popup: Option<String>,
}

#[derive(Debug, Default)]
struct RecordedGroup {
    members: Vec<MarkerId>,
    on_map: bool,
}

/// Map surface that only records what it was asked to draw.
///
/// Used headless by the CLI and as the test double for both rendering
/// strategies.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    markers: Vec<RecordedMarker>,
    groups: Vec<RecordedGroup>,
    view: Option<(Coordinates, u8)>,
    last_fit: Option<(Bounds, (u32, u32))>,
    open_popups: Vec<MarkerId>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every marker ever created, in creation order.
    pub fn markers(&self) -> &[RecordedMarker] {
        &self.markers
    }

    /// Markers reachable through a group that is on the map.
    pub fn drawn_markers(&self) -> BTreeSet<MarkerId> {
        self.groups
            .iter()
            .filter(|g| g.on_map)
            .flat_map(|g| g.members.iter().copied())
            .collect()
    }

    pub fn marker_count(&self) -> usize {
        self.drawn_markers().len()
    }

    pub fn groups_on_map(&self) -> usize {
        self.groups.iter().filter(|g| g.on_map).count()
    }

    pub fn markers_for_location_at(&self, at: Coordinates) -> Vec<MarkerId> {
        self.drawn_markers()
            .into_iter()
            .filter(|id| self.markers[id.0].at == at)
            .collect()
    }

    /// Number of on-map groups holding `marker`.
    pub fn group_memberships(&self, marker: MarkerId) -> usize {
        self.groups
            .iter()
            .filter(|g| g.on_map && g.members.contains(&marker))
            .count()
    }

    pub fn view(&self) -> Option<(Coordinates, u8)> {
        self.view
    }

    pub fn last_fit(&self) -> Option<(Bounds, (u32, u32))> {
        self.last_fit
    }

    pub fn open_popups(&self) -> &[MarkerId] {
        &self.open_popups
    }

    pub fn reset_view(&mut self) {
        self.view = None;
        self.last_fit = None;
        self.open_popups.clear();
    }

    fn group_mut(&mut self, group: &GroupId) -> Option<&mut RecordedGroup> {
        self.groups.get_mut(group.0)
    }
}

impl MapSurface for InMemorySurface {
    type Marker = MarkerId;
    type Group = GroupId;

    fn create_marker(&mut self, at: Coordinates, style: &MarkerStyle) -> MarkerId {
        let id = MarkerId(self.markers.len());
        self.markers.push(RecordedMarker {
            id,
            at,
            style: style.clone(),
            popup: None,
        });
        id
    }

    fn bind_popup(&mut self, marker: &MarkerId, html: &str) {
        if let Some(recorded) = self.markers.get_mut(marker.0) {
            recorded.popup = Some(html.to_string());
        }
    }

    fn create_group(&mut self) -> GroupId {
        self.groups.push(RecordedGroup::default());
        GroupId(self.groups.len() - 1)
    }

    fn add_to_group(&mut self, group: &GroupId, marker: &MarkerId) {
        if let Some(recorded) = self.group_mut(group) {
            recorded.members.push(*marker);
        }
    }

    fn clear_group(&mut self, group: &GroupId) {
        if let Some(recorded) = self.group_mut(group) {
            recorded.members.clear();
        }
    }

    fn add_to_map(&mut self, group: &GroupId) {
        if let Some(recorded) = self.group_mut(group) {
            recorded.on_map = true;
        }
    }

    fn remove_from_map(&mut self, group: &GroupId) {
        if let Some(recorded) = self.group_mut(group) {
            recorded.on_map = false;
        }
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: (u32, u32)) {
        tracing::debug!("fit_bounds {:?} padding {:?}", bounds, padding);
        self.last_fit = Some((*bounds, padding));
    }

    fn set_view(&mut self, center: Coordinates, zoom: u8) {
        self.view = Some((center, zoom));
    }

    fn open_popup(&mut self, marker: &MarkerId) {
        self.open_popups.push(*marker);
    }
}
