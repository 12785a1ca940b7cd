//! Read-only map state: which association is selected and where labels go.

use crate::geometry::LatLng;
use crate::model::{Association, AssociationId};

/// A text label anchored at a polygon's centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLabel {
    pub id: AssociationId,
    pub text: String,
    pub position: LatLng,
}

/// Labels for every association with a drawable polygon.
///
/// Associations whose polygon has no centroid (too few vertices or zero
/// area) get no label.
pub fn labels(associations: &[Association]) -> Vec<MapLabel> {
    associations
        .iter()
        .filter_map(|a| {
            let position = a.poligon.centroid()?;
            Some(MapLabel {
                id: a.id.clone(),
                text: a.abreviacio.clone(),
                position,
            })
        })
        .collect()
}

/// Selection state of the public viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerState {
    selected: Option<AssociationId>,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected association, if it is still in `associations`.
    pub fn selected_in<'a>(&self, associations: &'a [Association]) -> Option<&'a Association> {
        let id = self.selected.as_deref()?;
        associations.iter().find(|a| a.id == id)
    }

    pub fn select(&mut self, id: impl Into<AssociationId>) {
        self.selected = Some(id.into());
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Select the association under `point`, or clear the selection when the
    /// click hits empty map.
    ///
    /// Later associations are drawn on top, so they are hit-tested first.
    pub fn select_at(&mut self, associations: &[Association], point: LatLng) -> Option<&str> {
        self.selected = associations
            .iter()
            .rev()
            .find(|a| a.poligon.is_renderable() && a.poligon.contains(point))
            .map(|a| a.id.clone());

        if let Some(id) = &self.selected {
            log::debug!("Selected association '{}'", id);
        }
        self.selected.as_deref()
    }
}
