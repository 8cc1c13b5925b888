use crate::map::marker::{MapSurface, MarkerSummary};
use crate::models::{PropertyId, PropertyRecord};
use std::collections::{HashMap, HashSet};

/// A live marker plus the summary it was created from
pub struct PlacedMarker<M> {
    pub handle: M,
    pub summary: MarkerSummary,
}

/// What a reconciliation pass changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub added: Vec<PropertyId>,
    pub removed: Vec<PropertyId>,
    pub kept: usize,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Property id to on-map marker
pub struct MarkerRegistry<M> {
    markers: HashMap<PropertyId, PlacedMarker<M>>,
}

impl<M> Default for MarkerRegistry<M> {
    fn default() -> Self {
        Self {
            markers: HashMap::new(),
        }
    }
}

impl<M> MarkerRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, id: PropertyId) -> Option<&PlacedMarker<M>> {
        self.markers.get(&id)
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<PropertyId> {
        let mut ids: Vec<_> = self.markers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Make the registry match `incoming` exactly.
    ///
    /// Markers for ids no longer present are removed, markers for new ids are
    /// placed, and markers for ids present on both sides are left alone.
    /// Records without a location never get a marker.
    pub fn reconcile<S>(&mut self, incoming: &[PropertyRecord], surface: &mut S) -> ReconcileOutcome
    where
        S: MapSurface<Marker = M>,
    {
        let located: Vec<_> = incoming
            .iter()
            .filter_map(|record| record.location().map(|point| (record, point)))
            .collect();
        let incoming_ids: HashSet<PropertyId> = located.iter().map(|(r, _)| r.id).collect();

        let mut outcome = ReconcileOutcome::default();

        let departed: Vec<PropertyId> = self
            .markers
            .keys()
            .filter(|id| !incoming_ids.contains(id))
            .copied()
            .collect();
        for id in departed {
            if let Some(placed) = self.markers.remove(&id) {
                surface.remove_marker(placed.handle);
                outcome.removed.push(id);
            }
        }

        for (record, point) in located {
            if self.markers.contains_key(&record.id) {
                outcome.kept += 1;
                continue;
            }
            let summary = MarkerSummary::from(record);
            let handle = surface.place_marker(point, &summary);
            self.markers.insert(record.id, PlacedMarker { handle, summary });
            outcome.added.push(record.id);
        }

        outcome.removed.sort_unstable();
        outcome
    }

    /// Drop a single marker; returns whether one was registered
    pub fn evict<S>(&mut self, id: PropertyId, surface: &mut S) -> bool
    where
        S: MapSurface<Marker = M>,
    {
        match self.markers.remove(&id) {
            Some(placed) => {
                surface.remove_marker(placed.handle);
                true
            }
            None => false,
        }
    }

    /// Remove every marker from the surface
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: MapSurface<Marker = M>,
    {
        for (_, placed) in self.markers.drain() {
            surface.remove_marker(placed.handle);
        }
    }
}
