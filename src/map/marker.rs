use crate::models::{GeoPoint, PropertyId, PropertyRecord};
use std::fmt;

/// Popup content shown when a marker is clicked
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSummary {
    pub id: PropertyId,
    pub title: String,
    pub price: String,
    pub rating: u8,
    pub room_count: u32,
    pub address: String,
}

impl From<&PropertyRecord> for MarkerSummary {
    fn from(record: &PropertyRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            price: record.price.clone(),
            rating: record.rating,
            room_count: record.room_count,
            address: record.address.clone(),
        }
    }
}

impl fmt::Display for MarkerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | ★{} · {}룸 | {}",
            self.title, self.price, self.rating, self.room_count, self.address
        )
    }
}

/// The map widget markers are drawn on.
///
/// Implemented by whatever renders the map; the reconciler only ever places
/// and removes markers through this trait.
pub trait MapSurface: Send + 'static {
    type Marker: Send + 'static;

    fn place_marker(&mut self, at: GeoPoint, summary: &MarkerSummary) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);

    /// Hover highlight
    fn set_emphasis(&mut self, _marker: &Self::Marker, _emphasized: bool) {}

    /// Loading indicator while a bounds query is in flight
    fn set_loading(&mut self, _loading: bool) {}
}
