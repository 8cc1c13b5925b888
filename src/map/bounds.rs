use crate::models::GeoPoint;
use serde::{Deserialize, Serialize};

/// Visible map rectangle.
///
/// Serializes to the `minLat`/`maxLat`/`minLng`/`maxLng` query parameters
/// of the bounds endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Build a rectangle; swapped corners are put back in order
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat: min_lat.min(max_lat),
            max_lat: min_lat.max(max_lat),
            min_lng: min_lng.min(max_lng),
            max_lng: min_lng.max(max_lng),
        }
    }

    /// Rectangle centered on `center` extending `half_lat`/`half_lng` each way
    pub fn around(center: GeoPoint, half_lat: f64, half_lng: f64) -> Self {
        Self::new(
            center.latitude - half_lat,
            center.latitude + half_lat,
            center.longitude - half_lng,
            center.longitude + half_lng,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude: (self.min_lat + self.max_lat) / 2.0,
            longitude: (self.min_lng + self.max_lng) / 2.0,
        }
    }

    /// Inclusive on every edge
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    /// Shift by a fraction of the current span on each axis
    pub fn panned(&self, lat_fraction: f64, lng_fraction: f64) -> Self {
        let dlat = self.lat_span() * lat_fraction;
        let dlng = self.lng_span() * lng_fraction;
        Self::new(
            self.min_lat + dlat,
            self.max_lat + dlat,
            self.min_lng + dlng,
            self.max_lng + dlng,
        )
    }

    /// Scale around the center; a factor below 1 zooms in
    pub fn scaled(&self, factor: f64) -> Self {
        Self::around(
            self.center(),
            self.lat_span() * factor / 2.0,
            self.lng_span() * factor / 2.0,
        )
    }

    /// Per-axis change relative to `previous`.
    ///
    /// Each axis reports the larger displacement of its two edges divided by
    /// the previous span on that axis. A degenerate previous span yields
    /// infinity.
    pub fn fractional_change(&self, previous: &Bounds) -> (f64, f64) {
        fn axis(lo: f64, hi: f64, prev_lo: f64, prev_hi: f64) -> f64 {
            let span = prev_hi - prev_lo;
            if span <= 0.0 || !span.is_finite() {
                return f64::INFINITY;
            }
            (lo - prev_lo).abs().max((hi - prev_hi).abs()) / span
        }

        (
            axis(self.min_lat, self.max_lat, previous.min_lat, previous.max_lat),
            axis(self.min_lng, self.max_lng, previous.min_lng, previous.max_lng),
        )
    }

    /// True unless both axes moved by less than `threshold`
    pub fn differs_significantly(&self, previous: &Bounds, threshold: f64) -> bool {
        let (lat, lng) = self.fractional_change(previous);
        !(lat < threshold && lng < threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seoul() -> Bounds {
        Bounds::new(37.45, 37.55, 126.90, 127.10)
    }

    #[test]
    fn new_orders_corners() {
        let b = Bounds::new(37.55, 37.45, 127.10, 126.90);
        assert_eq!(b, seoul());
    }

    #[test]
    fn small_pan_is_not_significant() {
        let b = seoul();
        assert!(!b.panned(0.02, 0.03).differs_significantly(&b, 0.05));
        assert!(!b.differs_significantly(&b, 0.05));
    }

    #[test]
    fn pan_on_one_axis_is_significant() {
        let b = seoul();
        assert!(b.panned(0.0, 0.2).differs_significantly(&b, 0.05));
        assert!(b.panned(0.06, 0.0).differs_significantly(&b, 0.05));
    }

    #[test]
    fn zoom_is_significant() {
        let b = seoul();
        assert!(b.scaled(0.5).differs_significantly(&b, 0.05));
        assert!(b.scaled(2.0).differs_significantly(&b, 0.05));
        assert!(!b.scaled(1.04).differs_significantly(&b, 0.05));
    }

    #[test]
    fn degenerate_previous_always_differs() {
        let point = Bounds::new(37.5, 37.5, 127.0, 127.0);
        assert!(seoul().differs_significantly(&point, 0.05));
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let b = seoul();
        assert!(b.contains(GeoPoint { latitude: 37.45, longitude: 127.10 }));
        assert!(!b.contains(GeoPoint { latitude: 37.56, longitude: 127.0 }));
    }

    #[test]
    fn serializes_as_query_parameters() {
        let json = serde_json::to_value(seoul()).unwrap();
        assert_eq!(json["minLat"], 37.45);
        assert_eq!(json["maxLng"], 127.10);
    }
}
