use serde::{Deserialize, Serialize};

use crate::latlng::LatLng;

/// Axis-aligned geographic bounds, south-west to north-east corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Builds bounds from two arbitrary corners.
    pub fn new(a: LatLng, b: LatLng) -> Self {
        Self {
            south_west: LatLng::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: LatLng::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Smallest bounds enclosing every point, `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    /// Inclusive on every edge, matching Leaflet's `LatLngBounds.contains`.
    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) * 0.5,
            (self.south_west.lng + self.north_east.lng) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LatLngBounds;
    use crate::latlng::LatLng;

    #[test]
    fn new_normalizes_corners() {
        let b = LatLngBounds::new(LatLng::new(10.0, -5.0), LatLng::new(-10.0, 5.0));
        assert_eq!(b.south_west, LatLng::new(-10.0, -5.0));
        assert_eq!(b.north_east, LatLng::new(10.0, 5.0));
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let b = LatLngBounds::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
        assert!(b.contains(LatLng::new(0.0, 10.0)));
        assert!(b.contains(LatLng::new(5.0, 5.0)));
        assert!(!b.contains(LatLng::new(10.000_001, 5.0)));
        assert!(!b.contains(LatLng::new(5.0, -0.1)));
    }

    #[test]
    fn from_points_encloses_all() {
        let b = LatLngBounds::from_points([
            LatLng::new(1.0, 2.0),
            LatLng::new(-3.0, 4.0),
            LatLng::new(2.0, -6.0),
        ])
        .expect("non-empty");
        assert_eq!(b.south_west, LatLng::new(-3.0, -6.0));
        assert_eq!(b.north_east, LatLng::new(2.0, 4.0));
        assert_eq!(b.center(), LatLng::new(-0.5, -1.0));
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(LatLngBounds::from_points(std::iter::empty()).is_none());
    }
}
