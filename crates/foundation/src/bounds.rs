use crate::geo::LatLng;

/// Axis-aligned geographic bounds (south-west / north-east corners).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        GeoBounds {
            south_west,
            north_east,
        }
    }

    pub fn from_point(p: LatLng) -> Self {
        GeoBounds::new(p, p)
    }

    /// Smallest bounds covering every point; `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut bounds = GeoBounds::from_point(iter.next()?);
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

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::geo::LatLng;

    #[test]
    fn empty_iterator_has_no_bounds() {
        assert!(GeoBounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn center_of_box() {
        let b = GeoBounds::from_points([
            LatLng::new(-4.0, -79.3),
            LatLng::new(-3.9, -79.1),
            LatLng::new(-3.95, -79.2),
        ])
        .unwrap();
        let c = b.center();
        assert!((c.lat - -3.95).abs() < 1e-9);
        assert!((c.lng - -79.2).abs() < 1e-9);
        assert_eq!(b.south_west, LatLng::new(-4.0, -79.3));
        assert_eq!(b.north_east, LatLng::new(-3.9, -79.1));
    }
}
