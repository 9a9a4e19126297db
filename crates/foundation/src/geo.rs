/// Geographic position in degrees (WGS84).
///
/// No range checks happen here; callers that accept user input validate
/// before building one (see `report::ReportLocation`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// GeoJSON positions are `[x, y]`, i.e. longitude first.
    pub fn from_lng_lat(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] if lat.is_finite() && lng.is_finite() => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::LatLng;

    #[test]
    fn reads_geojson_order() {
        let p = LatLng::from_lng_lat(&[-79.2, -4.0]).unwrap();
        assert_eq!(p, LatLng::new(-4.0, -79.2));
    }

    #[test]
    fn rejects_short_or_non_finite_positions() {
        assert!(LatLng::from_lng_lat(&[1.0]).is_none());
        assert!(LatLng::from_lng_lat(&[f64::NAN, 0.0]).is_none());
    }

    #[test]
    fn range_check_is_inclusive() {
        assert!(LatLng::new(90.0, -180.0).in_range());
        assert!(!LatLng::new(90.5, 0.0).in_range());
        assert!(!LatLng::new(0.0, 180.01).in_range());
    }

    #[test]
    fn displays_six_decimals() {
        assert_eq!(LatLng::new(10.5, -79.2).to_string(), "10.500000, -79.200000");
    }
}
