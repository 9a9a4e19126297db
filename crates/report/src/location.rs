use foundation::geo::LatLng;

/// User input rejected before anything goes over the network.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    InvalidNumber,
    OutOfRange,
    MissingFields,
    MissingLocation,
}

impl ValidationFailure {
    /// Message shown to the user.
    pub fn status_text(&self) -> &'static str {
        match self {
            ValidationFailure::InvalidNumber => "Ingresa coordenadas válidas",
            ValidationFailure::OutOfRange => "Coordenadas fuera de rango válido",
            ValidationFailure::MissingFields => "Completa todos los campos obligatorios",
            ValidationFailure::MissingLocation => "Selecciona una ubicación para el reporte",
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFailure::InvalidNumber => write!(f, "coordinates are not numbers"),
            ValidationFailure::OutOfRange => write!(f, "coordinates out of range"),
            ValidationFailure::MissingFields => write!(f, "required report fields are empty"),
            ValidationFailure::MissingLocation => write!(f, "no report location selected"),
        }
    }
}

impl std::error::Error for ValidationFailure {}

/// Where a report happened. Always within lat [-90, 90], lng [-180, 180].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReportLocation(LatLng);

impl ReportLocation {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationFailure> {
        Self::from_lat_lng(LatLng::new(lat, lng))
    }

    pub fn from_lat_lng(p: LatLng) -> Result<Self, ValidationFailure> {
        if !p.lat.is_finite() || !p.lng.is_finite() {
            return Err(ValidationFailure::InvalidNumber);
        }
        if !p.in_range() {
            return Err(ValidationFailure::OutOfRange);
        }
        Ok(Self(p))
    }

    /// Parses manually typed coordinates.
    pub fn parse(lat: &str, lng: &str) -> Result<Self, ValidationFailure> {
        let number = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| ValidationFailure::InvalidNumber)
        };
        Self::new(number(lat)?, number(lng)?)
    }

    pub fn lat(&self) -> f64 {
        self.0.lat
    }

    pub fn lng(&self) -> f64 {
        self.0.lng
    }

    pub fn as_lat_lng(&self) -> LatLng {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_above_ninety_is_rejected() {
        assert_eq!(
            ReportLocation::new(95.0, 0.0),
            Err(ValidationFailure::OutOfRange)
        );
        assert_eq!(
            ReportLocation::parse("95", "-79.2"),
            Err(ValidationFailure::OutOfRange)
        );
    }

    #[test]
    fn valid_manual_entry_is_accepted() {
        let loc = ReportLocation::parse(" 10.5", "-79.2 ").unwrap();
        assert_eq!(loc.lat(), 10.5);
        assert_eq!(loc.lng(), -79.2);
    }

    #[test]
    fn non_numbers_are_rejected() {
        assert_eq!(
            ReportLocation::parse("", "1"),
            Err(ValidationFailure::InvalidNumber)
        );
        assert_eq!(
            ReportLocation::parse("abc", "1"),
            Err(ValidationFailure::InvalidNumber)
        );
        assert_eq!(
            ReportLocation::parse("NaN", "1"),
            Err(ValidationFailure::InvalidNumber)
        );
    }

    #[test]
    fn longitude_bounds() {
        assert!(ReportLocation::new(0.0, 180.0).is_ok());
        assert_eq!(
            ReportLocation::new(0.0, -180.5),
            Err(ValidationFailure::OutOfRange)
        );
    }
}
