use std::time::Duration;

use foundation::geo::LatLng;

/// Options sent with every device-position request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the device may answer with.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Position {
    pub coords: LatLng,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    /// The host has no positioning capability at all.
    Unavailable,
    PermissionDenied,
    Timeout,
    Other(String),
}

impl GeolocationError {
    pub fn status_text(&self) -> &'static str {
        match self {
            GeolocationError::Unavailable => "Geolocalización no disponible",
            _ => "No se pudo obtener la ubicación actual",
        }
    }
}

impl std::fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeolocationError::Unavailable => write!(f, "geolocation unavailable"),
            GeolocationError::PermissionDenied => write!(f, "geolocation permission denied"),
            GeolocationError::Timeout => write!(f, "geolocation timed out"),
            GeolocationError::Other(msg) => write!(f, "geolocation failed: {msg}"),
        }
    }
}

impl std::error::Error for GeolocationError {}
