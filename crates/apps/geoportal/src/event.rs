use foundation::bounds::GeoBounds;
use foundation::geo::LatLng;
use report::form::ReportForm;
use report::location::ValidationFailure;

use crate::geolocation::{GeolocationError, GeolocationOptions, Position};

/// Everything the user (or the host environment) can do to the geoportal.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Loads default layers and the neighborhood index.
    Start,
    ToggleLayer {
        id: String,
        visible: bool,
    },
    FeatureClicked {
        layer: String,
        index: usize,
    },
    SearchInput(String),
    SelectNeighborhood(String),
    MapClicked(LatLng),
    ChangeBasemap(String),
    StartPicking,
    RequestDeviceLocation,
    DeviceLocation(Result<Position, GeolocationError>),
    ManualCoordinates {
        lat: String,
        lng: String,
    },
    EditReport(ReportForm),
    SubmitReport,
}

/// What changed as a result of handling an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateTransition {
    Unchanged,
    Ready {
        layers: usize,
        neighborhoods: usize,
    },
    LayerShown {
        id: String,
        features: usize,
    },
    LayerHidden {
        id: String,
    },
    /// The layer is absent after a failed load.
    LayerFailed {
        id: String,
    },
    PopupOpened,
    SearchResults(Vec<String>),
    NeighborhoodFocused {
        name: String,
        bounds: Option<GeoBounds>,
    },
    DistancesShown {
        at: LatLng,
    },
    BasemapChanged(&'static str),
    PickingStarted,
    LocationSet(LatLng),
    LocationRejected(ValidationFailure),
    /// The host should query the device and answer with
    /// [`Event::DeviceLocation`].
    GeolocationRequested(GeolocationOptions),
    ReportAccepted,
    ReportInvalid(ValidationFailure),
    /// Rejected or not delivered; the form and location are kept.
    ReportKept,
    /// The operation failed; details are in the status slot.
    Failed,
}
