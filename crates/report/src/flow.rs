use backend::procedures::{self, Acknowledgement};
use backend::{DataService, ServiceError};
use foundation::geo::LatLng;
use foundation::handles::MarkerHandle;
use layers::surface::{MapSurface, Marker, MarkerKind};
use runtime::status::Severity;
use tracing::{info, warn};

use crate::form::ReportForm;
use crate::location::{ReportLocation, ValidationFailure};

/// Zoom used when centering on a freshly set report location.
pub const LOCATION_ZOOM: u8 = 16;

pub const REPORT_MARKER_TOOLTIP: &str = "Ubicación del reporte";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportPhase {
    Idle,
    Picking,
    LocationSet,
    Submitting,
}

/// Location and the marker showing it. Stored as one value so neither can
/// exist without the other.
#[derive(Debug)]
struct PlacedLocation {
    location: ReportLocation,
    marker: MarkerHandle,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Rejected locally; nothing was sent.
    Invalid(ValidationFailure),
    /// The backend took the report (`Success`, or `Unknown` taken as success).
    Accepted(Acknowledgement),
    /// The backend answered `success: false`.
    Rejected,
    Failed(ServiceError),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }

    pub fn status(&self) -> (Severity, String) {
        match self {
            SubmitOutcome::Invalid(v) => (Severity::Error, v.status_text().to_string()),
            SubmitOutcome::Accepted(_) => {
                (Severity::Success, "Reporte enviado correctamente".to_string())
            }
            SubmitOutcome::Rejected => (Severity::Error, "No se pudo enviar el reporte".to_string()),
            SubmitOutcome::Failed(_) => (
                Severity::Error,
                "Error de conexión al enviar reporte".to_string(),
            ),
        }
    }
}

/// Citizen report state machine: `Idle → Picking → LocationSet → Submitting → Idle`.
#[derive(Debug, Default)]
pub struct ReportFlow {
    form: ReportForm,
    placed: Option<PlacedLocation>,
    picking: bool,
    submitting: bool,
}

impl ReportFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ReportPhase {
        if self.submitting {
            ReportPhase::Submitting
        } else if self.picking {
            ReportPhase::Picking
        } else if self.placed.is_some() {
            ReportPhase::LocationSet
        } else {
            ReportPhase::Idle
        }
    }

    pub fn form(&self) -> &ReportForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ReportForm {
        &mut self.form
    }

    pub fn location(&self) -> Option<ReportLocation> {
        self.placed.as_ref().map(|p| p.location)
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    pub fn start_picking(&mut self, surface: &mut dyn MapSurface) {
        self.picking = true;
        surface.set_picking(true);
    }

    pub fn stop_picking(&mut self, surface: &mut dyn MapSurface) {
        self.picking = false;
        surface.set_picking(false);
    }

    /// Consumes the map click that ends picking mode.
    pub fn pick(
        &mut self,
        surface: &mut dyn MapSurface,
        at: LatLng,
    ) -> Result<ReportLocation, ValidationFailure> {
        self.stop_picking(surface);
        let location = ReportLocation::from_lat_lng(at)?;
        self.place(surface, location);
        Ok(location)
    }

    /// Location from a typed pair of coordinates; the view centers on it.
    pub fn set_manual(
        &mut self,
        surface: &mut dyn MapSurface,
        lat: &str,
        lng: &str,
    ) -> Result<ReportLocation, ValidationFailure> {
        let location = ReportLocation::parse(lat, lng)?;
        self.place(surface, location);
        surface.set_view(location.as_lat_lng(), LOCATION_ZOOM);
        Ok(location)
    }

    /// Location reported by the device; the view centers on it.
    pub fn set_from_device(
        &mut self,
        surface: &mut dyn MapSurface,
        at: LatLng,
    ) -> Result<ReportLocation, ValidationFailure> {
        let location = ReportLocation::from_lat_lng(at)?;
        self.place(surface, location);
        surface.set_view(location.as_lat_lng(), LOCATION_ZOOM);
        Ok(location)
    }

    /// Replaces location and marker together.
    fn place(&mut self, surface: &mut dyn MapSurface, location: ReportLocation) {
        if let Some(previous) = self.placed.take() {
            surface.remove_marker(previous.marker);
        }
        let marker = surface.place_marker(Marker {
            position: location.as_lat_lng(),
            kind: MarkerKind::Report,
            tooltip: Some(REPORT_MARKER_TOOLTIP.to_string()),
            popup: None,
        });
        self.placed = Some(PlacedLocation { location, marker });
    }

    pub fn clear_location(&mut self, surface: &mut dyn MapSurface) {
        if let Some(previous) = self.placed.take() {
            surface.remove_marker(previous.marker);
        }
    }

    /// Empties the form, drops the location and leaves picking mode.
    pub fn reset(&mut self, surface: &mut dyn MapSurface) {
        self.form.clear();
        self.clear_location(surface);
        self.stop_picking(surface);
    }

    /// Validates and sends the report.
    ///
    /// Invalid input never reaches the service. On acceptance the flow
    /// resets; on rejection or transport failure the form and location stay
    /// as they were so the user can retry.
    pub async fn submit(
        &mut self,
        service: &dyn DataService,
        surface: &mut dyn MapSurface,
    ) -> SubmitOutcome {
        let submission = match self.form.validate(self.location()) {
            Ok(s) => s,
            Err(v) => return SubmitOutcome::Invalid(v),
        };

        self.submitting = true;
        let result = procedures::insert_report(service, &submission).await;
        self.submitting = false;

        match result {
            Ok(ack @ Acknowledgement::Success) => {
                info!("report submitted");
                self.reset(surface);
                SubmitOutcome::Accepted(ack)
            }
            Ok(ack @ Acknowledgement::Unknown) => {
                warn!("report response carried no success flag; treating as accepted");
                self.reset(surface);
                SubmitOutcome::Accepted(ack)
            }
            Ok(Acknowledgement::Rejected) => {
                warn!("backend rejected the report");
                SubmitOutcome::Rejected
            }
            Err(e) => {
                warn!("report submission failed: {e}");
                SubmitOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::MemoryDataService;
    use backend::procedures::INSERT_REPORT;
    use layers::surface::HeadlessSurface;
    use serde_json::json;

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(LatLng::new(-4.0, -79.2), 13)
    }

    fn filled(flow: &mut ReportFlow) {
        *flow.form_mut() = ReportForm::new("Ana", "bache", "hueco en la vía");
    }

    #[test]
    fn picking_then_click_sets_location() {
        let mut map = surface();
        let mut flow = ReportFlow::new();
        assert_eq!(flow.phase(), ReportPhase::Idle);
        flow.start_picking(&mut map);
        assert_eq!(flow.phase(), ReportPhase::Picking);
        assert!(map.is_picking());

        flow.pick(&mut map, LatLng::new(-4.01, -79.21)).unwrap();
        assert_eq!(flow.phase(), ReportPhase::LocationSet);
        assert!(!map.is_picking());
        let markers = map.markers_of(MarkerKind::Report);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].position, LatLng::new(-4.01, -79.21));
    }

    #[test]
    fn new_location_replaces_marker() {
        let mut map = surface();
        let mut flow = ReportFlow::new();
        flow.set_manual(&mut map, "10.5", "-79.2").unwrap();
        flow.set_from_device(&mut map, LatLng::new(-4.0, -79.0)).unwrap();
        let markers = map.markers_of(MarkerKind::Report);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].position, LatLng::new(-4.0, -79.0));
        assert_eq!(flow.location().unwrap().lng(), -79.0);
        assert_eq!(map.viewport().zoom, LOCATION_ZOOM);
    }

    #[test]
    fn rejected_manual_entry_keeps_previous_location() {
        let mut map = surface();
        let mut flow = ReportFlow::new();
        flow.set_manual(&mut map, "10.5", "-79.2").unwrap();
        assert_eq!(
            flow.set_manual(&mut map, "95", "0"),
            Err(ValidationFailure::OutOfRange)
        );
        assert_eq!(flow.location().unwrap().lat(), 10.5);
        assert_eq!(map.markers_of(MarkerKind::Report).len(), 1);
    }

    #[test]
    fn clearing_removes_marker() {
        let mut map = surface();
        let mut flow = ReportFlow::new();
        flow.set_manual(&mut map, "1", "1").unwrap();
        flow.clear_location(&mut map);
        assert!(flow.location().is_none());
        assert!(map.markers_of(MarkerKind::Report).is_empty());
    }

    #[tokio::test]
    async fn incomplete_report_never_calls_the_backend() {
        let svc = MemoryDataService::new().with_procedure(INSERT_REPORT, json!({"success": true}));
        let mut map = surface();
        let mut flow = ReportFlow::new();

        filled(&mut flow);
        let outcome = flow.submit(&svc, &mut map).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Invalid(ValidationFailure::MissingLocation)
        ));

        flow.form_mut().comments.clear();
        flow.set_manual(&mut map, "1", "1").unwrap();
        let outcome = flow.submit(&svc, &mut map).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Invalid(ValidationFailure::MissingFields)
        ));
        assert!(svc.requests().await.is_empty());
    }

    #[tokio::test]
    async fn accepted_report_resets_everything() {
        let svc = MemoryDataService::new().with_procedure(INSERT_REPORT, json!({"success": true}));
        let mut map = surface();
        let mut flow = ReportFlow::new();
        filled(&mut flow);
        flow.start_picking(&mut map);
        flow.pick(&mut map, LatLng::new(-4.0, -79.2)).unwrap();

        let outcome = flow.submit(&svc, &mut map).await;
        assert!(outcome.is_accepted());
        assert_eq!(flow.phase(), ReportPhase::Idle);
        assert_eq!(flow.form(), &ReportForm::default());
        assert!(map.markers_of(MarkerKind::Report).is_empty());
        assert_eq!(svc.call_count(INSERT_REPORT).await, 1);
    }

    #[tokio::test]
    async fn rejection_preserves_location_and_form() {
        let svc = MemoryDataService::new().with_procedure(INSERT_REPORT, json!({"success": false}));
        let mut map = surface();
        let mut flow = ReportFlow::new();
        filled(&mut flow);
        flow.set_manual(&mut map, "10.5", "-79.2").unwrap();

        let outcome = flow.submit(&svc, &mut map).await;
        assert!(matches!(outcome, SubmitOutcome::Rejected));
        assert_eq!(
            outcome.status(),
            (Severity::Error, "No se pudo enviar el reporte".to_string())
        );
        assert_eq!(flow.phase(), ReportPhase::LocationSet);
        assert_eq!(flow.location().unwrap().lat(), 10.5);
        assert_eq!(flow.form().name, "Ana");
        assert_eq!(map.markers_of(MarkerKind::Report).len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_preserves_state() {
        let svc = MemoryDataService::new().with_failing_procedure(INSERT_REPORT, 503);
        let mut map = surface();
        let mut flow = ReportFlow::new();
        filled(&mut flow);
        flow.set_manual(&mut map, "1", "2").unwrap();

        let outcome = flow.submit(&svc, &mut map).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(ServiceError::Status(503))));
        assert_eq!(flow.phase(), ReportPhase::LocationSet);
        assert_eq!(flow.form().kind, "bache");
    }

    #[tokio::test]
    async fn missing_success_flag_is_accepted() {
        let svc = MemoryDataService::new().with_procedure(INSERT_REPORT, json!({"id": 12}));
        let mut map = surface();
        let mut flow = ReportFlow::new();
        filled(&mut flow);
        flow.set_manual(&mut map, "1", "2").unwrap();

        let outcome = flow.submit(&svc, &mut map).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Accepted(Acknowledgement::Unknown)
        ));
        assert!(flow.location().is_none());
    }
}
