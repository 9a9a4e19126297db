use std::sync::Arc;
use std::time::Instant;

use backend::procedures::{self, NeighborhoodAnalysis};
use backend::DataService;
use foundation::geo::LatLng;
use foundation::handles::MarkerHandle;
use foundation::time::Time;
use layers::manager::{fetch_layer, Begin, LayerManager, LoadOutcome};
use layers::overlay::{display_value, format_meters, Popup};
use layers::registry::{LayerRegistry, REPORTS_LAYER};
use layers::surface::{MapSurface, Marker, MarkerKind};
use report::flow::{ReportFlow, SubmitOutcome};
use report::location::ReportLocation;
use runtime::status::{Severity, StatusMessage, StatusSlot};
use search::SearchIndex;
use tracing::{debug, info, warn};

use crate::basemap::{BasemapChange, BasemapSelection};
use crate::config::GeoportalConfig;
use crate::event::{Event, StateTransition};
use crate::geolocation::{GeolocationError, GeolocationOptions, Position};

/// Padding around a neighborhood when the view is fitted to it.
pub const NEIGHBORHOOD_PADDING_PX: u32 = 20;

/// Application state: every piece of mutable geoportal state lives here and
/// changes only through [`Geoportal::handle`].
pub struct Geoportal<S: MapSurface> {
    service: Arc<dyn DataService>,
    surface: S,
    layers: LayerManager,
    index: SearchIndex,
    report: ReportFlow,
    basemap: BasemapSelection,
    status: StatusSlot,
    geolocation: GeolocationOptions,
    distance_marker: Option<MarkerHandle>,
    started: Instant,
}

impl<S: MapSurface> Geoportal<S> {
    pub fn new(config: &GeoportalConfig, service: Arc<dyn DataService>, mut surface: S) -> Self {
        let basemap = BasemapSelection::default();
        surface.set_tile_source(basemap.current().tile_source());
        surface.set_view(config.initial_center, config.initial_zoom);
        Self {
            service,
            surface,
            layers: LayerManager::new(LayerRegistry::default())
                .with_feature_limit(config.feature_limit),
            index: SearchIndex::new(),
            report: ReportFlow::new(),
            basemap,
            status: StatusSlot::new(config.status_secs),
            geolocation: GeolocationOptions::default(),
            distance_marker: None,
            started: Instant::now(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn report(&self) -> &ReportFlow {
        &self.report
    }

    pub fn status(&self) -> &StatusSlot {
        &self.status
    }

    /// The status line the user currently sees, if it has not expired.
    pub fn visible_status(&self) -> Option<&StatusMessage> {
        self.status.visible(self.now())
    }

    fn now(&self) -> Time {
        Time(self.started.elapsed().as_secs_f64())
    }

    fn notify(&mut self, severity: Severity, text: impl Into<String>) {
        let now = self.now();
        self.status.show(severity, text, now);
    }

    pub async fn handle(&mut self, event: Event) -> StateTransition {
        debug!(?event, "handling event");
        match event {
            Event::Start => self.start().await,
            Event::ToggleLayer { id, visible } => self.toggle_layer(&id, visible).await,
            Event::FeatureClicked { layer, index } => {
                if self.layers.open_feature_popup(&mut self.surface, &layer, index) {
                    StateTransition::PopupOpened
                } else {
                    StateTransition::Unchanged
                }
            }
            Event::SearchInput(query) => StateTransition::SearchResults(
                self.index.query(&query).into_iter().map(str::to_string).collect(),
            ),
            Event::SelectNeighborhood(name) => self.select_neighborhood(name).await,
            Event::MapClicked(at) => {
                if self.report.is_picking() {
                    self.pick_location(at)
                } else {
                    self.show_distances(at).await
                }
            }
            Event::ChangeBasemap(id) => self.change_basemap(&id),
            Event::StartPicking => {
                self.report.start_picking(&mut self.surface);
                self.notify(
                    Severity::Warning,
                    "Haz clic en el mapa para seleccionar la ubicación del reporte",
                );
                StateTransition::PickingStarted
            }
            Event::RequestDeviceLocation => {
                self.notify(Severity::Warning, "Obteniendo ubicación actual...");
                StateTransition::GeolocationRequested(self.geolocation)
            }
            Event::DeviceLocation(result) => self.device_location(result),
            Event::ManualCoordinates { lat, lng } => {
                let result = self.report.set_manual(&mut self.surface, &lat, &lng);
                self.location_result(result, "Coordenadas fijadas manualmente")
            }
            Event::EditReport(form) => {
                *self.report.form_mut() = form;
                StateTransition::Unchanged
            }
            Event::SubmitReport => self.submit_report().await,
        }
    }

    async fn start(&mut self) -> StateTransition {
        let outcomes = self
            .layers
            .load_default_layers(self.service.as_ref(), &mut self.surface)
            .await;
        for (_, outcome) in &outcomes {
            if let Some((severity, text)) = outcome.status() {
                self.notify(severity, text);
            }
        }

        match search::preload_index(self.service.as_ref()).await {
            Ok(index) => self.index = index,
            Err(e) => warn!("neighborhood index unavailable: {e}"),
        }

        let layers = outcomes.iter().filter(|(_, o)| o.is_attached()).count();
        info!(layers, neighborhoods = self.index.len(), "geoportal ready");
        self.notify(Severity::Success, "Geoportal cargado correctamente");
        StateTransition::Ready {
            layers,
            neighborhoods: self.index.len(),
        }
    }

    async fn toggle_layer(&mut self, id: &str, visible: bool) -> StateTransition {
        if !visible {
            return match self.layers.unload_layer(&mut self.surface, id) {
                LoadOutcome::Unloaded => StateTransition::LayerHidden { id: id.to_string() },
                _ => StateTransition::Unchanged,
            };
        }

        let pending = match self.layers.begin_load(id) {
            Begin::Start(pending) => pending,
            Begin::Skip(outcome) => return self.layer_transition(id, outcome),
        };
        let loading = format!("Cargando {}...", pending.descriptor().display_name);
        self.notify(Severity::Warning, loading);
        let result = fetch_layer(
            self.service.as_ref(),
            pending.descriptor(),
            self.layers.feature_limit(),
        )
        .await;
        let outcome = self.layers.complete_load(&mut self.surface, pending, result);
        self.layer_transition(id, outcome)
    }

    fn layer_transition(&mut self, id: &str, outcome: LoadOutcome) -> StateTransition {
        if let Some((severity, text)) = outcome.status() {
            self.notify(severity, text);
        }
        match outcome {
            LoadOutcome::Attached { rendered, .. } => StateTransition::LayerShown {
                id: id.to_string(),
                features: rendered,
            },
            LoadOutcome::Failed { .. } => StateTransition::LayerFailed { id: id.to_string() },
            _ => StateTransition::Unchanged,
        }
    }

    async fn select_neighborhood(&mut self, name: String) -> StateTransition {
        self.notify(Severity::Warning, "Localizando barrio...");
        let bounds = match search::locate_neighborhood(self.service.as_ref(), &name).await {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!(barrio = %name, "neighborhood lookup failed: {e}");
                self.notify(Severity::Error, "No se pudo localizar el barrio");
                return StateTransition::Failed;
            }
        };
        if let Some(b) = bounds {
            self.surface.fit_bounds(b, NEIGHBORHOOD_PADDING_PX);
        }

        match procedures::analyze_neighborhood(self.service.as_ref(), &name).await {
            Ok(analysis) if !analysis.is_error() => {
                self.notify(Severity::Success, analysis_summary(&analysis));
            }
            Ok(_) => debug!(barrio = %name, "analysis reported an error"),
            Err(e) => debug!(barrio = %name, "analysis unavailable: {e}"),
        }

        StateTransition::NeighborhoodFocused { name, bounds }
    }

    async fn show_distances(&mut self, at: LatLng) -> StateTransition {
        self.notify(Severity::Warning, "Calculando distancias...");
        let distances = match procedures::calculate_distances(self.service.as_ref(), at).await {
            Ok(d) => d,
            Err(e) => {
                warn!(%at, "distance query failed: {e}");
                self.notify(Severity::Error, "Error calculando distancias");
                return StateTransition::Failed;
            }
        };

        let popup = Popup::new(at)
            .titled("Distancias a Servicios")
            .row("Bomberos", format_meters(&distances.bomberos))
            .row("Policía", format_meters(&distances.policia))
            .row("Salud", format_meters(&distances.salud));
        if let Some(previous) = self.distance_marker.take() {
            self.surface.remove_marker(previous);
        }
        let handle = self.surface.place_marker(Marker {
            position: at,
            kind: MarkerKind::Distance,
            tooltip: None,
            popup: Some(popup.clone()),
        });
        self.distance_marker = Some(handle);
        self.surface.open_popup(popup);

        self.notify(Severity::Success, "Distancias calculadas");
        StateTransition::DistancesShown { at }
    }

    fn change_basemap(&mut self, id: &str) -> StateTransition {
        match self.basemap.select(id) {
            BasemapChange::Switched(basemap) => {
                self.surface.set_tile_source(basemap.tile_source());
                self.notify(Severity::Info, format!("Cambiado a: {}", basemap.name));
                StateTransition::BasemapChanged(basemap.id)
            }
            BasemapChange::Unchanged => StateTransition::Unchanged,
            BasemapChange::Unknown => {
                warn!(basemap = id, "unknown basemap");
                StateTransition::Unchanged
            }
        }
    }

    fn pick_location(&mut self, at: LatLng) -> StateTransition {
        let result = self.report.pick(&mut self.surface, at);
        self.location_result(result, "Ubicación seleccionada en el mapa")
    }

    fn device_location(&mut self, result: Result<Position, GeolocationError>) -> StateTransition {
        match result {
            Ok(position) => {
                let result = self.report.set_from_device(&mut self.surface, position.coords);
                self.location_result(result, "Ubicación actual obtenida")
            }
            Err(e) => {
                warn!("{e}");
                self.notify(Severity::Error, e.status_text());
                StateTransition::Failed
            }
        }
    }

    fn location_result(
        &mut self,
        result: Result<ReportLocation, report::location::ValidationFailure>,
        success: &str,
    ) -> StateTransition {
        match result {
            Ok(location) => {
                self.notify(Severity::Success, success);
                StateTransition::LocationSet(location.as_lat_lng())
            }
            Err(failure) => {
                self.notify(Severity::Error, failure.status_text());
                StateTransition::LocationRejected(failure)
            }
        }
    }

    async fn submit_report(&mut self) -> StateTransition {
        if let Err(failure) = self.report.form().validate(self.report.location()) {
            self.notify(Severity::Error, failure.status_text());
            return StateTransition::ReportInvalid(failure);
        }

        self.notify(Severity::Warning, "Enviando reporte...");
        let outcome = self
            .report
            .submit(self.service.as_ref(), &mut self.surface)
            .await;
        let (severity, text) = outcome.status();
        self.notify(severity, text);

        match outcome {
            SubmitOutcome::Accepted(_) => {
                if self.layers.is_loaded(REPORTS_LAYER) {
                    let reload = self
                        .layers
                        .reload_layer(self.service.as_ref(), &mut self.surface, REPORTS_LAYER)
                        .await;
                    if let Some((severity, text)) = reload.status() {
                        self.notify(severity, text);
                    }
                }
                StateTransition::ReportAccepted
            }
            SubmitOutcome::Invalid(failure) => StateTransition::ReportInvalid(failure),
            SubmitOutcome::Rejected | SubmitOutcome::Failed(_) => StateTransition::ReportKept,
        }
    }
}

fn analysis_summary(analysis: &NeighborhoodAnalysis) -> String {
    format!(
        "Alcantarillado: {} m · Bomberos: {} · Policía: {} · Salud: {}",
        display_value(&analysis.longitud_alcantarillado),
        display_value(&analysis.bomberos),
        display_value(&analysis.policia),
        display_value(&analysis.salud),
    )
}
