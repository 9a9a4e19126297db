use std::collections::BTreeMap;

use backend::{DataService, ServiceError, TableQuery};
use foundation::handles::OverlayHandle;
use runtime::gate::{Ticket, TransitionGate};
use runtime::status::Severity;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::feature::{ParsedFeatures, parse_feature_collection, parse_rows};
use crate::overlay::Overlay;
use crate::registry::{LayerDescriptor, LayerRegistry};
use crate::surface::MapSurface;

/// Row cap for direct table reads.
pub const DEFAULT_FEATURE_LIMIT: u32 = 2000;

#[derive(Debug)]
pub enum LayerError {
    UnknownLayer(String),
    Service(ServiceError),
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::UnknownLayer(id) => write!(f, "unknown layer {id:?}"),
            LayerError::Service(e) => write!(f, "data service error: {e}"),
        }
    }
}

impl std::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayerError::Service(e) => Some(e),
            LayerError::UnknownLayer(_) => None,
        }
    }
}

/// A loaded layer. Owns the handle of the overlay it attached.
#[derive(Debug)]
pub struct LayerState {
    id: String,
    overlay: OverlayHandle,
}

impl LayerState {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn overlay(&self) -> &OverlayHandle {
        &self.overlay
    }
}

/// A load that has been admitted by the gate and awaits its data.
#[derive(Debug)]
pub struct PendingLoad {
    descriptor: LayerDescriptor,
    ticket: Ticket,
}

impl PendingLoad {
    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }
}

#[derive(Debug)]
pub enum Begin {
    Start(PendingLoad),
    Skip(LoadOutcome),
}

#[derive(Debug)]
pub enum LoadOutcome {
    Attached {
        name: String,
        received: usize,
        rendered: usize,
    },
    AlreadyLoaded,
    /// A load for the same layer is still waiting on the backend.
    InFlight,
    /// The response arrived after the layer was toggled again; dropped.
    Stale,
    Unloaded,
    NotLoaded,
    Failed {
        name: String,
        error: LayerError,
    },
}

impl LoadOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, LoadOutcome::Attached { .. })
    }

    /// Status line to surface for this outcome, if any.
    pub fn status(&self) -> Option<(Severity, String)> {
        match self {
            LoadOutcome::Attached { name, received, .. } => {
                Some((Severity::Success, format!("{name}: {received} elementos")))
            }
            LoadOutcome::Failed {
                error: LayerError::UnknownLayer(id),
                ..
            } => Some((Severity::Error, format!("Capa desconocida: {id}"))),
            LoadOutcome::Failed { name, .. } => {
                Some((Severity::Error, format!("Error cargando {name}")))
            }
            _ => None,
        }
    }
}

/// Reads a layer's features from the backend: a procedure call for
/// procedural layers, a capped table read otherwise.
pub async fn fetch_layer(
    service: &dyn DataService,
    descriptor: &LayerDescriptor,
    limit: u32,
) -> Result<ParsedFeatures, ServiceError> {
    match &descriptor.procedure {
        Some(procedure) => {
            let reply = service.call(procedure, json!({})).await?;
            Ok(parse_feature_collection(&reply))
        }
        None => {
            let rows = service
                .select(&descriptor.id, &TableQuery::all().limit(limit))
                .await?;
            Ok(parse_rows(&rows))
        }
    }
}

/// Owns the mapping from layer id to attached overlay.
///
/// Invariants:
/// - at most one `LayerState` (and so one overlay) per layer id;
/// - a response is committed only if its ticket is still current, so a late
///   reply for a layer toggled off in the meantime never reaches the surface.
#[derive(Debug)]
pub struct LayerManager {
    registry: LayerRegistry,
    states: BTreeMap<String, LayerState>,
    gate: TransitionGate<String>,
    feature_limit: u32,
}

impl LayerManager {
    pub fn new(registry: LayerRegistry) -> Self {
        Self {
            registry,
            states: BTreeMap::new(),
            gate: TransitionGate::new(),
            feature_limit: DEFAULT_FEATURE_LIMIT,
        }
    }

    pub fn with_feature_limit(mut self, limit: u32) -> Self {
        self.feature_limit = limit;
        self
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn feature_limit(&self) -> u32 {
        self.feature_limit
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.gate.is_in_flight(&id.to_string())
    }

    pub fn state(&self, id: &str) -> Option<&LayerState> {
        self.states.get(id)
    }

    pub fn loaded_ids(&self) -> Vec<&str> {
        self.states.keys().map(String::as_str).collect()
    }

    /// Admits a load for `id`, or says why none is needed.
    pub fn begin_load(&mut self, id: &str) -> Begin {
        let Some(descriptor) = self.registry.get(id) else {
            return Begin::Skip(LoadOutcome::Failed {
                name: id.to_string(),
                error: LayerError::UnknownLayer(id.to_string()),
            });
        };
        if self.states.contains_key(id) {
            return Begin::Skip(LoadOutcome::AlreadyLoaded);
        }
        match self.gate.begin(&id.to_string()) {
            Some(ticket) => Begin::Start(PendingLoad {
                descriptor: descriptor.clone(),
                ticket,
            }),
            None => Begin::Skip(LoadOutcome::InFlight),
        }
    }

    /// Commits (or discards) the result of a load started with `begin_load`.
    pub fn complete_load(
        &mut self,
        surface: &mut dyn MapSurface,
        pending: PendingLoad,
        result: Result<ParsedFeatures, ServiceError>,
    ) -> LoadOutcome {
        let PendingLoad { descriptor, ticket } = pending;
        let id = descriptor.id.clone();
        if !self.gate.finish(&id, ticket) {
            debug!(layer = %id, "discarding late response");
            return LoadOutcome::Stale;
        }

        let parsed = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(layer = %id, "layer load failed: {e}");
                self.gate.request(&id, false);
                return LoadOutcome::Failed {
                    name: descriptor.display_name,
                    error: LayerError::Service(e),
                };
            }
        };

        if parsed.skipped > 0 {
            debug!(layer = %id, skipped = parsed.skipped, "malformed features skipped");
        }

        if let Some(previous) = self.states.remove(&id) {
            surface.detach_overlay(previous.overlay);
        }
        let overlay = Overlay::build(&descriptor, parsed.features);
        let rendered = overlay.len();
        let handle = surface.attach_overlay(overlay);
        self.states.insert(
            id.clone(),
            LayerState {
                id: id.clone(),
                overlay: handle,
            },
        );
        info!(layer = %id, received = parsed.received, rendered, "layer attached");

        LoadOutcome::Attached {
            name: descriptor.display_name,
            received: parsed.received,
            rendered,
        }
    }

    pub async fn load_layer(
        &mut self,
        service: &dyn DataService,
        surface: &mut dyn MapSurface,
        id: &str,
    ) -> LoadOutcome {
        let pending = match self.begin_load(id) {
            Begin::Start(pending) => pending,
            Begin::Skip(outcome) => return outcome,
        };
        let result = fetch_layer(service, pending.descriptor(), self.feature_limit).await;
        self.complete_load(surface, pending, result)
    }

    /// Detaches `id`'s overlay. Also invalidates any load still in flight.
    pub fn unload_layer(&mut self, surface: &mut dyn MapSurface, id: &str) -> LoadOutcome {
        self.gate.request(&id.to_string(), false);
        match self.states.remove(id) {
            Some(state) => {
                surface.detach_overlay(state.overlay);
                debug!(layer = %id, "layer detached");
                LoadOutcome::Unloaded
            }
            None => LoadOutcome::NotLoaded,
        }
    }

    pub async fn set_layer_visible(
        &mut self,
        service: &dyn DataService,
        surface: &mut dyn MapSurface,
        id: &str,
        visible: bool,
    ) -> LoadOutcome {
        if visible {
            self.load_layer(service, surface, id).await
        } else {
            self.unload_layer(surface, id)
        }
    }

    pub async fn reload_layer(
        &mut self,
        service: &dyn DataService,
        surface: &mut dyn MapSurface,
        id: &str,
    ) -> LoadOutcome {
        self.unload_layer(surface, id);
        self.load_layer(service, surface, id).await
    }

    /// Loads every default-active layer, one after another.
    pub async fn load_default_layers(
        &mut self,
        service: &dyn DataService,
        surface: &mut dyn MapSurface,
    ) -> Vec<(String, LoadOutcome)> {
        let ids: Vec<String> = self.registry.defaults().map(|l| l.id.clone()).collect();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.load_layer(service, surface, &id).await;
            out.push((id, outcome));
        }
        out
    }

    /// Opens the popup of item `index` in layer `id`. Returns `false` when
    /// the layer is not loaded or has no such item.
    pub fn open_feature_popup(&self, surface: &mut dyn MapSurface, id: &str, index: usize) -> bool {
        let Some(state) = self.states.get(id) else {
            return false;
        };
        let Some(popup) = surface
            .overlay(&state.overlay)
            .and_then(|o| o.popup(index))
            .cloned()
        else {
            return false;
        };
        surface.open_popup(popup);
        true
    }
}
