use std::collections::BTreeMap;

use foundation::bounds::GeoBounds;
use foundation::geo::LatLng;
use foundation::handles::{MarkerHandle, OverlayHandle};

use crate::overlay::{Overlay, Popup};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// Location chosen for a citizen report.
    Report,
    /// Result of a distance query.
    Distance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub kind: MarkerKind,
    pub tooltip: Option<String>,
    pub popup: Option<Popup>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

/// Tile basemap currently shown under the overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub url_template: String,
    pub attribution: String,
}

/// The rendering surface overlays and markers are attached to.
///
/// Only the layer manager and the report flow attach or detach things here.
pub trait MapSurface {
    fn attach_overlay(&mut self, overlay: Overlay) -> OverlayHandle;

    /// Removes the overlay; consumes the handle so it cannot be detached twice.
    fn detach_overlay(&mut self, handle: OverlayHandle) -> Option<Overlay>;

    fn overlay(&self, handle: &OverlayHandle) -> Option<&Overlay>;

    fn place_marker(&mut self, marker: Marker) -> MarkerHandle;

    fn remove_marker(&mut self, handle: MarkerHandle) -> Option<Marker>;

    fn open_popup(&mut self, popup: Popup);

    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: u32);

    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Toggles the visual "pick a location" affordance.
    fn set_picking(&mut self, picking: bool);

    fn set_tile_source(&mut self, source: TileSource);
}

/// In-memory surface: keeps everything it is given so callers (tests, the
/// CLI) can inspect it.
#[derive(Debug)]
pub struct HeadlessSurface {
    next_id: u64,
    overlays: BTreeMap<u64, Overlay>,
    markers: BTreeMap<u64, Marker>,
    popup: Option<Popup>,
    viewport: Viewport,
    fitted: Option<(GeoBounds, u32)>,
    picking: bool,
    tile_source: Option<TileSource>,
}

impl HeadlessSurface {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            next_id: 1,
            overlays: BTreeMap::new(),
            markers: BTreeMap::new(),
            popup: None,
            viewport: Viewport { center, zoom },
            fitted: None,
            picking: false,
            tile_source: None,
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.values()
    }

    /// Number of attached overlays belonging to `layer_id`.
    pub fn overlay_count(&self, layer_id: &str) -> usize {
        self.overlays
            .values()
            .filter(|o| o.layer_id == layer_id)
            .count()
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn markers_of(&self, kind: MarkerKind) -> Vec<&Marker> {
        self.markers.values().filter(|m| m.kind == kind).collect()
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn fitted_bounds(&self) -> Option<(GeoBounds, u32)> {
        self.fitted
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    pub fn tile_source(&self) -> Option<&TileSource> {
        self.tile_source.as_ref()
    }
}

impl MapSurface for HeadlessSurface {
    fn attach_overlay(&mut self, overlay: Overlay) -> OverlayHandle {
        let id = self.allocate();
        self.overlays.insert(id, overlay);
        OverlayHandle::new(id)
    }

    fn detach_overlay(&mut self, handle: OverlayHandle) -> Option<Overlay> {
        self.overlays.remove(&handle.raw())
    }

    fn overlay(&self, handle: &OverlayHandle) -> Option<&Overlay> {
        self.overlays.get(&handle.raw())
    }

    fn place_marker(&mut self, marker: Marker) -> MarkerHandle {
        let id = self.allocate();
        self.markers.insert(id, marker);
        MarkerHandle::new(id)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) -> Option<Marker> {
        self.markers.remove(&handle.raw())
    }

    fn open_popup(&mut self, popup: Popup) {
        self.popup = Some(popup);
    }

    fn fit_bounds(&mut self, bounds: GeoBounds, padding_px: u32) {
        self.viewport.center = bounds.center();
        self.fitted = Some((bounds, padding_px));
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.viewport = Viewport { center, zoom };
    }

    fn set_picking(&mut self, picking: bool) {
        self.picking = picking;
    }

    fn set_tile_source(&mut self, source: TileSource) {
        self.tile_source = Some(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_overlay(id: &str) -> Overlay {
        Overlay {
            layer_id: id.to_string(),
            items: Vec::new(),
        }
    }

    #[test]
    fn attach_then_detach() {
        let mut s = HeadlessSurface::new(LatLng::new(0.0, 0.0), 3);
        let h = s.attach_overlay(empty_overlay("a"));
        assert_eq!(s.overlay_count("a"), 1);
        assert!(s.overlay(&h).is_some());
        assert!(s.detach_overlay(h).is_some());
        assert_eq!(s.overlay_count("a"), 0);
    }

    #[test]
    fn markers_are_independent() {
        let mut s = HeadlessSurface::new(LatLng::new(0.0, 0.0), 3);
        let a = s.place_marker(Marker {
            position: LatLng::new(1.0, 1.0),
            kind: MarkerKind::Report,
            tooltip: None,
            popup: None,
        });
        s.place_marker(Marker {
            position: LatLng::new(2.0, 2.0),
            kind: MarkerKind::Distance,
            tooltip: None,
            popup: None,
        });
        assert_eq!(s.markers_of(MarkerKind::Report).len(), 1);
        s.remove_marker(a);
        assert!(s.markers_of(MarkerKind::Report).is_empty());
        assert_eq!(s.markers().count(), 1);
    }

    #[test]
    fn fit_bounds_recenters() {
        let mut s = HeadlessSurface::new(LatLng::new(0.0, 0.0), 3);
        let b = GeoBounds::new(LatLng::new(0.0, 0.0), LatLng::new(2.0, 4.0));
        s.fit_bounds(b, 20);
        assert_eq!(s.viewport().center, LatLng::new(1.0, 2.0));
        assert_eq!(s.fitted_bounds(), Some((b, 20)));
    }
}
