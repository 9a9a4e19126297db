use foundation::bounds::GeoBounds;
use foundation::geo::LatLng;
use geojson::Geometry;
use serde_json::Value;

use crate::feature::{Feature, geometry_bounds, point_positions};
use crate::registry::LayerDescriptor;
use crate::symbology::{POINT_RADIUS, PathStyle};

/// Labeled attribute list shown when a feature is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub anchor: LatLng,
    pub title: Option<String>,
    pub rows: Vec<(String, String)>,
}

impl Popup {
    pub fn new(anchor: LatLng) -> Self {
        Self {
            anchor,
            title: None,
            rows: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }

    /// Plain-text rendering, one `label: value` per line.
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.rows.len() + 1);
        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        lines.extend(self.rows.iter().map(|(k, v)| format!("{k}: {v}")));
        lines.join("\n")
    }
}

/// Scalar rendered for display; null shows as an em dash.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::Null => "—".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Distance as whole meters; null shows as `—`, non-numeric text passes through.
pub fn format_meters(v: &Value) -> String {
    let number = match v {
        Value::Null => return "—".to_string(),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => format!("{n:.0} m"),
        _ => display_value(v),
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CircleMarker {
    pub center: LatLng,
    pub radius: f32,
    pub style: PathStyle,
}

/// One feature as drawn: its geometry, style, point markers and popup.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub geometry: Geometry,
    pub style: PathStyle,
    pub markers: Vec<CircleMarker>,
    pub bounds: GeoBounds,
    pub popup: Popup,
    pub tooltip: Option<String>,
}

/// Rendered representation of one layer's features.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub layer_id: String,
    pub items: Vec<OverlayItem>,
}

impl Overlay {
    pub fn build(descriptor: &LayerDescriptor, features: Vec<Feature>) -> Self {
        let style = PathStyle::for_layer(descriptor.geometry, descriptor.color);
        let items = features
            .into_iter()
            .filter_map(|f| build_item(descriptor, style, f))
            .collect();
        Self {
            layer_id: descriptor.id.clone(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn popup(&self, index: usize) -> Option<&Popup> {
        self.items.get(index).map(|i| &i.popup)
    }
}

fn build_item(descriptor: &LayerDescriptor, style: PathStyle, feature: Feature) -> Option<OverlayItem> {
    let bounds = geometry_bounds(&feature.geometry)?;
    let marker_style = style.circle_marker();
    let markers = point_positions(&feature.geometry)
        .into_iter()
        .map(|center| CircleMarker {
            center,
            radius: POINT_RADIUS,
            style: marker_style,
        })
        .collect();

    let tooltip = descriptor
        .tooltip_field
        .as_ref()
        .and_then(|field| feature.attributes.get(field))
        .filter(|v| !v.is_null())
        .map(display_value);

    let popup = Popup {
        anchor: bounds.center(),
        title: None,
        rows: feature
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect(),
    };

    Some(OverlayItem {
        geometry: feature.geometry,
        style,
        markers,
        bounds,
        popup,
        tooltip,
    })
}
