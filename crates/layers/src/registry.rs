use foundation::color::RgbHex;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

/// Static description of one toggleable layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub id: String,
    pub display_name: String,
    pub color: RgbHex,
    pub geometry: GeometryKind,
    pub default_active: bool,
    /// Remote procedure serving this layer; `None` for a plain table read.
    pub procedure: Option<String>,
    /// Attribute shown as a hover tooltip, when present on a feature.
    pub tooltip_field: Option<String>,
}

impl LayerDescriptor {
    pub fn table(
        id: impl Into<String>,
        display_name: impl Into<String>,
        color: RgbHex,
        geometry: GeometryKind,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            color,
            geometry,
            default_active: false,
            procedure: None,
            tooltip_field: None,
        }
    }

    pub fn procedural(mut self, procedure: impl Into<String>) -> Self {
        self.procedure = Some(procedure.into());
        self
    }

    pub fn active(mut self) -> Self {
        self.default_active = true;
        self
    }

    pub fn with_tooltip(mut self, field: impl Into<String>) -> Self {
        self.tooltip_field = Some(field.into());
        self
    }

    pub fn is_procedural(&self) -> bool {
        self.procedure.is_some()
    }
}

/// Ordered set of layer descriptors, keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRegistry {
    layers: Vec<LayerDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateLayer(pub String);

impl std::fmt::Display for DuplicateLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer {:?} registered twice", self.0)
    }
}

impl std::error::Error for DuplicateLayer {}

impl LayerRegistry {
    pub fn new(layers: Vec<LayerDescriptor>) -> Result<Self, DuplicateLayer> {
        for (i, layer) in layers.iter().enumerate() {
            if layers[..i].iter().any(|l| l.id == layer.id) {
                return Err(DuplicateLayer(layer.id.clone()));
            }
        }
        Ok(Self { layers })
    }

    pub fn get(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter()
    }

    pub fn defaults(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(|l| l.default_active)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

pub const REPORTS_LAYER: &str = "reportes";
pub const NEIGHBORHOODS_LAYER: &str = "barrios";
pub const NEIGHBORHOOD_NAME_FIELD: &str = "BARRIO";

impl Default for LayerRegistry {
    fn default() -> Self {
        use GeometryKind::*;
        Self {
            layers: vec![
                LayerDescriptor::table(
                    NEIGHBORHOODS_LAYER,
                    "Barrios",
                    RgbHex::new(0x8b, 0x5c, 0xf6),
                    Polygon,
                )
                .with_tooltip(NEIGHBORHOOD_NAME_FIELD),
                LayerDescriptor::table(
                    "agua_potable",
                    "Agua Potable",
                    RgbHex::new(0x06, 0xb6, 0xd4),
                    Polygon,
                ),
                LayerDescriptor::table(
                    "alcantarillado2",
                    "Alcantarillado",
                    RgbHex::new(0x84, 0xcc, 0x16),
                    Line,
                ),
                LayerDescriptor::table(
                    "bomberos_wgs84",
                    "Bomberos",
                    RgbHex::new(0xef, 0x44, 0x44),
                    Point,
                )
                .active(),
                LayerDescriptor::table(
                    "policia_wgs84",
                    "Policía",
                    RgbHex::new(0x3b, 0x82, 0xf6),
                    Point,
                )
                .active(),
                LayerDescriptor::table(
                    "salud_wgs84",
                    "Salud",
                    RgbHex::new(0x10, 0xb9, 0x81),
                    Point,
                )
                .active(),
                LayerDescriptor::table(
                    REPORTS_LAYER,
                    "Reportes",
                    RgbHex::new(0xf5, 0x9e, 0x0b),
                    Point,
                )
                .procedural(backend::procedures::OBTAIN_REPORTS)
                .active(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_layout() {
        let reg = LayerRegistry::default();
        assert_eq!(reg.len(), 7);
        let defaults: Vec<_> = reg.defaults().map(|l| l.id.as_str()).collect();
        assert_eq!(
            defaults,
            ["bomberos_wgs84", "policia_wgs84", "salud_wgs84", "reportes"]
        );
        let reports = reg.get(REPORTS_LAYER).unwrap();
        assert!(reports.is_procedural());
        assert_eq!(reports.procedure.as_deref(), Some("obtener_reportes"));
        assert_eq!(
            reg.get("alcantarillado2").unwrap().geometry,
            GeometryKind::Line
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let a = LayerDescriptor::table("a", "A", RgbHex::new(0, 0, 0), GeometryKind::Point);
        let err = LayerRegistry::new(vec![a.clone(), a]).unwrap_err();
        assert_eq!(err, DuplicateLayer("a".into()));
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(LayerRegistry::default().get("nope").is_none());
    }
}
