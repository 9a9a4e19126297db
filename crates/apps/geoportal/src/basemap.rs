use layers::surface::TileSource;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Basemap {
    pub id: &'static str,
    pub name: &'static str,
    pub url_template: &'static str,
    pub attribution: &'static str,
}

impl Basemap {
    pub fn tile_source(&self) -> TileSource {
        TileSource {
            url_template: self.url_template.to_string(),
            attribution: self.attribution.to_string(),
        }
    }
}

pub static BASEMAPS: [Basemap; 4] = [
    Basemap {
        id: "osm",
        name: "OpenStreetMap",
        url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: "© OpenStreetMap contributors",
    },
    Basemap {
        id: "esri",
        name: "Satélite",
        url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        attribution: "© Esri, Maxar, Earthstar Geographics",
    },
    Basemap {
        id: "carto",
        name: "Claro",
        url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
        attribution: "© OpenStreetMap © CartoDB",
    },
    Basemap {
        id: "streets",
        name: "Calles",
        url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
        attribution: "© Esri, HERE, Garmin",
    },
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BasemapChange {
    Switched(&'static Basemap),
    /// Already the current basemap.
    Unchanged,
    Unknown,
}

/// Which basemap is shown; starts on OpenStreetMap.
#[derive(Debug, Clone, Default)]
pub struct BasemapSelection {
    current: usize,
}

impl BasemapSelection {
    pub fn current(&self) -> &'static Basemap {
        &BASEMAPS[self.current]
    }

    pub fn select(&mut self, id: &str) -> BasemapChange {
        match BASEMAPS.iter().position(|b| b.id == id) {
            None => BasemapChange::Unknown,
            Some(i) if i == self.current => BasemapChange::Unchanged,
            Some(i) => {
                self.current = i;
                BasemapChange::Switched(&BASEMAPS[i])
            }
        }
    }
}
