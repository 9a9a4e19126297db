use std::env;

use foundation::geo::LatLng;
use layers::manager::DEFAULT_FEATURE_LIMIT;
use runtime::status::DEFAULT_STATUS_SECS;
use tracing::warn;

pub const DEFAULT_URL: &str = "http://127.0.0.1:54321";
pub const INITIAL_CENTER: LatLng = LatLng::new(-4.0, -79.2);
pub const INITIAL_ZOOM: u8 = 13;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoportalConfig {
    pub base_url: String,
    pub api_key: String,
    /// Row cap for table-backed layer reads.
    pub feature_limit: u32,
    /// Seconds a status message stays visible.
    pub status_secs: f64,
    pub initial_center: LatLng,
    pub initial_zoom: u8,
}

impl Default for GeoportalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            api_key: String::new(),
            feature_limit: DEFAULT_FEATURE_LIMIT,
            status_secs: DEFAULT_STATUS_SECS,
            initial_center: INITIAL_CENTER,
            initial_zoom: INITIAL_ZOOM,
        }
    }
}

impl GeoportalConfig {
    /// Reads `GEOPORTAL_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_var_string("GEOPORTAL_URL", &defaults.base_url),
            api_key: env_var_string("GEOPORTAL_API_KEY", ""),
            feature_limit: env_var_u32("GEOPORTAL_FEATURE_LIMIT", defaults.feature_limit),
            status_secs: env_var_f64("GEOPORTAL_STATUS_SECS", defaults.status_secs),
            ..defaults
        }
    }

    pub fn with_endpoint(mut self, base_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(key) = api_key {
            self.api_key = key;
        }
        self
    }
}

fn env_var_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_var_u32(name: &str, default: u32) -> u32 {
    parse_or(name, env::var(name).ok(), default)
}

fn env_var_f64(name: &str, default: f64) -> f64 {
    match parse_or(name, env::var(name).ok(), default) {
        v if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

fn parse_or<T: std::str::FromStr + Copy>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(s) => s.trim().parse().unwrap_or_else(|_| {
            warn!(var = name, value = %s, "ignoring unparseable value");
            default
        }),
    }
}
