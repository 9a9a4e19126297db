//! Geoportal application state and its event dispatch.

pub mod app;
pub mod basemap;
pub mod config;
pub mod event;
pub mod geolocation;

pub use app::Geoportal;
pub use config::GeoportalConfig;
pub use event::{Event, StateTransition};
