//! Remote data service: the table/procedure backend the geoportal reads from.

pub mod error;
pub mod memory;
pub mod procedures;
pub mod rest;
pub mod service;

pub use error::*;
pub use memory::*;
pub use rest::*;
pub use service::*;
