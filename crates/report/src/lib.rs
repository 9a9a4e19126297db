//! Citizen report capture: location, form and submission.

pub mod flow;
pub mod form;
pub mod location;

pub use flow::*;
pub use form::*;
pub use location::*;
