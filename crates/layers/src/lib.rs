pub mod feature;
pub mod manager;
pub mod overlay;
pub mod registry;
pub mod surface;
pub mod symbology;

pub use feature::{Feature, MalformedFeature, ParsedFeatures};
pub use manager::*;
pub use overlay::*;
pub use registry::*;
pub use surface::*;
pub use symbology::*;
