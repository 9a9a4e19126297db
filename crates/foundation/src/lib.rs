pub mod bounds;
pub mod color;
pub mod geo;
pub mod handles;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use color::*;
pub use geo::*;
pub use handles::*;
pub use time::*;
