pub mod gate;
pub mod status;

pub use gate::*;
pub use status::*;
