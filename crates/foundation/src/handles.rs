/// Owned handle to an overlay attached to a map surface.
///
/// Not `Clone`/`Copy`: detaching consumes the handle, so only its single owner
/// can release the overlay.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct OverlayHandle(u64);

/// Owned handle to a single marker on a map surface.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(u64);

impl OverlayHandle {
    pub fn new(raw: u64) -> Self {
        OverlayHandle(raw)
    }
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl MarkerHandle {
    pub fn new(raw: u64) -> Self {
        MarkerHandle(raw)
    }
    pub fn raw(&self) -> u64 {
        self.0
    }
}
