/// 24-bit RGB color written as `#rrggbb`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RgbHex(pub [u8; 3]);

impl RgbHex {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        RgbHex([r, g, b])
    }
}

impl std::fmt::Display for RgbHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}
