/// Canonical composition pixel: four 16-bit channels, color premultiplied by alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Argb16 {
    /// Alpha.
    pub a: u16,
    /// Red, premultiplied.
    pub r: u16,
    /// Green, premultiplied.
    pub g: u16,
    /// Blue, premultiplied.
    pub b: u16,
}

impl Argb16 {
    /// Fully transparent black; what staging leaves past a buffer's capacity.
    pub const TRANSPARENT: Argb16 = Argb16 {
        a: 0,
        r: 0,
        g: 0,
        b: 0,
    };

    /// Build a pixel from `(a, r, g, b)`.
    pub const fn new(a: u16, r: u16, g: u16, b: u16) -> Self {
        Self { a, r, g, b }
    }

    /// Byte image used for checksumming: little-endian `b, g, r, a`.
    pub fn to_le_bytes(self) -> [u8; 8] {
        let [b0, b1] = self.b.to_le_bytes();
        let [g0, g1] = self.g.to_le_bytes();
        let [r0, r1] = self.r.to_le_bytes();
        let [a0, a1] = self.a.to_le_bytes();
        [b0, b1, g0, g1, r0, r1, a0, a1]
    }
}
