/// Straight-alpha RGBA color.
///
/// Channels are nominally in `[0, 1]`. Values outside that range are kept as-is
/// for interpolation and clamped only when packed to bytes.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Creates an opaque color from hue/saturation/brightness.
    ///
    /// `h` is measured in turns: `0.0` and `1.0` are both red.
    pub fn from_hsb(h: f32, s: f32, b: f32) -> Self {
        let s = s.clamp(0.0, 1.0);
        let b = b.clamp(0.0, 1.0);
        let h6 = h.rem_euclid(1.0) * 6.0;
        let sector = h6.floor();
        let f = h6 - sector;

        let p = b * (1.0 - s);
        let q = b * (1.0 - s * f);
        let t = b * (1.0 - s * (1.0 - f));

        let (r, g, bl) = match sector as u32 % 6 {
            0 => (b, t, p),
            1 => (q, b, p),
            2 => (p, b, t),
            3 => (p, q, b),
            4 => (t, p, b),
            _ => (b, p, q),
        };
        Self::rgb(r, g, bl)
    }

    /// Per-channel linear interpolation; exact at `c == 0` and `c == 1`.
    #[inline]
    pub fn lerp(self, to: Color, c: f32) -> Color {
        let k = 1.0 - c;
        Color {
            r: self.r * k + to.r * c,
            g: self.g * k + to.g * c,
            b: self.b * k + to.b * c,
            a: self.a * k + to.a * c,
        }
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a >= 1.0
    }

    /// Packs to a BGRA texel: `a<<24 | r<<16 | g<<8 | b`.
    ///
    /// In little-endian memory the bytes read B, G, R, A, matching
    /// `Bgra8Unorm` texture uploads.
    #[inline]
    pub fn bgra(self) -> u32 {
        (to_byte(self.a) << 24) | (to_byte(self.r) << 16) | (to_byte(self.g) << 8) | to_byte(self.b)
    }

    /// Unpacks a BGRA texel produced by [`bgra`](Self::bgra).
    #[inline]
    pub fn from_bgra(texel: u32) -> Color {
        let ch = |shift: u32| ((texel >> shift) & 0xFF) as f32 / 255.0;
        Color::new(ch(16), ch(8), ch(0), ch(24))
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[inline]
fn to_byte(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u32
}
