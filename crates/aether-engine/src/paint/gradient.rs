use crate::scene::Node;
use crate::texture::Bitmap;

use super::interpolator::KeyTable;
use super::Color;

/// Color keyframe table (gradient ramp).
///
/// Positions are conventionally in `[0, 1]`. Lookup interpolates each channel
/// linearly between the two bracketing keys and clamps outside the key range,
/// exactly like [`Interpolator`](super::Interpolator).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorGradient {
    table: KeyTable<Color>,
}

impl ColorGradient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-key gradient from `from` at 0 to `to` at 1.
    pub fn between(from: Color, to: Color) -> Self {
        let mut g = Self::new();
        g.add(0.0, from);
        g.add(1.0, to);
        g
    }

    /// Inserts or overwrites the keyframe at `position`.
    pub fn add(&mut self, position: f32, color: Color) {
        self.table.insert(position, color);
    }

    /// Interpolated color at `position` (clamped to the key range).
    ///
    /// # Panics
    /// Panics if no keyframe has been added.
    pub fn value(&self, position: f32) -> Color {
        self.table.sample(position)
    }

    /// `count` evenly spaced samples over `[from, to]`.
    pub fn values(&self, from: f32, to: f32, count: usize) -> Vec<Color> {
        self.table.samples(from, to, count)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Keyframes in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, Color)> + '_ {
        self.table.iter()
    }

    /// True when any keyframe is not fully opaque.
    pub fn use_alpha(&self) -> bool {
        self.table.iter().any(|(_, c)| !c.is_opaque())
    }

    /// Bakes a `width × 1` ramp over `[0, 1]` as a bitmap child of `parent`.
    ///
    /// Used as a standalone swatch and as the lookup table of the gradient-map
    /// blend pass.
    pub fn create_bitmap(&self, parent: &Node, width: u32) -> Bitmap {
        let pixels: Vec<u32> = self
            .values(0.0, 1.0, width as usize)
            .into_iter()
            .map(Color::bgra)
            .collect();
        log::trace!("gradient: baked {width}x1 ramp ({} keys)", self.len());
        Bitmap::with_pixels(parent, width, 1, &pixels)
    }

    /// Black at 0, white at 1. Built fresh on every call.
    pub fn black_white() -> Self {
        Self::between(Color::black(), Color::white())
    }

    /// Full hue ramp: 17 keys at `i/16` with hue `i/16`, full saturation and
    /// brightness. Built fresh on every call.
    pub fn rainbow() -> Self {
        const STEPS: u32 = 16;
        let mut g = Self::new();
        for i in 0..=STEPS {
            let t = i as f32 / STEPS as f32;
            g.add(t, Color::from_hsb(t, 1.0, 1.0));
        }
        g
    }
}

impl FromIterator<(f32, Color)> for ColorGradient {
    fn from_iter<I: IntoIterator<Item = (f32, Color)>>(iter: I) -> Self {
        let mut out = ColorGradient::new();
        for (p, c) in iter {
            out.add(p, c);
        }
        out
    }
}
