//! Paint strategies.
//!
//! A [`Renderer`] maps an abstract paint description onto what a draw pass
//! needs: an optional bound texture, a UV generation mode, a sampler and a
//! per-draw UV offset/scale.

use crate::coords::{Rect, Size, Vec2};
use crate::render::Sampler;
use crate::scene::Node;
use crate::texture::Bitmap;

use super::{Color, ColorGradient};

/// Edge length of baked gradient textures.
pub const GRADIENT_BAKE_SIZE: u32 = 32;

/// How texture coordinates are generated for a drawn shape.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UvMode {
    /// No texture coordinates (flat color).
    None,
    /// `0..1` across the shape's bounding box.
    BoundingBox,
    /// Along the stroke: `u` follows the traced length, `v` spans the width.
    Trace,
}

/// Active paint strategy of a [`Paint`](super::Paint).
///
/// `Bitmap`, `Pattern` and `Line` hold a shared handle to a caller-supplied
/// bitmap and release only that handle on [`detach`](Self::detach). Gradient
/// variants own the texture they bake.
#[derive(Debug)]
pub enum Renderer {
    Color(Color),
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
    Bitmap { image: Bitmap, color: Color },
    Pattern { image: Bitmap, scale: Size, offset: Vec2 },
    Line { image: Bitmap, color: Color },
}

impl Renderer {
    /// Short variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Renderer::Color(_) => "color",
            Renderer::LinearGradient(_) => "linear-gradient",
            Renderer::RadialGradient(_) => "radial-gradient",
            Renderer::Bitmap { .. } => "bitmap",
            Renderer::Pattern { .. } => "pattern",
            Renderer::Line { .. } => "line",
        }
    }

    pub fn uv(&self) -> UvMode {
        match self {
            Renderer::Color(_) => UvMode::None,
            Renderer::Line { .. } => UvMode::Trace,
            _ => UvMode::BoundingBox,
        }
    }

    pub fn sampler(&self) -> Sampler {
        match self {
            Renderer::Pattern { .. } => Sampler::Wrap,
            _ => Sampler::Clamp,
        }
    }

    /// UV offset applied for a shape with bounding box `bbox`.
    ///
    /// Patterns anchor their tiling to the shape origin so tiles stay fixed in
    /// paint space when the shape moves within it.
    pub fn offset(&self, bbox: Rect) -> Vec2 {
        match self {
            Renderer::Pattern { image, scale, offset } => (bbox.origin + *offset) / (image.size() * *scale),
            _ => Vec2::zero(),
        }
    }

    /// UV scale applied for a shape with bounding box `bbox`.
    pub fn scale(&self, bbox: Rect) -> Size {
        match self {
            Renderer::Pattern { image, scale, .. } => bbox.size_wh() / (*scale * image.size()),
            Renderer::Line { image, .. } => Size::one() / image.size(),
            _ => Size::one(),
        }
    }

    /// Flat color (or texture tint) of this strategy.
    pub fn tint(&self) -> Color {
        match self {
            Renderer::Color(c) => *c,
            Renderer::Bitmap { color, .. } | Renderer::Line { color, .. } => *color,
            _ => Color::white(),
        }
    }

    /// True when the strategy's colors are not fully opaque.
    ///
    /// Bitmap content is not inspected; only the tint counts.
    pub fn use_alpha(&self) -> bool {
        match self {
            Renderer::Color(c) => !c.is_opaque(),
            Renderer::LinearGradient(g) => g.colors.use_alpha(),
            Renderer::RadialGradient(g) => g.colors.use_alpha(),
            Renderer::Bitmap { color, .. } | Renderer::Line { color, .. } => !color.is_opaque(),
            Renderer::Pattern { .. } => false,
        }
    }

    /// Texture to bind for this strategy, baking gradients on first use.
    ///
    /// `parent` owns any bitmap baked here. Returns `None` for flat colors.
    pub fn texture(&mut self, parent: &Node) -> Option<&Bitmap> {
        match self {
            Renderer::Color(_) => None,
            Renderer::LinearGradient(g) => Some(g.texture(parent)),
            Renderer::RadialGradient(g) => Some(g.texture(parent)),
            Renderer::Bitmap { image, .. }
            | Renderer::Pattern { image, .. }
            | Renderer::Line { image, .. } => Some(image),
        }
    }

    /// Releases everything this strategy references.
    pub fn detach(self) {
        log::trace!("renderer `{}` detached", self.kind());
        match self {
            Renderer::Color(_) => {}
            Renderer::LinearGradient(g) => g.detach(),
            Renderer::RadialGradient(g) => g.detach(),
            Renderer::Bitmap { image, .. }
            | Renderer::Pattern { image, .. }
            | Renderer::Line { image, .. } => image.detach(),
        }
    }
}

// ── linear gradient ───────────────────────────────────────────────────────

/// Linear gradient between two points in normalized paint space.
///
/// Baked to a `32×32` texture mapped over the shape's bounding box: each texel
/// samples the ramp at its projection onto `start → end`.
#[derive(Debug)]
pub struct LinearGradient {
    start: Vec2,
    end: Vec2,
    colors: ColorGradient,
    texture: Option<Bitmap>,
}

impl LinearGradient {
    pub fn new(start: Vec2, end: Vec2, colors: ColorGradient) -> Self {
        Self { start, end, colors, texture: None }
    }

    #[inline]
    pub fn start(&self) -> Vec2 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Vec2 {
        self.end
    }

    #[inline]
    pub fn colors(&self) -> &ColorGradient {
        &self.colors
    }

    /// Baked texture, created on first call and cached afterwards.
    pub fn texture(&mut self, parent: &Node) -> &Bitmap {
        self.texture
            .get_or_insert_with(|| bake_linear(parent, self.start, self.end, &self.colors))
    }

    #[inline]
    pub fn is_baked(&self) -> bool {
        self.texture.is_some()
    }

    pub fn detach(self) {
        if let Some(t) = self.texture {
            t.detach();
        }
    }
}

fn bake_linear(parent: &Node, start: Vec2, end: Vec2, colors: &ColorGradient) -> Bitmap {
    let n = GRADIENT_BAKE_SIZE;
    let axis = end - start;
    let len2 = axis.dot(axis);

    let mut pixels = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        let v = (y as f32 + 0.5) / n as f32;
        for x in 0..n {
            let u = (x as f32 + 0.5) / n as f32;
            // Degenerate axis: flat first color.
            let t = if len2 > 0.0 {
                ((Vec2::new(u, v) - start).dot(axis) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            pixels.push(colors.value(t).bgra());
        }
    }

    log::debug!("linear gradient: baked {n}x{n} texture");
    Bitmap::with_pixels(parent, n, n, &pixels)
}

// ── radial gradient ───────────────────────────────────────────────────────

/// Radial gradient in normalized paint space.
///
/// The baked texture is centred on the bitmap; `center` and `focal` are kept
/// for backends that evaluate the gradient analytically.
#[derive(Debug)]
pub struct RadialGradient {
    center: Vec2,
    focal: Vec2,
    radius: f32,
    colors: ColorGradient,
    texture: Option<Bitmap>,
}

impl RadialGradient {
    pub fn new(center: Vec2, focal: Vec2, radius: f32, colors: ColorGradient) -> Self {
        Self { center, focal, radius, colors, texture: None }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn focal(&self) -> Vec2 {
        self.focal
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn colors(&self) -> &ColorGradient {
        &self.colors
    }

    /// Baked texture, created on first call and cached afterwards.
    pub fn texture(&mut self, parent: &Node) -> &Bitmap {
        self.texture
            .get_or_insert_with(|| bake_radial(parent, self.radius, &self.colors))
    }

    #[inline]
    pub fn is_baked(&self) -> bool {
        self.texture.is_some()
    }

    pub fn detach(self) {
        if let Some(t) = self.texture {
            t.detach();
        }
    }
}

fn bake_radial(parent: &Node, radius: f32, colors: &ColorGradient) -> Bitmap {
    let n = GRADIENT_BAKE_SIZE;
    let inv_r = 0.5 / radius;
    let m = (n - 1) as f32 * 0.5;

    let mut pixels = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        let dy = (y as f32 - m) / m;
        for x in 0..n {
            let dx = (x as f32 - m) / m;
            let d = ((dx * dx + dy * dy).sqrt() * inv_r).clamp(0.0, 1.0);
            pixels.push(colors.value(d).bgra());
        }
    }

    log::debug!("radial gradient: baked {n}x{n} texture (radius={radius})");
    Bitmap::with_pixels(parent, n, n, &pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(texel: u32) -> u32 {
        texel & 0xFF
    }

    // ── dispatch table ────────────────────────────────────────────────────

    #[test]
    fn uv_and_sampler_per_variant() {
        let root = Node::root("root");
        let img = Bitmap::new(&root, 4, 4);

        let color = Renderer::Color(Color::white());
        let radial = Renderer::RadialGradient(RadialGradient::new(
            Vec2::new(0.5, 0.5),
            Vec2::new(0.5, 0.5),
            0.5,
            ColorGradient::black_white(),
        ));
        let pattern = Renderer::Pattern { image: img.clone(), scale: Size::one(), offset: Vec2::zero() };
        let line = Renderer::Line { image: img, color: Color::white() };

        assert_eq!((color.uv(), color.sampler()), (UvMode::None, Sampler::Clamp));
        assert_eq!((radial.uv(), radial.sampler()), (UvMode::BoundingBox, Sampler::Clamp));
        assert_eq!((pattern.uv(), pattern.sampler()), (UvMode::BoundingBox, Sampler::Wrap));
        assert_eq!((line.uv(), line.sampler()), (UvMode::Trace, Sampler::Clamp));
    }

    #[test]
    fn color_has_no_texture() {
        let root = Node::root("root");
        let mut r = Renderer::Color(Color::rgb(1.0, 0.0, 0.0));
        assert!(r.texture(&root).is_none());
        assert_eq!(root.live_children(), 0);
    }

    // ── pattern / line UV adjustment ──────────────────────────────────────

    #[test]
    fn pattern_tiles_relative_to_image_size() {
        let root = Node::root("root");
        let r = Renderer::Pattern {
            image: Bitmap::new(&root, 8, 4),
            scale: Size::new(2.0, 1.0),
            offset: Vec2::new(16.0, 0.0),
        };
        let bbox = Rect::new(16.0, 8.0, 64.0, 16.0);
        // One tile covers 16x4 px.
        assert_eq!(r.scale(bbox), Size::new(4.0, 4.0));
        assert_eq!(r.offset(bbox), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn line_scale_is_inverse_image_size() {
        let root = Node::root("root");
        let r = Renderer::Line { image: Bitmap::new(&root, 4, 2), color: Color::white() };
        assert_eq!(r.scale(Rect::new(0.0, 0.0, 100.0, 100.0)), Size::new(0.25, 0.5));
        assert_eq!(r.offset(Rect::new(5.0, 5.0, 1.0, 1.0)), Vec2::zero());
    }

    // ── baking ────────────────────────────────────────────────────────────

    #[test]
    fn radial_bake_is_memoized() {
        let root = Node::root("root");
        let mut g = RadialGradient::new(
            Vec2::new(0.5, 0.5),
            Vec2::new(0.5, 0.5),
            0.5,
            ColorGradient::black_white(),
        );
        assert!(!g.is_baked());
        let first = g.texture(&root).id();
        let second = g.texture(&root).id();
        assert_eq!(first, second);
        // Only one bitmap was ever attached.
        assert_eq!(root.live_children(), 1);
    }

    #[test]
    fn radial_bake_samples_distance_from_center() {
        let root = Node::root("root");
        let mut g = RadialGradient::new(
            Vec2::new(0.5, 0.5),
            Vec2::new(0.5, 0.5),
            0.5,
            ColorGradient::black_white(),
        );
        let t = g.texture(&root);
        assert_eq!((t.width(), t.height()), (GRADIENT_BAKE_SIZE, GRADIENT_BAKE_SIZE));

        // Corners lie beyond the radius and clamp to the last key.
        assert_eq!(t.pixel(0, 0), Color::white().bgra());
        assert_eq!(t.pixel(31, 31), Color::white().bgra());
        // Near the centre the ramp is still close to black.
        assert!(channel(t.pixel(15, 15)) < 16);
        // Symmetric around the centre.
        assert_eq!(t.pixel(3, 10), t.pixel(28, 21));
    }

    #[test]
    fn linear_bake_follows_axis() {
        let root = Node::root("root");
        let mut g = LinearGradient::new(Vec2::zero(), Vec2::new(1.0, 0.0), ColorGradient::black_white());
        let t = g.texture(&root);
        for x in 1..GRADIENT_BAKE_SIZE {
            assert!(channel(t.pixel(x, 0)) >= channel(t.pixel(x - 1, 0)));
            assert_eq!(t.pixel(x, 0), t.pixel(x, GRADIENT_BAKE_SIZE - 1));
        }
        assert!(channel(t.pixel(0, 0)) < 8);
        assert!(channel(t.pixel(31, 0)) > 247);
    }

    #[test]
    fn degenerate_linear_axis_is_flat_first_color() {
        let root = Node::root("root");
        let p = Vec2::new(0.5, 0.5);
        let colors = ColorGradient::between(Color::rgb(1.0, 0.0, 0.0), Color::white());
        let mut g = LinearGradient::new(p, p, colors);
        let t = g.texture(&root);
        assert!(t.pixels().iter().all(|&px| px == 0xFFFF_0000));
    }

    // ── detach ────────────────────────────────────────────────────────────

    #[test]
    fn detach_releases_only_own_reference() {
        let root = Node::root("root");
        let img = Bitmap::new(&root, 2, 2);
        let r = Renderer::Bitmap { image: img.clone(), color: Color::white() };
        assert_eq!(img.ref_count(), 2);

        r.detach();
        assert_eq!(img.ref_count(), 1);
        assert!(img.node().is_attached());
    }

    #[test]
    fn detach_releases_baked_texture() {
        let root = Node::root("root");
        let mut r = Renderer::RadialGradient(RadialGradient::new(
            Vec2::new(0.5, 0.5),
            Vec2::new(0.5, 0.5),
            0.5,
            ColorGradient::rainbow(),
        ));
        r.texture(&root);
        assert_eq!(root.live_children(), 1);
        r.detach();
        assert_eq!(root.live_children(), 0);
    }
}
