use crate::coords::{Rect, Size, Vec2};
use crate::render::{DrawPass, Graphics, Program, Sampler, TextureVertex};
use crate::scene::Node;
use crate::texture::Bitmap;

use super::renderer::{LinearGradient, RadialGradient, Renderer, UvMode};
use super::{Color, ColorGradient};

/// Requested compositing mode.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    #[default]
    Opaque,
    Alpha,
    Add,
    Multiply,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PaintMode {
    #[default]
    Fill,
    Stroke,
}

/// How a shape is filled or stroked.
///
/// A paint owns at most one [`Renderer`]. Every mutator that installs a new
/// strategy detaches the previous one first. Dropping (or
/// [`detach`](Self::detach)ing) the paint releases the active renderer and
/// detaches the paint's scene node.
///
/// Invariants:
/// - `use_alpha` reflects the opacity of the active color, tint or gradient
/// - the effective blend is derived, see [`computed_blend`](Self::computed_blend)
#[derive(Debug)]
pub struct Paint {
    node: Node,
    renderer: Option<Renderer>,
    mode: PaintMode,
    blend: BlendMode,
    stroke_width: f32,
    use_alpha: bool,
}

impl Paint {
    /// Creates an empty fill paint (draws white until a strategy is set).
    ///
    /// # Panics
    /// Panics if `parent` is detached.
    pub fn new(parent: &Node) -> Self {
        Self {
            node: parent.child("paint"),
            renderer: None,
            mode: PaintMode::Fill,
            blend: BlendMode::Opaque,
            stroke_width: 1.0,
            use_alpha: false,
        }
    }

    pub fn with_mode(mut self, mode: PaintMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = width;
        self
    }

    // ── convenience constructors ──────────────────────────────────────────

    pub fn solid(parent: &Node, color: Color) -> Self {
        let mut p = Self::new(parent);
        p.set_color(color);
        p
    }

    /// Linear gradient along the bounding-box diagonal.
    pub fn linear_fill(parent: &Node, colors: ColorGradient) -> Self {
        let mut p = Self::new(parent);
        p.set_linear_gradient(Vec2::zero(), Vec2::new(1.0, 1.0), colors);
        p
    }

    /// Radial gradient centred in the bounding box.
    pub fn radial_fill(parent: &Node, colors: ColorGradient) -> Self {
        let mut p = Self::new(parent);
        let c = Vec2::new(0.5, 0.5);
        p.set_radial_gradient(c, c, 0.5, colors);
        p
    }

    pub fn bitmap_fill(parent: &Node, image: Bitmap, tint: Color) -> Self {
        let mut p = Self::new(parent);
        p.set_bitmap(image, tint);
        p
    }

    pub fn pattern_fill(parent: &Node, image: Bitmap, scale: Size, offset: Vec2) -> Self {
        let mut p = Self::new(parent);
        p.set_pattern(image, scale, offset);
        p
    }

    pub fn line_stroke(parent: &Node, image: Bitmap, tint: Color, width: f32) -> Self {
        let mut p = Self::new(parent).with_mode(PaintMode::Stroke).with_stroke_width(width);
        p.set_line(image, tint);
        p
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[inline]
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    #[inline]
    pub fn mode(&self) -> PaintMode {
        self.mode
    }

    #[inline]
    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    #[inline]
    pub fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    #[inline]
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    #[inline]
    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width;
    }

    #[inline]
    pub fn use_alpha(&self) -> bool {
        self.use_alpha
    }

    /// Blend mode actually used for drawing: translucent content upgrades a
    /// requested `Opaque` to `Alpha`.
    #[inline]
    pub fn computed_blend(&self) -> BlendMode {
        if self.blend == BlendMode::Opaque && self.use_alpha {
            BlendMode::Alpha
        } else {
            self.blend
        }
    }

    // ── strategy mutators ─────────────────────────────────────────────────

    /// Active flat color or texture tint; white when neither applies.
    pub fn color(&self) -> Color {
        match &self.renderer {
            Some(Renderer::Color(c)) => *c,
            Some(Renderer::Bitmap { color, .. } | Renderer::Line { color, .. }) => *color,
            _ => Color::white(),
        }
    }

    /// Sets the flat color, or the tint of an active bitmap/line in place.
    pub fn set_color(&mut self, color: Color) {
        match &mut self.renderer {
            Some(Renderer::Color(c)) => *c = color,
            Some(Renderer::Bitmap { color: tint, .. } | Renderer::Line { color: tint, .. }) => *tint = color,
            _ => self.replace_renderer(Renderer::Color(color)),
        }
        self.use_alpha = !color.is_opaque();
    }

    pub fn set_linear_gradient(&mut self, start: Vec2, end: Vec2, colors: ColorGradient) {
        self.replace_renderer(Renderer::LinearGradient(LinearGradient::new(start, end, colors)));
    }

    pub fn set_radial_gradient(&mut self, center: Vec2, focal: Vec2, radius: f32, colors: ColorGradient) {
        self.replace_renderer(Renderer::RadialGradient(RadialGradient::new(center, focal, radius, colors)));
    }

    pub fn set_pattern(&mut self, image: Bitmap, scale: Size, offset: Vec2) {
        self.replace_renderer(Renderer::Pattern { image, scale, offset });
    }

    pub fn set_bitmap(&mut self, image: Bitmap, tint: Color) {
        self.replace_renderer(Renderer::Bitmap { image, color: tint });
    }

    pub fn set_line(&mut self, image: Bitmap, tint: Color) {
        self.replace_renderer(Renderer::Line { image, color: tint });
    }

    fn replace_renderer(&mut self, renderer: Renderer) {
        let previous = self.renderer.take();
        log::trace!(
            "paint: {} -> {}",
            previous.as_ref().map_or("none", Renderer::kind),
            renderer.kind()
        );
        if let Some(old) = previous {
            old.detach();
        }
        self.use_alpha = renderer.use_alpha();
        self.renderer = Some(renderer);
    }

    // ── draw path ─────────────────────────────────────────────────────────

    /// Records a pass filling `rect` (target pixels) with this paint.
    pub fn fill_rect(&mut self, target: &Bitmap, rect: Rect) -> DrawPass {
        let rect = rect.normalized();
        let w = rect.size.x;
        let trace = [Vec2::zero(), Vec2::new(w, 0.0), Vec2::new(0.0, 1.0), Vec2::new(w, 1.0)];
        self.quad_pass(target, rect.strip(), trace)
    }

    /// Records a pass stroking the segment `from → to` with `stroke_width`.
    ///
    /// Trace UVs run along the segment in pixels (`u`) and across it (`v`).
    pub fn stroke_segment(&mut self, target: &Bitmap, from: Vec2, to: Vec2) -> DrawPass {
        let dir = to - from;
        let len = dir.length();
        let normal = if len > 0.0 { dir.perp() / len } else { Vec2::new(0.0, 1.0) };
        let half = normal * (self.stroke_width * 0.5);
        let corners = [from + half, to + half, from - half, to - half];
        let trace = [Vec2::zero(), Vec2::new(len, 0.0), Vec2::new(0.0, 1.0), Vec2::new(len, 1.0)];
        self.quad_pass(target, corners, trace)
    }

    fn quad_pass(&mut self, target: &Bitmap, corners: [Vec2; 4], trace: [Vec2; 4]) -> DrawPass {
        let bbox = bounding_box(&corners);
        let blend = self.computed_blend();

        let (uv_mode, sampler, offset, scale) = match &self.renderer {
            Some(r) => (r.uv(), r.sampler(), r.offset(bbox), r.scale(bbox)),
            None => (UvMode::None, Sampler::Clamp, Vec2::zero(), Size::one()),
        };
        let texture = self
            .renderer
            .as_mut()
            .and_then(|r| r.texture(&self.node))
            .cloned();

        // Without a texture the quad degrades to a flat fill.
        let program = if texture.is_some() { Program::Texture } else { Program::Color };
        let color = self.renderer.as_ref().map_or(Color::white(), Renderer::tint);

        let uv = |i: usize| -> Vec2 {
            match uv_mode {
                UvMode::None => Vec2::zero(),
                UvMode::BoundingBox => {
                    let p = corners[i] - bbox.origin;
                    let nx = if bbox.size.x > 0.0 { p.x / bbox.size.x } else { 0.0 };
                    let ny = if bbox.size.y > 0.0 { p.y / bbox.size.y } else { 0.0 };
                    Vec2::new(nx * scale.w + offset.x, ny * scale.h + offset.y)
                }
                UvMode::Trace => Vec2::new(trace[i].x * scale.w + offset.x, trace[i].y),
            }
        };

        let mut g = Graphics::new(target);
        let matrix = g.matrix();
        g.program(program, blend)
            .uniforms(matrix)
            .sampler(sampler)
            .texture_vertices(4, |v| {
                for (i, vert) in v.iter_mut().enumerate() {
                    *vert = TextureVertex::new(corners[i], uv(i), color);
                }
            });
        if let (Program::Texture, Some(t)) = (program, &texture) {
            g.use_texture(t, 0);
        }
        g.draw_triangle_strip(4);
        g.finish()
    }

    /// Releases the active renderer and detaches the paint's node.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for Paint {
    fn drop(&mut self) {
        if let Some(r) = self.renderer.take() {
            r.detach();
        }
        self.node.detach();
    }
}

fn bounding_box(points: &[Vec2; 4]) -> Rect {
    let (mut min, mut max) = (points[0], points[0]);
    for p in &points[1..] {
        min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
        max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
    }
    Rect::from_origin_size(min, max - min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    // ── blend / alpha tracking ────────────────────────────────────────────

    #[test]
    fn translucent_color_upgrades_opaque_blend() {
        let root = Node::root("root");
        let mut p = Paint::new(&root);
        assert_eq!(p.blend(), BlendMode::Opaque);
        p.set_color(Color::new(1.0, 0.0, 0.0, 0.5));
        assert!(p.use_alpha());
        assert_eq!(p.computed_blend(), BlendMode::Alpha);
    }

    #[test]
    fn computed_blend_truth_table() {
        let root = Node::root("root");
        for blend in [BlendMode::Opaque, BlendMode::Alpha, BlendMode::Add, BlendMode::Multiply] {
            for alpha in [1.0, 0.25] {
                let mut p = Paint::new(&root).with_blend(blend);
                p.set_color(Color::new(0.0, 0.0, 1.0, alpha));
                let expected = if blend == BlendMode::Opaque && alpha < 1.0 { BlendMode::Alpha } else { blend };
                assert_eq!(p.computed_blend(), expected);
            }
        }
    }

    #[test]
    fn use_alpha_follows_gradient_keys() {
        let root = Node::root("root");
        let mut p = Paint::linear_fill(&root, ColorGradient::rainbow());
        assert!(!p.use_alpha());

        let fade = ColorGradient::between(Color::white(), Color::transparent());
        p.set_radial_gradient(Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5), 0.5, fade);
        assert!(p.use_alpha());

        p.set_color(red());
        assert!(!p.use_alpha());
        assert_eq!(p.computed_blend(), BlendMode::Opaque);
    }

    // ── renderer replacement ──────────────────────────────────────────────

    #[test]
    fn set_color_mutates_in_place() {
        let root = Node::root("root");
        let img = Bitmap::new(&root, 2, 2);
        let mut p = Paint::bitmap_fill(&root, img.clone(), Color::white());
        p.set_color(red());
        // Still a bitmap renderer, still holding the image.
        assert!(matches!(p.renderer(), Some(Renderer::Bitmap { .. })));
        assert_eq!(p.color(), red());
        assert_eq!(img.ref_count(), 2);
    }

    #[test]
    fn set_color_replaces_gradient() {
        let root = Node::root("root");
        let mut p = Paint::radial_fill(&root, ColorGradient::black_white());
        p.set_color(red());
        assert!(matches!(p.renderer(), Some(Renderer::Color(_))));
    }

    #[test]
    fn replacing_renderer_releases_previous_exactly_once() {
        let root = Node::root("root");
        let a = Bitmap::new(&root, 2, 2);
        let b = Bitmap::new(&root, 2, 2);

        let mut p = Paint::pattern_fill(&root, a.clone(), Size::one(), Vec2::zero());
        assert_eq!(a.ref_count(), 2);

        p.set_bitmap(b.clone(), Color::white());
        assert_eq!(a.ref_count(), 1);
        assert_eq!(b.ref_count(), 2);

        // Tint change keeps the bitmap renderer and its handle.
        p.set_color(red());
        assert_eq!(b.ref_count(), 2);

        p.set_linear_gradient(Vec2::zero(), Vec2::new(1.0, 0.0), ColorGradient::black_white());
        assert_eq!(b.ref_count(), 1);
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn replacing_baked_gradient_releases_bake() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 16, 16);
        let mut p = Paint::radial_fill(&root, ColorGradient::rainbow());
        let _ = p.fill_rect(&target, Rect::new(0.0, 0.0, 16.0, 16.0));
        assert_eq!(p.node().live_children(), 1);

        p.set_color(red());
        assert_eq!(p.node().live_children(), 0);
    }

    #[test]
    fn detach_releases_renderer_and_node() {
        let root = Node::root("root");
        let img = Bitmap::new(&root, 2, 2);
        let p = Paint::line_stroke(&root, img.clone(), Color::white(), 3.0);
        assert_eq!(p.mode(), PaintMode::Stroke);
        assert_eq!(root.live_children(), 2);

        p.detach();
        assert_eq!(img.ref_count(), 1);
        assert_eq!(root.live_children(), 1);
    }

    #[test]
    #[should_panic(expected = "detached node")]
    fn paint_under_detached_parent_panics() {
        let root = Node::root("root");
        let layer = root.child("layer");
        layer.detach();
        let _ = Paint::solid(&layer, red());
    }

    // ── draw path ─────────────────────────────────────────────────────────

    #[test]
    fn solid_fill_uses_color_program() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 32, 32);
        let mut p = Paint::solid(&root, Color::new(1.0, 0.0, 0.0, 0.5));
        let pass = p.fill_rect(&target, Rect::new(4.0, 4.0, 8.0, 8.0));

        assert_eq!(pass.program, Program::Color);
        assert_eq!(pass.blend, BlendMode::Alpha);
        assert!(pass.texture(0).is_none());
        assert_eq!(pass.draws, vec![0..4]);
        assert_eq!(pass.vertices[0].position, [4.0, 4.0, 0.0]);
        assert_eq!(pass.vertices[3].position, [12.0, 12.0, 0.0]);
        assert_eq!(pass.vertices[1].color, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn bitmap_fill_maps_bounding_box_uvs() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 32, 32);
        let img = Bitmap::new(&root, 4, 4);
        let mut p = Paint::bitmap_fill(&root, img.clone(), Color::white());
        let pass = p.fill_rect(&target, Rect::new(8.0, 8.0, 16.0, 8.0));

        assert_eq!(pass.program, Program::Texture);
        assert_eq!(pass.sampler, Sampler::Clamp);
        assert!(pass.texture(0).is_some_and(|t| t.ptr_eq(&img)));
        let uvs: Vec<[f32; 2]> = pass.vertices.iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
    }

    #[test]
    fn pattern_fill_repeats_with_wrap_sampler() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 64, 64);
        let tile = Bitmap::new(&root, 8, 8);
        let mut p = Paint::pattern_fill(&root, tile, Size::one(), Vec2::zero());
        let pass = p.fill_rect(&target, Rect::new(16.0, 0.0, 32.0, 16.0));

        assert_eq!(pass.sampler, Sampler::Wrap);
        // 32x16 px over 8x8 tiles, anchored at x = 16 px (2 tiles).
        assert_eq!(pass.vertices[0].uv, [2.0, 0.0]);
        assert_eq!(pass.vertices[3].uv, [6.0, 2.0]);
    }

    #[test]
    fn radial_fill_bakes_once_across_draws() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 32, 32);
        let mut p = Paint::radial_fill(&root, ColorGradient::black_white());
        let a = p.fill_rect(&target, Rect::new(0.0, 0.0, 32.0, 32.0));
        let b = p.fill_rect(&target, Rect::new(0.0, 0.0, 16.0, 16.0));

        let (ta, tb) = (a.texture(0).map(Bitmap::id), b.texture(0).map(Bitmap::id));
        assert!(ta.is_some());
        assert_eq!(ta, tb);
        assert_eq!(p.node().live_children(), 1);
    }

    #[test]
    fn stroke_segment_traces_along_length() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 64, 64);
        let dash = Bitmap::new(&root, 4, 1);
        let mut p = Paint::line_stroke(&root, dash, Color::white(), 2.0);
        let pass = p.stroke_segment(&target, Vec2::new(10.0, 10.0), Vec2::new(30.0, 10.0));

        assert_eq!(pass.program, Program::Texture);
        // Perpendicular offset of half the stroke width.
        assert_eq!(pass.vertices[0].position, [10.0, 11.0, 0.0]);
        assert_eq!(pass.vertices[2].position, [10.0, 9.0, 0.0]);
        // 20 px along a 4 px texture: 5 repeats.
        assert_eq!(pass.vertices[1].uv, [5.0, 0.0]);
        assert_eq!(pass.vertices[3].uv, [5.0, 1.0]);
    }

    #[test]
    fn empty_paint_draws_white() {
        let root = Node::root("root");
        let target = Bitmap::new(&root, 8, 8);
        let mut p = Paint::new(&root);
        let pass = p.fill_rect(&target, Rect::new(0.0, 0.0, 8.0, 8.0));
        assert_eq!(pass.program, Program::Color);
        assert_eq!(pass.vertices[0].color, Color::white().to_array());
    }
}
