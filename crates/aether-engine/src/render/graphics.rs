use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::{BlendMode, Color};
use crate::texture::Bitmap;

use super::{PassCompletion, RenderBackend};

/// Number of texture slots a pass can bind.
pub const MAX_TEXTURES: usize = 2;

/// Shader programs known to backends.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Program {
    /// Vertex color only.
    Color,
    /// Texture slot 0 modulated by vertex color.
    Texture,
    /// Luminance of slot 0 looked up in the ramp bound at slot 1.
    GradientMap,
}

impl Program {
    pub const fn name(self) -> &'static str {
        match self {
            Program::Color => "program.color",
            Program::Texture => "program.texture",
            Program::GradientMap => "program.gradient",
        }
    }
}

/// Sampler policies known to backends.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Sampler {
    Clamp,
    Wrap,
}

impl Sampler {
    pub const fn name(self) -> &'static str {
        match self {
            Sampler::Clamp => "sampler.clamp",
            Sampler::Wrap => "sampler.wrap",
        }
    }
}

/// Vertex layout shared by all programs (36 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TextureVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl TextureVertex {
    pub(crate) const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x2, // uv
        2 => Float32x4  // color
    ];

    #[inline]
    pub fn new(position: Vec2, uv: Vec2, color: Color) -> Self {
        Self {
            position: [position.x, position.y, 0.0],
            uv: [uv.x, uv.y],
            color: color.to_array(),
        }
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TextureVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Per-pass uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    /// Column-major transform from target pixels to NDC.
    pub matrix: [[f32; 4]; 4],
}

/// Orthographic pixel → NDC transform for a `width × height` target
/// (top-left origin, +Y down).
pub fn pixel_matrix(width: f32, height: f32) -> [[f32; 4]; 4] {
    let w = width.max(1.0);
    let h = height.max(1.0);
    [
        [2.0 / w, 0.0, 0.0, 0.0],
        [0.0, -2.0 / h, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0, 1.0],
    ]
}

/// A fully recorded draw pass, ready for submission.
///
/// Bound bitmaps are held by handle, so they stay alive until the backend
/// drops the pass after completion.
#[derive(Debug)]
pub struct DrawPass {
    pub target: Bitmap,
    pub program: Program,
    pub blend: BlendMode,
    pub sampler: Sampler,
    pub uniforms: Uniforms,
    pub vertices: Vec<TextureVertex>,
    pub textures: [Option<Bitmap>; MAX_TEXTURES],
    /// Triangle-strip draws as vertex ranges.
    pub draws: Vec<Range<u32>>,
}

impl DrawPass {
    #[inline]
    pub fn texture(&self, index: usize) -> Option<&Bitmap> {
        self.textures.get(index).and_then(Option::as_ref)
    }
}

/// Draw-pass recorder targeting a bitmap.
///
/// ```
/// use aether_engine::paint::BlendMode;
/// use aether_engine::render::{Graphics, Program};
/// use aether_engine::scene::Node;
/// use aether_engine::texture::Bitmap;
///
/// let root = Node::root("doc");
/// let target = Bitmap::new(&root, 8, 8);
/// let mut g = Graphics::new(&target);
/// g.program(Program::Color, BlendMode::Opaque).draw_triangle_strip(0);
/// assert_eq!(g.finish().draws.len(), 1);
/// ```
pub struct Graphics {
    pass: DrawPass,
    cursor: u32,
}

impl Graphics {
    pub fn new(target: &Bitmap) -> Self {
        let size = target.size();
        Self {
            pass: DrawPass {
                target: target.clone(),
                program: Program::Color,
                blend: BlendMode::Opaque,
                sampler: Sampler::Clamp,
                uniforms: Uniforms { matrix: pixel_matrix(size.w, size.h) },
                vertices: Vec::new(),
                textures: [None, None],
                draws: Vec::new(),
            },
            cursor: 0,
        }
    }

    /// Current transform of the target (pixel space → NDC).
    pub fn matrix(&self) -> [[f32; 4]; 4] {
        let size = self.pass.target.size();
        pixel_matrix(size.w, size.h)
    }

    pub fn program(&mut self, program: Program, blend: BlendMode) -> &mut Self {
        self.pass.program = program;
        self.pass.blend = blend;
        self
    }

    pub fn uniforms(&mut self, matrix: [[f32; 4]; 4]) -> &mut Self {
        self.pass.uniforms = Uniforms { matrix };
        self
    }

    /// Appends `count` vertices filled in by `fill`.
    pub fn texture_vertices(&mut self, count: usize, fill: impl FnOnce(&mut [TextureVertex])) -> &mut Self {
        let start = self.pass.vertices.len();
        self.pass.vertices.resize(start + count, TextureVertex::default());
        fill(&mut self.pass.vertices[start..]);
        self
    }

    pub fn sampler(&mut self, sampler: Sampler) -> &mut Self {
        self.pass.sampler = sampler;
        self
    }

    /// Binds `texture` to slot `index`, replacing any previous binding.
    ///
    /// # Panics
    /// Panics if `index >= MAX_TEXTURES`.
    pub fn use_texture(&mut self, texture: &Bitmap, index: usize) -> &mut Self {
        assert!(index < MAX_TEXTURES, "texture slot {index} out of range");
        self.pass.textures[index] = Some(texture.clone());
        self
    }

    /// Draws the next `count` recorded vertices as a triangle strip.
    ///
    /// # Panics
    /// Panics if fewer than `count` vertices remain undrawn.
    pub fn draw_triangle_strip(&mut self, count: u32) -> &mut Self {
        let end = self.cursor + count;
        assert!(
            end as usize <= self.pass.vertices.len(),
            "draw of {count} vertices exceeds the {} recorded",
            self.pass.vertices.len()
        );
        self.pass.draws.push(self.cursor..end);
        self.cursor = end;
        self
    }

    pub fn finish(self) -> DrawPass {
        self.pass
    }

    /// Submits the recorded pass; the returned completion resolves when the
    /// backend has executed it.
    pub fn done(self, backend: &mut dyn RenderBackend) -> PassCompletion {
        let pass = self.finish();
        log::trace!(
            "submit {} ({:?}, {}) → {:?}: {} draw(s)",
            pass.program.name(),
            pass.blend,
            pass.sampler.name(),
            pass.target.id(),
            pass.draws.len()
        );
        backend.submit(pass)
    }
}
