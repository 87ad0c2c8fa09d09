use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use crate::coords::Rect;
use crate::render::{Graphics, PassCompletion, PassResult, Program, RenderBackend, Sampler, TextureVertex};
use crate::texture::Bitmap;

use super::{BlendMode, Color, ColorGradient};

/// Sample count of the lookup ramp bound by [`ColorGradient::process`].
pub const GRADIENT_LUT_WIDTH: u32 = 16;

impl ColorGradient {
    /// Gradient-maps `source` into `destination`.
    ///
    /// Each destination pixel takes the ramp color at the luminance of the
    /// matching source pixel, tinted by `color` and composited with `blend`.
    /// The pass is submitted immediately; the returned [`GradientPass`]
    /// resolves once the backend has executed it, and only then releases the
    /// temporary lookup ramp.
    pub fn process(
        &self,
        source: &Bitmap,
        destination: &Bitmap,
        blend: BlendMode,
        color: Color,
        backend: &mut dyn RenderBackend,
    ) -> GradientPass {
        let lut = self.create_bitmap(destination.node(), GRADIENT_LUT_WIDTH);

        let quad = destination.bounds().strip();
        let uv = Rect::unit().strip();

        let mut g = Graphics::new(destination);
        let matrix = g.matrix();
        g.program(Program::GradientMap, blend)
            .uniforms(matrix)
            .texture_vertices(4, |v| {
                for (i, vert) in v.iter_mut().enumerate() {
                    *vert = TextureVertex::new(quad[i], uv[i], color);
                }
            })
            .sampler(Sampler::Clamp)
            .use_texture(source, 0)
            .use_texture(&lut, 1)
            .draw_triangle_strip(4);

        log::debug!(
            "gradient map: {:?} -> {:?} ({blend:?}, {} keys)",
            source.id(),
            destination.id(),
            self.len()
        );

        GradientPass {
            completion: g.done(backend),
            lut: Some(lut),
        }
    }
}

/// In-flight gradient-map pass.
///
/// Holds the lookup ramp until the backend reports completion. Resolves to the
/// backend's [`PassResult`]; failures are logged, never retried.
#[derive(Debug)]
#[must_use = "the lookup ramp is released only once the pass is awaited"]
pub struct GradientPass {
    completion: PassCompletion,
    lut: Option<Bitmap>,
}

impl GradientPass {
    /// The temporary ramp, while the pass is still in flight.
    #[inline]
    pub fn lut(&self) -> Option<&Bitmap> {
        self.lut.as_ref()
    }
}

impl Future for GradientPass {
    type Output = PassResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<PassResult> {
        let result = ready!(Pin::new(&mut self.completion).poll(cx));
        if let Some(lut) = self.lut.take() {
            lut.detach();
        }
        if let Err(e) = &result {
            log::warn!("gradient map pass failed: {e}");
        }
        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PassError, RecordingBackend};
    use crate::scene::Node;

    fn setup() -> (Node, Bitmap, Bitmap) {
        let root = Node::root("root");
        let source = Bitmap::new(&root, 8, 4);
        let destination = Bitmap::new(&root, 8, 4);
        (root, source, destination)
    }

    // ── pass recording ────────────────────────────────────────────────────

    #[test]
    fn records_gradient_map_pass() {
        let (_root, source, destination) = setup();
        let mut backend = RecordingBackend::new();
        let tint = Color::new(1.0, 1.0, 1.0, 0.5);

        let _pass = ColorGradient::rainbow().process(&source, &destination, BlendMode::Alpha, tint, &mut backend);

        assert_eq!(backend.submitted(), 1);
        let pass = backend.pending().next().expect("pending pass");
        assert_eq!(pass.program, Program::GradientMap);
        assert_eq!(pass.blend, BlendMode::Alpha);
        assert_eq!(pass.sampler, Sampler::Clamp);
        assert!(pass.target.ptr_eq(&destination));
        assert!(pass.texture(0).is_some_and(|t| t.ptr_eq(&source)));

        let lut = pass.texture(1).expect("lut bound");
        assert_eq!((lut.width(), lut.height()), (GRADIENT_LUT_WIDTH, 1));

        let uvs: Vec<[f32; 2]> = pass.vertices.iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        assert_eq!(pass.vertices[3].position, [8.0, 4.0, 0.0]);
        assert_eq!(pass.vertices[0].color, tint.to_array());
    }

    #[test]
    fn lut_samples_the_gradient() {
        let (_root, source, destination) = setup();
        let mut backend = RecordingBackend::new();
        let pass = ColorGradient::black_white().process(
            &source,
            &destination,
            BlendMode::Opaque,
            Color::white(),
            &mut backend,
        );

        let lut = pass.lut().expect("lut held while in flight");
        assert_eq!(lut.pixel(0, 0), 0xFF00_0000);
        assert_eq!(lut.pixel(GRADIENT_LUT_WIDTH - 1, 0), 0xFFFF_FFFF);
    }

    // ── lut lifetime ──────────────────────────────────────────────────────

    #[test]
    fn lut_released_after_completion() {
        let (_root, source, destination) = setup();
        let mut backend = RecordingBackend::new();
        let pass = ColorGradient::black_white().process(
            &source,
            &destination,
            BlendMode::Opaque,
            Color::white(),
            &mut backend,
        );

        assert_eq!(destination.node().live_children(), 1);

        let executed = backend.complete_next(Ok(()));
        drop(executed);
        // Completed but not yet observed: the pass still owns the ramp.
        assert_eq!(destination.node().live_children(), 1);

        assert_eq!(pollster::block_on(pass), Ok(()));
        assert_eq!(destination.node().live_children(), 0);
    }

    #[test]
    fn dropped_future_leaves_lut_with_backend() {
        let (_root, source, destination) = setup();
        let mut backend = RecordingBackend::new();
        let pass = ColorGradient::rainbow().process(
            &source,
            &destination,
            BlendMode::Add,
            Color::white(),
            &mut backend,
        );

        drop(pass);
        // The queued pass still references the ramp.
        assert_eq!(destination.node().live_children(), 1);

        assert_eq!(backend.complete_all(Ok(())), 1);
        assert_eq!(destination.node().live_children(), 0);
    }

    #[test]
    fn device_failure_is_reported_and_lut_released() {
        let (_root, source, destination) = setup();
        let mut backend = RecordingBackend::new();
        let pass = ColorGradient::rainbow().process(
            &source,
            &destination,
            BlendMode::Multiply,
            Color::white(),
            &mut backend,
        );

        drop(backend.complete_next(Err(PassError::Device("lost".into()))));
        assert_eq!(pollster::block_on(pass), Err(PassError::Device("lost".into())));
        assert_eq!(destination.node().live_children(), 0);
    }

    #[test]
    fn dropped_backend_cancels() {
        let (_root, source, destination) = setup();
        let mut backend = RecordingBackend::new();
        let pass = ColorGradient::black_white().process(
            &source,
            &destination,
            BlendMode::Opaque,
            Color::white(),
            &mut backend,
        );

        drop(backend);
        assert_eq!(pollster::block_on(pass), Err(PassError::Cancelled));
        assert_eq!(destination.node().live_children(), 0);
    }
}
