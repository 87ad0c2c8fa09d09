//! Draw submission.
//!
//! A [`Graphics`] recorder turns draw calls into a [`DrawPass`]; a
//! [`RenderBackend`] executes passes asynchronously and reports the outcome
//! through a [`PassCompletion`] future.
//!
//! Backends:
//! - [`WgpuBackend`]: executes on a wgpu device, bitmaps mirrored as textures
//! - [`RecordingBackend`]: queues passes until completed by hand

mod backend;
mod graphics;
mod recording;
mod wgpu_backend;

pub use backend::{PassCompletion, PassError, PassResult, PassSignal, RenderBackend};
pub use graphics::{
    DrawPass, Graphics, MAX_TEXTURES, Program, Sampler, TextureVertex, Uniforms, pixel_matrix,
};
pub use recording::RecordingBackend;
pub use wgpu_backend::{BITMAP_FORMAT, WgpuBackend};
