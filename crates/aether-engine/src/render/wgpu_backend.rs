use std::collections::HashMap;
use std::future::Future;

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::channel::oneshot;
use wgpu::util::DeviceExt;

use crate::device::{HeadlessInit, request_headless_device};
use crate::paint::BlendMode;
use crate::texture::{Bitmap, TextureId, WeakBitmap};

use super::{DrawPass, PassCompletion, PassError, Program, RenderBackend, Sampler, TextureVertex, Uniforms};

/// Texel format of every bitmap mirrored on the GPU.
pub const BITMAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// wgpu implementation of [`RenderBackend`].
///
/// Bitmaps are mirrored as `Bgra8Unorm` textures keyed by [`TextureId`] and
/// re-uploaded when their pixel generation changes. A bitmap rendered into
/// keeps its result on the GPU until [`read_pixels`](Self::read_pixels) copies
/// it back. Mirrors are dropped once the owning bitmap is gone.
///
/// Pipelines are built lazily, one per `(program, blend)` pair.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    shaders: HashMap<Program, wgpu::ShaderModule>,
    pipelines: HashMap<(Program, BlendMode), wgpu::RenderPipeline>,
    samplers: HashMap<Sampler, wgpu::Sampler>,
    textures: HashMap<TextureId, GpuTexture>,
    fallback: Option<GpuTexture>,
}

struct GpuTexture {
    owner: WeakBitmap,
    generation: u64,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("aether pass bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Uniforms>() as u64),
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("aether pass pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            device,
            queue,
            bind_group_layout,
            pipeline_layout,
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            textures: HashMap::new(),
            fallback: None,
        }
    }

    /// Creates a backend on a freshly acquired headless device.
    pub fn headless(init: HeadlessInit) -> Result<Self> {
        let (device, queue) = pollster::block_on(request_headless_device(init))?;
        Ok(Self::new(device, queue))
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Waits on the device until `fut` resolves.
    ///
    /// Pass completions and buffer mappings are delivered from `Device::poll`,
    /// so awaiting them on a plain executor would never wake. Fails if the
    /// poll fails, or if `fut` is still pending once the queue is idle.
    pub fn block_on<F: Future + Unpin>(&self, mut fut: F) -> Result<F::Output> {
        loop {
            if let Some(out) = (&mut fut).now_or_never() {
                return Ok(out);
            }
            let status = self
                .device
                .poll(wgpu::PollType::wait_indefinitely())
                .context("device poll failed")?;
            if status.is_queue_empty() {
                return (&mut fut)
                    .now_or_never()
                    .context("future still pending with an idle device queue");
            }
        }
    }

    /// Copies the GPU contents of `bitmap` back into its pixel buffer.
    pub fn read_pixels(&mut self, bitmap: &Bitmap) -> Result<()> {
        let id = bitmap.id();
        let (w, h) = (bitmap.width(), bitmap.height());
        let unpadded = w * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let gpu = self
            .textures
            .get(&id)
            .with_context(|| format!("bitmap {id:?} has no GPU mirror"))?;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("aether readback buffer"),
            size: u64::from(padded) * u64::from(h),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("aether readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(h),
                },
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = oneshot::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.block_on(rx)?
            .context("readback mapping was dropped")?
            .context("failed to map readback buffer")?;

        let pixels: Vec<u32> = {
            let data = buffer.slice(..).get_mapped_range();
            data.chunks(padded as usize)
                .flat_map(|row| {
                    row[..unpadded as usize]
                        .chunks_exact(4)
                        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                })
                .collect()
        };
        buffer.unmap();

        bitmap.set_pixels(&pixels);
        // CPU copy now matches the GPU; skip the redundant upload.
        if let Some(t) = self.textures.get_mut(&id) {
            t.generation = bitmap.generation();
        }
        log::debug!("wgpu: read back {w}x{h} pixels of {id:?}");
        Ok(())
    }

    fn encode(&mut self, pass: &DrawPass) -> Result<wgpu::CommandBuffer, PassError> {
        if pass.texture(0).is_some_and(|t| t.ptr_eq(&pass.target))
            || pass.texture(1).is_some_and(|t| t.ptr_eq(&pass.target))
        {
            return Err(PassError::Unsupported("target is also bound as a texture".into()));
        }

        self.ensure_texture(&pass.target)?;
        for t in pass.textures.iter().flatten() {
            self.ensure_texture(t)?;
        }
        self.ensure_pipeline(pass.program, pass.blend);
        self.ensure_sampler(pass.sampler);
        self.ensure_fallback();

        let pipeline = self.pipelines.get(&(pass.program, pass.blend)).ok_or_else(|| missing("pipeline"))?;
        let sampler = self.samplers.get(&pass.sampler).ok_or_else(|| missing("sampler"))?;
        let fallback = self.fallback.as_ref().ok_or_else(|| missing("fallback texture"))?;
        let target = self.textures.get(&pass.target.id()).ok_or_else(|| missing("target texture"))?;
        let view = |slot: usize| match pass.texture(slot) {
            Some(t) => self.textures.get(&t.id()).map(|g| &g.view).ok_or_else(|| missing("texture")),
            None => Ok(&fallback.view),
        };
        let (view0, view1) = (view(0)?, view(1)?);

        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("aether pass ubo"),
            contents: bytemuck::bytes_of(&pass.uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("aether pass bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(view0) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(view1) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("aether pass encoder"),
        });

        if !pass.vertices.is_empty() {
            let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("aether pass vbo"),
                contents: bytemuck::cast_slice(&pass.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.program.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            for range in &pass.draws {
                rpass.draw(range.clone(), 0..1);
            }
        }

        Ok(encoder.finish())
    }

    fn ensure_texture(&mut self, bitmap: &Bitmap) -> Result<(), PassError> {
        let id = bitmap.id();
        if !self.textures.contains_key(&id) {
            let max = self.device.limits().max_texture_dimension_2d;
            if bitmap.width() > max || bitmap.height() > max {
                return Err(PassError::Unsupported(format!(
                    "bitmap {}x{} exceeds device limit {max}",
                    bitmap.width(),
                    bitmap.height()
                )));
            }
            let mut gpu = create_texture(&self.device, bitmap.width(), bitmap.height(), "aether bitmap");
            gpu.owner = bitmap.downgrade();
            self.textures.insert(id, gpu);
            log::trace!("wgpu: created mirror for {id:?}");
        }

        if let Some(gpu) = self.textures.get_mut(&id) {
            if gpu.generation != bitmap.generation() {
                write_pixels(&self.queue, &gpu.texture, bitmap.width(), bitmap.height(), &bitmap.to_bgra_bytes());
                gpu.generation = bitmap.generation();
            }
        }
        Ok(())
    }

    fn ensure_fallback(&mut self) {
        if self.fallback.is_some() {
            return;
        }
        let gpu = create_texture(&self.device, 1, 1, "aether fallback texture");
        write_pixels(&self.queue, &gpu.texture, 1, 1, &u32::MAX.to_le_bytes());
        self.fallback = Some(gpu);
    }

    fn ensure_sampler(&mut self, sampler: Sampler) {
        if self.samplers.contains_key(&sampler) {
            return;
        }
        let mode = match sampler {
            Sampler::Clamp => wgpu::AddressMode::ClampToEdge,
            Sampler::Wrap => wgpu::AddressMode::Repeat,
        };
        let s = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(sampler.name()),
            address_mode_u: mode,
            address_mode_v: mode,
            address_mode_w: mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });
        self.samplers.insert(sampler, s);
    }

    fn ensure_pipeline(&mut self, program: Program, blend: BlendMode) {
        if self.pipelines.contains_key(&(program, blend)) {
            return;
        }

        let device = &self.device;
        let shader: &wgpu::ShaderModule = self.shaders.entry(program).or_insert_with(|| {
            let fragment = match program {
                Program::Color => include_str!("shaders/color.wgsl"),
                Program::Texture => include_str!("shaders/texture.wgsl"),
                Program::GradientMap => include_str!("shaders/gradient.wgsl"),
            };
            let source = format!("{}\n{}", include_str!("shaders/common.wgsl"), fragment);
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.name()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.name()),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[TextureVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: BITMAP_FORMAT,
                    blend: Some(blend_state(blend)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("wgpu: built pipeline {} / {blend:?}", program.name());
        self.pipelines.insert((program, blend), pipeline);
    }

    fn prune(&mut self) {
        let before = self.textures.len();
        self.textures.retain(|_, t| t.owner.is_alive());
        let dropped = before - self.textures.len();
        if dropped > 0 {
            log::trace!("wgpu: released {dropped} bitmap mirror(s)");
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn submit(&mut self, pass: DrawPass) -> PassCompletion {
        let (signal, completion) = PassCompletion::channel();
        match self.encode(&pass) {
            Ok(commands) => {
                self.queue.submit(std::iter::once(commands));
                self.queue.on_submitted_work_done(move || signal.complete(Ok(())));
            }
            Err(e) => {
                log::warn!("wgpu: {} pass rejected: {e}", pass.program.name());
                signal.complete(Err(e));
            }
        }
        // The pass (and its bitmap handles) is released here; the GPU keeps
        // its own references to in-flight resources.
        drop(pass);
        self.prune();
        completion
    }
}

fn missing(what: &str) -> PassError {
    PassError::Device(format!("{what} unavailable after initialization"))
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: BITMAP_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        owner: WeakBitmap::dangling(),
        // Forces the first upload.
        generation: u64::MAX,
        texture,
        view,
    }
}

fn write_pixels(queue: &wgpu::Queue, texture: &wgpu::Texture, width: u32, height: u32, bytes: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
}

/// Fixed-function blend for a paint blend mode (straight alpha).
pub(crate) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Opaque => wgpu::BlendState::REPLACE,
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Add => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        BlendMode::Multiply => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        },
    }
}
