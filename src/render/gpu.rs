use std::fmt;
use std::sync::{Arc, Mutex};

use crate::{
    foundation::core::{ImageFrame, PixelFormat},
    foundation::error::{RecolorError, RecolorResult},
    render::{
        backend::{ExecutionDomain, Frame, RecolorBackend, RecolorSettings, wrong_domain},
        lifecycle::{ProgramPhase, ProgramState},
        shader,
        texels::{UploadRole, align_to, expand_to_rgba8, unpad_rows},
    },
};

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(crate) struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

/// A GPU device used as a mutually exclusive rendering context.
///
/// Every upload, render and readback runs with the context lock held, so two invocations
/// never interleave their submissions.
pub struct GpuContext {
    inner: Mutex<GpuDevice>,
    adapter_name: String,
}

impl fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_name)
            .finish_non_exhaustive()
    }
}

impl GpuContext {
    pub fn new() -> RecolorResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                RecolorError::gpu("no gpu adapter available")
            }
            other => RecolorError::gpu(format!("wgpu request_adapter failed: {other:?}")),
        })?;
        let adapter_name = adapter.get_info().name;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("recolor_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| RecolorError::gpu(format!("wgpu request_device failed: {e:?}")))?;

        tracing::debug!(adapter = %adapter_name, "gpu context ready");
        Ok(Self {
            inner: Mutex::new(GpuDevice { device, queue }),
            adapter_name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub(crate) fn with_context<R>(
        &self,
        f: impl FnOnce(&GpuDevice) -> RecolorResult<R>,
    ) -> RecolorResult<R> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| RecolorError::gpu("gpu context lock poisoned"))?;
        f(&guard)
    }

    pub fn upload(&self, frame: &ImageFrame, role: UploadRole) -> RecolorResult<GpuImage> {
        self.with_context(|gpu| Ok(upload_locked(gpu, frame, role)))
    }

    pub fn download(&self, image: &GpuImage) -> RecolorResult<ImageFrame> {
        self.with_context(|gpu| download_locked(gpu, image))
    }
}

#[derive(Debug)]
pub struct GpuImage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn release(self) {
        self.texture.destroy();
    }
}

fn create_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn upload_locked(gpu: &GpuDevice, frame: &ImageFrame, role: UploadRole) -> GpuImage {
    let (width, height) = frame.dimensions();
    let rgba = expand_to_rgba8(frame, role);
    let (texture, view) = create_texture(
        &gpu.device,
        width,
        height,
        "recolor_source",
        wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
    );
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    GpuImage {
        texture,
        view,
        width,
        height,
    }
}

fn download_locked(gpu: &GpuDevice, image: &GpuImage) -> RecolorResult<ImageFrame> {
    let bytes_per_row = align_to(
        image
            .width
            .checked_mul(4)
            .ok_or_else(|| RecolorError::gpu("readback width overflow"))?,
        wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
    );
    let size = u64::from(bytes_per_row)
        .checked_mul(u64::from(image.height))
        .ok_or_else(|| RecolorError::gpu("readback buffer size overflow"))?;

    let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("recolor_readback"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("recolor_readback_encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &image.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(image.height),
            },
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(Some(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    gpu.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| RecolorError::gpu(format!("wgpu poll failed: {e:?}")))?;
    rx.recv()
        .map_err(|_| RecolorError::gpu("readback channel closed"))?
        .map_err(|e| RecolorError::gpu(format!("readback map failed: {e:?}")))?;

    let mapped = slice.get_mapped_range();
    let data = unpad_rows(&mapped, image.width, image.height, bytes_per_row as usize)?;
    drop(mapped);
    readback.unmap();
    readback.destroy();

    ImageFrame::new(image.width, image.height, PixelFormat::Rgba8, data)
}

struct RecolorProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    recolor: wgpu::Buffer,
    quad: wgpu::Buffer,
}

impl RecolorProgram {
    fn build(gpu: &GpuDevice, settings: &RecolorSettings) -> RecolorResult<Self> {
        let device = &gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let source = shader::recolor_shader_source(settings.mask_channel);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("recolor_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("recolor_bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: shader::BINDING_RECOLOR,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(16),
                        },
                        count: None,
                    },
                    texture_entry(shader::BINDING_FRAME),
                    texture_entry(shader::BINDING_MASK),
                    wgpu::BindGroupLayoutEntry {
                        binding: shader::BINDING_SAMPLER,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("recolor_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("recolor_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(shader::VERTEX_ENTRY),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: shader::QUAD_VERTEX_STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: shader::ATTRIB_POSITION,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 8,
                            shader_location: shader::ATTRIB_TEXTURE_COORDINATE,
                        },
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(shader::FRAGMENT_ENTRY),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TEXTURE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RecolorError::precondition(format!(
                "problem initializing the recolor program: {err}"
            )));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("recolor_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let recolor = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("recolor_params"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(
            &recolor,
            0,
            &shader::recolor_uniform_bytes(settings.color.normalized()),
        );

        let quad_bytes = shader::quad_vertex_bytes();
        let quad = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("recolor_quad"),
            size: quad_bytes.len() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(&quad, 0, &quad_bytes);

        tracing::debug!(
            component = %settings.mask_channel.shader_component(),
            "recolor program initialized"
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            sampler,
            recolor,
            quad,
        })
    }

    fn draw(&self, gpu: &GpuDevice, image: &GpuImage, mask: &GpuImage) -> GpuImage {
        let device = &gpu.device;
        let (dst_texture, dst_view) = create_texture(
            device,
            image.width,
            image.height,
            "recolor_destination",
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("recolor_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: shader::BINDING_RECOLOR,
                    resource: self.recolor.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: shader::BINDING_FRAME,
                    resource: wgpu::BindingResource::TextureView(&image.view),
                },
                wgpu::BindGroupEntry {
                    binding: shader::BINDING_MASK,
                    resource: wgpu::BindingResource::TextureView(&mask.view),
                },
                wgpu::BindGroupEntry {
                    binding: shader::BINDING_SAMPLER,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("recolor_encoder"),
        });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("recolor_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &bind_group, &[]);
            rp.set_vertex_buffer(0, self.quad.slice(..));
            rp.draw(0..4, 0..1);
        }
        gpu.queue.submit(Some(encoder.finish()));

        GpuImage {
            texture: dst_texture,
            view: dst_view,
            width: image.width,
            height: image.height,
        }
    }

    fn release(self) {
        self.recolor.destroy();
        self.quad.destroy();
    }
}

pub struct GpuBackend {
    ctx: Arc<GpuContext>,
    settings: RecolorSettings,
    program: ProgramState<RecolorProgram>,
}

impl GpuBackend {
    pub fn new(ctx: Arc<GpuContext>, settings: RecolorSettings) -> Self {
        Self {
            ctx,
            settings,
            program: ProgramState::Uninitialized,
        }
    }

    pub fn phase(&self) -> ProgramPhase {
        self.program.phase()
    }

    pub fn render_textures(
        &mut self,
        image: &GpuImage,
        mask: &GpuImage,
    ) -> RecolorResult<GpuImage> {
        let settings = self.settings;
        let program = &mut self.program;
        self.ctx.with_context(|gpu| {
            let program = program.get_or_init(|| RecolorProgram::build(gpu, &settings))?;
            Ok(program.draw(gpu, image, mask))
        })
    }
}

impl RecolorBackend for GpuBackend {
    fn domain(&self) -> ExecutionDomain {
        ExecutionDomain::Gpu
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn render(&mut self, image: &Frame, mask: Option<&Frame>) -> RecolorResult<Option<Frame>> {
        let image = image
            .as_gpu()
            .ok_or_else(|| wrong_domain("image", image.domain(), ExecutionDomain::Gpu))?;
        let Some(mask) = mask else {
            tracing::trace!("no mask for this invocation, skipping");
            return Ok(None);
        };
        let mask = mask
            .as_gpu()
            .ok_or_else(|| wrong_domain("mask", mask.domain(), ExecutionDomain::Gpu))?;

        self.render_textures(image, mask)
            .map(|out| Some(Frame::Gpu(out)))
    }

    fn close(&mut self) -> RecolorResult<()> {
        let program = &mut self.program;
        if let Some(p) = program.release() {
            self.ctx.with_context(|_| {
                p.release();
                Ok(())
            })?;
            tracing::debug!("recolor program released");
        }
        Ok(())
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
