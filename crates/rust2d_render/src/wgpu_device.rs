//! wgpu-backed graphics device
//!
//! Draws into a window surface. Each `draw_instanced` records and submits
//! its own render pass: the instance buffer and uniforms are rewritten by
//! every flush, and `Queue::write_buffer` only takes effect at the next
//! submit, so one submit per flush keeps writes and draws in order.

use std::collections::HashMap;
use std::sync::Arc;

use rust2d_math::Color;
use winit::window::Window;

use crate::device::{
    check_texture_data, DeviceError, GraphicsDevice, PrimitiveMode, ProgramKind, TextureId,
};
use crate::types::{FrameUniforms, InstanceData};

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    /// Clear color not yet applied by a render pass
    clear: Option<wgpu::Color>,
}

/// Graphics device drawing to a winit window through wgpu
pub struct WgpuDevice {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipelines: HashMap<(PrimitiveMode, ProgramKind), wgpu::RenderPipeline>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    textures: HashMap<TextureId, GpuTexture>,
    next_texture: u32,
    frame: Option<Frame>,
    program: ProgramKind,
    bound_texture: Option<TextureId>,
}

impl WgpuDevice {
    /// Create a device for `window` with room for `instance_capacity` instances
    pub fn new(window: Arc<Window>, vsync: bool, instance_capacity: usize) -> Result<Self, DeviceError> {
        pollster::block_on(Self::new_async(window, vsync, instance_capacity))
    }

    async fn new_async(window: Arc<Window>, vsync: bool, instance_capacity: usize) -> Result<Self, DeviceError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| DeviceError::CreateSurface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DeviceError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Rust2D Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| DeviceError::RequestDevice(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| DeviceError::CreateSurface("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Using adapter {:?}, surface {}x{} {:?}",
            adapter.get_info().name,
            config.width,
            config.height,
            format
        );

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&frame_buffer, 0, bytemuck::bytes_of(&FrameUniforms::default()));

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Batch Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let flat_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flat Pipeline Layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Textured Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        for mode in [PrimitiveMode::Filled, PrimitiveMode::Outline] {
            for program in [ProgramKind::Flat, ProgramKind::Textured] {
                let layout = match program {
                    ProgramKind::Flat => &flat_layout,
                    ProgramKind::Textured => &textured_layout,
                };
                let pipeline = create_pipeline(&device, &shader, layout, format, mode, program);
                pipelines.insert((mode, program), pipeline);
            }
        }

        let instance_capacity = instance_capacity.max(1);
        let instance_buffer = create_instance_buffer(&device, instance_capacity);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipelines,
            frame_buffer,
            frame_bind_group,
            texture_layout,
            sampler,
            instance_buffer,
            instance_capacity,
            textures: HashMap::new(),
            next_texture: 0,
            frame: None,
            program: ProgramKind::Flat,
            bound_texture: None,
        })
    }

    /// Reconfigure the surface if the window size changed
    fn sync_surface_size(&mut self) {
        let size = self.window.inner_size();
        if size.width > 0
            && size.height > 0
            && (size.width != self.config.width || size.height != self.config.height)
        {
            self.config.width = size.width;
            self.config.height = size.height;
            self.surface.configure(&self.device, &self.config);
            log::debug!("Surface resized to {}x{}", size.width, size.height);
        }
    }

    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, DeviceError> {
        match self.surface.get_current_texture() {
            Ok(output) => Ok(Some(output)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                match self.surface.get_current_texture() {
                    Ok(output) => Ok(Some(output)),
                    Err(_) => Err(DeviceError::SurfaceLost),
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(DeviceError::OutOfMemory),
            Err(e) => {
                log::warn!("Skipping frame: {:?}", e);
                Ok(None)
            }
        }
    }

    /// Run a render pass with no draws, applying a pending clear
    fn clear_only(&mut self) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let Some(clear) = frame.clear.take() else {
            return;
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Clear Encoder"),
        });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl GraphicsDevice for WgpuDevice {
    fn begin_frame(&mut self, clear: Color) -> Result<(), DeviceError> {
        self.sync_surface_size();
        self.frame = self.acquire()?.map(|output| Frame {
            view: output.texture.create_view(&wgpu::TextureViewDescriptor::default()),
            output,
            clear: Some(wgpu::Color {
                r: clear.r as f64,
                g: clear.g as f64,
                b: clear.b as f64,
                a: clear.a as f64,
            }),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        self.clear_only();
        if let Some(frame) = self.frame.take() {
            self.window.pre_present_notify();
            frame.output.present();
        }
        Ok(())
    }

    fn upload_instances(&mut self, instances: &[InstanceData]) -> Result<(), DeviceError> {
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
            log::debug!("Instance buffer grown to {}", self.instance_capacity);
        }
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        Ok(())
    }

    fn bind_program(&mut self, program: ProgramKind, uniforms: &FrameUniforms) {
        self.program = program;
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn bind_texture(&mut self, _unit: u32, texture: TextureId) {
        // Only unit 0 exists in the batch shader
        self.bound_texture = Some(texture);
    }

    fn draw_instanced(
        &mut self,
        mode: PrimitiveMode,
        vertex_count: u32,
        instances: u32,
    ) -> Result<(), DeviceError> {
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };
        let Some(pipeline) = self.pipelines.get(&(mode, self.program)) else {
            return Ok(());
        };
        let texture_group = match (self.program, self.bound_texture) {
            (ProgramKind::Textured, Some(id)) => Some(
                &self
                    .textures
                    .get(&id)
                    .ok_or(DeviceError::UnknownTexture(id))?
                    .bind_group,
            ),
            (ProgramKind::Textured, None) => return Ok(()),
            (ProgramKind::Flat, _) => None,
        };

        let load = frame.clear.take().map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Batch Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Batch Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            if let Some(group) = texture_group {
                pass.set_bind_group(1, group, &[]);
            }
            pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            pass.draw(0..vertex_count, 0..instances);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, DeviceError> {
        check_texture_data(width, height, rgba)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(
            id,
            GpuTexture {
                _texture: texture,
                bind_group,
            },
        );
        Ok(id)
    }

    fn release_texture(&mut self, texture: TextureId) {
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
        self.textures.remove(&texture);
    }

    fn release(&mut self) {
        self.frame = None;
        self.bound_texture = None;
        self.textures.clear();
        log::info!("Graphics device released");
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    mode: PrimitiveMode,
    program: ProgramKind,
) -> wgpu::RenderPipeline {
    let (vs_entry, topology) = match mode {
        PrimitiveMode::Filled => ("vs_filled", wgpu::PrimitiveTopology::TriangleList),
        PrimitiveMode::Outline => ("vs_outline", wgpu::PrimitiveTopology::LineStrip),
    };
    let fs_entry = match program {
        ProgramKind::Flat => "fs_flat",
        ProgramKind::Textured => "fs_textured",
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("Batch Pipeline {:?}/{:?}", mode, program)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs_entry),
            buffers: &[InstanceData::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Negative scales flip winding; rectangles are always two-sided
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
