//! wgpu renderer for the portal scene.
//!
//! [`GpuState`] owns the surface and every GPU resource derived from an
//! [`AppContext`]: one vertex/index buffer pair per mesh, one instance buffer
//! per firefly cloud, and four pipelines. Per-frame work is limited to
//! uniform uploads and a single render pass.

pub mod shaders;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::assets::TextureData;
use crate::config::{parse_hex_color, srgb_to_linear};
use crate::context::AppContext;
use crate::error::GpuError;
use crate::fireflies::FireflyInstance;
use crate::frame_loop::{FrameCommands, SceneRenderer};
use crate::scene::{MaterialKind, MeshVertex};
use crate::viewport::{RenderTarget, Viewport};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MSAA_SAMPLES: u32 = 4;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

impl CameraUniform {
    fn new(view: Mat4, proj: Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
        }
    }
}

/// A mesh uploaded to the GPU.
struct GpuMesh {
    material: MaterialKind,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// One firefly cloud's instance buffer.
struct GpuPointCloud {
    instance_buffer: wgpu::Buffer,
    count: u32,
}

/// Firefly pipeline and its uniform block.
struct FireflyPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    clouds: Vec<GpuPointCloud>,
}

/// Render targets that depend on the drawing-buffer size.
struct FrameTargets {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
}

pub struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    targets: FrameTargets,
    clear_color: wgpu::Color,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    baked_pipeline: wgpu::RenderPipeline,
    baked_bind_group: wgpu::BindGroup,
    pole_light_pipeline: wgpu::RenderPipeline,
    pole_light_bind_group: wgpu::BindGroup,
    portal_pipeline: wgpu::RenderPipeline,
    portal_buffer: wgpu::Buffer,
    portal_bind_group: wgpu::BindGroup,
    fireflies: Option<FireflyPass>,
    meshes: Vec<GpuMesh>,

    /// Logical size and clamped ratio last reported by the responder.
    viewport: Viewport,
    needs_reconfigure: bool,
}

impl GpuState {
    /// Create the surface and upload everything in `ctx.scene`.
    ///
    /// Firefly resources are only created if the firefly uniforms are
    /// installed.
    pub async fn new(window: Arc<Window>, ctx: &AppContext) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let viewport = ctx.viewport;
        let (width, height) = buffer_size(&window, &viewport);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = if ctx.config.renderer.antialias
            && adapter
                .get_texture_format_features(surface_format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            1
        };
        let targets = create_targets(&device, &config, sample_count);

        let [r, g, b] = linear_rgb(&ctx.config.renderer.clear_color);
        let clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };

        // Camera block shared by all programs
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::new(
                ctx.camera.view_matrix(),
                ctx.camera.projection(),
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = uniform_layout(&device, "Camera Bind Group Layout", wgpu::ShaderStages::VERTEX);
        let camera_bind_group = uniform_bind_group(&device, "Camera Bind Group", &camera_layout, &camera_buffer);

        let builder = PipelineBuilder {
            device: &device,
            format: surface_format,
            sample_count,
            camera_layout: &camera_layout,
        };

        // Baked texture
        let fallback = TextureData::fallback();
        let baked = ctx.scene.baked_texture.as_ref().unwrap_or(&fallback);
        let baked_view = upload_texture(&device, &queue, baked);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Baked Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let baked_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Baked Bind Group Layout"),
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
        let baked_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Baked Bind Group"),
            layout: &baked_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&baked_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        let baked_pipeline = builder.mesh(
            "Baked",
            &shaders::baked(),
            &baked_layout,
            MeshStyle::for_material(MaterialKind::Baked),
        );

        // Pole lights
        let [r, g, b] = linear_rgb(&ctx.config.renderer.pole_light_color);
        let pole_rgba = [r, g, b, 1.0_f32];
        let pole_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Pole Light Buffer"),
            contents: bytemuck::bytes_of(&pole_rgba),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let pole_layout = uniform_layout(&device, "Pole Light Bind Group Layout", wgpu::ShaderStages::FRAGMENT);
        let pole_light_bind_group = uniform_bind_group(&device, "Pole Light Bind Group", &pole_layout, &pole_buffer);
        let pole_light_pipeline = builder.mesh(
            "Pole Light",
            &shaders::pole_light(),
            &pole_layout,
            MeshStyle::for_material(MaterialKind::PoleLight),
        );

        // Portal
        let portal_uniforms = ctx.params.portal();
        let portal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portal Uniform Buffer"),
            contents: &portal_uniforms.to_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let portal_layout = uniform_layout(&device, "Portal Bind Group Layout", wgpu::ShaderStages::FRAGMENT);
        let portal_bind_group = uniform_bind_group(&device, "Portal Bind Group", &portal_layout, &portal_buffer);
        let portal_pipeline = builder.mesh(
            "Portal",
            &shaders::portal(portal_uniforms),
            &portal_layout,
            MeshStyle::for_material(MaterialKind::Portal),
        );

        let fireflies = ctx.params.fireflies().map(|uniforms| {
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Firefly Uniform Buffer"),
                contents: &uniforms.to_bytes(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let layout = uniform_layout(&device, "Firefly Bind Group Layout", wgpu::ShaderStages::VERTEX);
            let bind_group = uniform_bind_group(&device, "Firefly Bind Group", &layout, &uniform_buffer);
            let pipeline = builder.fireflies(&shaders::fireflies(uniforms), &layout);

            let clouds = ctx
                .scene
                .fireflies
                .iter()
                .filter(|cloud| !cloud.field.is_empty())
                .map(|cloud| GpuPointCloud {
                    instance_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(cloud.name),
                        contents: bytemuck::cast_slice(&cloud.field.instances()),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    count: cloud.field.len() as u32,
                })
                .collect();

            FireflyPass {
                pipeline,
                uniform_buffer,
                bind_group,
                clouds,
            }
        });

        let meshes = ctx
            .scene
            .meshes
            .iter()
            .map(|mesh| GpuMesh {
                material: mesh.material,
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(mesh.name.as_str()),
                    contents: bytemuck::cast_slice(&mesh.mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(mesh.name.as_str()),
                    contents: bytemuck::cast_slice(&mesh.mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: mesh.mesh.indices.len() as u32,
            })
            .collect();

        log::info!(
            "renderer ready: {}x{} {:?}, {}x MSAA",
            config.width,
            config.height,
            config.format,
            sample_count
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            targets,
            clear_color,
            camera_buffer,
            camera_bind_group,
            baked_pipeline,
            baked_bind_group,
            pole_light_pipeline,
            pole_light_bind_group,
            portal_pipeline,
            portal_buffer,
            portal_bind_group,
            fireflies,
            meshes,
            viewport,
            needs_reconfigure: false,
        })
    }

    /// Reconfigure the surface at the current drawing-buffer size.
    ///
    /// Used after the surface was lost or became outdated.
    pub fn reconfigure(&mut self) {
        let (width, height) = buffer_size(&self.window, &self.viewport);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets = create_targets(&self.device, &self.config, self.sample_count);
        self.needs_reconfigure = false;
        log::debug!("surface configured at {}x{}", width, height);
    }

    fn draw_meshes(&self, pass: &mut wgpu::RenderPass<'_>, kind: MaterialKind) {
        for mesh in self.meshes.iter().filter(|m| m.material == kind) {
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

impl RenderTarget for GpuState {
    fn set_size(&mut self, width: u32, height: u32) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.needs_reconfigure = true;
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.viewport.pixel_ratio = ratio;
        self.needs_reconfigure = true;
    }
}

impl SceneRenderer for GpuState {
    type Error = wgpu::SurfaceError;

    fn render(&mut self, ctx: &AppContext, frame: &FrameCommands) -> Result<(), Self::Error> {
        if self.needs_reconfigure {
            self.reconfigure();
        }

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::new(frame.view, frame.projection)),
        );
        self.queue
            .write_buffer(&self.portal_buffer, 0, &ctx.params.portal().to_bytes());
        if let (Some(pass), Some(uniforms)) = (&self.fireflies, ctx.params.fireflies()) {
            self.queue
                .write_buffer(&pass.uniform_buffer, 0, &uniforms.to_bytes());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (attachment, resolve_target) = match &self.targets.msaa {
            Some(msaa) => (msaa, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            render_pass.set_pipeline(&self.baked_pipeline);
            render_pass.set_bind_group(1, &self.baked_bind_group, &[]);
            self.draw_meshes(&mut render_pass, MaterialKind::Baked);

            render_pass.set_pipeline(&self.pole_light_pipeline);
            render_pass.set_bind_group(1, &self.pole_light_bind_group, &[]);
            self.draw_meshes(&mut render_pass, MaterialKind::PoleLight);

            render_pass.set_pipeline(&self.portal_pipeline);
            render_pass.set_bind_group(1, &self.portal_bind_group, &[]);
            self.draw_meshes(&mut render_pass, MaterialKind::Portal);

            // Additive sprites last, depth-tested but not depth-writing
            if let Some(fireflies) = &self.fireflies {
                render_pass.set_pipeline(&fireflies.pipeline);
                render_pass.set_bind_group(1, &fireflies.bind_group, &[]);
                for cloud in &fireflies.clouds {
                    render_pass.set_vertex_buffer(0, cloud.instance_buffer.slice(..));
                    render_pass.draw(0..6, 0..cloud.count);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Drawing-buffer size for `viewport`, never larger than the window's
/// physical size and never zero.
fn buffer_size(window: &Window, viewport: &Viewport) -> (u32, u32) {
    let physical = window.inner_size();
    let (width, height) = viewport.drawing_buffer_size();
    (
        width.min(physical.width.max(1)),
        height.min(physical.height.max(1)),
    )
}

/// Linear RGB of a `#rrggbb` color. Colors are validated with the config,
/// so a parse failure here falls back to black.
fn linear_rgb(hex: &str) -> [f32; 3] {
    parse_hex_color(hex).unwrap_or([0.0; 3]).map(srgb_to_linear)
}

fn create_targets(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> FrameTargets {
    let size = wgpu::Extent3d {
        width: config.width,
        height: config.height,
        depth_or_array_layers: 1,
    };

    let depth = device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default());

    let msaa = (sample_count > 1).then(|| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("MSAA Color Texture"),
                size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format: config.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    });

    FrameTargets { depth, msaa }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Baked Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

#[derive(Debug, PartialEq)]
struct MeshStyle {
    blend: Option<wgpu::BlendState>,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
}

impl MeshStyle {
    fn for_material(kind: MaterialKind) -> Self {
        match kind {
            MaterialKind::Baked | MaterialKind::PoleLight => Self {
                blend: None,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
            },
            // Blended but still occludes what is drawn after it.
            MaterialKind::Portal => Self {
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                cull_mode: None,
                depth_write: true,
            },
        }
    }
}

/// Shared pipeline settings.
struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    format: wgpu::TextureFormat,
    sample_count: u32,
    camera_layout: &'a wgpu::BindGroupLayout,
}

impl PipelineBuilder<'_> {
    fn mesh(
        &self,
        label: &str,
        source: &str,
        material_layout: &wgpu::BindGroupLayout,
        style: MeshStyle,
    ) -> wgpu::RenderPipeline {
        let attributes = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        self.build(
            label,
            source,
            material_layout,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            },
            style,
        )
    }

    fn fireflies(&self, source: &str, material_layout: &wgpu::BindGroupLayout) -> wgpu::RenderPipeline {
        let attributes = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];
        let additive = wgpu::BlendState {
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
        };
        self.build(
            "Fireflies",
            source,
            material_layout,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<FireflyInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &attributes,
            },
            MeshStyle {
                blend: Some(additive),
                cull_mode: None,
                depth_write: false,
            },
        )
    }

    fn build(
        &self,
        label: &str,
        source: &str,
        material_layout: &wgpu::BindGroupLayout,
        vertex_layout: wgpu::VertexBufferLayout,
        style: MeshStyle,
    ) -> wgpu::RenderPipeline {
        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[self.camera_layout, material_layout],
            push_constant_ranges: &[],
        });

        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: style.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: style.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: style.depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_materials_cull_back_faces() {
        for kind in [MaterialKind::Baked, MaterialKind::PoleLight] {
            let style = MeshStyle::for_material(kind);
            assert_eq!(style.blend, None);
            assert_eq!(style.cull_mode, Some(wgpu::Face::Back));
            assert!(style.depth_write);
        }
    }

    #[test]
    fn test_portal_blends_and_writes_depth() {
        let style = MeshStyle::for_material(MaterialKind::Portal);
        assert_eq!(style.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert_eq!(style.cull_mode, None);
        assert!(style.depth_write);
    }
}
