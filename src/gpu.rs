//! The wgpu renderer.
//!
//! [`GpuRenderer`] draws a [`Scene`] either to a window surface or, when created
//! headless, only into offscreen targets. Mesh data is uploaded lazily the first
//! time a mesh is drawn and cached by [`MeshId`]; instance data is rebuilt every
//! frame from the scene graph's world matrices. Pipelines are cached per color
//! format because the surface and the capture target may disagree on it.

use std::{collections::HashMap, iter, sync::Arc, time::Duration};

use anyhow::{Context as _, anyhow};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{Mesh, MeshId},
        scene_graph::Scene,
        texture::Texture,
    },
    pipelines::basic::mk_basic_pipeline,
    render::{Frame, Renderer},
};

/// Format of the offscreen target used for captures; its texels map 1:1 onto RGBA8.
pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Row pitch of a `width` pixels wide RGBA8 readback, padded to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

#[derive(Debug)]
struct GpuMesh {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            count: mesh.indices().len() as u32,
        }
    }
}

#[derive(Debug)]
struct SurfaceTarget {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

#[derive(Debug)]
pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: Option<SurfaceTarget>,
    size: (u32, u32),
    depth: Texture,
    camera_buffer: wgpu::Buffer,
    camera_bind_group_layout: wgpu::BindGroupLayout,
    camera_bind_group: wgpu::BindGroup,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    meshes: HashMap<MeshId, GpuMesh>,
}

impl GpuRenderer {
    /// Renderer without a window. `render` draws into a throwaway offscreen target.
    pub async fn headless(width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = new_instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available")?;
        let (device, queue) = request_device(&adapter).await?;
        Ok(Self::with_device(device, queue, None, (width, height)))
    }

    /// Renderer presenting to `window`.
    pub async fn for_window(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = new_instance();
        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter compatible with the window surface")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // colors are written in linear space, so prefer an sRGB surface
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let target = SurfaceTarget {
            window,
            surface,
            config,
        };
        Ok(Self::with_device(
            device,
            queue,
            Some(target),
            (size.width.max(1), size.height.max(1)),
        ))
    }

    fn with_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<SurfaceTarget>,
        size: (u32, u32),
    ) -> Self {
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        let depth = Texture::create_depth_texture(&device, [size.0, size.1], "depth_texture");

        Self {
            device,
            queue,
            surface,
            size,
            depth,
            camera_buffer,
            camera_bind_group_layout,
            camera_bind_group,
            pipelines: HashMap::new(),
            meshes: HashMap::new(),
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.surface.as_ref().map(|target| &target.window)
    }

    /// Number of meshes with buffers on the GPU.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    fn draw(
        &mut self,
        view: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        scene: &Scene,
        camera: &Camera,
    ) -> wgpu::CommandEncoder {
        let mut uniform = CameraUniform::new();
        uniform.update(camera, &scene.light);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let draws = scene.draw_list();
        for item in &draws {
            self.meshes
                .entry(item.mesh.id())
                .or_insert_with(|| GpuMesh::upload(&self.device, item.mesh));
        }
        let instances: Vec<InstanceRaw> = draws
            .iter()
            .map(|item| Instance::raw_from_matrix(item.world, item.color))
            .collect();
        let instance_buffer = (!instances.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Instance Buffer"),
                    contents: bytemuck::cast_slice(&instances),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        let pipeline = self
            .pipelines
            .entry(format)
            .or_insert_with(|| mk_basic_pipeline(&self.device, format, &self.camera_bind_group_layout));

        let [r, g, b] = scene.background;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r.into(),
                            g: g.into(),
                            b: b.into(),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(instance_buffer) = &instance_buffer {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(1, instance_buffer.slice(..));
                for (i, item) in draws.iter().enumerate() {
                    let Some(mesh) = self.meshes.get(&item.mesh.id()) else {
                        continue;
                    };
                    if mesh.count == 0 {
                        continue;
                    }
                    let i = i as u32;
                    render_pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                    render_pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.count, 0, i..i + 1);
                }
            }
        }
        encoder
    }

    fn reconfigure(&mut self) {
        if let Some(target) = &mut self.surface {
            target.config.width = self.size.0;
            target.config.height = self.size.1;
            target.surface.configure(&self.device, &target.config);
        }
    }
}

impl Renderer for GpuRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()> {
        let Some(target) = &self.surface else {
            let offscreen = Texture::create_capture_target(
                &self.device,
                [self.size.0, self.size.1],
                CAPTURE_FORMAT,
                "offscreen target",
            );
            let encoder = self.draw(&offscreen.view, CAPTURE_FORMAT, scene, camera);
            self.queue.submit(iter::once(encoder.finish()));
            return Ok(());
        };
        let format = target.config.format;
        let output = match target.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(anyhow!("unable to acquire the surface texture: {e:?}")),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.draw(&view, format, scene, camera);
        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn capture(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<Frame> {
        let (width, height) = self.size;
        let target = Texture::create_capture_target(
            &self.device,
            [width, height],
            CAPTURE_FORMAT,
            "capture target",
        );
        let mut encoder = self.draw(&target.view, CAPTURE_FORMAT, scene, camera);

        let padded = padded_bytes_per_row(width);
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback Buffer"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(iter::once(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .map_err(|e| anyhow!("waiting for the GPU failed: {e:?}"))?;
        futures::executor::block_on(rx.receive())
            .context("readback channel closed before the buffer was mapped")?
            .map_err(|e| anyhow!("mapping the readback buffer failed: {e:?}"))?;

        let unpadded = width as usize * 4;
        let pixels: Vec<u8> = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded as usize)
                .take(height as usize)
                .flat_map(|row| &row[..unpadded])
                .copied()
                .collect()
        };
        output_buffer.unmap();
        Frame::from_raw(width, height, pixels).context("captured frame has an unexpected size")
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.reconfigure();
        self.depth = Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }
}

fn new_instance() -> wgpu::Instance {
    // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("gallery device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        })
        .await
        .context("cannot open the GPU device")
}
