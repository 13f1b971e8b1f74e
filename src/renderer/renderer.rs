// renderer/renderer.rs
use crate::asset::Assets;
use crate::renderer::billboards::BillboardPass;
use crate::renderer::context::FrameInputs;
use crate::renderer::forward::ForwardPass;
use crate::renderer::overlay::OverlayPass;
use crate::renderer::shadow::ShadowPass;
use crate::renderer::texture::{DepthTexture, ShadowMap, Texture};
use crate::renderer::uniforms::FrameUniform;
use crate::settings::RenderSettings;

use std::mem;
use std::num::NonZeroU64;
use std::sync::Arc;
use winit::{dpi::PhysicalSize, window::Window};

/// Uniform and instance buffers are duplicated this many times so the CPU
/// can prepare a frame while the previous one is still on the GPU.
pub const FRAMES_IN_FLIGHT: usize = 2;

const INITIAL_INSTANCE_CAPACITY: u64 = 256;
const INITIAL_OVERLAY_CAPACITY: u64 = 4096;

/// What the frame loop should do about a failed surface acquire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    /// Reconfigure the surface and retry next frame.
    Recreate,
    /// Drop this frame and carry on.
    Skip,
    /// Unrecoverable, shut down.
    Fatal,
}

pub fn surface_error_action(error: &wgpu::SurfaceError) -> SurfaceAction {
    match error {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceAction::Recreate,
        wgpu::SurfaceError::Timeout => SurfaceAction::Skip,
        _ => SurfaceAction::Fatal,
    }
}

/// Vertex buffer that regrows when a frame needs more room.
struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: &'static str,
}

impl DynamicBuffer {
    fn new(device: &wgpu::Device, capacity: u64, label: &'static str) -> Self {
        Self {
            buffer: Self::create(device, capacity, label),
            capacity,
            label,
        }
    }

    fn create(device: &wgpu::Device, capacity: u64, label: &'static str) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create(device, self.capacity, self.label);
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }
}

/// Per-slot resources of the frame ring.
struct FrameSlot {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    mesh_instances: DynamicBuffer,
    billboards: DynamicBuffer,
    overlay: DynamicBuffer,
}

/// A frame in flight: the acquired surface texture plus the encoder the
/// passes record into. Handed back to `end_frame` for submission.
pub struct Frame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    pub slot: usize,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthTexture,
    shadow_map: ShadowMap,

    texture_layout: wgpu::BindGroupLayout,
    slots: Vec<FrameSlot>,
    frame_counter: u64,

    shadow_pass: ShadowPass,
    forward_pass: ForwardPass,
    billboard_pass: BillboardPass,
    overlay_pass: OverlayPass,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, settings: &RenderSettings) -> Self {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window).expect("surface");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .expect("device");

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&surface_caps.present_modes),
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth = DepthTexture::new(&device, config.width, config.height);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        NonZeroU64::new(mem::size_of::<FrameUniform>() as u64).unwrap(),
                    ),
                },
                count: None,
            }],
        });
        let texture_layout = Texture::bind_group_layout(&device);
        let shadow_layout = ShadowMap::bind_group_layout(&device);
        let shadow_map = ShadowMap::new(&device, &shadow_layout, settings.shadow_map_size);

        let slots = (0..FRAMES_IN_FLIGHT)
            .map(|i| {
                let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("frame uniform"),
                    size: mem::size_of::<FrameUniform>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("frame uniform"),
                    layout: &frame_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });
                log::debug!("Created frame slot {i}");
                FrameSlot {
                    uniform_buffer,
                    bind_group,
                    mesh_instances: DynamicBuffer::new(
                        &device,
                        INITIAL_INSTANCE_CAPACITY
                            * mem::size_of::<crate::renderer::uniforms::MeshInstance>() as u64,
                        "mesh instances",
                    ),
                    billboards: DynamicBuffer::new(
                        &device,
                        INITIAL_INSTANCE_CAPACITY
                            * mem::size_of::<crate::renderer::uniforms::BillboardInstance>() as u64,
                        "billboard instances",
                    ),
                    overlay: DynamicBuffer::new(
                        &device,
                        INITIAL_OVERLAY_CAPACITY
                            * mem::size_of::<crate::renderer::uniforms::OverlayVertex>() as u64,
                        "overlay vertices",
                    ),
                }
            })
            .collect();

        let shadow_pass = ShadowPass::new(&device, &frame_layout);
        let forward_pass =
            ForwardPass::new(&device, format, &frame_layout, &texture_layout, &shadow_layout);
        let billboard_pass = BillboardPass::new(&device, format, &frame_layout);
        let overlay_pass = OverlayPass::new(&device, format, &frame_layout);

        log::info!(
            "Renderer up: {}x{} {:?}, shadow map {}px",
            config.width,
            config.height,
            format,
            settings.shadow_map_size
        );

        Self {
            surface,
            device,
            queue,
            config,
            depth,
            shadow_map,
            texture_layout,
            slots,
            frame_counter: 0,
            shadow_pass,
            forward_pass,
            billboard_pass,
            overlay_pass,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.config.width = new_size.width.max(1);
        self.config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthTexture::new(&self.device, self.config.width, self.config.height);
    }

    /// Reconfigures with the current size after a lost or outdated surface.
    pub fn recreate_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquires the next surface texture and opens a command encoder. On
    /// error the caller maps the result through `surface_error_action`.
    pub fn begin_frame(&mut self) -> Result<Frame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        Ok(Frame {
            surface_texture,
            view,
            encoder,
            slot: (self.frame_counter % FRAMES_IN_FLIGHT as u64) as usize,
        })
    }

    /// Uploads frame data and records the shadow and forward passes into the
    /// frame's encoder. The UI layer may append its own pass afterwards.
    pub fn draw_scene(&mut self, frame: &mut Frame, assets: &Assets, inputs: &FrameInputs<'_>) {
        let slot = &mut self.slots[frame.slot];
        self.queue
            .write_buffer(&slot.uniform_buffer, 0, bytemuck::bytes_of(&inputs.uniform));
        slot.mesh_instances.write(
            &self.device,
            &self.queue,
            bytemuck::cast_slice(inputs.mesh_instances),
        );
        slot.billboards.write(
            &self.device,
            &self.queue,
            bytemuck::cast_slice(inputs.billboards),
        );
        slot.overlay
            .write(&self.device, &self.queue, bytemuck::cast_slice(inputs.overlay));

        self.shadow_pass.record(
            &mut frame.encoder,
            &self.shadow_map.view,
            &slot.bind_group,
            &slot.mesh_instances.buffer,
            assets,
            inputs.mesh_draws,
        );

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("forward pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.01,
                        g: 0.01,
                        b: 0.01,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.forward_pass.record(
            &mut pass,
            &slot.bind_group,
            &self.shadow_map.bind_group,
            &slot.mesh_instances.buffer,
            assets,
            inputs.mesh_draws,
        );
        self.billboard_pass.record(
            &mut pass,
            &slot.bind_group,
            &slot.billboards.buffer,
            inputs.billboards.len() as u32,
        );
        self.overlay_pass.record(
            &mut pass,
            &slot.bind_group,
            &slot.overlay.buffer,
            inputs.overlay.len() as u32,
        );
    }

    pub fn end_frame(&mut self, frame: Frame) {
        self.queue.submit(Some(frame.encoder.finish()));
        frame.surface_texture.present();
        self.frame_counter += 1;
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Blocks until the GPU has drained all submitted work. Called before
    /// teardown so in-flight frames never outlive their resources.
    pub fn wait_idle(&self) {
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }
}
