//! Fullscreen winit/wgpu shell around the animation engine.
//!
//! Owns the window, the surface and the decode pipeline, and acts as the
//! periodic driver: every `about_to_wait` it samples the frame clock, feeds
//! the delta to the engine, and paints the current photo through the engine's
//! transform and opacity over a black clear. Any key press, mouse click or
//! genuine mouse movement terminates the program, screensaver style.

use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel as xchan;
use tracing::{debug, error, info, warn};
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::animation::clock::FrameClock;
use crate::animation::engine::{Affine2D, ImageExtent, Viewport, ZoomPanFadeEngine};
use crate::config::AnimationOptions;
use crate::error::Error;
use crate::playlist::Playlist;
use crate::render::loader::{LoaderMsg, LoaderReply, PreparedImage, spawn_loader};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

// Unit quad in image space, y down; the vertex shader maps it through the
// destination rectangle.
const QUAD: [Vertex; 4] = [
    Vertex {
        pos: [0.0, 0.0],
        uv: [0.0, 0.0],
    },
    Vertex {
        pos: [1.0, 0.0],
        uv: [1.0, 0.0],
    },
    Vertex {
        pos: [0.0, 1.0],
        uv: [0.0, 1.0],
    },
    Vertex {
        pos: [1.0, 1.0],
        uv: [1.0, 1.0],
    },
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    rect: [f32; 4],
    viewport: [f32; 4],
    fade: [f32; 4],
}

/// Destination rectangle in viewport pixels for an image drawn through the
/// engine transform: `[x, y, w, h]`.
#[must_use]
pub fn compute_dest_rect(transform: Affine2D, image_w: u32, image_h: u32) -> [f32; 4] {
    let (x0, y0) = transform.apply(0.0, 0.0);
    [
        x0,
        y0,
        image_w as f32 * transform.scale,
        image_h as f32 * transform.scale,
    ]
}

/// Run the screensaver until user input terminates it.
///
/// # Errors
/// Returns [`Error::Render`] if the window or rendering backend fails to
/// initialize.
pub fn run_screensaver(playlist: Playlist, opts: AnimationOptions) -> Result<(), Error> {
    info!(count = playlist.len(), "starting screensaver");
    let event_loop = EventLoop::new().map_err(|e| Error::Render(e.into()))?;
    let mut app = App::new(playlist, opts);
    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Render(e.into()))?;
    Ok(())
}

struct Tex {
    view: wgpu::TextureView,
    w: u32,
    h: u32,
}

struct Gpu {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    vbuf: wgpu::Buffer,
    params_buf: wgpu::Buffer,
    sampler: wgpu::Sampler,

    tex: Tex,
}

struct App {
    playlist: Playlist,
    engine: ZoomPanFadeEngine,
    clock: FrameClock,

    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,

    // decode pipeline
    tx_req: xchan::Sender<LoaderMsg>,
    rx_res: xchan::Receiver<LoaderReply>,
    pending_next: Option<PreparedImage>,
    current_extent: Option<ImageExtent>,

    last_cursor: Option<PhysicalPosition<f64>>,
}

impl App {
    fn new(playlist: Playlist, opts: AnimationOptions) -> Self {
        let clock = FrameClock::new(opts.max_frame_step_ms as f32 / 1000.0);
        let engine = ZoomPanFadeEngine::new(opts);
        // placeholder channel ends; the real loader starts after window init
        let (tx_req, _rx_dummy) = xchan::unbounded::<LoaderMsg>();
        let (_tx_dummy, rx_res) = xchan::unbounded::<LoaderReply>();

        Self {
            playlist,
            engine,
            clock,
            window: None,
            gpu: None,
            tx_req,
            rx_res,
            pending_next: None,
            current_extent: None,
            last_cursor: None,
        }
    }

    fn viewport(&self) -> Viewport {
        self.gpu
            .as_ref()
            .map_or(Viewport::new(0, 0), |gpu| {
                Viewport::new(gpu.config.width, gpu.config.height)
            })
    }

    /// Upload `decoded` as the displayed texture and re-seed the engine.
    fn install_current(&mut self, decoded: &PreparedImage) {
        let Some(gpu) = &mut self.gpu else { return };
        gpu.tex = upload_texture(
            &gpu.device,
            &gpu.queue,
            &decoded.pixels,
            decoded.size.0,
            decoded.size.1,
        );
        rebuild_bind_group(gpu);
        let viewport = Viewport::new(gpu.config.width, gpu.config.height);
        let extent = ImageExtent::new(decoded.size.0, decoded.size.1);
        self.current_extent = Some(extent);
        self.engine.reset(extent, viewport);
    }

    fn request_decode(&self, path: &std::path::Path) {
        let _ = self.tx_req.send(LoaderMsg::Decode(path.to_path_buf()));
    }

    /// Drop an undecodable file from rotation and request a replacement, so
    /// one corrupt path can never wedge the slideshow on the current image.
    fn drop_broken(&mut self, path: &std::path::Path) {
        warn!(path = %path.display(), "removing undecodable image from rotation");
        let was_next = path == self.playlist.peek_next();
        if !self.playlist.remove(path) {
            return;
        }
        if self.playlist.is_empty() {
            error!("no decodable images left; exiting");
            std::process::exit(1);
        }
        if self.current_extent.is_none() {
            // the very first image failed; retry with the new head
            self.request_decode(self.playlist.current());
        } else if was_next {
            self.request_decode(self.playlist.peek_next());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // ----- window -----
        let attrs = WindowAttributes::default().with_title("zoom screensaver");
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let monitor = window.current_monitor();
        window.set_fullscreen(Some(Fullscreen::Borderless(monitor)));
        window.set_cursor_visible(false);
        info!("window fullscreen initialized");
        self.window = Some(window.clone());

        // ----- start request-driven loader -----
        let (tx_req, rx_req) = xchan::unbounded::<LoaderMsg>();
        let (tx_res, rx_res) = xchan::unbounded::<LoaderReply>();
        spawn_loader(rx_req, tx_res);
        self.tx_req = tx_req;
        self.rx_res = rx_res;
        // queue current and next
        self.request_decode(self.playlist.current());
        if self.playlist.len() > 1 {
            self.request_decode(self.playlist.peek_next());
        }

        self.gpu = Some(pollster::block_on(init_gpu(window)).expect("GPU init"));
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(win) = &self.window else { return };
        if win.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => std::process::exit(0),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    info!("key press; exiting");
                    std::process::exit(0);
                }
            }
            WindowEvent::MouseInput { .. } => {
                info!("mouse click; exiting");
                std::process::exit(0);
            }
            WindowEvent::CursorMoved { position, .. } => {
                // The first sample only establishes a reference point, so a
                // stray enter event does not kill the saver immediately.
                if let Some(last) = self.last_cursor
                    && ((position.x - last.x).abs() > 1.0 || (position.y - last.y).abs() > 1.0)
                {
                    info!("mouse moved; exiting");
                    std::process::exit(0);
                }
                self.last_cursor = Some(position);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(gpu) = &mut self.gpu
                    && width > 0
                    && height > 0
                {
                    gpu.config.width = width;
                    gpu.config.height = height;
                    gpu.surface.configure(&gpu.device, &gpu.config);
                }
                self.engine.set_viewport(Viewport::new(width, height));
            }
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _el: &ActiveEventLoop) {
        if self.gpu.is_none() {
            return;
        }

        // Receive loader replies (non-blocking). The first decode goes on
        // screen; later ones are held as the prefetched next image. Failures
        // drop the file from rotation so the slideshow keeps moving.
        while let Ok(reply) = self.rx_res.try_recv() {
            match reply {
                LoaderReply::Ready(decoded) => {
                    if self.current_extent.is_none() {
                        self.install_current(&decoded);
                    } else if decoded.path == *self.playlist.peek_next() {
                        self.pending_next = Some(decoded);
                    }
                }
                LoaderReply::Failed(path) => self.drop_broken(&path),
            }
        }

        let dt = self.clock.tick();
        let frame = self.engine.advance(dt);

        if frame.advance_image {
            match self.pending_next.take() {
                Some(next) => {
                    self.install_current(&next);
                    self.playlist.advance();
                    self.request_decode(self.playlist.peek_next());
                }
                None => {
                    // Next image not decoded yet: repeat the current one for
                    // another cycle and ask again.
                    debug!("next image not ready; repeating current");
                    if let Some(extent) = self.current_extent {
                        let viewport = self.viewport();
                        self.engine.reset(extent, viewport);
                    }
                    self.request_decode(self.playlist.peek_next());
                }
            }
        }

        // Write this frame's uniforms and schedule a repaint.
        if let Some(gpu) = &self.gpu
            && self.current_extent.is_some()
        {
            let params = Params {
                rect: compute_dest_rect(frame.transform, gpu.tex.w, gpu.tex.h),
                viewport: [gpu.config.width as f32, gpu.config.height as f32, 0.0, 0.0],
                fade: [frame.opacity, 0.0, 0.0, 0.0],
            };
            gpu.queue
                .write_buffer(&gpu.params_buf, 0, bytemuck::bytes_of(&params));
        }

        if let Some(win) = &self.window {
            win.request_redraw();
        }
    }
}

impl App {
    fn draw(&self) {
        let Some(gpu) = &self.gpu else { return };
        let Ok(frame) = gpu.surface.get_current_texture() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&gpu.pipeline);
            rpass.set_bind_group(0, &gpu.bind_group, &[]);
            rpass.set_vertex_buffer(0, gpu.vbuf.slice(..));
            rpass.draw(0..4, 0..1);
        }
        gpu.queue.submit([encoder.finish()]);
        frame.present();
    }
}

async fn init_gpu(window: Arc<Window>) -> anyhow::Result<Gpu> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let surface = instance
        .create_surface(window.clone())
        .context("create surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("no compatible GPU adapter found")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await?;

    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .unwrap_or(caps.formats[0]);
    let PhysicalSize { width, height } = window.inner_size();
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    };
    surface.configure(&device, &config);

    // black placeholder until the first decode lands
    let tex = upload_texture(&device, &queue, &[0, 0, 0, 255], 1, 1);

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("params"),
        contents: bytemuck::bytes_of(&Params {
            rect: [0.0; 4],
            viewport: [config.width as f32, config.height as f32, 0.0, 0.0],
            fade: [0.0; 4],
        }),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("quad"),
        contents: bytemuck::cast_slice(&QUAD),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/saver.wgsl").into()),
    });

    let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bind_layout"),
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
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let vlayout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };

    let pip_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipe_layout"),
        bind_group_layouts: &[&bind_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("pipeline"),
        layout: Some(&pip_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vlayout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let bind_group = make_bind_group(&device, &bind_layout, &tex, &sampler, &params_buf);

    Ok(Gpu {
        _instance: instance,
        surface,
        _adapter: adapter,
        device,
        queue,
        config,
        pipeline,
        bind_layout,
        bind_group,
        vbuf,
        params_buf,
        sampler,
        tex,
    })
}

fn make_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    tex: &Tex,
    sampler: &wgpu::Sampler,
    params_buf: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&tex.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params_buf.as_entire_binding(),
            },
        ],
    })
}

fn rebuild_bind_group(gpu: &mut Gpu) {
    gpu.bind_group = make_bind_group(
        &gpu.device,
        &gpu.bind_layout,
        &gpu.tex,
        &gpu.sampler,
        &gpu.params_buf,
    );
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    w: u32,
    h: u32,
) -> Tex {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("photo"),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        tex.as_image_copy(),
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    Tex {
        view: tex.create_view(&wgpu::TextureViewDescriptor::default()),
        w,
        h,
    }
}
