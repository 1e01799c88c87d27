//! Application state holding the wgpu graphics context
//!
//! Owns the window surface, the egui integration, the camera, the hand
//! detector and the calculator session. One call to [`App::process_tick`]
//! handles one camera frame; [`App::render`] draws the latest result.

use std::sync::Arc;
use std::time::Instant;

use egui::{pos2, Color32, Rect, RichText, TextureHandle, TextureOptions};
use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::calculator::CalculatorSession;
use crate::camera::{CameraCapture, CameraFrame};
use crate::config::AppConfig;
use crate::ml::{self, HandDetector};
use crate::pipeline::{self, ProcessedFrame};
use crate::render;

const INSTRUCTIONS: [&str; 4] = [
    "1. Click 'Start Calculator' to begin",
    "2. Use your index and middle fingers to 'click' buttons",
    "3. Pinch your fingers together to select a button",
    "4. Click 'Stop Calculator' to end the session",
];

/// Fatal startup errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable GPU adapter")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Main application state
pub struct App {
    /// Reference to the window
    window: Arc<Window>,
    /// The wgpu surface for presenting rendered frames
    surface: wgpu::Surface<'static>,
    /// The wgpu device for creating GPU resources
    device: wgpu::Device,
    /// The command queue for submitting GPU work
    queue: wgpu::Queue,
    /// Surface configuration
    config: wgpu::SurfaceConfiguration,
    /// Current window size in physical pixels
    size: PhysicalSize<u32>,

    settings: AppConfig,

    // Camera capture
    camera: Option<CameraCapture>,
    camera_status: String,
    frame_texture: Option<TextureHandle>,

    // Hand tracking
    detector: Box<dyn HandDetector>,

    // Calculator
    session: CalculatorSession,
    /// Latest processed frame, kept on screen when a read fails
    last_tick: Option<ProcessedFrame>,
    running: bool,

    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // Frame timing
    fps: f64,
    last_fps_update: Instant,
    ticks_since_update: u64,
}

impl App {
    /// Create a new App instance with initialized wgpu context
    pub async fn new(window: Arc<Window>, settings: AppConfig) -> Result<Self, AppError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(AppError::NoAdapter)?;

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Gesture Calculator Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Surface format: {:?}", surface_format);

        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Mailbox)
        {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };

        surface.configure(&device, &config);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let mut style = (*egui_ctx.style()).clone();
        style.visuals.window_shadow = egui::epaint::Shadow::NONE;
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        let detector = ml::load_detector(settings.model_dir.as_deref(), settings.min_hand_confidence);
        log::info!("Hand detector: {}", detector.name());

        let session = CalculatorSession::new(settings.session_settings());

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            settings,
            camera: None,
            camera_status: "Not connected".to_string(),
            frame_texture: None,
            detector,
            session,
            last_tick: None,
            running: false,
            egui_ctx,
            egui_state,
            egui_renderer,
            fps: 0.0,
            last_fps_update: Instant::now(),
            ticks_since_update: 0,
        })
    }

    /// Handle a window event, returning true if egui consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        if response.repaint {
            self.window.request_redraw();
        }
        response.consumed
    }

    /// Resize the surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Get current size
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start processing frames, opening the camera if needed
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        if self.camera.is_none() {
            self.connect_camera();
        }
        self.running = true;
        log::info!("Calculator started");
    }

    /// Stop scheduling ticks. A frame already being processed finishes normally.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            log::info!("Calculator stopped");
        }
    }

    pub fn toggle_running(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Open the configured camera
    pub fn connect_camera(&mut self) {
        for info in CameraCapture::list_cameras() {
            log::info!("Found camera {}: {}", info.index, info.name);
        }

        let index = self.settings.camera_index;
        log::info!("Connecting to camera {}", index);

        match CameraCapture::open(index, self.settings.capture_width, self.settings.capture_height) {
            Ok(capture) => {
                let (w, h) = capture.resolution();
                self.camera_status = format!("{} ({}x{})", capture.name(), w, h);
                self.camera = Some(capture);
            }
            Err(e) => {
                log::error!("Failed to connect camera: {}", e);
                self.camera_status = format!("Unavailable: {}", e);
            }
        }
    }

    /// One processing tick: read a frame, track the hand, resolve clicks
    pub fn process_tick(&mut self) {
        if !self.running {
            return;
        }
        let Some(camera) = self.camera.as_mut() else {
            return;
        };

        let Some(processed) =
            pipeline::process_tick(camera, self.detector.as_mut(), &mut self.session)
        else {
            return;
        };

        self.upload_frame(&processed.frame);
        self.last_tick = Some(processed);
        self.ticks_since_update += 1;
    }

    /// Copy the frame into the egui texture shown in the central panel
    fn upload_frame(&mut self, frame: &CameraFrame) {
        let expected = (frame.width * frame.height * 4) as usize;
        if frame.data.len() != expected {
            log::warn!(
                "Frame size mismatch: {} bytes for {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            );
            return;
        }

        let image = egui::ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            &frame.data,
        );
        match &mut self.frame_texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.frame_texture =
                    Some(self.egui_ctx.load_texture("camera-frame", image, TextureOptions::LINEAR));
            }
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.025,
                            g: 0.05,
                            b: 0.08,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.render_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_fps();

        Ok(())
    }

    fn render_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);

        let running = self.running;
        let fps = self.fps;
        let camera_status = self.camera_status.as_str();
        let detector_name = self.detector.name();
        let detector_active = self.detector.is_active();
        let expression = self.session.expression().as_str();
        let cooldown = self.session.cooldown();
        let recent_clicks: Vec<String> = self
            .session
            .recent_clicks()
            .map(|c| match &c.error {
                Some(e) => format!("{} -> {} ({})", c.label, c.expression, e),
                None => format!("{} -> {}", c.label, c.expression),
            })
            .collect();
        let last_tick = self.last_tick.as_ref();
        let texture = self.frame_texture.as_ref();

        let mut start = false;
        let mut stop = false;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::SidePanel::right("controls")
                .min_width(280.0)
                .show(ctx, |ui| {
                    ui.add_space(8.0);
                    if ui
                        .add_enabled(!running, egui::Button::new("Start Calculator"))
                        .clicked()
                    {
                        start = true;
                    }
                    if ui
                        .add_enabled(running, egui::Button::new("Stop Calculator"))
                        .clicked()
                    {
                        stop = true;
                    }

                    ui.separator();
                    ui.label(RichText::new("Equation:").size(16.0));
                    ui.label(RichText::new(expression).size(24.0).strong());

                    ui.separator();
                    ui.heading("Status");
                    ui.label(format!("Camera: {}", camera_status));
                    ui.label(format!("Hand tracking: {}", detector_name));
                    if !detector_active {
                        ui.colored_label(Color32::YELLOW, "No hand model loaded");
                    }
                    if let Some(tick) = last_tick {
                        if tick.outcome.pinch.has_hand() {
                            ui.label(format!("Pinch distance: {:.1}px", tick.outcome.pinch.distance));
                        } else {
                            ui.label("No hand detected");
                        }
                    }
                    ui.label(format!("Cooldown: {}", cooldown));
                    ui.label(format!("Processing: {:.1} fps", fps));

                    if !recent_clicks.is_empty() {
                        ui.separator();
                        ui.heading("Recent presses");
                        for line in recent_clicks.iter().rev() {
                            ui.monospace(line);
                        }
                    }

                    ui.separator();
                    ui.collapsing("Instructions", |ui| {
                        for line in INSTRUCTIONS {
                            ui.label(line);
                        }
                    });
                });

            egui::CentralPanel::default()
                .frame(egui::Frame::default().fill(Color32::BLACK))
                .show(ctx, |ui| {
                    let available = ui.available_rect_before_wrap();
                    let (Some(tick), Some(texture)) = (last_tick, texture) else {
                        ui.centered_and_justified(|ui| {
                            ui.label("Press 'Start Calculator' to open the camera");
                        });
                        return;
                    };

                    let frame = &tick.frame;
                    let image_rect = render::fit_rect(available, frame.width, frame.height);
                    let painter = ui.painter_at(available);
                    painter.image(
                        texture.id(),
                        image_rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );

                    let to_screen = render::frame_to_screen(frame.width, frame.height, image_rect);
                    render::paint_calculator(
                        &painter,
                        &to_screen,
                        &tick.outcome.layout,
                        tick.outcome.highlighted,
                        expression,
                    );
                    render::paint_landmarks(&painter, &to_screen, &tick.hands, frame.width, frame.height);
                });
        });

        if start {
            self.start();
        }
        if stop {
            self.stop();
        }

        self.egui_state.handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self.egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn update_fps(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = self.ticks_since_update as f64 / elapsed;
            self.ticks_since_update = 0;
            self.last_fps_update = now;
        }
    }
}
