//! Gesture Calculator - Main Entry Point
//!
//! Opens the window, then drives one processing tick per redraw while the
//! calculator is running.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gesture_calculator::config::AppConfig;
use gesture_calculator::pipeline::TickSchedule;
use gesture_calculator::App;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Hand Tracking Calculator";

/// Application state machine
enum AppState {
    /// Initial state before window is created
    Uninitialized,
    /// Window and graphics context are ready
    Running { window: Arc<Window>, app: App },
}

/// Main application handler implementing winit's ApplicationHandler trait
struct CalculatorApp {
    state: AppState,
    config: AppConfig,
    schedule: TickSchedule,
}

impl CalculatorApp {
    fn new(config: AppConfig) -> Self {
        let interval = Duration::from_millis(config.tick_interval_ms);
        Self {
            state: AppState::Uninitialized,
            config,
            schedule: TickSchedule::new(interval, Instant::now()),
        }
    }
}

impl ApplicationHandler for CalculatorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Uninitialized) {
            return;
        }

        log::info!("Creating window...");
        let window_attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        log::info!("Initializing wgpu and egui...");
        let app = match pollster::block_on(App::new(window.clone(), self.config.clone())) {
            Ok(app) => app,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        log::info!("Gesture Calculator ready!");
        log::info!("Press SPACE to start/stop, ESC to exit, F11 for fullscreen");

        self.state = AppState::Running { window, app };
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running { window, app } = &mut self.state else {
            return;
        };

        // Let egui handle the event first
        let egui_consumed = app.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !egui_consumed => match key_code {
                KeyCode::Escape => {
                    log::info!("Escape pressed, exiting...");
                    event_loop.exit();
                }
                KeyCode::F11 => {
                    if window.fullscreen().is_some() {
                        window.set_fullscreen(None);
                        log::info!("Exiting fullscreen");
                    } else {
                        window.set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
                        log::info!("Entering fullscreen");
                    }
                }
                KeyCode::Space => {
                    app.toggle_running();
                    self.schedule.restart(Instant::now());
                    window.request_redraw();
                }
                _ => {}
            },

            WindowEvent::Resized(physical_size) => {
                app.resize(physical_size);
            }

            WindowEvent::RedrawRequested => {
                // Redraws from egui input only repaint
                if self.schedule.take_due() {
                    app.process_tick();
                }

                match app.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        log::warn!("Surface lost, reconfiguring...");
                        app.resize(app.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {:?}", e);
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { window, app } = &mut self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        // Idle until input arrives when stopped
        if !app.is_running() {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        if self.schedule.poll(Instant::now()) {
            window.request_redraw();
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(self.schedule.next_at()));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Gesture Calculator v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = CalculatorApp::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
