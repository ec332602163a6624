//! winit host adapter.
//!
//! Translates window events into calls on the core: `RedrawRequested` runs
//! one [`FrameLoop::tick`], `Resized`/`ScaleFactorChanged` go through
//! [`handle_resize`], and mouse drag/wheel feed the orbit controls.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::assets::FileLoader;
use crate::config::SceneConfig;
use crate::context::AppContext;
use crate::error::AppError;
use crate::frame_loop::{FrameLoop, FrameScheduler};
use crate::gpu::GpuState;
use crate::time::InstantClock;
use crate::viewport::handle_resize;

/// Asks winit for another `RedrawRequested`.
struct WindowScheduler<'a>(&'a Window);

impl FrameScheduler for WindowScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

/// State that exists once the window is up.
struct Running {
    window: Arc<Window>,
    gpu: GpuState,
    ctx: AppContext,
    frame_loop: FrameLoop<InstantClock>,
}

pub struct App {
    config: SceneConfig,
    running: Option<Running>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<AppError>,
}

impl App {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            running: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running, AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let scale_factor = window.scale_factor();
        let logical = window.inner_size().to_logical::<u32>(scale_factor);
        let mut ctx = AppContext::new(self.config.clone(), logical.width, logical.height, scale_factor);

        pollster::block_on(ctx.load_assets(&FileLoader));
        ctx.spawn_fireflies();

        let gpu = pollster::block_on(GpuState::new(window.clone(), &ctx))?;
        // Clock starts after the blocking setup so u_time begins near zero.
        let frame_loop = FrameLoop::new(InstantClock::new());

        window.request_redraw();
        Ok(Running {
            window,
            gpu,
            ctx,
            frame_loop,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let scale_factor = running.window.scale_factor();
                let logical = physical_size.to_logical::<u32>(scale_factor);
                handle_resize(
                    &mut running.ctx,
                    &mut running.gpu,
                    logical.width,
                    logical.height,
                    scale_factor,
                );
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let logical = running.window.inner_size().to_logical::<u32>(scale_factor);
                handle_resize(
                    &mut running.ctx,
                    &mut running.gpu,
                    logical.width,
                    logical.height,
                    scale_factor,
                );
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        running.ctx.controls.rotate_by_pixels(dx, dy);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                running.ctx.controls.zoom_by_wheel(lines);
            }
            WindowEvent::RedrawRequested => {
                let mut scheduler = WindowScheduler(&running.window);
                match running
                    .frame_loop
                    .tick(&mut running.ctx, &mut running.gpu, &mut scheduler)
                {
                    Ok(frame) => {
                        if let Some(fps) = frame.fps {
                            log::trace!("{:.1} fps", fps);
                            running
                                .window
                                .set_title(&format!("{} - {:.0} fps", running.ctx.config.window.title, fps));
                        }
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        running.gpu.reconfigure();
                        running.window.request_redraw();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::debug!("surface timeout, skipping frame");
                        running.window.request_redraw();
                    }
                    Err(e) => {
                        log::error!("render failed: {}", e);
                        self.error = Some(AppError::Render(e));
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(config: SceneConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
