//! Spiralbars - Microphone-reactive radial bar visualizer
//!
//! Bars spiral out from the middle of the window, kicked up by the live
//! waveform and decaying back each frame, while a centre image swells with
//! the smoothed loudness.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use spiralbars::audio::{AudioSampler, CpalInput};
use spiralbars::cli::Args;
use spiralbars::config::{find_config, load_config, Config};
use spiralbars::rendering::RenderSystem;
use spiralbars::surface::Canvas;
use spiralbars::visualizer::Visualizer;

/// Main application state
struct App {
    config: Config,

    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    canvas: Option<Canvas>,

    visualizer: Option<Visualizer>,

    /// First fatal error; reported after the loop exits
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            render_system: None,
            canvas: None,
            visualizer: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.config.window,
            &self.config.overlay,
        ))
        .context("Failed to initialize renderer")?;

        // Bar geometry is in logical pixels, whatever the display density
        let [width, height] = render_system.logical_size();
        let canvas = Canvas::new(width, height);

        // Acquisition runs in the background; frames idle until it resolves
        let sampler = AudioSampler::new(self.config.audio.clone(), CpalInput);
        let visualizer = Visualizer::new(sampler, self.config.bars.clone(), &self.config.overlay);

        log::info!("Spiralbars is running, press ESC to quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.canvas = Some(canvas);
        self.visualizer = Some(visualizer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::debug!("Scale factor changed to {}", scale_factor);
                if let Some(render_system) = &mut self.render_system {
                    render_system.set_scale_factor(scale_factor);
                }
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_frame() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

impl App {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let Some(render_system) = &mut self.render_system else {
            return;
        };
        render_system.resize(width, height);

        let [logical_width, logical_height] = render_system.logical_size();
        if let (Some(visualizer), Some(canvas)) = (&mut self.visualizer, &mut self.canvas) {
            visualizer.resize(canvas, logical_width, logical_height);
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) -> Result<()> {
        let (Some(render_system), Some(canvas), Some(visualizer)) =
            (&mut self.render_system, &mut self.canvas, &mut self.visualizer)
        else {
            return Ok(());
        };

        visualizer.frame(canvas, render_system);

        match render_system.render(canvas.draw_list()) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                render_system.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                Err(spiralbars::error::RenderError::OutOfMemory.into())
            }
            Err(e) => {
                log::warn!("Surface error ({:?}), skipping frame", e);
                Ok(())
            }
        }
    }
}

fn load_settings(args: &Args) -> Result<Config> {
    let path = args.config.clone().or_else(find_config);
    let mut config = match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            load_config(&path)?
        }
        None => Config::default(),
    };
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let config = load_settings(&args)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
