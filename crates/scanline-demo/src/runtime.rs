use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use scanline_engine::device::{Gpu, SurfaceErrorAction, WindowSurface};
use scanline_engine::frame::FrameComposer;
use scanline_engine::pipeline::shaders::{CRT_FRAGMENT, DEFAULT_FRAGMENT, DEFAULT_VERTEX};
use scanline_engine::pipeline::ShaderProgram;
use scanline_engine::render::{RenderCtx, RenderTarget};

use crate::config::DemoConfig;
use crate::overlay::{self, NoiseBox};

/// Entry point for the demo loop.
pub struct Runtime;

impl Runtime {
    pub fn run(config: DemoConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = DemoState::new(config);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: WindowSurface<'this>,
}

/// Everything that exists once the window is up.
struct Scene {
    entry: WindowEntry,
    gpu: Gpu,
    composer: FrameComposer,
    program: ShaderProgram,
    crt: bool,
}

struct DemoState {
    config: DemoConfig,
    scene: Option<Scene>,
    rng: fastrand::Rng,
    exit_requested: bool,
}

impl DemoState {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            scene: None,
            rng: fastrand::Rng::new(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_scene(&self, event_loop: &ActiveEventLoop) -> Result<Scene> {
        let config = &self.config;
        let size = PhysicalSize::new(
            config.logical_width * config.window_scale,
            config.logical_height * config.window_scale,
        );
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let inner = window.inner_size();

        let instance = Gpu::create_instance(&config.gpu);
        let mut entry = WindowEntryTryBuilder {
            window,
            surface_builder: |w| WindowSurface::new(&instance, w, (inner.width, inner.height)),
        }
        .try_build()?;

        let gpu = pollster::block_on(Gpu::with_instance(
            instance,
            Some(entry.borrow_surface().raw()),
            config.gpu.clone(),
        ))?;
        entry.with_surface_mut(|s| s.configure(&gpu, &config.surface))?;

        let format = entry
            .borrow_surface()
            .format()
            .context("surface has no format after configuration")?;

        let mut composer = FrameComposer::new(
            &gpu,
            config.logical_width,
            config.logical_height,
            config.opacity,
        )?;
        if let Err(e) = composer.load_background_file(&gpu, &config.background) {
            log::warn!("background unavailable ({e}); using a gradient");
            composer.load_background_pixels(
                &gpu,
                &overlay::gradient(config.logical_width, config.logical_height),
            )?;
        }

        let mut program = ShaderProgram::with_label(format, "scanline");
        program.init(gpu.device());
        load_program(&mut program, &gpu, config)?;
        program.bind()?;

        log::info!(
            "window {}x{}, layers {}x{}, surface {format:?}",
            inner.width,
            inner.height,
            config.logical_width,
            config.logical_height
        );

        Ok(Scene {
            entry,
            gpu,
            composer,
            program,
            crt: config.crt,
        })
    }

    /// Composes and presents one frame.
    fn redraw(&mut self) -> Result<()> {
        let area = NoiseBox {
            margin_x: self.config.overlay_margin_x,
            margin_y: self.config.overlay_margin_y,
        };
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let (width, height) = scene.entry.borrow_surface().size();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let rng = &mut self.rng;
        scene.composer.compose(&scene.gpu, |pixels, w, h| {
            overlay::draw_noise(pixels, w, h, area, rng)
        })?;

        let gpu = &scene.gpu;
        let begun = scene.entry.borrow_surface().begin_frame(gpu);
        let mut frame = match begun {
            Ok(frame) => frame,
            Err(err) => {
                let reason = err.to_string();
                log::debug!("surface error: {reason}");
                return match scene.entry.with_surface_mut(|s| s.handle_error(gpu, err)) {
                    SurfaceErrorAction::Fatal => Err(anyhow::anyhow!("surface lost: {reason}")),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                };
            }
        };

        {
            let mut target = RenderTarget::from_frame(&mut frame);
            scene
                .composer
                .render(&mut scene.program, &RenderCtx::from(gpu), &mut target)?;
        }

        scene.entry.borrow_window().pre_present_notify();
        scene.entry.borrow_surface().submit(gpu, frame);
        Ok(())
    }

    /// Switches between the plain and CRT fragment stages.
    fn toggle_crt(&mut self) -> Result<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        if self.config.fragment_shader.is_some() {
            log::info!("custom shaders loaded; CRT toggle disabled");
            return Ok(());
        }

        scene.crt = !scene.crt;
        let fragment = if scene.crt { CRT_FRAGMENT } else { DEFAULT_FRAGMENT };
        scene
            .program
            .load_program(scene.gpu.device(), DEFAULT_VERTEX, fragment)?;
        scene.program.bind()?;
        log::info!("CRT look {}", if scene.crt { "on" } else { "off" });
        Ok(())
    }
}

/// Loads the configured stages, falling back to the built-ins when files
/// fail to load.
fn load_program(program: &mut ShaderProgram, gpu: &Gpu, config: &DemoConfig) -> Result<()> {
    if let (Some(vs), Some(fs)) = (&config.vertex_shader, &config.fragment_shader) {
        match program.load_program_from_files(gpu.device(), vs, fs) {
            Ok(()) => {
                log::info!("shader programs loaded: {}, {}", vs.display(), fs.display());
                return Ok(());
            }
            Err(e) => log::warn!("unable to load shaders ({e}); using built-ins"),
        }
    }

    let fragment = if config.crt { CRT_FRAGMENT } else { DEFAULT_FRAGMENT };
    program
        .load_program(gpu.device(), DEFAULT_VERTEX, fragment)
        .context("built-in shader program failed to build")
}

impl ApplicationHandler for DemoState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }

        match self.create_scene(event_loop) {
            Ok(scene) => {
                scene.entry.borrow_window().request_redraw();
                self.scene = Some(scene);
            }
            Err(e) => {
                log::error!("failed to start: {e:#}");
                self.request_exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // The overlay changes every frame.
        if let Some(scene) = self.scene.as_ref() {
            scene.entry.borrow_window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => self.request_exit(event_loop),
                    PhysicalKey::Code(KeyCode::Space) if !event.repeat => {
                        if let Err(e) = self.toggle_crt() {
                            log::error!("shader switch failed: {e:#}");
                            self.request_exit(event_loop);
                        }
                    }
                    _ => {}
                }
            }

            WindowEvent::Resized(new_size) => {
                if let Some(scene) = self.scene.as_mut() {
                    let gpu = &scene.gpu;
                    scene
                        .entry
                        .with_surface_mut(|s| s.resize(gpu, new_size.width, new_size.height));
                    scene.entry.borrow_window().request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    log::error!("frame failed: {e:#}");
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release GPU objects while the window still exists.
        if let Some(mut scene) = self.scene.take() {
            scene.program.free();
        }
        log::info!("scanline demo terminated");
    }
}
