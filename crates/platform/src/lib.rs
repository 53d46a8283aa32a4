//! Platform layer: windowing & event loop.
//!
//! Opens one fixed-size window, builds the [`Renderer`] once the event loop
//! is resumed, uploads the two transform uniforms and redraws continuously
//! (paced by vsync) until Escape or a close request.

use std::sync::Arc;

use anyhow::{Context, Result};
use asset::MeshData;
use corelib::FrameTransforms;
use renderer::{AttributeBindings, Renderer, ShaderProgram};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Window configuration. The window is never resized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Simple example".to_string(),
            width: 640,
            height: 480,
        }
    }
}

impl WindowConfig {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Everything prepared on the CPU before the window opens.
pub struct ViewerSetup {
    pub window: WindowConfig,
    pub backends: wgpu::Backends,
    pub mesh: MeshData,
    pub bindings: AttributeBindings,
    pub program: ShaderProgram,
    pub transforms: FrameTransforms,
}

/// Escape closes the window.
pub fn closes_window(key: PhysicalKey, state: ElementState) -> bool {
    key == PhysicalKey::Code(KeyCode::Escape) && state == ElementState::Pressed
}

/// Run the viewer until the window is closed.
pub fn run_viewer(setup: ViewerSetup) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = ViewerApp::new(setup);

    event_loop
        .run_app(&mut app)
        .context("Event loop terminated with error")?;

    app.finish()
}

struct ViewerApp {
    setup: ViewerSetup,
    // Renderer holds the surface; it must go before the window.
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    failure: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(setup: ViewerSetup) -> Self {
        Self {
            setup,
            renderer: None,
            window: None,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let cfg = &self.setup.window;
        let attrs = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(LogicalSize::new(cfg.width, cfg.height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            self.setup.backends,
            &self.setup.mesh,
            &self.setup.bindings,
            &self.setup.program,
        ))?;

        // Set once; never updated inside the loop.
        let t = &self.setup.transforms;
        renderer.set_uniform_mat4("model", &t.model);
        renderer.set_uniform_mat4("mvp", &t.mvp);

        window.request_redraw();
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match renderer.render() {
            Ok(()) => {}
            Err(e) if Renderer::is_surface_lost(&e) => renderer.recreate_surface(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                self.fail(event_loop, anyhow::anyhow!("GPU surface ran out of memory"));
            }
            Err(wgpu::SurfaceError::Timeout) => log::warn!("Surface timeout; frame skipped"),
            Err(e) => log::warn!("Frame skipped: {e}"),
        }
    }

    fn finish(self) -> Result<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        // Continuous redraw; presentation blocks on vsync.
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if closes_window(event.physical_key, event.state) =>
            {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.renderer = None;
        self.window = None;
        log::info!("GPU resources released, window destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_press_closes() {
        assert!(closes_window(
            PhysicalKey::Code(KeyCode::Escape),
            ElementState::Pressed
        ));
    }

    #[test]
    fn other_keys_and_releases_do_not_close() {
        assert!(!closes_window(
            PhysicalKey::Code(KeyCode::Escape),
            ElementState::Released
        ));
        assert!(!closes_window(
            PhysicalKey::Code(KeyCode::KeyQ),
            ElementState::Pressed
        ));
    }

    #[test]
    fn default_window_is_640_by_480() {
        let cfg = WindowConfig::default();
        assert_eq!((cfg.width, cfg.height), (640, 480));
        assert_eq!(cfg.title, "Simple example");
        assert!((cfg.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }
}
