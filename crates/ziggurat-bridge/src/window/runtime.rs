use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::engine::Engine;
use crate::grid;
use crate::memory::MemoryView;
use crate::render::CellRenderer;
use crate::session::{self, DEFAULT_CELL_SCALE, Session};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Pixels per cell edge for the backing surface.
    pub cell_scale: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ziggurat".to_string(),
            cell_scale: DEFAULT_CELL_SCALE,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Boots the engine session, opens the window, and runs until close.
    pub fn run<E>(config: RuntimeConfig, engine: E) -> Result<()>
    where
        E: Engine + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = HostState::new(config, engine);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct Display {
    window: Window,

    // `None` when GPU acquisition failed: the window stays up and the
    // runtime keeps handling events in a non-rendering state.
    #[borrows(window)]
    #[covariant]
    gpu: Option<Gpu<'this>>,
}

struct HostState<E>
where
    E: Engine + 'static,
{
    config: RuntimeConfig,
    engine: E,
    session: Option<Session>,
    display: Option<Display>,
    renderer: Option<CellRenderer>,
    pointer: Option<(f64, f64)>,
}

impl<E> HostState<E>
where
    E: Engine + 'static,
{
    fn new(config: RuntimeConfig, engine: E) -> Self {
        Self {
            config,
            engine,
            session: None,
            display: None,
            renderer: None,
            pointer: None,
        }
    }

    /// One-shot boot: session, window, GPU, renderer, first frame.
    ///
    /// Each stage that fails is reported once; later stages are skipped and
    /// the app survives without them.
    fn boot(&mut self, event_loop: &ActiveEventLoop) {
        let session = match session::boot(&mut self.engine) {
            Ok(s) => s,
            Err(e) => {
                log::error!("engine boot failed: {e:#}");
                return;
            }
        };
        self.session = Some(session);

        let (width, height) = session.grid.surface_size(self.config.cell_scale);
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);

        let window = match event_loop.create_window(attrs) {
            Ok(w) => w,
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                return;
            }
        };

        let display = DisplayBuilder {
            window,
            gpu_builder: |w| match pollster::block_on(Gpu::new(w)) {
                Ok(gpu) => Some(gpu),
                Err(e) => {
                    log::error!("GPU initialization failed: {e:#}");
                    None
                }
            },
        }
        .build();

        // Seed the renderer from freshly derived views; boot is the last
        // engine call before this point, so these are current.
        let engine = &self.engine;
        self.renderer = display.with_gpu(|gpu| {
            let gpu = gpu.as_ref()?;
            let view = MemoryView::new(engine.memory());
            let dynamic = session.dynamic_floats(&view);
            let colors = session.constant_colors(&view);

            match CellRenderer::new(
                gpu.device(),
                gpu.surface_format(),
                session.grid,
                session.instances,
                dynamic,
                &colors,
            ) {
                Ok(renderer) => Some(renderer),
                Err(e) => {
                    log::error!("cell renderer unavailable: {e:#}");
                    None
                }
            }
        });

        display.with_window(|w| w.request_redraw());
        self.display = Some(display);
    }

    /// The synchronous click-to-render cycle.
    fn on_click(&mut self) {
        let (Some(session), Some(display)) = (self.session, self.display.as_ref()) else {
            return;
        };
        let Some(pointer) = self.pointer else {
            return;
        };

        let displayed = display.with_window(|w| w.inner_size());
        let Some(cell) = grid::cell_at(
            pointer,
            (f64::from(displayed.width), f64::from(displayed.height)),
            session.grid,
        ) else {
            return;
        };

        let started = Instant::now();
        let range = session.interact(&mut self.engine, cell, 1);

        if let Some(range) = range {
            if let Some(renderer) = self.renderer.as_ref() {
                let engine = &self.engine;
                display.with_gpu(|gpu| {
                    if let Some(gpu) = gpu.as_ref() {
                        let view = MemoryView::new(engine.memory());
                        renderer.upload_range(gpu.queue(), range, session.dynamic_floats(&view));
                    }
                });
            }
        }

        log::debug!(
            "click at cell ({}, {}) handled in {:.3}ms (dirty: {:?})",
            cell.x,
            cell.y,
            started.elapsed().as_secs_f64() * 1e3,
            range
        );

        display.with_window(|w| w.request_redraw());
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        let renderer = self.renderer.as_ref();
        let mut fatal = false;

        display.with_gpu_mut(|gpu| {
            let Some(gpu) = gpu.as_mut() else { return };

            let mut frame = match gpu.begin_frame() {
                Ok(f) => f,
                Err(err) => {
                    fatal = gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal;
                    return;
                }
            };

            match renderer {
                Some(renderer) => renderer.render(&mut frame.encoder, &frame.view),
                // No linked pipeline: present a bare clear instead of
                // undefined surface contents.
                None => clear_only(&mut frame.encoder, &frame.view),
            }

            gpu.submit(frame);
        });

        if fatal {
            log::error!("surface out of memory; exiting");
            event_loop.exit();
        }
    }
}

fn clear_only(encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
    let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("ziggurat clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
}

impl<E> ApplicationHandler for HostState<E>
where
    E: Engine + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.display.is_none() {
            self.boot(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Redraws are requested explicitly after clicks; idle otherwise.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let is_ours = self
            .display
            .as_ref()
            .is_some_and(|d| d.with_window(|w| w.id()) == window_id);
        if !is_ours {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(new_size) => {
                if let Some(display) = self.display.as_mut() {
                    display.with_gpu_mut(|gpu| {
                        if let Some(gpu) = gpu.as_mut() {
                            gpu.resize(new_size);
                        }
                    });
                    display.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(display) = self.display.as_mut() {
                    let new_size = display.with_window(|w| w.inner_size());
                    display.with_gpu_mut(|gpu| {
                        if let Some(gpu) = gpu.as_mut() {
                            gpu.resize(new_size);
                        }
                    });
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = Some((position.x, position.y));
            }

            WindowEvent::CursorLeft { .. } => {
                self.pointer = None;
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.on_click(),

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
