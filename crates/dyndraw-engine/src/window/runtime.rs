use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, ExitReason, FrameCtx, RunState, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::error::WindowError;
use crate::input::platform::translate_window_event;
use crate::input::InputEvent;
use crate::time::FrameClock;

/// Where the window is placed on creation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WindowPosition {
    /// Let the platform decide.
    Default,
    /// Centered on the primary monitor.
    Centered,
    /// Outer position in physical pixels.
    At { x: i32, y: i32 },
}

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub position: WindowPosition,
    /// Inner size in physical pixels.
    pub size: PhysicalSize<u32>,
    /// `false` gives a borderless window.
    pub decorations: bool,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "dyndraw".to_string(),
            position: WindowPosition::Centered,
            size: PhysicalSize::new(512, 512),
            decorations: false,
            resizable: false,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, creates its GPU context and drives `app` until the
    /// run state stops.
    ///
    /// Returns the first fatal error (window, context, or `App::on_start`).
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<Option<ExitReason>>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().map_err(WindowError::EventLoop)?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.fatal.take() {
            return Err(err);
        }

        let reason = state.run_state.exit_reason();
        log::info!("event loop finished: {reason:?}");
        Ok(reason)
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit: ExitDebt,
    run_state: RunState,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit: ExitDebt::default(),
            run_state: RunState::new(),
            fatal: None,
        }
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Window, WindowError> {
        let config = &self.config;
        let mut attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.size)
            .with_decorations(config.decorations)
            .with_resizable(config.resizable);

        match config.position {
            WindowPosition::Default => {}
            WindowPosition::At { x, y } => {
                attrs = attrs.with_position(PhysicalPosition::new(x, y));
            }
            WindowPosition::Centered => {
                if let Some(monitor) = event_loop.primary_monitor() {
                    attrs = attrs.with_position(centered_position(
                        monitor.position(),
                        monitor.size(),
                        config.size,
                    ));
                }
            }
        }

        let window = event_loop
            .create_window(attrs)
            .map_err(|source| WindowError::Create {
                title: config.title.clone(),
                source,
            })?;

        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(WindowError::ZeroSize {
                title: config.title.clone(),
                width: size.width,
                height: size.height,
            });
        }

        log::info!("window \"{}\" created at {}x{}", config.title, size.width, size.height);
        Ok(window)
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = self.create_window(event_loop)?;
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntry::try_new(FrameClock::default(), window, |w| {
            pollster::block_on(Gpu::new(w, gpu_init))
        })?;

        entry
            .with_gpu(|gpu| self.app.on_start(gpu))
            .context("application failed to start")?;
        self.exit.incur();

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        self.run_state.stop(ExitReason::Fatal);
        self.shutdown(event_loop);
    }

    /// Runs `App::on_exit` (once), destroys the window + GPU context and leaves the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.take() {
            let app = &mut self.app;
            self.exit.settle(|| entry.with_gpu(|gpu| app.on_exit(gpu)));
            drop(entry);
        }
        event_loop.exit();
    }

    fn handle_input(&mut self, event: &InputEvent) {
        self.run_state.apply(event);

        if self.app.on_input(event) == AppControl::Exit {
            self.run_state.stop(ExitReason::App);
        }

        if let InputEvent::Resized { width, height } = *event {
            if let Some(entry) = self.entry.as_mut() {
                entry.with_gpu_mut(|gpu| gpu.resize(PhysicalSize::new(width, height)));
            }
        }
    }

    fn draw_frame(&mut self, window_id: WindowId) {
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else { return };

        let control = entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                gpu: fields.gpu,
                time,
            };
            app.on_frame(&mut ctx)
        });

        if control == AppControl::Exit {
            self.run_state.stop(ExitReason::App);
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || !self.run_state.is_running() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.run_state.is_running() {
            self.shutdown(event_loop);
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; presentation pacing comes from the present mode.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if !self.run_state.is_running() {
            self.shutdown(event_loop);
            return;
        }

        if let Some(input) = translate_window_event(&event) {
            self.handle_input(&input);
        }

        match &event {
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(size));
                }
            }

            WindowEvent::RedrawRequested if self.run_state.is_running() => {
                self.draw_frame(window_id);
            }

            _ => {}
        }

        if !self.run_state.is_running() {
            self.shutdown(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        // Platform-initiated exit still owes the app its teardown.
        self.shutdown(event_loop);
    }
}

/// Whether `App::on_exit` is owed: set by a successful `on_start`, cleared
/// by the first shutdown.
#[derive(Debug, Default)]
struct ExitDebt {
    owed: bool,
}

impl ExitDebt {
    fn incur(&mut self) {
        self.owed = true;
    }

    /// Runs `on_exit` if it is owed. Returns whether it ran.
    fn settle(&mut self, on_exit: impl FnOnce()) -> bool {
        if std::mem::take(&mut self.owed) {
            on_exit();
            true
        } else {
            false
        }
    }
}

/// Outer position that centers `window` on a monitor.
fn centered_position(
    monitor_pos: PhysicalPosition<i32>,
    monitor_size: PhysicalSize<u32>,
    window: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let dx = (monitor_size.width as i64 - window.width as i64) / 2;
    let dy = (monitor_size.height as i64 - window.height as i64) / 2;
    PhysicalPosition::new(monitor_pos.x + dx as i32, monitor_pos.y + dy as i32)
}
