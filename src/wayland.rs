// Wayland integration module
// Layer-shell overlay surface and the timer-driven render loop, using smithay-client-toolkit

use crate::config::{LayerType, Position};
use crate::engine::Engine;
use crate::input::now_ms;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState, Region},
    delegate_compositor, delegate_layer, delegate_output, delegate_registry, delegate_shm,
    output::{OutputHandler, OutputState},
    reexports::{
        calloop::{
            timer::{TimeoutAction, Timer},
            EventLoop,
        },
        calloop_wayland_source::WaylandSource,
    },
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    shell::{
        wlr_layer::{
            Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
            LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm, ShmHandler,
    },
};
use std::time::Duration;
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_output, wl_shm, wl_surface},
    Connection, QueueHandle,
};

/// Layer-shell namespace of the overlay surface
const NAMESPACE: &str = "bongocat";

/// Fallback width until the compositor reports one
const DEFAULT_WIDTH: u32 = 1920;

/// Overlay state driven by the event loop
struct OverlayApp {
    registry_state: RegistryState,
    output_state: OutputState,
    shm: Shm,
    layer_shell: LayerShell,
    compositor_state: CompositorState,

    engine: Engine,
    should_exit: bool,

    // Surface and buffer management
    layer_surface: Option<LayerSurface>,
    pool: Option<SlotPool>,
    buffer: Option<Buffer>,
    width: u32,
    height: u32,
    configured: bool,
    needs_redraw: bool,
}

impl OverlayApp {
    fn new(
        registry_state: RegistryState,
        output_state: OutputState,
        shm: Shm,
        layer_shell: LayerShell,
        compositor_state: CompositorState,
        engine: Engine,
    ) -> Self {
        let height = engine.config().overlay_height;
        Self {
            registry_state,
            output_state,
            shm,
            layer_shell,
            compositor_state,
            engine,
            should_exit: false,
            layer_surface: None,
            pool: None,
            buffer: None,
            width: 0,
            height,
            configured: false,
            needs_redraw: true,
        }
    }

    /// Output named in the configuration, if it is connected
    fn find_output(&self, name: &str) -> Option<wl_output::WlOutput> {
        self.output_state.outputs().find(|output| {
            self.output_state
                .info(output)
                .and_then(|info| info.name)
                .is_some_and(|output_name| output_name == name)
        })
    }

    fn create_layer_surface(&mut self, qh: &QueueHandle<Self>) -> Result<()> {
        let config = self.engine.config().clone();

        let output = match config.monitor_name.as_deref() {
            Some(name) => {
                let output = self.find_output(name);
                if output.is_none() {
                    warn!("Monitor '{}' not found, letting the compositor choose", name);
                }
                output
            }
            None => None,
        };

        let surface = self.compositor_state.create_surface(qh);
        let layer_surface = self.layer_shell.create_layer_surface(
            qh,
            surface,
            layer_for(config.layer),
            Some(NAMESPACE),
            output.as_ref(),
        );

        layer_surface.set_anchor(anchor_for(config.overlay_position));
        layer_surface.set_size(0, config.overlay_height);
        layer_surface.set_exclusive_zone(-1);
        layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);

        // Empty input region: clicks pass through to the windows below
        let region = Region::new(&self.compositor_state).context("Failed to create input region")?;
        layer_surface
            .wl_surface()
            .set_input_region(Some(region.wl_region()));

        // Commit the surface to trigger configure
        layer_surface.commit();

        info!(
            "Overlay surface created ({:?} layer, {:?} edge, height {})",
            config.layer, config.overlay_position, config.overlay_height
        );
        self.layer_surface = Some(layer_surface);
        Ok(())
    }

    /// Advance the animation and redraw when the frame changed
    fn on_tick(&mut self) {
        let before = self.engine.current_frame_kind();
        let frame = self.engine.tick(now_ms());
        if frame != before {
            self.needs_redraw = true;
        }
        if self.configured && self.needs_redraw {
            self.draw();
        }
    }

    /// Render the current frame into a fresh shm buffer and commit it
    fn draw(&mut self) {
        let Some(layer_surface) = self.layer_surface.as_ref() else {
            return;
        };
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return;
        }

        let stride = width as i32 * 4;
        let buffer_size = stride as usize * height as usize;

        // Initialize pool if needed
        if self.pool.is_none() {
            match SlotPool::new(buffer_size, &self.shm) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    error!("Failed to create slot pool: {}. Buffer size: {} bytes", e, buffer_size);
                    return;
                }
            }
        }
        let Some(pool) = self.pool.as_mut() else {
            return;
        };

        // Resize pool if needed
        if pool.len() < buffer_size {
            if let Err(e) = pool.resize(buffer_size) {
                error!("Failed to resize pool to {} bytes: {}", buffer_size, e);
                self.pool = None;
                return;
            }
        }

        let (buffer, canvas) = match pool.create_buffer(
            width as i32,
            height as i32,
            stride,
            wl_shm::Format::Argb8888,
        ) {
            Ok(buf) => buf,
            Err(e) => {
                error!("Failed to create buffer {}x{}: {}", width, height, e);
                return;
            }
        };

        if let Err(e) = self.engine.render_into(canvas, width, height) {
            error!("Failed to render frame: {}", e);
            return;
        }

        // Attach and commit
        let surface = layer_surface.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            error!("Failed to attach buffer: {:?}", e);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.commit();

        self.buffer = Some(buffer);
        self.needs_redraw = false;
    }
}

fn layer_for(layer: LayerType) -> Layer {
    match layer {
        LayerType::Top => Layer::Top,
        LayerType::Overlay => Layer::Overlay,
    }
}

/// Full output width along the configured edge
fn anchor_for(position: Position) -> Anchor {
    let edge = match position {
        Position::Top => Anchor::TOP,
        Position::Bottom => Anchor::BOTTOM,
    };
    Anchor::LEFT | Anchor::RIGHT | edge
}

impl CompositorHandler for OverlayApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
        debug!("Scale factor changed");
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
        debug!("Transform changed");
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for OverlayApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("New output detected");
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output updated");
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output destroyed");
    }
}

impl LayerShellHandler for OverlayApp {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        info!("Layer surface closed");
        self.should_exit = true;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        debug!("Layer surface configured: {:?}", configure);

        let (mut width, mut height) = configure.new_size;
        if width == 0 {
            width = if self.width > 0 { self.width } else { DEFAULT_WIDTH };
        }
        if height == 0 {
            height = self.engine.config().overlay_height;
        }

        if !self.configured || (width, height) != (self.width, self.height) {
            info!("Overlay size {}x{}", width, height);
            self.width = width;
            self.height = height;
            self.engine.set_target_dimensions(width, height);
        }

        self.configured = true;
        self.needs_redraw = true;
        self.draw();
    }
}

impl ShmHandler for OverlayApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for OverlayApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState];
}

// Delegate macros
delegate_compositor!(OverlayApp);
delegate_output!(OverlayApp);
delegate_layer!(OverlayApp);
delegate_shm!(OverlayApp);
delegate_registry!(OverlayApp);

/// Show the overlay and animate it until the compositor closes the surface
pub fn run(engine: Engine) -> Result<()> {
    info!("Connecting to Wayland display");

    // Connect to Wayland display
    let conn = Connection::connect_to_env().context("Failed to connect to Wayland display")?;

    // Initialize registry and event queue
    let (globals, mut event_queue) =
        registry_queue_init(&conn).context("Failed to initialize registry")?;
    let qh = event_queue.handle();

    // Initialize required globals
    let compositor_state =
        CompositorState::bind(&globals, &qh).context("Failed to bind compositor")?;
    let layer_shell = LayerShell::bind(&globals, &qh).context("Failed to bind layer shell")?;
    let shm = Shm::bind(&globals, &qh).context("Failed to bind shm")?;

    let interval = Duration::from_millis(engine.config().frame_interval_ms());

    let mut app = OverlayApp::new(
        RegistryState::new(&globals),
        OutputState::new(&globals, &qh),
        shm,
        layer_shell,
        compositor_state,
        engine,
    );

    // Dispatch once to get output info
    event_queue.roundtrip(&mut app)?;
    for output in app.output_state.outputs() {
        if let Some(info) = app.output_state.info(&output) {
            debug!(
                "Output {}: {:?}",
                info.name.as_deref().unwrap_or("<unnamed>"),
                info.modes.iter().find(|m| m.current).map(|m| m.dimensions)
            );
        }
    }

    app.create_layer_surface(&qh)?;

    let mut event_loop: EventLoop<OverlayApp> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let loop_handle = event_loop.handle();

    WaylandSource::new(conn, event_queue)
        .insert(loop_handle.clone())
        .map_err(|e| anyhow!("Failed to register Wayland source: {}", e.error))?;

    loop_handle
        .insert_source(Timer::from_duration(interval), move |_, _, app| {
            app.on_tick();
            TimeoutAction::ToDuration(interval)
        })
        .map_err(|e| anyhow!("Failed to register frame timer: {}", e.error))?;

    info!("Starting event loop ({} ms per tick)", interval.as_millis());

    // Main event loop
    loop {
        event_loop
            .dispatch(None::<Duration>, &mut app)
            .context("Event loop dispatch failed")?;

        if app.should_exit {
            info!("Exiting overlay");
            break;
        }
    }

    Ok(())
}
