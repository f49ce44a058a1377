// bongocat - A keyboard-reactive cat overlay for Wayland
// Shows a cat that slaps its paws in time with global keyboard activity

mod activity;
mod cli;
mod compositor;
mod config;
mod engine;
mod error;
mod frame_store;
mod image_loader;
mod input;
mod keys;
mod scaler;
mod wayland;

use anyhow::Result;
use config::Configuration;
use engine::Engine;
use input::InputMonitor;
use log::{info, warn};
use std::path::PathBuf;

/// Placeholder frame size used when no assets are found
const PLACEHOLDER_SIZE: (u32, u32) = (200, 160);

fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // The config file may turn on debug logging, so read it first
    let config_path = args.config.clone().or_else(config::find_config_file);
    let config = match config_path {
        Some(ref path) => Configuration::load_from_path(path)?,
        None => Configuration::default(),
    };

    // Initialize logger
    let default_level = if args.debug || config.debug {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.list_devices {
        for device in input::find_keyboard_devices()? {
            println!("{}", device.display());
        }
        return Ok(());
    }

    match config_path {
        Some(ref path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }
    info!(
        "Starting bongocat: overlay {}px at {:?}, cat {}px, {} fps",
        config.overlay_height, config.overlay_position, config.cat_height, config.fps
    );

    // Load the animation frames
    let frames = match image_loader::load_frames(&args.assets) {
        Ok(frames) => frames,
        Err(e) => {
            warn!("{:#}", e);
            warn!("Using placeholder frames");
            image_loader::placeholder_frames(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1)
        }
    };

    let engine = Engine::new(frames, config)?;

    // Keep the monitor alive for the lifetime of the overlay
    let _input_monitor = start_input(&engine);

    wayland::run(engine)
}

/// Start the keyboard monitor; the overlay still runs without it
fn start_input(engine: &Engine) -> Option<InputMonitor> {
    let devices = match keyboard_devices(engine.config()) {
        Ok(devices) => devices,
        Err(e) => {
            warn!("{:#}", e);
            return None;
        }
    };

    let activity = engine.activity();
    match InputMonitor::start(&devices, move |event| activity.handle_input(event)) {
        Ok(monitor) => Some(monitor),
        Err(e) => {
            warn!("Keyboard input disabled: {:#}", e);
            None
        }
    }
}

fn keyboard_devices(config: &Configuration) -> Result<Vec<PathBuf>> {
    if config.keyboard_devices.is_empty() {
        info!("No keyboard devices configured, scanning /dev/input");
        return input::find_keyboard_devices();
    }
    Ok(config.keyboard_devices.iter().map(PathBuf::from).collect())
}
