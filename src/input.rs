// Input module
// Global keyboard monitoring through Linux evdev devices

use crate::keys;
use anyhow::{bail, Context, Result};
use bytemuck::{Pod, Zeroable};
use log::{debug, info, trace, warn};
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

/// evdev event type for keys and buttons
const EV_KEY: u16 = 1;

/// evdev key values
const KEY_VALUE_RELEASE: i32 = 0;
const KEY_VALUE_PRESS: i32 = 1;
const KEY_VALUE_REPEAT: i32 = 2;

/// Directory scanned for event devices
const INPUT_DIR: &str = "/dev/input";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Press,
    Release,
}

/// A key event as delivered by an input backend.
///
/// Each backend knows its own key codes, so hand classification is part of
/// the event rather than a shared table.
pub trait InputEvent {
    fn state(&self) -> KeyState;
    fn key_code(&self) -> i32;
    fn timestamp_ms(&self) -> i64;
    fn is_left_hand_key(&self) -> bool;
    fn is_right_hand_key(&self) -> bool;
}

/// Key event read from an evdev device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvdevKeyEvent {
    state: KeyState,
    code: u16,
    timestamp_ms: i64,
}

impl EvdevKeyEvent {
    pub fn new(state: KeyState, code: u16, timestamp_ms: i64) -> Self {
        Self {
            state,
            code,
            timestamp_ms,
        }
    }

    /// Decode a raw record; non-key events yield None. Key repeats count as
    /// presses.
    fn from_raw(raw: &RawInputEvent) -> Option<Self> {
        if raw.kind != EV_KEY {
            return None;
        }
        let state = match raw.value {
            KEY_VALUE_PRESS | KEY_VALUE_REPEAT => KeyState::Press,
            KEY_VALUE_RELEASE => KeyState::Release,
            _ => return None,
        };
        let timestamp_ms = raw.tv_sec * 1000 + raw.tv_usec / 1000;
        Some(Self::new(state, raw.code, timestamp_ms))
    }
}

impl InputEvent for EvdevKeyEvent {
    fn state(&self) -> KeyState {
        self.state
    }

    fn key_code(&self) -> i32 {
        self.code as i32
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    fn is_left_hand_key(&self) -> bool {
        keys::is_left_hand_key(self.code)
    }

    fn is_right_hand_key(&self) -> bool {
        keys::is_right_hand_key(self.code)
    }
}

/// `struct input_event` as laid out on 64-bit Linux
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct RawInputEvent {
    tv_sec: i64,
    tv_usec: i64,
    kind: u16,
    code: u16,
    value: i32,
}

const RAW_EVENT_SIZE: usize = std::mem::size_of::<RawInputEvent>();

/// Wall-clock milliseconds, the same clock evdev stamps events with
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Reads key events from evdev devices on background threads.
///
/// Dropping the monitor stops it. Reader threads block in `read`, so each one
/// exits after its next event once stopped.
pub struct InputMonitor {
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl InputMonitor {
    /// Open the given devices and start delivering key events to `handler`
    pub fn start<F>(devices: &[PathBuf], handler: F) -> Result<Self>
    where
        F: Fn(&EvdevKeyEvent) + Send + Sync + 'static,
    {
        if devices.is_empty() {
            bail!("No input devices specified");
        }

        let running = Arc::new(AtomicBool::new(true));
        let handler = Arc::new(handler);
        let mut workers = Vec::new();

        info!("Starting input monitor for {} device(s)", devices.len());
        for path in devices {
            let file = match open_device(path) {
                Ok(file) => file,
                Err(e) => {
                    warn!("{:#}", e);
                    continue;
                }
            };
            info!("  - {}", path.display());

            let running = Arc::clone(&running);
            let handler = Arc::clone(&handler);
            let path = path.clone();
            let worker = thread::Builder::new()
                .name(format!("input-{}", device_label(&path)))
                .spawn(move || read_loop(file, &path, &running, handler.as_ref()))
                .context("Failed to spawn input thread")?;
            workers.push(worker);
        }

        if workers.is_empty() {
            running.store(false, Ordering::Relaxed);
            bail!("None of the input devices could be opened. Is the user in the 'input' group?");
        }

        Ok(Self { running, workers })
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed) && self.workers.iter().any(|w| !w.is_finished())
    }

    /// Clear the running flag and join the readers that have returned.
    ///
    /// Shutdown is best-effort: a reader blocked in `read` keeps its device
    /// open until the next event arrives. Its handle is kept, so a later
    /// `stop` joins it.
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::Relaxed) {
            info!("Stopping input monitor");
        }
        let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition(|worker| worker.is_finished());
        for worker in finished {
            let _ = worker.join();
        }
        if !pending.is_empty() {
            debug!("{} input thread(s) still waiting for an event", pending.len());
        }
        self.workers = pending;
    }
}

impl Drop for InputMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_device(path: &Path) -> Result<File> {
    File::open(path).with_context(|| {
        format!(
            "Failed to open input device {} (check permissions for the 'input' group)",
            path.display()
        )
    })
}

fn device_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "device".to_string())
}

fn read_loop(mut file: File, path: &Path, running: &AtomicBool, handler: &dyn Fn(&EvdevKeyEvent)) {
    debug!("Reading events from {}", path.display());
    let mut buf = [0u8; RAW_EVENT_SIZE];

    while running.load(Ordering::Relaxed) {
        match file.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Stopped reading {}: {}", path.display(), e);
                break;
            }
        }
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let raw: RawInputEvent = bytemuck::pod_read_unaligned(&buf);
        if let Some(event) = EvdevKeyEvent::from_raw(&raw) {
            if event.state == KeyState::Press {
                if let Some(name) = keys::key_name(event.code) {
                    trace!(
                        "Key pressed: {} (code={}, left={}, right={})",
                        name,
                        event.code,
                        event.is_left_hand_key(),
                        event.is_right_hand_key()
                    );
                }
            }
            handler(&event);
        }
    }
    debug!("Input thread for {} finished", path.display());
}

/// List candidate keyboard devices (`/dev/input/event*`), sorted
pub fn find_keyboard_devices() -> Result<Vec<PathBuf>> {
    let dir = Path::new(INPUT_DIR);
    if !dir.is_dir() {
        warn!("{} not found", INPUT_DIR);
        return Ok(Vec::new());
    }

    let mut devices: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to enumerate {}", INPUT_DIR))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("event"))
        })
        .collect();
    devices.sort();

    debug!("Found {} input devices", devices.len());
    Ok(devices)
}
