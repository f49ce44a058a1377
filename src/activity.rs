// Hand activity module
// Tracks recent key presses per hand and derives the animation frame

use crate::frame_store::FrameKind;
use crate::input::{InputEvent, KeyState};
use log::trace;
use std::sync::atomic::{AtomicI64, Ordering};

/// Marks a hand that has not been pressed since start or reset
const NEVER: i64 = i64::MIN;

/// Last press time per hand, in milliseconds.
///
/// Written by the input thread and read by the render thread. The two fields
/// are independent atomics; a reader may see a new left timestamp together
/// with an old right one, which only delays a transition by one tick.
#[derive(Debug)]
pub struct HandActivity {
    last_left_press_ms: AtomicI64,
    last_right_press_ms: AtomicI64,
}

impl Default for HandActivity {
    fn default() -> Self {
        Self {
            last_left_press_ms: AtomicI64::new(NEVER),
            last_right_press_ms: AtomicI64::new(NEVER),
        }
    }
}

impl HandActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Releases and unclassified keys are ignored.
    pub fn handle_input<E: InputEvent + ?Sized>(&self, event: &E) {
        if event.state() != KeyState::Press {
            return;
        }

        let timestamp = event.timestamp_ms();
        if event.is_left_hand_key() {
            self.last_left_press_ms.store(timestamp, Ordering::Relaxed);
            trace!("Left hand key {} at {}", event.key_code(), timestamp);
        }
        if event.is_right_hand_key() {
            self.last_right_press_ms.store(timestamp, Ordering::Relaxed);
            trace!("Right hand key {} at {}", event.key_code(), timestamp);
        }
    }

    /// Frame for the given time: a hand is active for `hold_ms` after its
    /// last press
    pub fn derive_frame(&self, now_ms: i64, hold_ms: i64, idle: FrameKind) -> FrameKind {
        let left_active =
            now_ms.saturating_sub(self.last_left_press_ms.load(Ordering::Relaxed)) < hold_ms;
        let right_active =
            now_ms.saturating_sub(self.last_right_press_ms.load(Ordering::Relaxed)) < hold_ms;

        match (left_active, right_active) {
            (true, true) => FrameKind::Both,
            (true, false) => FrameKind::Left,
            (false, true) => FrameKind::Right,
            (false, false) => idle,
        }
    }

    /// Forget all presses
    pub fn reset(&self) {
        self.last_left_press_ms.store(NEVER, Ordering::Relaxed);
        self.last_right_press_ms.store(NEVER, Ordering::Relaxed);
    }

    /// Last (left, right) press times, if any
    #[allow(dead_code)]
    pub fn last_presses(&self) -> (Option<i64>, Option<i64>) {
        let load = |slot: &AtomicI64| Some(slot.load(Ordering::Relaxed)).filter(|&t| t != NEVER);
        (load(&self.last_left_press_ms), load(&self.last_right_press_ms))
    }
}
