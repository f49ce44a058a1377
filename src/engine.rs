// Animation engine module
// The single entry point used by the render loop and the input backend

use crate::activity::HandActivity;
use crate::compositor;
use crate::config::{Alignment, Configuration};
use crate::error::{EngineError, EngineResult};
use crate::frame_store::{FrameKind, FrameStore, RawFrame, ScaleOptions};
use crate::input::InputEvent;
use log::{debug, info};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Placement of the scaled frame inside the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderGeometry {
    pub frame_width: u32,
    pub frame_height: u32,
    pub align: Alignment,
    pub x_offset: i32,
    pub y_offset: i32,
}

impl RenderGeometry {
    fn new(config: &Configuration, frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            align: config.cat_align,
            x_offset: config.cat_x_offset,
            y_offset: config.cat_y_offset,
        }
    }

    pub fn x(&self, surface_width: u32) -> i32 {
        let free = surface_width as i32 - self.frame_width as i32;
        match self.align {
            Alignment::Left => self.x_offset,
            Alignment::Right => free + self.x_offset,
            Alignment::Center => free / 2 + self.x_offset,
        }
    }

    pub fn y(&self) -> i32 {
        self.y_offset
    }
}

pub struct Engine {
    config: Configuration,
    frames: FrameStore,
    activity: Arc<HandActivity>,
    current: AtomicU8,
    geometry: RenderGeometry,
}

impl Engine {
    /// Validate the configuration and take ownership of the four frames
    pub fn new(frames: Vec<RawFrame>, config: Configuration) -> EngineResult<Self> {
        config.validate()?;
        let frames = FrameStore::load(frames)?;
        let idle = config.idle_frame_kind();

        info!("Animation engine initialized (idle frame {:?})", idle);

        Ok(Self {
            geometry: RenderGeometry::new(&config, 0, 0),
            config,
            frames,
            activity: Arc::new(HandActivity::new()),
            current: AtomicU8::new(idle as u8),
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Rescale the frames for an overlay of the given size. The cat is fitted
    /// within the overlay width and the configured cat height.
    pub fn set_target_dimensions(&mut self, overlay_width: u32, overlay_height: u32) {
        debug!(
            "Target dimensions {}x{} (cat height {})",
            overlay_width, overlay_height, self.config.cat_height
        );

        let options = ScaleOptions {
            antialias: self.config.enable_antialiasing,
            mirror_horizontal: self.config.mirror_horizontal,
            mirror_vertical: self.config.mirror_vertical,
            opacity: self.config.overlay_opacity.min(255) as u8,
        };
        self.frames
            .rescale(overlay_width, self.config.cat_height, options);

        let (width, height) = self.frames.scaled_size().unwrap_or((0, 0));
        self.geometry = RenderGeometry::new(&self.config, width, height);
    }

    /// Shared handle for the input thread
    pub fn activity(&self) -> Arc<HandActivity> {
        Arc::clone(&self.activity)
    }

    pub fn handle_input<E: InputEvent + ?Sized>(&self, event: &E) {
        self.activity.handle_input(event);
    }

    /// Derive and publish the frame for `now_ms`
    pub fn tick(&self, now_ms: i64) -> FrameKind {
        let frame = self.activity.derive_frame(
            now_ms,
            self.config.keypress_duration_ms as i64,
            self.config.idle_frame_kind(),
        );
        let old = self.current.swap(frame as u8, Ordering::Relaxed);
        if old != frame as u8 {
            debug!("Animation state changed: frame {} -> {}", old, frame as u8);
        }
        frame
    }

    pub fn current_frame_kind(&self) -> FrameKind {
        FrameKind::from_index(self.current.load(Ordering::Relaxed) as usize)
            .unwrap_or(FrameKind::Idle)
    }

    pub fn current_frame(&self) -> EngineResult<&RawFrame> {
        self.frames.scaled_frame(self.current_frame_kind())
    }

    #[allow(dead_code)]
    pub fn is_idle(&self) -> bool {
        self.current_frame_kind() == self.config.idle_frame_kind()
    }

    /// Back to the idle frame with no recorded presses
    #[allow(dead_code)]
    pub fn reset(&self) {
        self.activity.reset();
        self.current
            .store(self.config.idle_frame_kind() as u8, Ordering::Relaxed);
        debug!("Animation reset to idle");
    }

    #[allow(dead_code)]
    pub fn geometry(&self) -> RenderGeometry {
        self.geometry
    }

    pub fn render_x(&self, surface_width: u32) -> i32 {
        self.geometry.x(surface_width)
    }

    pub fn render_y(&self) -> i32 {
        self.geometry.y()
    }

    /// Clear the buffer and draw the current frame at its aligned position
    pub fn render_into(&self, buffer: &mut [u8], width: u32, height: u32) -> EngineResult<()> {
        let frame = self.current_frame()?;
        compositor::clear(buffer, width, height, compositor::TRANSPARENT)?;
        compositor::render_opaque(
            buffer,
            width,
            height,
            frame,
            self.render_x(width),
            self.render_y(),
        )
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("current", &self.current_frame_kind())
            .field("geometry", &self.geometry)
            .field("scaled_size", &self.frames.scaled_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{EvdevKeyEvent, KeyState};
    use crate::keys;

    /// Four solid frames whose red byte encodes the frame index
    fn frames(width: u32, height: u32) -> Vec<RawFrame> {
        (0..4u8)
            .map(|i| RawFrame::filled(width, height, [0, 0, 10 + i, 255]))
            .collect()
    }

    fn engine(config: Configuration) -> Engine {
        let mut engine = Engine::new(frames(200, 160), config).unwrap();
        engine.set_target_dimensions(400, 100);
        engine
    }

    fn press(code: u16, at: i64) -> EvdevKeyEvent {
        EvdevKeyEvent::new(KeyState::Press, code, at)
    }

    #[test]
    fn new_rejects_wrong_frame_count() {
        let err = Engine::new(frames(10, 10)[..3].to_vec(), Configuration::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAsset(_)));
    }

    #[test]
    fn new_rejects_malformed_frame() {
        let mut set = frames(20, 16);
        set[1] = RawFrame {
            width: 20,
            height: 16,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            Engine::new(set, Configuration::default()),
            Err(EngineError::InvalidAsset(_))
        ));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = Configuration {
            idle_frame: 7,
            ..Configuration::default()
        };
        assert!(matches!(
            Engine::new(frames(10, 10), config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn starts_on_configured_idle_frame() {
        let config = Configuration {
            idle_frame: 2,
            ..Configuration::default()
        };
        let engine = Engine::new(frames(10, 10), config).unwrap();
        assert_eq!(engine.current_frame_kind(), FrameKind::Right);
        assert!(engine.is_idle());
    }

    #[test]
    fn render_before_scaling_fails() {
        let engine = Engine::new(frames(10, 10), Configuration::default()).unwrap();
        let mut buf = vec![0u8; 4 * 4 * 4];
        assert_eq!(
            engine.render_into(&mut buf, 4, 4),
            Err(EngineError::FramesNotScaled)
        );
    }

    #[test]
    fn tick_follows_press_decay() {
        let engine = engine(Configuration::default());
        engine.handle_input(&press(keys::KEY_Q, 0));
        assert_eq!(engine.tick(50), FrameKind::Left);
        assert_eq!(engine.current_frame_kind(), FrameKind::Left);
        assert!(!engine.is_idle());
        assert_eq!(engine.tick(150), FrameKind::Idle);
        assert!(engine.is_idle());
    }

    #[test]
    fn both_hands_within_hold_window() {
        let engine = engine(Configuration::default());
        engine.handle_input(&press(keys::KEY_Q, 0));
        engine.handle_input(&press(keys::KEY_P, 10));
        assert_eq!(engine.tick(50), FrameKind::Both);
    }

    #[test]
    fn input_through_shared_handle_reaches_engine() {
        let engine = engine(Configuration::default());
        let activity = engine.activity();
        std::thread::spawn(move || activity.handle_input(&press(keys::KEY_ENTER, 1_000)))
            .join()
            .unwrap();
        assert_eq!(engine.tick(1_020), FrameKind::Right);
        engine.reset();
        assert_eq!(engine.tick(1_020), FrameKind::Idle);
    }

    #[test]
    fn alignment_positions() {
        let mut config = Configuration::default();
        let geometry = |config: &Configuration| RenderGeometry::new(config, 100, 80);

        config.cat_align = Alignment::Left;
        config.cat_x_offset = 5;
        assert_eq!(geometry(&config).x(400), 5);

        config.cat_align = Alignment::Right;
        assert_eq!(geometry(&config).x(400), 305);

        config.cat_align = Alignment::Center;
        config.cat_x_offset = -10;
        assert_eq!(geometry(&config).x(400), 140);

        config.cat_y_offset = 7;
        assert_eq!(geometry(&config).y(), 7);
    }

    #[test]
    fn right_press_renders_centered_frame() {
        let engine = engine(Configuration::default());

        for kind in FrameKind::ALL {
            let frame = engine.frames.scaled_frame(kind).unwrap();
            assert_eq!((frame.width, frame.height), (100, 80));
        }

        engine.handle_input(&press(keys::KEY_J, 1_000));
        assert_eq!(engine.tick(1_030), FrameKind::Right);
        assert_eq!(engine.current_frame().unwrap().pixel(0, 0), [0, 0, 12, 255]);

        let (width, height) = (400u32, 100u32);
        let mut buf = vec![0xEE; (width * height * 4) as usize];
        engine.render_into(&mut buf, width, height).unwrap();

        assert_eq!(engine.render_x(width), 150);
        assert_eq!(engine.render_y(), 0);
        let px = |x: u32, y: u32| {
            let i = ((y * width + x) * 4) as usize;
            [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
        };
        assert_eq!(px(149, 0), [0, 0, 0, 0]);
        assert_eq!(px(150, 0), [0, 0, 12, 255]);
        assert_eq!(px(249, 79), [0, 0, 12, 255]);
        assert_eq!(px(250, 0), [0, 0, 0, 0]);
        assert_eq!(px(200, 80), [0, 0, 0, 0]);
    }

    #[test]
    fn offsets_push_sprite_partly_offscreen() {
        let config = Configuration {
            cat_align: Alignment::Left,
            cat_x_offset: -60,
            cat_y_offset: 50,
            ..Configuration::default()
        };
        let engine = engine(config);
        let mut buf = vec![0u8; 400 * 100 * 4];
        engine.render_into(&mut buf, 400, 100).unwrap();

        let painted = buf.chunks_exact(4).filter(|p| p[3] == 255).count();
        // 40 visible columns by 50 visible rows
        assert_eq!(painted, 40 * 50);
    }

    #[test]
    fn render_rejects_short_buffer() {
        let engine = engine(Configuration::default());
        let mut buf = vec![0u8; 10];
        assert!(matches!(
            engine.render_into(&mut buf, 400, 100),
            Err(EngineError::BufferSizeMismatch { .. })
        ));
    }
}
