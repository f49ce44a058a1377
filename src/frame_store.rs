// Frame store module
// Holds the four animation frames and their scaled counterparts

use crate::error::{EngineError, EngineResult};
use crate::scaler;
use log::{debug, info};
use std::borrow::Cow;
use std::sync::Arc;

/// Number of animation frames in a sprite set
pub const FRAME_COUNT: usize = 4;

/// A raster of 4-byte pixels, row-major, top-to-bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel data, width * height * 4 bytes, alpha in byte 3
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Wrap pixel data, checking that its length matches the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> EngineResult<Self> {
        let frame = Self {
            width,
            height,
            pixels,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Non-empty, with exactly width * height * 4 bytes of pixel data
    pub fn validate(&self) -> EngineResult<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(EngineError::invalid_asset(format!(
                "frame {}x{} needs {} bytes, got {}",
                self.width,
                self.height,
                expected,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// A frame filled with a single 4-byte pixel value
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let pixels = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// The 4 bytes of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

/// The four animation states, doubling as frame indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Idle = 0,
    Left = 1,
    Right = 2,
    Both = 3,
}

impl FrameKind {
    pub const ALL: [FrameKind; FRAME_COUNT] = [
        FrameKind::Idle,
        FrameKind::Left,
        FrameKind::Right,
        FrameKind::Both,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One full set of scaled frames, all sharing the same size
#[derive(Debug)]
struct ScaledSet {
    width: u32,
    height: u32,
    frames: [Arc<RawFrame>; FRAME_COUNT],
}

/// Parameters applied to every frame on rescale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOptions {
    /// Bilinear when true, nearest-neighbour otherwise
    pub antialias: bool,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    /// Alpha multiplier, 255 leaves frames untouched
    pub opacity: u8,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            mirror_horizontal: false,
            mirror_vertical: false,
            opacity: 255,
        }
    }
}

#[derive(Debug)]
pub struct FrameStore {
    raw: [Arc<RawFrame>; FRAME_COUNT],
    scaled: Option<ScaledSet>,
}

impl FrameStore {
    /// Take ownership of exactly four raw frames
    pub fn load(frames: Vec<RawFrame>) -> EngineResult<Self> {
        let count = frames.len();
        let frames: [RawFrame; FRAME_COUNT] = frames.try_into().map_err(|_| {
            EngineError::invalid_asset(format!(
                "animation requires exactly {} frames, got: {}",
                FRAME_COUNT, count
            ))
        })?;
        for (index, frame) in frames.iter().enumerate() {
            frame.validate().map_err(|_| {
                EngineError::invalid_asset(format!(
                    "frame {} is {}x{} with {} bytes of pixel data",
                    index,
                    frame.width,
                    frame.height,
                    frame.pixels.len()
                ))
            })?;
        }
        Ok(Self {
            raw: frames.map(Arc::new),
            scaled: None,
        })
    }

    #[allow(dead_code)]
    pub fn raw_frame(&self, kind: FrameKind) -> &RawFrame {
        &self.raw[kind.index()]
    }

    /// Rescale all four frames to fit within (max_width, max_height).
    ///
    /// The fit size is computed once from frame 0 and applied to every frame,
    /// so the whole set always shares one size. The previous set is replaced
    /// in a single assignment.
    pub fn rescale(&mut self, max_width: u32, max_height: u32, options: ScaleOptions) {
        let base = &self.raw[0];
        let (width, height) =
            scaler::fit_dimensions(base.width, base.height, max_width, max_height);

        info!(
            "Scaling frames from {}x{} to {}x{} ({})",
            base.width,
            base.height,
            width,
            height,
            if options.antialias {
                "bilinear"
            } else {
                "nearest"
            }
        );

        let frames = FrameKind::ALL.map(|kind| {
            let raw = &self.raw[kind.index()];
            let scaled = if options.antialias {
                scaler::scale_bilinear(raw, width, height)
            } else {
                scaler::scale_nearest(raw, width, height)
            };
            let frame = finish_frame(raw, scaled, options);
            debug!("Scaled frame {:?}: {}x{}", kind, frame.width, frame.height);
            frame
        });

        self.scaled = Some(ScaledSet {
            width,
            height,
            frames,
        });
    }

    pub fn scaled_frame(&self, kind: FrameKind) -> EngineResult<&RawFrame> {
        self.scaled
            .as_ref()
            .map(|set| set.frames[kind.index()].as_ref())
            .ok_or(EngineError::FramesNotScaled)
    }

    /// Size shared by all scaled frames, if scaled
    pub fn scaled_size(&self) -> Option<(u32, u32)> {
        self.scaled.as_ref().map(|set| (set.width, set.height))
    }
}

/// Apply mirroring and opacity, reusing the raw frame when nothing changed
fn finish_frame(raw: &Arc<RawFrame>, scaled: Cow<'_, RawFrame>, options: ScaleOptions) -> Arc<RawFrame> {
    let needs_edit = options.mirror_horizontal || options.mirror_vertical || options.opacity < 255;
    match (scaled, needs_edit) {
        (Cow::Borrowed(_), false) => Arc::clone(raw),
        (scaled, _) => {
            let mut frame = scaled.into_owned();
            if options.mirror_horizontal || options.mirror_vertical {
                frame = scaler::mirror(&frame, options.mirror_horizontal, options.mirror_vertical);
            }
            if options.opacity < 255 {
                scaler::apply_opacity(&mut frame, options.opacity);
            }
            Arc::new(frame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(width: u32, height: u32) -> Vec<RawFrame> {
        (0..FRAME_COUNT as u8)
            .map(|i| RawFrame::filled(width, height, [i * 10, i * 20, i * 30, 255]))
            .collect()
    }

    #[test]
    fn load_rejects_wrong_frame_count() {
        for count in [0usize, 3, 5] {
            let frames = (0..count)
                .map(|_| RawFrame::filled(2, 2, [0, 0, 0, 255]))
                .collect();
            assert!(matches!(
                FrameStore::load(frames),
                Err(EngineError::InvalidAsset(_))
            ));
        }
    }

    #[test]
    fn raw_frame_rejects_bad_length() {
        assert!(RawFrame::new(2, 2, vec![0; 15]).is_err());
        assert!(RawFrame::new(0, 2, vec![]).is_err());
        assert!(RawFrame::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn load_rejects_empty_frame() {
        let mut set = frames(4, 4);
        set[2] = RawFrame::filled(0, 0, [0, 0, 0, 255]);
        let err = FrameStore::load(set).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAsset(_)));
        assert!(err.to_string().contains("frame 2"), "{err}");
    }

    #[test]
    fn load_rejects_short_pixel_buffer() {
        let mut set = frames(20, 16);
        set[1] = RawFrame {
            width: 20,
            height: 16,
            pixels: vec![0; 10],
        };
        let err = FrameStore::load(set).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAsset(_)));
        assert!(err.to_string().contains("frame 1"), "{err}");
    }

    #[test]
    fn scaled_frame_before_rescale_fails() {
        let store = FrameStore::load(frames(4, 4)).unwrap();
        assert_eq!(
            store.scaled_frame(FrameKind::Idle).unwrap_err(),
            EngineError::FramesNotScaled
        );
        assert_eq!(store.scaled_size(), None);
    }

    #[test]
    fn rescale_gives_all_frames_the_same_size() {
        let mut raw = frames(200, 160);
        // Frames may differ in base size; frame 0 drives the fit.
        raw[2] = RawFrame::filled(150, 150, [1, 2, 3, 255]);
        let mut store = FrameStore::load(raw).unwrap();
        store.rescale(300, 80, ScaleOptions::default());

        for kind in FrameKind::ALL {
            let frame = store.scaled_frame(kind).unwrap();
            assert_eq!((frame.width, frame.height), (100, 80), "{kind:?}");
        }
        assert_eq!(store.scaled_size(), Some((100, 80)));
    }

    #[test]
    fn rescale_nearest_matches_bilinear_dimensions() {
        let mut store = FrameStore::load(frames(200, 160)).unwrap();
        store.rescale(
            400,
            80,
            ScaleOptions {
                antialias: false,
                ..ScaleOptions::default()
            },
        );
        let frame = store.scaled_frame(FrameKind::Both).unwrap();
        assert_eq!((frame.width, frame.height), (100, 80));
        assert_eq!(frame.pixel(0, 0), [30, 60, 90, 255]);
    }

    #[test]
    fn rescale_to_native_size_shares_raw_frames() {
        let mut store = FrameStore::load(frames(20, 10)).unwrap();
        store.rescale(100, 10, ScaleOptions::default());
        let scaled = store.scaled_frame(FrameKind::Left).unwrap();
        assert!(std::ptr::eq(scaled, store.raw_frame(FrameKind::Left)));
    }

    #[test]
    fn rescale_applies_opacity() {
        let mut store = FrameStore::load(frames(20, 10)).unwrap();
        store.rescale(
            20,
            10,
            ScaleOptions {
                opacity: 0,
                ..ScaleOptions::default()
            },
        );
        let frame = store.scaled_frame(FrameKind::Idle).unwrap();
        assert!(frame.pixels.chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn frame_kind_indices_round_trip() {
        for (i, kind) in FrameKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(FrameKind::from_index(i), Some(*kind));
        }
        assert_eq!(FrameKind::from_index(4), None);
    }
}
