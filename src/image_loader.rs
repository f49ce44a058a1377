// Image loading module
// Loads the animation frames from disk and converts them to surface byte order

use crate::frame_store::{RawFrame, FRAME_COUNT};
use anyhow::{Context, Result};
use image::DynamicImage;
use log::{debug, info, warn};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Frame files are named `frame0.png` .. `frame3.png`
const FRAME_PREFIX: &str = "frame";
const FRAME_EXTENSION: &str = "png";

/// Placeholder colors, one per frame (ARGB): blue, green, orange, red
const PLACEHOLDER_COLORS: [u32; FRAME_COUNT] = [0xFF34_98DB, 0xFF2E_CC71, 0xFFF3_9C12, 0xFFE7_4C3C];

/// Load the four animation frames from `dir`
pub fn load_frames(dir: &Path) -> Result<Vec<RawFrame>> {
    let mut frames = Vec::with_capacity(FRAME_COUNT);
    for index in 0..FRAME_COUNT {
        let path = dir.join(format!("{}{}.{}", FRAME_PREFIX, index, FRAME_EXTENSION));
        let frame = load_frame(&path)?;
        debug!(
            "Loaded frame {}: {} ({}x{})",
            index,
            path.display(),
            frame.width,
            frame.height
        );
        frames.push(frame);
    }

    warn_on_mismatched_sizes(&frames);
    info!("Loaded {} animation frames from {}", FRAME_COUNT, dir.display());
    Ok(frames)
}

/// Load a single frame file
pub fn load_frame(path: &Path) -> Result<RawFrame> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read frame file: {}", path.display()))?;
    let img = load_from_bytes(&data)
        .with_context(|| format!("Failed to load frame: {}", path.display()))?;
    to_bgra_frame(img)
}

/// Load an image from raw bytes, auto-detecting the format
fn load_from_bytes(data: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(data).context("Failed to detect image format")?;

    let cursor = Cursor::new(data);
    let img = image::load(cursor, format).context("Failed to decode image")?;

    Ok(img)
}

fn to_bgra_frame(img: DynamicImage) -> Result<RawFrame> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    // Wayland expects ARGB8888, which is B, G, R, A in memory
    let mut bgra_data = rgba.into_raw();
    for pixel in bgra_data.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }

    Ok(RawFrame::new(width, height, bgra_data)?)
}

/// Frames are scaled to the size fitted from frame 0, so differing sizes
/// distort the others
fn warn_on_mismatched_sizes(frames: &[RawFrame]) {
    let Some(first) = frames.first() else {
        return;
    };
    for (index, frame) in frames.iter().enumerate().skip(1) {
        if (frame.width, frame.height) != (first.width, first.height) {
            warn!(
                "Frame {} has different dimensions: {}x{} (expected {}x{})",
                index, frame.width, frame.height, first.width, first.height
            );
        }
    }
}

/// Solid-colored stand-in frames for running without assets
pub fn placeholder_frames(width: u32, height: u32) -> Vec<RawFrame> {
    let frames: Vec<RawFrame> = PLACEHOLDER_COLORS
        .iter()
        .map(|&argb| RawFrame::filled(width, height, argb.to_le_bytes()))
        .collect();
    info!("Created {} placeholder frames ({}x{})", frames.len(), width, height);
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bongocat_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn placeholders_are_bgra_ordered() {
        let frames = placeholder_frames(4, 2);
        assert_eq!(frames.len(), FRAME_COUNT);
        // 0xFF3498DB: R=0x34 G=0x98 B=0xDB
        assert_eq!(frames[0].pixel(3, 1), [0xDB, 0x98, 0x34, 0xFF]);
        assert_eq!(frames[3].pixel(0, 0), [0x3C, 0x4C, 0xE7, 0xFF]);
    }

    #[test]
    fn loads_frames_and_swaps_red_and_blue() {
        let dir = temp_dir("frames");
        for i in 0..FRAME_COUNT {
            write_png(&dir.join(format!("frame{}.png", i)), 3, 2, [10, 20, 30 + i as u8, 128]);
        }

        let frames = load_frames(&dir).unwrap();
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(frames.len(), FRAME_COUNT);
        assert_eq!((frames[2].width, frames[2].height), (3, 2));
        assert_eq!(frames[2].pixel(1, 1), [32, 20, 10, 128]);
    }

    #[test]
    fn missing_frame_is_an_error() {
        let dir = temp_dir("missing");
        write_png(&dir.join("frame0.png"), 2, 2, [0, 0, 0, 255]);

        let err = load_frames(&dir).unwrap_err();
        let _ = fs::remove_dir_all(&dir);
        assert!(format!("{:#}", err).contains("frame1.png"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(load_from_bytes(b"not an image").is_err());
    }
}
