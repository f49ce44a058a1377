// Frame compositing module
// Writes sprite frames into surface pixel buffers with clipping

use crate::error::{EngineError, EngineResult};
use crate::frame_store::RawFrame;

/// Fully transparent ARGB color
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Byte offset of the alpha channel within a pixel.
///
/// Surface buffers are `ARGB8888` little-endian, so pixels sit in memory as
/// B, G, R, A. Frames are converted to the same order when loaded.
const ALPHA: usize = 3;

fn check_buffer(buffer: &[u8], width: u32, height: u32) -> EngineResult<()> {
    let expected = width as usize * height as usize * 4;
    if buffer.len() != expected {
        return Err(EngineError::BufferSizeMismatch {
            expected,
            actual: buffer.len(),
        });
    }
    Ok(())
}

/// Visible part of a frame placed at (x, y): destination columns and rows,
/// plus the matching source origin
struct Clip {
    dst_x: usize,
    dst_y: usize,
    src_x: usize,
    src_y: usize,
    width: usize,
    height: usize,
}

fn clip(buf_width: u32, buf_height: u32, frame: &RawFrame, x: i32, y: i32) -> Option<Clip> {
    let x = x as i64;
    let y = y as i64;
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + frame.width as i64).min(buf_width as i64);
    let end_y = (y + frame.height as i64).min(buf_height as i64);

    if start_x >= end_x || start_y >= end_y {
        return None;
    }

    Some(Clip {
        dst_x: start_x as usize,
        dst_y: start_y as usize,
        src_x: (start_x - x) as usize,
        src_y: (start_y - y) as usize,
        width: (end_x - start_x) as usize,
        height: (end_y - start_y) as usize,
    })
}

/// Fill the whole buffer with an ARGB color (0xAARRGGBB)
pub fn clear(buffer: &mut [u8], width: u32, height: u32, argb: u32) -> EngineResult<()> {
    check_buffer(buffer, width, height)?;
    let pixel = argb.to_le_bytes();
    for px in buffer.chunks_exact_mut(4) {
        px.copy_from_slice(&pixel);
    }
    Ok(())
}

/// Copy the visible part of a frame into the buffer without blending.
/// Meant for buffers that were just cleared.
pub fn render_opaque(
    buffer: &mut [u8],
    buf_width: u32,
    buf_height: u32,
    frame: &RawFrame,
    x: i32,
    y: i32,
) -> EngineResult<()> {
    check_buffer(buffer, buf_width, buf_height)?;
    let Some(clip) = clip(buf_width, buf_height, frame, x, y) else {
        return Ok(());
    };

    let dst_stride = buf_width as usize * 4;
    let src_stride = frame.stride();
    let span = clip.width * 4;

    for row in 0..clip.height {
        let dst_start = (clip.dst_y + row) * dst_stride + clip.dst_x * 4;
        let src_start = (clip.src_y + row) * src_stride + clip.src_x * 4;
        buffer[dst_start..dst_start + span]
            .copy_from_slice(&frame.pixels[src_start..src_start + span]);
    }
    Ok(())
}

/// Source-over blend of the visible part of a frame onto existing content
#[allow(dead_code)]
pub fn render_alpha_blended(
    buffer: &mut [u8],
    buf_width: u32,
    buf_height: u32,
    frame: &RawFrame,
    x: i32,
    y: i32,
) -> EngineResult<()> {
    check_buffer(buffer, buf_width, buf_height)?;
    let Some(clip) = clip(buf_width, buf_height, frame, x, y) else {
        return Ok(());
    };

    let dst_stride = buf_width as usize * 4;
    let src_stride = frame.stride();
    let span = clip.width * 4;

    for row in 0..clip.height {
        let dst_start = (clip.dst_y + row) * dst_stride + clip.dst_x * 4;
        let src_start = (clip.src_y + row) * src_stride + clip.src_x * 4;
        let dst_row = &mut buffer[dst_start..dst_start + span];
        let src_row = &frame.pixels[src_start..src_start + span];

        for (dst, src) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            blend_pixel(dst, src);
        }
    }
    Ok(())
}

#[inline]
fn blend_pixel(dst: &mut [u8], src: &[u8]) {
    let src_alpha = src[ALPHA] as u32;
    match src_alpha {
        0 => {}
        255 => dst.copy_from_slice(src),
        _ => {
            let inv_alpha = 255 - src_alpha;
            for c in (0..4).filter(|&c| c != ALPHA) {
                let value = src[c] as u32 * src_alpha + dst[c] as u32 * inv_alpha;
                dst[c] = (value / 255) as u8;
            }
            dst[ALPHA] = dst[ALPHA].max(src[ALPHA]);
        }
    }
}
