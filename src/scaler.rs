// Image scaling module
// Pure resampling helpers for sprite frames

use crate::frame_store::RawFrame;
use std::borrow::Cow;

/// Largest size that fits within (max_width, max_height) while keeping the
/// source aspect ratio
pub fn fit_dimensions(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (max_width.max(1), max_height.max(1));
    }

    let scale_x = max_width as f64 / src_width as f64;
    let scale_y = max_height as f64 / src_height as f64;
    let scale = scale_x.min(scale_y);

    let width = (src_width as f64 * scale).round() as u32;
    let height = (src_height as f64 * scale).round() as u32;

    (width.clamp(1, max_width.max(1)), height.clamp(1, max_height.max(1)))
}

/// Nearest-neighbour resampling
pub fn scale_nearest(src: &RawFrame, width: u32, height: u32) -> Cow<'_, RawFrame> {
    if src.width == width && src.height == height {
        return Cow::Borrowed(src);
    }

    let mut pixels = vec![0u8; width as usize * height as usize * 4];

    // Integer division gives floor(x * src_w / w) exactly
    let x_lut: Vec<usize> = (0..width as u64)
        .map(|x| (x * src.width as u64 / width as u64) as usize)
        .collect();

    for (y, row) in pixels.chunks_exact_mut(width as usize * 4).enumerate() {
        let src_y = (y as u64 * src.height as u64 / height as u64) as usize;
        let src_row = &src.pixels[src_y * src.stride()..(src_y + 1) * src.stride()];

        for (dst, &src_x) in row.chunks_exact_mut(4).zip(&x_lut) {
            dst.copy_from_slice(&src_row[src_x * 4..src_x * 4 + 4]);
        }
    }

    Cow::Owned(RawFrame {
        width,
        height,
        pixels,
    })
}

/// Bilinear resampling; each channel is interpolated independently
pub fn scale_bilinear(src: &RawFrame, width: u32, height: u32) -> Cow<'_, RawFrame> {
    if src.width == width && src.height == height {
        return Cow::Borrowed(src);
    }

    let mut pixels = vec![0u8; width as usize * height as usize * 4];

    let x_ratio = src.width as f64 / width as f64;
    let y_ratio = src.height as f64 / height as f64;
    let max_x = src.width - 1;
    let max_y = src.height - 1;

    for y in 0..height {
        let src_y = y as f64 * y_ratio;
        let y0 = (src_y.floor() as u32).min(max_y);
        let y1 = (y0 + 1).min(max_y);
        let fy = src_y - y0 as f64;

        for x in 0..width {
            let src_x = x as f64 * x_ratio;
            let x0 = (src_x.floor() as u32).min(max_x);
            let x1 = (x0 + 1).min(max_x);
            let fx = src_x - x0 as f64;

            let p00 = src.pixel(x0, y0);
            let p10 = src.pixel(x1, y0);
            let p01 = src.pixel(x0, y1);
            let p11 = src.pixel(x1, y1);

            let dst_idx = (y as usize * width as usize + x as usize) * 4;
            for c in 0..4 {
                let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
                let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
                let value = top * (1.0 - fy) + bottom * fy;
                pixels[dst_idx + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Cow::Owned(RawFrame {
        width,
        height,
        pixels,
    })
}

/// Flip a frame horizontally and/or vertically
pub fn mirror(src: &RawFrame, horizontal: bool, vertical: bool) -> RawFrame {
    let stride = src.stride();
    let mut pixels = Vec::with_capacity(src.pixels.len());

    for y in 0..src.height as usize {
        let src_y = if vertical {
            src.height as usize - 1 - y
        } else {
            y
        };
        let row = &src.pixels[src_y * stride..(src_y + 1) * stride];
        if horizontal {
            for px in row.chunks_exact(4).rev() {
                pixels.extend_from_slice(px);
            }
        } else {
            pixels.extend_from_slice(row);
        }
    }

    RawFrame {
        width: src.width,
        height: src.height,
        pixels,
    }
}

/// Multiply every alpha byte by opacity / 255
pub fn apply_opacity(frame: &mut RawFrame, opacity: u8) {
    let opacity = opacity as u32;
    for px in frame.pixels.chunks_exact_mut(4) {
        px[3] = ((px[3] as u32 * opacity + 127) / 255) as u8;
    }
}
