//! Selection preview rendering.
//!
//! Renders the analyzed grid as a grayscale PNG with the selected patch
//! windows outlined, so a human can eyeball the selection before a long
//! cropping run. Encoding is done in-tree: an 8-bit grayscale PNG is a
//! signature and three chunks.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use storm_common::{CellCoord, ReflectivityGrid};

/// Reflectivity range mapped onto the grayscale ramp.
const DBZ_MIN: f32 = 0.0;
const DBZ_MAX: f32 = 70.0;

/// Longest allowed preview edge; larger grids are subsampled.
const MAX_EDGE: usize = 1024;

/// Render the grid with patch windows outlined and write it as a PNG.
pub fn write_selection_preview(
    grid: &ReflectivityGrid,
    centers: &[CellCoord],
    patch_size: usize,
    path: &Path,
) -> Result<()> {
    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 {
        anyhow::bail!("cannot render an empty grid");
    }

    // Nearest-neighbor subsample so the preview stays a reasonable size.
    let stride = ((rows.max(cols) + MAX_EDGE - 1) / MAX_EDGE).max(1);
    let out_h = (rows + stride - 1) / stride;
    let out_w = (cols + stride - 1) / stride;

    let mut pixels = vec![0u8; out_w * out_h];
    for y in 0..out_h {
        for x in 0..out_w {
            let v = grid.get(y * stride, x * stride).unwrap_or(f32::NAN);
            pixels[y * out_w + x] = gray_for(v);
        }
    }

    let half = patch_size / 2;
    for center in centers {
        draw_window_outline(&mut pixels, out_w, out_h, *center, half, stride);
    }

    let png = encode_grayscale_png(&pixels, out_w, out_h)?;
    std::fs::write(path, png)?;
    Ok(())
}

/// Map a reflectivity value onto 0..=255. NaN renders black.
fn gray_for(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(DBZ_MIN, DBZ_MAX);
    ((clamped - DBZ_MIN) / (DBZ_MAX - DBZ_MIN) * 255.0) as u8
}

/// Outline one patch window in white, clamped to the image.
fn draw_window_outline(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    center: CellCoord,
    half: usize,
    stride: usize,
) {
    let top = center.row.saturating_sub(half) / stride;
    let left = center.col.saturating_sub(half) / stride;
    let bottom = ((center.row + half) / stride).min(height.saturating_sub(1));
    let right = ((center.col + half) / stride).min(width.saturating_sub(1));

    for x in left..=right {
        pixels[top * width + x] = 255;
        pixels[bottom * width + x] = 255;
    }
    for y in top..=bottom {
        pixels[y * width + left] = 255;
        pixels[y * width + right] = 255;
    }
}

/// Encode 8-bit grayscale pixels as a PNG byte buffer.
fn encode_grayscale_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    // Each scanline carries a leading filter byte; filter 0 = none.
    let mut raw = Vec::with_capacity((width + 1) * height);
    for row in pixels.chunks(width) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let idat = encoder.finish()?;

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth 8, color type 0 (grayscale), default compression/filter,
    // no interlace
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let mut png = Vec::new();
    png.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    write_chunk(&mut png, b"IHDR", &ihdr);
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Append one PNG chunk: length, type, data, CRC over type+data.
fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}
