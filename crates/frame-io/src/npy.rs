//! Minimal NPY codec for 2-D little-endian f32 grids.
//!
//! Patches and frame grids are exchanged as NPY version 1.0 files so the
//! downstream training tooling can load them directly. Only the subset the
//! pipeline needs is implemented: C-order 2-D `<f4` arrays.

use std::fs;
use std::path::Path;

use crate::error::{FrameError, Result};

/// NPY magic string followed by the format version (1.0).
const MAGIC: &[u8; 8] = b"\x93NUMPY\x01\x00";

/// Encode a row-major f32 grid as an NPY v1.0 byte buffer.
///
/// `shape` is (rows, cols). The header is padded with spaces so the data
/// section starts at a 64-byte boundary, as the format requires.
pub fn encode(data: &[f32], shape: (usize, usize)) -> Vec<u8> {
    let (rows, cols) = shape;
    debug_assert_eq!(data.len(), rows * cols);

    let mut header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows, cols
    );
    // Magic (8) + header length field (2) + header must be a multiple of 64,
    // with the header terminated by a newline.
    let unpadded = MAGIC.len() + 2 + header.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 2 + header.len() + data.len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for &v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Decode an NPY v1.0 byte buffer into a row-major f32 grid.
///
/// Returns the values and the (rows, cols) shape.
pub fn decode(bytes: &[u8], path: &Path) -> Result<(Vec<f32>, (usize, usize))> {
    let err = |reason: &str| FrameError::Npy {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if bytes.len() < 10 || bytes[..6] != MAGIC[..6] {
        return Err(err("not an NPY file"));
    }
    if bytes[6] != 1 {
        return Err(err("unsupported NPY version"));
    }

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = 10 + header_len;
    if bytes.len() < data_start {
        return Err(err("truncated header"));
    }
    let header = std::str::from_utf8(&bytes[10..data_start])
        .map_err(|_| err("header is not valid UTF-8"))?;

    if !header.contains("'descr': '<f4'") {
        return Err(err("only little-endian f32 arrays are supported"));
    }
    if !header.contains("'fortran_order': False") {
        return Err(err("only C-order arrays are supported"));
    }

    let (rows, cols) = parse_shape(header).ok_or_else(|| err("malformed shape"))?;
    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| err("shape overflows"))?;

    let data = &bytes[data_start..];
    if data.len() != expected {
        return Err(err("data length does not match shape"));
    }

    let mut values = Vec::with_capacity(rows * cols);
    for chunk in data.chunks_exact(4) {
        values.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok((values, (rows, cols)))
}

/// Pull the 2-D shape tuple out of an NPY header dict.
fn parse_shape(header: &str) -> Option<(usize, usize)> {
    let start = header.find("'shape':")?;
    let rest = &header[start..];
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    let dims: Vec<&str> = rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if dims.len() != 2 {
        return None;
    }
    let rows = dims[0].parse().ok()?;
    let cols = dims[1].parse().ok()?;
    Some((rows, cols))
}

/// Write a row-major f32 grid to an NPY file.
pub fn write_file(path: &Path, data: &[f32], shape: (usize, usize)) -> Result<()> {
    fs::write(path, encode(data, shape))?;
    Ok(())
}

/// Read an NPY file into a row-major f32 grid and its (rows, cols) shape.
pub fn read_file(path: &Path) -> Result<(Vec<f32>, (usize, usize))> {
    let bytes = fs::read(path)?;
    decode(&bytes, path)
}
