//! Per-frame blob extraction: connected regions of above-threshold samples.
//!
//! A blob is a maximal 8-connected region of samples strictly greater than
//! the threshold. Diagonal adjacency counts so a footfall is not split in
//! two by a one-cell diagonal gap. Extraction is a pure function of the
//! frame; blobs only live until the tracker has linked them.

use crate::types::{BoundingBox, PressureFrame};

/// All 8 neighbour offsets (row, col).
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A single connected region within one frame.
#[derive(Clone, Debug)]
pub struct Blob {
    /// Member cells as (row, col) pairs, in discovery order.
    pub pixels: Vec<(usize, usize)>,
    /// Tight bounding box over the member cells.
    pub bounds: BoundingBox,
    /// Pressure-weighted centroid as (row, col).
    pub centroid: (f64, f64),
    /// Sum of all member samples.
    pub total_pressure: f64,
}

/// Extract every blob from one frame. Membership is strictly greater than
/// `threshold`; an all-zero frame yields an empty vec.
pub fn extract_blobs(frame: &PressureFrame, threshold: f64) -> Vec<Blob> {
    let rows = frame.nrows();
    let cols = frame.ncols();
    let mut visited = vec![false; rows * cols];
    let mut blobs = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            if visited[row * cols + col] || frame[(row, col)] <= threshold {
                continue;
            }
            blobs.push(grow_blob(frame, threshold, (row, col), &mut visited));
        }
    }

    blobs
}

/// Breadth-first flood fill from a seed cell, aggregating the blob
/// properties as cells are absorbed.
fn grow_blob(
    frame: &PressureFrame,
    threshold: f64,
    seed: (usize, usize),
    visited: &mut [bool],
) -> Blob {
    let rows = frame.nrows() as i32;
    let cols = frame.ncols() as i32;

    let mut pixels = Vec::new();
    let mut queue = vec![seed];
    visited[seed.0 * frame.ncols() + seed.1] = true;

    let mut bounds = BoundingBox::at(seed.0, seed.1);
    let mut total_pressure = 0.0;
    let mut weighted_row = 0.0;
    let mut weighted_col = 0.0;

    while let Some((row, col)) = queue.pop() {
        let value = frame[(row, col)];
        total_pressure += value;
        weighted_row += row as f64 * value;
        weighted_col += col as f64 * value;
        bounds.include(row, col);
        pixels.push((row, col));

        for (dr, dc) in NEIGHBOURS {
            let nr = row as i32 + dr;
            let nc = col as i32 + dc;
            if nr < 0 || nr >= rows || nc < 0 || nc >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            let idx = nr * frame.ncols() + nc;
            if !visited[idx] && frame[(nr, nc)] > threshold {
                visited[idx] = true;
                queue.push((nr, nc));
            }
        }
    }

    // total_pressure > 0 is guaranteed: every member is > threshold >= 0.
    Blob {
        pixels,
        bounds,
        centroid: (weighted_row / total_pressure, weighted_col / total_pressure),
        total_pressure,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
