//! Contact segmentation: link per-frame blobs across time into contacts.
//!
//! # Algorithm
//! 1. Extract blobs from every frame (parallel over frames).
//! 2. Build a linking graph whose nodes are (frame, blob) pairs. Two blobs
//!    in consecutive frames are linked iff their bounding boxes overlap —
//!    spatial overlap is the sole criterion, no motion prediction.
//! 3. Partition the graph into **connected components** using union-find.
//!    Each component is exactly one contact; blobs that merge on the plate
//!    end up in the same component and are never split apart here.
//! 4. Discard degenerate components (shorter than `min_frame_count`).
//! 5. Sort by first-appearance frame and assign ids in that order.
//!
//! Because edges only ever connect frame `t` to frame `t + 1`, the frame
//! set of a component is always a contiguous interval.

use crate::blob::{extract_blobs, Blob};
use crate::contact::Contact;
use crate::types::{BoundingBox, ContactId, Measurement};
use rayon::prelude::*;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Default physical area of one sensor cell in cm² (5.08 mm × 7.62 mm,
/// the entry-level plate this pipeline was built around).
pub const DEFAULT_SENSOR_SURFACE: f64 = 0.387;

/// Configuration for contact segmentation.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Samples must be strictly greater than this to count as contact.
    pub threshold: f64,
    /// Components spanning fewer frames than this are dropped.
    pub min_frame_count: usize,
    /// Physical area of one sensor cell in cm², handed to the metrics.
    pub sensor_surface: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            min_frame_count: 1,
            sensor_surface: DEFAULT_SENSOR_SURFACE,
        }
    }
}

// ---------------------------------------------------------------------------
// Union-Find (path halving + union by rank)
// ---------------------------------------------------------------------------

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Segments a measurement into contacts. Stateless between calls: every
/// `track` invocation produces a fresh, complete contact list.
pub struct ContactTracker {
    pub config: TrackerConfig,
}

impl ContactTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Segment the whole measurement. Never fails for a valid measurement;
    /// a recording with no above-threshold samples yields an empty vec.
    pub fn track(&self, measurement: &Measurement) -> Vec<Contact> {
        let frame_blobs: Vec<Vec<Blob>> = measurement
            .frames()
            .par_iter()
            .map(|frame| extract_blobs(frame, self.config.threshold))
            .collect();

        // Flatten (frame, blob) pairs into one node index space.
        let mut node_offset = Vec::with_capacity(frame_blobs.len());
        let mut n_nodes = 0;
        for blobs in &frame_blobs {
            node_offset.push(n_nodes);
            n_nodes += blobs.len();
        }

        let mut uf = UnionFind::new(n_nodes);
        for t in 1..frame_blobs.len() {
            for (i, prev) in frame_blobs[t - 1].iter().enumerate() {
                for (j, next) in frame_blobs[t].iter().enumerate() {
                    if prev.bounds.overlaps(&next.bounds) {
                        uf.union(node_offset[t - 1] + i, node_offset[t] + j);
                    }
                }
            }
        }

        // Group member blobs by component root.
        let mut components: HashMap<usize, Vec<(usize, &Blob)>> = HashMap::new();
        for (t, blobs) in frame_blobs.iter().enumerate() {
            for (i, blob) in blobs.iter().enumerate() {
                let root = uf.find(node_offset[t] + i);
                components.entry(root).or_default().push((t, blob));
            }
        }

        let mut contacts: Vec<Contact> = components
            .into_values()
            .filter_map(|members| self.build_contact(measurement, &members))
            .collect();

        // Order by first appearance; ids follow that order.
        contacts.sort_by_key(|c| (c.min_z(), c.bounds().min_row, c.bounds().min_col));
        let contacts: Vec<Contact> = contacts
            .into_iter()
            .enumerate()
            .map(|(index, c)| c.with_id(ContactId(index as u32)))
            .collect();

        tracing::debug!(
            contacts = contacts.len(),
            frames = measurement.frame_count(),
            "tracking complete"
        );
        contacts
    }

    /// Assemble one contact from its member blobs, or drop it as degenerate.
    fn build_contact(
        &self,
        measurement: &Measurement,
        members: &[(usize, &Blob)],
    ) -> Option<Contact> {
        let mut frames: Vec<usize> = members.iter().map(|(t, _)| *t).collect();
        frames.sort_unstable();
        frames.dedup();
        if frames.len() < self.config.min_frame_count {
            return None;
        }

        let mut bounds: Option<BoundingBox> = None;
        let mut total_pressure = 0.0;
        let mut weighted_row = 0.0;
        let mut weighted_col = 0.0;
        for (_, blob) in members {
            bounds = Some(match bounds {
                Some(b) => b.union(&blob.bounds),
                None => blob.bounds,
            });
            total_pressure += blob.total_pressure;
            weighted_row += blob.centroid.0 * blob.total_pressure;
            weighted_col += blob.centroid.1 * blob.total_pressure;
        }
        let bounds = bounds?;
        if total_pressure <= 0.0 {
            return None;
        }
        let centroid = (weighted_row / total_pressure, weighted_col / total_pressure);

        // Cut the raw slices: union bounding box × contiguous frame range.
        let data = frames
            .iter()
            .map(|&t| {
                measurement
                    .frame(t)
                    .view(
                        (bounds.min_row, bounds.min_col),
                        (bounds.height(), bounds.width()),
                    )
                    .into_owned()
            })
            .collect();

        // The id is provisional until the final sort.
        Some(Contact::new(
            ContactId(0),
            frames,
            bounds,
            centroid,
            data,
            self.config.sensor_surface,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;
    use nalgebra::DMatrix;

    /// Build a measurement from (frame, row, col, value) cells.
    fn measurement(
        rows: usize,
        cols: usize,
        n_frames: usize,
        cells: &[(usize, usize, usize, f64)],
    ) -> Measurement {
        let mut frames = vec![DMatrix::zeros(rows, cols); n_frames];
        for &(t, r, c, v) in cells {
            frames[t][(r, c)] = v;
        }
        Measurement::new(frames, 125.0, true).unwrap()
    }

    fn block(frame: usize, row: usize, col: usize, value: f64) -> Vec<(usize, usize, usize, f64)> {
        vec![
            (frame, row, col, value),
            (frame, row + 1, col, value),
            (frame, row, col + 1, value),
            (frame, row + 1, col + 1, value),
        ]
    }

    #[test]
    fn empty_measurement_yields_no_contacts() {
        let m = measurement(8, 8, 5, &[]);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);
        assert!(contacts.is_empty());
    }

    #[test]
    fn stationary_block_is_one_contact() {
        // A 2x2 block present in frames 0..=2 at the same location.
        let mut cells = Vec::new();
        for t in 0..3 {
            cells.extend(block(t, 1, 1, 2.0));
        }
        let m = measurement(5, 5, 3, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);

        assert_eq!(contacts.len(), 1);
        let c = &contacts[0];
        assert_eq!(c.length(), 3);
        assert_eq!(c.frames(), &[0, 1, 2]);
        assert_eq!(c.min_z(), 0);
        let b = c.bounds();
        assert_eq!((b.min_row, b.min_col, b.max_row, b.max_col), (1, 1, 2, 2));
        assert_eq!(c.label(), Label::Unlabeled);
    }

    #[test]
    fn contacts_sorted_by_first_appearance() {
        // Second footfall starts earlier in the frame order than its id
        // would suggest if insertion order leaked through.
        let mut cells = Vec::new();
        for t in 4..8 {
            cells.extend(block(t, 10, 2, 1.0));
        }
        for t in 0..3 {
            cells.extend(block(t, 2, 8, 1.0));
        }
        for t in 6..9 {
            cells.extend(block(t, 2, 14, 1.0));
        }
        let m = measurement(16, 20, 10, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);

        assert_eq!(contacts.len(), 3);
        let first_frames: Vec<usize> = contacts.iter().map(|c| c.min_z()).collect();
        assert_eq!(first_frames, vec![0, 4, 6]);
        let ids: Vec<u32> = contacts.iter().map(|c| c.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn drifting_blob_stays_one_contact() {
        // One cell per frame, moving one column per frame. Consecutive
        // bounding boxes never overlap, so this splits per frame unless the
        // blob is wide enough; use a 2-wide ridge so boxes overlap.
        let cells = vec![
            (0, 3, 2, 1.0),
            (0, 3, 3, 1.0),
            (1, 3, 3, 1.0),
            (1, 3, 4, 1.0),
            (2, 3, 4, 1.0),
            (2, 3, 5, 1.0),
        ];
        let m = measurement(8, 8, 3, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].frames(), &[0, 1, 2]);
        let b = contacts[0].bounds();
        assert_eq!((b.min_col, b.max_col), (2, 5));
    }

    #[test]
    fn union_bounding_box_is_tight() {
        let cells = vec![
            (0, 2, 2, 1.0),
            (1, 2, 2, 1.0),
            (1, 2, 3, 1.0),
            (2, 2, 3, 1.0),
            (2, 3, 3, 1.0),
        ];
        let m = measurement(6, 6, 3, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);
        assert_eq!(contacts.len(), 1);
        let b = contacts[0].bounds();
        assert_eq!((b.min_row, b.min_col, b.max_row, b.max_col), (2, 2, 3, 3));
    }

    #[test]
    fn merging_blobs_union_into_one_contact() {
        // Two separate blobs in frame 0 both overlap the bridging blob in
        // frame 1: the tracker must not split them.
        let cells = vec![
            (0, 2, 2, 1.0),
            (0, 2, 5, 1.0),
            (1, 2, 2, 1.0),
            (1, 2, 3, 1.0),
            (1, 2, 4, 1.0),
            (1, 2, 5, 1.0),
        ];
        let m = measurement(6, 8, 2, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);
        assert_eq!(contacts.len(), 1, "Merged blobs must stay one contact");
        assert_eq!(contacts[0].frames(), &[0, 1]);
    }

    #[test]
    fn min_frame_count_drops_short_components() {
        let mut cells = block(0, 1, 1, 1.0);
        for t in 2..6 {
            cells.extend(block(t, 6, 6, 1.0));
        }
        let m = measurement(10, 10, 6, &cells);
        let config = TrackerConfig {
            min_frame_count: 2,
            ..Default::default()
        };
        let contacts = ContactTracker::new(config).track(&m);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].min_z(), 2);
    }

    #[test]
    fn track_then_label_single_contact() {
        use crate::labeling::LabelingStateMachine;
        use crate::types::limbs;

        let mut cells = Vec::new();
        for t in 0..3 {
            cells.extend(block(t, 1, 1, 2.0));
        }
        let m = measurement(5, 5, 3, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);

        let mut machine = LabelingStateMachine::new();
        machine.load(contacts);
        machine.select_label(limbs::LEFT_FRONT);
        assert_eq!(
            machine.contacts()[0].label(),
            Label::Limb(limbs::LEFT_FRONT)
        );
        // Only one contact, so the cursor has nowhere to go.
        assert_eq!(machine.current_index(), Some(0));
    }

    #[test]
    fn data_slices_cover_bounding_box_for_every_frame() {
        let mut cells = Vec::new();
        for t in 0..3 {
            cells.extend(block(t, 1, 1, 2.0));
        }
        let m = measurement(5, 5, 3, &cells);
        let contacts = ContactTracker::new(TrackerConfig::default()).track(&m);
        let c = &contacts[0];
        assert_eq!(c.data().len(), 3);
        for slice in c.data() {
            assert_eq!(slice.nrows(), c.bounds().height());
            assert_eq!(slice.ncols(), c.bounds().width());
            assert!((slice.sum() - 8.0).abs() < 1e-12);
        }
    }
}
