//! Contact: one footfall tracked across a contiguous span of frames.
//!
//! A contact owns its raw data slices (bounding box × frame range, cut from
//! the measurement by the tracker) and lazily caches the derived series
//! computed from them. The cache is dropped whenever the raw data is
//! replaced. Labels are only ever mutated by the labeling state machine.

use crate::metrics;
use crate::types::{BoundingBox, ContactId, Label, PressureFrame};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Derived series, computed on first access.
#[derive(Clone, Debug, Default)]
struct DerivedCache {
    force: Option<Vec<f64>>,
    surface: Option<Vec<f64>>,
    pressure: Option<Vec<f64>>,
    cop: Option<(Vec<f64>, Vec<f64>)>,
}

/// One tracked footfall.
#[derive(Clone, Debug)]
pub struct Contact {
    id: ContactId,
    /// Contiguous, ascending frame indices into the measurement.
    frames: Vec<usize>,
    /// Union of all per-frame blob bounding boxes.
    bounds: BoundingBox,
    /// Pressure-weighted centroid over the whole contact, (row, col).
    centroid: (f64, f64),
    label: Label,
    /// Physical area of one sensor cell in cm².
    sensor_surface: f64,
    /// Raw pressure slices: one bounds-sized matrix per frame in `frames`.
    data: Vec<PressureFrame>,
    cache: DerivedCache,
}

impl Contact {
    pub(crate) fn new(
        id: ContactId,
        frames: Vec<usize>,
        bounds: BoundingBox,
        centroid: (f64, f64),
        data: Vec<PressureFrame>,
        sensor_surface: f64,
    ) -> Self {
        debug_assert_eq!(frames.len(), data.len());
        Self {
            id,
            frames,
            bounds,
            centroid,
            label: Label::Unlabeled,
            sensor_surface,
            data,
            cache: DerivedCache::default(),
        }
    }

    /// Replace the provisional id once the final ordering is known.
    pub(crate) fn with_id(mut self, id: ContactId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    /// Number of frames the contact touches the plate.
    pub fn length(&self) -> usize {
        self.frames.len()
    }

    /// Offset of the first frame relative to the start of the measurement;
    /// places the contact on the shared timeline.
    pub fn min_z(&self) -> usize {
        self.frames[0]
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// True iff the operator marked this contact invalid.
    pub fn invalid(&self) -> bool {
        self.label == Label::Invalid
    }

    pub(crate) fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    pub fn sensor_surface(&self) -> f64 {
        self.sensor_surface
    }

    pub fn data(&self) -> &[PressureFrame] {
        &self.data
    }

    /// Replace the raw data slices, invalidating every cached series.
    pub fn set_data(&mut self, data: Vec<PressureFrame>) {
        self.data = data;
        self.cache = DerivedCache::default();
    }

    /// Total force per frame.
    pub fn force_over_time(&mut self) -> &[f64] {
        let data = &self.data;
        self.cache
            .force
            .get_or_insert_with(|| metrics::force_over_time(data))
    }

    /// Contact surface per frame in cm².
    pub fn surface_over_time(&mut self) -> &[f64] {
        let data = &self.data;
        let sensor_surface = self.sensor_surface;
        self.cache
            .surface
            .get_or_insert_with(|| metrics::surface_over_time(data, sensor_surface))
    }

    /// Mean pressure per frame; zero-surface frames yield 0.
    pub fn pressure_over_time(&mut self) -> &[f64] {
        let data = &self.data;
        let sensor_surface = self.sensor_surface;
        self.cache
            .pressure
            .get_or_insert_with(|| metrics::pressure_over_time(data, sensor_surface))
    }

    /// Center of pressure per frame as (cop_x, cop_y) series, in local
    /// bounding-box coordinates.
    pub fn center_of_pressure(&mut self) -> (&[f64], &[f64]) {
        let data = &self.data;
        let cop = self
            .cache
            .cop
            .get_or_insert_with(|| metrics::center_of_pressure(data));
        (&cop.0, &cop.1)
    }

    /// Snapshot this contact into its persisted form.
    pub fn to_record(&self) -> ContactRecord {
        ContactRecord {
            contact_id: self.id.0,
            frames: self.frames.clone(),
            min_z: self.min_z(),
            total_min_row: self.bounds.min_row,
            total_min_col: self.bounds.min_col,
            total_max_row: self.bounds.max_row,
            total_max_col: self.bounds.max_col,
            centroid_row: self.centroid.0,
            centroid_col: self.centroid.1,
            contact_label: self.label.to_code(),
            sensor_surface: self.sensor_surface,
            data: self
                .data
                .iter()
                .map(|frame| frame.transpose().as_slice().to_vec())
                .collect(),
        }
    }

    /// Rehydrate a contact from its persisted form, validating every field.
    ///
    /// `limb_count` bounds the identity label range of the active scheme.
    pub fn restore(record: ContactRecord, limb_count: u8) -> Result<Contact, RestoreError> {
        if record.frames.is_empty() {
            return Err(RestoreError::EmptyFrames);
        }
        for pair in record.frames.windows(2) {
            if pair[1] != pair[0] + 1 {
                return Err(RestoreError::NonContiguousFrames {
                    after: pair[0],
                    found: pair[1],
                });
            }
        }
        if record.min_z != record.frames[0] {
            return Err(RestoreError::MinZMismatch {
                min_z: record.min_z,
                first_frame: record.frames[0],
            });
        }
        if record.total_max_row < record.total_min_row
            || record.total_max_col < record.total_min_col
        {
            return Err(RestoreError::InvertedBounds);
        }
        let label = Label::from_code(record.contact_label, limb_count)
            .ok_or(RestoreError::BadLabelCode(record.contact_label))?;
        if !(record.sensor_surface.is_finite() && record.sensor_surface > 0.0) {
            return Err(RestoreError::BadSensorSurface(record.sensor_surface));
        }
        if record.data.len() != record.frames.len() {
            return Err(RestoreError::DataLength {
                expected: record.frames.len(),
                found: record.data.len(),
            });
        }

        let bounds = BoundingBox {
            min_row: record.total_min_row,
            min_col: record.total_min_col,
            max_row: record.total_max_row,
            max_col: record.total_max_col,
        };
        let rows = bounds.height();
        let cols = bounds.width();

        let mut data = Vec::with_capacity(record.data.len());
        for (offset, samples) in record.data.iter().enumerate() {
            if samples.len() != rows * cols {
                return Err(RestoreError::FrameShape {
                    offset,
                    expected: rows * cols,
                    found: samples.len(),
                });
            }
            if samples.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(RestoreError::BadSample { offset });
            }
            data.push(DMatrix::from_row_slice(rows, cols, samples));
        }

        Ok(Contact {
            id: ContactId(record.contact_id),
            frames: record.frames,
            bounds,
            centroid: (record.centroid_row, record.centroid_col),
            label,
            sensor_surface: record.sensor_surface,
            data,
            cache: DerivedCache::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Persisted form
// ---------------------------------------------------------------------------

/// The serialized shape of a contact, as handed to the external store.
/// Raw frame slices are row-major, one flat vec per frame, sized by the
/// total bounding box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactRecord {
    pub contact_id: u32,
    pub frames: Vec<usize>,
    pub min_z: usize,
    pub total_min_row: usize,
    pub total_min_col: usize,
    pub total_max_row: usize,
    pub total_max_col: usize,
    pub centroid_row: f64,
    pub centroid_col: f64,
    /// Legacy signed label code (`0..N-1`, `-1`, `-2`, `-3`).
    pub contact_label: i16,
    pub sensor_surface: f64,
    pub data: Vec<Vec<f64>>,
}

/// Field-level validation failures when restoring a [`ContactRecord`].
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("record has no frames")]
    EmptyFrames,
    #[error("frame indices must be contiguous: {found} follows {after}")]
    NonContiguousFrames { after: usize, found: usize },
    #[error("min_z {min_z} does not match first frame {first_frame}")]
    MinZMismatch { min_z: usize, first_frame: usize },
    #[error("bounding box maxima precede minima")]
    InvertedBounds,
    #[error("unknown label code {0}")]
    BadLabelCode(i16),
    #[error("sensor surface must be positive and finite, got {0}")]
    BadSensorSurface(f64),
    #[error("expected {expected} data frames, found {found}")]
    DataLength { expected: usize, found: usize },
    #[error("data frame {offset} has {found} samples, expected {expected}")]
    FrameShape {
        offset: usize,
        expected: usize,
        found: usize,
    },
    #[error("data frame {offset} contains a negative or non-finite sample")]
    BadSample { offset: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
