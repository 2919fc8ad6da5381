//! Fundamental types used across the entire workspace.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Scalar type: use f64 throughout; plate samples are small non-negative
// values but every derived series is floating point.
// ---------------------------------------------------------------------------

/// One plate scan: a rows × columns grid of non-negative pressure samples.
pub type PressureFrame = DMatrix<f64>;

// ---------------------------------------------------------------------------
// Identifier types — newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ContactId(pub u32);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Legacy signed code for the active unlabeled contact.
pub const CODE_UNLABELED: i16 = -1;
/// Legacy signed code for a visited-but-unlabeled contact.
pub const CODE_SEEN: i16 = -2;
/// Legacy signed code for an operator-invalidated contact.
pub const CODE_INVALID: i16 = -3;

/// Limb indices for the quadruped labeling scheme.
pub mod limbs {
    pub const LEFT_FRONT: u8 = 0;
    pub const LEFT_HIND: u8 = 1;
    pub const RIGHT_FRONT: u8 = 2;
    pub const RIGHT_HIND: u8 = 3;
    pub const QUADRUPED_COUNT: u8 = 4;
}

/// Labeling state of a contact.
///
/// The persisted record format keeps the historical signed code space
/// (`0..N-1` for limbs, `-1`/`-2`/`-3` for the workflow states); in memory
/// the states are separate variants so limb indices and workflow sentinels
/// cannot be confused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// A concrete limb identity (index into the active labeling scheme).
    Limb(u8),
    /// Currently selected, not yet labeled. At most one contact per
    /// measurement holds this state; the state machine enforces it.
    Unlabeled,
    /// Previously visited, still unlabeled.
    Seen,
    /// Marked invalid by the operator. Excluded from metrics and from
    /// automatic navigation targets.
    Invalid,
}

impl Label {
    /// Signed code used by the record format.
    pub fn to_code(self) -> i16 {
        match self {
            Label::Limb(i) => i16::from(i),
            Label::Unlabeled => CODE_UNLABELED,
            Label::Seen => CODE_SEEN,
            Label::Invalid => CODE_INVALID,
        }
    }

    /// Decode a signed label code. `limb_count` bounds the identity range
    /// (4 for quadrupeds, 2 for bipeds).
    pub fn from_code(code: i16, limb_count: u8) -> Option<Label> {
        match code {
            CODE_UNLABELED => Some(Label::Unlabeled),
            CODE_SEEN => Some(Label::Seen),
            CODE_INVALID => Some(Label::Invalid),
            c if c >= 0 && c < i16::from(limb_count) => Some(Label::Limb(c as u8)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bounding box (inclusive, in sensor-cell coordinates)
// ---------------------------------------------------------------------------

/// Inclusive axis-aligned bounding box over sensor cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl BoundingBox {
    pub fn at(row: usize, col: usize) -> Self {
        Self {
            min_row: row,
            min_col: col,
            max_row: row,
            max_col: col,
        }
    }

    /// Grow the box to cover one more cell.
    pub fn include(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_row: self.min_row.min(other.min_row),
            min_col: self.min_col.min(other.min_col),
            max_row: self.max_row.max(other.max_row),
            max_col: self.max_col.max(other.max_col),
        }
    }

    /// True when the boxes share at least one cell. Bounds are inclusive,
    /// so touching boxes overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_row <= other.max_row
            && other.min_row <= self.max_row
            && self.min_col <= other.max_col
            && other.min_col <= self.max_col
    }

    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }

    /// Number of columns covered.
    pub fn width(&self) -> usize {
        self.max_col - self.min_col + 1
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// Validation failures for raw plate recordings. These are the only errors
/// that propagate out of the core; everything downstream of a valid
/// measurement is total.
#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("measurement contains no frames")]
    Empty,
    #[error("frames must have at least one row and column, got {rows}x{columns}")]
    ZeroSized { rows: usize, columns: usize },
    #[error("frame {frame} is {rows}x{columns}, expected {expected_rows}x{expected_columns}")]
    ShapeMismatch {
        frame: usize,
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },
    #[error("negative sample {value} at ({row}, {column}) in frame {frame}")]
    NegativeSample {
        frame: usize,
        row: usize,
        column: usize,
        value: f64,
    },
    #[error("non-finite sample at ({row}, {column}) in frame {frame}")]
    NonFiniteSample {
        frame: usize,
        row: usize,
        column: usize,
    },
    #[error("frequency must be positive and finite, got {0}")]
    BadFrequency(f64),
}

/// A full plate recording: an ordered sequence of frames plus the plate
/// metadata. Read-only once constructed; the tracker and the labeling
/// machine never mutate it.
#[derive(Clone, Debug)]
pub struct Measurement {
    frames: Vec<PressureFrame>,
    rows: usize,
    columns: usize,
    frequency: f64,
    maximum_value: f64,
    orientation: bool,
}

impl Measurement {
    /// Validate and take ownership of a raw recording.
    ///
    /// Fails fast on malformed input (empty, inconsistent shapes, negative
    /// or non-finite samples) so tracking never has to re-check.
    pub fn new(
        frames: Vec<PressureFrame>,
        frequency: f64,
        orientation: bool,
    ) -> Result<Self, MeasurementError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(MeasurementError::BadFrequency(frequency));
        }
        let first = frames.first().ok_or(MeasurementError::Empty)?;
        let (rows, columns) = (first.nrows(), first.ncols());
        if rows == 0 || columns == 0 {
            return Err(MeasurementError::ZeroSized { rows, columns });
        }

        let mut maximum_value = 0.0f64;
        for (t, frame) in frames.iter().enumerate() {
            if frame.nrows() != rows || frame.ncols() != columns {
                return Err(MeasurementError::ShapeMismatch {
                    frame: t,
                    rows: frame.nrows(),
                    columns: frame.ncols(),
                    expected_rows: rows,
                    expected_columns: columns,
                });
            }
            for row in 0..rows {
                for column in 0..columns {
                    let value = frame[(row, column)];
                    if !value.is_finite() {
                        return Err(MeasurementError::NonFiniteSample { frame: t, row, column });
                    }
                    if value < 0.0 {
                        return Err(MeasurementError::NegativeSample {
                            frame: t,
                            row,
                            column,
                            value,
                        });
                    }
                    maximum_value = maximum_value.max(value);
                }
            }
        }

        Ok(Self {
            frames,
            rows,
            columns,
            frequency,
            maximum_value,
            orientation,
        })
    }

    pub fn frames(&self) -> &[PressureFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> &PressureFrame {
        &self.frames[index]
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Scan rate of the plate in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Largest sample anywhere in the recording.
    pub fn maximum_value(&self) -> f64 {
        self.maximum_value
    }

    /// Walk direction flag carried through from the import layer.
    pub fn orientation(&self) -> bool {
        self.orientation
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn label_codes_round_trip() {
        for label in [
            Label::Limb(0),
            Label::Limb(3),
            Label::Unlabeled,
            Label::Seen,
            Label::Invalid,
        ] {
            assert_eq!(
                Label::from_code(label.to_code(), limbs::QUADRUPED_COUNT),
                Some(label)
            );
        }
    }

    #[test]
    fn label_code_out_of_range_rejected() {
        assert_eq!(Label::from_code(4, limbs::QUADRUPED_COUNT), None);
        assert_eq!(Label::from_code(-4, limbs::QUADRUPED_COUNT), None);
        // A biped scheme only has two identities.
        assert_eq!(Label::from_code(2, 2), None);
    }

    #[test]
    fn bounding_box_overlap_is_inclusive() {
        let a = BoundingBox {
            min_row: 0,
            min_col: 0,
            max_row: 2,
            max_col: 2,
        };
        let b = BoundingBox {
            min_row: 2,
            min_col: 2,
            max_row: 4,
            max_col: 4,
        };
        let c = BoundingBox {
            min_row: 3,
            min_col: 3,
            max_row: 4,
            max_col: 4,
        };
        assert!(a.overlaps(&b), "Shared corner cell counts as overlap");
        assert!(!a.overlaps(&c));
        let u = a.union(&c);
        assert_eq!((u.min_row, u.min_col, u.max_row, u.max_col), (0, 0, 4, 4));
    }

    #[test]
    fn measurement_rejects_shape_mismatch() {
        let frames = vec![DMatrix::zeros(4, 4), DMatrix::zeros(4, 5)];
        let err = Measurement::new(frames, 125.0, true).unwrap_err();
        assert!(matches!(err, MeasurementError::ShapeMismatch { frame: 1, .. }));
    }

    #[test]
    fn measurement_rejects_negative_sample() {
        let mut frame = DMatrix::zeros(3, 3);
        frame[(1, 2)] = -0.5;
        let err = Measurement::new(vec![frame], 125.0, true).unwrap_err();
        assert!(matches!(
            err,
            MeasurementError::NegativeSample { frame: 0, row: 1, column: 2, .. }
        ));
    }

    #[test]
    fn measurement_tracks_maximum_value() {
        let mut frame = DMatrix::zeros(3, 3);
        frame[(0, 0)] = 2.0;
        frame[(2, 2)] = 7.5;
        let m = Measurement::new(vec![frame], 125.0, true).unwrap();
        assert_eq!(m.maximum_value(), 7.5);
        assert_eq!(m.rows(), 3);
        assert_eq!(m.columns(), 3);
        assert_eq!(m.frame_count(), 1);
    }
}
