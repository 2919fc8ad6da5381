//! `contact_core` — Contact segmentation, tracking and labeling for
//! pressure-plate gait measurements.
//!
//! # Module layout
//! - [`types`]    — Fundamental types (measurement, frames, labels, IDs)
//! - [`blob`]     — Per-frame 8-connected blob extraction
//! - [`tracker`]  — Temporal linking of blobs into contacts (union-find)
//! - [`contact`]  — Contact entity, cached derived series, record restore
//! - [`labeling`] — Cursor + label transition state machine
//! - [`metrics`]  — Force / surface / pressure / COP series, interpolation

pub mod blob;
pub mod contact;
pub mod labeling;
pub mod metrics;
pub mod tracker;
pub mod types;

pub use contact::{Contact, ContactRecord, RestoreError};
pub use labeling::LabelingStateMachine;
pub use tracker::{ContactTracker, TrackerConfig};
pub use types::{
    BoundingBox, ContactId, Label, Measurement, MeasurementError, PressureFrame,
};
