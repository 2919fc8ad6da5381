//! `platetrack` CLI: batch contact tracking and per-contact reports.
//!
//! The binary is the session controller for the core: it owns the
//! measurement, runs the tracker, and hands finalized contact records to
//! whatever store sits downstream. The interactive labeling surface lives
//! elsewhere; here labels only pass through from stored records.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contact_core::contact::{Contact, ContactRecord};
use contact_core::metrics;
use contact_core::tracker::{ContactTracker, TrackerConfig, DEFAULT_SENSOR_SURFACE};
use contact_core::types::{limbs, Label, Measurement, PressureFrame};
use nalgebra::DMatrix;
use serde::Deserialize;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "platetrack", about = "Pressure-plate contact tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a measurement into contacts and print a summary.
    Track {
        /// Path to a measurement JSON file
        input: PathBuf,
        /// Blob membership threshold (samples must exceed this)
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
        /// Drop contacts spanning fewer frames than this
        #[arg(long, default_value_t = 1)]
        min_frames: usize,
        /// Sensor cell area in cm²
        #[arg(long, default_value_t = DEFAULT_SENSOR_SURFACE)]
        sensor_surface: f64,
        /// Write the resulting contact records to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report per-contact metrics from previously stored contact records.
    Report {
        /// Path to a contact records JSON file
        input: PathBuf,
        /// Number of limb identities in the labeling scheme
        #[arg(long, default_value_t = limbs::QUADRUPED_COUNT)]
        limbs: u8,
        /// Plate scan rate in Hz, for durations in seconds
        #[arg(long)]
        frequency: Option<f64>,
        /// Resample force curves onto this many points
        #[arg(long, default_value_t = 100)]
        normalize_length: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Track {
            input,
            threshold,
            min_frames,
            sensor_surface,
            output,
        } => run_track(&input, threshold, min_frames, sensor_surface, output.as_deref()),
        Commands::Report {
            input,
            limbs,
            frequency,
            normalize_length,
        } => run_report(&input, limbs, frequency, normalize_length),
    }
}

// ---------------------------------------------------------------------------
// Measurement loading
// ---------------------------------------------------------------------------

/// On-disk measurement shape: frames as nested row-major arrays.
#[derive(Deserialize)]
struct MeasurementFile {
    frequency: f64,
    #[serde(default = "default_orientation")]
    orientation: bool,
    frames: Vec<Vec<Vec<f64>>>,
}

fn default_orientation() -> bool {
    true
}

fn load_measurement(path: &Path) -> Result<Measurement> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening measurement file {}", path.display()))?;
    let raw: MeasurementFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing measurement file {}", path.display()))?;

    let mut frames: Vec<PressureFrame> = Vec::with_capacity(raw.frames.len());
    for grid in &raw.frames {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        anyhow::ensure!(
            grid.iter().all(|row| row.len() == cols),
            "ragged frame in {}",
            path.display()
        );
        frames.push(DMatrix::from_row_iterator(
            rows,
            cols,
            grid.iter().flatten().copied(),
        ));
    }

    Measurement::new(frames, raw.frequency, raw.orientation)
        .with_context(|| format!("validating measurement {}", path.display()))
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

fn run_track(
    input: &Path,
    threshold: f64,
    min_frames: usize,
    sensor_surface: f64,
    output: Option<&Path>,
) -> Result<()> {
    let measurement = load_measurement(input)?;
    tracing::info!(
        rows = measurement.rows(),
        columns = measurement.columns(),
        frames = measurement.frame_count(),
        frequency = measurement.frequency(),
        "measurement loaded"
    );

    let tracker = ContactTracker::new(TrackerConfig {
        threshold,
        min_frame_count: min_frames,
        sensor_surface,
    });
    let contacts = tracker.track(&measurement);

    println!("{} contacts found", contacts.len());
    println!(
        "{:<5} {:>11} {:>7} {:>18} {:>9} {:>11}",
        "id", "frames", "length", "bounding box", "surface", "peak force"
    );
    for contact in &contacts {
        let b = contact.bounds();
        // Crude surface estimate: bounding box area in cells.
        let crude_surface = b.width() * b.height();
        println!(
            "{:<5} {:>5}..={:<4} {:>7} ({:>3},{:>3})-({:>3},{:>3}) {:>9} {:>11.2}",
            contact.id().to_string(),
            contact.min_z(),
            contact.frames()[contact.length() - 1],
            contact.length(),
            b.min_row,
            b.min_col,
            b.max_row,
            b.max_col,
            crude_surface,
            metrics::peak_force(contact.data()),
        );
    }

    if let Some(path) = output {
        let records: Vec<ContactRecord> = contacts.iter().map(Contact::to_record).collect();
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &records)?;
        tracing::info!(records = records.len(), path = %path.display(), "records written");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

fn label_name(label: Label) -> String {
    match label {
        Label::Limb(limbs::LEFT_FRONT) => "left front".into(),
        Label::Limb(limbs::LEFT_HIND) => "left hind".into(),
        Label::Limb(limbs::RIGHT_FRONT) => "right front".into(),
        Label::Limb(limbs::RIGHT_HIND) => "right hind".into(),
        Label::Limb(other) => format!("limb {other}"),
        Label::Unlabeled => "unlabeled".into(),
        Label::Seen => "skipped".into(),
        Label::Invalid => "invalid".into(),
    }
}

fn run_report(
    input: &Path,
    limb_count: u8,
    frequency: Option<f64>,
    normalize_length: usize,
) -> Result<()> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("opening records file {}", input.display()))?;
    let records: Vec<ContactRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing records file {}", input.display()))?;

    let mut contacts = Vec::with_capacity(records.len());
    for record in records {
        let id = record.contact_id;
        let contact = Contact::restore(record, limb_count)
            .with_context(|| format!("restoring contact {id}"))?;
        contacts.push(contact);
    }

    let invalid = contacts.iter().filter(|c| c.invalid()).count();
    if invalid > 0 {
        tracing::info!(invalid, "invalid contacts excluded from the report");
    }

    println!(
        "{:<5} {:<12} {:>7} {:>10} {:>11} {:>13} {:>13}",
        "id", "label", "length", "duration", "peak force", "peak surface", "time to peak"
    );
    for contact in contacts.iter_mut().filter(|c| !c.invalid()) {
        let length = contact.length();
        let duration = match frequency {
            Some(hz) => format!("{:.3}s", length as f64 / hz),
            None => format!("{length}fr"),
        };
        let peak_surface = contact
            .surface_over_time()
            .iter()
            .fold(0.0f64, |a, &b| a.max(b));
        let force = contact.force_over_time().to_vec();
        let normalized = metrics::interpolate_time_series(&force, normalize_length);
        // Position of the force peak as a percentage of stance.
        let peak_at = normalized
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        let peak_pct = if normalize_length > 1 {
            100.0 * peak_at as f64 / (normalize_length - 1) as f64
        } else {
            0.0
        };

        println!(
            "{:<5} {:<12} {:>7} {:>10} {:>11.2} {:>12.2}cm² {:>12.0}%",
            contact.id().to_string(),
            label_name(contact.label()),
            length,
            duration,
            metrics::peak_force(contact.data()),
            peak_surface,
            peak_pct,
        );
    }

    Ok(())
}
