//! Read an experiment descriptor and print a per-track summary.
//!
//! Usage:
//!
//! ```text
//! cargo run --example read_experiment -- <descriptor> [threads] [archive.json]
//! ```
//!
//! With `threads > 0` tracks run on a worker pool of that size. When an
//! archive path is given, the dataset is also exported there.
//! Set `RUST_LOG=debug` to see per-track logging.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use trackset::{archive, ExperimentReader};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let descriptor: PathBuf = args
        .next()
        .context("usage: read_experiment <descriptor> [threads] [archive.json]")?
        .into();
    let threads: usize = args
        .next()
        .map(|n| n.parse::<usize>())
        .transpose()
        .context("threads must be a number")?
        .unwrap_or(0);
    let export_to = args.next().map(PathBuf::from);

    let mut builder = ExperimentReader::builder()
        .author_note(format!("Read from {}", descriptor.display()))
        .verbose(true);
    if threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("failed to build worker pool")?;
        builder = builder.pool(Arc::new(pool));
    }

    let experiment = builder
        .build()
        .read(&descriptor)
        .with_context(|| format!("failed to read {}", descriptor.display()))?;

    println!("{}", experiment.info().processing_note());
    println!(
        "{} tracks ({} dropped), summary: {}",
        experiment.len(),
        experiment.dropped(),
        experiment.summary_variables().join(", ")
    );
    for (id, track) in experiment.metrics() {
        let factors = experiment.factors();
        println!(
            "  {id:<12} target={:<8} day={:<3} trial={:<3} path_length={:.1} latency={:.1}",
            factors.get(id, "_TargetID").unwrap_or("-"),
            factors.get(id, "_Day").unwrap_or("-"),
            factors.get(id, "_Trial").unwrap_or("-"),
            track.get("path_length").unwrap_or(f64::NAN),
            track.get("latency").unwrap_or(f64::NAN),
        );
    }

    if let Some(path) = export_to {
        archive::write(&experiment, &path, "Exported by read_experiment")
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("archive written to {}", path.display());
    }

    Ok(())
}
