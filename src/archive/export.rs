//! Archive export of an experiment

use super::{FACTOR_PREFIX, SCHEMA_TAG};
use crate::experiment::Experiment;
use crate::track::blob::format_blob;
use crate::track::Sample;
use crate::Result;
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render an experiment as an archive document.
///
/// Every track carries its identity, inline arena description, raw and
/// cleaned sample blobs and user factors, so the document re-ingests without
/// the original raw-data tree.
#[must_use]
pub fn export(experiment: &Experiment, export_note: &str) -> Value {
    let info = experiment.info().with_export_note(export_note);
    let header = json!({
        "author_note": info.author_note(),
        "processing_note": info.processing_note(),
        "export_note": info.export_note(),
        "summary_variables": experiment.summary_variables(),
    });

    let factor_columns = experiment.factors().factor_columns();
    let tracks: Vec<Value> = experiment
        .metrics()
        .values()
        .map(|track| {
            let row = experiment.factors().row(track.id());
            let cell = |column: &str| {
                row.and_then(|r| r.get(column))
                    .map_or(Value::Null, Value::from)
            };
            let arena = track.arena();
            let arena_name = row
                .and_then(|r| r.identity.arena.as_deref())
                .unwrap_or_else(|| arena.name());

            let mut object = Map::new();
            object.insert("id".to_string(), Value::from(track.id()));
            object.insert("target".to_string(), cell("_TargetID"));
            object.insert("day".to_string(), cell("_Day"));
            object.insert("trial".to_string(), cell("_Trial"));
            object.insert("arena_name".to_string(), Value::from(arena_name));
            object.insert(
                "arena".to_string(),
                arena
                    .to_description()
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<Map<_, _>>()
                    .into(),
            );
            insert_samples(&mut object, "raw.", track.path().raw());
            insert_samples(&mut object, "", track.path().cleaned());
            for column in factor_columns {
                object.insert(format!("{FACTOR_PREFIX}{column}"), cell(column));
            }
            Value::Object(object)
        })
        .collect();

    json!([SCHEMA_TAG, header, tracks])
}

fn insert_samples(object: &mut Map<String, Value>, prefix: &str, samples: &[Sample]) {
    let column = |f: fn(&Sample) -> f64| Value::from(format_blob(samples.iter().map(f)));
    object.insert(format!("{prefix}t"), column(|s| s.t));
    object.insert(format!("{prefix}x"), column(|s| s.x));
    object.insert(format!("{prefix}y"), column(|s| s.y));
}

/// Write an experiment's archive document to `path`.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) or [`Error::Json`](crate::Error::Json)
/// if the file cannot be written.
pub fn write(experiment: &Experiment, path: &Path, export_note: &str) -> Result<()> {
    let document = export(experiment, export_note);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), tracks = experiment.len(), "archive written");
    Ok(())
}
