//! Tests for error types

use std::path::PathBuf;
use trackset::Error;

#[test]
fn test_unrecognized_format_error() {
    let error = Error::UnrecognizedFormat {
        path: PathBuf::from("tracks.parquet"),
        hint: None,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Unrecognized descriptor format"));
    assert!(error_str.contains("tracks.parquet"));
    assert!(error_str.contains("xlsx"));
}

#[test]
fn test_unrecognized_format_error_with_hint() {
    let error = Error::UnrecognizedFormat {
        path: PathBuf::from("tracks.csv"),
        hint: Some("yaml".to_string()),
    };
    assert!(format!("{error}").contains("(format 'yaml')"));
}

#[test]
fn test_missing_required_columns_error() {
    let error = Error::MissingRequiredColumns {
        path: PathBuf::from("experiment.csv"),
        missing: vec!["_Day".to_string(), "_Arena".to_string()],
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("experiment.csv"));
    assert!(error_str.contains("_Day, _Arena"));
}

#[test]
fn test_empty_experiment_error() {
    let error = Error::EmptyExperiment { dropped: 4 };
    let error_str = format!("{error}");
    assert!(error_str.contains("Experiment is empty"));
    assert!(error_str.contains("all 4 tracks"));
}

#[test]
fn test_worker_failure_error() {
    let error = Error::WorkerFailure {
        track_id: "Track_7".to_string(),
        message: "disk read failed".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Track_7"));
    assert!(error_str.contains("disk read failed"));
}

#[test]
fn test_duplicate_track_id_error() {
    let error = Error::DuplicateTrackId("t1".to_string());
    assert!(format!("{error}").contains("'t1'"));
}

#[test]
fn test_arena_error() {
    let error = Error::Arena {
        reference: "pool.txt".to_string(),
        message: "missing arena.bounds".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("pool.txt"));
    assert!(error_str.contains("missing arena.bounds"));
}

#[test]
fn test_track_local_classification() {
    assert!(Error::TrackFileNotFound(PathBuf::from("a.csv")).is_track_local());
    assert!(Error::MalformedTrack("bad".to_string()).is_track_local());
    let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(Error::from(not_found).is_track_local());

    let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
    assert!(!Error::from(denied).is_track_local());
    assert!(!Error::Other("metric failed".to_string()).is_track_local());
    assert!(!Error::EmptyExperiment { dropped: 1 }.is_track_local());
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    let error_str = format!("{error}");
    assert_eq!(error_str, "custom error message");
}

#[test]
fn test_error_debug() {
    let error = Error::EmptyExperiment { dropped: 0 };
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("EmptyExperiment"));
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> trackset::Result<i32> {
        Err(Error::Other("test error".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
