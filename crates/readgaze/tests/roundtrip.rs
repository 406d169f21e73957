mod common;

use common::{three_lines, Context};
use readgaze::export::{self, CSV_HEADER};
use readgaze::{process_batch, GazeError, PipelineConfig};
use std::fs;

#[test]
fn test_export_then_reprocess_is_stable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first_path = dir.path().join("session.csv");
    let second_path = dir.path().join("reprocessed.csv");
    let config = PipelineConfig::default();

    let (samples, detection) = process_batch(&three_lines(Context::Revealed), &config);
    export::export_csv(&first_path, &samples).expect("export");

    let frames = export::read_csv(&first_path).expect("read back");
    assert_eq!(frames.len(), samples.len());
    assert_eq!(frames[0].timestamp, 0.0);
    assert_eq!(frames[100].line_index, samples[100].line_index);

    let (again, detection_again) = process_batch(&frames, &config);
    export::export_csv(&second_path, &again).expect("export again");

    assert_eq!(detection_again.sweeps.len(), detection.sweeps.len());
    let first = fs::read_to_string(&first_path).expect("read");
    let second = fs::read_to_string(&second_path).expect("read");
    assert_eq!(first, second);
}

#[test]
fn test_exported_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.csv");
    let (samples, _) = process_batch(&three_lines(Context::Revealed), &PipelineConfig::default());
    export::export_csv(&path, &samples).expect("export");

    let text = fs::read_to_string(&path).expect("read");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER.join(",").as_str()));

    let rows: Vec<Vec<&str>> = lines.map(|l| l.split(',').collect()).collect();
    assert_eq!(rows.len(), samples.len());
    assert!(rows.iter().all(|r| r.len() == 13));
    assert!(rows.iter().any(|r| r[8] == "TRUE"));
    assert_eq!(rows.iter().filter(|r| r[12] == "MAX").count(), 2);
    assert_eq!(rows.iter().filter(|r| r[12] == "MIN").count(), 2);
    assert_eq!(rows[0][11], "0");
    assert_eq!(rows[250][11], "2");
}

#[test]
fn test_tab_separated_recording() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recording.tsv");
    let mut text = String::from("Answer\tGazeX\tGazeY\tTimestamp\n");
    for frame in three_lines(Context::Revealed) {
        text.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            frame.line_index.unwrap_or(0),
            frame.x,
            frame.y,
            frame.timestamp
        ));
    }
    fs::write(&path, text).expect("write");

    let frames = export::read_csv(&path).expect("read");
    assert_eq!(frames.len(), 251);
    assert_eq!(frames[0].timestamp, 1_000.0);
    let (_, detection) = process_batch(&frames, &PipelineConfig::default());
    assert_eq!(detection.sweeps.len(), 2);
}

#[test]
fn test_empty_recording_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty.csv");
    fs::write(&path, "time,x,y\nnot,a,row\n").expect("write");

    match export::read_csv(&path) {
        Err(GazeError::EmptyInput(p)) => assert_eq!(p, path),
        other => panic!("expected EmptyInput, got {other:?}"),
    }
}
