use std::fs;

use tempfile::TempDir;
use walker_engine::{ensure_dir, AtomicFileWriter};

#[test]
fn creates_missing_store_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("job_state.json", "{}").unwrap();
    assert_eq!(first.file_name().unwrap(), "job_state.json");
    assert_eq!(fs::read_to_string(&first).unwrap(), "{}");

    let second = writer.write("job_state.json", r#"{"running":true}"#).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), r#"{"running":true}"#);

    let leftovers = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("job_state.json", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("job_state.json").exists());
}
