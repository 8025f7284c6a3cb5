//! Unit tests for the hand-off between photo analysis and photo deletion

use content_audit::cleanup::analysis::write_analysis;
use content_audit::cleanup::{
    filter_preserved, preserved_ids_for, read_ids, AnalysisOutcome, PreservedPhoto,
};
use content_audit::output::PhotoReportPaths;
use std::fs;
use tempfile::TempDir;

fn preserved(id: &str, location: &str) -> PreservedPhoto {
    PreservedPhoto {
        ans_id: id.to_string(),
        ans_location: location.to_string(),
        source_id: String::new(),
        website: "the-daily".to_string(),
    }
}

#[test]
fn test_delete_list_feeds_photo_delete_with_preserved_skip() {
    let dir = TempDir::new().unwrap();
    let paths = PhotoReportPaths::new(dir.path(), "acme", false, Some((10, 20)), None);

    let outcome = AnalysisOutcome {
        to_delete: vec!["P1".to_string(), "P3".to_string()],
        preserved: vec![preserved("P2", "gallery")],
        ..Default::default()
    };
    write_analysis(&outcome, &paths).unwrap();

    // A later run appends; the header is not repeated.
    let second = AnalysisOutcome {
        to_delete: vec!["P2".to_string(), "P4".to_string()],
        preserved: vec![preserved("P5", "lightbox")],
        ..Default::default()
    };
    write_analysis(&second, &paths).unwrap();

    let preserved_text = fs::read_to_string(&paths.preserved).unwrap();
    assert_eq!(preserved_text.matches("ans_id").count(), 1);

    let ids = read_ids(&paths.to_delete).unwrap();
    assert_eq!(ids, vec!["P1", "P3", "P2", "P4"]);

    let keep = preserved_ids_for(&paths.to_delete);
    let (process, skipped) = filter_preserved(ids, &keep);
    assert_eq!(process, vec!["P1", "P3", "P4"]);
    assert_eq!(skipped, vec!["P2"]);
}

#[test]
fn test_unresolved_photos_are_in_neither_file() {
    let dir = TempDir::new().unwrap();
    let paths = PhotoReportPaths::new(dir.path(), "acme", true, None, None);

    let outcome = AnalysisOutcome {
        to_delete: vec!["P1".to_string()],
        unresolved: vec!["P9".to_string()],
        ..Default::default()
    };
    let (to_delete, preserved) = write_analysis(&outcome, &paths).unwrap();

    assert_eq!(to_delete.as_deref(), Some(paths.to_delete.as_path()));
    assert!(preserved.is_none());
    assert!(!paths.preserved.exists());
    assert!(!fs::read_to_string(&paths.to_delete).unwrap().contains("P9"));
}
