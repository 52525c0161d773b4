//! Error handling tests

use super::{HEADER, StubCountry, StubGeoid, quiet_config, uniform_upload};
use crate::error::{ConvertError, LookupErrorKind};
use crate::models::{BatchState, GeoidModel, Unit};
use crate::processor::BatchOrchestrator;
use crate::validator::Upload;

#[tokio::test]
async fn test_timeout_in_second_file_aborts_whole_batch() {
    // File 1 has 3 rows, so call 8 is row 5 of file 2
    let geoid = StubGeoid::new(-33.5).failing_on(8, LookupErrorKind::Timeout);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("United States"), &quiet_config()).unwrap();

    let result = orchestrator
        .process(
            &[uniform_upload("first.csv", 3), uniform_upload("second.csv", 6)],
            Some(GeoidModel::Geoid18),
            Some(Unit::Meters),
        )
        .await;

    match result {
        Err(ConvertError::Lookup {
            source_name,
            row,
            source,
        }) => {
            assert_eq!(source_name, "second.csv");
            assert_eq!(row, 5);
            assert_eq!(source.kind, LookupErrorKind::Timeout);
        }
        other => panic!("Expected Lookup error, got {other:?}"),
    }
    assert_eq!(orchestrator.state(), BatchState::Failed);
    // No lookups after the failing row
    assert_eq!(geoid.calls(), 8);
}

#[tokio::test]
async fn test_each_lookup_failure_kind_is_reported() {
    for kind in [
        LookupErrorKind::ConnectionFailure,
        LookupErrorKind::Timeout,
        LookupErrorKind::HttpStatusFailure,
        LookupErrorKind::OtherRequestFailure,
    ] {
        let geoid = StubGeoid::new(0.0).failing_on(1, kind);
        let mut orchestrator =
            BatchOrchestrator::new(&geoid, StubCountry("United States"), &quiet_config())
                .unwrap();

        let err = orchestrator
            .process(
                &[uniform_upload("site.csv", 2)],
                Some(GeoidModel::Geoid18),
                Some(Unit::UsFeet),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains(&kind.to_string()));
        assert!(err.to_string().contains("site.csv"));
        assert_eq!(orchestrator.state(), BatchState::Failed);
    }
}

#[tokio::test]
async fn test_failure_with_concurrent_lookups_reports_first_row() {
    let geoid = StubGeoid::new(0.0).failing_on(3, LookupErrorKind::HttpStatusFailure);
    let config = quiet_config().with_lookup_concurrency(4);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("United States"), &config).unwrap();

    let err = orchestrator
        .process(
            &[uniform_upload("site.csv", 10)],
            Some(GeoidModel::Geoid18),
            Some(Unit::Meters),
        )
        .await
        .unwrap_err();

    match err {
        ConvertError::Lookup { row, .. } => assert_eq!(row, 3),
        other => panic!("Expected Lookup error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_country_stops_validation() {
    let geoid = StubGeoid::new(0.0);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("Mexico"), &quiet_config()).unwrap();

    let err = orchestrator
        .process(
            &[uniform_upload("south.csv", 2)],
            Some(GeoidModel::Geoid18),
            Some(Unit::Meters),
        )
        .await
        .unwrap_err();

    match err {
        ConvertError::Geography {
            source_name,
            resolved_country,
        } => {
            assert_eq!(source_name, "south.csv");
            assert_eq!(resolved_country, "Mexico");
        }
        other => panic!("Expected Geography error, got {other:?}"),
    }
    assert_eq!(orchestrator.state(), BatchState::Failed);
    assert_eq!(geoid.calls(), 0);
}

#[tokio::test]
async fn test_schema_error_in_second_file_stops_batch() {
    let geoid = StubGeoid::new(0.0);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("United States"), &quiet_config()).unwrap();

    let broken = Upload::new("broken.csv", "# image name,altitude [meter]\nIMG,100\n");
    let err = orchestrator
        .process(
            &[uniform_upload("good.csv", 2), broken],
            Some(GeoidModel::Geoid18),
            Some(Unit::Meters),
        )
        .await
        .unwrap_err();

    match err {
        ConvertError::Schema {
            source_name,
            missing_columns,
        } => {
            assert_eq!(source_name, "broken.csv");
            assert_eq!(missing_columns.len(), 7);
        }
        other => panic!("Expected Schema error, got {other:?}"),
    }
    assert_eq!(geoid.calls(), 0);
}

#[tokio::test]
async fn test_missing_selection_waits_for_input() {
    let geoid = StubGeoid::new(0.0);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("United States"), &quiet_config()).unwrap();

    let err = orchestrator
        .process(&[uniform_upload("a.csv", 1)], Some(GeoidModel::Geoid18), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::MissingSelection { .. }));
    assert_eq!(orchestrator.state(), BatchState::AwaitingSelections);
    assert_eq!(geoid.calls(), 0);
}

#[tokio::test]
async fn test_colliding_entries_rejected_before_lookups() {
    let geoid = StubGeoid::new(0.0);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("United States"), &quiet_config()).unwrap();

    let err = orchestrator
        .process(
            &[uniform_upload("siteA.csv", 1), uniform_upload("siteA.txt", 1)],
            Some(GeoidModel::Geoid18),
            Some(Unit::Meters),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::DuplicateArchiveEntry { .. }));
    assert_eq!(orchestrator.state(), BatchState::Failed);
    assert_eq!(geoid.calls(), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let geoid = StubGeoid::new(0.0);
    let config = quiet_config().with_lookup_concurrency(0);
    let result = BatchOrchestrator::new(&geoid, StubCountry("United States"), &config);
    assert!(matches!(result, Err(ConvertError::Configuration { .. })));
}

#[tokio::test]
async fn test_header_only_file_is_rejected() {
    let geoid = StubGeoid::new(0.0);
    let mut orchestrator =
        BatchOrchestrator::new(&geoid, StubCountry("United States"), &quiet_config()).unwrap();

    let empty = Upload::new("empty.csv", format!("{}\n", HEADER));
    let err = orchestrator.validate_uploads(&[empty]).await.unwrap_err();
    assert!(matches!(err, ConvertError::EmptyRecordSet { .. }));
}
