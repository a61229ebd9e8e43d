use std::fmt::Write as _;
use std::sync::Arc;

use shipstream_core::config::PipelineConfig;
use shipstream_core::merge::MergePolicy;
use shipstream_core::pipeline::{IngestPipeline, PipelineError, RunStatus};
use shipstream_core::snapshot::SnapshotError;
use shipstream_core::{MergeError, Table, CANONICAL_KEY};
use shipstream_store::{MemoryObjectStore, ObjectStore};

fn test_config() -> PipelineConfig {
    PipelineConfig {
        source_namespace: "inbound".to_string(),
        destination_namespace: "published".to_string(),
        key_column: "Job No.".to_string(),
        master_object: "tracking_master.csv".to_string(),
        merge_policy: MergePolicy::KeepAll,
    }
}

fn pipeline(store: Arc<MemoryObjectStore>) -> IngestPipeline {
    IngestPipeline::new(store, test_config()).expect("valid test config")
}

/// Master dataset with one row per key J001..J{count}, already canonical.
fn master_csv(count: usize) -> String {
    let mut csv = String::from("job_number,container_number,load_port\n");
    for index in 1..=count {
        writeln!(csv, "J{index:03},MSCU{index:04},SGSIN").unwrap();
    }
    csv
}

#[tokio::test]
async fn merges_latest_increment_into_master() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("published", "tracking_master.csv", master_csv(100));

    // An older extract that must lose discovery to the newer one.
    store.insert(
        "inbound",
        "track_202501010900.csv",
        "Job No.,Container Number\nSTALE,SHOULD-NOT-APPEAR\n",
    );

    // 12 rows over 10 distinct keys (J001 and J002 repeated), raw headers,
    // messy values, one folded header, one column master does not have.
    let mut increment = String::from("Job No.,Container Number,Load Port,\"Hot Container\nFlag\"\n");
    for index in 1..=10 {
        writeln!(increment, " j{index:03} ,new{index:04},() ,y").unwrap();
    }
    increment.push_str("j001,dup0001,USLAX,maybe\n");
    increment.push_str("j002,dup0002,USLAX,n\n");
    store.insert("inbound", "track_202501020900.csv", increment);

    let outcome = pipeline(store.clone()).run().await.expect("run succeeds");

    assert_eq!(outcome.status, RunStatus::Success);
    assert_eq!(outcome.total_records_in_final_file, 100 - 10 + 12);
    assert_eq!(outcome.new_records_shape, (12, 4));
    assert_eq!(outcome.previous_records_shape, (100, 3));
    assert_eq!(outcome.key_column_used, CANONICAL_KEY);
    assert_eq!(outcome.target_object, "tracking_master.csv");

    let published = store.read_text("published", "tracking_master.csv").await.unwrap();
    let merged = Table::from_csv(&published).unwrap();
    assert_eq!(merged.height(), 102);
    assert_eq!(
        merged.columns(),
        ["job_number", "container_number", "load_port", "hot_container_flag"]
    );

    let key = merged.column_index("job_number").unwrap();
    let container = merged.column_index("container_number").unwrap();
    let port = merged.column_index("load_port").unwrap();
    let flag = merged.column_index("hot_container_flag").unwrap();

    // Retained master rows come first and are untouched, padded for the
    // column only the increment carries.
    assert_eq!(merged.rows()[0][key].render(), "J011");
    assert_eq!(merged.rows()[0][flag].render(), "");

    // Replaced keys carry the increment's data, normalized.
    let replaced: Vec<&Vec<_>> = merged
        .rows()
        .iter()
        .filter(|row| row[key].render() == "J001")
        .collect();
    assert_eq!(replaced.len(), 2, "duplicate increment keys both survive");
    assert_eq!(replaced[0][container].render(), "NEW0001");
    assert_eq!(replaced[0][port].render(), "", "() sentinel blanked");
    assert_eq!(replaced[0][flag].render(), "True");
    assert_eq!(replaced[1][container].render(), "DUP0001");
    assert_eq!(replaced[1][flag].render(), "MAYBE");

    // Nothing from the stale extract leaked in.
    assert!(!published.contains("SHOULD-NOT-APPEAR"));
}

#[tokio::test]
async fn keep_last_policy_deduplicates_increment_keys() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("published", "tracking_master.csv", master_csv(3));
    store.insert(
        "inbound",
        "track_202501020900.csv",
        "Job No.,Container Number\nJ001,first\nJ001,second\n",
    );

    let config = PipelineConfig {
        merge_policy: MergePolicy::KeepLastByPosition,
        ..test_config()
    };
    let pipeline = IngestPipeline::new(store.clone(), config).unwrap();
    let outcome = pipeline.run().await.unwrap();

    assert_eq!(outcome.total_records_in_final_file, 3);
    let published = store.read_text("published", "tracking_master.csv").await.unwrap();
    assert!(published.contains("SECOND"));
    assert!(!published.contains("FIRST"));
}

#[tokio::test]
async fn missing_key_column_fails_without_writing() {
    let store = Arc::new(MemoryObjectStore::new());
    let original_master = master_csv(5);
    store.insert("published", "tracking_master.csv", original_master.clone());
    store.insert(
        "inbound",
        "track_202501020900.csv",
        "Container Number,Load Port\nMSCU1,SGSIN\n",
    );

    let err = pipeline(store.clone()).run().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Merge(MergeError::MissingKeyColumn {
            table: "increment",
            ..
        })
    ));

    let untouched = store.read_text("published", "tracking_master.csv").await.unwrap();
    assert_eq!(untouched, original_master, "no partial write on failure");
}

#[tokio::test]
async fn empty_source_namespace_fails_discovery() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("published", "tracking_master.csv", master_csv(1));

    let err = pipeline(store).run().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Snapshot(SnapshotError::NoCandidates)
    ));
}

#[tokio::test]
async fn malformed_snapshot_name_fails_discovery() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("published", "tracking_master.csv", master_csv(1));
    store.insert("inbound", "junk.csv", "Job No.\nJ001\n");

    let err = pipeline(store).run().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Snapshot(SnapshotError::MalformedFilename { .. })
    ));
}

#[tokio::test]
async fn missing_master_object_surfaces_as_storage_read_error() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(
        "inbound",
        "track_202501020900.csv",
        "Job No.,Container Number\nJ001,MSCU1\n",
    );

    let err = pipeline(store).run().await.unwrap_err();
    assert!(matches!(err, PipelineError::StorageRead { object, .. } if object == "tracking_master.csv"));
}

#[test]
fn blank_configuration_is_rejected_before_any_io() {
    let store = Arc::new(MemoryObjectStore::new());
    let config = PipelineConfig {
        master_object: String::new(),
        ..test_config()
    };

    let err = IngestPipeline::new(store, config).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[tokio::test]
async fn outcome_serializes_with_reporting_field_names() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("published", "tracking_master.csv", master_csv(2));
    store.insert(
        "inbound",
        "track_202501020900.csv",
        "Job No.,Container Number\nJ009,MSCU9\n",
    );

    let outcome = pipeline(store).run().await.unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "SUCCESS");
    assert_eq!(json["total_records_in_final_file"], 3);
    assert_eq!(json["new_records_shape"], serde_json::json!([1, 2]));
    assert_eq!(json["previous_records_shape"], serde_json::json!([2, 3]));
    assert_eq!(json["key_column_used"], "job_number");
    assert_eq!(json["target_object"], "tracking_master.csv");
}
