use etl::canonical::RawFieldMap;
use etl::destination::Destination;
use etl::destination::memory::MemoryDestination;
use etl::error::ErrorKind;
use etl::pipeline::Pipeline;
use etl::schema::{SESSION_METADATA, SONG_METADATA, TARGET_TABLES, USER_METADATA};
use etl::test_utils::event_files::{EventDirectory, RawEventLine};
use etl::test_utils::faulty_destination::{Fault, FaultyDestination};
use etl::types::Cell;
use etl_telemetry::tracing::init_test_tracing;

/// Two files, each a header plus two data lines, one line without artist.
fn two_file_layout() -> EventDirectory {
    let events = EventDirectory::new();
    events.add_file(
        "2018-11-01-events.csv",
        &[
            RawEventLine::new()
                .artist("Pavement")
                .song("Mercy:The Laundromat")
                .session_id("182")
                .item_in_session("0")
                .user_id("10"),
            RawEventLine::new()
                .artist("")
                .song("")
                .session_id("182")
                .item_in_session("1")
                .user_id("10"),
        ],
    );
    events.add_file(
        "2018-11-02-events.csv",
        &[
            RawEventLine::new()
                .artist("Faithless")
                .song("Music Matters (Mark Knight Dub)")
                .length("495.3073")
                .session_id("338")
                .item_in_session("4")
                .user_id("44"),
            RawEventLine::new()
                .artist("Muse")
                .song("Uprising")
                .session_id("182")
                .item_in_session("2")
                .user_id("10"),
        ],
    );
    events
}

#[tokio::test]
async fn two_files_load_three_records_into_every_table() {
    init_test_tracing();

    let events = two_file_layout();
    let destination = FaultyDestination::wrap(MemoryDestination::new());
    let pipeline = Pipeline::new(events.pipeline_config(), destination.clone());

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.raw_files, 2);
    assert_eq!(report.raw_rows, 4);
    assert_eq!(report.kept, 3);
    assert_eq!(report.dropped_empty_artist, 1);
    assert_eq!(report.skipped_malformed, 0);
    assert!(report.is_complete());

    for table in TARGET_TABLES {
        assert_eq!(destination.write_calls(table.name).await, 3, "{}", table.name);
        assert_eq!(destination.reset_calls(table.name).await, 1, "{}", table.name);

        let table_report = report.table(table.name).unwrap();
        assert_eq!(table_report.attempted, 3);
        assert_eq!(table_report.succeeded, 3);

        let rows = destination.wrapped().table_rows(table.name).await.unwrap();
        assert_eq!(rows.len(), 3, "{}", table.name);
    }

    assert_eq!(destination.select_calls().await, 0);
    assert_eq!(destination.shutdown_calls().await, 1);
    assert!(events.artifact_path().is_file());
}

#[tokio::test]
async fn custom_field_map_reads_a_reordered_layout() {
    init_test_tracing();

    let events = EventDirectory::new();
    events.add_raw_file(
        "reordered.csv",
        "song,artist,length,sessionId,itemInSession,userId,firstName,lastName,gender,level,location\n\
         Kilometer,Sebastien Tellier,277.15873,182,1,10,Sylvie,Cruz,F,free,\"Washington, DC\"\n\
         Uprising,,245.36,182,2,10,Sylvie,Cruz,F,free,\"Washington, DC\"\n",
    );
    let field_map = RawFieldMap {
        song: 0,
        artist: 1,
        length: 2,
        session_id: 3,
        item_in_session: 4,
        user_id: 5,
        first_name: 6,
        last_name: 7,
        gender: 8,
        level: 9,
        location: 10,
    };
    let destination = MemoryDestination::new();
    let pipeline =
        Pipeline::new(events.pipeline_config(), destination.clone()).with_field_map(field_map);

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.raw_rows, 2);
    assert_eq!(report.kept, 1);
    assert_eq!(report.dropped_empty_artist, 1);
    assert_eq!(report.skipped_malformed, 0);
    assert!(report.is_complete());

    let rows = destination
        .table_rows(USER_METADATA.name)
        .await
        .unwrap();
    assert_eq!(
        rows.into_iter().map(|row| row.into_values()).collect::<Vec<_>>(),
        vec![vec![
            Cell::I32(10),
            Cell::I32(182),
            Cell::I32(1),
            Cell::from("Sebastien Tellier"),
            Cell::from("Kilometer"),
            Cell::from("Sylvie"),
            Cell::from("Cruz"),
        ]]
    );
}

#[tokio::test]
async fn unconvertible_session_id_only_affects_tables_keyed_on_it() {
    init_test_tracing();

    let events = EventDirectory::new();
    events.add_file(
        "events.csv",
        &[
            RawEventLine::new().session_id("abc").song("Broken"),
            RawEventLine::new().session_id("583").song("Intact"),
        ],
    );
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(events.pipeline_config(), destination.clone());

    let report = pipeline.run().await.unwrap();

    for table in [&SESSION_METADATA, &USER_METADATA] {
        let table_report = report.table(table.name).unwrap();
        assert_eq!(table_report.attempted, 2);
        assert_eq!(table_report.succeeded, 1);
        assert_eq!(table_report.conversion_failures, 1);
    }

    let song_report = report.table(SONG_METADATA.name).unwrap();
    assert_eq!(song_report.succeeded, 2);
    assert!(song_report.is_complete());

    let songs: Vec<_> = destination
        .table_rows(SONG_METADATA.name)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.values()[0].clone())
        .collect();
    assert_eq!(songs, vec![Cell::from("Broken"), Cell::from("Intact")]);
}

#[tokio::test]
async fn lost_connection_aborts_only_the_current_table() {
    init_test_tracing();

    let events = two_file_layout();
    let destination = FaultyDestination::wrap(MemoryDestination::new());
    destination
        .inject(USER_METADATA.name, Fault::LoseConnectionAfter(1))
        .await;
    let pipeline = Pipeline::new(events.pipeline_config(), destination.clone());

    let report = pipeline.run().await.unwrap();

    let user_report = report.table(USER_METADATA.name).unwrap();
    assert_eq!(user_report.attempted, 2);
    assert_eq!(user_report.succeeded, 1);
    assert_eq!(
        user_report.aborted.as_ref().map(|err| err.kind()),
        Some(ErrorKind::DestinationConnectionFailed)
    );
    assert_eq!(destination.write_calls(USER_METADATA.name).await, 2);

    assert!(report.table(SESSION_METADATA.name).unwrap().is_complete());
    assert!(report.table(SONG_METADATA.name).unwrap().is_complete());
    assert!(!report.is_complete());
}

#[tokio::test]
async fn rejected_writes_are_counted_and_loading_continues() {
    init_test_tracing();

    let events = two_file_layout();
    let destination = FaultyDestination::wrap(MemoryDestination::new());
    destination
        .inject(SESSION_METADATA.name, Fault::RejectWrites)
        .await;
    let pipeline = Pipeline::new(events.pipeline_config(), destination.clone());

    let report = pipeline.run().await.unwrap();

    let session_report = report.table(SESSION_METADATA.name).unwrap();
    assert_eq!(session_report.attempted, 3);
    assert_eq!(session_report.write_failures, 3);
    assert!(session_report.aborted.is_none());
    assert_eq!(
        destination
            .wrapped()
            .table_rows(SESSION_METADATA.name)
            .await
            .map(|rows| rows.len()),
        Some(0)
    );
    assert!(report.table(USER_METADATA.name).unwrap().is_complete());
}

#[tokio::test]
async fn schema_setup_failure_is_fatal_and_still_shuts_down() {
    init_test_tracing();

    let events = two_file_layout();
    let destination = FaultyDestination::wrap(MemoryDestination::new());
    destination.inject(USER_METADATA.name, Fault::FailReset).await;
    let pipeline = Pipeline::new(events.pipeline_config(), destination.clone());

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationSchemaError);
    for table in TARGET_TABLES {
        assert_eq!(destination.write_calls(table.name).await, 0);
    }
    assert_eq!(destination.shutdown_calls().await, 1);
}

#[tokio::test]
async fn missing_event_directory_is_fatal_before_any_write() {
    init_test_tracing();

    let events = EventDirectory::new();
    let mut config = events.pipeline_config();
    config.event_data_dir = events.root().join("does-not-exist");
    let destination = FaultyDestination::wrap(MemoryDestination::new());
    let pipeline = Pipeline::new(config, destination.clone());

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceIoError);
    for table in TARGET_TABLES {
        assert_eq!(destination.reset_calls(table.name).await, 0);
    }
    assert_eq!(destination.shutdown_calls().await, 1);
    assert!(!events.artifact_path().exists());
}

#[tokio::test]
async fn malformed_and_empty_files_are_tolerated() {
    init_test_tracing();

    let events = EventDirectory::new();
    events.add_raw_file("0-empty.csv", "");
    events.add_file(
        "1-events.csv",
        &[
            RawEventLine::new().artist("Muse"),
            RawEventLine::new().artist("Muse").truncated(10),
        ],
    );
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(events.pipeline_config(), destination.clone());

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.raw_files, 2);
    assert_eq!(report.raw_rows, 2);
    assert_eq!(report.kept, 1);
    assert_eq!(report.skipped_malformed, 1);
    assert!(report.is_complete());
}

#[tokio::test]
async fn rerunning_the_load_leaves_the_same_tables() {
    init_test_tracing();

    let events = two_file_layout();
    let destination = MemoryDestination::new();

    Pipeline::new(events.pipeline_config(), destination.clone())
        .run()
        .await
        .unwrap();
    let mut first = Vec::new();
    for table in TARGET_TABLES {
        first.push(destination.table_rows(table.name).await);
    }

    for table in TARGET_TABLES {
        destination.reset_table(table).await.unwrap();
    }
    Pipeline::new(events.pipeline_config(), destination.clone())
        .run()
        .await
        .unwrap();
    let mut second = Vec::new();
    for table in TARGET_TABLES {
        second.push(destination.table_rows(table.name).await);
    }

    assert_eq!(first, second);
    assert_eq!(destination.shutdown_calls().await, 2);
}
