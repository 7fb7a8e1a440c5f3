use marginalia_core::{
    AnnotationRegistry, Annotator, DestinationConfig, FieldMap, IdSource, ObjectId,
};
use rusqlite::Connection;

struct Widget {
    id: i64,
}

fn widget_source() -> IdSource<Widget> {
    IdSource::extract(|widget: &Widget| Some(ObjectId::from(widget.id)))
}

fn file_config(dir: &tempfile::TempDir, file: &str, table: &str) -> DestinationConfig {
    let path = dir.path().join(file);
    DestinationConfig::new(format!("sqlite:{}", path.display()), table)
}

#[test]
fn resolve_bootstraps_the_annotation_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir, "notes.db", "annotations");

    let mut registry = AnnotationRegistry::new();
    registry.resolve(&config).unwrap();

    let conn = Connection::open(dir.path().join("notes.db")).unwrap();
    let columns = table_columns(&conn, "annotations");
    assert_eq!(
        columns,
        vec![
            "id",
            "class",
            "object_id",
            "event",
            "attr",
            "old_val",
            "new_val",
            "via",
            "comment",
            "expire_time"
        ]
    );
}

#[test]
fn timestamped_destination_adds_note_time_column() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(&dir, "stamped.db", "annotations");
    config.timestamps = true;

    let mut registry = AnnotationRegistry::new();
    let annotator: Annotator<Widget> =
        Annotator::bind(&mut registry, &config, "widget", widget_source()).unwrap();
    annotator
        .annotate(&Widget { id: 1 }, &[("event", "created")])
        .unwrap();

    let conn = Connection::open(dir.path().join("stamped.db")).unwrap();
    let columns = table_columns(&conn, "annotations");
    assert_eq!(columns[3], "note_time");

    let records = annotator.search_class_annotations(&[]).unwrap();
    assert!(records[0].note_time.unwrap() > 0);
}

#[test]
fn file_destination_persists_across_registries() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir, "durable.db", "annotations");

    {
        let mut registry = AnnotationRegistry::new();
        let annotator: Annotator<Widget> =
            Annotator::bind(&mut registry, &config, "widget", widget_source()).unwrap();
        annotator
            .annotate(&Widget { id: 42 }, &[("comment", "survives reopen")])
            .unwrap();
    }

    let mut registry = AnnotationRegistry::new();
    let annotator: Annotator<Widget> =
        Annotator::bind(&mut registry, &config, "widget", widget_source()).unwrap();
    let records = annotator.search_class_annotations(&[]).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].object_id, ObjectId::from(42));
    assert_eq!(records[0].detail("comment"), Some("survives reopen"));
}

#[test]
fn column_override_replaces_default_detail_set() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(&dir, "custom.db", "release_notes");
    config.columns = Some(vec!["stage".to_string(), "remark".to_string()]);

    let mut registry = AnnotationRegistry::new();
    let annotator: Annotator<Widget> =
        Annotator::bind(&mut registry, &config, "release", widget_source()).unwrap();
    annotator
        .annotate(
            &Widget { id: 3 },
            &[("stage", "canary"), ("event", "ignored")],
        )
        .unwrap();

    let conn = Connection::open(dir.path().join("custom.db")).unwrap();
    let columns = table_columns(&conn, "release_notes");
    assert_eq!(columns, vec!["id", "class", "object_id", "stage", "remark"]);

    let records = annotator.search_class_annotations(&[]).unwrap();
    assert_eq!(records[0].detail("stage"), Some("canary"));
    assert_eq!(records[0].details.len(), 1);
}

#[test]
fn records_serialize_to_json() {
    let mut registry = AnnotationRegistry::new();
    let config = DestinationConfig::new(":memory:", "annotations");
    let annotator: Annotator<Widget> =
        Annotator::bind(&mut registry, &config, "widget", widget_source()).unwrap();

    annotator
        .annotate(&Widget { id: 42 }, &[("event", "created")])
        .unwrap();
    let records = annotator.search_class_annotations(&[]).unwrap();

    let value = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(value["class"], "widget");
    assert_eq!(value["object_id"], "42");
    assert_eq!(value["details"]["event"], "created");
}

#[test]
fn store_exposes_its_binding_for_direct_access() {
    let mut registry = AnnotationRegistry::new();
    let config = DestinationConfig::new(":memory:", "annotations");
    let annotator: Annotator<Widget> =
        Annotator::bind(&mut registry, &config, "widget", widget_source()).unwrap();

    let store = annotator.annotation_store();
    assert_eq!(store.table(), "annotations");
    assert!(!store.layout().timestamps());

    store
        .insert(
            "widget",
            &ObjectId::from(5),
            &FieldMap::from([("via".to_string(), "direct".to_string())]),
        )
        .unwrap();
    let records = annotator
        .search_annotations(&Widget { id: 5 }, &[])
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].detail("via"), Some("direct"));
}

fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        columns.push(row.get::<_, String>(1).unwrap());
    }
    columns
}
