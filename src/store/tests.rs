use super::*;
use serde_json::json;
use tempfile::TempDir;

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("test document must be an object"),
    }
}

fn leads() -> MemoryStore {
    MemoryStore::from_documents([
        doc(json!({"name": "C", "city": "Pune", "telecaller": {"name": "Raj", "phone": "1"}})),
        doc(json!({"name": "A", "city": "Pune", "tags": ["hot", "vip"]})),
        doc(json!({"name": "B", "city": "Delhi", "tags": ["hot"]})),
    ])
}

fn names(cursor: DocumentCursor<'_>) -> Vec<String> {
    cursor
        .map(|d| {
            d.expect("document should load")
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn ids_are_assigned_sequentially() {
    let mut store = leads();
    assert_eq!(store.len(), 3);
    assert_eq!(store.documents()[0].get(ID_FIELD), Some(&json!(1)));
    assert_eq!(store.documents()[2].get(ID_FIELD), Some(&json!(3)));

    let explicit = store.insert(doc(json!({"_id": 10, "name": "D"})));
    assert_eq!(explicit, json!(10));
    let next = store.insert(doc(json!({"name": "E"})));
    assert_eq!(next, json!(11));
}

#[test]
fn id_assignment_survives_largest_explicit_id() {
    let mut store = MemoryStore::new();
    assert_eq!(store.insert(doc(json!({"_id": i64::MAX}))), json!(i64::MAX));
    assert_eq!(store.insert(doc(json!({"name": "b"}))), json!(1));

    let mut store = MemoryStore::new();
    store.insert(doc(json!({"_id": i64::MAX - 1})));
    assert_eq!(store.insert(doc(json!({"name": "b"}))), json!(i64::MAX));
    assert_eq!(store.insert(doc(json!({"name": "c"}))), json!(1));
}

#[test]
fn assigned_ids_skip_explicit_ones() {
    let store = MemoryStore::from_documents([
        doc(json!({"name": "a"})),
        doc(json!({"_id": 1, "name": "b"})),
        doc(json!({"name": "c"})),
    ]);
    let ids: Vec<_> = store.documents().iter().map(|d| d[ID_FIELD].clone()).collect();
    assert_eq!(ids, [json!(2), json!(1), json!(3)]);

    let mut store = MemoryStore::new();
    store.insert(doc(json!({"_id": 3})));
    store.insert(doc(json!({"_id": 1})));
    assert_eq!(store.insert(doc(json!({"name": "d"}))), json!(4));
}

#[test]
fn loading_reserves_explicit_ids() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let path = temp_dir.path().join("mixed.json");
    std::fs::write(&path, r#"[{"name": "a"}, {"_id": 1}]"#).expect("should write file");

    let loaded = MemoryStore::load(&path).expect("should load store");
    assert_eq!(loaded.documents()[0].get(ID_FIELD), Some(&json!(2)));
    assert_eq!(loaded.documents()[1].get(ID_FIELD), Some(&json!(1)));
}

#[test]
fn assigned_id_comes_first() {
    let store = leads();
    let first_key = store.documents()[0].keys().next().map(String::as_str);
    assert_eq!(first_key, Some(ID_FIELD));
}

#[test]
fn find_with_empty_filter_returns_all_in_insertion_order() {
    let store = leads();
    let cursor = store.find(&Filter::new(), None).expect("find should succeed");
    assert_eq!(names(cursor), ["C", "A", "B"]);
}

#[test]
fn sort_then_limit() {
    let store = leads();
    let cursor = store
        .find(&Filter::new(), None)
        .expect("find should succeed")
        .sort("name", SortDirection::Ascending)
        .limit(2);
    assert_eq!(names(cursor), ["A", "B"]);

    let cursor = store
        .find(&Filter::new(), None)
        .expect("find should succeed")
        .sort("name", SortDirection::Descending);
    assert_eq!(names(cursor), ["C", "B", "A"]);
}

#[test]
fn missing_sort_field_sorts_first_ascending_and_last_descending() {
    let store = leads();
    let ascending = store
        .find(&Filter::new(), None)
        .expect("find should succeed")
        .sort("telecaller.name", SortDirection::Ascending);
    assert_eq!(names(ascending), ["A", "B", "C"]);

    let descending = store
        .find(&Filter::new(), None)
        .expect("find should succeed")
        .sort("telecaller.name", SortDirection::Descending);
    assert_eq!(names(descending), ["C", "A", "B"]);
}

#[test]
fn sort_failure_is_yielded_once() {
    let failing = DocumentCursor::new(
        vec![
            Ok(doc(json!({"name": "x"}))),
            Err(StoreError::Unavailable("connection reset".to_string())),
        ]
        .into_iter(),
    );
    let mut sorted = failing.sort("name", SortDirection::Ascending);
    assert!(matches!(sorted.next(), Some(Err(StoreError::Unavailable(_)))));
    assert!(sorted.next().is_none());
}

#[test]
fn sort_direction_from_numbers() {
    assert_eq!(SortDirection::from(1), SortDirection::Ascending);
    assert_eq!(SortDirection::from(0), SortDirection::Ascending);
    assert_eq!(SortDirection::from(-1), SortDirection::Descending);

    let parsed: SortDirection = serde_json::from_value(json!(-5)).expect("should parse");
    assert_eq!(parsed, SortDirection::Descending);
    assert_eq!(
        serde_json::to_value(SortDirection::Ascending).expect("should serialize"),
        json!(1)
    );
}

#[test]
fn projection_keeps_id_and_nested_paths() {
    let store = leads();
    let projection: Projection = ["telecaller.name".to_string(), "city".to_string()]
        .into_iter()
        .collect();
    let first = store
        .find(&Filter::new(), Some(&projection))
        .expect("find should succeed")
        .next()
        .expect("one document")
        .expect("document should load");

    assert_eq!(
        Value::Object(first),
        json!({"_id": 1, "city": "Pune", "telecaller": {"name": "Raj"}})
    );
}

#[test]
fn projection_of_absent_nested_path_keeps_only_id() {
    let store = leads();
    let projection: Projection = ["telecaller.name".to_string()].into_iter().collect();
    let rows: Vec<Document> = store
        .find(&Filter::new(), Some(&projection))
        .expect("find should succeed")
        .collect::<StoreResult<_>>()
        .expect("documents should load");

    assert_eq!(Value::Object(rows[1].clone()), json!({"_id": 2}));
}

#[test]
fn sort_sees_fields_outside_projection() {
    let store = leads();
    let projection: Projection = ["city".to_string()].into_iter().collect();
    let rows: Vec<Document> = store
        .find(&Filter::new(), Some(&projection))
        .expect("find should succeed")
        .sort("name", SortDirection::Ascending)
        .limit(2)
        .collect::<StoreResult<_>>()
        .expect("documents should load");

    assert_eq!(
        rows.into_iter().map(Value::Object).collect::<Vec<_>>(),
        [json!({"_id": 2, "city": "Pune"}), json!({"_id": 3, "city": "Delhi"})]
    );
}

#[test]
fn find_rejects_bad_filter() {
    let store = leads();
    let filter = doc(json!({"name": {"$near": 1}}));
    assert!(matches!(
        store.find(&filter, None),
        Err(StoreError::InvalidFilter(_))
    ));
}

#[test]
fn distinct_values_deduplicate_in_first_seen_order() {
    let store = leads();
    let cities = store
        .distinct_values("city", &Filter::new())
        .expect("distinct should succeed");
    assert_eq!(cities, [json!("Pune"), json!("Delhi")]);
}

#[test]
fn distinct_values_unwind_arrays_and_respect_filter() {
    let store = leads();
    let tags = store
        .distinct_values("tags", &Filter::new())
        .expect("distinct should succeed");
    assert_eq!(tags, [json!("hot"), json!("vip")]);

    let filter = doc(json!({"city": "Delhi"}));
    let tags = store
        .distinct_values("tags", &filter)
        .expect("distinct should succeed");
    assert_eq!(tags, [json!("hot")]);

    let none = store
        .distinct_values("missing", &Filter::new())
        .expect("distinct should succeed");
    assert!(none.is_empty());
}

#[test]
fn json_file_round_trip() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let path = temp_dir.path().join("nested/leads.json");

    leads().save(&path).expect("should save store");
    let loaded = MemoryStore::load(&path).expect("should load store");
    assert_eq!(loaded.documents(), leads().documents());
}

#[test]
fn json_lines_file_loads_and_assigns_ids() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let path = temp_dir.path().join("leads.jsonl");
    std::fs::write(&path, "{\"name\": \"Ana\"}\n\n{\"name\": \"Raj\"}\n")
        .expect("should write file");

    let loaded = MemoryStore::load(&path).expect("should load store");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.documents()[1].get(ID_FIELD), Some(&json!(2)));

    loaded.save(&path).expect("should save store");
    let content = std::fs::read_to_string(&path).expect("should read file");
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn load_errors() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let missing = MemoryStore::load(temp_dir.path().join("absent.json"));
    assert!(matches!(missing, Err(StoreError::Unavailable(_))));

    let path = temp_dir.path().join("scalars.json");
    std::fs::write(&path, "[1, 2]").expect("should write file");
    assert!(matches!(
        MemoryStore::load(&path),
        Err(StoreError::InvalidDocument(_))
    ));

    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "[{").expect("should write file");
    assert!(matches!(MemoryStore::load(&path), Err(StoreError::Json(_))));

    let path = temp_dir.path().join("empty.json");
    std::fs::write(&path, "").expect("should write file");
    assert!(MemoryStore::load(&path).expect("empty file is fine").is_empty());
}
