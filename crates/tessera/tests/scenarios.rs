//! Service behavior over the in-memory driver.

use serde_json::{json, Value};
use tessera::{
    Database, Error, FindResult, MemoryDatabase, MemoryError, Mutation, Page, Paginate, Params,
    Service, ServiceOptions, Table, TableQuery,
};

// ============================================================================
// Test helpers
// ============================================================================

fn service_with(rows: Vec<Value>, paginate: Paginate) -> (MemoryDatabase, Service<MemoryDatabase>) {
    let db = MemoryDatabase::new("test");
    db.create_table("people", rows);
    let service = Service::new(
        ServiceOptions::new()
            .model(db.clone())
            .name("people")
            .paginate(paginate),
    )
    .unwrap();
    (db, service)
}

fn alice_and_bob() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Alice"}),
        json!({"id": 2, "name": "Bob"}),
    ]
}

fn query(value: Value) -> Params {
    Params::from_query(value).unwrap()
}

fn names(records: &[Value]) -> Vec<&str> {
    records.iter().map(|r| r["name"].as_str().unwrap()).collect()
}

// ============================================================================
// Find
// ============================================================================

#[tokio::test]
async fn sort_without_pagination_returns_list() {
    let (_, service) = service_with(alice_and_bob(), Paginate::default());
    let found = service.find(query(json!({"$sort": {"name": 1}}))).await.unwrap();

    let FindResult::List(records) = found else {
        panic!("expected a bare list");
    };
    assert_eq!(names(&records), vec!["Alice", "Bob"]);
}

#[tokio::test]
async fn or_group_finds_either_name() {
    let (_, service) = service_with(alice_and_bob(), Paginate::default());

    let found = service
        .find(query(json!({"$or": [{"name": "Alice"}, {"name": "Bob"}]})))
        .await
        .unwrap();
    assert_eq!(names(found.records()), vec!["Alice", "Bob"]);

    let found = service
        .find(query(json!({"$or": [{"name": "Carol"}]})))
        .await
        .unwrap();
    assert_eq!(found, FindResult::List(vec![]));
}

#[tokio::test]
async fn default_page_counts_every_match() {
    let rows = (1..=25).map(|i| json!({"id": i, "n": i})).collect();
    let (_, service) = service_with(rows, Paginate::new(10));

    let found = service.find(query(json!({}))).await.unwrap();
    let FindResult::Page(page) = found else {
        panic!("expected a page");
    };
    assert_eq!(page.total, 25);
    assert_eq!(page.limit, Some(10));
    assert_eq!(page.skip, 0);
    let ids: Vec<_> = page.data.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn page_envelope_reports_skip_and_clamped_limit() {
    let rows = (1..=25).map(|i| json!({"id": i, "odd": i % 2 == 1})).collect();
    let (_, service) = service_with(rows, Paginate::new(10).with_max(5));

    let found = service
        .find(query(json!({"odd": true, "$skip": 10, "$limit": 50, "$sort": {"id": -1}})))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&found).unwrap(),
        json!({
            "total": 13,
            "limit": 5,
            "skip": 10,
            "data": [{"id": 5, "odd": true}, {"id": 3, "odd": true}, {"id": 1, "odd": true}]
        })
    );
}

#[tokio::test]
async fn absent_query_finds_everything() {
    let (_, service) = service_with(alice_and_bob(), Paginate::default());
    let found = service.find(Params::new()).await.unwrap();
    assert_eq!(found.into_records(), alice_and_bob());
}

#[tokio::test]
async fn select_projects_records() {
    let (_, service) = service_with(alice_and_bob(), Paginate::default());
    let found = service
        .find(query(json!({"$select": ["name"], "$sort": {"name": -1}})))
        .await
        .unwrap();
    assert_eq!(
        found.into_records(),
        vec![json!({"name": "Bob"}), json!({"name": "Alice"})]
    );
}

#[tokio::test]
async fn string_directives_from_query_strings() {
    let rows = (1..=6).map(|i| json!({"id": i})).collect();
    let (_, service) = service_with(rows, Paginate::default());
    let found = service
        .find(query(json!({"$sort": {"id": "-1"}, "$skip": "1", "$limit": "2"})))
        .await
        .unwrap();
    assert_eq!(found.into_records(), vec![json!({"id": 5}), json!({"id": 4})]);
}

// ============================================================================
// Get and create
// ============================================================================

#[tokio::test]
async fn get_missing_id_is_not_found() {
    let (_, service) = service_with(alice_and_bob(), Paginate::default());
    let err = service.get(Some(&json!(999)), Params::new()).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.code(), 404);
    assert!(err.to_string().contains("999"));
}

#[tokio::test]
async fn created_record_round_trips() {
    let (_, service) = service_with(vec![], Paginate::default());
    let created = service
        .create(json!({"name": "Dana", "tags": ["a"]}), Params::new())
        .await
        .unwrap();

    let id = created["id"].clone();
    assert!(id.is_string());
    let fetched = service.get(Some(&id), Params::new()).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn bulk_create_returns_each_record() {
    let (db, service) = service_with(vec![], Paginate::default());
    let created = service
        .create(json!([{"name": "a"}, {"name": "b"}]), Params::new())
        .await
        .unwrap();

    let created = created.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0]["id"], created[1]["id"]);
    assert_eq!(db.table("people").count(&TableQuery::scan()).await.unwrap(), 2);
}

#[tokio::test]
async fn custom_identifier_field() {
    let db = MemoryDatabase::new("test").with_primary_key("_id");
    let service = Service::new(
        ServiceOptions::new()
            .model(db)
            .name("things")
            .id("_id"),
    )
    .unwrap();

    let created = service.create(json!({"n": 1}), Params::new()).await.unwrap();
    assert!(created.get("id").is_none());
    let patched = service
        .patch(Some(&created["_id"]), json!({"n": 2}), Params::new())
        .await
        .unwrap();
    assert_eq!(patched.into_values()[0]["n"], json!(2));
}

#[tokio::test]
async fn create_with_taken_id_is_driver_error() {
    let (db, service) = service_with(alice_and_bob(), Paginate::default());

    let err = service
        .create(json!({"id": 1, "name": "Mallory"}), Params::new())
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Driver(MemoryError::DuplicateKey(key)) if *key == json!(1)));
    assert_eq!(err.code(), 500);
    assert_eq!(err.class_name(), "general-error");
    assert_eq!(db.table("people").snapshot().unwrap(), alice_and_bob());
}

// ============================================================================
// Patch and update
// ============================================================================

#[tokio::test]
async fn patch_changing_id_leaves_table_untouched() {
    let (db, service) = service_with(alice_and_bob(), Paginate::default());

    let err = service
        .patch(Some(&json!(1)), json!({"id": 7, "name": "Alicia"}), Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Driver(MemoryError::PrimaryKeyChanged(_))));
    assert_eq!(err.code(), 500);
    assert_eq!(db.table("people").snapshot().unwrap(), alice_and_bob());

    let err = service
        .patch(None, json!({"id": 7}), query(json!({"name": {"$in": ["Alice", "Bob"]}})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Driver(MemoryError::PrimaryKeyChanged(_))));
    assert_eq!(db.table("people").snapshot().unwrap(), alice_and_bob());
}

#[tokio::test]
async fn patch_by_query_updates_every_match() {
    let rows = vec![
        json!({"id": 1, "status": "pending"}),
        json!({"id": 2, "status": "done"}),
        json!({"id": 3, "status": "pending"}),
    ];
    let (_, service) = service_with(rows, Paginate::default());

    let patched = service
        .patch(None, json!({"status": "done"}), query(json!({"status": "pending"})))
        .await
        .unwrap();
    assert_eq!(
        patched,
        Mutation::Many(vec![
            json!({"id": 1, "status": "done"}),
            json!({"id": 3, "status": "done"}),
        ])
    );

    let pending = service
        .find(query(json!({"status": "pending"})))
        .await
        .unwrap();
    assert!(pending.records().is_empty());
}

#[tokio::test]
async fn update_replaces_whole_record() {
    let (_, service) = service_with(
        vec![json!({"id": 1, "name": "Alice", "age": 31})],
        Paginate::default(),
    );
    let updated = service
        .update(&json!(1), json!({"name": "Alicia"}), Params::new())
        .await
        .unwrap();
    assert_eq!(updated, json!({"name": "Alicia", "id": 1}));
    assert_eq!(
        service.get(Some(&json!(1)), Params::new()).await.unwrap(),
        updated
    );
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn remove_everything_then_nothing() {
    let rows = vec![
        json!({"id": 1, "name": "Alice"}),
        json!({"id": 2, "name": "Bob"}),
        json!({"id": 3, "name": "Carol"}),
    ];
    let (_, service) = service_with(rows.clone(), Paginate::default());

    let removed = service.remove(None, Params::new()).await.unwrap();
    assert_eq!(removed, Mutation::Many(rows));

    let removed = service.remove(None, Params::new()).await.unwrap();
    assert_eq!(removed, Mutation::Many(vec![]));
}

#[tokio::test]
async fn remove_twice_is_not_found() {
    let (_, service) = service_with(alice_and_bob(), Paginate::default());

    let removed = service.remove(Some(&json!(1)), Params::new()).await.unwrap();
    assert_eq!(removed, Mutation::One(json!({"id": 1, "name": "Alice"})));

    let err = service.remove(Some(&json!(1)), Params::new()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn empty_result_serializes_as_array() {
    let (_, service) = service_with(vec![], Paginate::default());
    let removed = service.remove(None, Params::new()).await.unwrap();
    assert_eq!(serde_json::to_value(removed).unwrap(), json!([]));

    let page = Page {
        total: 0,
        limit: None,
        skip: 0,
        data: vec![],
    };
    assert_eq!(
        serde_json::to_value(FindResult::Page(page)).unwrap(),
        json!({"total": 0, "limit": null, "skip": 0, "data": []})
    );
}
