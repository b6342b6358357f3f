//! Series API tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use bookshelf_core::SeriesStore;
use common::TestFixture;

#[tokio::test]
async fn test_create_series_is_find_or_create() {
    let fixture = TestFixture::new().await;

    let first = fixture
        .post("/api/v1/series", json!({ "name": "Suske en Wiske" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = fixture
        .post("/api/v1/series", json!({ "name": "  suske EN wiske " }))
        .await;
    assert_eq!(second.status, StatusCode::CREATED);

    assert_eq!(first.body["id"], second.body["id"]);
    assert_eq!(second.body["name"], "Suske en Wiske");
    assert_eq!(fixture.series_store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_series_blank_name_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/series", json!({ "name": "   " })).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_series() {
    let fixture = TestFixture::new().await;
    fixture
        .post("/api/v1/series", json!({ "name": "Discworld" }))
        .await;
    fixture
        .post("/api/v1/series", json!({ "name": "De Rode Ridder" }))
        .await;

    let response = fixture.get("/api/v1/series").await;

    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<&str> = response.body["series"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Discworld"));
    assert!(names.contains(&"De Rode Ridder"));
}
