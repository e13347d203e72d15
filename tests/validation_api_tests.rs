use axum::http::StatusCode;

mod common;
use common::{encode, get, setup, setup_app, setup_test_db};
use crudlist::ListConfig;

#[tokio::test]
async fn test_per_page_above_hard_cap_is_422() {
    let (_db, app) = setup().await;
    let (status, body) = get(&app, "/api/products?per_page=5000").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], false);
    assert!(body["data"].is_null());
    // A lone failure surfaces through the synthesized message entry.
    assert!(
        body["errors"]["message"][0]
            .as_str()
            .unwrap()
            .contains("per_page")
    );
}

#[tokio::test]
async fn test_multiple_failures_reported_per_field() {
    let (_db, app) = setup().await;
    let (status, body) = get(
        &app,
        "/api/products?min_price=50&max_price=10&date_from=bogus",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["max_price"].is_array());
    assert!(body["errors"]["date_from"].is_array());
    // The message leads with one failure and counts the rest.
    assert!(body["message"].as_str().unwrap().contains("more problem"));
}

#[tokio::test]
async fn test_inverted_price_bounds_blame_max_price() {
    let (_db, app) = setup().await;
    let (status, body) = get(&app, "/api/products?q=lap&min_price=100&max_price=50").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["errors"]["max_price"][0]
            .as_str()
            .unwrap()
            .contains("min_price")
    );
    assert!(body["errors"].get("min_price").is_none());
}

#[tokio::test]
async fn test_sort_direction_mismatch_is_422() {
    let (_db, app) = setup().await;
    let uri = format!(
        "/api/products?sort_columns={}&sort_directions={}",
        encode(r#"["price", "name"]"#),
        encode(r#"["ASC"]"#)
    );
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["errors"]["message"][0]
            .as_str()
            .unwrap()
            .contains("sort_directions")
    );
}

#[tokio::test]
async fn test_sql_fragment_in_search_is_422() {
    let (_db, app) = setup().await;
    let uri = format!(
        "/api/products?q={}",
        encode("laptop'; drop table products; --")
    );
    let (status, _body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_hostile_filter_key_is_422() {
    let (_db, app) = setup().await;
    let uri = format!(
        "/api/products?filters={}",
        encode(r#"{"name; drop table products": "x"}"#)
    );
    let (status, _body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_inverted_date_range_is_422() {
    let (_db, app) = setup().await;
    let (status, body) = get(
        &app,
        "/api/products?date_from=2026-03-01&date_to=2026-01-01",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["errors"]["message"][0]
            .as_str()
            .unwrap()
            .contains("date_from")
    );
}

#[tokio::test]
async fn test_config_gated_envelope_fields() {
    let db = setup_test_db().await.unwrap();
    common::seed(&db).await.unwrap();
    let config = ListConfig {
        include_response_code: true,
        echo_request_data: true,
        ..ListConfig::default()
    };
    let app = setup_app(db, config);

    let (status, body) = get(&app, "/api/products?per_page=5000").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["response_code"], 422);
    assert_eq!(body["request_data"]["per_page"], 5000);
}

#[tokio::test]
async fn test_default_envelope_omits_gated_fields() {
    let (_db, app) = setup().await;
    let (_, body) = get(&app, "/api/products").await;
    assert!(body.get("response_code").is_none());
    assert!(body.get("request_data").is_none());
}

#[tokio::test]
async fn test_xss_payload_neutralized_not_rejected() {
    // Sanitization strips the markup before validation sees it, so the
    // request succeeds and simply matches nothing.
    let (_db, app) = setup().await;
    let uri = format!(
        "/api/products?filters={}",
        encode(r#"{"name": "<b>Widget</b>"}"#)
    );
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 0);
}
