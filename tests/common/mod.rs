use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use crudlist::ListConfig;
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use sea_orm_migration::prelude::*;
use serde_json::Value;
use tower::ServiceExt;

pub mod product_entity;
pub mod review_entity;

use product_entity::ProductOps;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn setup_app(db: DatabaseConnection, config: ListConfig) -> Router {
    Router::new().nest("/api/products", crudlist::router(ProductOps, db, config))
}

/// In-memory database with seed data, default config, routed app.
pub async fn setup() -> (DatabaseConnection, Router) {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed(&db).await.expect("Failed to seed test data");
    let app = setup_app(db.clone(), ListConfig::default());
    (db, app)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTables)]
    }
}

pub struct CreateTables;

impl MigrationName for CreateTables {
    fn name(&self) -> &'static str {
        "m20260101_000001_create_products_and_reviews"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(product_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(review_entity::Entity))
            .await?;
        Ok(())
    }
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
}

/// Five products: two laptops in category 1, two desk items in category 2
/// (one created "now" for the calendar shortcuts), and a soft-deleted phone.
pub async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    use product_entity::ActiveModel as Product;
    use review_entity::ActiveModel as Review;

    product_entity::Entity::insert_many(vec![
        Product {
            id: Set(1),
            name: Set("Laptop Pro".to_string()),
            slug: Set("laptop-pro".to_string()),
            price: Set(1500.0),
            category_id: Set(1),
            active: Set(true),
            created_at: Set(at(2026, 1, 10)),
            deleted_at: Set(None),
        },
        Product {
            id: Set(2),
            name: Set("Laptop Air".to_string()),
            slug: Set("laptop-air".to_string()),
            price: Set(900.0),
            category_id: Set(1),
            active: Set(false),
            created_at: Set(at(2026, 2, 20)),
            deleted_at: Set(None),
        },
        Product {
            id: Set(3),
            name: Set("Desk Lamp".to_string()),
            slug: Set("desk-lamp".to_string()),
            price: Set(40.0),
            category_id: Set(2),
            active: Set(true),
            created_at: Set(at(2026, 3, 5)),
            deleted_at: Set(None),
        },
        Product {
            id: Set(4),
            name: Set("Standing Desk".to_string()),
            slug: Set("standing-desk".to_string()),
            price: Set(300.0),
            category_id: Set(2),
            active: Set(true),
            created_at: Set(Utc::now().naive_utc()),
            deleted_at: Set(None),
        },
        Product {
            id: Set(5),
            name: Set("Old Phone".to_string()),
            slug: Set("old-phone".to_string()),
            price: Set(100.0),
            category_id: Set(3),
            active: Set(false),
            created_at: Set(at(2025, 12, 1)),
            deleted_at: Set(Some(at(2026, 1, 2))),
        },
    ])
    .exec(db)
    .await?;

    review_entity::Entity::insert_many(vec![
        Review {
            id: Set(1),
            product_id: Set(1),
            rating: Set(5),
            approved: Set(true),
            body: Set("Excellent machine".to_string()),
            created_at: Set(at(2026, 1, 15)),
        },
        Review {
            id: Set(2),
            product_id: Set(2),
            rating: Set(2),
            approved: Set(false),
            body: Set("Battery died fast".to_string()),
            created_at: Set(at(2026, 2, 25)),
        },
    ])
    .exec(db)
    .await?;

    Ok(())
}

/// Percent-encode a JSON blob for a query-string parameter.
pub fn encode(raw: &str) -> String {
    url_escape::encode_component(raw).to_string()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not JSON")
}

pub async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri).await
}

/// Names of the items on a list page, in order.
pub fn item_names(body: &Value) -> Vec<String> {
    body["data"]["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}
