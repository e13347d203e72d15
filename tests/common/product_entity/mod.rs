use async_trait::async_trait;
use crudlist::{ApiError, Capabilities, IncludeOption, ListOperations, ListResource, RelationTarget};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::review_entity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub price: f64,
    pub category_id: i32,
    pub active: bool,
    pub created_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub struct ProductResource;

impl ListResource for ProductResource {
    type EntityType = Entity;
    type ColumnType = Column;

    const RESOURCE_NAME: &'static str = "product";
    const RESOURCE_NAME_PLURAL: &'static str = "products";
    const TABLE_NAME: &'static str = "products";

    fn id_column() -> Column {
        Column::Id
    }

    fn fillable_columns() -> &'static [&'static str] {
        &["name", "slug", "price", "category_id", "active"]
    }

    fn sortable_columns() -> &'static [(&'static str, Column)] {
        &[
            ("id", Column::Id),
            ("name", Column::Name),
            ("price", Column::Price),
            ("created_at", Column::CreatedAt),
        ]
    }

    fn searchable_columns() -> &'static [&'static str] {
        &["name", "slug"]
    }

    fn capabilities() -> Capabilities {
        Capabilities {
            soft_delete_column: Some("deleted_at"),
            status_column: None,
        }
    }

    fn relation_targets() -> &'static [RelationTarget] {
        &[RelationTarget {
            name: "reviews",
            table: "reviews",
            foreign_key: "product_id",
            columns: &["approved", "rating"],
        }]
    }

    fn include_options() -> Vec<IncludeOption<Self>> {
        vec![
            IncludeOption {
                name: "reviews",
                relations: &["reviews"],
                modifier: None,
            },
            // Scopes the page to active rows unless the request already
            // widened visibility to trashed ones.
            IncludeOption {
                name: "active_only",
                relations: &[],
                modifier: Some(|select, params| {
                    if params.include_trashed {
                        select
                    } else {
                        select.filter(Column::Active.eq(true))
                    }
                }),
            },
        ]
    }
}

#[derive(Default)]
pub struct ProductOps;

#[async_trait]
impl ListOperations for ProductOps {
    type Resource = ProductResource;

    async fn load_relations(
        &self,
        db: &DatabaseConnection,
        mut items: Vec<Value>,
        relations: &[&'static str],
    ) -> Result<Vec<Value>, ApiError> {
        if !relations.contains(&"reviews") {
            return Ok(items);
        }
        for item in &mut items {
            let Some(id) = item.get("id").and_then(Value::as_i64) else {
                continue;
            };
            let reviews = review_entity::Entity::find()
                .filter(review_entity::Column::ProductId.eq(id as i32))
                .all(db)
                .await?;
            let reviews =
                serde_json::to_value(reviews).map_err(|e| ApiError::internal(Some(e.to_string())))?;
            if let Some(map) = item.as_object_mut() {
                map.insert("reviews".to_string(), reviews);
            }
        }
        Ok(items)
    }
}
