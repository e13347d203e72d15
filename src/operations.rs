//! Operation orchestration.
//!
//! [`ListOperations`] is the seam embedding applications implement: pick a
//! resource, override whichever lifecycle hooks the endpoint needs, and the
//! provided operation bodies do the rest — sanitize, validate, assemble the
//! query, paginate, and wrap the result in the uniform envelope. A hook that
//! returns [`HookOutcome::Abort`] short-circuits the operation with its own
//! reply; errors travel as [`ApiError`] and become envelopes at the boundary.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    DatabaseConnection, EntityTrait, QueryFilter, Select, Value as DbValue,
    sea_query::{Alias, Expr, ExprTrait, SimpleExpr},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::ListConfig;
use crate::envelope::Reply;
use crate::errors::ApiError;
use crate::hooks::{HookOutcome, RecordAction};
use crate::models::{FilterParams, ListQueryParams};
use crate::pagination;
use crate::query;
use crate::resource::ListResource;
use crate::sanitize::parse_bool_str;
use crate::validation::RuleSet;

/// Entity type behind an operations implementation.
pub type ResourceEntity<O> = <<O as ListOperations>::Resource as ListResource>::EntityType;

/// Parse a path identifier: a positive integer or a UUID.
fn parse_id(raw: &str) -> Result<DbValue, ApiError> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        if n > 0 {
            return Ok(n.into());
        }
        return Err(ApiError::bad_request("invalid record identifier"));
    }
    if let Ok(uuid) = Uuid::parse_str(trimmed) {
        return Ok(uuid.into());
    }
    Err(ApiError::bad_request("invalid record identifier"))
}

fn id_filter<R: ListResource>(id: DbValue) -> SimpleExpr {
    Expr::col(Alias::new(R::ID_COLUMN_NAME)).eq(id)
}

fn model_to_value<M: serde::Serialize>(model: M) -> Result<Value, ApiError> {
    serde_json::to_value(model).map_err(|err| ApiError::internal(Some(err.to_string())))
}

/// Fetch one record as JSON, honoring soft-delete visibility.
async fn find_record<R: ListResource>(
    db: &DatabaseConnection,
    id: &DbValue,
    include_trashed: bool,
) -> Result<Option<Value>, ApiError> {
    let mut select = R::EntityType::find().filter(id_filter::<R>(id.clone()));
    if let Some(column) = R::capabilities().soft_delete_column {
        if !include_trashed {
            select = select.filter(Expr::col(Alias::new(column)).is_null());
        }
    }
    match select.one(db).await? {
        Some(model) => Ok(Some(model_to_value(model)?)),
        None => Ok(None),
    }
}

/// The value a status column moves to: the requested state when given, the
/// opposite of the current state otherwise. Booleans stay booleans, numbers
/// write 1/0, `active`/`inactive` strings stay strings. Anything else is
/// untoggleable.
fn next_status(current: &Value, desired: Option<bool>) -> Option<(DbValue, Value)> {
    match current {
        Value::Bool(b) => {
            let next = desired.unwrap_or(!b);
            Some((next.into(), Value::Bool(next)))
        }
        Value::Number(n) => n.as_i64().map(|v| {
            let next = i64::from(desired.unwrap_or(v == 0));
            (next.into(), json!(next))
        }),
        Value::String(s) => {
            let currently_active = s.eq_ignore_ascii_case("active");
            if !currently_active && !s.eq_ignore_ascii_case("inactive") {
                return None;
            }
            let next = if desired.unwrap_or(!currently_active) {
                "active"
            } else {
                "inactive"
            };
            Some((next.into(), json!(next)))
        }
        _ => None,
    }
}

/// Success message for a completed single-record operation.
fn action_message<R: ListResource>(action: RecordAction) -> String {
    format!("{} {} successfully", R::RESOURCE_NAME, action.past_tense())
}

/// Lifecycle hooks plus the orchestrated operations built on them.
#[async_trait]
pub trait ListOperations: Send + Sync {
    type Resource: ListResource + 'static;

    /// Rule set requests are validated against. Override to add caller rules
    /// on top of the base and resource-derived layers.
    fn rules(&self, config: &ListConfig) -> RuleSet {
        RuleSet::base(config).for_resource::<Self::Resource>()
    }

    /// Runs after base scoping and date bounds, before the request-derived
    /// stages. Narrow the select (tenancy, ownership) or abort outright.
    async fn before_list(
        &self,
        select: Select<ResourceEntity<Self>>,
        _params: &FilterParams,
    ) -> Result<HookOutcome<Select<ResourceEntity<Self>>>, ApiError> {
        Ok(HookOutcome::Proceed(select))
    }

    /// Runs on the loaded page before it is wrapped in the envelope.
    async fn after_page(
        &self,
        items: Vec<Value>,
        _params: &FilterParams,
    ) -> Result<HookOutcome<Vec<Value>>, ApiError> {
        Ok(HookOutcome::Proceed(items))
    }

    /// Runs before any single-record operation acts on a loaded record.
    async fn before_record(
        &self,
        _action: RecordAction,
        _record: &Value,
    ) -> Result<HookOutcome<()>, ApiError> {
        Ok(HookOutcome::Proceed(()))
    }

    /// Companion data for list responses (filter option lists, aggregates).
    async fn list_helpers(
        &self,
        _db: &DatabaseConnection,
        _params: &FilterParams,
    ) -> Result<Value, ApiError> {
        Ok(json!({}))
    }

    /// Companion data for the edit form (select options, related lookups).
    async fn edit_helpers(
        &self,
        _db: &DatabaseConnection,
        _record: &Value,
    ) -> Result<Value, ApiError> {
        Ok(json!({}))
    }

    /// Hydrate the named relations onto the page items. The default loads
    /// nothing; resources with includes override this with their own
    /// Sea-ORM relation loading.
    async fn load_relations(
        &self,
        _db: &DatabaseConnection,
        items: Vec<Value>,
        _relations: &[&'static str],
    ) -> Result<Vec<Value>, ApiError> {
        Ok(items)
    }

    /// The listing operation: sanitize, validate, assemble, paginate, wrap.
    async fn list(
        &self,
        db: &DatabaseConnection,
        raw: &ListQueryParams,
        config: &ListConfig,
    ) -> Result<Reply, ApiError> {
        let params = FilterParams::from_query(raw);
        self.rules(config).validate(&params)?;

        let select = query::prepare::<Self::Resource>(&params, config);
        let select = match self.before_list(select, &params).await? {
            HookOutcome::Proceed(select) => select,
            HookOutcome::Abort(reply) => return Ok(reply),
        };
        let (select, relations) = query::refine::<Self::Resource>(select, &params, config);

        let (models, meta) =
            pagination::fetch_page::<Self::Resource>(db, select, &params, config).await?;
        let mut items = Vec::with_capacity(models.len());
        for model in models {
            items.push(model_to_value(model)?);
        }
        let items = self.load_relations(db, items, &relations).await?;
        let items = match self.after_page(items, &params).await? {
            HookOutcome::Proceed(items) => items,
            HookOutcome::Abort(reply) => return Ok(reply),
        };

        let mut meta = model_to_value(meta)?;
        if let Some(map) = meta.as_object_mut() {
            map.insert("applied".to_string(), params.applied_echo());
            let includes: Vec<&str> = Self::Resource::include_options()
                .iter()
                .map(|option| option.name)
                .collect();
            map.insert("includes".to_string(), json!(includes));
        }
        let helpers = self.list_helpers(db, &params).await?;

        Ok(Reply::success(
            format!(
                "{} retrieved successfully",
                Self::Resource::RESOURCE_NAME_PLURAL
            ),
            json!({ "meta": meta, "helpers": helpers, "items": items }),
        ))
    }

    /// Retrieve one record by identifier. `include_trashed` widens the
    /// soft-delete scope for this request.
    async fn get_one(
        &self,
        db: &DatabaseConnection,
        id: &str,
        raw: &ListQueryParams,
        config: &ListConfig,
    ) -> Result<Reply, ApiError> {
        let key = parse_id(id)?;
        let params = FilterParams::from_query(raw);
        let widened = params.include_trashed || config.include_trashed_by_default;
        let record = find_record::<Self::Resource>(db, &key, widened)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(Self::Resource::RESOURCE_NAME, Some(id.to_string()))
            })?;
        if let HookOutcome::Abort(reply) =
            self.before_record(RecordAction::Retrieve, &record).await?
        {
            return Ok(reply);
        }
        Ok(Reply::success(
            action_message::<Self::Resource>(RecordAction::Retrieve),
            json!({ "record": record }),
        ))
    }

    /// Retrieve one record plus its edit-form helper data.
    async fn edit_data(
        &self,
        db: &DatabaseConnection,
        id: &str,
        raw: &ListQueryParams,
        config: &ListConfig,
    ) -> Result<Reply, ApiError> {
        let key = parse_id(id)?;
        let params = FilterParams::from_query(raw);
        let widened = params.include_trashed || config.include_trashed_by_default;
        let record = find_record::<Self::Resource>(db, &key, widened)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(Self::Resource::RESOURCE_NAME, Some(id.to_string()))
            })?;
        if let HookOutcome::Abort(reply) =
            self.before_record(RecordAction::EditData, &record).await?
        {
            return Ok(reply);
        }
        let helpers = self.edit_helpers(db, &record).await?;
        Ok(Reply::success(
            action_message::<Self::Resource>(RecordAction::EditData),
            json!({ "record": record, "helpers": helpers }),
        ))
    }

    /// Delete one record, softly when the entity supports it.
    ///
    /// Deleting an already-soft-deleted record succeeds without touching it
    /// (unless `force` is set), so repeated deletes are idempotent.
    async fn delete_one(
        &self,
        db: &DatabaseConnection,
        id: &str,
        raw: &ListQueryParams,
        config: &ListConfig,
    ) -> Result<Reply, ApiError> {
        let key = parse_id(id)?;
        let params = FilterParams::from_query(raw);
        let force = params.force || config.force_delete_by_default;
        let soft_column = Self::Resource::capabilities().soft_delete_column;

        let record = find_record::<Self::Resource>(db, &key, true)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(Self::Resource::RESOURCE_NAME, Some(id.to_string()))
            })?;

        if let Some(column) = soft_column {
            let already_trashed = record.get(column).is_some_and(|v| !v.is_null());
            if already_trashed && !force {
                return Ok(Reply::success(
                    format!("{} already deleted", Self::Resource::RESOURCE_NAME),
                    json!({ "record": record, "soft_deleted": true }),
                ));
            }
        }

        if let HookOutcome::Abort(reply) =
            self.before_record(RecordAction::Delete, &record).await?
        {
            return Ok(reply);
        }

        let soft = match soft_column {
            Some(column) if !force => {
                <ResourceEntity<Self>>::update_many()
                    .col_expr(Alias::new(column), SimpleExpr::Value(Utc::now().naive_utc().into()))
                    .filter(id_filter::<Self::Resource>(key))
                    .exec(db)
                    .await?;
                true
            }
            _ => {
                <ResourceEntity<Self>>::delete_many()
                    .filter(id_filter::<Self::Resource>(key))
                    .exec(db)
                    .await?;
                false
            }
        };

        // The reply carries the record as it was before the delete ran.
        Ok(Reply::success(
            action_message::<Self::Resource>(RecordAction::Delete),
            json!({ "record": record, "soft_deleted": soft }),
        ))
    }

    /// Move the record to the requested status, or flip it when no state is
    /// requested. Mechanism priority: an explicitly declared status column,
    /// then the soft-delete marker (trash/restore), then the recognized
    /// status column candidates.
    async fn toggle_status(
        &self,
        db: &DatabaseConnection,
        id: &str,
        raw: &ListQueryParams,
        config: &ListConfig,
    ) -> Result<Reply, ApiError> {
        let _ = config;
        let key = parse_id(id)?;
        let desired = raw.status.as_deref().map(parse_bool_str);
        let record = find_record::<Self::Resource>(db, &key, true)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(Self::Resource::RESOURCE_NAME, Some(id.to_string()))
            })?;
        if let HookOutcome::Abort(reply) = self
            .before_record(RecordAction::ToggleStatus, &record)
            .await?
        {
            return Ok(reply);
        }

        let caps = Self::Resource::capabilities();
        let explicit = caps
            .status_column
            .filter(|name| Self::Resource::has_column(name));
        if let Some(column) = explicit {
            return self
                .write_status_column(db, id, key, column, &record, desired)
                .await;
        }

        if let Some(column) = caps.soft_delete_column {
            let trashed = record.get(column).is_some_and(|v| !v.is_null());
            let activate = desired.unwrap_or(trashed);
            let expr = if activate {
                SimpleExpr::Value(DbValue::ChronoDateTime(None))
            } else {
                SimpleExpr::Value(Utc::now().naive_utc().into())
            };
            <ResourceEntity<Self>>::update_many()
                .col_expr(Alias::new(column), expr)
                .filter(id_filter::<Self::Resource>(key))
                .exec(db)
                .await?;
            return Ok(Reply::success(
                action_message::<Self::Resource>(RecordAction::ToggleStatus),
                json!({ "id": id, "active": activate }),
            ));
        }

        if let Some(column) = Self::Resource::status_column() {
            return self
                .write_status_column(db, id, key, column, &record, desired)
                .await;
        }

        Err(ApiError::config(format!(
            "{} has neither a status column nor soft deletes",
            Self::Resource::TABLE_NAME
        )))
    }

    /// Single-statement status column write shared by the explicit and
    /// candidate-column paths.
    async fn write_status_column(
        &self,
        db: &DatabaseConnection,
        id: &str,
        key: DbValue,
        column: &'static str,
        record: &Value,
        desired: Option<bool>,
    ) -> Result<Reply, ApiError> {
        let current = record.get(column).unwrap_or(&Value::Null);
        let Some((db_value, json_value)) = next_status(current, desired) else {
            return Err(ApiError::config(format!(
                "status column '{column}' on {} holds an untoggleable value",
                Self::Resource::TABLE_NAME
            )));
        };
        <ResourceEntity<Self>>::update_many()
            .col_expr(Alias::new(column), SimpleExpr::Value(db_value))
            .filter(id_filter::<Self::Resource>(key))
            .exec(db)
            .await?;
        let mut data = serde_json::Map::new();
        data.insert("id".to_string(), json!(id));
        data.insert(column.to_string(), json_value);
        Ok(Reply::success(
            action_message::<Self::Resource>(RecordAction::ToggleStatus),
            Value::Object(data),
        ))
    }
}

/// Hook-free operations for resources that need no customization.
pub struct DefaultListOperations<R: ListResource> {
    resource: std::marker::PhantomData<fn() -> R>,
}

impl<R: ListResource> Default for DefaultListOperations<R> {
    fn default() -> Self {
        Self {
            resource: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<R: ListResource + 'static> ListOperations for DefaultListOperations<R> {
    type Resource = R;
}
