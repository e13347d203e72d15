//! Generic Axum handlers and router wiring.
//!
//! Every handler funnels into the same shape: run the operation, turn an
//! error into its envelope, then apply the config-gated envelope options
//! (response code echo, masked request echo) uniformly on the way out.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ListConfig;
use crate::models::{FilterParams, ListQueryParams};
use crate::operations::ListOperations;

/// Shared handler state: one connection, one config, one operations value.
pub struct ListState<O: ListOperations> {
    pub db: DatabaseConnection,
    pub config: ListConfig,
    pub ops: Arc<O>,
}

impl<O: ListOperations> Clone for ListState<O> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            config: self.config.clone(),
            ops: Arc::clone(&self.ops),
        }
    }
}

/// Build the standard route set for one resource:
///
/// - `GET    /`                   — paginated, filtered listing
/// - `GET    /{id}`               — single record
/// - `GET    /{id}/edit`          — record plus edit helpers
/// - `DELETE /{id}`               — delete (soft when supported)
/// - `PATCH  /{id}/toggle-status` — status flip
pub fn router<O: ListOperations + 'static>(
    ops: O,
    db: DatabaseConnection,
    config: ListConfig,
) -> Router {
    let state = ListState {
        db,
        config,
        ops: Arc::new(ops),
    };
    Router::new()
        .route("/", get(list::<O>))
        .route("/{id}", get(get_one::<O>).delete(delete_one::<O>))
        .route("/{id}/edit", get(edit_data::<O>))
        .route("/{id}/toggle-status", patch(toggle_status::<O>))
        .with_state(state)
}

/// Sanitized echo of the request for failure envelopes.
fn request_echo(raw: &ListQueryParams) -> Option<Value> {
    serde_json::to_value(FilterParams::from_query(raw)).ok()
}

fn finish<O: ListOperations>(
    state: &ListState<O>,
    result: Result<crate::envelope::Reply, crate::errors::ApiError>,
    echo: Option<Value>,
) -> Response {
    let reply = match result {
        Ok(reply) => reply,
        Err(err) => err.into_reply(),
    };
    reply
        .with_options(&state.config, echo.as_ref())
        .into_response()
}

pub async fn list<O: ListOperations + 'static>(
    State(state): State<ListState<O>>,
    Query(raw): Query<ListQueryParams>,
) -> Response {
    let echo = request_echo(&raw);
    let result = state.ops.list(&state.db, &raw, &state.config).await;
    finish(&state, result, echo)
}

pub async fn get_one<O: ListOperations + 'static>(
    State(state): State<ListState<O>>,
    Path(id): Path<String>,
    Query(raw): Query<ListQueryParams>,
) -> Response {
    let result = state.ops.get_one(&state.db, &id, &raw, &state.config).await;
    finish(&state, result, None)
}

pub async fn edit_data<O: ListOperations + 'static>(
    State(state): State<ListState<O>>,
    Path(id): Path<String>,
    Query(raw): Query<ListQueryParams>,
) -> Response {
    let result = state
        .ops
        .edit_data(&state.db, &id, &raw, &state.config)
        .await;
    finish(&state, result, None)
}

pub async fn delete_one<O: ListOperations + 'static>(
    State(state): State<ListState<O>>,
    Path(id): Path<String>,
    Query(raw): Query<ListQueryParams>,
) -> Response {
    let result = state
        .ops
        .delete_one(&state.db, &id, &raw, &state.config)
        .await;
    finish(&state, result, None)
}

pub async fn toggle_status<O: ListOperations + 'static>(
    State(state): State<ListState<O>>,
    Path(id): Path<String>,
    Query(raw): Query<ListQueryParams>,
) -> Response {
    let result = state
        .ops
        .toggle_status(&state.db, &id, &raw, &state.config)
        .await;
    finish(&state, result, None)
}
