//! # crudlist
//!
//! Query-building and response-shaping helpers for CRUD-style list endpoints
//! built on Axum and Sea-ORM.
//!
//! The centrepiece is the listing pipeline: one operation that takes an
//! HTTP-style request describing pagination, sorting, date ranges, free-text
//! search, column filters, numeric ranges, relationship constraints and
//! opt-in relationship includes, and turns it into a correctly ordered,
//! safely parameterized Sea-ORM query returning a paginated, envelope-shaped
//! result.
//!
//! ## Overview
//!
//! - [`ListResource`] describes an entity to the layer: its table, fillable
//!   column allow-list, capabilities (soft delete, status column), relation
//!   targets and include options. Implemented once per entity, by hand — no
//!   reflection, no naming conventions.
//! - [`ListOperations`] orchestrates the operations (`list`, `get_one`,
//!   `edit_data`, `delete_one`, `toggle_status`) with overridable lifecycle
//!   hooks and sensible defaults.
//! - [`FilterParams`] is the sanitized, normalized request; validation runs
//!   against a [`RuleSet`](validation::RuleSet) assembled from global
//!   defaults, entity-derived rules and caller extras.
//! - Every operation answers through the uniform
//!   [`ApiResponse`](envelope::ApiResponse) envelope:
//!   `{status, message, data, errors}`.
//!
//! ## Query parameter examples
//!
//! ```rust,ignore
//! // Column filters (exact for identifiers, prefix match for text)
//! GET /products?filters={"category_id":3,"name":"lap"}
//!
//! // Ranges and free-text search
//! GET /products?ranges={"price":{"min":10,"max":20}}&q=laptop
//!
//! // Relationship existence constraints
//! GET /products?relationships={"reviews":{"approved":true}}
//!
//! // Multi-column sort and includes
//! GET /products?sort_columns=["price","name"]&sort_directions=["DESC","ASC"]&include=reviews
//! ```

pub mod config;
pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod hooks;
pub mod models;
pub mod operations;
pub mod pagination;
pub mod query;
pub mod resource;
pub mod sanitize;
pub mod validation;

pub use config::ListConfig;
pub use envelope::{ApiResponse, Reply};
pub use errors::ApiError;
pub use handlers::{ListState, router};
pub use hooks::{HookOutcome, RecordAction};
pub use models::{FilterParams, ListQueryParams, PriceRange};
pub use operations::{DefaultListOperations, ListOperations};
pub use pagination::PageMeta;
pub use resource::{Capabilities, IncludeOption, ListResource, RelationTarget};
pub use validation::{Rule, RuleSet, ValidationErrors};
