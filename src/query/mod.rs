//! Query assembly.
//!
//! Each stage module turns one slice of the request into a Sea-ORM
//! [`Condition`](sea_orm::Condition) or select transformation; the
//! [`pipeline`] module composes them in a fixed order so the same request
//! always produces the same SQL. Column names arriving from the request are
//! only used after passing the fillable allow-list and the field-name shape
//! check; values are always bound, never spliced.

pub mod columns;
pub mod dates;
pub mod includes;
pub mod pipeline;
pub mod ranges;
pub mod relationships;
pub mod search;
pub mod sort;

pub use pipeline::{prepare, refine};
pub use search::escape_like_wildcards;

use sea_orm::Value as DbValue;
use serde_json::Value;

/// Convert a JSON leaf into a bindable database value.
pub(crate) fn to_db_value(value: &Value) -> Option<DbValue> {
    match value {
        Value::Bool(b) => Some((*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.into())
            } else {
                n.as_f64().map(Into::into)
            }
        }
        Value::String(s) => Some(s.clone().into()),
        _ => None,
    }
}
