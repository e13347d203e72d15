//! Column filter stage: the `filters` map plus the `ids` and `names` lists.

use sea_orm::{
    Condition, Value as DbValue,
    sea_query::{Alias, Expr, ExprTrait, Func, LikeExpr, SimpleExpr},
};
use serde_json::Value;
use uuid::Uuid;

use super::search::escape_like_wildcards;
use super::to_db_value;
use crate::models::FilterParams;
use crate::resource::ListResource;
use crate::validation::is_valid_field_name;

/// Column names that always match exactly even though their values are
/// strings. Identifier-ish columns where a prefix match would be wrong.
const EXACT_MATCH_COLUMNS: &[&str] = &["email", "url", "slug", "uuid"];

fn is_exact_match_column<R: ListResource>(name: &str) -> bool {
    name == R::ID_COLUMN_NAME
        || name.ends_with("_id")
        || EXACT_MATCH_COLUMNS.contains(&name)
}

/// Case-insensitive prefix match, with the escape character declared so the
/// wildcard escaping holds on SQLite as well.
fn prefix_expr(column: &str, value: &str) -> SimpleExpr {
    let escaped = escape_like_wildcards(value);
    SimpleExpr::FunctionCall(Func::upper(Expr::col(Alias::new(column))))
        .like(LikeExpr::new(format!("{}%", escaped.to_uppercase())).escape('\\'))
}

/// One filter entry. Identifier columns and non-string values match exactly;
/// other strings prefix-match. Empty strings constrain nothing.
fn filter_expr<R: ListResource>(column: &str, value: &Value) -> Option<SimpleExpr> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if is_exact_match_column::<R>(column) {
                // UUID-shaped values bind as UUIDs so binary-stored keys match.
                if let Ok(uuid) = Uuid::parse_str(trimmed) {
                    return Some(Expr::col(Alias::new(column)).eq(uuid));
                }
                return Some(Expr::col(Alias::new(column)).eq(trimmed));
            }
            Some(prefix_expr(column, trimmed))
        }
        Value::Number(_) | Value::Bool(_) => {
            to_db_value(value).map(|v| Expr::col(Alias::new(column)).eq(v))
        }
        _ => None,
    }
}

/// Build the AND-group for the `filters` map, `ids` list, and `names` list.
/// Keys outside the fillable allow-list are ignored, not rejected.
pub fn condition<R: ListResource>(params: &FilterParams) -> Condition {
    let fillable = R::fillable_columns();
    let mut cond = Condition::all();

    for (key, value) in &params.filters {
        if !is_valid_field_name(key) || !fillable.contains(&key.as_str()) {
            tracing::debug!(column = %key, "ignoring filter on non-fillable column");
            continue;
        }
        if let Some(expr) = filter_expr::<R>(key, value) {
            cond = cond.add(expr);
        }
    }

    if !params.ids.is_empty() {
        let values: Vec<DbValue> = params
            .ids
            .iter()
            .filter_map(|id| match id {
                Value::Number(n) => n.as_i64().map(Into::into),
                Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Into::into),
                _ => None,
            })
            .collect();
        if !values.is_empty() {
            cond = cond.add(Expr::col(Alias::new(R::ID_COLUMN_NAME)).is_in(values));
        }
    }

    if !params.names.is_empty() && fillable.contains(&"name") {
        let mut group = Condition::any();
        for name in &params.names {
            group = group.add(prefix_expr("name", name));
        }
        cond = cond.add(group);
    }

    cond
}
