//! Numeric range stage: the `ranges` map plus the price shorthands.

use sea_orm::{
    Condition,
    sea_query::{Alias, Expr, ExprTrait},
};
use serde_json::Value;

use super::to_db_value;
use crate::models::FilterParams;
use crate::resource::ListResource;
use crate::validation::is_valid_field_name;

/// Column the `min_price` / `max_price` / `price_range` shorthands address.
const PRICE_COLUMN: &str = "price";

fn bound(column: &str, key: &str, spec: &Value) -> Option<sea_orm::sea_query::SimpleExpr> {
    let value = spec.get(key)?;
    if !value.is_number() {
        return None;
    }
    let value = to_db_value(value)?;
    Some(match key {
        "min" => Expr::col(Alias::new(column)).gte(value),
        _ => Expr::col(Alias::new(column)).lte(value),
    })
}

/// Build the AND-group for every fillable range entry. The price shorthands
/// fold into a single pair of bounds, with the explicit `min_price` /
/// `max_price` parameters taking precedence over `price_range`.
pub fn condition<R: ListResource>(params: &FilterParams) -> Condition {
    let fillable = R::fillable_columns();
    let mut cond = Condition::all();

    for (key, spec) in &params.ranges {
        if !is_valid_field_name(key) || !fillable.contains(&key.as_str()) {
            tracing::debug!(column = %key, "ignoring range on non-fillable column");
            continue;
        }
        if let Some(expr) = bound(key, "min", spec) {
            cond = cond.add(expr);
        }
        if let Some(expr) = bound(key, "max", spec) {
            cond = cond.add(expr);
        }
    }

    if fillable.contains(&PRICE_COLUMN) {
        let range = params.price_range.unwrap_or_default();
        if let Some(min) = params.min_price.or(range.min) {
            cond = cond.add(Expr::col(Alias::new(PRICE_COLUMN)).gte(min));
        }
        if let Some(max) = params.max_price.or(range.max) {
            cond = cond.add(Expr::col(Alias::new(PRICE_COLUMN)).lte(max));
        }
    }

    cond
}
