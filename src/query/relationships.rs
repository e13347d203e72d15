//! Relationship constraint stage.
//!
//! Each entry in the `relationships` map becomes a correlated `EXISTS`
//! subquery against a declared [`RelationTarget`](crate::RelationTarget).
//! Unknown relation names and undeclared child columns are ignored; the
//! parent row set only ever narrows.

use sea_orm::{
    Condition,
    sea_query::{Alias, Expr, ExprTrait, Query},
};
use serde_json::Value;

use super::to_db_value;
use crate::models::FilterParams;
use crate::resource::{ListResource, RelationTarget};
use crate::sanitize::parse_bool;
use crate::validation::is_valid_field_name;

fn exists_expr<R: ListResource>(
    target: &RelationTarget,
    constraints: &Value,
) -> sea_orm::sea_query::SimpleExpr {
    let child = || Alias::new(target.table);
    let mut sub = Query::select();
    sub.expr(Expr::val(1)).from(child()).and_where(
        Expr::col((child(), Alias::new(target.foreign_key)))
            .equals((Alias::new(R::TABLE_NAME), Alias::new(R::ID_COLUMN_NAME))),
    );

    if let Value::Object(map) = constraints {
        for (column, value) in map {
            if !is_valid_field_name(column) || !target.columns.contains(&column.as_str()) {
                tracing::debug!(
                    relation = %target.name,
                    column = %column,
                    "ignoring constraint on undeclared relation column"
                );
                continue;
            }
            if let Some(bound) = to_db_value(value) {
                sub.and_where(Expr::col((child(), Alias::new(column.as_str()))).eq(bound));
            }
        }
    }

    Expr::exists(sub)
}

/// Build the AND-group of `EXISTS` constraints.
///
/// A constraint value of `true` (or any non-object) asserts bare existence;
/// an object adds column conditions inside the subquery. A `false` value
/// negates: the parent must have no matching child rows.
pub fn condition<R: ListResource>(params: &FilterParams) -> Condition {
    let mut cond = Condition::all();
    for (name, constraints) in &params.relationships {
        let Some(target) = R::relation_targets().iter().find(|t| t.name == name.as_str())
        else {
            tracing::debug!(relation = %name, "ignoring undeclared relation constraint");
            continue;
        };
        let exists = exists_expr::<R>(target, constraints);
        if constraints.is_boolean() && !parse_bool(constraints) {
            cond = cond.add(exists.not());
        } else {
            cond = cond.add(exists);
        }
    }
    cond
}
