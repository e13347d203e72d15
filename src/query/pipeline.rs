//! Stage composition.
//!
//! Assembly happens in two halves so orchestration can run the caller's
//! pre-filter hook in between: [`prepare`] scopes the base select (soft
//! delete visibility, date bounds), [`refine`] layers on everything derived
//! from the request (column filters, ranges, relationship constraints,
//! search, includes, ordering). Given the same request and config, the
//! composed query is always the same.

use sea_orm::{
    EntityTrait, QueryFilter, Select,
    sea_query::{Alias, Expr, ExprTrait},
};

use super::{columns, dates, includes, ranges, relationships, search, sort};
use crate::config::ListConfig;
use crate::models::FilterParams;
use crate::resource::ListResource;

/// Scoped base select: soft-deleted rows are hidden unless the request or
/// config opts in, and date bounds apply before anything else.
pub fn prepare<R: ListResource>(
    params: &FilterParams,
    config: &ListConfig,
) -> Select<R::EntityType> {
    let mut select = R::EntityType::find();
    if let Some(column) = R::capabilities().soft_delete_column {
        if !(params.include_trashed || config.include_trashed_by_default) {
            select = select.filter(Expr::col(Alias::new(column)).is_null());
        }
    }
    select.filter(dates::condition::<R>(params))
}

/// Apply the request-derived stages and final ordering. Returns the refined
/// select plus the relation names the post-load step should hydrate.
pub fn refine<R: ListResource>(
    select: Select<R::EntityType>,
    params: &FilterParams,
    config: &ListConfig,
) -> (Select<R::EntityType>, Vec<&'static str>) {
    let select = select
        .filter(columns::condition::<R>(params))
        .filter(ranges::condition::<R>(params))
        .filter(relationships::condition::<R>(params))
        .filter(search::condition::<R>(params));
    let (select, relations) = includes::apply::<R>(select, params);
    (sort::apply::<R>(select, params, config), relations)
}
