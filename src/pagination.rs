//! Pagination and page metadata.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::ListConfig;
use crate::models::FilterParams;
use crate::resource::ListResource;

/// Page bookkeeping returned alongside every list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
    /// 1-based index of the first item on this page; `null` when empty.
    pub from: Option<u64>,
    /// 1-based index of the last item on this page; `null` when empty.
    pub to: Option<u64>,
}

/// Requested page, defaulting to the first.
#[must_use]
pub fn effective_page(params: &FilterParams) -> u64 {
    params.page.unwrap_or(1).max(1)
}

/// Requested page size, defaulted and clamped — never rejected here.
/// Validation only bounds the far-out values; anything between the effective
/// maximum and the hard cap lands on `max_per_page`.
#[must_use]
pub fn effective_per_page(params: &FilterParams, config: &ListConfig) -> u64 {
    params
        .per_page
        .unwrap_or(config.default_per_page)
        .clamp(1, config.max_per_page)
}

/// Count the filtered set and fetch the requested page.
///
/// # Errors
///
/// Propagates database errors from the count and fetch queries.
pub async fn fetch_page<R: ListResource>(
    db: &DatabaseConnection,
    select: Select<R::EntityType>,
    params: &FilterParams,
    config: &ListConfig,
) -> Result<(Vec<<R::EntityType as EntityTrait>::Model>, PageMeta), DbErr> {
    let page = effective_page(params);
    let per_page = effective_per_page(params, config);

    let paginator = select.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    let from = if items.is_empty() {
        None
    } else {
        Some((page - 1) * per_page + 1)
    };
    let to = from.map(|f| f + items.len() as u64 - 1);

    let meta = PageMeta {
        page,
        per_page,
        total: totals.number_of_items,
        last_page: totals.number_of_pages.max(1),
        from,
        to,
    };
    Ok((items, meta))
}
