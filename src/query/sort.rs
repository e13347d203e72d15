//! Ordering stage.
//!
//! One explicit sort request replaces the default order entirely; the
//! resource's typed `sortable_columns` table is the only way a request name
//! reaches the query, so unknown names simply fall through. The id column is
//! always appended as a final tiebreaker to keep page boundaries stable.

use sea_orm::{Order, QueryOrder, Select};

use crate::config::ListConfig;
use crate::models::FilterParams;
use crate::resource::ListResource;

fn parse_order(direction: &str) -> Order {
    if direction.eq_ignore_ascii_case("asc") {
        Order::Asc
    } else {
        Order::Desc
    }
}

fn find_sortable<R: ListResource>(name: &str) -> Option<R::ColumnType> {
    R::sortable_columns()
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, column)| *column)
}

pub fn apply<R: ListResource>(
    mut select: Select<R::EntityType>,
    params: &FilterParams,
    config: &ListConfig,
) -> Select<R::EntityType> {
    let mut applied = false;

    if params.sort_columns.is_empty() {
        if let Some(name) = params.sort_by.as_deref() {
            if let Some(column) = find_sortable::<R>(name) {
                let direction = params
                    .order
                    .as_deref()
                    .unwrap_or(&config.default_sort_direction);
                select = select.order_by(column, parse_order(direction));
                applied = true;
            } else {
                tracing::debug!(column = %name, "ignoring sort on non-sortable column");
            }
        }
    } else {
        for (index, name) in params.sort_columns.iter().enumerate() {
            let Some(column) = find_sortable::<R>(name) else {
                tracing::debug!(column = %name, "ignoring sort on non-sortable column");
                continue;
            };
            // Directions shorter than the column list pad out with ASC.
            let direction = params
                .sort_directions
                .get(index)
                .map_or(Order::Asc, |d| parse_order(d));
            select = select.order_by(column, direction);
            applied = true;
        }
    }

    if !applied {
        let column = R::timestamp_column().unwrap_or_else(R::id_column);
        select = select.order_by(column, parse_order(&config.default_sort_direction));
    }

    select.order_by(R::id_column(), Order::Asc)
}
