//! Per-entity description of a listable resource.
//!
//! [`ListResource`] is implemented once per entity, by hand. It tells the
//! query pipeline everything it needs: the table, the fillable column
//! allow-list, which columns may be sorted and searched, what the entity can
//! do (soft delete, status column), and which relations can be constrained or
//! included. Nothing is inferred from naming conventions; an entity that does
//! not declare a capability does not have it.

use sea_orm::{ColumnTrait, EntityTrait, IdenStatic, Iterable, Select};
use serde::Serialize;

use crate::models::FilterParams;

/// Column names tried, in order, when toggling status without an explicit
/// `status_column` declaration.
pub const STATUS_COLUMN_CANDIDATES: &[&str] = &["active", "status", "is_active", "enabled"];

/// What an entity supports beyond plain listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// Timestamp column used for soft deletes (`NULL` means live).
    pub soft_delete_column: Option<&'static str>,
    /// Explicit status column; when absent, [`STATUS_COLUMN_CANDIDATES`]
    /// are tried against the entity's columns.
    pub status_column: Option<&'static str>,
}

/// A relation the pipeline may constrain with an `EXISTS` subquery.
///
/// Describes a has-many child table carrying a foreign key back to this
/// resource's primary key.
#[derive(Debug, Clone, Copy)]
pub struct RelationTarget {
    /// Name used in the `relationships` request parameter.
    pub name: &'static str,
    /// Child table name.
    pub table: &'static str,
    /// Column on the child table referencing this resource's id.
    pub foreign_key: &'static str,
    /// Columns of the child table that request constraints may address.
    pub columns: &'static [&'static str],
}

/// An opt-in include a request may name in the `include` parameter.
///
/// The modifier runs during query assembly and may adjust the select (extra
/// ordering, join-based constraints); the actual relation loading happens in
/// [`ListOperations::load_relations`](crate::ListOperations::load_relations).
pub struct IncludeOption<R: ListResource + ?Sized> {
    /// Name matched against the `include` parameter.
    pub name: &'static str,
    /// Relation names this include loads, passed through to `load_relations`.
    pub relations: &'static [&'static str],
    /// Optional query adjustment applied when the include is requested.
    /// Receives the request so an include can narrow by its parameters.
    pub modifier: Option<fn(Select<R::EntityType>, &FilterParams) -> Select<R::EntityType>>,
}

impl<R: ListResource + ?Sized> std::fmt::Debug for IncludeOption<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeOption")
            .field("name", &self.name)
            .field("relations", &self.relations)
            .field("modifier", &self.modifier.is_some())
            .finish()
    }
}

/// Static description of an entity for the listing layer.
pub trait ListResource: Send + Sync
where
    <Self::EntityType as EntityTrait>::Model: Serialize + Send + Sync,
{
    type EntityType: EntityTrait<Column = Self::ColumnType> + Sync;
    type ColumnType: ColumnTrait + Copy;

    /// Singular name used in messages ("product not found").
    const RESOURCE_NAME: &'static str;
    /// Plural name used in list messages.
    const RESOURCE_NAME_PLURAL: &'static str;
    const TABLE_NAME: &'static str;
    const ID_COLUMN_NAME: &'static str = "id";
    /// Column driving date filters and the default sort order.
    const TIMESTAMP_COLUMN: &'static str = "created_at";

    /// Typed primary key column, used for `IN` filters and sort tiebreaking.
    fn id_column() -> Self::ColumnType;

    /// Typed column for the default sort; `None` falls back to the id column.
    fn timestamp_column() -> Option<Self::ColumnType> {
        Self::column_by_name(Self::TIMESTAMP_COLUMN)
    }

    /// Columns that request filters and ranges may address. Anything outside
    /// this list is silently ignored.
    fn fillable_columns() -> &'static [&'static str];

    /// Columns exposed for sorting, as `(request name, typed column)` pairs.
    fn sortable_columns() -> &'static [(&'static str, Self::ColumnType)];

    /// Columns free-text search scans when the request does not narrow them.
    /// Defaults to the whole fillable list; override to keep `LIKE` off
    /// non-text columns.
    fn searchable_columns() -> &'static [&'static str] {
        Self::fillable_columns()
    }

    fn capabilities() -> Capabilities {
        Capabilities::default()
    }

    fn relation_targets() -> &'static [RelationTarget] {
        &[]
    }

    fn include_options() -> Vec<IncludeOption<Self>> {
        Vec::new()
    }

    /// Look up a typed column by its snake_case name.
    fn column_by_name(name: &str) -> Option<Self::ColumnType> {
        Self::ColumnType::iter().find(|col| col.as_str() == name)
    }

    /// Whether the entity actually has a column with this name.
    fn has_column(name: &str) -> bool {
        Self::column_by_name(name).is_some()
    }

    /// Resolve the status column: the explicit declaration when present,
    /// otherwise the first candidate name the entity actually has.
    fn status_column() -> Option<&'static str> {
        if let Some(name) = Self::capabilities().status_column {
            return Self::has_column(name).then_some(name);
        }
        STATUS_COLUMN_CANDIDATES
            .iter()
            .copied()
            .find(|name| Self::has_column(name))
    }

    /// Resolve a requested include name against the declared options.
    fn find_include(name: &str) -> Option<IncludeOption<Self>> {
        Self::include_options()
            .into_iter()
            .find(|option| option.name == name)
    }
}
