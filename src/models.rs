//! Request parameter models.
//!
//! Two views of the same request: [`ListQueryParams`] is the HTTP query-string
//! shape, where collection-valued parameters travel as JSON-encoded strings
//! (the only form a flat query string can carry reliably); [`FilterParams`]
//! is the canonical shape the pipeline consumes — sanitized, coerced, and
//! capped. Conversion between the two is where the sanitization layer runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::{IntoParams, ToSchema};

use crate::sanitize::{
    self, MAX_NAME_ITEMS, MAX_SEARCH_COLUMN_ITEMS, MAX_SORT_ITEMS, normalize_direction_array,
    normalize_id_array, normalize_string_array, parse_bool_str, sanitize_payload,
};
use crate::validation::is_valid_field_name;

/// Query parameters for list endpoints.
///
/// Collection parameters (`filters`, `ranges`, `relationships`, `ids`,
/// `names`, `sort_columns`, `sort_directions`, `search_columns`,
/// `price_range`) are JSON-encoded strings, for example:
///
/// ```text
/// GET /products?filters={"category_id":3}&ranges={"price":{"min":10,"max":20}}
/// ```
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQueryParams {
    /// Page number (1-based).
    #[param(example = 1)]
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub page: Option<u64>,
    /// Items per page; clamped to the configured maximum.
    #[param(example = 10)]
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub per_page: Option<u64>,
    /// Legacy sort: either a plain column name or `["column", "ASC"]`.
    #[param(example = r#"["name", "ASC"]"#)]
    pub sort: Option<String>,
    /// Sort column (standard REST form, used with `order`).
    pub sort_by: Option<String>,
    /// Sort direction for `sort_by` (`ASC` or `DESC`).
    pub order: Option<String>,
    /// JSON array of sort columns for multi-column sorting.
    #[param(example = r#"["price", "name"]"#)]
    pub sort_columns: Option<String>,
    /// JSON array of directions aligned with `sort_columns`.
    #[param(example = r#"["DESC", "ASC"]"#)]
    pub sort_directions: Option<String>,
    /// Lower bound on the timestamp column (date or RFC 3339).
    pub date_from: Option<String>,
    /// Upper bound on the timestamp column (date or RFC 3339).
    pub date_to: Option<String>,
    /// Restrict to rows created today.
    pub created_today: Option<String>,
    /// Restrict to rows created this ISO week.
    pub created_this_week: Option<String>,
    /// Restrict to rows created this calendar month.
    pub created_this_month: Option<String>,
    /// Restrict to rows created this calendar year.
    pub created_this_year: Option<String>,
    /// Free-text search term.
    pub q: Option<String>,
    /// JSON array restricting which columns `q` searches.
    pub search_columns: Option<String>,
    /// JSON object of column → value filters (exact or prefix match).
    #[param(example = r#"{"category_id": 3, "name": "lap"}"#)]
    pub filters: Option<String>,
    /// JSON object of column → `{min, max}` range constraints.
    #[param(example = r#"{"price": {"min": 10, "max": 20}}"#)]
    pub ranges: Option<String>,
    /// JSON object of relation name → column/value existence constraints.
    #[param(example = r#"{"reviews": {"approved": true}}"#)]
    pub relationships: Option<String>,
    /// Comma-separated include names resolved against the resource's
    /// include options.
    #[param(example = "reviews,category")]
    pub include: Option<String>,
    /// JSON array of record identifiers.
    pub ids: Option<String>,
    /// JSON array of names for prefix matching.
    pub names: Option<String>,
    /// Lower price bound.
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub min_price: Option<f64>,
    /// Upper price bound.
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max_price: Option<f64>,
    /// JSON `{min, max}` object; non-numeric keys are dropped.
    pub price_range: Option<String>,
    /// Include soft-deleted rows.
    pub include_trashed: Option<String>,
    /// Permanently delete instead of soft delete.
    pub force: Option<String>,
    /// Desired state for status toggling; absent means flip.
    pub status: Option<String>,
    /// Any remaining query parameters. Well-formed names are treated as
    /// column filters; the pipeline ignores the non-fillable ones.
    #[serde(flatten)]
    #[param(ignore)]
    pub extra: BTreeMap<String, String>,
}

/// A numeric `{min, max}` pair; either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The canonical, sanitized filter request the pipeline consumes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub sort_columns: Vec<String>,
    pub sort_directions: Vec<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub created_today: bool,
    pub created_this_week: bool,
    pub created_this_month: bool,
    pub created_this_year: bool,
    pub q: Option<String>,
    pub search_columns: Vec<String>,
    pub filters: Map<String, Value>,
    pub ranges: Map<String, Value>,
    pub relationships: Map<String, Value>,
    pub include: Vec<String>,
    pub ids: Vec<Value>,
    pub names: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub price_range: Option<PriceRange>,
    pub include_trashed: bool,
    pub force: bool,
}

impl FilterParams {
    /// Convert the HTTP query view into the canonical view: parse the
    /// JSON-blob parameters, run the sanitizer over everything, then coerce
    /// and cap each collection.
    #[must_use]
    pub fn from_query(raw: &ListQueryParams) -> Self {
        let mut params = Self {
            page: raw.page,
            per_page: raw.per_page,
            sort_by: raw.sort_by.as_deref().map(sanitize::sanitize_string),
            order: raw.order.as_deref().map(sanitize::sanitize_string),
            date_from: raw.date_from.as_deref().map(sanitize::sanitize_string),
            date_to: raw.date_to.as_deref().map(sanitize::sanitize_string),
            created_today: raw.created_today.as_deref().is_some_and(parse_bool_str),
            created_this_week: raw.created_this_week.as_deref().is_some_and(parse_bool_str),
            created_this_month: raw
                .created_this_month
                .as_deref()
                .is_some_and(parse_bool_str),
            created_this_year: raw.created_this_year.as_deref().is_some_and(parse_bool_str),
            q: raw
                .q
                .as_deref()
                .map(sanitize::sanitize_string)
                .filter(|s| !s.is_empty()),
            min_price: raw.min_price,
            max_price: raw.max_price,
            include_trashed: raw.include_trashed.as_deref().is_some_and(parse_bool_str),
            force: raw.force.as_deref().is_some_and(parse_bool_str),
            ..Self::default()
        };

        // Legacy single-sort forms: `sort=["name","ASC"]` or `sort=name`.
        if params.sort_by.is_none() {
            if let Some(sort) = raw.sort.as_deref() {
                let (column, direction) = parse_legacy_sort(sort);
                if let Some(column) = column {
                    params.sort_by = Some(column);
                    if params.order.is_none() {
                        params.order = direction;
                    }
                }
            }
        }

        params.sort_columns = sanitized_string_array(raw.sort_columns.as_deref(), MAX_SORT_ITEMS);
        params.sort_directions = {
            let mut value = parse_json_array(raw.sort_directions.as_deref());
            sanitize_payload(&mut value);
            value
                .as_array()
                .map(|items| normalize_direction_array(items))
                .unwrap_or_default()
        };
        params.search_columns =
            sanitized_string_array(raw.search_columns.as_deref(), MAX_SEARCH_COLUMN_ITEMS);
        params.names = sanitized_string_array(raw.names.as_deref(), MAX_NAME_ITEMS);
        params.ids = {
            let mut value = parse_json_array(raw.ids.as_deref());
            sanitize_payload(&mut value);
            value
                .as_array()
                .map(|items| normalize_id_array(items))
                .unwrap_or_default()
        };

        params.filters = sanitized_object(raw.filters.as_deref());
        // Leftover query parameters act as top-level column filters; an
        // explicit `filters` entry wins over its top-level twin.
        for (key, value) in &raw.extra {
            if !is_valid_field_name(key) {
                tracing::debug!(column = %key, "ignoring query parameter with invalid name");
                continue;
            }
            if !params.filters.contains_key(key) {
                params.filters.insert(key.clone(), coerce_query_scalar(value));
            }
        }
        params.ranges = sanitized_object(raw.ranges.as_deref());
        params.relationships = sanitized_object(raw.relationships.as_deref());

        params.include = raw
            .include
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        params.price_range = raw.price_range.as_deref().and_then(parse_price_range);

        params
    }

    /// The subset of applied parameters echoed back in list metadata.
    #[must_use]
    pub fn applied_echo(&self) -> Value {
        json!({
            "page": self.page,
            "per_page": self.per_page,
            "sort_by": self.sort_by,
            "order": self.order,
            "sort_columns": self.sort_columns,
            "sort_directions": self.sort_directions,
            "q": self.q,
            "date_from": self.date_from,
            "date_to": self.date_to,
            "filters": self.filters,
            "ranges": self.ranges,
            "include": self.include,
        })
    }
}

/// Deserialize an optional integer that may arrive as a string. Query-string
/// values lose their type once the struct carries a flattened catch-all map,
/// so numeric fields parse themselves.
fn de_opt_u64<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

fn de_opt_f64<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).filter(|f: &f64| f.is_finite()))
}

/// Coerce a bare query-string value: integers and floats become numbers,
/// `true`/`false` become booleans, anything else is a sanitized string.
fn coerce_query_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(sanitize::sanitize_string(trimmed)),
    }
}

/// Parse a legacy `sort` parameter: JSON pair or bare column name.
fn parse_legacy_sort(sort: &str) -> (Option<String>, Option<String>) {
    let trimmed = sort.trim();
    if trimmed.is_empty() {
        return (None, None);
    }
    if trimmed.starts_with('[') {
        let parsed: Vec<String> = serde_json::from_str(trimmed).unwrap_or_default();
        return (parsed.first().cloned(), parsed.get(1).cloned());
    }
    (Some(sanitize::sanitize_string(trimmed)), None)
}

/// Parse a JSON-array query blob; invalid JSON becomes an empty array.
fn parse_json_array(raw: Option<&str>) -> Value {
    raw.map_or_else(
        || Value::Array(Vec::new()),
        |blob| match serde_json::from_str::<Value>(blob) {
            Ok(Value::Array(items)) => Value::Array(items),
            Ok(_) | Err(_) => {
                tracing::debug!(blob, "ignoring malformed JSON array parameter");
                Value::Array(Vec::new())
            }
        },
    )
}

/// Parse a JSON-object query blob; invalid JSON becomes an empty object.
fn parse_json_object(raw: Option<&str>) -> Map<String, Value> {
    raw.map_or_else(Map::new, |blob| {
        match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::debug!(blob, "ignoring malformed JSON object parameter");
                Map::new()
            }
        }
    })
}

fn sanitized_string_array(raw: Option<&str>, cap: usize) -> Vec<String> {
    let mut value = parse_json_array(raw);
    sanitize_payload(&mut value);
    value
        .as_array()
        .map(|items| normalize_string_array(items, cap))
        .unwrap_or_default()
}

fn sanitized_object(raw: Option<&str>) -> Map<String, Value> {
    let mut value = Value::Object(parse_json_object(raw));
    sanitize_payload(&mut value);
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Keep only the numeric `min`/`max` keys of a `price_range` object.
fn parse_price_range(raw: &str) -> Option<PriceRange> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let map = parsed.as_object()?;
    let range = PriceRange {
        min: map.get("min").and_then(Value::as_f64),
        max: map.get("max").and_then(Value::as_f64),
    };
    if range.min.is_none() && range.max.is_none() {
        None
    } else {
        Some(range)
    }
}
