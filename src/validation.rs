//! Request validation.
//!
//! A [`RuleSet`] is assembled per request from three layers: the base rules
//! every list endpoint shares (pagination bounds, sort directions, date and
//! price shapes), rules derived from the resource's fillable columns, and any
//! caller extras. Validation runs after sanitization and before any query is
//! built; it either passes or produces a complete [`ValidationErrors`] value
//! covering every failed field at once.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::config::ListConfig;
use crate::envelope::Reply;
use crate::models::FilterParams;
use crate::resource::ListResource;

/// Longest free-text search term accepted.
pub const MAX_SEARCH_LENGTH: usize = 255;
/// Longest filter value accepted.
pub const MAX_FILTER_VALUE_LENGTH: usize = 255;
/// Longest column or relation name accepted.
pub const MAX_FIELD_NAME_LENGTH: usize = 64;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Every failure found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// First failure plus a count of the rest, for the envelope message.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.errors.as_slice() {
            [] => "validation failed".to_string(),
            [only] => only.message.clone(),
            [first, rest @ ..] => {
                format!("{} (and {} more problem(s))", first.message, rest.len())
            }
        }
    }

    /// Field → message-list map, the shape the envelope's `errors` key uses.
    #[must_use]
    pub fn error_map(&self) -> Value {
        let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field.as_str())
                .or_default()
                .push(error.message.as_str());
        }
        json!(map)
    }

    /// Convert into a 422 envelope.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        let summary = self.summary();
        let map = self.error_map();
        Reply::failure(axum::http::StatusCode::UNPROCESSABLE_ENTITY, summary, Some(map))
    }
}

/// A column or relation name that is safe to splice into a query as an
/// identifier: ASCII alphanumerics and underscores, not empty, bounded.
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FIELD_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True when the value carries none of the common SQL metacharacter fragments.
/// The pipeline only ever binds values as parameters, so this is a
/// defense-in-depth reject of clearly hostile input, not the safety boundary.
#[must_use]
pub fn no_sql_injection(value: &str) -> bool {
    let lowered = value.to_lowercase();
    const MARKERS: &[&str] = &[
        "--", ";", "/*", "*/", "union select", "drop table", "drop database", "xp_", "0x",
        "information_schema", "' or '", "\" or \"", "'='", "or 1=1",
    ];
    !MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// True when the value carries no markup-injection markers.
#[must_use]
pub fn no_xss(value: &str) -> bool {
    let lowered = value.to_lowercase();
    const MARKERS: &[&str] = &["<script", "javascript:", "onerror=", "onload=", "<iframe"];
    !MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// True when the value cannot climb out of a path, including via
/// percent-encoded dot segments or an embedded NUL.
#[must_use]
pub fn no_path_traversal(value: &str) -> bool {
    let lowered = value.to_lowercase();
    const MARKERS: &[&str] = &[
        "../", "..\\", "%2e%2e%2f", "%2e%2e%5c", "%2e%2e/", "%2e%2e\\", "..%2f", "..%5c", "%00",
    ];
    !value.contains('\0') && !MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn is_safe_text(value: &str) -> bool {
    no_sql_injection(value) && no_xss(value) && no_path_traversal(value)
}

/// One declarative check against a named field of the serialized request.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// String value, at most this many characters.
    MaxLength(usize),
    /// Unsigned integer within the inclusive range.
    IntRange { min: u64, max: u64 },
    /// Numeric value, at least this much.
    NumericMin(f64),
    /// `ASC` or `DESC`, case-insensitive.
    Direction,
    /// Calendar date or RFC 3339 timestamp.
    Date,
    /// Passes all three security predicates. Applies to strings and to every
    /// string element of an array.
    SafeText,
}

impl Rule {
    fn apply(self, field: &str, value: &Value, errors: &mut ValidationErrors) {
        match self {
            Self::MaxLength(max) => {
                if let Some(s) = value.as_str() {
                    if s.chars().count() > max {
                        errors.add(field, format!("{field} must not exceed {max} characters"));
                    }
                }
            }
            Self::IntRange { min, max } => {
                let ok = value.as_u64().is_some_and(|v| v >= min && v <= max);
                if !ok {
                    errors.add(field, format!("{field} must be between {min} and {max}"));
                }
            }
            Self::NumericMin(min) => {
                let ok = value.as_f64().is_some_and(|v| v >= min);
                if !ok {
                    errors.add(field, format!("{field} must be a number of at least {min}"));
                }
            }
            Self::Direction => {
                let ok = value
                    .as_str()
                    .is_some_and(|s| matches!(s.to_uppercase().as_str(), "ASC" | "DESC"));
                if !ok {
                    errors.add(field, format!("{field} must be ASC or DESC"));
                }
            }
            Self::Date => {
                let ok = value.as_str().is_some_and(|s| parse_date_bound(s).is_some());
                if !ok {
                    errors.add(
                        field,
                        format!("{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp"),
                    );
                }
            }
            Self::SafeText => match value {
                Value::String(s) => {
                    if !is_safe_text(s) {
                        errors.add(field, format!("{field} contains disallowed content"));
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(s) = item.as_str() {
                            if !is_safe_text(s) {
                                errors
                                    .add(field, format!("{field} contains disallowed content"));
                                break;
                            }
                        }
                    }
                }
                _ => {}
            },
        }
    }
}

/// Parse a date bound: plain date, RFC 3339, or `YYYY-MM-DD HH:MM:SS`.
/// Plain dates resolve to midnight.
#[must_use]
pub fn parse_date_bound(raw: &str) -> Option<chrono::NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(date) = trimmed.parse::<chrono::NaiveDate>() {
        return Some(date.and_time(chrono::NaiveTime::MIN));
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").ok()
}

type CheckFn = fn(&FilterParams, &mut ValidationErrors);

/// The assembled rule set a request is validated against.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<(String, Rule)>,
    checks: Vec<CheckFn>,
}

impl RuleSet {
    /// Rules every list endpoint shares, parameterized by config bounds.
    #[must_use]
    pub fn base(config: &ListConfig) -> Self {
        let mut set = Self::default();
        set.push("page", Rule::IntRange { min: 1, max: config.max_page });
        set.push(
            "per_page",
            Rule::IntRange { min: 1, max: config.per_page_hard_cap },
        );
        set.push("order", Rule::Direction);
        set.push("sort_by", Rule::MaxLength(MAX_FIELD_NAME_LENGTH));
        set.push("sort_by", Rule::SafeText);
        set.push("q", Rule::MaxLength(MAX_SEARCH_LENGTH));
        set.push("q", Rule::SafeText);
        set.push("date_from", Rule::Date);
        set.push("date_to", Rule::Date);
        set.push("min_price", Rule::NumericMin(0.0));
        set.push("max_price", Rule::NumericMin(0.0));
        set.push("names", Rule::SafeText);
        set.push("search_columns", Rule::SafeText);
        set
    }

    /// Add resource-derived rules: every fillable column gets length and
    /// content checks on its filter value.
    #[must_use]
    pub fn for_resource<R: ListResource>(mut self) -> Self {
        for column in R::fillable_columns() {
            self.push(
                format!("filters.{column}"),
                Rule::MaxLength(MAX_FILTER_VALUE_LENGTH),
            );
            self.push(format!("filters.{column}"), Rule::SafeText);
        }
        self
    }

    /// Attach a rule to a field. Missing or null fields pass; rules only
    /// judge values that are present.
    pub fn push(&mut self, field: impl Into<String>, rule: Rule) {
        self.rules.push((field.into(), rule));
    }

    /// Builder form of [`push`](Self::push) for caller extras.
    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.push(field, rule);
        self
    }

    /// Add a custom cross-field check.
    #[must_use]
    pub fn check(mut self, check: CheckFn) -> Self {
        self.checks.push(check);
        self
    }

    /// Merge another rule set into this one.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.rules.extend(other.rules);
        self.checks.extend(other.checks);
        self
    }

    /// Run every rule and cross-field check; collect all failures.
    ///
    /// # Errors
    ///
    /// Returns the complete set of failed checks.
    pub fn validate(&self, params: &FilterParams) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let serialized = serde_json::to_value(params).unwrap_or(Value::Null);

        for (field, rule) in &self.rules {
            if let Some(value) = lookup(&serialized, field) {
                if !value.is_null() {
                    rule.apply(field, value, &mut errors);
                }
            }
        }

        cross_field_checks(params, &mut errors);
        dynamic_map_checks("filters", &params.filters, &mut errors);
        dynamic_map_checks("ranges", &params.ranges, &mut errors);
        dynamic_map_checks("relationships", &params.relationships, &mut errors);

        for check in &self.checks {
            check(params, &mut errors);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Resolve a dotted path (`filters.name`) inside the serialized request.
fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// The checks that relate two fields to each other.
fn cross_field_checks(params: &FilterParams, errors: &mut ValidationErrors) {
    if !params.sort_directions.is_empty()
        && params.sort_columns.len() != params.sort_directions.len()
    {
        errors.add(
            "sort_directions",
            "sort_directions must have the same number of entries as sort_columns",
        );
    }

    if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
        if min > max {
            errors.add("max_price", "max_price must not be less than min_price");
        }
    }
    if let Some(range) = params.price_range {
        if let (Some(min), Some(max)) = (range.min, range.max) {
            if min > max {
                errors.add("price_range", "price_range min must not exceed max");
            }
        }
    }

    if let (Some(from), Some(to)) = (params.date_from.as_deref(), params.date_to.as_deref()) {
        if let (Some(from), Some(to)) = (parse_date_bound(from), parse_date_bound(to)) {
            if from > to {
                errors.add("date_from", "date_from must not be after date_to");
            }
        }
    }
}

/// Structural checks on the dynamic request maps: hostile key names are
/// rejected outright, string values must pass the security predicates.
/// Keys that are well-formed but unknown to the resource are the pipeline's
/// job to ignore, not validation's to reject.
fn dynamic_map_checks(prefix: &str, map: &Map<String, Value>, errors: &mut ValidationErrors) {
    for (key, value) in map {
        if !is_valid_field_name(key) {
            errors.add(prefix, format!("{prefix} contains an invalid field name"));
            continue;
        }
        let field = format!("{prefix}.{key}");
        match value {
            Value::String(s) => {
                if !is_safe_text(s) {
                    errors.add(field.clone(), format!("{field} contains disallowed content"));
                }
            }
            Value::Object(inner) => dynamic_map_checks(&field, inner, errors),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListQueryParams;

    fn params_from(raw: ListQueryParams) -> FilterParams {
        FilterParams::from_query(&raw)
    }

    fn base() -> RuleSet {
        RuleSet::base(&ListConfig::default())
    }

    #[test]
    fn test_clean_request_passes() {
        let params = params_from(ListQueryParams {
            page: Some(1),
            per_page: Some(50),
            q: Some("laptop".to_string()),
            ..ListQueryParams::default()
        });
        assert!(base().validate(&params).is_ok());
    }

    #[test]
    fn test_per_page_above_hard_cap_rejected() {
        let params = params_from(ListQueryParams {
            per_page: Some(5000),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field == "per_page"));
    }

    #[test]
    fn test_per_page_between_clamp_and_cap_passes() {
        // 500 is above the effective maximum but below the hard cap; the
        // pipeline clamps it instead of validation rejecting it.
        let params = params_from(ListQueryParams {
            per_page: Some(500),
            ..ListQueryParams::default()
        });
        assert!(base().validate(&params).is_ok());
    }

    #[test]
    fn test_sort_length_mismatch_rejected() {
        let params = params_from(ListQueryParams {
            sort_columns: Some(r#"["price", "name"]"#.to_string()),
            sort_directions: Some(r#"["ASC"]"#.to_string()),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field == "sort_directions"));
    }

    #[test]
    fn test_empty_directions_with_columns_pass() {
        // Directions default to ASC per column downstream.
        let params = params_from(ListQueryParams {
            sort_columns: Some(r#"["price", "name"]"#.to_string()),
            ..ListQueryParams::default()
        });
        assert!(base().validate(&params).is_ok());
    }

    #[test]
    fn test_inverted_price_bounds_rejected() {
        let params = params_from(ListQueryParams {
            min_price: Some(50.0),
            max_price: Some(10.0),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field == "max_price"));
    }

    #[test]
    fn test_inverted_date_bounds_rejected() {
        let params = params_from(ListQueryParams {
            date_from: Some("2026-02-01".to_string()),
            date_to: Some("2026-01-01".to_string()),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field == "date_from"));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let params = params_from(ListQueryParams {
            date_from: Some("last tuesday".to_string()),
            ..ListQueryParams::default()
        });
        assert!(base().validate(&params).is_err());
    }

    #[test]
    fn test_sql_fragment_in_search_rejected() {
        let params = params_from(ListQueryParams {
            q: Some("laptop'; drop table products; --".to_string()),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field == "q"));
    }

    #[test]
    fn test_hostile_filter_key_rejected() {
        let params = params_from(ListQueryParams {
            filters: Some(r#"{"name; drop table": "x"}"#.to_string()),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field == "filters"));
    }

    #[test]
    fn test_all_failures_collected() {
        let params = params_from(ListQueryParams {
            per_page: Some(5000),
            min_price: Some(50.0),
            max_price: Some(10.0),
            date_from: Some("bogus".to_string()),
            ..ListQueryParams::default()
        });
        let errors = base().validate(&params).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_summary_counts_extras() {
        let mut errors = ValidationErrors::new();
        errors.add("a", "first problem");
        errors.add("b", "second problem");
        assert_eq!(errors.summary(), "first problem (and 1 more problem(s))");
    }

    #[test]
    fn test_error_map_groups_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add("q", "too long");
        errors.add("q", "disallowed content");
        errors.add("page", "out of range");
        let map = errors.error_map();
        assert_eq!(map["q"], json!(["too long", "disallowed content"]));
        assert_eq!(map["page"], json!(["out of range"]));
    }

    #[test]
    fn test_into_reply_is_422_with_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("q", "too long");
        errors.add("page", "out of range");
        let reply = errors.into_reply();
        assert_eq!(reply.code, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(reply.body.errors["q"], json!(["too long"]));
    }

    #[test]
    fn test_field_name_validity() {
        assert!(is_valid_field_name("created_at"));
        assert!(is_valid_field_name("price2"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("name; drop"));
        assert!(!is_valid_field_name(&"x".repeat(65)));
    }

    #[test]
    fn test_security_predicates() {
        assert!(no_sql_injection("plain laptop search"));
        assert!(!no_sql_injection("1 UNION SELECT password"));
        assert!(no_xss("hello <p>world</p>"));
        assert!(!no_xss("<script>alert(1)</script>"));
        assert!(no_path_traversal("folder/file"));
        assert!(!no_path_traversal("../../etc/passwd"));
    }

    #[test]
    fn test_quote_tautologies_rejected() {
        assert!(!no_sql_injection("' OR '1'='1"));
        assert!(!no_sql_injection("x\" OR \"a\" = \"a"));
        assert!(!no_sql_injection("1 or 1=1"));
        assert!(no_sql_injection("tailor made"));
    }

    #[test]
    fn test_encoded_traversal_rejected() {
        assert!(!no_path_traversal("%2e%2e%2fetc/passwd"));
        assert!(!no_path_traversal("..%2F..%2Fsecret"));
        assert!(!no_path_traversal("file%00.png"));
        assert!(!no_path_traversal("a\0b"));
        assert!(no_path_traversal("version 2.5.1"));
    }

    #[test]
    fn test_custom_check_runs() {
        fn forbid_page_13(params: &FilterParams, errors: &mut ValidationErrors) {
            if params.page == Some(13) {
                errors.add("page", "page 13 is unavailable");
            }
        }
        let params = params_from(ListQueryParams {
            page: Some(13),
            ..ListQueryParams::default()
        });
        let errors = base().check(forbid_page_13).validate(&params).unwrap_err();
        assert!(errors.errors().iter().any(|e| e.message.contains("13")));
    }
}
