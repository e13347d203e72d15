//! Free-text search stage.

use sea_orm::{
    Condition,
    sea_query::{Alias, Expr, ExprTrait, Func, LikeExpr, SimpleExpr},
};

use crate::models::FilterParams;
use crate::resource::ListResource;
use crate::validation::is_valid_field_name;

/// Escape LIKE wildcards to prevent wildcard injection: `%` (match any),
/// `_` (match single char), and the escape character itself.
#[must_use]
pub fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive contains match on one named column. The `ESCAPE` clause
/// makes the backslash escaping real on every backend; without it SQLite
/// treats the backslash as a literal character.
fn contains_expr(column: &str, term: &str) -> SimpleExpr {
    let escaped = escape_like_wildcards(term);
    SimpleExpr::FunctionCall(Func::upper(Expr::col(Alias::new(column))))
        .like(LikeExpr::new(format!("%{}%", escaped.to_uppercase())).escape('\\'))
}

/// Build the OR-group scanning the searchable columns for the search term.
///
/// The request may narrow the scan with `search_columns`; names outside the
/// resource's searchable set are dropped. No term, or no surviving column,
/// means no constraint at all.
pub fn condition<R: ListResource>(params: &FilterParams) -> Condition {
    let Some(term) = params.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Condition::all();
    };

    let searchable = R::searchable_columns();
    let columns: Vec<&str> = if params.search_columns.is_empty() {
        searchable.to_vec()
    } else {
        params
            .search_columns
            .iter()
            .map(String::as_str)
            .filter(|name| is_valid_field_name(name) && searchable.iter().any(|s| s == name))
            .collect()
    };

    if columns.is_empty() {
        return Condition::all();
    }

    let mut group = Condition::any();
    for column in columns {
        group = group.add(contains_expr(column, term));
    }
    Condition::all().add(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards_escaped() {
        assert_eq!(escape_like_wildcards("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
        assert_eq!(escape_like_wildcards("plain"), "plain");
    }

    #[test]
    fn test_contains_expr_declares_escape_character() {
        use sea_orm::sea_query::{Query, SqliteQueryBuilder};

        let sql = Query::select()
            .expr(contains_expr("name", "50%"))
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains("ESCAPE"), "{sql}");
        assert!(sql.contains("50\\%"), "{sql}");
    }
}
