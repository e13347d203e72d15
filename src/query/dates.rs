//! Date filter stage: explicit bounds and the calendar shortcuts, all
//! applied to the resource's timestamp column as half-open ranges.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use sea_orm::{
    Condition,
    sea_query::{Alias, Expr, ExprTrait},
};

use crate::models::FilterParams;
use crate::resource::ListResource;
use crate::validation::parse_date_bound;

/// Exclusive upper bound for a `date_to` value: date-only inputs cover the
/// whole named day, timestamps cut off exactly.
fn upper_bound(raw: &str) -> Option<(NaiveDateTime, bool)> {
    let trimmed = raw.trim();
    if let Ok(date) = trimmed.parse::<NaiveDate>() {
        let next = date.succ_opt()?;
        return Some((next.and_time(NaiveTime::MIN), false));
    }
    parse_date_bound(trimmed).map(|dt| (dt, true))
}

/// `[start, end)` windows for every requested calendar period containing
/// `today`. Each flag contributes its own window; they AND together, so
/// contradictory combinations simply match nothing.
fn period_bounds(today: NaiveDate, params: &FilterParams) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    if params.created_today {
        if let Some(end) = today.succ_opt() {
            windows.push((today, end));
        }
    }
    if params.created_this_week {
        let start = today.week(Weekday::Mon).first_day();
        if let Some(end) = start.checked_add_days(chrono::Days::new(7)) {
            windows.push((start, end));
        }
    }
    if params.created_this_month {
        if let Some(start) = today.with_day(1) {
            let end = if start.month() == 12 {
                NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
            };
            if let Some(end) = end {
                windows.push((start, end));
            }
        }
    }
    if params.created_this_year {
        if let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(today.year(), 1, 1),
            NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
        ) {
            windows.push((start, end));
        }
    }
    windows
}

/// Build the timestamp constraints. Entities without the timestamp column
/// ignore date parameters entirely.
pub fn condition<R: ListResource>(params: &FilterParams) -> Condition {
    let mut cond = Condition::all();
    if !R::has_column(R::TIMESTAMP_COLUMN) {
        return cond;
    }
    let col = || Expr::col(Alias::new(R::TIMESTAMP_COLUMN));

    if let Some(from) = params.date_from.as_deref().and_then(parse_date_bound) {
        cond = cond.add(col().gte(from));
    }
    if let Some((to, inclusive)) = params.date_to.as_deref().and_then(upper_bound) {
        cond = cond.add(if inclusive { col().lte(to) } else { col().lt(to) });
    }

    let today = Utc::now().date_naive();
    for (start, end) in period_bounds(today, params) {
        cond = cond.add(col().gte(start.and_time(NaiveTime::MIN)));
        cond = cond.add(col().lt(end.and_time(NaiveTime::MIN)));
    }

    cond
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_upper_bound_date_is_exclusive_next_day() {
        let (bound, inclusive) = upper_bound("2026-03-15").unwrap();
        assert_eq!(bound.date(), date(2026, 3, 16));
        assert!(!inclusive);
    }

    #[test]
    fn test_upper_bound_timestamp_is_inclusive() {
        let (bound, inclusive) = upper_bound("2026-03-15 10:30:00").unwrap();
        assert_eq!(bound.time(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert!(inclusive);
    }

    #[test]
    fn test_week_period_starts_monday() {
        let params = crate::models::FilterParams {
            created_this_week: true,
            ..crate::models::FilterParams::default()
        };
        // 2026-08-27 is a Thursday.
        let windows = period_bounds(date(2026, 8, 27), &params);
        assert_eq!(windows, vec![(date(2026, 8, 24), date(2026, 8, 31))]);
    }

    #[test]
    fn test_december_month_period_rolls_year() {
        let params = crate::models::FilterParams {
            created_this_month: true,
            ..crate::models::FilterParams::default()
        };
        let windows = period_bounds(date(2026, 12, 10), &params);
        assert_eq!(windows, vec![(date(2026, 12, 1), date(2027, 1, 1))]);
    }

    #[test]
    fn test_year_period() {
        let params = crate::models::FilterParams {
            created_this_year: true,
            ..crate::models::FilterParams::default()
        };
        let windows = period_bounds(date(2026, 5, 5), &params);
        assert_eq!(windows, vec![(date(2026, 1, 1), date(2027, 1, 1))]);
    }

    #[test]
    fn test_multiple_period_flags_stack() {
        let params = crate::models::FilterParams {
            created_today: true,
            created_this_year: true,
            ..crate::models::FilterParams::default()
        };
        let windows = period_bounds(date(2026, 5, 5), &params);
        assert_eq!(
            windows,
            vec![
                (date(2026, 5, 5), date(2026, 5, 6)),
                (date(2026, 1, 1), date(2027, 1, 1)),
            ]
        );
    }
}
