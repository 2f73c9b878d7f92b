use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Parse `--range` into half-open UTC bounds `[start, end)`.
///
/// Accepted forms: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or two of the same form
/// joined by `:` (`2025-01:2025-03`).
pub(crate) fn parse_range(r: &str) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (first, last) = match r.split_once(':') {
        Some((start, end)) => {
            let (start, end) = (start.trim(), end.trim());
            if start.len() != end.len() {
                return Err(AppError::InvalidRange(format!(
                    "'{r}': start and end must have the same format"
                )));
            }
            (period(start)?.0, period(end)?.1)
        }
        None => period(r.trim())?,
    };

    if last < first {
        return Err(AppError::InvalidRange(format!("'{r}': end precedes start")));
    }

    let start = first.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    let end = (last + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc());

    match (start, end) {
        (Some(s), Some(e)) => Ok((s, e)),
        _ => Err(AppError::InvalidRange(r.to_string())),
    }
}

/// First and last calendar day covered by a single period token.
fn period(token: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::InvalidRange(format!("unsupported period '{token}'"));

    match token.len() {
        4 => {
            let y: i32 = token.parse().map_err(|_| invalid())?;
            let first = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(invalid)?;
            let last = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(invalid)?;
            Ok((first, last))
        }
        7 => {
            let first =
                NaiveDate::parse_from_str(&format!("{token}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
            let next_month = first
                .checked_add_months(chrono::Months::new(1))
                .ok_or_else(invalid)?;
            Ok((first, next_month - Duration::days(1)))
        }
        10 => {
            let d = NaiveDate::parse_from_str(token, "%Y-%m-%d").map_err(|_| invalid())?;
            Ok((d, d))
        }
        _ => Err(invalid()),
    }
}
