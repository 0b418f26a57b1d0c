use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    audit::{AdminLogFilter, DateRange, DescribedAdminLog, UserLogFilter, export},
    dto::logs::{AdminLogList, DEFAULT_LOG_LIMIT, LogQuery, UserLogList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{AdminLogType, UserLogType},
    query::Window,
    response::{ApiResponse, Meta},
    state::AppState,
};

const MAX_LOG_LIMIT: u64 = 100;

/// `YYYY-MM-DD` bounds cover the whole day; anything else must be RFC 3339.
fn parse_bound(raw: &str, end_of_day: bool) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date '{raw}'")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    let time = time.ok_or_else(|| AppError::validation("Invalid date"))?;
    Ok(date.and_time(time).and_utc())
}

fn date_range(query: &LogQuery) -> AppResult<DateRange> {
    let range = DateRange {
        start: query
            .start_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, false))
            .transpose()?,
        end: query
            .end_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, true))
            .transpose()?,
    };
    if let (Some(start), Some(end)) = (range.start, range.end) {
        if start > end {
            return Err(AppError::validation("startDate must not be after endDate"));
        }
    }
    Ok(range)
}

fn parse_type<T: FromStr<Err = String>>(raw: Option<&str>) -> AppResult<Option<T>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(AppError::validation))
        .transpose()
}

fn paging(query: &LogQuery) -> (u64, u64) {
    let page = query.page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = query
        .limit
        .filter(|l| *l >= 1)
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .min(MAX_LOG_LIMIT);
    (page, limit)
}

fn pages(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit)
}

pub(crate) fn admin_filter(query: &LogQuery) -> AppResult<AdminLogFilter> {
    Ok(AdminLogFilter {
        log_type: parse_type::<AdminLogType>(query.log_type.as_deref())?,
        triggered_by: query.triggered_by,
        created: date_range(query)?,
    })
}

pub(crate) fn user_filter(query: &LogQuery) -> AppResult<UserLogFilter> {
    Ok(UserLogFilter {
        log_type: parse_type::<UserLogType>(query.log_type.as_deref())?,
        user_id: query.user_id,
        ip_address: query.ip_address.clone().filter(|s| !s.is_empty()),
        user_agent: query.user_agent.clone().filter(|s| !s.is_empty()),
        created: date_range(query)?,
    })
}

pub async fn admin_logs(
    state: &AppState,
    user: &AuthUser,
    query: LogQuery,
) -> AppResult<ApiResponse<AdminLogList>> {
    ensure_admin(user)?;
    let filter = admin_filter(&query)?;
    let (page, limit) = paging(&query);

    let total = state.admin_logs.count(&filter).await?;
    let logs = state
        .admin_logs
        .list(&filter, Some(Window::page(page, limit)))
        .await?
        .into_iter()
        .map(DescribedAdminLog::from)
        .collect();

    let meta = Meta::new(page as i64, limit as i64, total as i64);
    let data = AdminLogList {
        logs,
        total,
        page,
        pages: pages(total, limit),
    };
    Ok(ApiResponse::success("Admin logs", data, Some(meta)))
}

pub async fn user_logs(
    state: &AppState,
    user: &AuthUser,
    query: LogQuery,
) -> AppResult<ApiResponse<UserLogList>> {
    ensure_admin(user)?;
    let filter = user_filter(&query)?;
    let (page, limit) = paging(&query);

    let total = state.user_logs.count(&filter).await?;
    let logs = state
        .user_logs
        .list(&filter, Some(Window::page(page, limit)))
        .await?;

    let meta = Meta::new(page as i64, limit as i64, total as i64);
    let data = UserLogList {
        logs,
        total,
        page,
        pages: pages(total, limit),
    };
    Ok(ApiResponse::success("User logs", data, Some(meta)))
}

pub async fn logs_for_user(
    state: &AppState,
    user: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<UserLogList>> {
    ensure_admin(user)?;
    let logs = state
        .user_logs
        .list(&UserLogFilter::for_user(user_id), None)
        .await?;
    if logs.is_empty() {
        return Err(AppError::not_found("No logs found for this user"));
    }

    let total = logs.len() as u64;
    Ok(ApiResponse::ok(
        "User logs",
        UserLogList {
            logs,
            total,
            page: 1,
            pages: 1,
        },
    ))
}

pub async fn export_admin_logs(state: &AppState, user: &AuthUser, query: LogQuery) -> AppResult<String> {
    ensure_admin(user)?;
    let entries = state.admin_logs.list(&admin_filter(&query)?, None).await?;
    tracing::debug!(rows = entries.len(), "exporting admin logs");
    export::admin_logs_csv(&entries)
}

pub async fn export_user_logs(state: &AppState, user: &AuthUser, query: LogQuery) -> AppResult<String> {
    ensure_admin(user)?;
    let entries = state.user_logs.list(&user_filter(&query)?, None).await?;
    let users: HashMap<_, _> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    tracing::debug!(rows = entries.len(), "exporting user logs");
    export::user_logs_csv(&entries, &users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_dates_cover_the_whole_day() {
        let start = parse_bound("2024-03-01", false).unwrap();
        let end = parse_bound("2024-03-01", true).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(end > start);
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");
        assert!(parse_bound("yesterday", false).is_err());
    }

    #[test]
    fn unknown_log_type_is_rejected() {
        let query = LogQuery {
            log_type: Some("NOPE".into()),
            ..LogQuery::default()
        };
        assert!(matches!(admin_filter(&query), Err(AppError::Validation(_))));
    }

    #[test]
    fn paging_defaults_and_caps() {
        assert_eq!(paging(&LogQuery::default()), (1, DEFAULT_LOG_LIMIT));
        let query = LogQuery {
            page: Some(0),
            limit: Some(10_000),
            ..LogQuery::default()
        };
        assert_eq!(paging(&query), (1, MAX_LOG_LIMIT));
        assert_eq!(pages(41, 20), 3);
    }
}
