use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{audit::DescribedAdminLog, models::UserLogEntry};

pub const DEFAULT_LOG_LIMIT: u64 = 20;

/// Query string of the log listings. Dates accept RFC 3339 or `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    #[serde(rename = "type")]
    pub log_type: Option<String>,
    pub triggered_by: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLogList {
    pub logs: Vec<DescribedAdminLog>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserLogList {
    pub logs: Vec<UserLogEntry>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}
