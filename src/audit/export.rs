//! Flattened CSV renderings of the audit logs.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::action_description;
use crate::{
    error::{AppError, AppResult},
    models::{AdminLogEntry, User, UserLogEntry},
};

const ADMIN_HEADERS: [&str; 9] = [
    "id",
    "type",
    "productId",
    "productName",
    "orderId",
    "message",
    "actionDescription",
    "triggeredBy",
    "createdAt",
];

const USER_HEADERS: [&str; 9] = [
    "id",
    "type",
    "userId",
    "userId.name",
    "userId.email",
    "message",
    "ipAddress",
    "userAgent",
    "createdAt",
];

#[derive(Serialize)]
struct AdminRow<'a> {
    id: Uuid,
    #[serde(rename = "type")]
    log_type: &'static str,
    #[serde(rename = "productId")]
    product_id: Option<Uuid>,
    #[serde(rename = "productName")]
    product_name: &'a str,
    #[serde(rename = "orderId")]
    order_id: Option<Uuid>,
    message: &'a str,
    #[serde(rename = "actionDescription")]
    action_description: String,
    #[serde(rename = "triggeredBy")]
    triggered_by: Uuid,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: Uuid,
    #[serde(rename = "type")]
    log_type: &'static str,
    #[serde(rename = "userId")]
    user_id: Uuid,
    #[serde(rename = "userId.name")]
    user_name: &'a str,
    #[serde(rename = "userId.email")]
    user_email: &'a str,
    message: &'a str,
    #[serde(rename = "ipAddress")]
    ip_address: &'a str,
    #[serde(rename = "userAgent")]
    user_agent: &'a str,
    #[serde(rename = "createdAt")]
    created_at: String,
}

/// Writer with the header row already written, so empty exports still carry the layout.
fn writer_with(headers: &[&str]) -> AppResult<csv::Writer<Vec<u8>>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers).map_err(csv_error)?;
    Ok(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("csv flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.into()))
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::Internal(err.into())
}

pub fn admin_logs_csv(entries: &[AdminLogEntry]) -> AppResult<String> {
    let mut writer = writer_with(&ADMIN_HEADERS)?;
    for entry in entries {
        writer
            .serialize(AdminRow {
                id: entry.id,
                log_type: entry.log_type.as_str(),
                product_id: entry.product_id,
                product_name: entry.product_name.as_deref().unwrap_or_default(),
                order_id: entry.order_id,
                message: &entry.message,
                action_description: action_description(entry),
                triggered_by: entry.triggered_by,
                created_at: entry.created_at.to_rfc3339(),
            })
            .map_err(csv_error)?;
    }
    finish(writer)
}

/// User entries with the author's name and e-mail joined in; deleted users leave them blank.
pub fn user_logs_csv(entries: &[UserLogEntry], users: &HashMap<Uuid, User>) -> AppResult<String> {
    let mut writer = writer_with(&USER_HEADERS)?;
    for entry in entries {
        let user = users.get(&entry.user_id);
        writer
            .serialize(UserRow {
                id: entry.id,
                log_type: entry.log_type.as_str(),
                user_id: entry.user_id,
                user_name: user.map(|u| u.name.as_str()).unwrap_or_default(),
                user_email: user.map(|u| u.email.as_str()).unwrap_or_default(),
                message: &entry.message,
                ip_address: &entry.ip_address,
                user_agent: &entry.user_agent,
                created_at: entry.created_at.to_rfc3339(),
            })
            .map_err(csv_error)?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Role, UserLogType};

    #[test]
    fn user_csv_joins_author_and_quotes_commas() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let entry = UserLogEntry {
            id: Uuid::new_v4(),
            log_type: UserLogType::UserLogin,
            user_id: user.id,
            message: "Logged in, from web".into(),
            ip_address: "10.0.0.1".into(),
            user_agent: "curl/8".into(),
            created_at: Utc::now(),
        };
        let users = HashMap::from([(user.id, user)]);

        let csv = user_logs_csv(&[entry], &users).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,type,userId,userId.name,userId.email,message,ipAddress,userAgent,createdAt"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("USER_LOGIN"));
        assert!(row.contains("Ada,ada@example.com"));
        assert!(row.contains("\"Logged in, from web\""));
    }

    #[test]
    fn empty_exports_keep_the_header_row() {
        assert_eq!(
            admin_logs_csv(&[]).unwrap(),
            "id,type,productId,productName,orderId,message,actionDescription,triggeredBy,createdAt\n"
        );
        assert_eq!(
            user_logs_csv(&[], &HashMap::new()).unwrap(),
            "id,type,userId,userId.name,userId.email,message,ipAddress,userAgent,createdAt\n"
        );
    }
}
