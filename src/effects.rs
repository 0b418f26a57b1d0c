//! Side effects produced by state transitions.
//!
//! Core operations never talk to the mailer or the audit sinks directly. They return
//! an [`Effects`] list which the service hands to [`dispatch`] once its writes have
//! been committed. Dispatch is best-effort: a failed e-mail or log append is logged
//! and skipped, it never undoes the state change it accompanies.

use crate::{
    models::{NewAdminLog, NewUserLog},
    notify::EmailMessage,
    state::AppState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(EmailMessage),
    AdminLog(NewAdminLog),
    UserLog(NewUserLog),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects(Vec<Effect>);

impl Effects {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn notify(&mut self, message: EmailMessage) {
        self.0.push(Effect::Notify(message));
    }

    pub fn admin_log(&mut self, entry: NewAdminLog) {
        self.0.push(Effect::AdminLog(entry));
    }

    pub fn user_log(&mut self, entry: NewUserLog) {
        self.0.push(Effect::UserLog(entry));
    }

    pub fn extend(&mut self, other: Effects) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn notifications(&self) -> impl Iterator<Item = &EmailMessage> {
        self.0.iter().filter_map(|e| match e {
            Effect::Notify(m) => Some(m),
            _ => None,
        })
    }

    pub fn admin_logs(&self) -> impl Iterator<Item = &NewAdminLog> {
        self.0.iter().filter_map(|e| match e {
            Effect::AdminLog(entry) => Some(entry),
            _ => None,
        })
    }
}

impl From<Effect> for Effects {
    fn from(effect: Effect) -> Self {
        Self(vec![effect])
    }
}

impl IntoIterator for Effects {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Apply effects in order. Call only after the writes they describe are durable.
pub async fn dispatch(state: &AppState, effects: Effects) {
    for effect in effects {
        match effect {
            Effect::Notify(message) => {
                if let Err(err) = state.notifier.send(&message).await {
                    tracing::warn!(error = %err, to = %message.to, subject = %message.subject, "notification failed");
                }
            }
            Effect::AdminLog(entry) => {
                if let Err(err) = state.admin_logs.append(entry).await {
                    tracing::warn!(error = %err, "admin log append failed");
                }
            }
            Effect::UserLog(entry) => {
                if let Err(err) = state.user_logs.append(entry).await {
                    tracing::warn!(error = %err, "user log append failed");
                }
            }
        }
    }
}
