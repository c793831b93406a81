use super::{DbExecutor, StoreError};
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_string(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, sqlx::FromRow)]
pub struct InternalSession {
    pub id: SessionId,
    pub identity_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl InternalSession {
    pub fn new(identity_id: &str, ttl: Duration) -> Result<Self, StoreError> {
        let created_at = Utc::now();
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or(StoreError::SessionTtl(ttl))?;
        Ok(Self {
            id: SessionId::new(),
            identity_id: identity_id.to_owned(),
            created_at,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Option<InternalSession>, StoreError>")]
pub struct SessionById(pub SessionId);

async_message_handler_with_span! {
    impl AsyncSpanHandler<SessionById> for DbExecutor {
        async fn handle(msg: SessionById) -> Result<Option<InternalSession>, StoreError> {
            let SessionById(session_id) = msg;
            debug!(id = session_id.as_string().as_str(), "Get session by id");
            let store = with_ctx(|a: &mut DbExecutor, _| a.store());
            store.session_by_id(&session_id).await
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<InternalSession, StoreError>")]
pub struct SaveSession {
    pub identity_id: String,
    pub ttl: Duration,
}

async_message_handler_with_span! {
    impl AsyncSpanHandler<SaveSession> for DbExecutor {
        async fn handle(msg: SaveSession) -> Result<InternalSession, StoreError> {
            let SaveSession { identity_id, ttl } = msg;
            debug!("Save new admin session");
            let store = with_ctx(|a: &mut DbExecutor, _| a.store());
            store.save_session(&identity_id, ttl).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expires_once_ttl_elapses() {
        let session = InternalSession::new("999999999999", Duration::seconds(60)).unwrap();
        assert!(!session.is_expired_at(session.created_at));
        assert!(!session.is_expired_at(session.created_at + Duration::seconds(59)));
        assert!(session.is_expired_at(session.created_at + Duration::seconds(60)));
    }

    #[test]
    fn zero_ttl_session_is_born_expired() {
        let session = InternalSession::new("999999999999", Duration::zero()).unwrap();
        assert!(session.is_expired_at(session.created_at));
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let ttl = Duration::days(365 * 300_000);
        let result = InternalSession::new("999999999999", ttl);
        assert!(matches!(result, Err(StoreError::SessionTtl(t)) if t == ttl));
    }
}
