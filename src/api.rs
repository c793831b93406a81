//! JSON request and response types and the HTTP handlers that route them to
//! the service actors.

use crate::{
    db::{
        session::SessionId,
        vote::{InternalVote, VoteId},
    },
    error::VoteError,
    services::{
        party::{Party, PARTIES},
        session::SessionActor,
        vote::{CastVote, ListVotes, VoteActor},
        Identify, Identity,
    },
    span::SpanMessage,
};
use actix::SystemService;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use tracing::{debug, instrument};

// `aadhar` and `votingCard` are the field names the original web client sends.

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct IncomingLogin {
    #[serde(default, alias = "aadhar")]
    pub identity_id: Option<String>,
    #[serde(default, alias = "votingCard")]
    pub card_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct IncomingVote {
    #[serde(default, alias = "aadhar")]
    pub identity_id: Option<String>,
    #[serde(default, alias = "votingCard")]
    pub card_id: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingIdentity {
    pub is_admin: bool,
    /// Bearer token for admin-only endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<SessionId>,
}

impl From<Identity> for OutgoingIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            is_admin: identity.is_admin,
            token: identity.session.map(|session| session.id),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct OutgoingMessage {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingVote {
    pub id: VoteId,
    pub identity_id: String,
    pub card_id: String,
    pub party: String,
    pub cast_at: DateTime<Utc>,
}

impl From<InternalVote> for OutgoingVote {
    fn from(vote: InternalVote) -> Self {
        Self {
            id: vote.id,
            identity_id: vote.identity_id,
            card_id: vote.card_id,
            party: vote.party,
            cast_at: vote.cast_at,
        }
    }
}

/// Session id from an `Authorization: Bearer <uuid>` header.
pub fn bearer_session(req: &HttpRequest) -> Option<SessionId> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    Uuid::parse_str(token).ok().map(SessionId)
}

#[instrument(skip_all)]
pub async fn login(body: web::Json<IncomingLogin>) -> Result<HttpResponse, VoteError> {
    let IncomingLogin {
        identity_id,
        card_id,
    } = body.into_inner();
    let identity = SessionActor::from_registry()
        .send(SpanMessage::new(Identify {
            identity_id: identity_id.unwrap_or_default(),
            card_id: card_id.unwrap_or_default(),
        }))
        .await??;
    Ok(HttpResponse::Ok().json(OutgoingIdentity::from(identity)))
}

#[instrument(skip_all)]
pub async fn vote(body: web::Json<IncomingVote>) -> Result<HttpResponse, VoteError> {
    let IncomingVote {
        identity_id,
        card_id,
        party,
    } = body.into_inner();
    VoteActor::from_registry()
        .send(SpanMessage::new(CastVote {
            identity_id: identity_id.unwrap_or_default(),
            card_id: card_id.unwrap_or_default(),
            party: party.unwrap_or_default(),
        }))
        .await??;
    Ok(HttpResponse::Ok().json(OutgoingMessage {
        message: "Vote submitted successfully".to_owned(),
    }))
}

#[instrument(skip_all)]
pub async fn admin_votes(req: HttpRequest) -> Result<HttpResponse, VoteError> {
    let session = bearer_session(&req);
    if session.is_none() {
        debug!("Request without a usable bearer token");
    }
    let votes = VoteActor::from_registry()
        .send(SpanMessage::new(ListVotes { session }))
        .await??;
    let votes: Vec<OutgoingVote> = votes.into_iter().map(OutgoingVote::from).collect();
    Ok(HttpResponse::Ok().json(votes))
}

pub async fn parties() -> HttpResponse {
    let parties: &[Party] = &PARTIES;
    HttpResponse::Ok().json(parties)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_bearer_token() {
        let id = SessionId::new();
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", id)))
            .to_http_request();
        assert_eq!(bearer_session(&req), Some(id));
    }

    #[test]
    fn ignores_other_authorization_schemes() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic YWRtaW46YWRtaW4="))
            .to_http_request();
        assert_eq!(bearer_session(&req), None);

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer not-a-uuid"))
            .to_http_request();
        assert_eq!(bearer_session(&req), None);

        assert_eq!(bearer_session(&TestRequest::default().to_http_request()), None);
    }

    #[test]
    fn login_accepts_original_client_field_names() {
        let login: IncomingLogin =
            serde_json::from_str(r#"{"aadhar": "123456789012", "votingCard": "1234567890"}"#)
                .unwrap();
        assert_eq!(login.identity_id.as_deref(), Some("123456789012"));
        assert_eq!(login.card_id.as_deref(), Some("1234567890"));

        let login: IncomingLogin = serde_json::from_str(r#"{"cardId": "1234567890"}"#).unwrap();
        assert_eq!(login.identity_id, None);
    }
}
