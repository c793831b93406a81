use super::{required, Identify, Identity};
use crate::{
    db::{
        session::{InternalSession, SaveSession, SessionById, SessionId},
        DbExecutor,
    },
    error::VoteError,
    message_handler_with_span,
    span::SpanMessage,
};
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn, Span};

const MISSING_CREDENTIALS: &str = "Missing credentials";

/// Classifies identities and guards admin-only operations.
pub struct SessionActor {
    admin_identity: String,
    session_ttl: Duration,
}

impl SessionActor {
    pub fn new(admin_identity: String, session_ttl: Duration) -> Self {
        Self {
            admin_identity,
            session_ttl,
        }
    }
}

impl Default for SessionActor {
    fn default() -> Self {
        unimplemented!("Session actor can't be initialized using default because it needs the admin identity")
    }
}

impl Actor for SessionActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Session actor started");
    }
}

impl SystemService for SessionActor {}
impl Supervised for SessionActor {}

async fn identify(msg: Identify) -> Result<Identity, VoteError> {
    let Identify {
        identity_id,
        card_id,
    } = msg;
    required(&identity_id, MISSING_CREDENTIALS)?;
    required(&card_id, MISSING_CREDENTIALS)?;

    let (admin_identity, ttl) =
        with_ctx(|a: &mut SessionActor, _| (a.admin_identity.clone(), a.session_ttl));
    if identity_id != admin_identity {
        debug!("Identified voter");
        return Ok(Identity {
            is_admin: false,
            session: None,
        });
    }

    let session = DbExecutor::from_registry()
        .send(SpanMessage::new(SaveSession { identity_id, ttl }))
        .await??;
    info!(session_id = %session.id, "Admin session opened");
    Ok(Identity {
        is_admin: true,
        session: Some(session),
    })
}

message_handler_with_span! {
    impl SpanHandler<Identify> for SessionActor {
        type Result = ResponseActFuture<Self, <Identify as Message>::Result>;

        fn handle(&mut self, msg: Identify, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            debug!("Handling identify");
            identify(msg).interop_actor_boxed(self)
        }
    }
}

/// Resolves a bearer session to a live admin session.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<InternalSession, VoteError>")]
pub struct Authorize(pub SessionId);

async fn authorize(msg: Authorize) -> Result<InternalSession, VoteError> {
    let Authorize(session_id) = msg;
    let session = DbExecutor::from_registry()
        .send(SpanMessage::new(SessionById(session_id)))
        .await??;
    let session = match session {
        Some(session) => session,
        None => {
            warn!(session_id = %session_id, "Unknown session");
            return Err(VoteError::Unauthorized);
        }
    };

    if session.is_expired_at(Utc::now()) {
        warn!(session_id = %session.id, "Session expired");
        return Err(VoteError::Unauthorized);
    }
    // admin identity may have been reconfigured since the session was opened
    let admin_identity = with_ctx(|a: &mut SessionActor, _| a.admin_identity.clone());
    if session.identity_id != admin_identity {
        warn!(session_id = %session.id, "Session does not belong to the admin");
        return Err(VoteError::Unauthorized);
    }
    Ok(session)
}

message_handler_with_span! {
    impl SpanHandler<Authorize> for SessionActor {
        type Result = ResponseActFuture<Self, <Authorize as Message>::Result>;

        fn handle(&mut self, msg: Authorize, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            authorize(msg).interop_actor_boxed(self)
        }
    }
}
