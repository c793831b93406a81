use super::{
    required,
    session::{Authorize, SessionActor},
};
use crate::{
    db::{
        session::SessionId,
        vote::{AddVote, AllVotes, FindVote, InternalVote, NewVote},
        DbExecutor,
    },
    error::VoteError,
    message_handler_with_span,
    span::SpanMessage,
};
use actix::prelude::*;
use actix_interop::FutureInterop;
use tracing::{debug, info, Span};

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<InternalVote, VoteError>")]
pub struct CastVote {
    pub identity_id: String,
    pub card_id: String,
    pub party: String,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Vec<InternalVote>, VoteError>")]
pub struct ListVotes {
    pub session: Option<SessionId>,
}

// Actor

#[derive(Default)]
pub struct VoteActor {}

impl VoteActor {
    pub fn new() -> Self {
        Self {}
    }
}

impl Actor for VoteActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Vote actor started");
    }
}

impl SystemService for VoteActor {}
impl Supervised for VoteActor {}

async fn cast_vote(msg: CastVote) -> Result<InternalVote, VoteError> {
    let CastVote {
        identity_id,
        card_id,
        party,
    } = msg;
    required(&identity_id, "Missing identity")?;
    required(&card_id, "Missing voting card")?;
    required(&party, "Missing party")?;

    let db = DbExecutor::from_registry();
    let existing = db
        .send(SpanMessage::new(FindVote {
            identity_id: identity_id.clone(),
            card_id: card_id.clone(),
        }))
        .await??;
    if let Some(existing) = existing {
        info!(vote_id = %existing.id, "Rejected repeat vote");
        return Err(VoteError::DuplicateVote);
    }

    // the store still rejects a concurrent cast that slipped past the lookup
    let vote = db
        .send(SpanMessage::new(AddVote(NewVote::new(
            identity_id,
            card_id,
            party,
        ))))
        .await??;
    info!(vote_id = %vote.id, "Vote recorded");
    Ok(vote)
}

message_handler_with_span! {
    impl SpanHandler<CastVote> for VoteActor {
        type Result = ResponseActFuture<Self, <CastVote as Message>::Result>;
        fn handle(
            &mut self,
            msg: CastVote,
            _ctx: &mut Context<Self>,
            _span: Span,
        ) -> Self::Result {
            debug!("VoteActor handling CastVote");
            cast_vote(msg).interop_actor_boxed(self)
        }
    }
}

async fn list_votes(msg: ListVotes) -> Result<Vec<InternalVote>, VoteError> {
    let session_id = msg.session.ok_or(VoteError::Unauthorized)?;
    let session = SessionActor::from_registry()
        .send(SpanMessage::new(Authorize(session_id)))
        .await??;
    debug!(session_id = %session.id, "Listing votes for admin");

    let votes = DbExecutor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await??;
    Ok(votes)
}

message_handler_with_span! {
    impl SpanHandler<ListVotes> for VoteActor {
        type Result = ResponseActFuture<Self, <ListVotes as Message>::Result>;
        fn handle(
            &mut self,
            msg: ListVotes,
            _ctx: &mut Context<Self>,
            _span: Span,
        ) -> Self::Result {
            list_votes(msg).interop_actor_boxed(self)
        }
    }
}
