use super::{DbExecutor, StoreError};
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct VoteId(pub Uuid);

impl VoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, sqlx::FromRow)]
pub struct InternalVote {
    pub id: VoteId,
    pub identity_id: String,
    pub card_id: String,
    pub party: String,
    pub cast_at: DateTime<Utc>,
}

/// A vote that has not been stored yet. The store assigns the cast time.
#[derive(Clone, Debug)]
pub struct NewVote {
    pub id: VoteId,
    pub identity_id: String,
    pub card_id: String,
    pub party: String,
}

impl NewVote {
    pub fn new(identity_id: String, card_id: String, party: String) -> Self {
        Self {
            id: VoteId::new(),
            identity_id,
            card_id,
            party,
        }
    }
}

// Find vote

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Option<InternalVote>, StoreError>")]
pub struct FindVote {
    pub identity_id: String,
    pub card_id: String,
}

async_message_handler_with_span! {
    impl AsyncSpanHandler<FindVote> for DbExecutor {
        async fn handle(msg: FindVote) -> Result<Option<InternalVote>, StoreError> {
            debug!("Looking up existing vote");
            let store = with_ctx(|a: &mut DbExecutor, _| a.store());
            store.find_vote(&msg.identity_id, &msg.card_id).await
        }
    }
}

// Add vote

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<InternalVote, StoreError>")]
pub struct AddVote(pub NewVote);

async_message_handler_with_span! {
    impl AsyncSpanHandler<AddVote> for DbExecutor {
        async fn handle(msg: AddVote) -> Result<InternalVote, StoreError> {
            let AddVote(vote) = msg;
            debug!(vote_id = %vote.id, "Inserting vote");
            let store = with_ctx(|a: &mut DbExecutor, _| a.store());
            store.insert_vote(vote).await
        }
    }
}

// All votes

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Vec<InternalVote>, StoreError>")]
pub struct AllVotes;

async_message_handler_with_span! {
    impl AsyncSpanHandler<AllVotes> for DbExecutor {
        async fn handle(_msg: AllVotes) -> Result<Vec<InternalVote>, StoreError> {
            let store = with_ctx(|a: &mut DbExecutor, _| a.store());
            let votes = store.list_votes().await?;
            debug!(count = votes.len(), "Retrieved all votes");
            Ok(votes)
        }
    }
}
