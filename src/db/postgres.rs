use super::{
    session::{InternalSession, SessionId},
    vote::{InternalVote, NewVote},
    StoreError, VoteStore,
};
use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for PgStore {
    #[instrument(skip_all)]
    async fn find_vote(
        &self,
        identity_id: &str,
        card_id: &str,
    ) -> Result<Option<InternalVote>, StoreError> {
        let vote = sqlx::query_as::<_, InternalVote>(
            r#"
            SELECT id, identity_id, card_id, party, cast_at
            FROM votes WHERE identity_id = $1 AND card_id = $2
            "#,
        )
        .bind(identity_id)
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vote)
    }

    #[instrument(skip_all, fields(vote_id = %vote.id))]
    async fn insert_vote(&self, vote: NewVote) -> Result<InternalVote, StoreError> {
        // A conflicting row yields no RETURNING row, which is how a lost
        // race between two casts for the same pair shows up.
        let stored = sqlx::query_as::<_, InternalVote>(
            r#"
            INSERT INTO votes (id, identity_id, card_id, party)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (identity_id, card_id) DO NOTHING
            RETURNING id, identity_id, card_id, party, cast_at
            "#,
        )
        .bind(vote.id.0)
        .bind(&vote.identity_id)
        .bind(&vote.card_id)
        .bind(&vote.party)
        .fetch_optional(&self.pool)
        .await?;

        match stored {
            Some(stored) => Ok(stored),
            None => {
                debug!("Insert hit the identity/card unique constraint");
                Err(StoreError::Duplicate)
            }
        }
    }

    #[instrument(skip_all)]
    async fn list_votes(&self) -> Result<Vec<InternalVote>, StoreError> {
        let votes = sqlx::query_as::<_, InternalVote>(
            r#"
            SELECT id, identity_id, card_id, party, cast_at
            FROM votes ORDER BY cast_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(votes)
    }

    #[instrument(skip_all)]
    async fn save_session(
        &self,
        identity_id: &str,
        ttl: Duration,
    ) -> Result<InternalSession, StoreError> {
        let session = InternalSession::new(identity_id, ttl)?;
        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            debug!(purged, "Dropped expired sessions");
        }

        let saved = sqlx::query_as::<_, InternalSession>(
            r#"
            INSERT INTO sessions (id, identity_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, identity_id, created_at, expires_at
            "#,
        )
        .bind(session.id.0)
        .bind(&session.identity_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn session_by_id(&self, id: &SessionId) -> Result<Option<InternalSession>, StoreError> {
        let session = sqlx::query_as::<_, InternalSession>(
            r#"
            SELECT id, identity_id, created_at, expires_at
            FROM sessions WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }
}
