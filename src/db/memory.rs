use super::{
    session::{InternalSession, SessionId},
    vote::{InternalVote, NewVote},
    StoreError, VoteStore,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{hash_map::Entry, HashMap};
use tokio::sync::Mutex;

type VoterKey = (String, String);

#[derive(Debug, Default)]
struct Ballots {
    // insertion order, so listings come back oldest first
    votes: Vec<InternalVote>,
    by_voter: HashMap<VoterKey, usize>,
}

/// Process-local store. The duplicate check and the insert share one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ballots: Mutex<Ballots>,
    sessions: Mutex<HashMap<SessionId, InternalSession>>,
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn find_vote(
        &self,
        identity_id: &str,
        card_id: &str,
    ) -> Result<Option<InternalVote>, StoreError> {
        let ballots = self.ballots.lock().await;
        let key = (identity_id.to_owned(), card_id.to_owned());
        Ok(ballots
            .by_voter
            .get(&key)
            .map(|&index| ballots.votes[index].clone()))
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<InternalVote, StoreError> {
        let mut guard = self.ballots.lock().await;
        let ballots = &mut *guard;
        let key = (vote.identity_id.clone(), vote.card_id.clone());
        match ballots.by_voter.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let stored = InternalVote {
                    id: vote.id,
                    identity_id: vote.identity_id,
                    card_id: vote.card_id,
                    party: vote.party,
                    cast_at: Utc::now(),
                };
                slot.insert(ballots.votes.len());
                ballots.votes.push(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn list_votes(&self) -> Result<Vec<InternalVote>, StoreError> {
        Ok(self.ballots.lock().await.votes.clone())
    }

    async fn save_session(
        &self,
        identity_id: &str,
        ttl: Duration,
    ) -> Result<InternalSession, StoreError> {
        let session = InternalSession::new(identity_id, ttl)?;
        let mut sessions = self.sessions.lock().await;
        let now = Utc::now();
        sessions.retain(|_, stored| !stored.is_expired_at(now));
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn session_by_id(&self, id: &SessionId) -> Result<Option<InternalSession>, StoreError> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_vote(identity_id: &str, card_id: &str, party: &str) -> NewVote {
        NewVote::new(identity_id.to_owned(), card_id.to_owned(), party.to_owned())
    }

    #[actix_rt::test]
    async fn insert_then_find() {
        let store = MemoryStore::default();
        assert_eq!(store.find_vote("123456789012", "1234567890").await.unwrap(), None);

        let stored = store
            .insert_vote(new_vote("123456789012", "1234567890", "NOTA"))
            .await
            .unwrap();
        let found = store.find_vote("123456789012", "1234567890").await.unwrap();
        assert_eq!(found, Some(stored));
    }

    #[actix_rt::test]
    async fn same_pair_is_rejected_whatever_the_party() {
        let store = MemoryStore::default();
        store
            .insert_vote(new_vote("123456789012", "1234567890", "BJP"))
            .await
            .unwrap();

        let second = store
            .insert_vote(new_vote("123456789012", "1234567890", "Congress"))
            .await;
        assert!(matches!(second, Err(StoreError::Duplicate)));
        assert_eq!(store.list_votes().await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn same_identity_with_another_card_is_a_new_voter() {
        let store = MemoryStore::default();
        store
            .insert_vote(new_vote("123456789012", "1234567890", "BJP"))
            .await
            .unwrap();
        store
            .insert_vote(new_vote("123456789012", "0987654321", "BJP"))
            .await
            .unwrap();
        assert_eq!(store.list_votes().await.unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn concurrent_inserts_for_one_pair_store_one_vote() {
        let store = Arc::new(MemoryStore::default());
        let attempts = (0..8).map(|i| {
            let store = store.clone();
            async move {
                store
                    .insert_vote(new_vote("123456789012", "1234567890", &format!("party {}", i)))
                    .await
            }
        });
        let results = futures::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| matches!(err, StoreError::Duplicate)));
        assert_eq!(store.list_votes().await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn list_keeps_insertion_order() {
        let store = MemoryStore::default();
        for card in &["1111111111", "2222222222", "3333333333"] {
            store
                .insert_vote(new_vote("123456789012", card, "AAP"))
                .await
                .unwrap();
        }
        let cards: Vec<String> = store
            .list_votes()
            .await
            .unwrap()
            .into_iter()
            .map(|vote| vote.card_id)
            .collect();
        assert_eq!(cards, vec!["1111111111", "2222222222", "3333333333"]);
    }

    #[actix_rt::test]
    async fn sessions_round_trip_by_id() {
        let store = MemoryStore::default();
        let session = store
            .save_session("999999999999", Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(store.session_by_id(&session.id).await.unwrap(), Some(session));
        assert_eq!(store.session_by_id(&SessionId::new()).await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn saving_a_session_drops_expired_ones() {
        let store = MemoryStore::default();
        let expired = store
            .save_session("999999999999", Duration::zero())
            .await
            .unwrap();
        let live = store
            .save_session("999999999999", Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(store.session_by_id(&expired.id).await.unwrap(), None);
        assert_eq!(store.session_by_id(&live.id).await.unwrap(), Some(live));
        assert_eq!(store.sessions.lock().await.len(), 1);
    }

    #[actix_rt::test]
    async fn out_of_range_ttl_is_rejected() {
        let store = MemoryStore::default();
        let result = store
            .save_session("999999999999", Duration::days(365 * 300_000))
            .await;
        assert!(matches!(result, Err(StoreError::SessionTtl(_))));
        assert!(store.sessions.lock().await.is_empty());
    }
}
