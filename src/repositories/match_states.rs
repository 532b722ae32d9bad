use crate::common::redis_json::Json;
use crate::common::redis_pool::RedisPool;
use crate::entities::match_states::MatchState;
use async_trait::async_trait;
use hashbrown::HashMap;
use redis::AsyncCommands;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn make_key(match_id: &str) -> String {
    format!("gameStats:{match_id}")
}

/// Snapshot storage for live matches
#[async_trait]
pub trait MatchStateStore: Send + Sync {
    async fn fetch_one(&self, match_id: &str) -> anyhow::Result<Option<MatchState>>;
    async fn store(&self, state: &MatchState) -> anyhow::Result<()>;
}

pub struct RedisMatchStateStore {
    redis: RedisPool,
    ttl: Option<Duration>,
}

impl RedisMatchStateStore {
    pub fn new(redis: RedisPool, ttl: Option<Duration>) -> Self {
        Self { redis, ttl }
    }
}

#[async_trait]
impl MatchStateStore for RedisMatchStateStore {
    async fn fetch_one(&self, match_id: &str) -> anyhow::Result<Option<MatchState>> {
        let mut redis = self.redis.get().await?;
        let state: Option<Json<MatchState>> = redis.get(make_key(match_id)).await?;
        Ok(state.map(Json::into_inner))
    }

    async fn store(&self, state: &MatchState) -> anyhow::Result<()> {
        let mut redis = self.redis.get().await?;
        let key = make_key(&state.match_id);
        match self.ttl {
            Some(ttl) => {
                let _: () = redis
                    .set_ex(key, Json(state), ttl.as_secs().max(1))
                    .await?;
            }
            None => {
                let _: () = redis.set(key, Json(state)).await?;
            }
        }
        Ok(())
    }
}

/// Process-local store for tests and single-node development
#[derive(Default)]
pub struct MemoryMatchStateStore {
    states: Mutex<HashMap<String, MatchState>>,
    failing: AtomicBool,
}

impl MemoryMatchStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail until reset
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn states(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, MatchState>>> {
        self.states
            .lock()
            .map_err(|_| anyhow::anyhow!("match state store lock poisoned"))
    }
}

#[async_trait]
impl MatchStateStore for MemoryMatchStateStore {
    async fn fetch_one(&self, match_id: &str) -> anyhow::Result<Option<MatchState>> {
        Ok(self.states()?.get(match_id).cloned())
    }

    async fn store(&self, state: &MatchState) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("match state store is unavailable");
        }
        self.states()?
            .insert(state.match_id.clone(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(match_id: &str) -> MatchState {
        let mut state: MatchState =
            serde_json::from_str(r#"{"teamA": {}, "teamB": {}, "playerStats": {}}"#).unwrap();
        state.match_id = match_id.to_string();
        state
    }

    #[test]
    fn keys_follow_game_stats_pattern() {
        assert_eq!(make_key("abc"), "gameStats:abc");
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryMatchStateStore::new();
        assert!(store.fetch_one("m1").await.unwrap().is_none());

        store.store(&state("m1")).await.unwrap();
        assert_eq!(store.fetch_one("m1").await.unwrap(), Some(state("m1")));
        assert!(store.fetch_one("m2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_memory_store_keeps_previous_snapshot() {
        let store = MemoryMatchStateStore::new();
        store.store(&state("m1")).await.unwrap();
        store.set_failing(true);

        let mut changed = state("m1");
        changed.raid_number = 4;
        assert!(store.store(&changed).await.is_err());
        assert_eq!(store.fetch_one("m1").await.unwrap().unwrap().raid_number, 0);
    }
}
