use crate::common::error::ServiceResult;
use crate::entities::match_states::MatchState;
use crate::repositories::match_states::MatchStateStore;
use crate::rooms::connections::{ConnectionHandle, ConnectionRole};
use crate::rooms::{MatchRoom, PendingJoin, RoomConfig};
use hashbrown::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::info;

/// Owns every live match room, keyed by match id
pub struct MatchRoomRegistry {
    rooms: RwLock<HashMap<String, MatchRoom>>,
    store: Arc<dyn MatchStateStore>,
    config: RoomConfig,
}

impl MatchRoomRegistry {
    pub fn new(store: Arc<dyn MatchStateStore>, config: RoomConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            store,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn get(&self, match_id: &str) -> Option<MatchRoom> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms
            .get(match_id)
            .filter(|room| !room.is_stopped())
            .cloned()
    }

    pub fn get_or_create(&self, match_id: &str) -> MatchRoom {
        if let Some(room) = self.get(match_id) {
            return room;
        }
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        match rooms.get(match_id) {
            Some(room) if !room.is_stopped() => room.clone(),
            _ => {
                let room = MatchRoom::spawn(match_id, self.store.clone(), &self.config);
                rooms.insert(match_id.to_string(), room.clone());
                room
            }
        }
    }

    /// Finds or creates the room and marks a join in flight, both under the registry lock
    fn checkout(&self, match_id: &str) -> (MatchRoom, PendingJoin) {
        {
            let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(room) = rooms.get(match_id).filter(|room| !room.is_stopped()) {
                return (room.clone(), room.begin_join());
            }
        }
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let room = match rooms.get(match_id) {
            Some(room) if !room.is_stopped() => room.clone(),
            _ => {
                let room = MatchRoom::spawn(match_id, self.store.clone(), &self.config);
                rooms.insert(match_id.to_string(), room.clone());
                room
            }
        };
        let pending = room.begin_join();
        (room, pending)
    }

    /// Registers the connection in the match's room, creating the room if needed.
    /// The room cannot be reaped while the join is in flight.
    pub async fn join(
        &self,
        match_id: &str,
        role: ConnectionRole,
        handle: ConnectionHandle,
    ) -> ServiceResult<(MatchRoom, Option<MatchState>)> {
        let (room, pending) = self.checkout(match_id);
        let state = room.join(role, handle).await;
        drop(pending);
        Ok((room, state?))
    }

    /// Stops and forgets a room, returns whether one was live
    pub fn retire(&self, match_id: &str) -> bool {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        match rooms.remove(match_id) {
            Some(room) => {
                room.stop();
                info!(match_id, "Retired match room");
                true
            }
            None => false,
        }
    }

    /// Retires rooms without connections or pending joins that have been idle
    /// longer than the configured timeout, and rooms that were stopped.
    pub fn reap(&self, now: Instant) -> Vec<String> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let mut reaped = vec![];
        rooms.retain(|match_id, room| {
            let keep = !room.is_stopped() && !room.is_idle(now, self.config.idle_timeout);
            if !keep {
                room.stop();
                reaped.push(match_id.clone());
            }
            keep
        });
        reaped
    }

    pub fn len(&self) -> usize {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
