pub mod connections;
pub mod registry;

use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::match_states::MatchState;
use crate::models::frames::OutboundFrame;
use crate::repositories::match_states::MatchStateStore;
use crate::rooms::connections::{ConnectionHandle, ConnectionId, ConnectionRole, ConnectionSet};
use crate::usecases::matches::{MatchCommand, resolve_command};
use axum::extract::ws::Utf8Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub idle_timeout: Duration,
    pub broadcast_capacity: usize,
    pub outbound_capacity: usize,
    pub command_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5 * 60),
            broadcast_capacity: 100,
            outbound_capacity: 64,
            command_capacity: 32,
        }
    }
}

/// A state change that was persisted and handed to the room for fan-out
#[derive(Debug, Clone)]
pub struct CommittedState {
    pub state: MatchState,
    pub payload: Utf8Bytes,
}

struct Broadcast {
    payload: Utf8Bytes,
    origin: Option<ConnectionId>,
}

enum RoomMessage {
    Join {
        role: ConnectionRole,
        handle: ConnectionHandle,
        reply: oneshot::Sender<ServiceResult<Option<MatchState>>>,
    },
    Apply {
        command: MatchCommand,
        origin: Option<ConnectionId>,
        reply: oneshot::Sender<ServiceResult<CommittedState>>,
    },
    Snapshot {
        reply: oneshot::Sender<ServiceResult<Option<MatchState>>>,
    },
}

struct RoomActivity {
    last_activity: Mutex<Instant>,
    pending_joins: AtomicUsize,
}

impl RoomActivity {
    fn touch(&self) {
        let mut last_activity = self.last_activity.lock().unwrap_or_else(PoisonError::into_inner);
        *last_activity = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_activity = self.last_activity.lock().unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(*last_activity)
    }
}

/// Handle to the per-match actor. Clones share the same room.
#[derive(Clone)]
pub struct MatchRoom {
    match_id: Arc<str>,
    mailbox: mpsc::Sender<RoomMessage>,
    broadcasts: mpsc::Sender<Broadcast>,
    scorers: ConnectionSet,
    viewers: ConnectionSet,
    activity: Arc<RoomActivity>,
    cancel: CancellationToken,
    drained: CancellationToken,
}

impl MatchRoom {
    pub fn spawn(match_id: &str, store: Arc<dyn MatchStateStore>, config: &RoomConfig) -> Self {
        let (mailbox, mailbox_rx) = mpsc::channel(config.command_capacity.max(1));
        let (broadcasts, broadcasts_rx) = mpsc::channel(config.broadcast_capacity.max(1));
        let room = Self {
            match_id: Arc::from(match_id),
            mailbox,
            broadcasts,
            scorers: ConnectionSet::default(),
            viewers: ConnectionSet::default(),
            activity: Arc::new(RoomActivity {
                last_activity: Mutex::new(Instant::now()),
                pending_joins: AtomicUsize::new(0),
            }),
            cancel: CancellationToken::new(),
            drained: CancellationToken::new(),
        };

        let actor = RoomActor {
            room: room.clone(),
            store,
            state: None,
            loaded: false,
        };
        tokio::spawn(actor.run(mailbox_rx));
        tokio::spawn(forward_broadcasts(
            room.match_id.clone(),
            broadcasts_rx,
            room.scorers.clone(),
            room.viewers.clone(),
            room.cancel.clone(),
            room.drained.clone(),
        ));
        info!(match_id, "Opened match room");
        room
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    fn connections(&self, role: ConnectionRole) -> &ConnectionSet {
        match role {
            ConnectionRole::Scorer => &self.scorers,
            ConnectionRole::Viewer => &self.viewers,
        }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<ServiceResult<T>>) -> RoomMessage,
    ) -> ServiceResult<T> {
        let (reply, reply_rx) = oneshot::channel();
        self.mailbox
            .send(message(reply))
            .await
            .map_err(|_| AppError::RoomsClosed)?;
        reply_rx.await.map_err(|_| AppError::RoomsClosed)?
    }

    /// Registers a connection. When the match has a state, its snapshot is
    /// queued to the connection before any later broadcast reaches it.
    pub async fn join(
        &self,
        role: ConnectionRole,
        handle: ConnectionHandle,
    ) -> ServiceResult<Option<MatchState>> {
        self.request(|reply| RoomMessage::Join {
            role,
            handle,
            reply,
        })
        .await
    }

    pub fn leave(&self, role: ConnectionRole, connection_id: ConnectionId) {
        if self.connections(role).remove(connection_id) {
            self.activity.touch();
            debug!(
                match_id = %self.match_id,
                %connection_id,
                role = role.as_str(),
                "Connection left match room"
            );
        }
    }

    /// Applies a command serially with every other change to this match.
    /// The new state is persisted before it is broadcast to everyone but `origin`.
    pub async fn submit(
        &self,
        command: MatchCommand,
        origin: Option<ConnectionId>,
    ) -> ServiceResult<CommittedState> {
        self.request(|reply| RoomMessage::Apply {
            command,
            origin,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> ServiceResult<Option<MatchState>> {
        self.request(|reply| RoomMessage::Snapshot { reply }).await
    }

    /// Queues a payload for fan-out, dropping it when the queue is full
    pub fn broadcast_bytes(&self, payload: Utf8Bytes, origin: Option<ConnectionId>) -> bool {
        match self.broadcasts.try_send(Broadcast { payload, origin }) {
            Ok(()) => true,
            Err(e) => {
                warn!(match_id = %self.match_id, "Dropping broadcast: {e}");
                false
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.scorers.len() + self.viewers.len()
    }

    pub fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        self.connection_count() == 0
            && self.activity.pending_joins.load(Ordering::SeqCst) == 0
            && self.activity.idle_for(now) >= idle_timeout
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops the actor. Queued broadcasts are still delivered before the
    /// connection sets are cleared.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the room has been stopped and its last broadcasts were queued
    pub async fn closed(&self) {
        self.drained.cancelled().await
    }

    fn begin_join(&self) -> PendingJoin {
        self.activity.pending_joins.fetch_add(1, Ordering::SeqCst);
        self.activity.touch();
        PendingJoin(self.activity.clone())
    }
}

/// Keeps a room from being reaped while a connection is joining it
pub struct PendingJoin(Arc<RoomActivity>);

impl Drop for PendingJoin {
    fn drop(&mut self) {
        self.0.pending_joins.fetch_sub(1, Ordering::SeqCst);
        self.0.touch();
    }
}

/// Stops the room however the actor exits, so the registry stops handing it out
struct StopOnExit(CancellationToken);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

struct RoomActor {
    room: MatchRoom,
    store: Arc<dyn MatchStateStore>,
    state: Option<MatchState>,
    loaded: bool,
}

impl RoomActor {
    async fn run(mut self, mut mailbox_rx: mpsc::Receiver<RoomMessage>) {
        let cancel = self.room.cancel.clone();
        let _stop_on_exit = StopOnExit(cancel.clone());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                message = mailbox_rx.recv() => {
                    let Some(message) = message else { break };
                    self.room.activity.touch();
                    self.handle(message).await;
                }
            }
        }
        mailbox_rx.close();
        debug!(match_id = %self.room.match_id, "Match room actor stopped");
    }

    async fn handle(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                role,
                handle,
                reply,
            } => {
                let _ = reply.send(self.join(role, handle).await);
            }
            RoomMessage::Apply {
                command,
                origin,
                reply,
            } => {
                let _ = reply.send(self.apply(command, origin).await);
            }
            RoomMessage::Snapshot { reply } => {
                let result = self.ensure_loaded().await.map(|_| self.state.clone());
                let _ = reply.send(result);
            }
        }
    }

    async fn ensure_loaded(&mut self) -> ServiceResult<()> {
        if self.loaded {
            return Ok(());
        }
        match self.store.fetch_one(&self.room.match_id).await {
            Ok(state) => {
                self.state = state;
                self.loaded = true;
                Ok(())
            }
            Err(e) => unexpected(e),
        }
    }

    async fn join(
        &mut self,
        role: ConnectionRole,
        handle: ConnectionHandle,
    ) -> ServiceResult<Option<MatchState>> {
        self.ensure_loaded().await?;
        if let Some(state) = &self.state {
            handle.send(OutboundFrame::game_stats(state).to_payload()?);
        }
        let connection_id = handle.connection_id;
        self.room.connections(role).insert(handle);
        info!(
            match_id = %self.room.match_id,
            %connection_id,
            role = role.as_str(),
            has_state = self.state.is_some(),
            "Connection joined match room"
        );
        Ok(self.state.clone())
    }

    async fn apply(
        &mut self,
        command: MatchCommand,
        origin: Option<ConnectionId>,
    ) -> ServiceResult<CommittedState> {
        self.ensure_loaded().await?;
        let next = resolve_command(self.state.as_ref(), &self.room.match_id, &command)?;
        let payload = OutboundFrame::game_stats(&next).to_payload()?;

        if let Err(e) = self.store.store(&next).await {
            error!(
                match_id = %self.room.match_id,
                command = command.name(),
                "Failed to persist match state: {e}"
            );
            return Err(AppError::MatchesPersistenceFailed);
        }

        self.state = Some(next.clone());
        self.room.broadcast_bytes(payload.clone(), origin);
        debug!(
            match_id = %self.room.match_id,
            command = command.name(),
            raid_number = next.raid_number,
            "Committed match state"
        );
        Ok(CommittedState {
            state: next,
            payload,
        })
    }
}

async fn forward_broadcasts(
    match_id: Arc<str>,
    mut broadcasts_rx: mpsc::Receiver<Broadcast>,
    scorers: ConnectionSet,
    viewers: ConnectionSet,
    cancel: CancellationToken,
    drained: CancellationToken,
) {
    let deliver = |broadcast: Broadcast| {
        viewers.broadcast(&broadcast.payload, None);
        scorers.broadcast(&broadcast.payload, broadcast.origin);
    };
    loop {
        tokio::select! {
            biased;
            broadcast = broadcasts_rx.recv() => match broadcast {
                Some(broadcast) => deliver(broadcast),
                None => break,
            },
            _ = cancel.cancelled() => {
                broadcasts_rx.close();
                while let Ok(broadcast) = broadcasts_rx.try_recv() {
                    deliver(broadcast);
                }
                break;
            }
        }
    }
    scorers.clear();
    viewers.clear();
    drained.cancel();
    debug!(%match_id, "Match room forwarder stopped");
}
