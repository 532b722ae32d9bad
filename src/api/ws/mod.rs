pub mod scorer;
pub mod viewer;

use crate::models::frames::{InboundFrame, OutboundFrame};
use crate::rooms::connections::{ConnectionHandle, ConnectionId};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const JOIN_TIMEOUT: Duration = Duration::from_secs(30);

/// One upgraded websocket: the read half stays with the session,
/// writes go through the outbound queue drained by a single writer task.
pub struct Connection {
    pub handle: ConnectionHandle,
    stream: SplitStream<WebSocket>,
    closing: CancellationToken,
    writer: JoinHandle<()>,
}

impl Connection {
    pub fn open(socket: WebSocket, outbound_capacity: usize) -> Self {
        let (sink, stream) = socket.split();
        let (handle, outbound_rx) = ConnectionHandle::new(outbound_capacity);
        let closing = CancellationToken::new();
        let writer = tokio::spawn(write_outbound(
            handle.connection_id,
            sink,
            outbound_rx,
            closing.clone(),
        ));
        Self {
            handle,
            stream,
            closing,
            writer,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.handle.connection_id
    }

    pub fn send(&self, frame: &OutboundFrame) -> bool {
        match frame.to_payload() {
            Ok(payload) => self.handle.send(payload),
            Err(_) => false,
        }
    }

    /// Next text frame from the peer, `None` once it closed or failed
    pub async fn next_text(&mut self) -> Option<Utf8Bytes> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => {
                    debug!(connection_id = %self.connection_id(), "Websocket read failed: {e}");
                    return None;
                }
            }
        }
        None
    }

    /// Waits for `{"type": "join", "matchId": ...}` as the first frame.
    /// Anything else is answered with `requestJoin`.
    pub async fn await_join(&mut self) -> Option<String> {
        let text = tokio::time::timeout(JOIN_TIMEOUT, self.next_text())
            .await
            .ok()
            .flatten()?;
        match InboundFrame::parse(&text) {
            Ok(InboundFrame::Join { match_id }) if !match_id.is_empty() => Some(match_id),
            _ => {
                self.send(&OutboundFrame::RequestJoin);
                None
            }
        }
    }

    /// Flushes queued frames, then closes the socket
    pub async fn close(self) {
        self.closing.cancel();
        let _ = self.writer.await;
    }
}

async fn write_outbound(
    connection_id: ConnectionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Utf8Bytes>,
    closing: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            payload = outbound_rx.recv() => {
                let Some(payload) = payload else { break };
                if let Err(e) = sink.send(Message::Text(payload)).await {
                    debug!(%connection_id, "Websocket write failed: {e}");
                    return;
                }
            }
            _ = closing.cancelled() => break,
        }
    }
    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
}
