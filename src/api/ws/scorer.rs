use crate::api::RequestContext;
use crate::api::ws::Connection;
use crate::common::axum_token::ScorerToken;
use crate::common::context::Context;
use crate::events::{self, ScorerSession};
use crate::models::frames::OutboundFrame;
use crate::rooms::connections::ConnectionRole;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::WebSocket;
use axum::response::Response;
use tracing::{info, warn};

pub async fn upgrade(ctx: RequestContext, token: ScorerToken, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve(ctx, token, socket))
}

async fn serve(ctx: RequestContext, token: ScorerToken, socket: WebSocket) {
    let mut connection = Connection::open(socket, ctx.rooms().config().outbound_capacity);
    let connection_id = connection.connection_id();

    let Some(match_id) = connection.await_join().await else {
        connection.close().await;
        return;
    };
    if let Err(e) = ctx.authorizer().authorize(token.as_deref(), &match_id).await {
        warn!(%connection_id, %match_id, code = e.code(), "Scorer was not authorized");
        connection.send(&OutboundFrame::from_error(&e));
        connection.close().await;
        return;
    }

    let joined = ctx
        .rooms()
        .join(&match_id, ConnectionRole::Scorer, connection.handle.clone())
        .await;
    let (room, state) = match joined {
        Ok(joined) => joined,
        Err(e) => {
            connection.send(&OutboundFrame::from_error(&e));
            connection.close().await;
            return;
        }
    };
    if state.is_none() {
        connection.send(&OutboundFrame::RequestInit);
    }
    info!(%connection_id, %match_id, "Scorer connected");

    let session = ScorerSession {
        connection_id,
        match_id,
        room,
    };
    loop {
        tokio::select! {
            _ = session.room.closed() => break,
            text = connection.next_text() => {
                let Some(text) = text else { break };
                for reply in events::handle_frame(&session, &text).await {
                    connection.handle.send(reply);
                }
            }
        }
    }

    session.room.leave(ConnectionRole::Scorer, connection_id);
    connection.close().await;
    info!(%connection_id, match_id = %session.match_id, "Scorer disconnected");
}
