use crate::api::RequestContext;
use crate::api::ws::Connection;
use crate::common::context::Context;
use crate::models::frames::OutboundFrame;
use crate::rooms::connections::ConnectionRole;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::WebSocket;
use axum::response::Response;
use tracing::info;

pub async fn upgrade(ctx: RequestContext, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve(ctx, socket))
}

/// Viewers only receive: the snapshot on join, then every broadcast
async fn serve(ctx: RequestContext, socket: WebSocket) {
    let mut connection = Connection::open(socket, ctx.rooms().config().outbound_capacity);
    let connection_id = connection.connection_id();

    let Some(match_id) = connection.await_join().await else {
        connection.close().await;
        return;
    };
    let joined = ctx
        .rooms()
        .join(&match_id, ConnectionRole::Viewer, connection.handle.clone())
        .await;
    let room = match joined {
        Ok((room, _)) => room,
        Err(e) => {
            connection.send(&OutboundFrame::from_error(&e));
            connection.close().await;
            return;
        }
    };
    info!(%connection_id, %match_id, "Viewer connected");

    loop {
        tokio::select! {
            _ = room.closed() => break,
            text = connection.next_text() => {
                if text.is_none() {
                    break;
                }
            }
        }
    }

    room.leave(ConnectionRole::Viewer, connection_id);
    connection.close().await;
    info!(%connection_id, %match_id, "Viewer disconnected");
}
