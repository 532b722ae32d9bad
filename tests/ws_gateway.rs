//! Scorer and viewer websocket flows

mod common;

use common::{StaticTokenAuthorizer, initial_state, spawn_server, spawn_server_with};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(url: String) -> Socket {
    let (socket, _) = connect_async(url).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next text frame as JSON, `None` once the server closed the socket
async fn recv(socket: &mut Socket) -> Option<Value> {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for a frame")?;
        match message.ok()? {
            Message::Text(text) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

async fn assert_silent(socket: &mut Socket) {
    let next = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

async fn join(socket: &mut Socket, match_id: &str) {
    send(socket, json!({"type": "join", "matchId": match_id})).await;
}

#[tokio::test]
async fn first_frame_must_be_a_join() {
    let server = spawn_server().await;
    let mut scorer = connect(server.ws_url("/ws/scorer")).await;
    send(&mut scorer, json!({"raidType": "empty"})).await;

    let frame = recv(&mut scorer).await.unwrap();
    assert_eq!(frame["type"], "requestJoin");
    assert!(recv(&mut scorer).await.is_none());
}

#[tokio::test]
async fn scorer_seeds_match_and_viewers_follow() {
    let server = spawn_server().await;

    let mut scorer = connect(server.ws_url("/ws/scorer")).await;
    join(&mut scorer, "m1").await;
    assert_eq!(recv(&mut scorer).await.unwrap()["type"], "requestInit");

    send(&mut scorer, json!({"type": "gameStats", "data": initial_state()})).await;
    let ack = recv(&mut scorer).await.unwrap();
    assert_eq!(ack["type"], "gameStats");
    assert_eq!(ack["data"]["matchId"], "m1");

    let mut viewer = connect(server.ws_url("/ws/viewer")).await;
    join(&mut viewer, "m1").await;
    let snapshot = recv(&mut viewer).await.unwrap();
    assert_eq!(snapshot["data"]["teamA"]["name"], "Tigers");
    assert_eq!(snapshot["data"]["raidNumber"], 0);

    send(
        &mut scorer,
        json!({
            "raidType": "defense",
            "raiderId": "p1",
            "defenderIds": ["p4", "p5", "p6"],
            "raidingTeam": "A",
            "bonusTaken": false,
            "emptyRaidCounts": {"teamA": 0, "teamB": 0}
        }),
    )
    .await;

    let ack = recv(&mut scorer).await.unwrap();
    assert_eq!(ack["data"]["teamB"]["score"], 2);
    let update = recv(&mut viewer).await.unwrap();
    assert_eq!(update["data"]["teamB"]["score"], 2);
    assert_eq!(update["data"]["playerStats"]["p1"]["status"], "out");
    assert_eq!(update["data"]["lastRaidDetails"]["superTackle"], true);
    assert_eq!(
        update["extra"]["commentaryList"][0],
        "Defence SUCCESS! Asha stopped by Ravi, Kiran, Dev. Super Tackle!"
    );
}

#[tokio::test]
async fn rejected_raid_only_reaches_the_sender() {
    let server = spawn_server().await;
    let mut scorer = connect(server.ws_url("/ws/scorer")).await;
    join(&mut scorer, "m1").await;
    recv(&mut scorer).await.unwrap();
    send(&mut scorer, json!({"type": "initialState", "data": initial_state()})).await;
    recv(&mut scorer).await.unwrap();

    let mut viewer = connect(server.ws_url("/ws/viewer")).await;
    join(&mut viewer, "m1").await;
    recv(&mut viewer).await.unwrap();

    send(
        &mut scorer,
        json!({"raidType": "successful", "raiderId": "p4", "defenderIds": ["p1"], "raidingTeam": "B"}),
    )
    .await;
    let error = recv(&mut scorer).await.unwrap();
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "raids.wrong_turn");
    assert_silent(&mut viewer).await;
}

#[tokio::test]
async fn second_scorer_receives_broadcasts() {
    let server = spawn_server().await;
    let mut first = connect(server.ws_url("/ws/scorer")).await;
    join(&mut first, "m1").await;
    recv(&mut first).await.unwrap();
    send(&mut first, json!({"type": "initialState", "data": initial_state()})).await;
    recv(&mut first).await.unwrap();

    let mut second = connect(server.ws_url("/ws/scorer")).await;
    join(&mut second, "m1").await;
    assert_eq!(recv(&mut second).await.unwrap()["type"], "gameStats");

    send(
        &mut first,
        json!({"type": "lobbyTouch", "data": {"touchedPlayerId": "p4", "isRaider": false, "scoringTeam": "A"}}),
    )
    .await;
    assert_eq!(recv(&mut first).await.unwrap()["data"]["teamA"]["score"], 1);
    let update = recv(&mut second).await.unwrap();
    assert_eq!(update["data"]["teamA"]["score"], 1);
    assert_eq!(update["data"]["playerStats"]["p4"]["status"], "out");
    assert_silent(&mut first).await;
}

#[tokio::test]
async fn matches_are_isolated() {
    let server = spawn_server().await;
    let mut viewer_one = connect(server.ws_url("/ws/viewer")).await;
    let mut viewer_two = connect(server.ws_url("/ws/viewer")).await;
    join(&mut viewer_one, "m1").await;
    join(&mut viewer_two, "m2").await;

    let mut scorer = connect(server.ws_url("/ws/scorer")).await;
    join(&mut scorer, "m1").await;
    recv(&mut scorer).await.unwrap();
    send(&mut scorer, json!({"type": "initialState", "data": initial_state()})).await;

    let update = recv(&mut viewer_one).await.unwrap();
    assert_eq!(update["data"]["matchId"], "m1");
    assert_silent(&mut viewer_two).await;
}

#[tokio::test]
async fn unauthorized_scorer_is_closed() {
    let server = spawn_server_with(Arc::new(StaticTokenAuthorizer)).await;

    let mut scorer = connect(server.ws_url("/ws/scorer?token=wrong")).await;
    join(&mut scorer, "m1").await;
    let frame = recv(&mut scorer).await.unwrap();
    assert_eq!(frame["code"], "unauthorized");
    assert!(recv(&mut scorer).await.is_none());

    let mut scorer = connect(server.ws_url("/ws/scorer?token=letmein")).await;
    join(&mut scorer, "m1").await;
    assert_eq!(recv(&mut scorer).await.unwrap()["type"], "requestInit");
}

#[tokio::test]
async fn ending_a_match_closes_its_connections() {
    let server = spawn_server().await;
    let mut scorer = connect(server.ws_url("/ws/scorer")).await;
    join(&mut scorer, "m1").await;
    recv(&mut scorer).await.unwrap();
    send(&mut scorer, json!({"type": "initialState", "data": initial_state()})).await;
    recv(&mut scorer).await.unwrap();

    let mut viewer = connect(server.ws_url("/ws/viewer")).await;
    join(&mut viewer, "m1").await;
    recv(&mut viewer).await.unwrap();

    let resp = reqwest::Client::new()
        .post(server.http_url("/api/matches/m1/end"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let last = recv(&mut viewer).await.unwrap();
    assert_eq!(last["data"]["matchEnded"], true);
    assert!(recv(&mut viewer).await.is_none());

    let last = recv(&mut scorer).await.unwrap();
    assert_eq!(last["data"]["matchEnded"], true);
    assert!(recv(&mut scorer).await.is_none());
    assert!(server.state.rooms.is_empty());
}
