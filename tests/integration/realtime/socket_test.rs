//! The `/ws` transport over a real listener

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use studyhub::backend::server::build_router;

use crate::common::{bearer_token, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the app's router on an ephemeral port
async fn serve(app: &TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(app.state.clone());
    tokio::spawn(async move { axum::serve(listener, router).await });
    addr.to_string()
}

async fn connect(addr: &str, user: &str) -> Client {
    let url = format!("ws://{addr}/ws?access_token={}", bearer_token(user));
    let (client, _) = connect_async(url).await.expect("websocket handshake");
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::text(frame.to_string())).await.unwrap();
}

async fn next_frame(client: &mut Client) -> Value {
    loop {
        let message = timeout(Duration::from_secs(2), client.next())
            .await
            .expect("frame within two seconds")
            .expect("socket open")
            .expect("readable frame");
        if let Message::Text(_) = message {
            return serde_json::from_str(message.to_text().unwrap()).unwrap();
        }
    }
}

async fn join(client: &mut Client, room_id: &str) {
    send(client, json!({ "event": "join-room", "data": { "roomId": room_id } })).await;
    let reply = next_frame(client).await;
    assert_eq!(reply["event"], "room-joined");
    assert_eq!(reply["data"]["roomId"], room_id);
}

async fn wait_for_connections(app: &TestApp, expected: u64) {
    for _ in 0..50 {
        if app.get("/health", None).await.body["connections"] == expected {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("connection count never reached {expected}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_socket_relay_and_teardown() {
    let app = TestApp::memory();
    let addr = serve(&app).await;
    let room = app.state.rooms.resolve_direct_room("ana", "ben").await.unwrap();
    let room_id = room.id.as_str();

    let mut ana = connect(&addr, "ana").await;
    let mut ben = connect(&addr, "ben").await;
    join(&mut ana, room_id).await;
    join(&mut ben, room_id).await;
    wait_for_connections(&app, 2).await;

    send(
        &mut ana,
        json!({ "event": "send-message", "data": { "roomId": room_id, "content": "on my way" } }),
    )
    .await;

    let received = next_frame(&mut ben).await;
    assert_eq!(received["event"], "receive-message");
    assert_eq!(received["data"]["content"], "on my way");
    assert_eq!(received["data"]["sender"]["id"], "ana");
    assert_eq!(received["data"]["seq"], 1);

    // no echo to the sending connection
    assert!(timeout(Duration::from_millis(200), ana.next()).await.is_err());

    drop(ben);
    wait_for_connections(&app, 1).await;
    assert_eq!(app.state.broker.subscriber_count(&room.id).await, 1);

    // the message outlives the connection that received it
    let history = app.state.messages.history(&room.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_frames_are_reported_not_fatal() {
    let app = TestApp::memory();
    let addr = serve(&app).await;
    let mut ana = connect(&addr, "ana").await;

    ana.send(Message::text("{not json")).await.unwrap();
    let reply = next_frame(&mut ana).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["code"], "bad_frame");

    send(&mut ana, json!({ "event": "join-room", "data": { "roomId": "topic:nowhere" } })).await;
    let reply = next_frame(&mut ana).await;
    assert_eq!(reply["data"]["code"], "unknown_room");
    wait_for_connections(&app, 1).await;
}
