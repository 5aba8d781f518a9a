use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use agentwire_core::config::AppConfig;
use agentwire_gateway::{EventKind, GatewayServer, ServerEvent};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start() -> TestServer {
    start_paced(0).await
}

async fn start_paced(step_delay_ms: u64) -> TestServer {
    let mut config = AppConfig::default();
    config.workflow.step_delay_ms = step_delay_ms;

    let server = GatewayServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move { server.serve(listener, token).await });

    TestServer { addr, shutdown }
}

impl TestServer {
    fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, session_id: &str) -> Client {
        let url = format!("ws://{}/api/v1/ws/{}", self.addr, session_id);
        let (ws, _) = connect_async(url).await.unwrap();
        ws
    }
}

/// Next event frame, or None once the server closed the socket.
async fn next_event(ws: &mut Client) -> Option<ServerEvent> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")?;
        match msg {
            Ok(Message::Text(text)) => return Some(ServerEvent::from_json(text.as_str()).unwrap()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

async fn send_user_message(ws: &mut Client, content: &str) {
    let frame = serde_json::json!({
        "type": "user_message",
        "content": content,
        "timestamp": "2024-01-01T00:00:00Z"
    });
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

/// Collect events until the turn completes or fails.
async fn collect_turn(ws: &mut Client) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Some(event) = next_event(ws).await {
        let done = matches!(
            event.kind,
            EventKind::AgentProcessingComplete | EventKind::Error
        );
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[tokio::test(flavor = "multi_thread")]
async fn welcome_then_ordered_turn() {
    let server = start().await;
    let mut ws = server.connect("turn-1").await;

    let welcome = next_event(&mut ws).await.unwrap();
    assert_eq!(welcome.kind, EventKind::ConnectionEstablished);
    assert_eq!(welcome.session_id, "turn-1");

    send_user_message(&mut ws, "analyze this data").await;
    let events = collect_turn(&mut ws).await;
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::AgentProcessingStart,
            EventKind::AgentStepDetailed,
            EventKind::AgentStepDetailed,
            EventKind::AgentResponse,
            EventKind::AgentProcessingComplete,
        ]
    );

    let routed = events[2].step_info.as_ref().unwrap();
    assert_eq!(routed.node_name.as_deref(), Some("analyze_content"));
    assert_eq!(routed.step_number, 2);

    let response = events[3].step_info.as_ref().unwrap();
    assert_eq!(response.confidence_score, 0.85);
    assert_eq!(response.tools_used, vec!["analyze_text_content"]);

    // Second turn on the same session keeps the tool history.
    send_user_message(&mut ws, "search for rust").await;
    let events = collect_turn(&mut ws).await;
    let response = events
        .iter()
        .find(|e| e.kind == EventKind::AgentResponse)
        .unwrap();
    assert_eq!(
        response.step_info.as_ref().unwrap().tools_used,
        vec!["analyze_text_content", "search_knowledge_base"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_frames_keep_the_session_open() {
    let server = start().await;
    let mut ws = server.connect("bad-frames").await;
    next_event(&mut ws).await.unwrap();

    ws.send(Message::Text("not json".into())).await.unwrap();
    let err = next_event(&mut ws).await.unwrap();
    assert_eq!(err.kind, EventKind::Error);

    ws.send(Message::Text(r#"{"type":"ping"}"#.into())).await.unwrap();
    let err = next_event(&mut ws).await.unwrap();
    assert_eq!(err.kind, EventKind::Error);

    send_user_message(&mut ws, "hello").await;
    let events = collect_turn(&mut ws).await;
    assert_eq!(events.last().unwrap().kind, EventKind::AgentProcessingComplete);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_session_is_rejected() {
    let server = start().await;
    let mut first = server.connect("dup").await;
    next_event(&mut first).await.unwrap();

    let mut second = server.connect("dup").await;
    let err = next_event(&mut second).await.unwrap();
    assert_eq!(err.kind, EventKind::Error);
    assert!(err.content.contains("dup"));
    assert!(next_event(&mut second).await.is_none());

    // The original connection is unaffected.
    send_user_message(&mut first, "hello").await;
    let events = collect_turn(&mut first).await;
    assert_eq!(events.last().unwrap().kind, EventKind::AgentProcessingComplete);
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_close_is_reported_once() {
    let server = start().await;
    let mut ws = server.connect("closable").await;
    next_event(&mut ws).await.unwrap();
    send_user_message(&mut ws, "hello").await;
    collect_turn(&mut ws).await;

    let http = reqwest::Client::new();
    let listed: Vec<serde_json::Value> = http
        .get(server.http("/api/v1/streaming/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["session_id"], "closable");
    assert_eq!(listed[0]["status"], "open");
    assert_eq!(listed[0]["message_count"], 1);

    let url = server.http("/api/v1/streaming/sessions/closable");
    let first = http.delete(&url).send().await.unwrap();
    assert_eq!(first.status(), 200);
    let body: serde_json::Value = first.json().await.unwrap();
    assert_eq!(body["status"], "session_closed");

    let second = http.delete(&url).send().await.unwrap();
    assert_eq!(second.status(), 404);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["detail"], "Session not found");

    // The client sees its socket closed.
    assert!(next_event(&mut ws).await.is_none());

    let listed: Vec<serde_json::Value> = http
        .get(server.http("/api/v1/streaming/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    let closed: serde_json::Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(closed["status"], "closed");

    let missing = http
        .get(server.http("/api/v1/streaming/sessions/never"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_close_interrupts_a_running_turn() {
    let server = start_paced(1000).await;
    let mut ws = server.connect("busy").await;
    next_event(&mut ws).await.unwrap();

    send_user_message(&mut ws, "analyze this data").await;
    let start = next_event(&mut ws).await.unwrap();
    assert_eq!(start.kind, EventKind::AgentProcessingStart);
    let step = next_event(&mut ws).await.unwrap();
    assert_eq!(step.kind, EventKind::AgentStepDetailed);

    let http = reqwest::Client::new();
    let url = server.http("/api/v1/streaming/sessions/busy");
    let resp = http.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    // The socket closes well before the paced turn could have finished.
    let trailing = tokio::time::timeout(Duration::from_millis(800), async {
        let mut seen = Vec::new();
        while let Some(event) = next_event(&mut ws).await {
            seen.push(event.kind);
        }
        seen
    })
    .await
    .expect("socket was not closed");
    assert!(!trailing.contains(&EventKind::AgentProcessingComplete));
    assert!(!trailing.contains(&EventKind::AgentResponse));

    let listed: Vec<serde_json::Value> = http
        .get(server.http("/api/v1/streaming/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    // The id is free again once the interrupted loop has released it.
    let mut again = server.connect("busy").await;
    let welcome = next_event(&mut again).await.unwrap();
    assert_eq!(welcome.kind, EventKind::ConnectionEstablished);
}

#[tokio::test(flavor = "multi_thread")]
async fn broadcast_reaches_every_live_session() {
    let server = start().await;
    let mut a = server.connect("a").await;
    let mut b = server.connect("b").await;
    next_event(&mut a).await.unwrap();
    next_event(&mut b).await.unwrap();

    let resp: serde_json::Value = reqwest::Client::new()
        .post(server.http("/api/v1/streaming/broadcast"))
        .json(&serde_json::json!({ "content": "maintenance at noon" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["status"], "broadcast_sent");
    assert_eq!(resp["message"], "maintenance at noon");
    assert_eq!(resp["delivered"], 2);

    for (ws, id) in [(&mut a, "a"), (&mut b, "b")] {
        let event = next_event(ws).await.unwrap();
        assert_eq!(event.kind, EventKind::Broadcast);
        assert_eq!(event.session_id, id);
        assert_eq!(event.sender.as_deref(), Some("system"));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn broadcast_survives_a_vanishing_client() {
    let server = start().await;
    let mut a = server.connect("stays").await;
    let b = server.connect("leaves").await;
    next_event(&mut a).await.unwrap();
    drop(b);

    let resp = reqwest::Client::new()
        .post(server.http("/api/v1/streaming/broadcast"))
        .json(&serde_json::json!({ "content": "still here?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let event = next_event(&mut a).await.unwrap();
    assert_eq!(event.kind, EventKind::Broadcast);
    assert_eq!(event.content, "still here?");
}

#[tokio::test(flavor = "multi_thread")]
async fn actions_dispatch_to_collaborators() {
    let server = start().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    let http = reqwest::Client::new();
    let url = server.http("/api/v1/actions");

    let done: serde_json::Value = http
        .post(&url)
        .json(&serde_json::json!({
            "action": "file_search",
            "directory": dir.path().to_string_lossy(),
            "pattern": ".txt"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done["status"], "completed");
    assert_eq!(done["result"].as_array().unwrap().len(), 1);

    let failed: serde_json::Value = http
        .post(&url)
        .json(&serde_json::json!({ "action": "weather_alerts", "state": "Texas" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(failed["status"], "failed");

    let unconfigured: serde_json::Value = http
        .post(&url)
        .json(&serde_json::json!({
            "action": "send_email",
            "recipient": "ops@example.com",
            "subject": "s",
            "body": "b"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unconfigured["status"], "failed");

    let unknown = http
        .post(&url)
        .json(&serde_json::json!({ "action": "translate" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 404);

    let health: serde_json::Value = http
        .get(server.http("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}
