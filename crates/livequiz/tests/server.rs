//! Integration tests for the server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use livequiz::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn geo_quiz() -> SessionTemplate {
    let question = |text: &str, correct: &str, options: &[&str], timer_s| QuestionTemplate {
        text: text.into(),
        timer_s,
        correct_answer: correct.into(),
        options: options.iter().map(|o| o.to_string()).collect(),
    };
    SessionTemplate {
        name: "geo-quiz".into(),
        global_timer_s: 20,
        questions: vec![
            question("Capital of France?", "Paris", &["Paris", "Lyon"], 10),
            question("Answer to everything?", "42", &["41", "42"], 0),
        ],
    }
}

/// Starts a server on a random port and returns its address.
async fn start_server(idle_timeout: Duration) -> String {
    let server = LiveQuizServerBuilder::new()
        .bind("127.0.0.1:0")
        .idle_timeout(idle_timeout)
        .build(TemplateCatalog::from_templates([geo_quiz()]))
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: ClientMessage) {
    let text = serde_json::to_string(&Envelope::new(0, 0, msg)).expect("encode");
    ws.send(Message::Text(text.into())).await.expect("send");
}

/// Reads the next server envelope, skipping control frames.
async fn recv(ws: &mut ClientWs) -> Envelope<ServerMessage> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("server should reply in time")
            .expect("stream should stay open")
            .expect("frame should be valid");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("decode"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn request(ws: &mut ClientWs, msg: ClientMessage) -> ServerMessage {
    send(ws, msg).await;
    recv(ws).await.payload
}

async fn create(ws: &mut ClientWs) -> SessionCode {
    match request(ws, ClientMessage::Create { template: "geo-quiz".into() }).await {
        ServerMessage::Created { code } => code,
        other => panic!("expected Created, got {other:?}"),
    }
}

fn error_code(msg: &ServerMessage) -> Option<u16> {
    match msg {
        ServerMessage::Error { code, .. } => Some(*code),
        _ => None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_templates_returns_catalog_names() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;

    let reply = request(&mut ws, ClientMessage::ListTemplates).await;

    assert_eq!(
        reply,
        ServerMessage::TemplateList {
            templates: vec!["geo-quiz".into()]
        }
    );
}

#[tokio::test]
async fn test_create_unknown_template_returns_404() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;

    let reply = request(&mut ws, ClientMessage::Create { template: "history".into() }).await;

    assert_eq!(error_code(&reply), Some(404));
}

#[tokio::test]
async fn test_geo_quiz_over_websocket() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut host = connect(&addr).await;
    let mut bob = connect(&addr).await;

    let code = create(&mut host).await;
    assert_eq!(
        request(&mut host, ClientMessage::Watch { code: code.clone() }).await,
        ServerMessage::Watching { code: code.clone() }
    );

    let joined = request(
        &mut bob,
        ClientMessage::Join {
            code: code.clone(),
            name: "bob".into(),
        },
    )
    .await;
    assert!(matches!(joined, ServerMessage::Joined { ref name, .. } if name == "bob"));
    assert_eq!(
        recv(&mut host).await.payload,
        ServerMessage::Event {
            code: code.clone(),
            event: "roster".into()
        }
    );

    // Open Q0, answer it, move to Q1, answer wrong, finish.
    let steps = [Some("Paris"), Some("41"), None];
    send(&mut host, ClientMessage::Advance { code: code.clone() }).await;
    for answer in steps {
        // The Advanced reply and the pushed Event can arrive in either order.
        let mut saw_advanced = false;
        let mut saw_event = false;
        while !(saw_advanced && saw_event) {
            match recv(&mut host).await.payload {
                ServerMessage::Advanced { .. } => saw_advanced = true,
                ServerMessage::Event { event, .. } => {
                    assert_eq!(event, "update");
                    saw_event = true;
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        if let Some(value) = answer {
            assert_eq!(
                request(&mut bob, ClientMessage::Answer { value: value.into() }).await,
                ServerMessage::AnswerAccepted
            );
            send(&mut host, ClientMessage::Advance { code: code.clone() }).await;
        }
    }

    let ServerMessage::Snapshot { session } =
        request(&mut bob, ClientMessage::Snapshot { code: code.clone() }).await
    else {
        panic!("expected Snapshot");
    };
    assert_eq!(session.state, QuizState::Finished);
    assert!(session.current_question.is_none());
    assert_eq!(
        session.players[0].answers,
        vec![
            Some(Answer {
                value: "Paris".into(),
                correct: true
            }),
            Some(Answer {
                value: "41".into(),
                correct: false
            }),
        ]
    );
    assert_eq!(session.players[0].score, 1);
}

#[tokio::test]
async fn test_answer_before_join_returns_400() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;

    let reply = request(&mut ws, ClientMessage::Answer { value: "Paris".into() }).await;

    assert_eq!(error_code(&reply), Some(400));
}

#[tokio::test]
async fn test_answer_before_start_returns_409() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;
    let code = create(&mut ws).await;
    request(&mut ws, ClientMessage::Join { code, name: "bob".into() }).await;

    let reply = request(&mut ws, ClientMessage::Answer { value: "Paris".into() }).await;

    assert_eq!(error_code(&reply), Some(409));
}

#[tokio::test]
async fn test_duplicate_join_returns_409() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let code = create(&mut a).await;

    request(&mut a, ClientMessage::Join { code: code.clone(), name: "alice".into() }).await;
    let reply = request(&mut b, ClientMessage::Join { code, name: "alice".into() }).await;

    assert_eq!(error_code(&reply), Some(409));
}

#[tokio::test]
async fn test_unknown_session_returns_404() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;

    let reply = request(
        &mut ws,
        ClientMessage::Join {
            code: SessionCode::from("ZZZZZZ"),
            name: "bob".into(),
        },
    )
    .await;

    assert_eq!(error_code(&reply), Some(404));
}

#[tokio::test]
async fn test_resume_restores_identity_on_new_connection() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut host = connect(&addr).await;
    let code = create(&mut host).await;

    let handle = {
        let mut first = connect(&addr).await;
        match request(&mut first, ClientMessage::Join { code: code.clone(), name: "bob".into() }).await {
            ServerMessage::Joined { handle, .. } => handle,
            other => panic!("expected Joined, got {other:?}"),
        }
    };
    request(&mut host, ClientMessage::Advance { code: code.clone() }).await;

    let mut second = connect(&addr).await;
    let resumed = request(&mut second, ClientMessage::Resume { code: code.clone(), handle }).await;
    assert!(matches!(resumed, ServerMessage::Joined { ref name, .. } if name == "bob"));

    assert_eq!(
        request(&mut second, ClientMessage::Answer { value: "Paris".into() }).await,
        ServerMessage::AnswerAccepted
    );
}

#[tokio::test]
async fn test_malformed_frame_returns_400_and_keeps_connection() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    let reply = recv(&mut ws).await.payload;
    assert_eq!(error_code(&reply), Some(400));

    let reply = request(&mut ws, ClientMessage::ListTemplates).await;
    assert!(matches!(reply, ServerMessage::TemplateList { .. }));
}

#[tokio::test]
async fn test_replies_are_numbered_in_order() {
    let addr = start_server(Duration::from_secs(30)).await;
    let mut ws = connect(&addr).await;

    send(&mut ws, ClientMessage::ListTemplates).await;
    send(&mut ws, ClientMessage::ListTemplates).await;

    let first = recv(&mut ws).await.seq;
    let second = recv(&mut ws).await.seq;
    assert_eq!(second, first + 1);
}

#[tokio::test]
async fn test_closed_watcher_is_unsubscribed() {
    let server = LiveQuizServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(TemplateCatalog::from_templates([geo_quiz()]))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let registry = std::sync::Arc::clone(server.registry());
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let mut host = connect(&addr).await;
    let code = create(&mut host).await;
    let session = registry.lookup(code.as_str()).unwrap();

    let mut viewer = connect(&addr).await;
    request(&mut viewer, ClientMessage::Watch { code: code.clone() }).await;
    assert_eq!(session.broadcaster().listener_count(), 1);

    send(&mut viewer, ClientMessage::Disconnect { reason: "bye".into() }).await;
    drop(viewer);

    // The handler task notices asynchronously; poll briefly.
    for _ in 0..50 {
        if session.broadcaster().listener_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(session.broadcaster().listener_count(), 0);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_server(Duration::from_millis(100)).await;
    let mut ws = connect(&addr).await;

    let end = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;

    assert!(end.is_ok(), "idle connection should be closed by the server");
}

#[tokio::test]
async fn test_from_config_serves_templates_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let template = serde_json::to_string(&geo_quiz()).unwrap();
    std::fs::write(dir.path().join("capitals.json"), template.replace("geo-quiz", "")).unwrap();

    let config = ServerConfig {
        bind: "127.0.0.1:0".into(),
        templates_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let catalog = TemplateCatalog::load(&DirTemplateStore::new(&config.templates_dir));
    let server = LiveQuizServerBuilder::from_config(&config)
        .build(catalog)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let mut ws = connect(&addr).await;
    assert_eq!(
        request(&mut ws, ClientMessage::ListTemplates).await,
        ServerMessage::TemplateList {
            templates: vec!["capitals".into()]
        }
    );
    let reply = request(&mut ws, ClientMessage::Create { template: "capitals".into() }).await;
    assert!(matches!(reply, ServerMessage::Created { .. }));
}

/// Like `start_server`, but also hands back the registry.
async fn start_server_with_registry(
    idle_timeout: Duration,
) -> (String, std::sync::Arc<SessionRegistry>) {
    let server = LiveQuizServerBuilder::new()
        .bind("127.0.0.1:0")
        .idle_timeout(idle_timeout)
        .build(TemplateCatalog::from_templates([geo_quiz()]))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let registry = std::sync::Arc::clone(server.registry());
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, registry)
}

#[tokio::test]
async fn test_watching_connection_outlives_idle_timeout() {
    let (addr, registry) = start_server_with_registry(Duration::from_millis(300)).await;
    let mut host = connect(&addr).await;
    let code = create(&mut host).await;
    let session = registry.lookup(code.as_str()).unwrap();

    let mut viewer = connect(&addr).await;
    request(&mut viewer, ClientMessage::Watch { code: code.clone() }).await;

    // Silent for longer than the idle timeout, then a steady stream.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let joiner = tokio::spawn(async move {
        for i in 0..10 {
            session.join(&format!("player-{i}")).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    for _ in 0..10 {
        assert_eq!(
            recv(&mut viewer).await.payload,
            ServerMessage::Event {
                code: code.clone(),
                event: "roster".into()
            }
        );
    }
    joiner.await.unwrap();
}

#[tokio::test]
async fn test_unwatch_replies_and_stops_events() {
    let (addr, registry) = start_server_with_registry(Duration::from_secs(30)).await;
    let mut host = connect(&addr).await;
    let code = create(&mut host).await;
    let session = registry.lookup(code.as_str()).unwrap();

    let mut viewer = connect(&addr).await;
    assert_eq!(
        request(&mut viewer, ClientMessage::Unwatch).await,
        ServerMessage::Unwatched { code: None }
    );

    request(&mut viewer, ClientMessage::Watch { code: code.clone() }).await;
    assert_eq!(session.broadcaster().listener_count(), 1);
    assert_eq!(
        request(&mut viewer, ClientMessage::Unwatch).await,
        ServerMessage::Unwatched {
            code: Some(code.clone())
        }
    );
    assert_eq!(session.broadcaster().listener_count(), 0);

    // The next frame is the reply to this request, not a roster event.
    session.join("bob").unwrap();
    let reply = request(&mut viewer, ClientMessage::ListTemplates).await;
    assert!(matches!(reply, ServerMessage::TemplateList { .. }));
}

#[tokio::test]
async fn test_removed_session_sends_404_to_watcher() {
    let (addr, registry) = start_server_with_registry(Duration::from_secs(30)).await;
    let mut host = connect(&addr).await;
    let code = create(&mut host).await;

    let mut viewer = connect(&addr).await;
    request(&mut viewer, ClientMessage::Watch { code: code.clone() }).await;
    registry.remove(code.as_str()).unwrap();

    assert_eq!(error_code(&recv(&mut viewer).await.payload), Some(404));

    // The watch is gone; a fresh Unwatch has nothing to report.
    assert_eq!(
        request(&mut viewer, ClientMessage::Unwatch).await,
        ServerMessage::Unwatched { code: None }
    );
}
