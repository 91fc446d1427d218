use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use weft_core::config::SparkConfig;
use weft_core::error::WeftError;
use weft_core::traits::ChatModel;
use weft_core::types::{ChatMessage, ChatRequest};
use weft_llm::SparkClient;

/// What the fake service does after reading the request frame.
enum Script {
    /// Send the frames, then wait for the client to hang up.
    Reply(Vec<String>),
    /// Ping first, then behave like `Reply`.
    PingThenReply(Vec<String>),
    /// Send the frames, then close from the server side.
    ReplyThenClose(Vec<String>),
    /// Never answer.
    Silent,
}

fn frame(code: i64, status: i64, content: &str) -> String {
    json!({
        "header": {"code": code, "message": "server says no", "sid": "cht000", "status": status},
        "payload": {"choices": {"status": status, "seq": 0, "text": [
            {"content": content, "role": "assistant", "index": 0}
        ]}}
    })
    .to_string()
}

/// Start a one-shot WebSocket server. The handle yields the request frame
/// and the query string the client connected with.
async fn serve(script: Script) -> (String, JoinHandle<(serde_json::Value, bool)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let request = match ws.next().await {
            Some(Ok(Message::Text(t))) => serde_json::from_str(t.as_str()).unwrap(),
            other => panic!("expected request frame, got {other:?}"),
        };

        let mut client_closed = false;
        let script = match script {
            Script::PingThenReply(frames) => {
                ws.send(Message::Ping(b"hb".to_vec().into())).await.unwrap();
                Script::Reply(frames)
            }
            other => other,
        };
        match script {
            Script::Reply(frames) => {
                for f in frames {
                    ws.send(Message::Text(f.into())).await.unwrap();
                }
                while let Some(msg) = ws.next().await {
                    match msg {
                        Ok(Message::Close(_)) | Err(_) => {
                            client_closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
            }
            Script::ReplyThenClose(frames) => {
                for f in frames {
                    ws.send(Message::Text(f.into())).await.unwrap();
                }
                let _ = ws.close(None).await;
            }
            Script::Silent => {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Script::PingThenReply(_) => unreachable!(),
        }
        (request, client_closed)
    });

    (format!("ws://{addr}/v3.5/chat"), handle)
}

fn client(url: String) -> SparkClient {
    let config = SparkConfig {
        app_id: "app-1".into(),
        api_key: "test-key".into(),
        api_secret: "test-secret".into(),
        api_url: url,
        ..SparkConfig::default()
    };
    SparkClient::new(config).with_timeouts(Duration::from_secs(5), Duration::from_secs(5))
}

fn request(prompt: &str) -> ChatRequest {
    ChatRequest {
        domain: "generalv3.5".into(),
        temperature: 0.5,
        max_tokens: 2048,
        messages: vec![ChatMessage::user(prompt)],
    }
}

#[tokio::test]
async fn test_accumulates_fragments_in_order() {
    let (url, server) = serve(Script::Reply(vec![
        frame(0, 0, "A"),
        frame(0, 1, "B"),
        frame(0, 2, "C"),
    ]))
    .await;

    let reply = client(url).chat(request("hello")).await.unwrap();
    assert_eq!(reply, "ABC");

    let (sent, client_closed) = server.await.unwrap();
    assert!(client_closed, "client must close after the final frame");
    assert_eq!(sent["header"]["app_id"], "app-1");
    assert_eq!(sent["header"]["uid"], "workflow-user");
    assert_eq!(sent["parameter"]["chat"]["top_k"], 4);
    assert_eq!(sent["parameter"]["chat"]["max_tokens"], 2048);
    assert_eq!(sent["payload"]["message"]["text"][0]["content"], "hello");
    assert_eq!(sent["payload"]["message"]["text"][0]["role"], "user");
}

#[tokio::test]
async fn test_remote_error_code() {
    let (url, server) = serve(Script::Reply(vec![
        frame(0, 0, "A"),
        frame(10013, 1, "B"),
        frame(0, 2, "C"),
    ]))
    .await;

    let err = client(url).chat(request("hello")).await.unwrap_err();
    match err {
        WeftError::RemoteApi { code, message } => {
            assert_eq!(code, 10013);
            assert_eq!(message, "server says no");
        }
        other => panic!("unexpected error: {other}"),
    }
    let (_, client_closed) = server.await.unwrap();
    assert!(client_closed);
}

#[tokio::test]
async fn test_close_before_final_frame() {
    let (url, _server) = serve(Script::ReplyThenClose(vec![frame(0, 0, "A"), frame(0, 1, "B")])).await;

    let err = client(url).chat(request("hello")).await.unwrap_err();
    assert!(matches!(err, WeftError::IncompleteStream), "got {err}");
}

#[tokio::test]
async fn test_response_timeout() {
    let (url, server) = serve(Script::Silent).await;

    let client = client(url).with_timeouts(Duration::from_secs(5), Duration::from_millis(200));
    let err = client.chat(request("hello")).await.unwrap_err();
    match err {
        WeftError::Timeout { phase, .. } => assert_eq!(phase, "response"),
        other => panic!("unexpected error: {other}"),
    }
    server.abort();
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("ws://{addr}/v3.5/chat"))
        .chat(request("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, WeftError::LlmConnect(_)), "got {err}");
}

#[tokio::test]
async fn test_ping_before_reply_is_answered() {
    let (url, server) = serve(Script::PingThenReply(vec![frame(0, 0, "pi"), frame(0, 2, "ng")])).await;

    let reply = client(url).chat(request("hello")).await.unwrap();
    assert_eq!(reply, "ping");

    let (_, client_closed) = server.await.unwrap();
    assert!(client_closed);
}
