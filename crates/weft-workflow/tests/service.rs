use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use weft_core::config::AppConfig;
use weft_core::error::WeftError;
use weft_core::event::{ChannelSink, EventSink};
use weft_test_utils::fixtures;
use weft_test_utils::{MemoryDslLoader, MockChatModel, MockPluginInvoker, RecordingSink};
use weft_workflow::{FileDslLoader, Graph, WorkflowEngine, WorkflowService};

fn service(model: MockChatModel, run_timeout: Duration) -> Arc<WorkflowService> {
    let engine = WorkflowEngine::standard(
        Arc::new(model),
        Arc::new(MockPluginInvoker::voice_url("http://minio/ep.mp3")),
        &AppConfig::default(),
    );
    let loader = MemoryDslLoader::new()
        .with_flow("podcast", fixtures::podcast())
        .with_flow("chain", fixtures::literal_chain());
    Arc::new(WorkflowService::new(Arc::new(engine), Arc::new(loader), run_timeout))
}

fn user_input(text: &str) -> BTreeMap<String, serde_json::Value> {
    BTreeMap::from([("user_input".to_string(), json!(text))])
}

#[tokio::test]
async fn test_run_emits_workflow_complete_last() {
    let sink = Arc::new(RecordingSink::new());
    let report = service(MockChatModel::new().with_reply("intro"), Duration::from_secs(5))
        .run("podcast", user_input("rust"), sink.clone())
        .await
        .unwrap();

    assert_eq!(report.order.len(), 4);
    let events = sink.events();
    let last = events.last().unwrap();
    assert_eq!(last.name(), "workflow_complete");
    assert_eq!(last.data(), json!({"status": "success"}));
    assert_eq!(sink.count("workflow_complete"), 1);
}

#[tokio::test]
async fn test_unknown_flow_emits_run_error() {
    let sink = Arc::new(RecordingSink::new());
    let err = service(MockChatModel::new(), Duration::from_secs(5))
        .run("missing", BTreeMap::new(), sink.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, WeftError::WorkflowNotFound(_)));
    assert_eq!(sink.names(), vec!["error"]);
    assert_eq!(
        sink.events()[0].data(),
        json!({"error": "WorkflowNotFoundError", "message": "Workflow not found: missing"})
    );
}

#[tokio::test]
async fn test_run_timeout() {
    let model = MockChatModel::new().with_delay(Duration::from_secs(5));
    let sink = Arc::new(RecordingSink::new());

    let err = service(model, Duration::from_millis(100))
        .run("chain", BTreeMap::new(), sink.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, WeftError::Timeout { ref phase, .. } if phase == "run"));
    let last = sink.events().pop().unwrap();
    assert_eq!(last.data()["error"], "TimeoutError");
    assert_eq!(sink.count("workflow_complete"), 0);
}

#[tokio::test]
async fn test_node_failure_reports_node_and_run_errors() {
    let model = MockChatModel::new().with_remote_error(11200, "quota exceeded");
    let sink = Arc::new(RecordingSink::new());

    service(model, Duration::from_secs(5))
        .run("chain", BTreeMap::new(), sink.clone())
        .await
        .unwrap_err();

    let errors: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.name() == "error")
        .map(|e| e.data())
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["nodeId"], fixtures::LLM);
    assert_eq!(errors[1]["error"], "RemoteApiError");
}

#[tokio::test]
async fn test_spawn_streams_over_channel() {
    let (sink, mut rx) = ChannelSink::new();
    let handle = service(MockChatModel::new(), Duration::from_secs(5)).spawn(
        "chain",
        BTreeMap::from([("name".to_string(), json!("Ada"))]),
        Arc::new(sink),
    );

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.final_output.as_deref(), Some("<echo: Say hi to Ada>"));

    let mut frames = Vec::new();
    while let Ok(event) = rx.try_recv() {
        frames.push(event.to_sse());
    }
    assert!(frames[0].starts_with("event: node_start\ndata: "));
    assert_eq!(
        frames.last().unwrap(),
        "event: workflow_complete\ndata: {\"status\":\"success\"}\n\n"
    );
}

#[tokio::test]
async fn test_dropped_receiver_does_not_abort_run() {
    let (sink, rx) = ChannelSink::new();
    drop(rx);
    let sink = Arc::new(sink);

    let report = service(MockChatModel::new(), Duration::from_secs(5))
        .run("chain", BTreeMap::new(), sink.clone())
        .await
        .unwrap();
    assert!(report.final_output.is_some());
    assert!(!sink.is_active());
}

#[tokio::test]
async fn test_run_graph_and_file_loader() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("chain.json"),
        serde_json::to_string(&fixtures::literal_chain()).unwrap(),
    )
    .unwrap();

    let engine = Arc::new(WorkflowEngine::standard(
        Arc::new(MockChatModel::new()),
        Arc::new(MockPluginInvoker::voice_url("u")),
        &AppConfig::default(),
    ));
    let service = WorkflowService::new(
        engine,
        Arc::new(FileDslLoader::new(dir.path())),
        Duration::from_secs(5),
    );

    let sink: Arc<dyn EventSink> = Arc::new(RecordingSink::new());
    let from_file = service
        .run("chain", BTreeMap::new(), sink.clone())
        .await
        .unwrap();

    let graph = Graph::from_dsl(fixtures::literal_chain()).unwrap();
    let direct = service.run_graph(&graph, BTreeMap::new(), sink).await.unwrap();

    assert_eq!(from_file.order, direct.order);
    assert_eq!(from_file.final_output, direct.final_output);
}
