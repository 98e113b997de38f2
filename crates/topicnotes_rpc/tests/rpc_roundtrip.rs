use async_trait::async_trait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use topicnotes_core::{DocumentStore, EncyclopediaProvider, LookupError, NoteService};
use topicnotes_rpc::{router, serve, CallError, Fault, Reply, RetryPolicy, RpcClient};

struct StubProvider;

#[async_trait]
impl EncyclopediaProvider for StubProvider {
    async fn lookup(&self, topic: &str) -> Result<Option<String>, LookupError> {
        if topic == "Python" {
            Ok(Some("https://en.wikipedia.org/wiki/Python".to_string()))
        } else {
            Ok(None)
        }
    }
}

struct Harness {
    addr: SocketAddr,
    _dir: tempfile::TempDir,
    database: std::path::PathBuf,
}

async fn start_server() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("database.xml");
    let store = Arc::new(DocumentStore::load(&database).unwrap());
    let service = Arc::new(NoteService::new(store, StubProvider));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        router(service, "/RPC2"),
        std::future::pending(),
    ));
    Harness {
        addr,
        _dir: dir,
        database,
    }
}

fn client_for(harness: &Harness) -> RpcClient {
    RpcClient::with_policy(
        &format!("http://{}/RPC2", harness.addr),
        RetryPolicy::new(3, Duration::from_millis(10)),
    )
    .unwrap()
}

#[tokio::test]
async fn four_operations_round_trip() {
    let harness = start_server().await;
    let client = client_for(&harness);

    assert_eq!(client.get_topics().await.unwrap(), Reply::Items(vec![]));
    assert_eq!(
        client
            .save_note("Rust", "first", "hello", "01/01/2024 10:00:00")
            .await
            .unwrap(),
        "Note saved successfully"
    );
    assert_eq!(
        client.get_notes("Rust").await.unwrap(),
        Reply::Items(vec![(
            "first".to_string(),
            "hello".to_string(),
            "01/01/2024 10:00:00".to_string()
        )])
    );
    assert_eq!(
        client.get_notes("Nope").await.unwrap(),
        Reply::Message("No notes found".to_string())
    );
    assert_eq!(
        client.get_topics().await.unwrap(),
        Reply::Items(vec!["Rust".to_string()])
    );
}

#[tokio::test]
async fn validation_messages_are_results_not_faults() {
    let harness = start_server().await;
    let client = client_for(&harness);

    assert_eq!(
        client
            .save_note("", "n", "t", "01/01/2024 00:00:00")
            .await
            .unwrap(),
        "Topic, Note or Text cannot be empty"
    );
    assert_eq!(
        client
            .save_note("T", "N", "X", "31-12-2024 10:00:00")
            .await
            .unwrap(),
        "Incorrect date format, should be DD/MM/YYYY HH:MM:SS"
    );
    assert_eq!(
        client.get_notes("").await.unwrap(),
        Reply::Message("Topic cannot be empty".to_string())
    );
    assert_eq!(
        client.call("getnotes", vec![json!(123)]).await.unwrap(),
        json!("Topic should be a string")
    );
}

#[tokio::test]
async fn unknown_method_and_bad_arity_are_faults() {
    let harness = start_server().await;
    let client = client_for(&harness);

    match client.call("nonExistentMethod", vec![]).await {
        Err(CallError::Fault(fault)) => assert_eq!(fault.code, Fault::METHOD_NOT_FOUND),
        other => panic!("expected fault, got {other:?}"),
    }
    match client.call("saveNote", vec![json!("TestTopic")]).await {
        Err(CallError::Fault(fault)) => assert_eq!(fault.code, Fault::INVALID_PARAMS),
        other => panic!("expected fault, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_parse_fault() {
    let harness = start_server().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{}/RPC2", harness.addr))
        .body("{not json")
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fault"]["code"], json!(Fault::PARSE_ERROR));
}

#[tokio::test]
async fn wikipedia_call_returns_page_and_stores_note() {
    let harness = start_server().await;
    let client = client_for(&harness);

    assert_eq!(
        client.get_wikipedia("Python").await.unwrap(),
        "Topics wikipedia page https://en.wikipedia.org/wiki/Python"
    );
    assert_eq!(
        client.get_wikipedia("zzzz").await.unwrap(),
        "No Wikipedia information found"
    );

    let Reply::Items(notes) = client.get_notes("Python").await.unwrap() else {
        panic!("expected notes for Python");
    };
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, "https://en.wikipedia.org/wiki/Python");
    assert_eq!(notes[0].1, "description is disabled by wikimedia");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_from_many_clients_are_all_persisted() {
    const CLIENTS: usize = 24;
    let harness = start_server().await;
    let url = format!("http://{}/RPC2", harness.addr);

    let mut tasks = Vec::new();
    for index in 0..CLIENTS {
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let client = RpcClient::new(&url).unwrap();
            client
                .save_note("Shared", &format!("note-{index}"), "text", "01/01/2024 00:00:00")
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), "Note saved successfully");
    }

    let client = client_for(&harness);
    assert_eq!(
        client.get_topics().await.unwrap(),
        Reply::Items(vec!["Shared".to_string()])
    );
    let Reply::Items(notes) = client.get_notes("Shared").await.unwrap() else {
        panic!("expected notes");
    };
    assert_eq!(notes.len(), CLIENTS);

    let reloaded = DocumentStore::load(&harness.database).unwrap();
    assert_eq!(reloaded.list_notes("Shared").unwrap().len(), CLIENTS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wikipedia_calls_interleave_with_saves_on_one_topic() {
    const ROUNDS: usize = 12;
    let harness = start_server().await;
    let url = format!("http://{}/RPC2", harness.addr);

    let mut lookups = Vec::new();
    let mut saves = Vec::new();
    for index in 0..ROUNDS {
        let url = url.clone();
        lookups.push(tokio::spawn({
            let url = url.clone();
            async move { RpcClient::new(&url).unwrap().get_wikipedia("Python").await.unwrap() }
        }));
        saves.push(tokio::spawn(async move {
            RpcClient::new(&url)
                .unwrap()
                .save_note("Python", &format!("manual-{index}"), "text", "01/01/2024 00:00:00")
                .await
                .unwrap()
        }));
    }
    for task in lookups {
        assert_eq!(
            task.await.unwrap(),
            "Topics wikipedia page https://en.wikipedia.org/wiki/Python"
        );
    }
    for task in saves {
        assert_eq!(task.await.unwrap(), "Note saved successfully");
    }

    let reloaded = DocumentStore::load(&harness.database).unwrap();
    let notes = reloaded.list_notes("Python").unwrap();
    assert_eq!(notes.len(), 2 * ROUNDS);
    assert_eq!(
        notes
            .iter()
            .filter(|note| note.text == "description is disabled by wikimedia")
            .count(),
        ROUNDS
    );
}

#[tokio::test]
async fn health_probe_answers() {
    let harness = start_server().await;
    let body = reqwest::get(format!("http://{}/health", harness.addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}
