use futures::StreamExt;

use delve_client::{AgentTransport, CancelToken, LangGraphClient, RunRequest};
use delve_types::{EventKind, Role};

#[tokio::test]
async fn test_create_thread() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/threads")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"thread_id": "t-123"}"#)
        .create_async()
        .await;

    let client = LangGraphClient::new(server.url(), None).unwrap();
    let thread_id = client.create_thread().await.unwrap();

    assert_eq!(thread_id, "t-123");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_thread_server_error_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/threads")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = LangGraphClient::new(server.url(), None).unwrap();
    let err = client.create_thread().await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_thread_state_normalization() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/threads/t-1/state")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"values": {"messages": [
                {"type": "human", "content": "question"},
                {"type": "ai", "content": "answer"}
            ]}}"#,
        )
        .create_async()
        .await;

    let client = LangGraphClient::new(server.url(), None).unwrap();
    let messages = client.thread_state("t-1").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "answer");
}

#[tokio::test]
async fn test_stream_run_yields_tagged_events() {
    let body = concat!(
        "event: metadata\n",
        "data: {\"run_id\": \"r-1\"}\n",
        "\n",
        "event: messages/partial\n",
        "data: [{\"content\": \"Hi there\"}]\n",
        "\n",
        "event: values\n",
        "data: {\"messages\": [{\"type\": \"ai\", \"content\": \"Hi there\"}]}\n",
    );

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/threads/t-1/runs/stream")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = LangGraphClient::new(server.url(), None).unwrap();
    let stream = client
        .stream_run("t-1", "react_agent", RunRequest::new("hello"), CancelToken::new())
        .await
        .unwrap();

    let events: Vec<_> = stream
        .filter_map(|e| async move { e.ok() })
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].kind(), EventKind::Metadata);
    assert_eq!(events[1].kind(), EventKind::MessagesPartial);
    assert_eq!(events[1].data[0]["content"], "Hi there");
    assert_eq!(events[2].kind(), EventKind::Values);
}

#[tokio::test]
async fn test_stream_run_pre_cancelled_token_yields_nothing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/threads/t-1/runs/stream")
        .with_status(200)
        .with_body("event: values\ndata: {\"messages\": []}\n")
        .create_async()
        .await;

    let cancel = CancelToken::new();
    cancel.cancel();

    let client = LangGraphClient::new(server.url(), None).unwrap();
    let mut stream = client
        .stream_run("t-1", "react_agent", RunRequest::new("hello"), cancel)
        .await
        .unwrap();

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_delete_thread() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/threads/t-1")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("DELETE", "/threads/missing")
        .with_status(404)
        .create_async()
        .await;

    let client = LangGraphClient::new(server.url(), None).unwrap();
    assert!(client.delete_thread("t-1").await.unwrap());
    assert!(!client.delete_thread("missing").await.unwrap());
}
