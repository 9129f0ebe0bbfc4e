//! End-to-end session flow against a mock completion endpoint

use std::sync::Arc;

use chat_session::{ChatSession, FileSnapshotStorage, SnapshotStorage};
use completion_client::{ClientConfig, OpenAiClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn reply_body(content: &str, total_tokens: u64) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1234567890,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 10, "total_tokens": total_tokens}
    })
}

async fn session_against(server: &MockServer) -> ChatSession {
    let config = ClientConfig {
        api_key: Some("sk-test".to_string()),
        api_base: Some(server.uri()),
        model: None,
        max_tokens: None,
        max_retries: Some(0),
        retry_delay_secs: Some(0),
    };
    let gateway = Arc::new(OpenAiClient::new(&config).unwrap());
    ChatSession::new("You are helpful", gateway, "gpt-4o")
}

#[tokio::test]
async fn test_send_edit_regenerate_and_reload() {
    let server = MockServer::start().await;

    // Echo back how many messages the request carried, so each reply is
    // distinguishable and the context length is observable.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let count = body["messages"].as_array().unwrap().len();
            ResponseTemplate::new(200)
                .set_body_json(reply_body(&format!("reply to {count} messages"), 30))
        })
        .mount(&server)
        .await;

    let mut session = session_against(&server).await;

    // send: system + user = 2 messages
    session.send_user_message("hi").await.unwrap();
    assert_eq!(session.view_path()[2].message, "reply to 2 messages");
    assert_eq!(session.total_tokens(), 30);

    // edit forks at the same depth: still 2 messages of context
    let user = session.view_path()[1].id;
    session.edit_user_message(user, "hi there").await.unwrap();
    assert_eq!(session.view_path()[1].message, "hi there");
    let root = session.tree().root_id();
    assert_eq!(session.tree().get(root).unwrap().children.len(), 2);

    // regenerate replaces the reply without growing the fork
    let fork = session.view_path()[1].id;
    session.regenerate().await.unwrap();
    assert_eq!(session.tree().get(fork).unwrap().children.len(), 1);

    // save, then load into a fresh session
    let dir = tempfile::tempdir().unwrap();
    let storage = FileSnapshotStorage::new(dir.path());
    let saved = storage
        .save_snapshot("conversation", &session.snapshot())
        .await
        .unwrap();

    let mut restored = session_against(&server).await;
    let snapshot = storage.load_snapshot(&saved).await.unwrap();
    restored.restore(&snapshot).unwrap();

    assert_eq!(restored.view_path().len(), session.view_path().len());
    assert_eq!(restored.tree().current_id(), session.tree().current_id());
    restored.tree().validate().unwrap();

    // the restored session keeps talking on the same branch: 4 messages
    restored.send_user_message("and then?").await.unwrap();
    assert_eq!(restored.view_path().last().unwrap().message, "reply to 4 messages");
}
