//! Message submission and reply streaming against a mock agent service.

use maestro_client::{AgentClient, Chat, ClientConfig, Renderer};
use maestro_core::{ConversationState, Message, Role, ERROR_REPLY};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_PATH: &str = "/apps/orchestrator_agent/users/web_user/sessions";

/// Records every frame it is asked to draw.
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<(Vec<Message>, bool)>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, messages: &[Message], loading: bool) {
        self.frames.push((messages.to_vec(), loading));
    }
}

impl RecordingRenderer {
    /// Texts of the last message across frames, in order.
    fn last_texts(&self) -> Vec<String> {
        self.frames
            .iter()
            .filter_map(|(messages, _)| messages.last())
            .map(|m| m.text.clone())
            .collect()
    }
}

fn sse_body(events: &[&str]) -> Vec<u8> {
    events
        .iter()
        .map(|event| format!("data: {event}\n\n"))
        .collect::<String>()
        .into_bytes()
}

fn content(text: &str) -> String {
    serde_json::json!({ "content": { "parts": [{ "text": text }] } }).to_string()
}

async fn started_chat(server: &MockServer, renderer: &mut RecordingRenderer) -> Chat {
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session_id": "s-1"
        })))
        .mount(server)
        .await;

    let client = AgentClient::new(ClientConfig::new(server.uri())).unwrap();
    let mut chat = Chat::new(client, ConversationState::new());
    chat.start(renderer).await;
    chat
}

async fn mount_reply(server: &MockServer, status: u16, body: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn snapshot_fragments_replace_the_reply() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    let events = [content("He"), content("Hello"), content("Hello!")];
    let events: Vec<&str> = events.iter().map(String::as_str).collect();
    mount_reply(&server, 200, sse_body(&events)).await;

    assert!(chat.submit("hi", &mut renderer).await);

    let messages = chat.state().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], Message::user("hi"));
    assert_eq!(messages[1], Message::agent("Hello!"));
    assert!(!chat.state().loading());

    let texts = renderer.last_texts();
    assert!(texts.contains(&"He".to_string()));
    assert!(texts.contains(&"Hello".to_string()));
}

#[tokio::test]
async fn delta_fragments_are_appended() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    let events = [content("The "), content("cat "), content("sat.")];
    let events: Vec<&str> = events.iter().map(String::as_str).collect();
    mount_reply(&server, 200, sse_body(&events)).await;

    chat.submit("story", &mut renderer).await;

    assert_eq!(chat.state().last(), Some(&Message::agent("The cat sat.")));
    assert!(chat.input_enabled());
}

#[tokio::test]
async fn malformed_event_is_skipped() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    let first = content("A");
    let last = content("AB");
    mount_reply(&server, 200, sse_body(&[&first, "{not json", &last])).await;

    chat.submit("q", &mut renderer).await;

    assert_eq!(chat.state().last(), Some(&Message::agent("AB")));
    assert_eq!(chat.state().messages().len(), 2);
}

#[tokio::test]
async fn candidates_envelope_and_function_calls() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    let call = serde_json::json!({
        "content": { "parts": [{ "functionCall": { "name": "ask_search_agent", "args": {} } }] }
    })
    .to_string();
    let candidate = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": "Found it" }] } }]
    })
    .to_string();
    mount_reply(&server, 200, sse_body(&[&call, &candidate])).await;

    chat.submit("search", &mut renderer).await;

    assert_eq!(chat.state().last(), Some(&Message::agent("Found it")));
}

#[tokio::test]
async fn http_error_appends_one_error_reply() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    mount_reply(&server, 500, b"{\"detail\":\"down\"}".to_vec()).await;

    assert!(chat.submit("hello", &mut renderer).await);

    let messages = chat.state().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1], Message::agent(ERROR_REPLY));
    assert!(!chat.state().loading());
    assert_eq!(renderer.frames.last().map(|(_, loading)| *loading), Some(false));
}

#[tokio::test]
async fn empty_stream_leaves_empty_reply() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    mount_reply(&server, 200, b": keep-alive\n\n".to_vec()).await;

    chat.submit("anyone?", &mut renderer).await;

    assert_eq!(chat.state().last(), Some(&Message::agent("")));
    assert!(!chat.state().loading());
}

#[tokio::test]
async fn blank_submission_is_ignored() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let frames_before = renderer.frames.len();
    assert!(!chat.submit("   \n\t", &mut renderer).await);
    assert!(chat.state().messages().is_empty());
    assert_eq!(renderer.frames.len(), frames_before);
}

#[tokio::test]
async fn submission_before_start_is_ignored() {
    let server = MockServer::start().await;
    let client = AgentClient::new(ClientConfig::new(server.uri())).unwrap();
    let mut chat = Chat::new(client, ConversationState::new());
    let mut renderer = RecordingRenderer::default();

    assert!(!chat.submit("too early", &mut renderer).await);
    assert!(chat.state().messages().is_empty());
}

#[tokio::test]
async fn request_carries_session_and_message() {
    let server = MockServer::start().await;
    let mut renderer = RecordingRenderer::default();
    let mut chat = started_chat(&server, &mut renderer).await;

    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .and(header("accept", "text/event-stream"))
        .and(body_json(serde_json::json!({
            "app_name": "orchestrator_agent",
            "user_id": "web_user",
            "session_id": "s-1",
            "new_message": { "role": "user", "parts": [{ "text": "ping" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&[&content("pong")]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    chat.submit("ping", &mut renderer).await;

    assert_eq!(chat.state().last(), Some(&Message::agent("pong")));
}

#[tokio::test]
async fn greeting_precedes_the_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "g" })))
        .mount(&server)
        .await;
    mount_reply(&server, 200, sse_body(&[&content("hey")])).await;

    let client = AgentClient::new(ClientConfig::new(server.uri())).unwrap();
    let mut chat = Chat::new(client, ConversationState::with_greeting("Welcome"));
    let mut renderer = RecordingRenderer::default();
    chat.start(&mut renderer).await;
    chat.submit("yo", &mut renderer).await;

    let messages = chat.state().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], Message::agent("Welcome"));
    assert_eq!(messages[2], Message::agent("hey"));
}
