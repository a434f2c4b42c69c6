//! Behavior-driven tests for the chat proxy and transcription
//!
//! These tests verify HOW a conversation reacts to each provider: what is sent
//! upstream, how streamed chunks reach the conversation, and what remains after a
//! failure or a cancellation.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use sonar_chat::persona::{ANALYST_PERSONA, ASSISTANT_PERSONA};
use sonar_chat::transcription::TRANSCRIPTION_FAILED_MESSAGE;
use sonar_chat::{
    AudioPayload, AudioTranscription, ChatError, ChatProvider, ChatStreamProxy, Conversation,
    Message, ProviderKind, Role, StreamState, Transcriber, TranscriptionError,
    FAILED_RESPONSE_MESSAGE,
};
use sonar_core::{
    HttpBody, HttpClient, HttpError, HttpRequest, HttpResponse, HttpStreamResponse, MultipartPart,
};

// =============================================================================
// Fakes
// =============================================================================

/// Transport that records requests and answers with a scripted chunked body.
struct ScriptedTransport {
    status: u16,
    chunks: Vec<Result<Vec<u8>, HttpError>>,
    buffered: Option<HttpResponse>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn streaming(status: u16, chunks: Vec<Result<Vec<u8>, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            status,
            chunks,
            buffered: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn sse(frames: &[&str]) -> Arc<Self> {
        Self::streaming(
            200,
            frames
                .iter()
                .map(|frame| Ok(frame.as_bytes().to_vec()))
                .collect(),
        )
    }

    fn buffered(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            chunks: Vec::new(),
            buffered: Some(HttpResponse::with_status(status, body)),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().expect("not poisoned").len()
    }

    fn request(&self, index: usize) -> HttpRequest {
        self.requests.lock().expect("not poisoned")[index].clone()
    }
}

impl HttpClient for ScriptedTransport {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("not poisoned").push(request);
        let response = self
            .buffered
            .clone()
            .ok_or_else(|| HttpError::new("no buffered response scripted"));
        Box::pin(async move { response })
    }

    fn execute_stream<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpStreamResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("not poisoned").push(request);
        let response = HttpStreamResponse::from_chunks(self.status, self.chunks.clone());
        Box::pin(async move { Ok(response) })
    }
}

fn completion_frame(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

fn hello_world_frames() -> Vec<String> {
    let mut frames = ["Hel", "lo", " world"]
        .iter()
        .map(|text| completion_frame(text))
        .collect::<Vec<_>>();
    frames.push(String::from("data: [DONE]\n\n"));
    frames
}

fn transport_for(frames: &[String]) -> Arc<ScriptedTransport> {
    let refs = frames.iter().map(String::as_str).collect::<Vec<_>>();
    ScriptedTransport::sse(&refs)
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn when_credential_is_missing_send_fails_before_any_network_call() {
    for kind in ProviderKind::ALL {
        // Given: A proxy without a key
        let transport = ScriptedTransport::sse(&["data: [DONE]\n\n"]);
        let proxy = ChatStreamProxy::new(kind, transport.clone(), None);

        // When: A message is sent
        let result = proxy.send(&[Message::user("hello")]).await;

        // Then: A configuration error is returned and nothing went upstream
        let error = result.expect_err("missing key must fail");
        assert!(error.is_configuration(), "{kind}: {error}");
        assert_eq!(
            error.to_string(),
            format!("{} API key is not configured", kind.display_name())
        );
        assert_eq!(transport.calls(), 0, "{kind} made a network call");
    }
}

#[tokio::test]
async fn when_credential_is_missing_conversation_keeps_only_user_message() {
    let transport = ScriptedTransport::sse(&[]);
    let mut conversation = Conversation::new(Arc::new(ChatStreamProxy::new(
        ProviderKind::OpenAi,
        transport,
        None,
    )));

    let result = conversation.submit("What is RSI?").await;

    assert!(matches!(result, Err(ChatError::Configuration { .. })));
    let state = conversation.state();
    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].role, Role::User);
    assert_eq!(state.error(), Some(FAILED_RESPONSE_MESSAGE));
    assert!(!state.is_pending());
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn when_provider_streams_chunks_consumer_accumulates_them_in_order() {
    // Given: An OpenAI-compatible upstream emitting "Hel", "lo", " world"
    let transport = transport_for(&hello_world_frames());
    let mut conversation = Conversation::new(Arc::new(ChatStreamProxy::new(
        ProviderKind::Perplexity,
        transport.clone(),
        Some(String::from("pplx-test")),
    )));

    // When: The user submits a message and watches the reply grow
    let mut observed = Vec::new();
    conversation
        .submit_with("Explain moving averages", |chunk| observed.push(chunk.to_owned()))
        .await
        .expect("stream should complete");

    // Then: Chunks arrived in order and concatenate to the full reply
    assert_eq!(observed, vec!["Hel", "lo", " world"]);
    let state = conversation.state();
    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.messages()[1].role, Role::Assistant);
    assert_eq!(state.messages()[1].content, "Hello world");
    assert_eq!(state.error(), None);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn when_frames_split_mid_event_text_is_still_delivered_intact() {
    let joined = hello_world_frames().concat();
    let bytes = joined.as_bytes();
    let chunks = bytes
        .chunks(7)
        .map(|piece| Ok(piece.to_vec()))
        .collect::<Vec<_>>();
    let transport = ScriptedTransport::streaming(200, chunks);
    let proxy = ChatStreamProxy::new(
        ProviderKind::OpenAi,
        transport,
        Some(String::from("sk-test")),
    );

    let text = proxy
        .send(&[Message::user("hi")])
        .await
        .expect("dispatch succeeds")
        .collect_text()
        .await
        .expect("stream completes");

    assert_eq!(text, "Hello world");
}

#[tokio::test]
async fn when_anthropic_streams_text_deltas_they_form_the_reply() {
    let frames = [
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n",
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n",
        "event: ping\ndata: {\"type\":\"ping\"}\n\n",
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}\n\n",
        "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n",
    ];
    let transport = ScriptedTransport::sse(&frames);
    let proxy = ChatStreamProxy::new(
        ProviderKind::Anthropic,
        transport.clone(),
        Some(String::from("ant-test")),
    );

    let text = proxy
        .send(&[Message::user("hi")])
        .await
        .expect("dispatch succeeds")
        .collect_text()
        .await
        .expect("stream completes");

    assert_eq!(text, "Hello");
    let body: serde_json::Value = serde_json::from_str(
        transport.request(0).body_text().expect("json body"),
    )
    .expect("valid json");
    assert_eq!(body["system"], ANALYST_PERSONA);
    assert_eq!(body["messages"][0]["content"], "hi");
}

#[tokio::test]
async fn every_request_prepends_the_persona_before_history() {
    let transport = transport_for(&hello_world_frames());
    let proxy = ChatStreamProxy::new(
        ProviderKind::OpenAi,
        transport.clone(),
        Some(String::from("sk-test")),
    );
    let history = vec![
        Message::user("first"),
        Message::assistant("reply"),
        Message::user("second"),
    ];

    proxy
        .send(&history)
        .await
        .expect("dispatch succeeds")
        .collect_text()
        .await
        .expect("stream completes");

    let body: serde_json::Value = serde_json::from_str(
        transport.request(0).body_text().expect("json body"),
    )
    .expect("valid json");
    let messages = body["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], ASSISTANT_PERSONA);
    assert_eq!(messages[1]["content"], "first");
    assert_eq!(messages[3]["content"], "second");
    assert_eq!(body["temperature"], 0.7);
}

#[tokio::test]
async fn when_stream_breaks_mid_reply_partial_text_stays_and_error_follows() {
    // Given: An upstream that sends one chunk and then drops the connection
    let transport = ScriptedTransport::streaming(
        200,
        vec![
            Ok(completion_frame("Partial").into_bytes()),
            Err(HttpError::new("connection reset")),
        ],
    );
    let mut conversation = Conversation::new(Arc::new(ChatStreamProxy::new(
        ProviderKind::OpenAi,
        transport,
        Some(String::from("sk-test")),
    )));

    // When: The user submits a message
    let result = conversation.submit("hi").await;

    // Then: The partial reply remains and the error flag is set afterwards
    assert!(matches!(result, Err(ChatError::Stream { .. })));
    let state = conversation.state();
    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.messages()[1].content, "Partial");
    assert_eq!(state.error(), Some(FAILED_RESPONSE_MESSAGE));
    assert!(!state.is_pending());
}

#[tokio::test]
async fn when_upstream_rejects_request_error_carries_status_and_message() {
    let transport = ScriptedTransport::streaming(
        401,
        vec![Ok(br#"{"error":{"message":"Incorrect API key provided"}}"#.to_vec())],
    );
    let proxy = ChatStreamProxy::new(
        ProviderKind::OpenAi,
        transport,
        Some(String::from("sk-wrong")),
    );

    let error = proxy
        .send(&[Message::user("hi")])
        .await
        .expect_err("401 must fail");

    assert_eq!(
        error,
        ChatError::Upstream {
            provider: "OpenAI",
            status: 401,
            message: String::from("Incorrect API key provided"),
        }
    );
    assert_eq!(error.code(), "chat.upstream");
}

#[tokio::test]
async fn when_consumer_cancels_no_more_chunks_are_delivered() {
    // Given: A reply stream already delivering chunks
    let transport = transport_for(&hello_world_frames());
    let proxy = ChatStreamProxy::new(
        ProviderKind::Perplexity,
        transport,
        Some(String::from("pplx-test")),
    );
    let mut conversation_state = sonar_chat::ConversationState::new();
    let history = conversation_state.begin_turn("hi");
    let mut stream = proxy.send(&history).await.expect("dispatch succeeds");

    // When: The consumer appends one chunk and then cancels
    let first = stream.next().await.expect("a chunk").expect("text");
    conversation_state.append_chunk(&first);
    stream.cancel();
    conversation_state.cancel();

    // Then: Nothing more arrives and the appended text is intact
    assert_eq!(stream.next().await, None);
    assert_eq!(stream.state(), StreamState::Cancelled);
    assert_eq!(conversation_state.messages()[1].content, "Hel");
    assert_eq!(conversation_state.error(), None);
    assert!(!conversation_state.is_pending());
}

// =============================================================================
// Transcription
// =============================================================================

fn clip() -> AudioPayload {
    AudioPayload::new("clip.webm", "audio/webm", vec![1, 2, 3, 4])
}

#[tokio::test]
async fn when_audio_is_transcribed_one_complete_text_is_returned() {
    let transport = ScriptedTransport::buffered(200, r#"{"text":"What is the RSI of AAPL?"}"#);
    let transcriber = Transcriber::new(transport.clone(), Some(String::from("sk-test")));

    let text = transcriber
        .transcribe(Some(clip()))
        .await
        .expect("transcription succeeds");

    assert_eq!(text, "What is the RSI of AAPL?");
    let request = transport.request(0);
    let HttpBody::Multipart(parts) = request.body else {
        panic!("expected multipart body");
    };
    assert!(parts.iter().any(|part| matches!(
        part,
        MultipartPart::File { name, bytes, .. } if name == "file" && bytes == &vec![1, 2, 3, 4]
    )));
    assert!(parts.iter().any(|part| matches!(
        part,
        MultipartPart::Text { name, value } if name == "model" && value == "whisper-1"
    )));
}

#[tokio::test]
async fn when_no_audio_is_supplied_a_distinct_error_is_returned() {
    let transport = ScriptedTransport::buffered(200, r#"{"text":""}"#);
    let transcriber = Transcriber::new(transport.clone(), Some(String::from("sk-test")));

    let missing = transcriber.transcribe(None).await;
    let empty = transcriber
        .transcribe(Some(AudioPayload::new("clip.webm", "audio/webm", Vec::new())))
        .await;

    assert_eq!(missing, Err(TranscriptionError::MissingAudio));
    assert_eq!(empty, Err(TranscriptionError::MissingAudio));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn when_openai_key_is_missing_transcription_reports_configuration_first() {
    let transport = ScriptedTransport::buffered(200, r#"{"text":"x"}"#);
    let transcriber = Transcriber::new(transport.clone(), None);

    assert_eq!(
        transcriber.transcribe(None).await,
        Err(TranscriptionError::Configuration)
    );
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn when_transcription_upstream_fails_status_is_reported() {
    let transport = ScriptedTransport::buffered(500, "internal");
    let transcriber = Transcriber::new(transport, Some(String::from("sk-test")));

    let error = transcriber
        .transcribe(Some(clip()))
        .await
        .expect_err("500 must fail");

    assert_eq!(
        error,
        TranscriptionError::Upstream {
            status: 500,
            message: String::from(TRANSCRIPTION_FAILED_MESSAGE),
        }
    );
}

#[tokio::test]
async fn when_transcription_upstream_explains_itself_only_the_message_is_kept() {
    let transport = ScriptedTransport::buffered(
        400,
        r#"{"error":{"message":"Audio file is too short","type":"invalid_request_error","param":"file"}}"#,
    );
    let transcriber = Transcriber::new(transport, Some(String::from("sk-test")));

    let error = transcriber
        .transcribe(Some(clip()))
        .await
        .expect_err("400 must fail");

    assert_eq!(
        error,
        TranscriptionError::Upstream {
            status: 400,
            message: String::from("Audio file is too short"),
        }
    );
    assert!(!error.to_string().contains("invalid_request_error"));
}
