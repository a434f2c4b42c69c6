//! Server-sent event framing and the two payload dialects carried over it.

use serde::Deserialize;

use crate::provider::WireDialect;

/// One dispatched SSE event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE parser.
///
/// Bytes may be split anywhere, including inside a UTF-8 sequence; an event is only
/// decoded once its terminating blank line has arrived.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, separator_len)) = find_event_boundary(&self.buffer) {
            let block = self.buffer.drain(..end + separator_len).collect::<Vec<_>>();
            if let Some(event) = parse_block(&block[..end]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut index = 0;
    while index < buffer.len() {
        if buffer[index..].starts_with(b"\r\n\r\n") {
            return Some((index, 4));
        }
        if buffer[index..].starts_with(b"\n\n") || buffer[index..].starts_with(b"\r\r") {
            return Some((index, 2));
        }
        index += 1;
    }
    None
}

fn parse_block(block: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(block);
    let mut event = SseEvent::default();
    let mut has_data = false;

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                if has_data {
                    event.data.push('\n');
                }
                event.data.push_str(value);
                has_data = true;
            }
            "event" => event.event = Some(value.to_owned()),
            _ => {}
        }
    }

    has_data.then_some(event)
}

/// Meaning of one event within a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseSignal {
    Text(String),
    Done,
    /// Upstream reported an error inside the stream.
    Error(String),
    Ignore,
}

impl WireDialect {
    pub fn interpret(self, event: &SseEvent) -> Result<SseSignal, serde_json::Error> {
        match self {
            Self::ChatCompletions => interpret_chat_completions(event),
            Self::AnthropicMessages => interpret_anthropic(event),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: Option<CompletionDelta>,
}

#[derive(Debug, Deserialize)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: String,
}

fn interpret_chat_completions(event: &SseEvent) -> Result<SseSignal, serde_json::Error> {
    let data = event.data.trim();
    if data == "[DONE]" {
        return Ok(SseSignal::Done);
    }

    let chunk: CompletionChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Ok(SseSignal::Error(error.message));
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty());

    Ok(text.map_or(SseSignal::Ignore, SseSignal::Text))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    ContentBlockDelta { delta: AnthropicDelta },
    MessageStop,
    Error { error: UpstreamError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

fn interpret_anthropic(event: &SseEvent) -> Result<SseSignal, serde_json::Error> {
    let parsed: AnthropicEvent = serde_json::from_str(event.data.trim())?;
    Ok(match parsed {
        AnthropicEvent::ContentBlockDelta {
            delta: AnthropicDelta::TextDelta { text },
        } if !text.is_empty() => SseSignal::Text(text),
        AnthropicEvent::MessageStop => SseSignal::Done,
        AnthropicEvent::Error { error } => SseSignal::Error(error.message),
        _ => SseSignal::Ignore,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_split_across_chunks_are_reassembled() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        let events = decoder.push(b":1}\n\ndata: [DONE]\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[1].data, "[DONE]");
    }

    #[test]
    fn split_utf8_sequence_survives() {
        let payload = "data: caf\u{e9}\n\n".as_bytes();
        let split = payload.len() - 3;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&payload[..split]).is_empty());
        let events = decoder.push(&payload[split..]);
        assert_eq!(events[0].data, "caf\u{e9}");
    }

    #[test]
    fn comments_and_event_names_are_handled() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": ping\r\n\r\nevent: message_stop\r\ndata: {\"type\":\"message_stop\"}\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("message_stop"));
    }

    #[test]
    fn trailing_event_is_flushed_on_finish() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish().map(|event| event.data), Some(String::from("tail")));
    }

    #[test]
    fn chat_completions_delta_and_done() {
        let dialect = WireDialect::ChatCompletions;
        let text = SseEvent {
            event: None,
            data: String::from(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#),
        };
        let role_only = SseEvent {
            event: None,
            data: String::from(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
        };
        let done = SseEvent {
            event: None,
            data: String::from("[DONE]"),
        };

        assert_eq!(dialect.interpret(&text).expect("json"), SseSignal::Text(String::from("Hel")));
        assert_eq!(dialect.interpret(&role_only).expect("json"), SseSignal::Ignore);
        assert_eq!(dialect.interpret(&done).expect("json"), SseSignal::Done);
    }

    #[test]
    fn anthropic_text_delta_stop_and_error() {
        let dialect = WireDialect::AnthropicMessages;
        let delta = SseEvent {
            event: Some(String::from("content_block_delta")),
            data: String::from(
                r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"lo"}}"#,
            ),
        };
        let ping = SseEvent {
            event: Some(String::from("ping")),
            data: String::from(r#"{"type":"ping"}"#),
        };
        let error = SseEvent {
            event: Some(String::from("error")),
            data: String::from(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
        };
        let stop = SseEvent {
            event: None,
            data: String::from(r#"{"type":"message_stop"}"#),
        };

        assert_eq!(dialect.interpret(&delta).expect("json"), SseSignal::Text(String::from("lo")));
        assert_eq!(dialect.interpret(&ping).expect("json"), SseSignal::Ignore);
        assert_eq!(
            dialect.interpret(&error).expect("json"),
            SseSignal::Error(String::from("Overloaded"))
        );
        assert_eq!(dialect.interpret(&stop).expect("json"), SseSignal::Done);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let event = SseEvent {
            event: None,
            data: String::from("{not json"),
        };
        assert!(WireDialect::ChatCompletions.interpret(&event).is_err());
    }
}
