//! Transport boundary: opening a fragment stream against the model API.
//!
//! [`ChatTransport`] is the seam the turn logic depends on. [`GeminiTransport`]
//! implements it over `streamGenerateContent` with server-sent events, and
//! [`ChatStreamService`] runs a stream on the tokio runtime and forwards its
//! fragments over a channel tagged with the owning stream id.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SystemInstruction,
};
use crate::core::config::Config;
use crate::core::constants::{safety_settings, BANKING_SYSTEM_INSTRUCTION};
use crate::core::credentials::{ApiKey, CredentialError};
use crate::core::message::{HistoryEntry, Role};
use crate::utils::url::construct_api_url;

/// Coarse failure class; decides which message the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Missing, rejected or otherwise invalid credential.
    Configuration(String),
    /// The API answered with an error status or an in-stream error payload.
    Api {
        status: Option<u16>,
        message: String,
    },
    Network(String),
    /// The response could not be understood.
    Protocol(String),
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Configuration(_) => FailureKind::Configuration,
            _ => FailureKind::Transport,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TransportError::Configuration(message)
            | TransportError::Api { message, .. }
            | TransportError::Network(message)
            | TransportError::Protocol(message) => message,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Configuration(message) => write!(f, "{message}"),
            TransportError::Api {
                status: Some(status),
                message,
            } => write!(f, "API error ({status}): {message}"),
            TransportError::Api {
                status: None,
                message,
            } => write!(f, "API error: {message}"),
            TransportError::Network(message) => write!(f, "network error: {message}"),
            TransportError::Protocol(message) => write!(f, "unexpected response: {message}"),
        }
    }
}

impl Error for TransportError {}

impl From<&CredentialError> for TransportError {
    fn from(err: &CredentialError) -> Self {
        TransportError::Configuration(err.to_string())
    }
}

/// What one turn sends upstream: the new user text plus sealed history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub user_text: String,
    pub history: Vec<HistoryEntry>,
}

pub type FragmentStream = BoxStream<'static, Result<String, TransportError>>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Opens a stream of text fragments for one turn. Failures before the
    /// first fragment are returned here; later ones arrive as stream items.
    async fn open_stream(&self, request: TurnRequest) -> Result<FragmentStream, TransportError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl TransportSettings {
    pub fn from_config(config: &Config, base_url_override: Option<String>) -> Self {
        Self {
            base_url: base_url_override.unwrap_or_else(|| config.effective_base_url().to_string()),
            model: config.effective_model().to_string(),
            temperature: config.effective_temperature(),
            system_prompt: BANKING_SYSTEM_INSTRUCTION.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

pub struct GeminiTransport {
    client: reqwest::Client,
    settings: TransportSettings,
    credential: Result<ApiKey, CredentialError>,
}

impl GeminiTransport {
    pub fn new(settings: TransportSettings, credential: Result<ApiKey, CredentialError>) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            credential,
        }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn stream_url(&self) -> String {
        construct_api_url(
            &self.settings.base_url,
            &format!("models/{}:streamGenerateContent?alt=sse", self.settings.model),
        )
    }

    pub fn build_request(&self, request: &TurnRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|entry| Content::text(entry.role.as_str(), entry.text.clone()))
            .collect();
        contents.push(Content::text(Role::User.as_str(), request.user_text.clone()));

        GenerateContentRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: self.settings.system_prompt.clone(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
            },
            safety_settings: safety_settings(),
        }
    }
}

#[async_trait]
impl ChatTransport for GeminiTransport {
    async fn open_stream(&self, request: TurnRequest) -> Result<FragmentStream, TransportError> {
        let api_key = self.credential.as_ref().map_err(TransportError::from)?;

        info!(
            model = %self.settings.model,
            history = request.history.len(),
            "opening model stream"
        );

        let body = self.build_request(&request);
        let response = self
            .client
            .post(self.stream_url())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            let err = classify_api_error(Some(status.as_u16()), &error_text);
            warn!(%status, error = %err, "model stream rejected");
            return Err(err);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(sse_fragments(body))
    }
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Fragment(String),
    Error(TransportError),
    Done,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(payload: &str) -> Option<SseEvent> {
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }
    if payload.trim().is_empty() {
        return None;
    }

    let value = match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => value,
        Err(_) => {
            return Some(SseEvent::Error(TransportError::Protocol(
                collapse_whitespace(payload),
            )))
        }
    };

    if value.get("error").is_some() {
        return Some(SseEvent::Error(classify_api_error(None, payload)));
    }

    let response = match serde_json::from_value::<GenerateContentResponse>(value) {
        Ok(response) => response,
        Err(e) => return Some(SseEvent::Error(TransportError::Protocol(e.to_string()))),
    };

    if response.candidates.is_empty() {
        if let Some(reason) = response.block_reason() {
            return Some(SseEvent::Error(TransportError::Protocol(format!(
                "prompt blocked: {reason}"
            ))));
        }
    }

    response
        .text()
        .filter(|text| !text.is_empty())
        .map(SseEvent::Fragment)
}

fn process_sse_line(line: &str) -> Option<SseEvent> {
    extract_data_payload(line).and_then(handle_data_payload)
}

struct SseState<S> {
    body: S,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, TransportError>>,
    finished: bool,
}

impl<S> SseState<S> {
    /// Parses one line. Returns true once the stream must stop.
    fn push_line(&mut self, raw: &[u8]) -> bool {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("invalid UTF-8 in stream: {e}");
                return false;
            }
        };

        match process_sse_line(line) {
            Some(SseEvent::Fragment(text)) => {
                self.pending.push_back(Ok(text));
                false
            }
            Some(SseEvent::Error(err)) => {
                self.pending.push_back(Err(err));
                true
            }
            Some(SseEvent::Done) => true,
            None => false,
        }
    }

    fn drain_lines(&mut self) {
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if self.push_line(&line[..newline_pos]) {
                self.finished = true;
                return;
            }
        }
    }
}

/// Turns a raw SSE byte stream into text fragments. The first error item
/// ends the stream.
fn sse_fragments<S, E>(body: S) -> FragmentStream
where
    S: futures_util::Stream<Item = Result<Vec<u8>, E>> + Send + Unpin + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(&bytes);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(TransportError::Network(e.to_string())));
                }
                None => {
                    state.finished = true;
                    if !state.buffer.is_empty() {
                        let rest = std::mem::take(&mut state.buffer);
                        state.push_line(&rest);
                    }
                }
            }
        }
    })
    .boxed()
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| collapse_whitespace(&text))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn mentions_credential(text: &str) -> bool {
    text.contains("API_KEY") || text.contains("API key")
}

/// Classifies an error body. Rejected credentials surface as
/// [`TransportError::Configuration`], everything else as [`TransportError::Api`].
pub fn classify_api_error(status: Option<u16>, error_text: &str) -> TransportError {
    let trimmed = error_text.trim();
    let message = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| {
            if trimmed.is_empty() {
                "<empty>".to_string()
            } else {
                collapse_whitespace(trimmed)
            }
        });

    let credential_status = matches!(status, Some(401) | Some(403));
    if credential_status || mentions_credential(trimmed) {
        TransportError::Configuration(message)
    } else {
        TransportError::Api { status, message }
    }
}

/// Terminal updates are `Error` and `End`; exactly one of them closes a stream.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    Error(TransportError),
    End,
}

pub struct StreamParams {
    pub transport: Arc<dyn ChatTransport>,
    pub request: TurnRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) -> tokio::task::JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                transport,
                request,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = forward_stream(transport, request, &cancel_token, &tx, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
        })
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn forward_stream(
    transport: Arc<dyn ChatTransport>,
    request: TurnRequest,
    cancel_token: &CancellationToken,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let mut fragments = match transport.open_stream(request).await {
        Ok(fragments) => fragments,
        Err(err) => {
            let _ = tx.send((StreamMessage::Error(err), stream_id));
            return;
        }
    };

    while let Some(item) = fragments.next().await {
        if cancel_token.is_cancelled() {
            return;
        }
        match item {
            Ok(fragment) => {
                // Receiver gone means the UI was torn down.
                if tx.send((StreamMessage::Chunk(fragment), stream_id)).is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.send((StreamMessage::Error(err), stream_id));
                return;
            }
        }
    }

    let _ = tx.send((StreamMessage::End, stream_id));
}
