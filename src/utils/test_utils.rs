use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;

use crate::core::chat_stream::{ChatTransport, FragmentStream, TransportError, TurnRequest};

#[derive(Debug, Clone)]
pub enum ScriptStep {
    Fragment(String),
    Fail(TransportError),
}

/// In-memory transport that replays a fixed script for every turn and
/// records the requests it was given.
pub struct ScriptedTransport {
    steps: Vec<ScriptStep>,
    open_error: Option<TransportError>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            open_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fragments(fragments: &[&str]) -> Self {
        Self::new(
            fragments
                .iter()
                .map(|f| ScriptStep::Fragment(f.to_string()))
                .collect(),
        )
    }

    pub fn failing_open(err: TransportError) -> Self {
        Self {
            steps: Vec::new(),
            open_error: Some(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_stream(&self, request: TurnRequest) -> Result<FragmentStream, TransportError> {
        self.requests.lock().expect("requests lock").push(request);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }

        let items: Vec<Result<String, TransportError>> = self
            .steps
            .iter()
            .map(|step| match step {
                ScriptStep::Fragment(text) => Ok(text.clone()),
                ScriptStep::Fail(err) => Err(err.clone()),
            })
            .collect();
        Ok(stream::iter(items).boxed())
    }
}
