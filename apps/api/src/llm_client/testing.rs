//! Scripted completion backend for tests. Replies are served in order and
//! every request is recorded so tests can count calls per schema.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{CompletionBackend, CompletionRequest, LlmError};

pub enum Reply {
    Text(String),
    Status(u16, String),
    /// Never resolves; the client's timeout has to fire.
    Hang,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Text(value.to_string())
    }

    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    pub fn status(status: u16, message: &str) -> Self {
        Reply::Status(status, message.to_string())
    }
}

pub struct ScriptedBackend {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_for(&self, schema: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.schema == schema)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Status(status, message)) => Err(LlmError::Api { status, message }),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(LlmError::Api {
                status: 400,
                message: format!("script exhausted at {} call", request.schema),
            }),
        }
    }
}
