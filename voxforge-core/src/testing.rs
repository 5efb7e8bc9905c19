//! Scripted provider for exercising the forge without a network.
//!
//! The factory counts how many providers it built and records every request
//! they received, so tests can assert that a request never reached the
//! provider at all.

use crate::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderConfig,
    ProviderError, ProviderFactory, Usage,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the scripted provider does when called
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with this text
    Reply(String),
    /// Answer with no content
    Empty,
    /// Fail as if the API returned this status and body
    ApiError { status: u16, body: String },
    /// Fail as if the network was down
    Unreachable(String),
    /// Sleep this long, then answer `[]`
    Stall(Duration),
}

impl Script {
    pub fn reply(text: impl Into<String>) -> Self {
        Script::Reply(text.into())
    }

    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        Script::ApiError {
            status,
            body: body.into(),
        }
    }
}

struct Shared {
    script: Script,
    builds: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

/// Factory handing out [`ScriptedProvider`]s that share one script
#[derive(Clone)]
pub struct ScriptedFactory {
    shared: Arc<Shared>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            shared: Arc::new(Shared {
                script,
                builds: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of providers built so far
    pub fn builds(&self) -> usize {
        self.shared.builds.load(Ordering::SeqCst)
    }

    /// Every request any built provider received
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.shared.requests.lock().clone()
    }
}

impl ProviderFactory for ScriptedFactory {
    fn build(&self, _config: &ProviderConfig) -> Result<Box<dyn LlmProvider>, ProviderError> {
        self.shared.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedProvider {
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Provider that plays back a [`Script`]
pub struct ScriptedProvider {
    shared: Arc<Shared>,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.shared.requests.lock().push(request);

        let content = match &self.shared.script {
            Script::Reply(text) => Some(text.clone()),
            Script::Empty => None,
            Script::ApiError { status, body } => {
                return Err(ProviderError::from_status(*status, body, None))
            }
            Script::Unreachable(reason) => return Err(ProviderError::Network(reason.clone())),
            Script::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Some("[]".to_string())
            }
        };

        Ok(CompletionResponse {
            id: "scripted".into(),
            model: "scripted-model".into(),
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            },
        })
    }
}
