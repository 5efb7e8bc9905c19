//! # Voxforge Core
//!
//! Turns a text prompt into a voxel model by asking a hosted language model.
//!
//! ## Core Concepts
//! - **Voxel**: a colored unit cube at integer grid coordinates
//! - **Prompt**: the fixed system instruction plus a create or morph request
//! - **Provider**: trait-based LLM communication (Gemini, OpenAI-compatible)
//! - **Forge**: validate, call the provider under a bounded wait, decode the reply
//! - **Journal**: bounded ring buffer of recent forge events

pub mod config;
pub mod error;
pub mod forge;
pub mod journal;
pub mod prompt;
pub mod provider;
pub mod reply;
pub mod voxel;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::ForgeConfig;
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use forge::{Forge, ForgeMode, ForgeRequest, Forged};
pub use journal::{Journal, JournalEntry, Outcome};
pub use prompt::{PromptPair, SYSTEM_INSTRUCTION};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, GeminiProvider,
    HttpProviderFactory, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError,
    ProviderFactory, ProviderType, Role, Usage,
};
pub use reply::{decode_reply, strip_code_fences};
pub use voxel::{Bounds, ModelReport, Voxel};
