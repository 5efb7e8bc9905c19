//! # Forge
//!
//! One forge request, start to finish:
//! 1. Validate the prompt
//! 2. Check the provider credential
//! 3. Build the create or morph prompt
//! 4. Build a provider for this request and call it under a bounded wait
//! 5. Strip markdown fences and decode the reply as JSON
//!
//! The decoded value is returned as-is. When it has the shape of a voxel
//! model it is also measured, and structural problems are logged.

use crate::config::ForgeConfig;
use crate::error::{self, Error, Result};
use crate::prompt::PromptPair;
use crate::provider::{
    CompletionRequest, FinishReason, HttpProviderFactory, ProviderFactory, Usage,
};
use crate::reply::decode_reply;
use crate::voxel::{ModelReport, Voxel};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Output budget for one model; 300 voxels of JSON fit comfortably.
pub const MAX_OUTPUT_TOKENS: usize = 8192;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgeMode {
    #[default]
    Create,
    Morph,
}

impl ForgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForgeMode::Create => "create",
            ForgeMode::Morph => "morph",
        }
    }
}

/// Body of a forge request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgeRequest {
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient_model")]
    pub current_model: Option<Vec<Voxel>>,
    pub mode: Option<ForgeMode>,
}

impl ForgeRequest {
    pub fn create(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            current_model: None,
            mode: Some(ForgeMode::Create),
        }
    }

    pub fn morph(prompt: impl Into<String>, current: Vec<Voxel>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            current_model: Some(current),
            mode: Some(ForgeMode::Morph),
        }
    }

    /// Decode a request body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| error::invalid_body(e.to_string()))
    }

    /// The trimmed prompt, or a validation error
    pub fn prompt_text(&self) -> Result<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(error::prompt_required)
    }

    /// Morph only applies when there is a model to evolve
    pub fn effective_mode(&self) -> ForgeMode {
        match (self.mode.unwrap_or_default(), self.current_model.as_deref()) {
            (ForgeMode::Morph, Some(current)) if !current.is_empty() => ForgeMode::Morph,
            _ => ForgeMode::Create,
        }
    }
}

/// Clients send back whatever the forge returned last, which is only
/// guaranteed to be JSON. Keep the voxels that decode and drop the rest;
/// anything that is not an array counts as no model at all.
fn lenient_model<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Voxel>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(items)) => items,
        Some(_) | None => return Ok(None),
    };

    let voxels: Vec<Voxel> = items
        .iter()
        .filter_map(|item| Voxel::deserialize(item).ok())
        .collect();
    if voxels.len() < items.len() {
        tracing::debug!(
            dropped = items.len() - voxels.len(),
            kept = voxels.len(),
            "current model had voxels that do not decode"
        );
    }
    Ok(Some(voxels))
}

/// A successfully forged model
#[derive(Debug, Clone)]
pub struct Forged {
    /// The decoded reply, verbatim
    pub model: serde_json::Value,
    /// Measurements, when the reply has the shape of a voxel model
    pub report: Option<ModelReport>,
    pub mode: ForgeMode,
    pub provider_model: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// Validates requests and relays them to the configured provider
pub struct Forge {
    config: ForgeConfig,
    factory: Arc<dyn ProviderFactory>,
}

impl Forge {
    /// Create a forge backed by the real HTTP providers
    pub fn new(config: ForgeConfig) -> Self {
        Self::with_factory(config, Arc::new(HttpProviderFactory))
    }

    /// Create a forge with a custom provider factory
    pub fn with_factory(config: ForgeConfig, factory: Arc<dyn ProviderFactory>) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Validate a request and build its prompts without calling anything
    pub fn prompts(&self, request: &ForgeRequest) -> Result<PromptPair> {
        let prompt = request.prompt_text()?;
        Ok(match (request.effective_mode(), request.current_model.as_deref()) {
            (ForgeMode::Morph, Some(current)) => {
                PromptPair::morph(prompt, current, self.config.morph_sample)
            }
            _ => PromptPair::create(prompt),
        })
    }

    /// Run one forge request
    pub async fn forge(&self, request: ForgeRequest) -> Result<Forged> {
        let prompts = self.prompts(&request)?;
        let mode = request.effective_mode();
        if request.mode == Some(ForgeMode::Morph) && mode == ForgeMode::Create {
            tracing::debug!("morph requested without a current model, forging from scratch");
        }

        let api_key = match self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => key,
            None => {
                tracing::error!(env = %self.config.api_key_env, "provider credential is missing");
                return Err(error::missing_api_key(self.config.api_key_env.clone()));
            }
        };

        let provider = self
            .factory
            .build(&self.config.provider_config(api_key))
            .map_err(|e| error::upstream(e, self.config.provider.as_str()))?;

        let completion_request =
            CompletionRequest::new(prompts.into_messages()).with_max_tokens(MAX_OUTPUT_TOKENS);

        tracing::info!(
            provider = provider.name(),
            model = provider.default_model(),
            mode = mode.as_str(),
            "forging voxel model"
        );

        let started = Instant::now();
        let call = tokio::time::timeout(self.config.timeout, provider.complete(completion_request));
        let completion = match call.await {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => return Err(error::upstream(e, provider.name())),
            Err(_) => {
                return Err(Error::upstream_timeout(self.config.timeout.as_secs_f64())
                    .with_operation("forge::complete")
                    .with_context("provider", provider.name()))
            }
        };

        let raw = match completion.content.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(error::empty_response(provider.name())),
        };

        let model = decode_reply(raw)?;
        let report = Voxel::model_from_value(&model).map(|voxels| ModelReport::analyze(&voxels));

        match &report {
            Some(report) => {
                if !report.is_grounded() {
                    tracing::warn!(below_ground = report.below_ground, "model has voxels below ground");
                }
                if !report.is_connected() {
                    tracing::warn!(components = report.components, "model is not a single connected piece");
                }
                tracing::info!(
                    voxels = report.voxel_count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    tokens = completion.usage.total_tokens,
                    "forge complete"
                );
            }
            None => {
                tracing::warn!("reply parsed as JSON but is not a voxel array, relaying as-is");
            }
        }

        Ok(Forged {
            model,
            report,
            mode,
            provider_model: completion.model,
            finish_reason: completion.finish_reason,
            usage: completion.usage,
        })
    }
}
