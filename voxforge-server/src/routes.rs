//! Route handlers
//!
//! Every forge request lands in the journal, whether it succeeded or not.

use crate::response::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::Json;
use std::time::Instant;
use voxforge_core::{Error, ForgeMode, ForgeRequest, Forged, JournalEntry, Outcome, Result};

/// `POST /api/forge`
pub async fn forge(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    let started = Instant::now();

    let (mode, prompt, result) = match ForgeRequest::from_json(&body) {
        Ok(request) => {
            let mode = request.effective_mode();
            let prompt = request.prompt.clone().unwrap_or_default();
            (mode, prompt, state.forge.forge(request).await)
        }
        Err(e) => (ForgeMode::Create, String::new(), Err(e)),
    };

    state
        .journal
        .push(JournalEntry::new(mode, &prompt, started.elapsed(), outcome(&result)));

    let forged = result?;
    Ok(Json(forged.model))
}

/// `GET /api/journal`
pub async fn journal(State(state): State<AppState>) -> Json<Vec<JournalEntry>> {
    Json(state.journal.snapshot())
}

/// Any method a route does not accept
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError(Error::method_not_allowed(method.as_str()))
}

fn outcome(result: &Result<Forged>) -> Outcome {
    match result {
        Ok(forged) => Outcome::Forged {
            voxels: forged.report.as_ref().map(|r| r.voxel_count),
            usage: forged.usage,
        },
        Err(e) => Outcome::Failed {
            kind: e.kind().to_string(),
            message: e.message().to_string(),
        },
    }
}
