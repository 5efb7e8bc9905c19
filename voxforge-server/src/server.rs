//! Router assembly and the serve loop

use crate::routes;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use voxforge_core::{Error, Result};

/// Build the router with all routes, CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/forge",
            post(routes::forge).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/journal",
            get(routes::journal).fallback(routes::method_not_allowed),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| {
            Error::from(e)
                .with_operation("server::bind")
                .with_context("address", bind_address)
        })?;

    let local = listener.local_addr()?;
    let config = state.forge.config();
    tracing::info!(
        address = %local,
        provider = %config.provider,
        credential = config.has_credential(),
        "voxel forge listening"
    );
    if !config.has_credential() {
        tracing::warn!(
            env = %config.api_key_env,
            "no provider credential configured; forge requests will fail"
        );
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::from(e).with_operation("server::serve"))?;

    tracing::info!("voxel forge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use voxforge_core::testing::{Script, ScriptedFactory};
    use voxforge_core::{Forge, ForgeConfig};

    fn config(api_key: Option<&str>) -> ForgeConfig {
        ForgeConfig {
            api_key: api_key.map(str::to_string),
            timeout: Duration::from_millis(200),
            ..ForgeConfig::default()
        }
    }

    fn app(script: Script, api_key: Option<&str>) -> (Router, ScriptedFactory, AppState) {
        let factory = ScriptedFactory::new(script);
        let forge = Forge::with_factory(config(api_key), Arc::new(factory.clone()));
        let state = AppState::with_forge(forge, 8);
        (router(state.clone()), factory, state)
    }

    fn post_forge(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/forge")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_red_cube_end_to_end() {
        let reply = r##"[{"x":0,"y":0,"z":0,"color":"#ff0000"}]"##;
        let (router, factory, state) = app(Script::reply(reply), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":"red cube"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"x": 0, "y": 0, "z": 0, "color": "#ff0000"}]));
        assert_eq!(factory.builds(), 1);

        let entries = state.journal.snapshot();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_success());
        assert_eq!(entries[0].prompt, "red cube");
    }

    #[tokio::test]
    async fn test_empty_prompt_is_bad_request() {
        let (router, factory, _) = app(Script::reply("[]"), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Prompt is required"}));
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_bad_request() {
        let (router, factory, _) = app(Script::reply("[]"), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"mode":"create"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt is required");
        assert!(factory.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (router, factory, _) = app(Script::reply("[]"), Some("key"));

        let (status, body) = send(router, post_forge("not json at all")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_server_error() {
        let (router, factory, _) = app(Script::reply("[]"), None);

        let (status, body) = send(router, post_forge(r#"{"prompt":"red cube"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration error: Missing API Key");
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_fenced_reply() {
        let (router, _, _) = app(Script::reply("```json\n[]\n```"), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":"void"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_format_error() {
        let (router, _, state) = app(Script::reply("Sorry, I cannot draw that."), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":"dragon"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Invalid response from AI"}));

        let entries = state.journal.snapshot();
        assert!(!entries[0].is_success());
    }

    #[tokio::test]
    async fn test_upstream_failure_relays_provider_message() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded."}}"#;
        let (router, _, _) = app(Script::api_error(503, body), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":"dragon"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "The model is overloaded.");
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let (router, _, _) = app(Script::Unreachable("connection refused".into()), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":"dragon"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "connection refused");
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let (router, _, _) = app(Script::Stall(Duration::from_secs(10)), Some("key"));

        let (status, body) = send(router, post_forge(r#"{"prompt":"dragon"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_morph_request() {
        let (router, factory, _) = app(Script::reply("[]"), Some("key"));

        let request = json!({
            "prompt": "give it a tail",
            "mode": "morph",
            "currentModel": [{"x": 0, "y": 0, "z": 0, "color": "#ff4d4d"}]
        });
        let (status, _) = send(router, post_forge(request.to_string())).await;
        assert_eq!(status, StatusCode::OK);

        let user = &factory.requests()[0].messages[1].content;
        assert!(user.contains("(1 of 1 voxels shown)"));
    }

    #[tokio::test]
    async fn test_returned_model_can_be_morphed() {
        let reply = r##"[{"x":0,"y":0,"z":0,"color":null},{"x":"1","y":0,"z":0,"color":"#fff"}]"##;
        let (router, factory, _) = app(Script::reply(reply), Some("key"));

        let (status, returned) = send(router.clone(), post_forge(r#"{"prompt":"cube"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(returned, serde_json::from_str::<Value>(reply).unwrap());

        let request = json!({
            "prompt": "make it taller",
            "mode": "morph",
            "currentModel": returned
        });
        let (status, _) = send(router, post_forge(request.to_string())).await;
        assert_eq!(status, StatusCode::OK);

        let user = &factory.requests()[1].messages[1].content;
        assert!(user.contains("(1 of 1 voxels shown)"));
        assert!(user.contains("#cccccc"));
    }

    #[tokio::test]
    async fn test_get_forge_is_method_not_allowed() {
        let (router, _, _) = app(Script::reply("[]"), Some("key"));

        let request = Request::builder()
            .method("GET")
            .uri("/api/forge")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }

    #[tokio::test]
    async fn test_journal_lists_recent_requests() {
        let (router, _, _) = app(Script::reply("[]"), Some("key"));

        send(router.clone(), post_forge(r#"{"prompt":"first"}"#)).await;
        send(router.clone(), post_forge(r#"{"prompt":""}"#)).await;

        let request = Request::builder()
            .method("GET")
            .uri("/api/journal")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);

        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["prompt"], "first");
        assert_eq!(entries[0]["status"], "forged");
        assert_eq!(entries[1]["status"], "failed");
        assert_eq!(entries[1]["kind"], "InvalidRequest");
    }
}
