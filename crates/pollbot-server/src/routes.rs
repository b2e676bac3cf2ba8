use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use pollbot_core::dispatch::Dispatcher;
use pollbot_core::platform::ChatPlatform;
use pollbot_models::interaction::{Interaction, InteractionResponse, InteractionType};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::decode;
use crate::error::ApiError;
use crate::signature::{InteractionVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub struct ServerState<P> {
    pub dispatcher: Dispatcher<P>,
    pub verifier: InteractionVerifier,
}

impl<P> Clone for ServerState<P> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

pub fn build_router<P: ChatPlatform>(state: ServerState<P>) -> Router {
    Router::new()
        .route("/interactions", post(interactions::<P>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn interactions<P: ChatPlatform>(
    State(state): State<ServerState<P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, ApiError> {
    let signature = header(&headers, SIGNATURE_HEADER)?;
    let timestamp = header(&headers, TIMESTAMP_HEADER)?;
    state.verifier.verify(signature, timestamp, &body)?;

    let interaction: Interaction = serde_json::from_slice(&body)?;
    if interaction.interaction_type == InteractionType::Ping {
        return Ok(Json(InteractionResponse::pong()));
    }

    let invocation = match decode::decode(&interaction) {
        Ok(invocation) => invocation,
        Err(ApiError::Unsupported) => {
            tracing::debug!(interaction_id = interaction.id, "Ignoring unsupported interaction");
            return Ok(Json(InteractionResponse::ephemeral_text(
                "❌ This action is not supported.",
            )));
        }
        Err(e) => return Err(e),
    };

    let outcome = state.dispatcher.dispatch(invocation, Utc::now()).await;
    if !outcome.followups.is_empty() {
        let dispatcher = state.dispatcher.clone();
        let followups = outcome.followups;
        tokio::spawn(async move {
            dispatcher.run_followups(followups).await;
        });
    }
    Ok(Json(outcome.response))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::hex_encode;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ed25519_dalek::{Signer, SigningKey};
    use pollbot_core::engine::VoteEngine;
    use pollbot_core::persistence::{MemoryMedium, SnapshotMedium};
    use pollbot_core::platform::{PlatformError, UserProfile};
    use pollbot_core::store::PollStore;
    use pollbot_core::{AppState, PollSettings};
    use pollbot_models::message::MessagePayload;
    use rand::RngCore;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingPlatform {
        next_id: AtomicI64,
    }

    impl ChatPlatform for CountingPlatform {
        async fn create_message(&self, _: i64, _: &MessagePayload) -> Result<i64, PlatformError> {
            Ok(500 + self.next_id.fetch_add(1, Ordering::SeqCst))
        }

        async fn edit_message(&self, _: i64, _: i64, _: &MessagePayload) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn delete_message(&self, _: i64, _: i64) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn resolve_user(&self, _: i64) -> Result<UserProfile, PlatformError> {
            Err(PlatformError::NotFound)
        }
    }

    struct Harness {
        router: Router,
        key: SigningKey,
        state: AppState,
    }

    fn harness() -> Harness {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        let key = SigningKey::from_bytes(&secret);
        let verifier =
            InteractionVerifier::from_hex(&hex_encode(&key.verifying_key().to_bytes())).unwrap();

        let store = PollStore::new(SnapshotMedium::Memory(MemoryMedium::new()));
        let state = AppState::new(store, VoteEngine::default(), PollSettings::default());
        let dispatcher = Dispatcher::new(state.clone(), Arc::new(CountingPlatform::default()));
        Harness {
            router: build_router(ServerState {
                dispatcher,
                verifier,
            }),
            key,
            state,
        }
    }

    fn signed(key: &SigningKey, body: &Value) -> Request<Body> {
        let body = serde_json::to_vec(body).unwrap();
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(&body);
        Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, hex_encode(&key.sign(&message).to_bytes()))
            .header(TIMESTAMP_HEADER, timestamp)
            .body(Body::from(body))
            .unwrap()
    }

    fn command(name: &str, options: Value, permissions: &str) -> Value {
        json!({
            "id": "1",
            "application_id": "2",
            "type": 2,
            "channel_id": "50",
            "token": "t",
            "version": 1,
            "member": {
                "permissions": permissions,
                "user": {"id": "10", "username": "ann"}
            },
            "data": {"name": name, "type": 1, "options": options}
        })
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let h = harness();
        let resp = h
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let h = harness();
        let ping = json!({"id": "1", "application_id": "2", "type": 1, "token": "t", "version": 1});
        let resp = h.router.oneshot(signed(&h.key, &ping)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"type": 1}));
    }

    #[tokio::test]
    async fn unsigned_or_forged_requests_are_rejected() {
        let h = harness();
        let ping = json!({"id": "1", "application_id": "2", "type": 1, "token": "t", "version": 1});

        let mut forged = signed(&h.key, &ping);
        forged
            .headers_mut()
            .insert(TIMESTAMP_HEADER, "1700000001".parse().unwrap());
        let resp = h.router.clone().oneshot(forged).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["code"], "UNAUTHORIZED");

        let unsigned = Request::builder()
            .method("POST")
            .uri("/interactions")
            .body(Body::from(serde_json::to_vec(&ping).unwrap()))
            .unwrap();
        let resp = h.router.oneshot(unsigned).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_poll_command_is_dispatched() {
        let h = harness();
        let body = command(
            "poll",
            json!([{"name": "create", "type": 1, "options": [
                {"name": "title", "type": 3, "value": "Lunch"},
                {"name": "op1", "type": 3, "value": "Pho"},
                {"name": "op2", "type": 3, "value": "Bun"}
            ]}]),
            "0",
        );
        let resp = h.router.oneshot(signed(&h.key, &body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["flags"], 64);

        let polls = h.state.store.all();
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].id, 500);
        assert_eq!(polls[0].option2.as_deref(), Some("Bun"));
    }

    #[tokio::test]
    async fn admin_command_from_member_is_refused() {
        let h = harness();
        let body = command("channel", json!([{"name": "select", "type": 7, "value": "9"}]), "0");
        let resp = h.router.oneshot(signed(&h.key, &body)).await.unwrap();
        let json = json_body(resp).await;
        assert!(json["data"]["content"].as_str().unwrap().contains("Administrator"));
        assert_eq!(h.state.store.bot_config().admin_channel, None);
    }

    #[tokio::test]
    async fn unknown_command_gets_polite_reply() {
        let h = harness();
        let body = command("dance", json!([]), "0");
        let resp = h.router.oneshot(signed(&h.key, &body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["data"]["flags"], 64);
    }
}
