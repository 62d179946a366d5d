use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::warn;

use super::verifier::FirebaseIdentity;
use crate::state::AppState;

pub const MISSING_TOKEN: &str = "Unauthorized: missing token";
pub const INVALID_TOKEN: &str = "Unauthorized: invalid token";

/// Extracts the bearer token, verifies it, and carries the decoded identity.
pub struct AuthUser(pub FirebaseIdentity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, MISSING_TOKEN))?;

        // Anything without the exact "Bearer " scheme counts as missing; the
        // verifier is never consulted for those requests.
        let token = auth
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, MISSING_TOKEN))?;

        match state.verifier.verify(token).await {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(e) => {
                warn!(error = %e, "token verification failed");
                Err((StatusCode::UNAUTHORIZED, INVALID_TOKEN))
            }
        }
    }
}

#[cfg(test)]
mod gate_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::verifier::TokenVerifier;
    use crate::state::AppState;

    struct StubVerifier {
        calls: AtomicUsize,
        identity: Option<FirebaseIdentity>,
    }

    impl StubVerifier {
        fn accepting(uid: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                identity: Some(FirebaseIdentity {
                    uid: uid.to_string(),
                    email: None,
                    name: None,
                }),
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                identity: None,
            }
        }
    }

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, _token: &str) -> anyhow::Result<FirebaseIdentity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.identity
                .clone()
                .ok_or_else(|| anyhow::anyhow!("token rejected by stub"))
        }
    }

    fn app_with(verifier: Arc<StubVerifier>) -> Router {
        let base = AppState::fake();
        let state = AppState::from_parts(base.db, base.config, verifier);
        Router::new()
            .route(
                "/whoami",
                get(|AuthUser(identity): AuthUser| async move { identity.uid }),
            )
            .with_state(state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn missing_header_is_rejected_without_calling_verifier() {
        let verifier = Arc::new(StubVerifier::accepting("u1"));
        let app = app_with(verifier.clone());

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, MISSING_TOKEN);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected_without_calling_verifier() {
        let verifier = Arc::new(StubVerifier::accepting("u1"));
        let app = app_with(verifier.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Authorization", "Token abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, MISSING_TOKEN);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_after_one_verification() {
        let verifier = Arc::new(StubVerifier::rejecting());
        let app = app_with(verifier.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Authorization", "Bearer expired-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, INVALID_TOKEN);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler_with_the_identity() {
        let verifier = Arc::new(StubVerifier::accepting("firebase-uid-1"));
        let app = app_with(verifier.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Authorization", "Bearer good-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "firebase-uid-1");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }
}
