use std::collections::HashMap;

use anyhow::Context;
use axum::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Google publishes the secure-token signing keys as a JWK set.
const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Decoded identity attached to the request after a successful verification.
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<FirebaseIdentity>;
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Verifies Firebase ID tokens: RS256 signature against Google's published
/// keys, audience = project id, issuer = the secure-token issuer.
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    http: reqwest::Client,
    keys: RwLock<HashMap<String, Jwk>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            issuer: format!("https://securetoken.google.com/{project_id}"),
            http: reqwest::Client::new(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the signing key for `kid`, refreshing the cached set when the
    /// kid is unknown (Google rotates these keys).
    async fn key_for(&self, kid: &str) -> anyhow::Result<Jwk> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        let set: JwkSet = self
            .http
            .get(JWKS_URL)
            .send()
            .await
            .context("fetch jwks")?
            .error_for_status()?
            .json()
            .await
            .context("parse jwks")?;

        let mut keys = self.keys.write().await;
        keys.clear();
        for key in set.keys {
            keys.insert(key.kid.clone(), key);
        }
        keys.get(kid)
            .cloned()
            .with_context(|| format!("no signing key for kid {kid}"))
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<FirebaseIdentity> {
        let header = decode_header(token).context("malformed token header")?;
        let kid = header.kid.context("token header has no kid")?;
        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(std::slice::from_ref(&self.project_id));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<FirebaseClaims>(token, &key, &validation)?;
        if data.claims.sub.is_empty() {
            anyhow::bail!("token has an empty subject");
        }
        debug!(uid = %data.claims.sub, "firebase token verified");

        Ok(FirebaseIdentity {
            uid: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}
