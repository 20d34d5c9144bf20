//! Workload identity
//!
//! Fetches X.509 identities and signed bearer tokens from the SPIFFE Workload
//! API agent on the local node. The agent is an external collaborator; nsmctl
//! only consumes what it issues.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pem::Pem;
use spiffe::WorkloadApiClient;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Environment variable naming the workload API endpoint.
pub const SOCKET_ENV: &str = "SPIFFE_ENDPOINT_SOCKET";

/// Well-known agent socket used when the environment does not configure one.
const DEFAULT_SOCKET: &str = "unix:///tmp/spire-agent/public/api.sock";

/// Validity window of issued bearer tokens.
const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Tokens are refreshed this much before the window closes.
/// This prevents attaching a token that expires mid-request.
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Client identity and token source backed by the workload API socket.
#[derive(Clone)]
pub struct WorkloadIdentity {
    socket: String,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl WorkloadIdentity {
    /// Identity source at the configured or well-known workload API socket.
    pub fn from_env() -> Self {
        let socket = std::env::var(SOCKET_ENV).unwrap_or_else(|_| DEFAULT_SOCKET.to_string());
        Self {
            socket,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// PEM-encoded X.509 SVID usable as a TLS client identity.
    pub async fn client_identity(&self) -> Result<reqwest::Identity> {
        let mut client = self.connect().await?;
        let svid = client
            .fetch_x509_svid()
            .await
            .map_err(|e| Error::Connect(format!("fetching X.509 identity: {e}")))?;

        let mut bundle = String::new();
        for cert in svid.cert_chain() {
            bundle.push_str(&pem::encode(&Pem::new(
                "CERTIFICATE",
                cert.content().to_vec(),
            )));
        }
        bundle.push_str(&pem::encode(&Pem::new(
            "PRIVATE KEY",
            svid.private_key().content().to_vec(),
        )));

        reqwest::Identity::from_pem(bundle.as_bytes())
            .map_err(|e| Error::Connect(format!("building TLS identity: {e}")))
    }

    /// Bearer token for calls to `audience`, cached until the validity window
    /// closes.
    pub async fn bearer_token(&self, audience: &str) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("cached token expired, fetching a new one");
            }
        }

        let mut client = self.connect().await?;
        let svid = client
            .fetch_jwt_svid(&[audience], None)
            .await
            .map_err(|e| Error::Connect(format!("fetching bearer token: {e}")))?;
        let token = svid.token().to_string();
        let expires_at = Instant::now() + TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        Ok(token)
    }

    async fn connect(&self) -> Result<WorkloadApiClient> {
        WorkloadApiClient::new_from_path(&self.socket)
            .await
            .map_err(|e| Error::Connect(format!("workload API at {}: {e}", self.socket)))
    }
}
