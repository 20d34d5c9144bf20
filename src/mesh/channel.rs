//! Connection establishment
//!
//! Turns a logical target name plus a domain profile into a usable channel:
//! SRV-based service discovery, then secure or insecure transport negotiation.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver, TokioResolver};
use url::Url;

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::mesh::identity::WorkloadIdentity;

/// Upper bound on establishing the transport.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Targets that already carry a port separator are dialed literally.
pub fn is_literal_address(target: &str) -> bool {
    target.contains(':')
}

/// Resolves a logical service name inside `domain` to an `ip:port` address.
///
/// First record wins on both the SRV and the address lookup: this is a
/// best-effort client, not a load balancer.
pub async fn resolve_target(domain: &Domain, target: &str) -> Result<String> {
    if is_literal_address(target) {
        return Ok(target.to_string());
    }

    let resolver = build_resolver(domain)?;
    let fqdn = domain.fqdn(target);

    let srv = resolver
        .srv_lookup(fqdn.as_str())
        .await
        .map_err(|e| Error::Resolution(format!("SRV {fqdn}: {e}")))?;
    let port = srv
        .iter()
        .next()
        .map(|record| record.port())
        .ok_or_else(|| Error::Resolution(format!("SRV {fqdn}: empty result")))?;

    let ips = resolver
        .lookup_ip(fqdn.as_str())
        .await
        .map_err(|e| Error::Resolution(format!("address {fqdn}: {e}")))?;
    let ip = ips
        .iter()
        .next()
        .ok_or_else(|| Error::Resolution(format!("address {fqdn}: empty result")))?;

    Ok(format!("{ip}:{port}"))
}

fn build_resolver(domain: &Domain) -> Result<TokioResolver> {
    match &domain.dns_server_address {
        Some(address) => {
            let addr = parse_dns_address(address)?;
            let servers = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
            let mut config = ResolverConfig::new();
            for server in servers.iter() {
                config.add_name_server(server.clone());
            }
            Ok(Resolver::builder_with_config(config, TokioConnectionProvider::default()).build())
        }
        None => Resolver::builder_tokio()
            .map(|builder| builder.build())
            .map_err(|e| Error::Resolution(format!("system resolver: {e}"))),
    }
}

/// Override resolver addresses accept `ip:port` or a bare IP (port 53).
fn parse_dns_address(address: &str) -> Result<SocketAddr> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    address
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| Error::Resolution(format!("invalid DNS server address {address}")))
}

/// A negotiated channel to one remote service.
#[derive(Debug, Clone)]
pub struct MeshChannel {
    base: Url,
    http: reqwest::Client,
    bearer: Option<String>,
}

/// Establishes a channel to `target` inside `domain`.
///
/// Insecure domains get a plain transport and never touch the workload
/// identity agent; everything else negotiates mutual TLS with the domain's
/// SVID and attaches a per-call bearer credential.
pub async fn establish(domain: &Domain, target: &str) -> Result<MeshChannel> {
    let address = resolve_target(domain, target).await?;

    if domain.is_insecure {
        let http = builder()
            .build()
            .map_err(|e| Error::Connect(e.to_string()))?;
        return MeshChannel::new(&format!("http://{address}"), http, None);
    }

    let identity = WorkloadIdentity::from_env();
    let tls_identity = identity.client_identity().await?;
    let bearer = identity.bearer_token(target).await?;

    let http = builder()
        .use_rustls_tls()
        .identity(tls_identity)
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        // Any peer identity is authorized; ours is still presented.
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| Error::Connect(e.to_string()))?;
    MeshChannel::new(&format!("https://{address}"), http, Some(bearer))
}

fn builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(concat!("nsmctl/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
}

impl MeshChannel {
    fn new(base: &str, http: reqwest::Client, bearer: Option<String>) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::Connect(e.to_string()))?;
        Ok(Self { base, http, bearer })
    }

    /// Base address the channel points at.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET returning the decoded JSON body.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        tracing::debug!("GET {}", path);
        let request = self.authorize(self.http.get(self.url(path)).query(query));
        let response = send(request).await?;
        let response = check_status(path, response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Connect(format!("reading response: {e}")))
    }

    /// GET without decoding, for streamed responses.
    pub async fn get_stream(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        tracing::debug!("GET {} (stream)", path);
        let request = self.authorize(self.http.get(self.url(path)).query(query));
        let response = send(request).await?;
        check_status(path, response).await
    }

    /// POST with a JSON body, discarding the response body.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<()> {
        tracing::debug!("POST {}", path);
        let request = self.authorize(self.http.post(self.url(path)).json(body));
        let response = send(request).await?;
        check_status(path, response).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        tracing::debug!("DELETE {}", path);
        let request = self.authorize(self.http.delete(self.url(path)));
        let response = send(request).await?;
        check_status(path, response).await?;
        Ok(())
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    request
        .send()
        .await
        .map_err(|e| Error::Connect(e.to_string()))
}

async fn check_status(path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));

    if status == reqwest::StatusCode::NOT_FOUND {
        let name = path.rsplit('/').next().unwrap_or(path);
        return Err(Error::NotFound(name.to_string()));
    }
    Err(Error::Connect(format!("request failed: {status}")))
}

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}
