use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};

use crate::state::AppState;

/// Request metadata of an anonymous widget visitor.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First hop of `X-Forwarded-For`, falling back to `X-Real-IP`.
/// Values that are not IP addresses are ignored.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().and_then(|ip| ip.trim().parse().ok()))
        .or_else(|| header_str(headers, "x-real-ip").and_then(|ip| ip.parse().ok()))
}

/// Resolve the visitor address. Proxy headers are honoured only when the
/// server sits behind a proxy that overwrites them.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trust_proxy_headers: bool,
) -> Option<IpAddr> {
    if trust_proxy_headers {
        forwarded_ip(headers).or(peer)
    } else {
        peer
    }
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip = client_ip(
            &parts.headers,
            peer,
            state.config.server.trust_proxy_headers,
        );

        Ok(ClientInfo {
            ip: ip.map(|ip| ip.to_string()),
            user_agent: header_str(&parts.headers, header::USER_AGENT),
            referer: header_str(&parts.headers, header::REFERER),
        })
    }
}
