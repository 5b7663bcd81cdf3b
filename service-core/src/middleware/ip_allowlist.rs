use crate::error::AppError;
use crate::middleware::client_ip::peer_ip;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::{collections::HashSet, net::IpAddr, sync::Arc};

/// Peer addresses admitted when the allowlist is switched on.
///
/// Loopback peers are always admitted; a disabled list admits everyone.
#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    enabled: bool,
    addresses: Arc<HashSet<IpAddr>>,
}

impl IpAllowlist {
    pub fn new(enabled: bool, addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            enabled,
            addresses: Arc::new(addresses.into_iter().collect()),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list of addresses; blank entries are skipped.
    pub fn parse(enabled: bool, list: &str) -> Result<Self, AppError> {
        let addresses = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpAddr>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid allowlist address '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(enabled, addresses))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn permits(&self, ip: Option<IpAddr>) -> bool {
        if !self.enabled {
            return true;
        }
        match ip {
            Some(ip) => ip.is_loopback() || self.addresses.contains(&ip),
            None => false,
        }
    }
}

/// Reject requests whose peer address is not on the allowlist.
pub async fn ip_allowlist_middleware(
    State(allowlist): State<IpAllowlist>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = peer_ip(&request);
    if allowlist.permits(ip) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(client_ip = ?ip, "Client address not on allowlist");
    Err(AppError::AddressDenied(
        "禁止访问:客户端的 IP 地址被拒绝".to_string(),
    ))
}
