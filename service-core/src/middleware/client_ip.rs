use crate::error::AppError;
use axum::extract::{ConnectInfo, Request};
use std::{
    collections::HashSet,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

/// Address of the connected peer, as recorded by `into_make_service_with_connect_info`.
pub fn peer_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Reverse proxies whose `X-Forwarded-For` entries are believed.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<HashSet<IpAddr>>);

impl TrustedProxies {
    pub fn new(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(Arc::new(addresses.into_iter().collect()))
    }

    /// Parse a comma-separated list of proxy addresses; blank entries are skipped.
    pub fn parse(list: &str) -> Result<Self, AppError> {
        let addresses = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpAddr>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid proxy address '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(addresses))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn trusts(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// Client address for per-client accounting.
///
/// The peer address unless the peer is a trusted proxy. Behind one, the
/// forwarded chain is walked from the right and the first hop that is not
/// itself a trusted proxy wins. Entries left of it were written by the
/// client and are never consulted.
pub fn client_ip(request: &Request, proxies: &TrustedProxies) -> Option<IpAddr> {
    let peer = peer_ip(request)?;
    if !proxies.trusts(&peer) {
        return Some(peer);
    }

    let hops: Vec<&str> = request
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect();

    let mut client = peer;
    for hop in hops.into_iter().rev() {
        match hop.parse::<IpAddr>() {
            Ok(ip) => {
                client = ip;
                if !proxies.trusts(&ip) {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    Some(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_from(peer: &str, forwarded: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn peer_ip_ignores_forwarded_header() {
        let req = request_from("10.0.0.1:5000", Some("203.0.113.9"));
        assert_eq!(peer_ip(&req), ip("10.0.0.1"));
    }

    #[test]
    fn untrusted_peer_cannot_forward() {
        let req = request_from("198.51.100.4:5000", Some("203.0.113.9"));
        assert_eq!(client_ip(&req, &TrustedProxies::default()), ip("198.51.100.4"));

        let proxies = TrustedProxies::parse("10.0.0.1").unwrap();
        assert_eq!(client_ip(&req, &proxies), ip("198.51.100.4"));
    }

    #[test]
    fn trusted_proxy_chain_yields_rightmost_untrusted_hop() {
        let proxies = TrustedProxies::parse("10.0.0.1, 10.0.0.2").unwrap();

        // The leftmost entry is whatever the client claimed
        let req = request_from("10.0.0.1:5000", Some("192.0.2.55, 203.0.113.9, 10.0.0.2"));
        assert_eq!(client_ip(&req, &proxies), ip("203.0.113.9"));
    }

    #[test]
    fn trusted_proxy_without_usable_header_is_the_client() {
        let proxies = TrustedProxies::parse("10.0.0.1").unwrap();

        let req = request_from("10.0.0.1:5000", None);
        assert_eq!(client_ip(&req, &proxies), ip("10.0.0.1"));

        let req = request_from("10.0.0.1:5000", Some("garbage"));
        assert_eq!(client_ip(&req, &proxies), ip("10.0.0.1"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TrustedProxies::parse("10.0.0.1,proxy").is_err());
        assert!(TrustedProxies::parse(" , ").unwrap().is_empty());
    }
}
