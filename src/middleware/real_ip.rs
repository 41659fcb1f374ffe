//! Resolve the originating client address from proxy headers.

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Headers consulted in order; the first one holding a parseable address wins.
pub const CLIENT_IP_HEADERS: [&str; 3] = ["true-client-ip", "x-real-ip", "x-forwarded-for"];

/// Client address attached to every request as an extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Pick the client address from headers, falling back to the socket peer.
/// For `X-Forwarded-For` only the first (left-most) hop is considered.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    CLIENT_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(',').next())
        .find_map(|v| v.trim().parse::<IpAddr>().ok())
        .or_else(|| peer.map(|p| p.ip()))
}

pub async fn real_ip(
    peer: Option<ConnectInfo<SocketAddr>>,
    mut req: Request,
    next: Next,
) -> Response {
    let peer = peer.map(|ConnectInfo(addr)| addr);
    if let Some(ip) = resolve_client_ip(req.headers(), peer) {
        req.extensions_mut().insert(ClientIp(ip));
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:51000".parse().unwrap())
    }

    #[test]
    fn true_client_ip_takes_precedence() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7"),
            ("x-real-ip", "198.51.100.2"),
            ("true-client-ip", "192.0.2.1"),
        ]);
        assert_eq!(resolve_client_ip(&h, peer()), Some("192.0.2.1".parse().unwrap()));
    }

    #[test]
    fn real_ip_before_forwarded_for() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(resolve_client_ip(&h, peer()), Some("198.51.100.2".parse().unwrap()));
    }

    #[test]
    fn forwarded_for_uses_first_hop() {
        let h = headers(&[("x-forwarded-for", " 203.0.113.7 , 10.1.1.1, 10.2.2.2")]);
        assert_eq!(resolve_client_ip(&h, peer()), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn garbage_header_is_skipped() {
        let h = headers(&[("x-real-ip", "not-an-ip"), ("x-forwarded-for", "2001:db8::1")]);
        assert_eq!(resolve_client_ip(&h, peer()), Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_peer() {
        let expected = Some("10.0.0.9".parse().unwrap());
        assert_eq!(resolve_client_ip(&HeaderMap::new(), peer()), expected);
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), None);
    }
}
