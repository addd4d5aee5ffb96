//! Peer and gateway resolution
//!
//! Determines which host to scan when no target is configured. The flow
//! prefers the directly connected peer: first usable ARP neighbor, then the
//! default gateway from the routing table, and finally the conventional
//! router address.
//!
//! Parsing is separated from process execution so the extraction logic is
//! testable without a live network.

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;
use tokio::process::Command;
use tracing::debug;

/// Last-resort target when nothing can be resolved
pub const DEFAULT_PEER: &str = "192.168.0.1";

/// Neighbor states considered usable
const USABLE_NEIGHBOR_STATES: [&str; 4] = ["REACHABLE", "STALE", "DELAY", "PROBE"];

/// Resolve a scan target: first ARP neighbor, then default gateway, then
/// the fixed fallback address
pub async fn detect_peer() -> String {
    let neighbor = detect_first_neighbor().await;
    let gateway = match &neighbor {
        Some(_) => None,
        None => detect_gateway().await,
    };
    let peer = select_peer(neighbor, gateway);
    debug!(peer = %peer, "Resolved scan target");
    peer
}

/// Precedence for auto-detected targets: neighbor over gateway over fallback
fn select_peer(neighbor: Option<String>, gateway: Option<String>) -> String {
    neighbor
        .or(gateway)
        .unwrap_or_else(|| DEFAULT_PEER.to_string())
}

/// Default gateway from the host routing table
pub async fn detect_gateway() -> Option<String> {
    let output = run_ip(&["route", "show", "default"]).await?;
    parse_default_gateway(&output)
}

/// First usable IPv4 neighbor from the ARP table
pub async fn detect_first_neighbor() -> Option<String> {
    let output = run_ip(&["-4", "neigh"]).await?;
    parse_first_neighbor(&output)
}

/// Gateway or peer for one specific interface (plug-and-play flow)
pub async fn gateway_for_interface(interface: &str) -> Option<String> {
    if let Some(output) = run_ip(&["-4", "route", "show", "dev", interface]).await {
        if let Some(gateway) = parse_default_gateway(&output) {
            return Some(gateway);
        }
    }
    let output = run_ip(&["-4", "neigh", "show", "dev", interface]).await?;
    parse_first_neighbor(&output)
}

/// Build a CIDR network from an address and dotted netmask
pub fn cidr_from_ip_mask(ip: &str, netmask: &str) -> Option<Ipv4Net> {
    let addr: Ipv4Addr = ip.parse().ok()?;
    let mask: Ipv4Addr = netmask.parse().ok()?;
    Ipv4Net::with_netmask(addr, mask).ok().map(|net| net.trunc())
}

/// First host of a network, typically the .1 router address
pub fn first_host(net: &Ipv4Net) -> Option<Ipv4Addr> {
    net.hosts().next()
}

/// Extract the address after "default via" from `ip route` output
pub fn parse_default_gateway(output: &str) -> Option<String> {
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("default") {
            continue;
        }
        if tokens.next() != Some("via") {
            continue;
        }
        if let Some(addr) = tokens.next() {
            return Some(addr.to_string());
        }
    }
    None
}

/// Extract the first neighbor address in a usable state from `ip neigh`
pub fn parse_first_neighbor(output: &str) -> Option<String> {
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (Some(addr), Some(state)) = (tokens.first(), tokens.last()) else {
            continue;
        };
        if USABLE_NEIGHBOR_STATES.contains(state) {
            return Some((*addr).to_string());
        }
    }
    None
}

async fn run_ip(args: &[&str]) -> Option<String> {
    let output = Command::new("ip").args(args).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_gateway() {
        let output = "default via 192.168.178.1 dev wlan0 proto dhcp metric 600";
        assert_eq!(
            parse_default_gateway(output).as_deref(),
            Some("192.168.178.1")
        );
    }

    #[test]
    fn test_parse_gateway_skips_other_routes() {
        let output = "192.168.178.0/24 dev wlan0 proto kernel scope link\n\
                      default via 10.0.0.1 dev eth0";
        assert_eq!(parse_default_gateway(output).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_parse_gateway_none_without_default_route() {
        assert_eq!(parse_default_gateway("192.168.1.0/24 dev eth0"), None);
        assert_eq!(parse_default_gateway(""), None);
    }

    #[test]
    fn test_parse_first_neighbor_picks_usable_state() {
        let output = "192.168.178.50 dev eth0 lladdr aa:aa:aa:aa:aa:aa FAILED\n\
                      192.168.178.1 dev eth0 lladdr bb:bb:bb:bb:bb:bb REACHABLE\n\
                      192.168.178.2 dev eth0 lladdr cc:cc:cc:cc:cc:cc STALE";
        assert_eq!(
            parse_first_neighbor(output).as_deref(),
            Some("192.168.178.1")
        );
    }

    #[test]
    fn test_parse_first_neighbor_none_when_all_failed() {
        let output = "192.168.178.50 dev eth0 lladdr aa:aa:aa:aa:aa:aa FAILED";
        assert_eq!(parse_first_neighbor(output), None);
    }

    #[test]
    fn test_peer_precedence_neighbor_over_gateway() {
        assert_eq!(
            select_peer(Some("192.168.178.20".into()), Some("192.168.178.1".into())),
            "192.168.178.20"
        );
        assert_eq!(
            select_peer(None, Some("192.168.178.1".into())),
            "192.168.178.1"
        );
        assert_eq!(select_peer(None, None), DEFAULT_PEER);
    }

    #[test]
    fn test_cidr_from_ip_mask() {
        let net = cidr_from_ip_mask("192.168.5.17", "255.255.255.0").unwrap();
        assert_eq!(net.to_string(), "192.168.5.0/24");
    }

    #[test]
    fn test_cidr_rejects_invalid_input() {
        assert!(cidr_from_ip_mask("not-an-ip", "255.255.255.0").is_none());
        assert!(cidr_from_ip_mask("192.168.5.17", "garbage").is_none());
    }

    #[test]
    fn test_first_host_is_dot_one() {
        let net = cidr_from_ip_mask("192.168.5.17", "255.255.255.0").unwrap();
        assert_eq!(first_host(&net), Some(Ipv4Addr::new(192, 168, 5, 1)));
    }
}
