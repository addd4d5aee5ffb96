//! Local system metadata collection
//!
//! Gathers basic, non-invasive host metadata for diagnostics and
//! reporting: hostname, primary IPv4 address, platform details, kernel
//! version, architecture and the MAC of the primary interface.
//!
//! Collection never fails; fields that cannot be determined render as
//! "unknown".

use std::{fmt, net::IpAddr};
use sysinfo::{System, SystemExt};
use tracing::debug;

/// Collected host metadata
#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub ip_address: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub architecture: String,
    pub mac_address: String,
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hostname:         {}", self.hostname)?;
        writeln!(f, "IP address:       {}", self.ip_address)?;
        writeln!(f, "Platform:         {}", self.platform)?;
        writeln!(f, "Platform version: {}", self.platform_version)?;
        writeln!(f, "Kernel version:   {}", self.kernel_version)?;
        writeln!(f, "Architecture:     {}", self.architecture)?;
        write!(f, "MAC address:      {}", self.mac_address)
    }
}

/// Collect basic system metadata
pub fn collect_system_info() -> SystemInfo {
    let sys = System::new();
    let primary = detect_primary_interface();

    SystemInfo {
        hostname: sys.host_name().unwrap_or_else(unknown),
        ip_address: primary
            .as_ref()
            .map(|(_, ip)| ip.to_string())
            .or_else(detect_ip_via_udp)
            .unwrap_or_else(unknown),
        platform: sys.name().unwrap_or_else(unknown),
        platform_version: sys.os_version().unwrap_or_else(unknown),
        kernel_version: sys.kernel_version().unwrap_or_else(unknown),
        architecture: std::env::consts::ARCH.to_string(),
        mac_address: primary
            .as_ref()
            .and_then(|(name, _)| read_mac_address(name))
            .unwrap_or_else(unknown),
    }
}

fn unknown() -> String {
    "unknown".to_string()
}

/// Interfaces skipped when looking for the primary address
pub fn is_ignored_interface(name: &str) -> bool {
    name.starts_with("lo") || name.starts_with("docker") || name.starts_with("veth")
}

/// Walk interfaces for the first non-loopback IPv4 address
fn detect_primary_interface() -> Option<(String, IpAddr)> {
    let interfaces = if_addrs::get_if_addrs().ok()?;

    for iface in interfaces {
        if is_ignored_interface(&iface.name) || iface.is_loopback() {
            continue;
        }
        let ip = iface.ip();
        if ip.is_ipv4() {
            debug!(interface = %iface.name, ip = %ip, "Primary interface detected");
            return Some((iface.name, ip));
        }
    }
    None
}

/// UDP-connect trick: no packets are sent, the kernel just picks the route
fn detect_ip_via_udp() -> Option<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

#[cfg(target_os = "linux")]
fn read_mac_address(interface: &str) -> Option<String> {
    let raw = std::fs::read_to_string(format!("/sys/class/net/{interface}/address")).ok()?;
    let mac = raw.trim();
    if mac.is_empty() {
        None
    } else {
        Some(mac.to_string())
    }
}

#[cfg(not(target_os = "linux"))]
fn read_mac_address(_interface: &str) -> Option<String> {
    None
}
