//! Plug-and-play autoscan flow
//!
//! Hotplug-style entry point for a just-connected network interface: an
//! advisory file lock with a cooldown dampens duplicate dispatcher runs,
//! the peer behind the interface is resolved, scanned, and the raw output
//! is archived. Analysis and report generation are best-effort.

use chrono::Utc;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tracing::{debug, info, warn};

use crate::{
    analysis::GptAnalyzer,
    error::{GhostVenomError, Result},
    network,
    report,
    scanner::NmapExecutor,
};

/// Cooldown window between autoscan runs
pub const COOLDOWN: Duration = Duration::from_secs(120);

/// Directory for archived raw scan output
const LOG_DIR: &str = "logs";

fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join("ghostvenom_plugplay.lock")
}

/// Advisory file lock released on drop
///
/// The lock dampens duplicate runs when a network dispatcher fires more
/// than once for the same hotplug event; it is not a correctness lock.
pub struct CooldownGuard {
    path: PathBuf,
}

impl Drop for CooldownGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %e, "Lock file already gone");
        }
    }
}

/// Try to take the advisory lock; None while the cooldown is active
pub fn acquire_lock(path: &Path, cooldown: Duration) -> Option<CooldownGuard> {
    if let Ok(metadata) = fs::metadata(path) {
        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok());
        if let Some(age) = age {
            if age < cooldown {
                return None;
            }
        }
    }

    // A lock that cannot be written must not block the scan
    if let Err(e) = fs::write(path, std::process::id().to_string()) {
        warn!(path = %path.display(), error = %e, "Could not write lock file");
    }

    Some(CooldownGuard {
        path: path.to_path_buf(),
    })
}

/// Resolve the peer to scan for a just-connected interface
///
/// Interface route first, then ARP neighbors, then the first host of the
/// interface network (typically the .1 router).
pub async fn resolve_interface_peer(
    interface: &str,
    address: &str,
    netmask: &str,
) -> Option<String> {
    if let Some(peer) = network::gateway_for_interface(interface).await {
        return Some(peer);
    }
    let net = network::cidr_from_ip_mask(address, netmask)?;
    network::first_host(&net).map(|host| host.to_string())
}

/// Run the full autoscan flow for one interface
///
/// Scan arguments and report path arrive pre-resolved so command-line
/// overrides apply here the same way they do in the normal pipeline.
pub async fn run_plug_and_play(
    executor: &NmapExecutor,
    analyzer: &GptAnalyzer,
    args_raw: &str,
    report_path: &Path,
    interface: &str,
    address: &str,
    netmask: &str,
) -> Result<()> {
    let lock_path = default_lock_path();
    let Some(_guard) = acquire_lock(&lock_path, COOLDOWN) else {
        info!(interface = %interface, "Autoscan cooldown active, scan skipped");
        return Ok(());
    };

    let peer = resolve_interface_peer(interface, address, netmask)
        .await
        .ok_or_else(|| {
            GhostVenomError::network(format!("No peer or gateway found for {interface}"))
        })?;

    info!(interface = %interface, address = %address, peer = %peer, "Autoscan starting");

    let scan_text = executor.execute_text(&peer, args_raw).await;

    // Archive the raw output per interface and timestamp
    let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let log_path = PathBuf::from(LOG_DIR).join(format!("{interface}_{timestamp}_nmap.txt"));
    tokio::fs::create_dir_all(LOG_DIR)
        .await
        .map_err(|e| GhostVenomError::io("create log directory", e.to_string()))?;
    tokio::fs::write(&log_path, &scan_text)
        .await
        .map_err(|e| GhostVenomError::io("write scan log", e.to_string()))?;
    info!("Raw scan output archived: {}", log_path.display());

    if analyzer.has_api_key() && !scan_text.trim().is_empty() {
        match analyzer.analyze(&scan_text).await {
            Ok(path) => info!("Autoscan analysis written: {}", path.display()),
            Err(e) => warn!("Autoscan analysis failed: {}", e),
        }
    }

    match report::create_report(&scan_text, report_path).await {
        Ok(ports) => info!(ports = ports.len(), "Autoscan report updated"),
        Err(e) => warn!("Autoscan report failed: {}", e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plugplay.lock");

        let guard = acquire_lock(&path, COOLDOWN);
        assert!(guard.is_some());
        assert!(path.exists());

        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn test_lock_respects_cooldown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plugplay.lock");

        let _guard = acquire_lock(&path, COOLDOWN).unwrap();
        // Fresh lock file within the window blocks a second acquisition
        assert!(acquire_lock(&path, COOLDOWN).is_none());
    }

    #[test]
    fn test_expired_lock_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plugplay.lock");
        fs::write(&path, "1234").unwrap();

        // Zero cooldown means any existing lock counts as expired
        let guard = acquire_lock(&path, Duration::ZERO);
        assert!(guard.is_some());
    }
}
