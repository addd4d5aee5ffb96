//! Result parsing and report rendering
//!
//! Parses nmap output conservatively: only lines matching the canonical
//! port-table shape become records, everything else is skipped. False
//! negatives are preferred over misparsed data, so banner and version lines
//! never leak into the port list.
//!
//! The report layout is fixed and byte-reproducible given identical inputs
//! and a pinned timestamp.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::{fmt, path::Path, sync::OnceLock};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{GhostVenomError, Result};

/// Number of raw output lines shown in the report preview section
const PREVIEW_LINES: usize = 30;

/// Report title line
const REPORT_TITLE: &str = "GhostVenom Report";

/// Placeholder rendered when no line matched the parser
const NO_PORTS_PLACEHOLDER: &str = "No ports matched the conservative parser rules.";

static PORT_LINE: OnceLock<Regex> = OnceLock::new();

fn port_line_regex() -> &'static Regex {
    PORT_LINE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)/(tcp|udp)\s+(\w+)\s+(\S+)(.*)$").expect("port line regex")
    })
}

/// Transport protocol of a parsed port line
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// One parsed port-table row, in source-line order
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortRecord {
    pub port: u16,
    pub protocol: Protocol,
    pub state: String,
    pub service: String,
    pub details: String,
}

/// Conservatively extract port records from raw nmap output
///
/// Non-matching lines are skipped silently; duplicates are preserved and no
/// ordering is imposed beyond source order.
pub fn parse_ports(raw: &str) -> Vec<PortRecord> {
    let mut records = Vec::new();

    for line in raw.lines() {
        let Some(caps) = port_line_regex().captures(line) else {
            continue;
        };

        // The pattern anchors on digits, but the value may still not fit u16
        let Ok(port) = caps[1].parse::<u16>() else {
            debug!("Skipping port line out of u16 range: {}", line.trim());
            continue;
        };

        let protocol = match &caps[2] {
            "tcp" => Protocol::Tcp,
            _ => Protocol::Udp,
        };

        records.push(PortRecord {
            port,
            protocol,
            state: caps[3].to_string(),
            service: caps[4].to_string(),
            details: caps[5].trim().to_string(),
        });
    }

    records
}

/// Render the fixed-format text report
///
/// The timestamp is injected so the body stays reproducible in tests.
pub fn render_report(raw: &str, ports: &[PortRecord], generated_at: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push(REPORT_TITLE.to_string());
    lines.push(format!(
        "Generated: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push("=".repeat(72));
    lines.push(String::new());

    // Raw output preview
    lines.push(format!("Nmap Output Preview (first {PREVIEW_LINES} lines)"));
    lines.push("-".repeat(72));
    for line in raw.lines().take(PREVIEW_LINES) {
        lines.push(line.to_string());
    }
    lines.push(String::new());

    // Parsed ports
    lines.push("Detected Open Ports (conservative parser)".to_string());
    lines.push("-".repeat(72));

    if ports.is_empty() {
        lines.push(NO_PORTS_PLACEHOLDER.to_string());
    } else {
        for record in ports {
            lines.push(format!(
                "{}/{}  {}  {}  {}",
                record.port, record.protocol, record.state, record.service, record.details
            ));
        }
    }

    lines.join("\n")
}

/// Write a rendered report in one full-content pass
///
/// Parent directories are created proactively; filesystem faults are the
/// only error path and surface as a typed error the caller reports as a
/// non-fatal notice.
pub async fn write_report<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.map_err(|e| {
                GhostVenomError::report(path.display().to_string(), e.to_string())
            })?;
        }
    }

    fs::write(path, content)
        .await
        .map_err(|e| GhostVenomError::report(path.display().to_string(), e.to_string()))?;

    info!("Report written: {}", path.display());
    Ok(())
}

/// Parse, render and write in one step; returns the parsed records
pub async fn create_report<P: AsRef<Path>>(raw: &str, path: P) -> Result<Vec<PortRecord>> {
    let ports = parse_ports(raw);
    let content = render_report(raw, &ports, Utc::now());
    write_report(path, &content).await?;
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_typical_port_line() {
        let raw = "80/tcp open http Apache httpd 2.4.41";
        let records = parse_ports(raw);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.port, 80);
        assert_eq!(record.protocol, Protocol::Tcp);
        assert_eq!(record.state, "open");
        assert_eq!(record.service, "http");
        assert_eq!(record.details, "Apache httpd 2.4.41");
    }

    #[test]
    fn test_parse_skips_non_matching_lines() {
        assert!(parse_ports("foo bar").is_empty());
        assert!(parse_ports("Starting Nmap 7.94 ( https://nmap.org )").is_empty());
        assert!(parse_ports("").is_empty());
    }

    #[test]
    fn test_parse_preserves_source_order_and_duplicates() {
        let raw = "443/tcp open https\n22/tcp open ssh OpenSSH 8.9\n22/tcp open ssh OpenSSH 8.9";
        let records = parse_ports(raw);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].port, 443);
        assert_eq!(records[1].port, 22);
        assert_eq!(records[2], records[1]);
    }

    #[test]
    fn test_parse_udp_and_leading_whitespace() {
        let records = parse_ports("  53/udp open domain dnsmasq 2.80");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].protocol, Protocol::Udp);
        assert_eq!(records[0].service, "domain");
    }

    #[test]
    fn test_parse_skips_ports_beyond_u16() {
        assert!(parse_ports("70000/tcp open bogus").is_empty());
    }

    #[test]
    fn test_render_is_idempotent() {
        let raw = "80/tcp open http Apache httpd 2.4.41\nirrelevant banner line";
        let ports = parse_ports(raw);
        let ts = fixed_timestamp();

        let first = render_report(raw, &ports, ts);
        let second = render_report(raw, &ports, ts);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_structure() {
        let raw = "80/tcp open http Apache httpd 2.4.41";
        let ports = parse_ports(raw);
        let report = render_report(raw, &ports, fixed_timestamp());
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "GhostVenom Report");
        assert_eq!(lines[1], "Generated: 2024-06-01 12:00:00 UTC");
        assert_eq!(lines[2], "=".repeat(72));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Nmap Output Preview (first 30 lines)");
        assert!(report.contains("80/tcp  open  http  Apache httpd 2.4.41"));
    }

    #[test]
    fn test_render_placeholder_for_empty_port_list() {
        let report = render_report("nothing parseable here", &[], fixed_timestamp());
        assert!(report.contains(NO_PORTS_PLACEHOLDER));
    }

    #[test]
    fn test_render_preview_is_bounded() {
        let raw: String = (0..100)
            .map(|i| format!("line {i}\n"))
            .collect();
        let report = render_report(&raw, &[], fixed_timestamp());

        assert!(report.contains("line 29"));
        assert!(!report.contains("line 30\n"));
    }

    #[tokio::test]
    async fn test_write_report_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("report.txt");

        write_report(&path, "content").await.unwrap();
        let read_back = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(read_back, "content");
    }

    #[tokio::test]
    async fn test_create_report_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");
        let raw = "80/tcp open http Apache httpd 2.4.41";

        let ports = create_report(raw, &path).await.unwrap();
        assert_eq!(ports.len(), 1);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with("GhostVenom Report"));
        assert!(content.contains("80/tcp  open  http  Apache httpd 2.4.41"));
    }
}
