//! Controlled outbound connectivity demonstration
//!
//! Intentionally NOT a reverse shell: it opens one outbound TCP
//! connection, sends an identification banner and closes. No listener, no
//! command execution, no retries. The target must be opted into explicitly
//! via environment variables.

use std::{env, time::Duration};
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const BANNER: &[u8] = b"GhostVenom connectivity demo\n";

/// Read the opt-in demo target from GVA_DEMO_HOST / GVA_DEMO_PORT
pub fn demo_target_from_env() -> Option<(String, u16)> {
    parse_demo_target(env::var("GVA_DEMO_HOST").ok(), env::var("GVA_DEMO_PORT").ok())
}

fn parse_demo_target(host: Option<String>, port: Option<String>) -> Option<(String, u16)> {
    let host = host.filter(|h| !h.is_empty())?;
    let port = port?.parse::<u16>().ok()?;
    Some((host, port))
}

/// Attempt the outbound demo connection; returns whether it succeeded
///
/// Returns false without side effects when no target is configured.
pub async fn attempt_connectivity_demo() -> bool {
    let Some((host, port)) = demo_target_from_env() else {
        debug!("Connectivity demo not configured, skipping");
        return false;
    };

    match timeout(CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(mut stream)) => {
            let sent = stream.write_all(BANNER).await.is_ok();
            let _ = stream.shutdown().await;
            info!(host = %host, port = port, "Connectivity demo completed");
            sent
        }
        Ok(Err(e)) => {
            debug!(host = %host, port = port, error = %e, "Connectivity demo failed");
            false
        }
        Err(_) => {
            debug!(host = %host, port = port, "Connectivity demo timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{io::AsyncReadExt, net::TcpListener};

    #[test]
    fn test_target_requires_both_variables() {
        assert_eq!(parse_demo_target(None, None), None);
        assert_eq!(parse_demo_target(Some("host".into()), None), None);
        assert_eq!(parse_demo_target(None, Some("4444".into())), None);
        assert_eq!(
            parse_demo_target(Some("host".into()), Some("4444".into())),
            Some(("host".into(), 4444))
        );
    }

    #[test]
    fn test_target_rejects_invalid_port() {
        assert_eq!(parse_demo_target(Some("host".into()), Some("notaport".into())), None);
        assert_eq!(parse_demo_target(Some("host".into()), Some("99999".into())), None);
        assert_eq!(parse_demo_target(Some("".into()), Some("4444".into())), None);
    }

    #[tokio::test]
    async fn test_banner_is_delivered() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(BANNER).await.unwrap();
        stream.shutdown().await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received, BANNER);
    }
}
