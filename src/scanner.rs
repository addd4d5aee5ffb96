//! Scan execution engine
//!
//! Drives the external nmap binary and always hands back text:
//! - Shell-word argument splitting for the configured argument string
//! - Per-attempt wall-clock timeout with partial output capture
//! - Privilege-aware fallback ladder for SYN scans (-sS):
//!   sudo -n, then unprivileged, then a TCP connect re-run when the output
//!   says root is required
//!
//! Every failure mode collapses into diagnostic text. Callers that need
//! structured handling inspect the tagged [`ScanOutcome`]; legacy consumers
//! use the rendered text alone.

use async_trait::async_trait;
use std::{
    env, io,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};
use tokio::{io::AsyncReadExt, process::Command, time::timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, ScanConfig};

/// Flag requesting a raw-socket SYN scan, which usually needs privilege
pub const ELEVATED_FLAG: &str = "-sS";

/// Fixed fallback location when nmap is not on PATH
const FALLBACK_BINARY: &str = "/usr/bin/nmap";

/// Notice prefixed to the output of the unprivileged connect-scan re-run
const FALLBACK_NOTICE: &str =
    "[i] Privileged SYN scan unavailable. Falling back to TCP connect scan (-sT).\n";

/// Output phrases indicating the scan needs root, matched case-insensitively.
/// Tool-output-version-dependent on purpose; kept verbatim for compatibility.
const ROOT_HINTS: [&str; 2] = ["requires root", "quitting!"];

/// Diagnostic returned when no target is configured
const NO_TARGET_DIAGNOSTIC: &str = "[!] No target specified.";

/// How a scan attempt terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// The subprocess ran to completion (exit code may still be non-zero)
    Ok,
    /// The wall-clock limit expired and the subprocess was killed
    Timeout,
    /// The binary could not be found
    NotFound,
    /// Spawn infrastructure failed unexpectedly
    Fault,
}

/// Result of one subprocess attempt: exit code plus merged stdout/stderr
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status: ScanStatus,
    pub exit_code: i32,
    pub text: String,
}

/// Structured scan result
///
/// `text` is always populated and is the only channel legacy consumers see;
/// `status`, `exit_code` and `fallback` exist for structured callers.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub exit_code: i32,
    pub text: String,
    /// True when the connect-scan fallback produced this output
    pub fallback: bool,
}

impl ScanOutcome {
    fn from_run(run: RunOutput, fallback: bool) -> Self {
        Self {
            status: run.status,
            exit_code: run.exit_code,
            text: run.text,
            fallback,
        }
    }

    fn diagnostic<S: Into<String>>(text: S) -> Self {
        Self {
            status: ScanStatus::Fault,
            exit_code: 1,
            text: text.into(),
            fallback: false,
        }
    }
}

/// Process-spawning seam so tests can substitute a scripted runner
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run an argument vector to completion within the given wall-clock limit
    async fn run(&self, argv: &[String], limit: Duration) -> RunOutput;
}

/// Real subprocess runner built on `tokio::process`
///
/// stdout and stderr are captured concurrently and merged (stdout first).
/// On timeout the child is killed and any partial output is preserved in
/// the diagnostic text.
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, argv: &[String], limit: Duration) -> RunOutput {
        let (program, args) = match argv.split_first() {
            Some(parts) => parts,
            None => {
                return RunOutput {
                    status: ScanStatus::Fault,
                    exit_code: 1,
                    text: "[!] unexpected execution error: empty command".to_string(),
                }
            }
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return RunOutput {
                    status: ScanStatus::NotFound,
                    exit_code: 127,
                    text: format!("[!] nmap binary not found at: {program}"),
                }
            }
            Err(e) => {
                return RunOutput {
                    status: ScanStatus::Fault,
                    exit_code: 1,
                    text: format!("[!] unexpected execution error: {e}"),
                }
            }
        };

        let stdout_task = tokio::spawn(read_to_string(child.stdout.take()));
        let stderr_task = tokio::spawn(read_to_string(child.stderr.take()));

        match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                RunOutput {
                    status: ScanStatus::Ok,
                    exit_code: status.code().unwrap_or(-1),
                    text: merge_streams(stdout, stderr),
                }
            }
            Ok(Err(e)) => RunOutput {
                status: ScanStatus::Fault,
                exit_code: 1,
                text: format!("[!] unexpected execution error: {e}"),
            },
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out subprocess: {}", e);
                }
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                let partial = merge_streams(stdout, stderr);
                RunOutput {
                    status: ScanStatus::Timeout,
                    exit_code: 124,
                    text: format!("[!] nmap timeout after {}s\n{}", limit.as_secs(), partial),
                }
            }
        }
    }
}

async fn read_to_string<R>(stream: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    match stream {
        Some(mut stream) => {
            let mut buf = Vec::new();
            let _ = stream.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        }
        None => String::new(),
    }
}

fn merge_streams(stdout: String, stderr: String) -> String {
    if stderr.is_empty() {
        stdout
    } else if stdout.is_empty() {
        stderr
    } else if stdout.ends_with('\n') {
        format!("{stdout}{stderr}")
    } else {
        // Keep stream boundaries on line boundaries so per-line consumers
        // never see the last stdout line glued to the first stderr line
        format!("{stdout}\n{stderr}")
    }
}

/// Scan executor with privilege-aware fallback
pub struct NmapExecutor {
    binary: String,
    attempt_timeout: Duration,
    runner: Arc<dyn CommandRunner>,
}

impl NmapExecutor {
    pub fn new(config: &ScanConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let binary = resolve_binary(config.binary_path.as_deref());
        debug!("Using nmap binary: {}", binary);

        Self {
            binary,
            attempt_timeout: Duration::from_secs(config.timeout_secs),
            runner,
        }
    }

    /// Execute a scan and return the structured outcome
    ///
    /// Never returns an error: every failure path terminates in diagnostic
    /// text carried by the outcome.
    pub async fn execute(&self, target: &str, args_raw: &str) -> ScanOutcome {
        if target.is_empty() {
            return ScanOutcome::diagnostic(NO_TARGET_DIAGNOSTIC);
        }

        let args = match shlex::split(args_raw) {
            Some(args) => args,
            None => {
                return ScanOutcome::diagnostic(format!(
                    "[!] could not parse scan arguments: {args_raw}"
                ))
            }
        };

        let scan_id = Uuid::new_v4();
        info!(
            scan_id = %scan_id,
            target = %target,
            args = %args_raw,
            "Starting nmap scan"
        );

        let outcome = if args.iter().any(|a| a == ELEVATED_FLAG) {
            self.execute_with_privilege_ladder(target, &args).await
        } else {
            let argv = self.build_argv(&args, target);
            let run = self.runner.run(&argv, self.attempt_timeout).await;
            ScanOutcome::from_run(run, false)
        };

        info!(
            scan_id = %scan_id,
            target = %target,
            exit_code = outcome.exit_code,
            fallback = outcome.fallback,
            "Nmap scan finished"
        );
        outcome
    }

    /// Convenience wrapper returning the rendered text alone
    pub async fn execute_text(&self, target: &str, args_raw: &str) -> String {
        self.execute(target, args_raw).await.text
    }

    /// Fixed three-step ladder for SYN scans; the ordering is load-bearing:
    /// 1. sudo -n (non-interactive, fails fast without a prompt)
    /// 2. identical command unprivileged (covers setcap binaries)
    /// 3. on a "needs root" hint, re-run without -sS as a connect scan
    /// Anything else surfaces step 2's output verbatim.
    async fn execute_with_privilege_ladder(&self, target: &str, args: &[String]) -> ScanOutcome {
        let base_argv = self.build_argv(args, target);

        let mut sudo_argv = vec!["sudo".to_string(), "-n".to_string()];
        sudo_argv.extend(base_argv.iter().cloned());

        let first = self.runner.run(&sudo_argv, self.attempt_timeout).await;
        if first.exit_code == 0 {
            return ScanOutcome::from_run(first, false);
        }
        debug!(exit_code = first.exit_code, "sudo -n attempt failed");

        let second = self.runner.run(&base_argv, self.attempt_timeout).await;
        if second.exit_code == 0 {
            return ScanOutcome::from_run(second, false);
        }
        debug!(exit_code = second.exit_code, "unprivileged attempt failed");

        let lower = second.text.to_lowercase();
        if ROOT_HINTS.iter().any(|hint| lower.contains(hint)) {
            info!("Root required for SYN scan, falling back to connect scan");
            let connect_args: Vec<String> = args
                .iter()
                .filter(|a| a.as_str() != ELEVATED_FLAG)
                .cloned()
                .collect();
            let connect_argv = self.build_argv(&connect_args, target);

            let third = self.runner.run(&connect_argv, self.attempt_timeout).await;
            let mut outcome = ScanOutcome::from_run(third, true);
            outcome.text = format!("{FALLBACK_NOTICE}{}", outcome.text);
            return outcome;
        }

        // Unexplained failure is surfaced as-is, not swallowed
        ScanOutcome::from_run(second, false)
    }

    fn build_argv(&self, args: &[String], target: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push(self.binary.clone());
        argv.extend(args.iter().cloned());
        argv.push(target.to_string());
        argv
    }
}

/// Locate the nmap binary: explicit config path, then PATH, then the fixed
/// fallback location
fn resolve_binary(configured: Option<&Path>) -> String {
    if let Some(path) = configured {
        return path.to_string_lossy().into_owned();
    }
    find_in_path("nmap")
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_BINARY.to_string())
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Create the default executor backed by the real subprocess runner
pub fn create_executor(config: &AppConfig) -> NmapExecutor {
    NmapExecutor::new(&config.scan, Arc::new(TokioCommandRunner))
}
