//! pm2 supervisor adapter.
//!
//! Implements the `pmbot-core` SupervisorPort by driving the `pm2` CLI as a
//! subprocess: `pm2 ping` for the startup connectivity check, `pm2 jlist`
//! for process snapshots, `pm2 restart <id>` for restarts.

use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use pmbot_core::{
    domain::ProcessDescriptor,
    ports::SupervisorPort,
    Error, Result,
};

const STDERR_TAIL_MAX_BYTES: usize = 2 * 1024;
const STDERR_TAIL_MAX_LINES: usize = 10;

#[derive(Clone, Debug)]
pub struct Pm2Client {
    pm2_path: PathBuf,
}

/// One element of `pm2 jlist` output. Everything pm2 reports beyond the
/// name and status is ignored.
#[derive(Debug, Deserialize)]
struct Pm2Process {
    #[serde(default)]
    name: String,
    #[serde(default)]
    pm2_env: Pm2Env,
}

#[derive(Debug, Deserialize)]
struct Pm2Env {
    #[serde(default = "unknown_status")]
    status: String,
}

impl Default for Pm2Env {
    fn default() -> Self {
        Self {
            status: unknown_status(),
        }
    }
}

fn unknown_status() -> String {
    "unknown".to_string()
}

impl Pm2Client {
    pub fn new(pm2_path: PathBuf) -> Self {
        Self { pm2_path }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        debug!(pm2 = %self.pm2_path.display(), ?args, "running pm2");

        Command::new(&self.pm2_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::Supervisor(format!(
                    "failed to run {} {}: {e}",
                    self.pm2_path.display(),
                    args.join(" ")
                ))
            })
    }
}

#[async_trait]
impl SupervisorPort for Pm2Client {
    async fn connect(&self) -> Result<()> {
        let out = self.run(&["ping"]).await?;
        if !out.status.success() {
            return Err(Error::Supervisor(format!(
                "pm2 ping failed: {}",
                stderr_tail(&out.stderr)
            )));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProcessDescriptor>> {
        let out = self.run(&["jlist"]).await?;
        if !out.status.success() {
            return Err(Error::Supervisor(format!(
                "pm2 jlist failed: {}",
                stderr_tail(&out.stderr)
            )));
        }

        let processes: Vec<Pm2Process> = serde_json::from_slice(&out.stdout)?;
        Ok(processes
            .into_iter()
            .map(|p| ProcessDescriptor {
                name: p.name,
                status: p.pm2_env.status,
            })
            .collect())
    }

    async fn restart(&self, id: &str) -> Result<()> {
        let out = self.run(&["restart", id]).await?;
        if !out.status.success() {
            return Err(Error::Supervisor(format!(
                "pm2 restart {id} failed: {}",
                stderr_tail(&out.stderr)
            )));
        }
        Ok(())
    }
}

/// Bounded view of a subprocess's stderr, so a noisy pm2 cannot bloat the
/// error we log and forward.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_MAX_LINES);
    let mut tail = lines[start..].join("\n");

    if tail.len() > STDERR_TAIL_MAX_BYTES {
        let cut = tail.len() - STDERR_TAIL_MAX_BYTES;
        // Keep the end; trim to a char boundary.
        let mut idx = cut;
        while !tail.is_char_boundary(idx) {
            idx += 1;
        }
        tail = tail[idx..].to_string();
    }

    let trimmed = tail.trim();
    if trimmed.is_empty() {
        "(no stderr)".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jlist_output() {
        let raw = r#"[
            {"pid": 123, "name": "api", "pm2_env": {"status": "online", "pm_uptime": 1}},
            {"name": "worker", "pm2_env": {"status": "stopped"}}
        ]"#;

        let processes: Vec<Pm2Process> = serde_json::from_str(raw).unwrap();
        let descriptors: Vec<ProcessDescriptor> = processes
            .into_iter()
            .map(|p| ProcessDescriptor {
                name: p.name,
                status: p.pm2_env.status,
            })
            .collect();

        assert_eq!(
            descriptors,
            vec![
                ProcessDescriptor {
                    name: "api".to_string(),
                    status: "online".to_string(),
                },
                ProcessDescriptor {
                    name: "worker".to_string(),
                    status: "stopped".to_string(),
                },
            ]
        );
    }

    #[test]
    fn jlist_tolerates_missing_fields() {
        let raw = r#"[{"pid": 1}]"#;
        let processes: Vec<Pm2Process> = serde_json::from_str(raw).unwrap();
        assert_eq!(processes[0].name, "");
        assert_eq!(processes[0].pm2_env.status, "unknown");
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let noisy = (0..100)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");

        let tail = stderr_tail(noisy.as_bytes());
        assert!(tail.starts_with("line 90"));
        assert!(tail.ends_with("line 99"));
    }

    #[test]
    fn stderr_tail_handles_empty_output() {
        assert_eq!(stderr_tail(b""), "(no stderr)");
        assert_eq!(stderr_tail(b"  \n  "), "(no stderr)");
    }

    #[test]
    fn stderr_tail_bounds_byte_length() {
        let one_line = "x".repeat(10 * 1024);
        let tail = stderr_tail(one_line.as_bytes());
        assert!(tail.len() <= STDERR_TAIL_MAX_BYTES);
    }
}
