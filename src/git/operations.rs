//! Git workflows composed from remote commands
//!
//! Each workflow is a linear pipeline: it connects lazily when no session
//! handle exists, normalizes the repository path, and runs `git` over the
//! shell. Nothing branches on remote content beyond exit status.

use tracing::{info, instrument, warn};

use super::{OperationKind, OperationReport, RemoteRewrite, inject_token};
use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::remote::{RemoteCommand, RemoteShell, normalize_path};

/// Runs clone/pull/push/status/remove on the remote host
pub struct GitOperations<'a, S: RemoteShell + ?Sized> {
    shell: &'a S,
    working_dir: String,
    token: Option<String>,
}

impl<'a, S: RemoteShell + ?Sized> GitOperations<'a, S> {
    pub fn new(shell: &'a S, config: &ConnectionConfig) -> Self {
        Self {
            shell,
            working_dir: normalize_path(&config.working_dir),
            token: config.token().map(str::to_string),
        }
    }

    /// Clone `url` into the working directory, on `branch` when given
    #[instrument(skip(self))]
    pub async fn clone_repo(&self, url: &str, branch: Option<&str>) -> OperationReport {
        let kind = OperationKind::Clone;
        if let Err(e) = self.shell.ensure_connected().await {
            return OperationReport::not_started(kind, e);
        }

        let url = match self.token.as_deref() {
            Some(token) => {
                let injected = inject_token(url, token);
                if injected != url {
                    info!("GitHub token added to clone URL");
                }
                injected
            }
            None => url.to_string(),
        };

        let mut command = RemoteCommand::git(["clone"]);
        if let Some(branch) = branch.map(str::trim).filter(|b| !b.is_empty()) {
            command = command.args(["-b", branch]);
        }
        let command = command.args(["--", url.as_str()]).in_dir(self.working_dir.as_str());

        let (output, error) = self.step(&command).await;
        log_outcome(kind, error.as_ref());
        OperationReport::new(kind, output, error)
    }

    /// Pull the current branch of the repository at `path`
    #[instrument(skip(self))]
    pub async fn pull(&self, path: &str) -> OperationReport {
        let kind = OperationKind::Pull;
        let path = normalize_path(path);
        if let Err(e) = self.shell.ensure_connected().await {
            return OperationReport::not_started(kind, e);
        }

        let rewrite = self.rewrite_origin(&path).await;

        let (output, error) = self.step(&RemoteCommand::git(["pull"]).in_dir(path)).await;
        log_outcome(kind, error.as_ref());
        OperationReport::new(kind, output, error).with_rewrite(rewrite)
    }

    /// Stage everything, commit with `message`, and push.
    ///
    /// Stops at the first failing step. Steps that already completed are not
    /// rolled back, so a failed push leaves the local commit in place.
    #[instrument(skip(self))]
    pub async fn push(&self, path: &str, message: &str) -> OperationReport {
        let kind = OperationKind::Push;
        let path = normalize_path(path);
        if let Err(e) = self.shell.ensure_connected().await {
            return OperationReport::not_started(kind, e);
        }

        let rewrite = self.rewrite_origin(&path).await;

        let steps = [
            RemoteCommand::git(["add", "."]).in_dir(path.as_str()),
            RemoteCommand::git(["commit", "-m", message]).in_dir(path.as_str()),
            RemoteCommand::git(["push"]).in_dir(path.as_str()),
        ];

        let mut outputs = Vec::with_capacity(steps.len());
        for (i, command) in steps.iter().enumerate() {
            let (output, error) = self.step(command).await;
            outputs.push(output);
            if let Some(e) = error {
                warn!("Push step {} failed: {}", i + 1, e);
                return OperationReport::new(kind, outputs.join("\n"), Some(e))
                    .with_rewrite(rewrite);
            }
        }

        log_outcome(kind, None);
        OperationReport::new(kind, outputs.join("\n"), None).with_rewrite(rewrite)
    }

    /// `git status` of the repository at `path`; read-only
    #[instrument(skip(self))]
    pub async fn status(&self, path: &str) -> OperationReport {
        let kind = OperationKind::Status;
        let path = normalize_path(path);
        if let Err(e) = self.shell.ensure_connected().await {
            return OperationReport::not_started(kind, e);
        }

        let (output, error) = self.step(&RemoteCommand::git(["status"]).in_dir(path)).await;
        log_outcome(kind, error.as_ref());
        OperationReport::new(kind, output, error)
    }

    /// Delete the directory at `path`.
    ///
    /// Probes existence before and after `rm -rf`, which runs regardless of
    /// the first probe. The transcript always carries all four parts; the
    /// report's error reflects the `rm` command alone.
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &str) -> OperationReport {
        let kind = OperationKind::Remove;
        let path = normalize_path(path);
        if let Err(e) = self.shell.ensure_connected().await {
            return OperationReport::not_started(kind, e);
        }

        let check = self
            .probe(
                &RemoteCommand::new("test")
                    .args(["-d", path.as_str()])
                    .and_then("echo")
                    .arg("exists")
                    .or_else("echo 'not exists'"),
            )
            .await;
        info!("Directory existence: {}", check);

        let remove = RemoteCommand::new("rm").args(["-rf", path.as_str()]);
        let (result, error) = self.step(&remove).await;

        let confirm = self
            .probe(
                &RemoteCommand::new("test")
                    .args(["-d", path.as_str()])
                    .and_then("echo")
                    .arg("still exists")
                    .or_else("echo deleted"),
            )
            .await;
        info!("Removal result: {}", confirm);

        log_outcome(kind, error.as_ref());
        let transcript = format!(
            "Check: {}\nCommand: {}\nResult: {}\nConfirm: {}",
            check,
            remove.render(),
            result,
            confirm
        );
        OperationReport::new(kind, transcript, error)
    }

    /// Best-effort: embed the token into `origin` of the repository at `path`
    async fn rewrite_origin(&self, path: &str) -> RemoteRewrite {
        let Some(token) = self.token.as_deref() else {
            return RemoteRewrite::Skipped;
        };

        let get_url = RemoteCommand::git(["remote", "get-url", "origin"]).in_dir(path);
        let current = match self.shell.execute(&get_url).await {
            Ok(output) => output.trim().to_string(),
            Err(e) => return self.rewrite_failed(e),
        };
        if current.is_empty() {
            return RemoteRewrite::Failed("origin has no URL".to_string());
        }

        let rewritten = inject_token(&current, token);
        if rewritten == current {
            return RemoteRewrite::Unchanged;
        }

        let set_url = RemoteCommand::git(["remote", "set-url", "origin"])
            .arg(rewritten)
            .in_dir(path);
        match self.shell.execute(&set_url).await {
            Ok(_) => {
                info!("Remote URL updated with token");
                RemoteRewrite::Applied
            }
            Err(e) => self.rewrite_failed(e),
        }
    }

    fn rewrite_failed(&self, error: Error) -> RemoteRewrite {
        let mut reason = error.to_string();
        if let Some(token) = self.token.as_deref() {
            reason = reason.replace(token, "***");
        }
        warn!("Remote URL rewrite failed: {}", reason);
        RemoteRewrite::Failed(reason)
    }

    /// Run one step, keeping its output even when it fails
    async fn step(&self, command: &RemoteCommand) -> (String, Option<Error>) {
        match self.shell.run(command).await {
            Ok(result) => {
                let output = result.output.clone();
                (output, result.into_result().err())
            }
            Err(e) => (String::new(), Some(e)),
        }
    }

    /// Run a diagnostic probe whose own failure is only reported as text
    async fn probe(&self, command: &RemoteCommand) -> String {
        match self.shell.run(command).await {
            Ok(result) => result.output.trim().to_string(),
            Err(e) => format!("probe failed: {}", e),
        }
    }
}

fn log_outcome(kind: OperationKind, error: Option<&Error>) {
    match error {
        Some(e) => warn!("{} failed: {}", kind, e),
        None => info!("{} successful", kind),
    }
}
