//! Project and file discovery on the remote host

use tracing::{info, instrument};

use super::{FileInfo, Project, parse_file_listing, parse_projects};
use crate::remote::{RemoteCommand, RemoteShell, normalize_path};

use crate::error::Result;

/// Lists repositories and directory contents under the working directory
pub struct Discovery<'a, S: RemoteShell + ?Sized> {
    shell: &'a S,
    working_dir: String,
}

impl<'a, S: RemoteShell + ?Sized> Discovery<'a, S> {
    pub fn new(shell: &'a S, working_dir: impl Into<String>) -> Self {
        Self {
            shell,
            working_dir: normalize_path(&working_dir.into()),
        }
    }

    /// Command locating `.git` directories up to two levels below the working directory
    pub fn projects_command(&self) -> RemoteCommand {
        RemoteCommand::new("find")
            .arg(self.working_dir.as_str())
            .args(["-maxdepth", "2", "-name", ".git", "-type", "d"])
    }

    /// Command listing files then directories one level below `dir`.
    ///
    /// `-mindepth 1` keeps `dir` itself out of the listing, whatever form
    /// `find` prints it in.
    pub fn files_command(dir: &str) -> RemoteCommand {
        RemoteCommand::new("find")
            .arg(dir)
            .args(["-mindepth", "1", "-maxdepth", "1", "-type", "f"])
            .args(["-exec", "ls", "-la", "{}", ";"])
            .and_then("find")
            .arg(dir)
            .args(["-mindepth", "1", "-maxdepth", "1", "-type", "d"])
            .args(["-exec", "ls", "-ld", "{}", ";"])
    }

    /// Find every git repository under the working directory
    #[instrument(skip(self), fields(working_dir = %self.working_dir))]
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.shell.ensure_connected().await?;

        let output = self.shell.execute(&self.projects_command()).await?;
        let projects = parse_projects(&output);

        info!("Total {} projects found", projects.len());
        Ok(projects)
    }

    /// List one directory level; an empty path means the working directory
    #[instrument(skip(self))]
    pub async fn list_files(&self, path: &str) -> Result<Vec<FileInfo>> {
        self.shell.ensure_connected().await?;

        let dir = if path.trim().is_empty() {
            self.working_dir.clone()
        } else {
            normalize_path(path)
        };

        let output = self.shell.execute(&Self::files_command(&dir)).await?;
        Ok(parse_file_listing(&output, &dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::ConnectionManager;
    use crate::config::ConnectionConfig;

    #[test]
    fn test_projects_command() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        let discovery = Discovery::new(&manager, "/root/projects");
        assert_eq!(
            discovery.projects_command().render(),
            "find /root/projects -maxdepth 2 -name .git -type d"
        );
    }

    #[test]
    fn test_files_command() {
        let cmd = Discovery::<ConnectionManager>::files_command("/root/projects");
        assert_eq!(
            cmd.render(),
            "find /root/projects -mindepth 1 -maxdepth 1 -type f -exec ls -la '{}' ';' && \
             find /root/projects -mindepth 1 -maxdepth 1 -type d -exec ls -ld '{}' ';'"
        );
    }

    #[test]
    fn test_projects_command_anchors_dash_dir() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        let discovery = Discovery::new(&manager, "-x");
        assert!(discovery.projects_command().render().starts_with("find ./-x "));
    }
}
