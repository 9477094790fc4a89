//! remote-git - Drive git workflows on a remote host over SSH
//!
//! Run with `remote-git --help` for usage.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use remote_git::{
    APP_NAME, AuthMethod, Config, ConnectionManager, Discovery, GitOperations, OperationReport,
    RemoteRewrite, RemoteShell, VERSION,
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Drive git workflows on a remote host over a single SSH connection")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List git repositories under the working directory
    Projects {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List one remote directory (default: the working directory)
    Files {
        path: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Clone a repository into the working directory
    Clone {
        url: String,

        /// Branch to check out
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Pull a repository
    Pull { path: String },

    /// Add everything, commit and push
    Push {
        path: String,

        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show `git status` of a repository
    Status { path: String },

    /// Delete a repository directory
    Remove { path: String },

    /// Run a shell command on the remote host
    Exec { command: String },

    /// Open a fresh session, run `hostname && pwd`, and disconnect
    TestConnection,

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug").add_directive("russh=info".parse()?)
    } else {
        // Use info level for our crate, warn for dependencies
        EnvFilter::new("info")
            .add_directive("russh=warn".parse()?)
            .add_directive("tokio=warn".parse()?)
    };

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Print a report's transcript and turn its error into the exit status
fn finish(report: OperationReport) -> Result<()> {
    let OperationReport {
        kind,
        output,
        remote_rewrite,
        error,
    } = report;

    if !output.trim().is_empty() {
        println!("{}", output.trim_end());
    }

    match remote_rewrite {
        Some(RemoteRewrite::Failed(reason)) => {
            eprintln!("Warning: remote URL rewrite failed: {}", reason)
        }
        Some(rewrite) => info!("Remote URL rewrite: {}", rewrite),
        None => {}
    }

    match error {
        Some(e) => Err(eyre!("{} failed: {}", kind, e)),
        None => {
            println!("{} completed successfully", kind);
            Ok(())
        }
    }
}

/// Config as TOML with credentials masked
fn redacted_toml(config: &Config) -> Result<String> {
    let mut shown = config.clone();
    if shown.connection.github_token.is_some() {
        shown.connection.github_token = Some("***".to_string());
    }
    match &mut shown.connection.auth {
        AuthMethod::Password { password } if !password.is_empty() => *password = "***".to_string(),
        AuthMethod::Key {
            passphrase: Some(passphrase),
            ..
        } => *passphrase = "***".to_string(),
        _ => {}
    }
    Ok(toml::to_string_pretty(&shown)?)
}

async fn run(command: Commands, config: &Config, manager: &ConnectionManager) -> Result<()> {
    let conn = &config.connection;

    match command {
        Commands::Projects { json } => {
            let projects = Discovery::new(manager, conn.working_dir.as_str())
                .list_projects()
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No git repositories under {}", conn.working_dir);
            } else {
                for project in projects {
                    println!("{:<24} {}", project.name, project.path);
                }
            }
        }

        Commands::Files { path, json } => {
            let files = Discovery::new(manager, conn.working_dir.as_str())
                .list_files(path.as_deref().unwrap_or_default())
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in files {
                    let marker = if file.is_dir { 'd' } else { '-' };
                    println!(
                        "{} {:>10} {:<12} {}",
                        marker, file.size, file.mod_time, file.name
                    );
                }
            }
        }

        Commands::Clone { url, branch } => {
            let ops = GitOperations::new(manager, conn);
            finish(ops.clone_repo(&url, branch.as_deref()).await)?;
        }

        Commands::Pull { path } => {
            finish(GitOperations::new(manager, conn).pull(&path).await)?;
        }

        Commands::Push { path, message } => {
            finish(GitOperations::new(manager, conn).push(&path, &message).await)?;
        }

        Commands::Status { path } => {
            finish(GitOperations::new(manager, conn).status(&path).await)?;
        }

        Commands::Remove { path } => {
            finish(GitOperations::new(manager, conn).remove(&path).await)?;
        }

        Commands::Exec { command } => {
            manager.ensure_connected().await?;
            match manager.execute_command(&command).await {
                Ok(output) => print!("{}", output),
                Err(e) => {
                    if let Some(output) = e.output() {
                        print!("{}", output);
                    }
                    return Err(e.into());
                }
            }
        }

        Commands::TestConnection => {
            manager.reconnect().await?;
            manager.health_check().await?;
            let output = manager.execute_command("hostname && pwd").await?;
            println!("Connection successful: {}", output.trim());
        }

        // Handled before a connection manager exists
        Commands::Config { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    setup_logging(cli.debug || config.debug, config.log_file.as_deref())?;

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::config_file_path()?,
    };

    if let Commands::Config { init } = cli.command {
        if init {
            match &cli.config {
                Some(path) => config.save_to(path)?,
                None => config.save()?,
            }
            println!("Configuration initialized at {:?}", config_path);
        } else {
            println!("Configuration:");
            println!("{}", redacted_toml(&config)?);
            println!("\nConfig file: {:?}", config_path);
        }
        return Ok(());
    }

    if !config.is_configured() {
        return Err(eyre!(
            "No remote host configured. Set connection.host in {:?} or REMOTE_GIT_CONNECTION__HOST",
            config_path
        ));
    }

    info!("Starting {} v{}", APP_NAME, VERSION);

    let manager = ConnectionManager::new(config.connection.clone());
    let outcome = run(cli.command, &config, &manager).await;
    manager.disconnect().await;

    outcome
}
