//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use serde::Serialize;
use smbmount_common::{CallContext, MountRequest, MounterConfig};
use tokio_util::sync::CancellationToken;

use crate::backend::MountBackend;
use crate::interface::MountInterface;
use crate::mounter::Mounter;

/// smbmount - SMB share mounting for cluster nodes
#[derive(Parser, Debug)]
#[command(name = "smbmount")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Where mount operations are carried out
    #[arg(
        long,
        global = true,
        value_enum,
        env = "SMBMOUNT_BACKEND",
        default_value_t = BackendKind::Helper
    )]
    pub backend: BackendKind,

    /// Helper filesystem service endpoint
    #[arg(long, global = true, env = "SMBMOUNT_FS_ENDPOINT")]
    pub fs_endpoint: Option<PathBuf>,

    /// Helper SMB service endpoint
    #[arg(long, global = true, env = "SMBMOUNT_SMB_ENDPOINT")]
    pub smb_endpoint: Option<PathBuf>,

    /// Domain suffix of cluster-internal share hosts
    #[arg(long, global = true, env = "SMBMOUNT_INTERNAL_DOMAIN")]
    pub internal_domain: Option<String>,

    /// Drive prefixed to root-relative helper paths
    #[arg(long, global = true, env = "SMBMOUNT_DEFAULT_DRIVE")]
    pub drive: Option<String>,

    /// Deadline for the whole command in seconds
    #[arg(long, global = true, env = "SMBMOUNT_CALL_TIMEOUT", value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Mount backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Delegate to the privileged helper service.
    Helper,
    /// Mount in this process.
    Native,
}

/// Output format of `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table.
    Table,
    /// One JSON object.
    Json,
}

/// Mount commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map an SMB share at a local path
    Mount {
        /// Share address, e.g. //server/share
        source: String,

        /// Local mount point
        target: String,

        /// Account name, optionally DOMAIN\user
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(long, env = "SMBMOUNT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Additional mount options
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },

    /// Remove a local mount point
    Unmount {
        /// Local mount point
        target: String,
    },

    /// Report whether a path is a mount point
    Check {
        /// Path to inspect
        path: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Create a directory
    Mkdir {
        /// Directory to create
        path: String,
    },

    /// Make a path show the contents of another
    Link {
        /// Existing directory
        source: String,

        /// Link location
        target: String,
    },
}

/// Result of `check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    path: String,
    exists: bool,
    is_mount_point: bool,
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("timeout must be at least one second".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(format!("invalid number of seconds: {e}")),
    }
}

impl Cli {
    /// Mounter configuration from defaults overlaid with the given flags.
    #[must_use]
    pub fn config(&self) -> MounterConfig {
        let mut config = MounterConfig::default();
        if let Some(fs) = &self.fs_endpoint {
            config.filesystem_endpoint = fs.clone();
        }
        if let Some(smb) = &self.smb_endpoint {
            config.smb_endpoint = smb.clone();
        }
        if let Some(suffix) = &self.internal_domain {
            config = config.with_internal_domain_suffix(suffix.clone());
        }
        if let Some(drive) = &self.drive {
            config = config.with_default_drive(drive.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_call_timeout(timeout);
        }
        config
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns the mount error of the failed operation.
    pub async fn execute(self) -> Result<()> {
        let config = self.config();

        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling operation");
                on_signal.cancel();
            }
        });
        let ctx = config.call_context().with_cancellation(cancel);

        match self.backend {
            BackendKind::Helper => {
                let mounter = Mounter::connect(&config).await?;
                run(&mounter, &ctx, self.command).await
            }
            BackendKind::Native => {
                let mounter = Mounter::native(&config)?;
                run(&mounter, &ctx, self.command).await
            }
        }
    }
}

async fn run<B: MountBackend>(
    mounter: &Mounter<B>,
    ctx: &CallContext,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Mount {
            source,
            target,
            username,
            password,
            options,
        } => {
            let mut mount_options = vec![username];
            mount_options.extend(options);
            let request = MountRequest::new(source, target, mount_options, vec![password]);
            mounter.smb_mount(ctx, &request).await?;
            println!("Mounted {} at {}", request.source, request.target);
        }
        Commands::Unmount { target } => {
            mounter.smb_unmount(ctx, &target).await?;
            println!("Unmounted {target}");
        }
        Commands::Check { path, format } => {
            let report = match mounter.query(ctx, &path).await {
                Ok(mp) => CheckReport {
                    path: mp.path,
                    exists: true,
                    is_mount_point: mp.is_mount_point,
                },
                Err(e) if e.is_not_found() => CheckReport {
                    path,
                    exists: false,
                    is_mount_point: false,
                },
                Err(e) => return Err(e.into()),
            };
            print_report(&report, format)?;
        }
        Commands::Mkdir { path } => {
            mounter.make_dir(ctx, &path).await?;
            println!("Created {path}");
        }
        Commands::Link { source, target } => {
            mounter.mount(ctx, &source, &target, "", &[]).await?;
            println!("Linked {target} -> {source}");
        }
    }
    Ok(())
}

fn print_report(report: &CheckReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Table => {
            println!("{:<48} {:<8} MOUNTED", "PATH", "EXISTS");
            println!(
                "{:<48} {:<8} {}",
                report.path,
                yes_no(report.exists),
                yes_no(report.is_mount_point)
            );
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_arguments() {
        let cli = Cli::try_parse_from([
            "smbmount",
            "mount",
            "//smb-server/share",
            "/mnt/smb",
            "--username",
            "user",
            "--password",
            "pass",
            "-o",
            "vers=3.0",
        ])
        .unwrap();
        assert_eq!(cli.backend, BackendKind::Helper);
        match cli.command {
            Commands::Mount {
                source,
                target,
                username,
                password,
                options,
            } => {
                assert_eq!(source, "//smb-server/share");
                assert_eq!(target, "/mnt/smb");
                assert_eq!(username, "user");
                assert_eq!(password, "pass");
                assert_eq!(options, vec!["vers=3.0".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_feed_config() {
        let cli = Cli::try_parse_from([
            "smbmount",
            "check",
            "/mnt/smb",
            "--format",
            "json",
            "--backend",
            "native",
            "--fs-endpoint",
            "/tmp/fs.sock",
            "--drive",
            "d:",
            "--timeout",
            "15",
        ])
        .unwrap();
        assert_eq!(cli.backend, BackendKind::Native);

        let config = cli.config();
        assert_eq!(config.filesystem_endpoint, PathBuf::from("/tmp/fs.sock"));
        assert_eq!(config.default_drive, "d:");
        assert_eq!(config.call_timeout, Some(Duration::from_secs(15)));
        assert!(matches!(
            cli.command,
            Commands::Check {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("abc").is_err());
        assert_eq!(parse_seconds("3"), Ok(Duration::from_secs(3)));
    }
}
