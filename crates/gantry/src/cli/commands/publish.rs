//! Publish command

use std::time::Duration;

use clap::Args;
use console::style;
use tracing::info;

use gantry_core::config::{load_config_from_dir, validate_config};
use gantry_core::{Context, Pipeline, SkipFlags, StageStatus};
use gantry_sync::{
    AssetsStage, AuthStage, MetadataStage, ResolveStage, SubmitStage, TestflightStage,
};

use crate::cli::Cli;

/// Publish the declared listing to App Store Connect
#[derive(Debug, Args)]
pub struct PublishCommand {
    /// App to publish (repeat for several; default: all declared apps)
    #[arg(short, long = "app")]
    pub apps: Vec<String>,

    /// Maximum concurrent platform operations
    #[arg(long, default_value_t = 1)]
    pub max_processes: usize,

    /// Skip metadata (localizations, review details)
    #[arg(long)]
    pub skip_metadata: bool,

    /// Skip screenshot and preview uploads
    #[arg(long)]
    pub skip_assets: bool,

    /// Skip beta review submission
    #[arg(long)]
    pub skip_submit: bool,

    /// Abort the run after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            apps = ?self.apps,
            max_processes = self.max_processes,
            skip_metadata = self.skip_metadata,
            skip_assets = self.skip_assets,
            skip_submit = self.skip_submit,
            "executing publish command"
        );

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (config, config_path) = load_config_from_dir(&cwd)?;
        validate_config(&config)?;

        if !cli.quiet {
            println!(
                "{} Using configuration {}",
                style("•").cyan(),
                style(config_path.display()).dim()
            );
        }

        let mut ctx = Context::new(config)
            .with_selected_apps(self.apps.clone())
            .with_max_processes(self.max_processes)
            .with_skip(SkipFlags {
                metadata: self.skip_metadata,
                assets: self.skip_assets,
                submit: self.skip_submit,
            });

        let pipeline = Pipeline::new()
            .add(AuthStage)
            .add(ResolveStage)
            .add(MetadataStage)
            .add(AssetsStage)
            .add(TestflightStage)
            .add(SubmitStage);

        let report = tokio::select! {
            result = pipeline.run(&mut ctx, 0) => result?,
            _ = tokio::signal::ctrl_c() => {
                anyhow::bail!("cancelled");
            }
            _ = sleep_or_forever(self.timeout) => {
                anyhow::bail!("timed out after {}s", self.timeout.unwrap_or_default());
            }
        };

        if !cli.quiet {
            for (name, status) in &report.stages {
                match status {
                    StageStatus::Completed => {
                        println!("{} {name}", style("✓").green().bold());
                    }
                    StageStatus::Skipped(reason) => {
                        println!("{} {name} ({reason})", style("-").dim());
                    }
                }
            }
            println!("{} Publish complete", style("✓").green().bold());
        }

        Ok(())
    }
}

async fn sleep_or_forever(timeout: Option<u64>) {
    match timeout {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending().await,
    }
}
