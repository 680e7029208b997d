//! Check command

use clap::Args;
use console::style;
use tracing::info;

use gantry_core::config::{load_config_from_dir, validate_config};

use crate::cli::Cli;
use crate::exit_codes;

/// Check the configuration file without contacting the platform
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Verify that every declared screenshot and preview file exists
    #[arg(long)]
    pub check_files: bool,
}

impl CheckCommand {
    /// Execute the check command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(check_files = self.check_files, "executing check command");
        let cwd = std::env::current_dir()?;

        let (config, config_path) = load_config_from_dir(&cwd)?;
        if let Err(e) = validate_config(&config) {
            eprintln!("{} {}", style("✗").red().bold(), e);
            std::process::exit(exit_codes::VALIDATION_ERROR);
        }

        let mut missing = Vec::new();
        if self.check_files {
            for (app_name, app) in &config.apps {
                for (locale, localization) in &app.localizations {
                    let files = localization
                        .screenshot_sets
                        .values()
                        .flatten()
                        .map(|f| f.path.clone())
                        .chain(
                            localization
                                .preview_sets
                                .values()
                                .flatten()
                                .map(|f| f.path.clone()),
                        );
                    for path in files {
                        if !path.exists() {
                            missing.push(format!("{app_name}/{locale}: {}", path.display()));
                        }
                    }
                }
            }
        }

        if !missing.is_empty() {
            for entry in &missing {
                eprintln!("{} missing file {entry}", style("✗").red().bold());
            }
            std::process::exit(exit_codes::VALIDATION_ERROR);
        }

        if !cli.quiet {
            println!(
                "{} {} is valid ({} app{})",
                style("✓").green().bold(),
                config_path.display(),
                config.apps.len(),
                if config.apps.len() == 1 { "" } else { "s" }
            );
        }

        Ok(())
    }
}
