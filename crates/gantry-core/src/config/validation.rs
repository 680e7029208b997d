//! Configuration validation
//!
//! Duplicate natural keys are a configuration error caught here, before any
//! reconciliation begins. The reconcilers assume every declared collection is
//! uniquely keyed.

use std::collections::HashSet;

use tracing::warn;

use crate::error::{ConfigError, Result};

use super::types::{AppConfig, Config};

/// Validate a full configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.apps.is_empty() {
        return Err(ConfigError::MissingField("apps".to_string()).into());
    }

    for (name, app) in &config.apps {
        validate_app(name, app)?;
    }

    Ok(())
}

fn validate_app(name: &str, app: &AppConfig) -> Result<()> {
    if app.bundle_id.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: format!("apps.{}.bundle_id", name),
            message: "bundle_id is required".to_string(),
        }
        .into());
    }

    for (locale, loc) in &app.localizations {
        if locale.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("apps.{}.localizations", name),
                message: "empty locale key".to_string(),
            }
            .into());
        }

        for files in loc.screenshot_sets.values() {
            if files.is_empty() {
                warn!(app = name, locale, "screenshot set declared with no files");
            }
        }
    }

    // Group names are declared as a list; duplicates would make matching
    // against remote groups ambiguous.
    let mut group_names = HashSet::new();
    for group in &app.testflight.beta_groups {
        if group.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("apps.{}.testflight.beta_groups", name),
                message: "beta group without a name".to_string(),
            }
            .into());
        }
        if !group_names.insert(group.name.as_str()) {
            return Err(ConfigError::DuplicateKey {
                kind: "beta group",
                key: group.name.clone(),
                app: name.to_string(),
            }
            .into());
        }

        check_tester_emails(name, &group.testers)?;
    }

    check_tester_emails(name, &app.testflight.beta_testers)?;

    // App-level testers may only reference groups declared above.
    for tester in &app.testflight.beta_testers {
        for group in &tester.groups {
            if !group_names.contains(group.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("apps.{}.testflight.beta_testers", name),
                    message: format!(
                        "tester '{}' references undeclared group '{}'",
                        tester.email, group
                    ),
                }
                .into());
            }
        }
    }

    Ok(())
}

fn check_tester_emails(
    app: &str,
    testers: &[super::types::BetaTesterConfig],
) -> Result<()> {
    let mut emails = HashSet::new();
    for tester in testers {
        if tester.email.is_empty() {
            // Not fatal: the reconciler skips empty keys with a warning.
            warn!(app, "beta tester declared without an email");
            continue;
        }
        if !emails.insert(tester.email.as_str()) {
            return Err(ConfigError::DuplicateKey {
                kind: "beta tester",
                key: tester.email.clone(),
                app: app.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
