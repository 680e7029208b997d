//! Pipeline stages for a publish run
//!
//! Each stage is a thin adapter between the run context and the publishers in
//! this crate. Skips are signalled through the error channel and leave the
//! rest of the pipeline running; real failures abort it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use gantry_asc::{AscClient, Credentials};
use gantry_core::config::AppConfig;
use gantry_core::{Context, GantryError, Stage, StageError, StageResult, Target};

use crate::store::{publish_assets, publish_metadata};
use crate::testflight::{publish_testflight, submit_beta_review};

fn app_config<'a>(ctx: &'a Context, target: &Target) -> Result<&'a AppConfig, StageError> {
    ctx.config.apps.get(&target.name).ok_or_else(|| {
        StageError::failed(GantryError::Other(format!(
            "no configuration for app '{}'",
            target.name
        )))
    })
}

/// Builds the authenticated client from environment credentials
pub struct AuthStage;

#[async_trait]
impl Stage for AuthStage {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn run(&self, ctx: &mut Context, _depth: usize) -> StageResult {
        let credentials = Credentials::from_env().map_err(StageError::failed)?;
        let client = AscClient::new(credentials).map_err(StageError::failed)?;
        ctx.set_client(Arc::new(client));
        debug!("client authenticated");
        Ok(())
    }
}

/// Resolves each selected app to its remote id and editable version
pub struct ResolveStage;

#[async_trait]
impl Stage for ResolveStage {
    fn name(&self) -> &'static str {
        "resolve apps"
    }

    async fn run(&self, ctx: &mut Context, _depth: usize) -> StageResult {
        let names = ctx.app_names();
        if names.is_empty() {
            return Err(StageError::skip("no apps selected"));
        }

        let client = ctx.client().map_err(StageError::failed)?;

        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            let app = ctx.config.apps.get(&name).ok_or_else(|| {
                StageError::failed(GantryError::Other(format!("unknown app '{name}'")))
            })?;

            let remote = client.get_app(&app.bundle_id).await.map_err(StageError::failed)?;
            let version = client
                .get_editable_version(&remote.id)
                .await
                .map_err(StageError::failed)?;

            info!(
                app = %name,
                app_id = %remote.id,
                version = %version.version_string,
                state = %version.state,
                "resolved app"
            );

            targets.push(Target {
                name,
                bundle_id: app.bundle_id.clone(),
                app_id: remote.id,
                version_id: version.id,
                version: version.version_string,
            });
        }

        ctx.targets = targets;
        Ok(())
    }
}

/// Publishes localizations and review details
pub struct MetadataStage;

#[async_trait]
impl Stage for MetadataStage {
    fn name(&self) -> &'static str {
        "publish metadata"
    }

    async fn run(&self, ctx: &mut Context, _depth: usize) -> StageResult {
        if ctx.skip.metadata {
            return Err(StageError::skip("skipped by flag"));
        }
        if ctx.targets.is_empty() {
            return Err(StageError::skip("no resolved apps"));
        }

        let client = ctx.client().map_err(StageError::failed)?;
        for target in &ctx.targets {
            let app = app_config(ctx, target)?;
            publish_metadata(client.clone(), target, app, ctx.max_processes)
                .await
                .map_err(StageError::failed)?;
        }
        Ok(())
    }
}

/// Uploads screenshots and previews
pub struct AssetsStage;

#[async_trait]
impl Stage for AssetsStage {
    fn name(&self) -> &'static str {
        "publish assets"
    }

    async fn run(&self, ctx: &mut Context, _depth: usize) -> StageResult {
        if ctx.skip.assets {
            return Err(StageError::skip("skipped by flag"));
        }
        if ctx.targets.is_empty() {
            return Err(StageError::skip("no resolved apps"));
        }

        let client = ctx.client().map_err(StageError::failed)?;
        for target in &ctx.targets {
            let app = app_config(ctx, target)?;
            publish_assets(client.clone(), target, app, ctx.max_processes)
                .await
                .map_err(StageError::failed)?;
        }
        Ok(())
    }
}

/// Publishes beta groups and tester assignments
pub struct TestflightStage;

#[async_trait]
impl Stage for TestflightStage {
    fn name(&self) -> &'static str {
        "publish testflight"
    }

    async fn run(&self, ctx: &mut Context, _depth: usize) -> StageResult {
        if ctx.targets.is_empty() {
            return Err(StageError::skip("no resolved apps"));
        }

        let declared = ctx.targets.iter().any(|t| {
            ctx.config
                .apps
                .get(&t.name)
                .map(|a| {
                    !a.testflight.beta_groups.is_empty() || !a.testflight.beta_testers.is_empty()
                })
                .unwrap_or(false)
        });
        if !declared {
            return Err(StageError::skip("no testflight configuration declared"));
        }

        let client = ctx.client().map_err(StageError::failed)?;
        for target in &ctx.targets {
            let app = app_config(ctx, target)?;
            if app.testflight.beta_groups.is_empty() && app.testflight.beta_testers.is_empty() {
                continue;
            }
            publish_testflight(client.clone(), target, app, ctx.max_processes)
                .await
                .map_err(StageError::failed)?;
        }
        Ok(())
    }
}

/// Submits the matching build for beta review
pub struct SubmitStage;

#[async_trait]
impl Stage for SubmitStage {
    fn name(&self) -> &'static str {
        "submit for review"
    }

    async fn run(&self, ctx: &mut Context, _depth: usize) -> StageResult {
        if ctx.skip.submit {
            return Err(StageError::skip("skipped by flag"));
        }
        if ctx.targets.is_empty() {
            return Err(StageError::skip("no resolved apps"));
        }

        let client = ctx.client().map_err(StageError::failed)?;
        for target in &ctx.targets {
            submit_beta_review(client.clone(), target).await.map_err(StageError::failed)?;
        }
        Ok(())
    }
}
