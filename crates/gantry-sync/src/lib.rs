//! Reconciliation engine for Gantry
//!
//! Declared state from `gantry-core` is pushed to App Store Connect through a
//! generic fetch/match/update-else-create reconciler, a bounded task group for
//! fan-out, and a checksum-gated upload pipeline for binary assets. The
//! pipeline stages that drive a publish run live here too.

pub mod error;
pub mod group;
pub mod reconcile;
pub mod stages;
pub mod store;
pub mod testflight;
pub mod upload;

pub use error::{Result, SyncError};
pub use group::TaskGroup;
pub use reconcile::{reconcile, EntitySync, ReconcileReport};
pub use stages::{
    AssetsStage, AuthStage, MetadataStage, ResolveStage, SubmitStage, TestflightStage,
};
pub use store::{publish_assets, publish_metadata};
pub use testflight::{publish_testflight, submit_beta_review};
pub use upload::{upload, AssetFile, AssetUploader, UploadOutcome};
