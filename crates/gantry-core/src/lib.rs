//! Core library for Gantry store publishing
//!
//! Declared configuration (types, loading, validation), the run context, and
//! the stage pipeline executor. The reconciliation engine that stages drive
//! lives in `gantry-sync`.

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;

pub use context::{Context, SkipFlags, Target};
pub use error::{ConfigError, GantryError, PipelineError, Result};
pub use pipeline::{Pipeline, PipelineReport, Stage, StageError, StageResult, StageStatus};
