//! App Store Connect API client for Gantry
//!
//! A thin, typed collaborator over the App Store Connect REST API: JWT
//! authentication, list/create/update/delete calls per entity kind, and the
//! reserve/transfer mechanics for binary asset uploads. All reconciliation
//! decisions live in `gantry-sync`; this crate only talks to the platform.

pub mod client;
pub mod credentials;
pub mod error;
pub mod resources;
pub mod upload;

pub use client::AscClient;
pub use credentials::Credentials;
pub use error::{AscError, Result};
pub use resources::*;
pub use upload::{UploadHeader, UploadOperation, UploadReservation};
