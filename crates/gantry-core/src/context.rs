//! Run context
//!
//! One instance per invocation. The stage executor is the only writer; stages
//! receive `&mut Context` one at a time, and anything a stage fans out to
//! concurrent workers is handed over read-only (the client behind an `Arc`,
//! cloned declared data).

use std::sync::Arc;

use gantry_asc::AscClient;

use crate::config::Config;
use crate::error::{GantryError, Result};

/// Skip flags taken from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFlags {
    /// Skip metadata (localizations, review details)
    pub metadata: bool,
    /// Skip screenshot and preview uploads
    pub assets: bool,
    /// Skip beta review submission
    pub submit: bool,
}

/// A selected app with its resolved remote identifiers.
///
/// Filled in by the resolve stage once per run; later stages read these
/// instead of re-deriving them.
#[derive(Debug, Clone)]
pub struct Target {
    /// Local app name (the key in `config.apps`)
    pub name: String,
    /// Bundle identifier
    pub bundle_id: String,
    /// Remote app id
    pub app_id: String,
    /// Remote id of the editable App Store version
    pub version_id: String,
    /// Version string of the editable version
    pub version: String,
}

/// Ambient state visible to every pipeline stage
pub struct Context {
    /// Declared configuration, immutable for the duration of the run
    pub config: Config,
    /// App names selected for this run (empty means all declared apps)
    pub selected_apps: Vec<String>,
    /// Resolved targets; filled by the resolve stage
    pub targets: Vec<Target>,
    /// Bounded concurrency limit for reconciliation fan-out
    pub max_processes: usize,
    /// Skip flags
    pub skip: SkipFlags,
    /// Authenticated client; set by the auth stage
    client: Option<Arc<AscClient>>,
}

impl Context {
    /// Create a context for a run
    pub fn new(config: Config) -> Self {
        Self {
            config,
            selected_apps: Vec::new(),
            targets: Vec::new(),
            max_processes: 1,
            skip: SkipFlags::default(),
            client: None,
        }
    }

    /// Limit reconciliation concurrency
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes.max(1);
        self
    }

    /// Set skip flags
    pub fn with_skip(mut self, skip: SkipFlags) -> Self {
        self.skip = skip;
        self
    }

    /// Restrict the run to the named apps
    pub fn with_selected_apps(mut self, apps: Vec<String>) -> Self {
        self.selected_apps = apps;
        self
    }

    /// Install the authenticated client
    pub fn set_client(&mut self, client: Arc<AscClient>) {
        self.client = Some(client);
    }

    /// The authenticated client; errors if the auth stage has not run
    pub fn client(&self) -> Result<Arc<AscClient>> {
        self.client
            .clone()
            .ok_or_else(|| GantryError::Other("client not initialized".to_string()))
    }

    /// Names of the apps this run publishes, in declaration order
    pub fn app_names(&self) -> Vec<String> {
        if self.selected_apps.is_empty() {
            self.config.apps.keys().cloned().collect()
        } else {
            self.config
                .apps
                .keys()
                .filter(|name| self.selected_apps.contains(name))
                .cloned()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::collections::BTreeMap;

    fn config_with_apps(names: &[&str]) -> Config {
        let mut apps = BTreeMap::new();
        for name in names {
            apps.insert(
                name.to_string(),
                AppConfig {
                    bundle_id: format!("com.example.{name}"),
                    ..Default::default()
                },
            );
        }
        Config {
            project_name: "demo".to_string(),
            apps,
        }
    }

    #[test]
    fn test_app_names_defaults_to_all() {
        let ctx = Context::new(config_with_apps(&["a", "b"]));
        assert_eq!(ctx.app_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_app_names_honors_selection() {
        let ctx = Context::new(config_with_apps(&["a", "b", "c"]))
            .with_selected_apps(vec!["c".to_string(), "a".to_string()]);
        assert_eq!(ctx.app_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_client_unset_errors() {
        let ctx = Context::new(config_with_apps(&["a"]));
        assert!(ctx.client().is_err());
    }

    #[test]
    fn test_max_processes_floor() {
        let ctx = Context::new(config_with_apps(&["a"])).with_max_processes(0);
        assert_eq!(ctx.max_processes, 1);
    }
}
