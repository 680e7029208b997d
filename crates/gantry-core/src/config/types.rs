//! Declared configuration types
//!
//! The nested structure a run declares: apps, their store listing
//! localizations, binary assets, beta-testing configuration, and review
//! details. Collections are keyed by each entity's natural key (locale,
//! display type, group name, tester email) so the reconcilers can match
//! declared entries against remote state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root of the declared configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name, used only for logging
    pub project_name: String,
    /// Apps to publish, keyed by a short local name
    pub apps: BTreeMap<String, AppConfig>,
}

/// Declared state for one app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bundle identifier on App Store Connect
    pub bundle_id: String,
    /// Primary locale, e.g. "en-US"
    pub primary_locale: Option<String>,
    /// Store listing localizations, keyed by locale
    pub localizations: BTreeMap<String, Localization>,
    /// App review contact and demo account details
    pub review_details: Option<ReviewDetails>,
    /// Beta-testing configuration
    pub testflight: TestflightConfig,
}

/// One declared localization. Natural key: the locale it sits under.
///
/// Name, subtitle and privacy text live on the app info record; the rest on
/// the version record. Both are published from this one declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Localization {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub privacy_policy_text: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub whats_new: Option<String>,
    pub promotional_text: Option<String>,
    pub marketing_url: Option<String>,
    pub support_url: Option<String>,
    /// Screenshot files, keyed by screenshot display type
    /// (e.g. "APP_IPHONE_67")
    pub screenshot_sets: BTreeMap<String, Vec<ScreenshotFile>>,
    /// Preview videos, keyed by preview type (e.g. "IPHONE_67")
    pub preview_sets: BTreeMap<String, Vec<PreviewFile>>,
}

/// A declared screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotFile {
    /// Path to the image file; the file's content checksum is its identity
    pub path: PathBuf,
}

/// A declared preview video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewFile {
    /// Path to the video file
    pub path: PathBuf,
    /// Poster frame time code, e.g. "00:00:05:00"
    pub frame_time_code: Option<String>,
}

impl Default for PreviewFile {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            frame_time_code: None,
        }
    }
}

/// App review contact details and demo account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewDetails {
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub demo_account: Option<DemoAccount>,
    pub notes: Option<String>,
}

/// Demo account handed to the review team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoAccount {
    pub name: String,
    pub password: String,
    pub required: bool,
}

/// Beta-testing configuration for one app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestflightConfig {
    /// Beta groups. Natural key: name.
    pub beta_groups: Vec<BetaGroupConfig>,
    /// App-level testers assigned into existing groups. Natural key: email.
    pub beta_testers: Vec<BetaTesterConfig>,
}

/// One declared beta group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BetaGroupConfig {
    /// Group name; the natural key
    pub name: String,
    /// Whether a public invite link is enabled
    pub public_link_enabled: bool,
    /// Cap on public link signups
    pub public_link_limit: Option<u32>,
    /// Whether testers can send feedback from the app
    pub feedback_enabled: bool,
    /// Testers owned by this group. Natural key: email.
    pub testers: Vec<BetaTesterConfig>,
}

impl Default for BetaGroupConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            public_link_enabled: false,
            public_link_limit: None,
            feedback_enabled: true,
            testers: Vec::new(),
        }
    }
}

/// One declared beta tester
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BetaTesterConfig {
    /// Email address; the natural key
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// For app-level testers: names of declared groups to join
    pub groups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses() {
        let yaml = r#"
project_name: demo
apps:
  main:
    bundle_id: com.example.demo
    localizations:
      en-US:
        name: Demo
        description: A demo app.
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project_name, "demo");
        let app = &config.apps["main"];
        assert_eq!(app.bundle_id, "com.example.demo");
        assert_eq!(
            app.localizations["en-US"].name.as_deref(),
            Some("Demo")
        );
        assert!(app.testflight.beta_groups.is_empty());
    }

    #[test]
    fn test_testflight_config_parses() {
        let yaml = r#"
bundle_id: com.example.demo
testflight:
  beta_groups:
    - name: External
      public_link_enabled: true
      public_link_limit: 100
      testers:
        - email: a@example.com
          first_name: Ada
  beta_testers:
    - email: b@example.com
      groups: [External]
"#;
        let app: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let group = &app.testflight.beta_groups[0];
        assert_eq!(group.name, "External");
        assert!(group.public_link_enabled);
        assert!(group.feedback_enabled);
        assert_eq!(group.testers[0].email, "a@example.com");
        assert_eq!(app.testflight.beta_testers[0].groups, vec!["External"]);
    }

    #[test]
    fn test_screenshot_sets_parse() {
        let yaml = r#"
description: hello
screenshot_sets:
  APP_IPHONE_67:
    - path: shots/one.png
    - path: shots/two.png
preview_sets:
  IPHONE_67:
    - path: previews/demo.mov
      frame_time_code: "00:00:05:00"
"#;
        let loc: Localization = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(loc.screenshot_sets["APP_IPHONE_67"].len(), 2);
        assert_eq!(
            loc.preview_sets["IPHONE_67"][0].frame_time_code.as_deref(),
            Some("00:00:05:00")
        );
    }
}
