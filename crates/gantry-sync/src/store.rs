//! Store listing publishers
//!
//! Reconciler instantiations for version localizations, app info
//! localizations, review details, and the screenshot/preview sets each
//! localization owns. All of them run against the editable App Store version
//! resolved earlier in the run.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use gantry_asc::{
    AppInfoLocalization, AppInfoLocalizationAttributes, AscClient, PreviewSet, ReviewDetail,
    ReviewDetailAttributes, ScreenshotSet, UploadOperation, UploadReservation,
    VersionLocalization, VersionLocalizationAttributes,
};
use gantry_core::config::{AppConfig, Localization, PreviewFile, ReviewDetails, ScreenshotFile};
use gantry_core::Target;

use crate::error::Result;
use crate::reconcile::{reconcile, EntitySync};
use crate::upload::{upload, AssetUploader};

/// Natural key for the singleton review detail record
const REVIEW_DETAIL_KEY: &str = "default";

/// Map a declared localization onto the version record's attribute set.
/// Every field is sent: updates replace, they do not patch.
fn version_attributes(declared: &Localization) -> VersionLocalizationAttributes {
    VersionLocalizationAttributes {
        description: declared.description.clone(),
        keywords: declared.keywords.clone(),
        whats_new: declared.whats_new.clone(),
        promotional_text: declared.promotional_text.clone(),
        marketing_url: declared.marketing_url.clone(),
        support_url: declared.support_url.clone(),
    }
}

/// Map a declared localization onto the app info record's attribute set
fn app_info_attributes(declared: &Localization) -> AppInfoLocalizationAttributes {
    AppInfoLocalizationAttributes {
        name: declared.name.clone(),
        subtitle: declared.subtitle.clone(),
        privacy_policy_text: declared.privacy_policy_text.clone(),
    }
}

/// Map declared review details onto the review detail attribute set
fn review_attributes(declared: &ReviewDetails) -> ReviewDetailAttributes {
    let demo = declared.demo_account.as_ref();
    ReviewDetailAttributes {
        contact_first_name: declared.contact_first_name.clone(),
        contact_last_name: declared.contact_last_name.clone(),
        contact_phone: declared.contact_phone.clone(),
        contact_email: declared.contact_email.clone(),
        demo_account_name: demo.map(|d| d.name.clone()),
        demo_account_password: demo.map(|d| d.password.clone()),
        demo_account_required: demo.map(|d| d.required),
        notes: declared.notes.clone(),
    }
}

// -----------------------------------------------------------------------------
// Version localizations
// -----------------------------------------------------------------------------

struct VersionLocalizationSync {
    client: Arc<AscClient>,
    version_id: String,
}

#[async_trait]
impl EntitySync for VersionLocalizationSync {
    type Declared = Localization;
    type Remote = VersionLocalization;

    fn kind(&self) -> &'static str {
        "version localization"
    }

    fn natural_key(&self, remote: &VersionLocalization) -> String {
        remote.locale.clone()
    }

    async fn fetch(&self) -> Result<Vec<VersionLocalization>> {
        Ok(self
            .client
            .list_version_localizations(&self.version_id)
            .await?)
    }

    async fn update(&self, remote: VersionLocalization, declared: Localization) -> Result<()> {
        self.client
            .update_version_localization(&remote.id, &version_attributes(&declared))
            .await?;
        Ok(())
    }

    async fn create(&self, key: String, declared: Localization) -> Result<()> {
        self.client
            .create_version_localization(&self.version_id, &key, &version_attributes(&declared))
            .await?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// App info localizations
// -----------------------------------------------------------------------------

struct AppInfoLocalizationSync {
    client: Arc<AscClient>,
    app_info_id: String,
}

#[async_trait]
impl EntitySync for AppInfoLocalizationSync {
    type Declared = Localization;
    type Remote = AppInfoLocalization;

    fn kind(&self) -> &'static str {
        "app info localization"
    }

    fn natural_key(&self, remote: &AppInfoLocalization) -> String {
        remote.locale.clone()
    }

    async fn fetch(&self) -> Result<Vec<AppInfoLocalization>> {
        Ok(self
            .client
            .list_app_info_localizations(&self.app_info_id)
            .await?)
    }

    async fn update(&self, remote: AppInfoLocalization, declared: Localization) -> Result<()> {
        self.client
            .update_app_info_localization(&remote.id, &app_info_attributes(&declared))
            .await?;
        Ok(())
    }

    async fn create(&self, key: String, declared: Localization) -> Result<()> {
        self.client
            .create_app_info_localization(&self.app_info_id, &key, &app_info_attributes(&declared))
            .await?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Review details (singleton)
// -----------------------------------------------------------------------------

struct ReviewDetailsSync {
    client: Arc<AscClient>,
    version_id: String,
}

#[async_trait]
impl EntitySync for ReviewDetailsSync {
    type Declared = ReviewDetails;
    type Remote = ReviewDetail;

    fn kind(&self) -> &'static str {
        "review details"
    }

    fn natural_key(&self, _remote: &ReviewDetail) -> String {
        REVIEW_DETAIL_KEY.to_string()
    }

    async fn fetch(&self) -> Result<Vec<ReviewDetail>> {
        Ok(self
            .client
            .get_review_detail(&self.version_id)
            .await?
            .into_iter()
            .collect())
    }

    async fn update(&self, remote: ReviewDetail, declared: ReviewDetails) -> Result<()> {
        self.client
            .update_review_detail(&remote.id, &review_attributes(&declared))
            .await?;
        Ok(())
    }

    async fn create(&self, _key: String, declared: ReviewDetails) -> Result<()> {
        self.client
            .create_review_detail(&self.version_id, &review_attributes(&declared))
            .await?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Screenshot sets
// -----------------------------------------------------------------------------

struct ScreenshotSetSync {
    client: Arc<AscClient>,
    localization_id: String,
}

impl ScreenshotSetSync {
    /// Upload every declared file into the set, in declared order.
    async fn upload_all(&self, set_id: &str, files: &[ScreenshotFile]) -> Result<()> {
        let uploader = ScreenshotUploader {
            client: self.client.clone(),
            set_id: set_id.to_string(),
        };
        for file in files {
            upload(&file.path, &uploader).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EntitySync for ScreenshotSetSync {
    type Declared = Vec<ScreenshotFile>;
    type Remote = ScreenshotSet;

    fn kind(&self) -> &'static str {
        "screenshot set"
    }

    fn natural_key(&self, remote: &ScreenshotSet) -> String {
        remote.display_type.clone()
    }

    async fn fetch(&self) -> Result<Vec<ScreenshotSet>> {
        Ok(self
            .client
            .list_screenshot_sets(&self.localization_id)
            .await?)
    }

    async fn update(&self, remote: ScreenshotSet, declared: Vec<ScreenshotFile>) -> Result<()> {
        self.upload_all(&remote.id, &declared).await
    }

    async fn create(&self, key: String, declared: Vec<ScreenshotFile>) -> Result<()> {
        let set_id = self
            .client
            .create_screenshot_set(&self.localization_id, &key)
            .await?;
        self.upload_all(&set_id, &declared).await
    }
}

/// Upload protocol against one screenshot set
struct ScreenshotUploader {
    client: Arc<AscClient>,
    set_id: String,
}

#[async_trait]
impl AssetUploader for ScreenshotUploader {
    async fn prepare(&self, name: &str, checksum: &str) -> Result<bool> {
        let existing = self.client.list_screenshots(&self.set_id).await?;
        match existing.iter().find(|a| a.file_name == name) {
            Some(asset) if asset.source_file_checksum.as_deref() == Some(checksum) => Ok(false),
            Some(asset) => {
                debug!(name, "screenshot changed, deleting stale remote copy");
                self.client.delete_screenshot(&asset.id).await?;
                Ok(true)
            }
            None => Ok(true),
        }
    }

    async fn create(&self, name: &str, size: u64) -> Result<UploadReservation> {
        Ok(self
            .client
            .reserve_screenshot(&self.set_id, name, size)
            .await?)
    }

    async fn upload_part(&self, operation: &UploadOperation, body: Vec<u8>) -> Result<()> {
        Ok(self.client.upload_part(operation, body).await?)
    }

    async fn commit(&self, id: &str, checksum: &str) -> Result<()> {
        Ok(self.client.commit_screenshot(id, checksum).await?)
    }
}

// -----------------------------------------------------------------------------
// Preview sets
// -----------------------------------------------------------------------------

struct PreviewSetSync {
    client: Arc<AscClient>,
    localization_id: String,
}

impl PreviewSetSync {
    async fn upload_all(&self, set_id: &str, files: &[PreviewFile]) -> Result<()> {
        for file in files {
            let uploader = PreviewUploader {
                client: self.client.clone(),
                set_id: set_id.to_string(),
                frame_time_code: file.frame_time_code.clone(),
            };
            upload(&file.path, &uploader).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EntitySync for PreviewSetSync {
    type Declared = Vec<PreviewFile>;
    type Remote = PreviewSet;

    fn kind(&self) -> &'static str {
        "preview set"
    }

    fn natural_key(&self, remote: &PreviewSet) -> String {
        remote.preview_type.clone()
    }

    async fn fetch(&self) -> Result<Vec<PreviewSet>> {
        Ok(self.client.list_preview_sets(&self.localization_id).await?)
    }

    async fn update(&self, remote: PreviewSet, declared: Vec<PreviewFile>) -> Result<()> {
        self.upload_all(&remote.id, &declared).await
    }

    async fn create(&self, key: String, declared: Vec<PreviewFile>) -> Result<()> {
        let set_id = self
            .client
            .create_preview_set(&self.localization_id, &key)
            .await?;
        self.upload_all(&set_id, &declared).await
    }
}

/// Upload protocol against one preview set; the poster frame is set at commit
struct PreviewUploader {
    client: Arc<AscClient>,
    set_id: String,
    frame_time_code: Option<String>,
}

#[async_trait]
impl AssetUploader for PreviewUploader {
    async fn prepare(&self, name: &str, checksum: &str) -> Result<bool> {
        let existing = self.client.list_previews(&self.set_id).await?;
        match existing.iter().find(|a| a.file_name == name) {
            Some(asset) if asset.source_file_checksum.as_deref() == Some(checksum) => Ok(false),
            Some(asset) => {
                debug!(name, "preview changed, deleting stale remote copy");
                self.client.delete_preview(&asset.id).await?;
                Ok(true)
            }
            None => Ok(true),
        }
    }

    async fn create(&self, name: &str, size: u64) -> Result<UploadReservation> {
        Ok(self.client.reserve_preview(&self.set_id, name, size).await?)
    }

    async fn upload_part(&self, operation: &UploadOperation, body: Vec<u8>) -> Result<()> {
        Ok(self.client.upload_part(operation, body).await?)
    }

    async fn commit(&self, id: &str, checksum: &str) -> Result<()> {
        Ok(self
            .client
            .commit_preview(id, checksum, self.frame_time_code.as_deref())
            .await?)
    }
}

// -----------------------------------------------------------------------------
// Entry points
// -----------------------------------------------------------------------------

/// Publish localizations and review details for one app
pub async fn publish_metadata(
    client: Arc<AscClient>,
    target: &Target,
    app: &AppConfig,
    max_processes: usize,
) -> Result<()> {
    info!(app = %target.name, version = %target.version, "publishing metadata");

    let report = reconcile(
        Arc::new(VersionLocalizationSync {
            client: client.clone(),
            version_id: target.version_id.clone(),
        }),
        &app.localizations,
        max_processes,
    )
    .await?;
    info!(
        app = %target.name,
        created = report.created,
        updated = report.updated,
        "version localizations reconciled"
    );

    let app_info_id = client.get_app_info_id(&target.app_id).await?;
    reconcile(
        Arc::new(AppInfoLocalizationSync {
            client: client.clone(),
            app_info_id,
        }),
        &app.localizations,
        max_processes,
    )
    .await?;

    if let Some(details) = &app.review_details {
        let declared = BTreeMap::from([(REVIEW_DETAIL_KEY.to_string(), details.clone())]);
        // Singleton record: always reconciled serially.
        reconcile(
            Arc::new(ReviewDetailsSync {
                client,
                version_id: target.version_id.clone(),
            }),
            &declared,
            1,
        )
        .await?;
    }

    Ok(())
}

/// Publish screenshot and preview sets for one app.
///
/// Assets hang off version localizations, so each declared locale's sets are
/// reconciled against the remote localization resolved by a fresh listing.
/// A declared locale with no remote localization yet (metadata stage skipped)
/// is left for a later run.
pub async fn publish_assets(
    client: Arc<AscClient>,
    target: &Target,
    app: &AppConfig,
    max_processes: usize,
) -> Result<()> {
    info!(app = %target.name, version = %target.version, "publishing assets");

    let remote_localizations = client.list_version_localizations(&target.version_id).await?;

    for remote in remote_localizations {
        let Some(declared) = app.localizations.get(&remote.locale) else {
            continue;
        };
        if declared.screenshot_sets.is_empty() && declared.preview_sets.is_empty() {
            continue;
        }

        debug!(locale = %remote.locale, "reconciling asset sets");

        reconcile(
            Arc::new(ScreenshotSetSync {
                client: client.clone(),
                localization_id: remote.id.clone(),
            }),
            &declared.screenshot_sets,
            max_processes,
        )
        .await?;

        reconcile(
            Arc::new(PreviewSetSync {
                client: client.clone(),
                localization_id: remote.id.clone(),
            }),
            &declared.preview_sets,
            max_processes,
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::config::DemoAccount;

    #[test]
    fn test_version_attributes_full_replace() {
        let declared = Localization {
            description: Some("desc".to_string()),
            whats_new: Some("fixes".to_string()),
            ..Default::default()
        };

        let attrs = version_attributes(&declared);
        assert_eq!(attrs.description.as_deref(), Some("desc"));
        assert_eq!(attrs.whats_new.as_deref(), Some("fixes"));
        // unset fields are carried as None, replacing remote values
        assert!(attrs.keywords.is_none());
        assert!(attrs.support_url.is_none());
    }

    #[test]
    fn test_app_info_attributes() {
        let declared = Localization {
            name: Some("Demo".to_string()),
            subtitle: Some("Sub".to_string()),
            description: Some("not an app info field".to_string()),
            ..Default::default()
        };

        let attrs = app_info_attributes(&declared);
        assert_eq!(attrs.name.as_deref(), Some("Demo"));
        assert_eq!(attrs.subtitle.as_deref(), Some("Sub"));
        assert!(attrs.privacy_policy_text.is_none());
    }

    #[test]
    fn test_review_attributes_with_demo_account() {
        let declared = ReviewDetails {
            contact_email: Some("rev@example.com".to_string()),
            demo_account: Some(DemoAccount {
                name: "demo".to_string(),
                password: "secret".to_string(),
                required: true,
            }),
            ..Default::default()
        };

        let attrs = review_attributes(&declared);
        assert_eq!(attrs.contact_email.as_deref(), Some("rev@example.com"));
        assert_eq!(attrs.demo_account_name.as_deref(), Some("demo"));
        assert_eq!(attrs.demo_account_required, Some(true));
    }

    #[test]
    fn test_review_attributes_without_demo_account() {
        let attrs = review_attributes(&ReviewDetails::default());
        assert!(attrs.demo_account_name.is_none());
        assert!(attrs.demo_account_required.is_none());
    }
}
