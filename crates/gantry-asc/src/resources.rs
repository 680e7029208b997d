//! Typed App Store Connect resource calls
//!
//! One method per List/Create/Update/Delete operation the publishers need.
//! Responses are decoded through function-local structs; only the flattened
//! resource types at the bottom of this file are exposed to callers.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::AscClient;
use crate::error::{AscError, Result};
use crate::upload::UploadReservation;

/// App Store version states in which metadata can still be edited.
const EDITABLE_STATES: [&str; 3] = [
    "PREPARE_FOR_SUBMISSION",
    "DEVELOPER_REJECTED",
    "REJECTED",
];

impl AscClient {
    // -------------------------------------------------------------------------
    // Apps and versions
    // -------------------------------------------------------------------------

    /// Look up an app by bundle identifier
    pub async fn get_app(&self, bundle_id: &str) -> Result<App> {
        #[derive(Deserialize)]
        struct AppsResponse {
            data: Vec<AppData>,
        }

        #[derive(Deserialize)]
        struct AppData {
            id: String,
            attributes: AppAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct AppAttributes {
            bundle_id: String,
            name: Option<String>,
        }

        let endpoint = format!("/apps?filter[bundleId]={}", bundle_id);
        let response: AppsResponse = self.api_request(Method::GET, &endpoint, None).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|app| App {
                id: app.id,
                bundle_id: app.attributes.bundle_id,
                name: app.attributes.name.unwrap_or_default(),
            })
            .ok_or_else(|| AscError::AppNotFound(bundle_id.to_string()))
    }

    /// Get the editable (draft) App Store version for an app
    pub async fn get_editable_version(&self, app_id: &str) -> Result<AppStoreVersion> {
        #[derive(Deserialize)]
        struct VersionsResponse {
            data: Vec<VersionData>,
        }

        #[derive(Deserialize)]
        struct VersionData {
            id: String,
            attributes: VersionAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct VersionAttributes {
            version_string: Option<String>,
            app_store_state: String,
        }

        let endpoint = format!(
            "/apps/{}/appStoreVersions?filter[platform]=IOS",
            app_id
        );
        let response: VersionsResponse = self.api_request(Method::GET, &endpoint, None).await?;

        response
            .data
            .into_iter()
            .find(|v| EDITABLE_STATES.contains(&v.attributes.app_store_state.as_str()))
            .map(|v| AppStoreVersion {
                id: v.id,
                version_string: v.attributes.version_string.unwrap_or_default(),
                state: v.attributes.app_store_state,
            })
            .ok_or_else(|| AscError::NoEditableVersion(app_id.to_string()))
    }

    // -------------------------------------------------------------------------
    // Version localizations
    // -------------------------------------------------------------------------

    /// List localizations attached to an App Store version
    pub async fn list_version_localizations(
        &self,
        version_id: &str,
    ) -> Result<Vec<VersionLocalization>> {
        #[derive(Deserialize)]
        struct LocalizationsResponse {
            data: Vec<LocalizationData>,
        }

        #[derive(Deserialize)]
        struct LocalizationData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            locale: String,
            description: Option<String>,
            keywords: Option<String>,
            whats_new: Option<String>,
            promotional_text: Option<String>,
            marketing_url: Option<String>,
            support_url: Option<String>,
        }

        let endpoint = format!(
            "/appStoreVersions/{}/appStoreVersionLocalizations",
            version_id
        );
        let response: LocalizationsResponse =
            self.api_request(Method::GET, &endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|l| VersionLocalization {
                id: l.id,
                locale: l.attributes.locale,
                attributes: VersionLocalizationAttributes {
                    description: l.attributes.description,
                    keywords: l.attributes.keywords,
                    whats_new: l.attributes.whats_new,
                    promotional_text: l.attributes.promotional_text,
                    marketing_url: l.attributes.marketing_url,
                    support_url: l.attributes.support_url,
                },
            })
            .collect())
    }

    /// Create a version localization, returning its remote id
    pub async fn create_version_localization(
        &self,
        version_id: &str,
        locale: &str,
        attributes: &VersionLocalizationAttributes,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let mut attrs = serde_json::to_value(attributes)?;
        attrs["locale"] = serde_json::json!(locale);

        let body = serde_json::json!({
            "data": {
                "type": "appStoreVersionLocalizations",
                "attributes": attrs,
                "relationships": {
                    "appStoreVersion": {
                        "data": {
                            "type": "appStoreVersions",
                            "id": version_id
                        }
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/appStoreVersionLocalizations", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// Replace the attributes of a version localization
    pub async fn update_version_localization(
        &self,
        localization_id: &str,
        attributes: &VersionLocalizationAttributes,
    ) -> Result<()> {
        let endpoint = format!("/appStoreVersionLocalizations/{}", localization_id);

        let body = serde_json::json!({
            "data": {
                "type": "appStoreVersionLocalizations",
                "id": localization_id,
                "attributes": attributes
            }
        });

        self.api_request_no_content(Method::PATCH, &endpoint, Some(body))
            .await
    }

    // -------------------------------------------------------------------------
    // App info localizations (name, subtitle, privacy text)
    // -------------------------------------------------------------------------

    /// Get the primary app info record id for an app
    pub async fn get_app_info_id(&self, app_id: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct AppInfosResponse {
            data: Vec<AppInfoData>,
        }

        #[derive(Deserialize)]
        struct AppInfoData {
            id: String,
        }

        let endpoint = format!("/apps/{}/appInfos", app_id);
        let response: AppInfosResponse = self.api_request(Method::GET, &endpoint, None).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|info| info.id)
            .ok_or_else(|| AscError::AppNotFound(format!("no app info for app {}", app_id)))
    }

    /// List app info localizations
    pub async fn list_app_info_localizations(
        &self,
        app_info_id: &str,
    ) -> Result<Vec<AppInfoLocalization>> {
        #[derive(Deserialize)]
        struct LocalizationsResponse {
            data: Vec<LocalizationData>,
        }

        #[derive(Deserialize)]
        struct LocalizationData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            locale: String,
            name: Option<String>,
            subtitle: Option<String>,
            privacy_policy_text: Option<String>,
        }

        let endpoint = format!("/appInfos/{}/appInfoLocalizations", app_info_id);
        let response: LocalizationsResponse =
            self.api_request(Method::GET, &endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|l| AppInfoLocalization {
                id: l.id,
                locale: l.attributes.locale,
                attributes: AppInfoLocalizationAttributes {
                    name: l.attributes.name,
                    subtitle: l.attributes.subtitle,
                    privacy_policy_text: l.attributes.privacy_policy_text,
                },
            })
            .collect())
    }

    /// Create an app info localization
    pub async fn create_app_info_localization(
        &self,
        app_info_id: &str,
        locale: &str,
        attributes: &AppInfoLocalizationAttributes,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let mut attrs = serde_json::to_value(attributes)?;
        attrs["locale"] = serde_json::json!(locale);

        let body = serde_json::json!({
            "data": {
                "type": "appInfoLocalizations",
                "attributes": attrs,
                "relationships": {
                    "appInfo": {
                        "data": {
                            "type": "appInfos",
                            "id": app_info_id
                        }
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/appInfoLocalizations", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// Replace the attributes of an app info localization
    pub async fn update_app_info_localization(
        &self,
        localization_id: &str,
        attributes: &AppInfoLocalizationAttributes,
    ) -> Result<()> {
        let endpoint = format!("/appInfoLocalizations/{}", localization_id);

        let body = serde_json::json!({
            "data": {
                "type": "appInfoLocalizations",
                "id": localization_id,
                "attributes": attributes
            }
        });

        self.api_request_no_content(Method::PATCH, &endpoint, Some(body))
            .await
    }

    // -------------------------------------------------------------------------
    // Beta groups
    // -------------------------------------------------------------------------

    /// List beta groups for an app
    pub async fn list_beta_groups(&self, app_id: &str) -> Result<Vec<BetaGroup>> {
        #[derive(Deserialize)]
        struct GroupsResponse {
            data: Vec<GroupData>,
        }

        #[derive(Deserialize)]
        struct GroupData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            name: String,
            public_link_enabled: Option<bool>,
            public_link_limit: Option<u32>,
            public_link_limit_enabled: Option<bool>,
            feedback_enabled: Option<bool>,
        }

        let endpoint = format!("/betaGroups?filter[app]={}", app_id);
        let response: GroupsResponse = self.api_request(Method::GET, &endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|g| BetaGroup {
                id: g.id,
                name: g.attributes.name,
                public_link_enabled: g.attributes.public_link_enabled.unwrap_or(false),
                public_link_limit: g.attributes.public_link_limit,
                public_link_limit_enabled: g.attributes.public_link_limit_enabled.unwrap_or(false),
                feedback_enabled: g.attributes.feedback_enabled.unwrap_or(true),
            })
            .collect())
    }

    /// Create a beta group, returning its remote id
    pub async fn create_beta_group(
        &self,
        app_id: &str,
        name: &str,
        attributes: &BetaGroupAttributes,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let mut attrs = serde_json::to_value(attributes)?;
        attrs["name"] = serde_json::json!(name);

        let body = serde_json::json!({
            "data": {
                "type": "betaGroups",
                "attributes": attrs,
                "relationships": {
                    "app": {
                        "data": {
                            "type": "apps",
                            "id": app_id
                        }
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/betaGroups", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// Replace the attributes of a beta group
    pub async fn update_beta_group(
        &self,
        group_id: &str,
        attributes: &BetaGroupAttributes,
    ) -> Result<()> {
        let endpoint = format!("/betaGroups/{}", group_id);

        let body = serde_json::json!({
            "data": {
                "type": "betaGroups",
                "id": group_id,
                "attributes": attributes
            }
        });

        self.api_request_no_content(Method::PATCH, &endpoint, Some(body))
            .await
    }

    // -------------------------------------------------------------------------
    // Beta testers
    // -------------------------------------------------------------------------

    /// List beta testers, scoped to an app or to a single group
    pub async fn list_beta_testers(&self, scope: TesterScope<'_>) -> Result<Vec<BetaTester>> {
        #[derive(Deserialize)]
        struct TestersResponse {
            data: Vec<TesterData>,
        }

        #[derive(Deserialize)]
        struct TesterData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            email: Option<String>,
            first_name: Option<String>,
            last_name: Option<String>,
        }

        let endpoint = match scope {
            TesterScope::App(app_id) => format!("/betaTesters?filter[apps]={}", app_id),
            TesterScope::Group(group_id) => {
                format!("/betaTesters?filter[betaGroups]={}", group_id)
            }
        };

        let response: TestersResponse = self.api_request(Method::GET, &endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|t| BetaTester {
                id: t.id,
                email: t.attributes.email.unwrap_or_default(),
                first_name: t.attributes.first_name,
                last_name: t.attributes.last_name,
            })
            .collect())
    }

    /// Invite a beta tester into one or more groups
    pub async fn invite_beta_tester(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        group_ids: &[String],
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let groups: Vec<_> = group_ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "type": "betaGroups",
                    "id": id
                })
            })
            .collect();

        let mut attributes = serde_json::json!({
            "email": email
        });
        if let Some(name) = first_name {
            attributes["firstName"] = serde_json::json!(name);
        }
        if let Some(name) = last_name {
            attributes["lastName"] = serde_json::json!(name);
        }

        let body = serde_json::json!({
            "data": {
                "type": "betaTesters",
                "attributes": attributes,
                "relationships": {
                    "betaGroups": {
                        "data": groups
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/betaTesters", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// Add an existing tester to groups
    pub async fn add_tester_to_groups(
        &self,
        tester_id: &str,
        group_ids: &[String],
    ) -> Result<()> {
        let groups: Vec<_> = group_ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "type": "betaGroups",
                    "id": id
                })
            })
            .collect();

        let body = serde_json::json!({
            "data": groups
        });

        let endpoint = format!("/betaTesters/{}/relationships/betaGroups", tester_id);
        self.api_request_no_content(Method::POST, &endpoint, Some(body))
            .await
    }

    // -------------------------------------------------------------------------
    // Screenshot sets and screenshots
    // -------------------------------------------------------------------------

    /// List screenshot sets attached to a version localization
    pub async fn list_screenshot_sets(
        &self,
        localization_id: &str,
    ) -> Result<Vec<ScreenshotSet>> {
        #[derive(Deserialize)]
        struct SetsResponse {
            data: Vec<SetData>,
        }

        #[derive(Deserialize)]
        struct SetData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            screenshot_display_type: String,
        }

        let endpoint = format!(
            "/appStoreVersionLocalizations/{}/appScreenshotSets",
            localization_id
        );
        let response: SetsResponse = self.api_request(Method::GET, &endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|s| ScreenshotSet {
                id: s.id,
                display_type: s.attributes.screenshot_display_type,
            })
            .collect())
    }

    /// Create a screenshot set for a display type
    pub async fn create_screenshot_set(
        &self,
        localization_id: &str,
        display_type: &str,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let body = serde_json::json!({
            "data": {
                "type": "appScreenshotSets",
                "attributes": {
                    "screenshotDisplayType": display_type
                },
                "relationships": {
                    "appStoreVersionLocalization": {
                        "data": {
                            "type": "appStoreVersionLocalizations",
                            "id": localization_id
                        }
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/appScreenshotSets", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// List screenshots in a set, with their stored source checksums
    pub async fn list_screenshots(&self, set_id: &str) -> Result<Vec<RemoteAsset>> {
        self.list_assets(&format!("/appScreenshotSets/{}/appScreenshots", set_id))
            .await
    }

    /// Delete a screenshot
    pub async fn delete_screenshot(&self, screenshot_id: &str) -> Result<()> {
        let endpoint = format!("/appScreenshots/{}", screenshot_id);
        self.api_request_no_content(Method::DELETE, &endpoint, None)
            .await
    }

    /// Reserve an upload slot for a screenshot
    pub async fn reserve_screenshot(
        &self,
        set_id: &str,
        file_name: &str,
        file_size: u64,
    ) -> Result<UploadReservation> {
        self.reserve_asset(
            "appScreenshots",
            "appScreenshotSet",
            "appScreenshotSets",
            set_id,
            file_name,
            file_size,
        )
        .await
    }

    /// Commit an uploaded screenshot so the remote side can verify it
    pub async fn commit_screenshot(&self, screenshot_id: &str, checksum: &str) -> Result<()> {
        let endpoint = format!("/appScreenshots/{}", screenshot_id);

        let body = serde_json::json!({
            "data": {
                "type": "appScreenshots",
                "id": screenshot_id,
                "attributes": {
                    "uploaded": true,
                    "sourceFileChecksum": checksum
                }
            }
        });

        self.api_request_no_content(Method::PATCH, &endpoint, Some(body))
            .await
    }

    // -------------------------------------------------------------------------
    // Preview sets and previews
    // -------------------------------------------------------------------------

    /// List preview sets attached to a version localization
    pub async fn list_preview_sets(&self, localization_id: &str) -> Result<Vec<PreviewSet>> {
        #[derive(Deserialize)]
        struct SetsResponse {
            data: Vec<SetData>,
        }

        #[derive(Deserialize)]
        struct SetData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            preview_type: String,
        }

        let endpoint = format!(
            "/appStoreVersionLocalizations/{}/appPreviewSets",
            localization_id
        );
        let response: SetsResponse = self.api_request(Method::GET, &endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|s| PreviewSet {
                id: s.id,
                preview_type: s.attributes.preview_type,
            })
            .collect())
    }

    /// Create a preview set for a preview type
    pub async fn create_preview_set(
        &self,
        localization_id: &str,
        preview_type: &str,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let body = serde_json::json!({
            "data": {
                "type": "appPreviewSets",
                "attributes": {
                    "previewType": preview_type
                },
                "relationships": {
                    "appStoreVersionLocalization": {
                        "data": {
                            "type": "appStoreVersionLocalizations",
                            "id": localization_id
                        }
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/appPreviewSets", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// List previews in a set, with their stored source checksums
    pub async fn list_previews(&self, set_id: &str) -> Result<Vec<RemoteAsset>> {
        self.list_assets(&format!("/appPreviewSets/{}/appPreviews", set_id))
            .await
    }

    /// Delete a preview
    pub async fn delete_preview(&self, preview_id: &str) -> Result<()> {
        let endpoint = format!("/appPreviews/{}", preview_id);
        self.api_request_no_content(Method::DELETE, &endpoint, None)
            .await
    }

    /// Reserve an upload slot for a preview
    pub async fn reserve_preview(
        &self,
        set_id: &str,
        file_name: &str,
        file_size: u64,
    ) -> Result<UploadReservation> {
        self.reserve_asset(
            "appPreviews",
            "appPreviewSet",
            "appPreviewSets",
            set_id,
            file_name,
            file_size,
        )
        .await
    }

    /// Commit an uploaded preview, optionally setting the poster frame
    pub async fn commit_preview(
        &self,
        preview_id: &str,
        checksum: &str,
        frame_time_code: Option<&str>,
    ) -> Result<()> {
        let endpoint = format!("/appPreviews/{}", preview_id);

        let mut attributes = serde_json::json!({
            "uploaded": true,
            "sourceFileChecksum": checksum
        });
        if let Some(time_code) = frame_time_code {
            attributes["previewFrameTimeCode"] = serde_json::json!(time_code);
        }

        let body = serde_json::json!({
            "data": {
                "type": "appPreviews",
                "id": preview_id,
                "attributes": attributes
            }
        });

        self.api_request_no_content(Method::PATCH, &endpoint, Some(body))
            .await
    }

    /// Shared list shape for screenshots and previews.
    async fn list_assets(&self, endpoint: &str) -> Result<Vec<RemoteAsset>> {
        #[derive(Deserialize)]
        struct AssetsResponse {
            data: Vec<AssetData>,
        }

        #[derive(Deserialize)]
        struct AssetData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            file_name: Option<String>,
            source_file_checksum: Option<String>,
        }

        let response: AssetsResponse = self.api_request(Method::GET, endpoint, None).await?;

        Ok(response
            .data
            .into_iter()
            .map(|a| RemoteAsset {
                id: a.id,
                file_name: a.attributes.file_name.unwrap_or_default(),
                source_file_checksum: a.attributes.source_file_checksum,
            })
            .collect())
    }

    /// Shared reservation shape for screenshots and previews.
    async fn reserve_asset(
        &self,
        resource_type: &str,
        relationship: &str,
        parent_type: &str,
        set_id: &str,
        file_name: &str,
        file_size: u64,
    ) -> Result<UploadReservation> {
        #[derive(Deserialize)]
        struct ReserveResponse {
            data: ReserveData,
        }

        #[derive(Deserialize)]
        struct ReserveData {
            id: String,
            attributes: ReserveAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ReserveAttributes {
            upload_operations: Option<Vec<crate::upload::UploadOperation>>,
        }

        let body = serde_json::json!({
            "data": {
                "type": resource_type,
                "attributes": {
                    "fileName": file_name,
                    "fileSize": file_size
                },
                "relationships": {
                    (relationship): {
                        "data": {
                            "type": parent_type,
                            "id": set_id
                        }
                    }
                }
            }
        });

        let endpoint = format!("/{}", resource_type);
        let response: ReserveResponse = self
            .api_request(Method::POST, &endpoint, Some(body))
            .await?;

        debug!(
            id = %response.data.id,
            file_name,
            "reserved upload slot"
        );

        Ok(UploadReservation {
            id: response.data.id,
            operations: response.data.attributes.upload_operations.unwrap_or_default(),
        })
    }

    // -------------------------------------------------------------------------
    // Review details
    // -------------------------------------------------------------------------

    /// Get the review detail record for a version, if one exists
    pub async fn get_review_detail(&self, version_id: &str) -> Result<Option<ReviewDetail>> {
        #[derive(Deserialize)]
        struct DetailResponse {
            data: Option<DetailData>,
        }

        #[derive(Deserialize)]
        struct DetailData {
            id: String,
        }

        let endpoint = format!("/appStoreVersions/{}/appStoreReviewDetail", version_id);
        let response: DetailResponse = match self.api_request(Method::GET, &endpoint, None).await {
            Ok(r) => r,
            // ASC answers 404 when no review detail has been created yet
            Err(AscError::ApiError { status: 404, .. }) => DetailResponse { data: None },
            Err(e) => return Err(e),
        };

        Ok(response.data.map(|d| ReviewDetail { id: d.id }))
    }

    /// Create the review detail record for a version
    pub async fn create_review_detail(
        &self,
        version_id: &str,
        attributes: &ReviewDetailAttributes,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }

        #[derive(Deserialize)]
        struct CreateData {
            id: String,
        }

        let body = serde_json::json!({
            "data": {
                "type": "appStoreReviewDetails",
                "attributes": attributes,
                "relationships": {
                    "appStoreVersion": {
                        "data": {
                            "type": "appStoreVersions",
                            "id": version_id
                        }
                    }
                }
            }
        });

        let response: CreateResponse = self
            .api_request(Method::POST, "/appStoreReviewDetails", Some(body))
            .await?;
        Ok(response.data.id)
    }

    /// Replace the review detail record
    pub async fn update_review_detail(
        &self,
        detail_id: &str,
        attributes: &ReviewDetailAttributes,
    ) -> Result<()> {
        let endpoint = format!("/appStoreReviewDetails/{}", detail_id);

        let body = serde_json::json!({
            "data": {
                "type": "appStoreReviewDetails",
                "id": detail_id,
                "attributes": attributes
            }
        });

        self.api_request_no_content(Method::PATCH, &endpoint, Some(body))
            .await
    }

    // -------------------------------------------------------------------------
    // Builds and beta review submission
    // -------------------------------------------------------------------------

    /// Find the most recent processed build for a version string
    pub async fn find_build(&self, app_id: &str, version: &str) -> Result<Build> {
        #[derive(Deserialize)]
        struct BuildsResponse {
            data: Vec<BuildData>,
        }

        #[derive(Deserialize)]
        struct BuildData {
            id: String,
            attributes: RemoteAttributes,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemoteAttributes {
            version: String,
            processing_state: String,
        }

        let endpoint = format!(
            "/builds?filter[app]={}&filter[preReleaseVersion.version]={}&sort=-uploadedDate&limit=5",
            app_id, version
        );
        let response: BuildsResponse = self.api_request(Method::GET, &endpoint, None).await?;

        response
            .data
            .into_iter()
            .find(|b| b.attributes.processing_state == "VALID")
            .map(|b| Build {
                id: b.id,
                version: b.attributes.version,
            })
            .ok_or_else(|| {
                AscError::BuildNotFound(format!("app {} version {}", app_id, version))
            })
    }

    /// Submit a build for beta review (external testing)
    pub async fn submit_for_beta_review(&self, build_id: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct SubmissionResponse {
            data: SubmissionData,
        }

        #[derive(Deserialize)]
        struct SubmissionData {
            id: String,
        }

        let body = serde_json::json!({
            "data": {
                "type": "betaAppReviewSubmissions",
                "relationships": {
                    "build": {
                        "data": {
                            "type": "builds",
                            "id": build_id
                        }
                    }
                }
            }
        });

        let response: SubmissionResponse = self
            .api_request(Method::POST, "/betaAppReviewSubmissions", Some(body))
            .await?;
        Ok(response.data.id)
    }
}

// =============================================================================
// Resource types
// =============================================================================

/// App record
#[derive(Debug, Clone)]
pub struct App {
    /// Opaque remote identifier
    pub id: String,
    /// Bundle identifier
    pub bundle_id: String,
    /// Display name
    pub name: String,
}

/// App Store version record
#[derive(Debug, Clone)]
pub struct AppStoreVersion {
    /// Opaque remote identifier
    pub id: String,
    /// Marketing version string (e.g. "1.4.0")
    pub version_string: String,
    /// App Store state the version is in
    pub state: String,
}

/// Version localization as held by the platform
#[derive(Debug, Clone)]
pub struct VersionLocalization {
    /// Opaque remote identifier
    pub id: String,
    /// Natural key
    pub locale: String,
    /// Server-held attributes
    pub attributes: VersionLocalizationAttributes,
}

/// Writable version localization attributes. Serialized in full: updates are
/// a replace, not a partial patch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionLocalizationAttributes {
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub whats_new: Option<String>,
    pub promotional_text: Option<String>,
    pub marketing_url: Option<String>,
    pub support_url: Option<String>,
}

/// App info localization as held by the platform
#[derive(Debug, Clone)]
pub struct AppInfoLocalization {
    /// Opaque remote identifier
    pub id: String,
    /// Natural key
    pub locale: String,
    /// Server-held attributes
    pub attributes: AppInfoLocalizationAttributes,
}

/// Writable app info localization attributes
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoLocalizationAttributes {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub privacy_policy_text: Option<String>,
}

/// Beta group as held by the platform
#[derive(Debug, Clone)]
pub struct BetaGroup {
    /// Opaque remote identifier
    pub id: String,
    /// Natural key
    pub name: String,
    pub public_link_enabled: bool,
    pub public_link_limit: Option<u32>,
    pub public_link_limit_enabled: bool,
    pub feedback_enabled: bool,
}

/// Writable beta group attributes
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetaGroupAttributes {
    pub public_link_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_link_limit: Option<u32>,
    pub public_link_limit_enabled: bool,
    pub feedback_enabled: bool,
}

/// Beta tester as held by the platform
#[derive(Debug, Clone)]
pub struct BetaTester {
    /// Opaque remote identifier
    pub id: String,
    /// Natural key
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Scope for tester listing
#[derive(Debug, Clone, Copy)]
pub enum TesterScope<'a> {
    /// All testers with access to an app
    App(&'a str),
    /// Testers in one beta group
    Group(&'a str),
}

/// Screenshot set as held by the platform
#[derive(Debug, Clone)]
pub struct ScreenshotSet {
    /// Opaque remote identifier
    pub id: String,
    /// Natural key
    pub display_type: String,
}

/// Preview set as held by the platform
#[derive(Debug, Clone)]
pub struct PreviewSet {
    /// Opaque remote identifier
    pub id: String,
    /// Natural key
    pub preview_type: String,
}

/// A screenshot or preview already uploaded to the platform
#[derive(Debug, Clone)]
pub struct RemoteAsset {
    /// Opaque remote identifier
    pub id: String,
    /// File name the asset was uploaded under
    pub file_name: String,
    /// Checksum recorded at commit time; None while an upload is unfinished
    pub source_file_checksum: Option<String>,
}

/// Review detail record (id only; attributes are write-mostly)
#[derive(Debug, Clone)]
pub struct ReviewDetail {
    /// Opaque remote identifier
    pub id: String,
}

/// Writable review detail attributes
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetailAttributes {
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub demo_account_name: Option<String>,
    pub demo_account_password: Option<String>,
    pub demo_account_required: Option<bool>,
    pub notes: Option<String>,
}

/// Processed build record
#[derive(Debug, Clone)]
pub struct Build {
    /// Opaque remote identifier
    pub id: String,
    /// Build number
    pub version: String,
}
