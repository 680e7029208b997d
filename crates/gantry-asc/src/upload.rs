//! Upload slot reservations and part transfer
//!
//! Reserving a screenshot or preview returns an ordered list of upload
//! operations against pre-signed URLs; each operation carries the byte range
//! of the source file it expects and the exact headers to send.

use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::client::AscClient;
use crate::error::{AscError, Result};

/// A reserved remote asset slot together with its upload instructions
#[derive(Debug, Clone)]
pub struct UploadReservation {
    /// Remote identifier of the reserved asset
    pub id: String,
    /// Ordered part descriptors; executed in the order given
    pub operations: Vec<UploadOperation>,
}

/// One part transfer the platform expects
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOperation {
    /// HTTP method (usually PUT)
    pub method: String,
    /// Pre-signed destination URL
    pub url: String,
    /// Byte offset into the source file
    pub offset: Option<u64>,
    /// Number of bytes this part covers
    pub length: Option<u64>,
    /// Headers the destination requires verbatim
    #[serde(default)]
    pub request_headers: Vec<UploadHeader>,
}

/// Header name/value pair for an upload operation
#[derive(Debug, Clone, Deserialize)]
pub struct UploadHeader {
    pub name: String,
    pub value: String,
}

impl AscClient {
    /// Execute one upload operation against its pre-signed URL.
    ///
    /// These requests bypass JWT auth entirely; the URL and headers from the
    /// reservation are the whole contract.
    pub async fn upload_part(&self, operation: &UploadOperation, body: Vec<u8>) -> Result<()> {
        let method = Method::from_bytes(operation.method.as_bytes()).map_err(|_| {
            AscError::ConfigurationError(format!("bad upload method: {}", operation.method))
        })?;

        debug!(
            method = %method,
            url = %operation.url,
            bytes = body.len(),
            "uploading part"
        );

        let mut request = self.http().request(method, &operation.url);
        for header in &operation.request_headers {
            request = request.header(&header.name, &header.value);
        }

        let response = request.body(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AscError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_operation_decoding() {
        let json = r#"{
            "method": "PUT",
            "url": "https://upload.example/part1",
            "offset": 0,
            "length": 1024,
            "requestHeaders": [
                {"name": "Content-Type", "value": "image/png"}
            ]
        }"#;

        let op: UploadOperation = serde_json::from_str(json).unwrap();
        assert_eq!(op.method, "PUT");
        assert_eq!(op.offset, Some(0));
        assert_eq!(op.length, Some(1024));
        assert_eq!(op.request_headers.len(), 1);
        assert_eq!(op.request_headers[0].name, "Content-Type");
    }

    #[test]
    fn test_upload_operation_missing_headers() {
        let json = r#"{"method": "PUT", "url": "https://upload.example/p"}"#;
        let op: UploadOperation = serde_json::from_str(json).unwrap();
        assert!(op.request_headers.is_empty());
        assert!(op.offset.is_none());
    }
}
