//! Google Drive API client for listing and exporting Google Docs.

use std::path::Path;

use futures::TryStreamExt;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::auth::Authenticator;
use crate::error::{GdocError, Result};
use crate::formats::ExportFormat;
use crate::models::{ApiErrorResponse, Document, FileListResponse};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Google Docs mime type.
const GOOGLE_DOC_MIME_TYPE: &str = "application/vnd.google-apps.document";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, description, modifiedTime, createdTime)";

const PAGE_SIZE: &str = "100";

/// Client for listing and exporting Google Docs.
pub struct DriveClient {
    base_url: String,
    auth: Authenticator,
    http: Client,
}

impl DriveClient {
    /// Create a new DriveClient against the public Drive API.
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Create a new DriveClient against a custom API base URL.
    pub fn with_base_url(auth: Authenticator, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            http: Client::new(),
        }
    }

    /// List all non-trashed Google Docs, following pagination.
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let token = self.auth.get_access_token().await?;
        let query = format!("mimeType='{}' and trashed=false", GOOGLE_DOC_MIME_TYPE);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut request = self
                .http
                .get(format!("{}/files", self.base_url))
                .bearer_auth(&token)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", LIST_FIELDS),
                    ("pageSize", PAGE_SIZE),
                ]);

            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = check_status(request.send().await?).await?;
            let list_response: FileListResponse = response.json().await?;
            pages += 1;
            debug!(page = pages, files = list_response.files.len(), "listed page");
            documents.extend(list_response.files);

            match list_response.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Export a document in the given format and write it to `destination`.
    ///
    /// Parent directories are created as needed and an existing file is
    /// overwritten. Returns the number of bytes written.
    pub async fn export_document<P: AsRef<Path>>(
        &self,
        document_id: &str,
        format: &ExportFormat,
        destination: P,
    ) -> Result<u64> {
        let token = self.auth.get_access_token().await?;
        let destination = destination.as_ref();

        debug!(document_id, mime_type = format.mime_type, "exporting document");
        let response = self
            .http
            .get(format!("{}/files/{}/export", self.base_url, document_id))
            .bearer_auth(&token)
            .query(&[("mimeType", format.mime_type)])
            .send()
            .await?;
        let response = check_status(response).await?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Stream to file
        let mut file = File::create(destination).await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);
        let bytes_written = tokio::io::copy(&mut reader, &mut file).await?;

        file.flush().await?;

        Ok(bytes_written)
    }
}

/// Turn a non-success response into an `ApiError`.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(GdocError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(GdocError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}

#[cfg(test)]
mod tests {
    // Tests are in tests/drive_client_test.rs
}
