//! HTTP client for the LayerInk service.

use super::{
    ApiError, ApiResult, BoxFuture, ErrorBody, ExportRequest, ExportService, HealthStatus,
    SegmentationService, SegmentsResponse, UploadResponse, UploadService,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

/// Talks to the upload, segmentation and export endpoints over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Create a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Resolve a service-relative URL such as `/uploads/x.png`.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.url(url)
        }
    }

    /// Check that the service is up.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let response = self.client.get(self.url("health")).send().await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turn a non-success response into [`ApiError::Status`], reading the
/// service's `{ "error": ... }` body when present.
async fn check(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

impl UploadService for HttpClient {
    fn upload<'a>(&'a self, file_name: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, ApiResult<UploadResponse>> {
        Box::pin(async move {
            log::debug!("Uploading {} ({} bytes)", file_name, bytes.len());
            let part = Part::bytes(bytes).file_name(file_name.to_string());
            let form = Form::new().part("file", part);
            let response = self
                .client
                .post(self.url("api/upload"))
                .multipart(form)
                .send()
                .await?;
            Ok(check(response).await?.json().await?)
        })
    }
}

impl SegmentationService for HttpClient {
    fn segments<'a>(&'a self, image_id: &'a str) -> BoxFuture<'a, ApiResult<SegmentsResponse>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url(&format!("api/segments/{}", image_id)))
                .send()
                .await?;
            Ok(check(response).await?.json().await?)
        })
    }
}

impl ExportService for HttpClient {
    fn export<'a>(&'a self, request: &'a ExportRequest) -> BoxFuture<'a, ApiResult<Vec<u8>>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("api/export"))
                .json(request)
                .send()
                .await?;
            let bytes = check(response).await?.bytes().await?;
            Ok(bytes.to_vec())
        })
    }
}
