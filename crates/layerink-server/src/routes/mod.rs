//! HTTP routes.

mod export;
mod segments;
mod upload;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use layerink_core::api::HealthStatus;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Headroom for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/upload", post(upload::upload_image))
        .route("/api/upload/{id}/info", get(upload::upload_info))
        .route("/api/segments/{id}", get(segments::get_segments))
        .route("/api/segments/{id}/status", get(segments::segmentation_status))
        .route("/api/export", post(export::export_image))
        .route("/api/export/{id}/download", get(export::download_export))
        .route("/uploads/{file}", get(upload::serve_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Service banner
async fn index() -> Json<Value> {
    Json(json!({
        "message": "LayerInk API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check
async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use layerink_core::api::{
        ApiError, ExportRequest, ExportService, HttpClient, SegmentationService, UploadService,
    };
    use layerink_core::layer::Layer;
    use std::io::Cursor;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    struct TestServer {
        base: String,
        client: HttpClient,
        state: Arc<AppState>,
        _dir: TempDir,
    }

    async fn spawn_server(max_file_size: usize) -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            upload_dir: dir.path().join("uploads"),
            processed_dir: dir.path().join("processed"),
            export_dir: dir.path().join("exports"),
            max_file_size,
            ..ServerConfig::default()
        };
        config.ensure_dirs().unwrap();
        let state = Arc::new(AppState::new(config));
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                eprintln!("test server error: {err}");
            }
        });

        let base = format!("http://{}", addr);
        TestServer {
            client: HttpClient::new(&base).unwrap(),
            base,
            state,
            _dir: dir,
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_health_and_banner() {
        let server = spawn_server(1024 * 1024).await;
        assert_eq!(server.client.health().await.unwrap().status, "healthy");

        let banner: Value = reqwest::get(format!("{}/", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(banner["message"], "LayerInk API");
    }

    #[tokio::test]
    async fn test_upload_segment_export_flow() {
        let server = spawn_server(1024 * 1024).await;
        let upload = server.client.upload("cat.png", png(400, 300)).await.unwrap();
        assert_eq!(upload.dimensions.width, 400);
        assert_eq!(upload.url, format!("/uploads/{}.png", upload.image_id));

        let stored = reqwest::get(server.client.resolve(&upload.url)).await.unwrap();
        assert_eq!(stored.headers()["content-type"], "image/png");

        let status: Value = reqwest::get(format!(
            "{}/api/segments/{}/status",
            server.base, upload.image_id
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(status["status"], "processing");

        let segments = server.client.segments(&upload.image_id).await.unwrap();
        assert_eq!(segments.segments.len(), 3);
        assert_eq!(segments.segments[0].name, "Person");
        assert!(server.state.segments_path(&upload.image_id).exists());

        let mut layers = vec![Layer::base_image(upload.url.clone())];
        layers.extend(
            segments
                .segments
                .into_iter()
                .map(|segment| Layer::from_segment(segment, 0.7)),
        );
        layers[2].visible = false;

        let svg = server
            .client
            .export(&ExportRequest {
                image_id: upload.image_id.clone(),
                layers: layers.clone(),
                format: "svg".to_string(),
                filename: None,
            })
            .await
            .unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains("id=\"segment-1\""));
        assert!(!svg.contains("id=\"segment-2\""));
        assert!(svg.contains("id=\"segment-3\""));

        let psd = server
            .client
            .export(&ExportRequest {
                image_id: upload.image_id.clone(),
                layers,
                format: "psd".to_string(),
                filename: None,
            })
            .await
            .unwrap();
        assert_eq!(&psd[..4], b"8BPS");

        let download = reqwest::get(format!(
            "{}/api/export/{}/download",
            server.base, upload.image_id
        ))
        .await
        .unwrap();
        assert!(download.status().is_success());
        let disposition = download.headers()["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"export_"));
        assert_eq!(&download.bytes().await.unwrap()[..4], b"8BPS");
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_extension() {
        let server = spawn_server(1024 * 1024).await;
        let result = server.client.upload("notes.txt", png(4, 4)).await;
        match result {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains(".txt"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_oversize() {
        let server = spawn_server(16).await;
        let result = server.client.upload("big.png", png(64, 64)).await;
        assert!(matches!(result, Err(ApiError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_image() {
        let server = spawn_server(1024 * 1024).await;
        let result = server.client.upload("fake.png", b"not an image".to_vec()).await;
        assert!(matches!(result, Err(ApiError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_unknown_image_is_404() {
        let server = spawn_server(1024 * 1024).await;
        let segments = server.client.segments("missing").await;
        assert!(matches!(segments, Err(ApiError::Status { status: 404, .. })));

        let export = server
            .client
            .export(&ExportRequest {
                image_id: "missing".to_string(),
                layers: Vec::new(),
                format: "svg".to_string(),
                filename: None,
            })
            .await;
        match export {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Original image not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_format() {
        let server = spawn_server(1024 * 1024).await;
        let upload = server.client.upload("cat.png", png(4, 4)).await.unwrap();
        let result = server
            .client
            .export(&ExportRequest {
                image_id: upload.image_id,
                layers: Vec::new(),
                format: "gif".to_string(),
                filename: None,
            })
            .await;
        assert!(matches!(result, Err(ApiError::Status { status: 400, .. })));
    }
}
