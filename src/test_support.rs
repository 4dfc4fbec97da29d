//! Local stand-in for the classification endpoint.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use reqwest::Url;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
struct EndpointState {
    status: StatusCode,
    body: String,
    uploads: Arc<Mutex<Vec<Vec<UploadedPart>>>>,
}

pub struct TestEndpoint {
    pub url: Url,
    uploads: Arc<Mutex<Vec<Vec<UploadedPart>>>>,
}

impl TestEndpoint {
    /// Every multipart request received so far, one entry per request
    pub async fn uploads(&self) -> Vec<Vec<UploadedPart>> {
        self.uploads.lock().await.clone()
    }
}

async fn classify(State(state): State<EndpointState>, mut multipart: Multipart) -> (StatusCode, String) {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(UploadedPart {
            name,
            filename,
            content_type,
            bytes,
        });
    }
    state.uploads.lock().await.push(parts);

    (state.status, state.body.clone())
}

/// Serve `POST /classify` answering every request with `status` and `body`
pub async fn spawn_endpoint(status: StatusCode, body: &str) -> TestEndpoint {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let state = EndpointState {
        status,
        body: body.to_string(),
        uploads: uploads.clone(),
    };
    let router = Router::new()
        .route("/classify", post(classify))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test endpoint");
    let addr = listener.local_addr().expect("test endpoint has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    let url = Url::parse(&format!("http://{}/classify", addr)).expect("invalid test endpoint url");
    TestEndpoint { url, uploads }
}

/// URL of a port that was just released, so connecting is refused
pub async fn unreachable_endpoint() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener has no address");
    drop(listener);

    Url::parse(&format!("http://{}/classify", addr)).expect("invalid unreachable url")
}
