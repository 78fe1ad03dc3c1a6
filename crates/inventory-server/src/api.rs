use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use inventory_store::{InventoryRecord, PhotoUpload, RecordId};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::service::{InventoryService, RegisterRequest, UpdateRequest};

#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<InventoryService>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/inventory", get(list_inventory))
        .route(
            "/inventory/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/inventory/:id/photo", get(get_photo).put(replace_photo))
        .route("/search", post(search))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
    id: RecordId,
}

#[derive(Deserialize)]
struct SearchRequest {
    id: String,
    #[serde(default)]
    has_photo: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<InventoryRecord>), ServerError> {
    let mut multipart = multipart?;
    let mut req = RegisterRequest::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "inventory_name" | "name" => req.name = Some(read_text(field).await?),
            "description" => req.description = Some(read_text(field).await?),
            "photo" => req.photo = read_upload(field).await?,
            _ => {}
        }
    }

    let record = state.inventory.register(req).await?;
    info!(id = %record.id, has_photo = record.has_photo(), "Inventory item registered via API");

    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_inventory(State(state): State<AppState>) -> Json<Vec<InventoryRecord>> {
    Json(state.inventory.list().await)
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InventoryRecord>, ServerError> {
    Ok(Json(state.inventory.get(&RecordId::from(id)).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<InventoryRecord>, ServerError> {
    let Json(req) = payload?;
    Ok(Json(state.inventory.update(&RecordId::from(id), req).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let record = state.inventory.delete(&RecordId::from(id)).await?;
    Ok(Json(DeleteResponse {
        deleted: true,
        id: record.id,
    }))
}

async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let photo = state.inventory.photo(&RecordId::from(id)).await?;
    Ok(([(header::CONTENT_TYPE, photo.content_type)], photo.data))
}

async fn replace_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InventoryRecord>, ServerError> {
    let mut multipart = multipart?;
    let id = RecordId::from(id);

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("photo") {
            if let Some(upload) = read_upload(field).await? {
                let record = state.inventory.replace_photo(&id, upload).await?;
                return Ok(Json(record));
            }
        }
    }

    Err(ServerError::BadRequest(
        "Missing 'photo' field in multipart form".to_string(),
    ))
}

async fn search(
    State(state): State<AppState>,
    payload: Result<Form<SearchRequest>, FormRejection>,
) -> Result<Json<InventoryRecord>, ServerError> {
    let Form(req) = payload?;
    let must_have_photo = req.has_photo.as_deref().is_some_and(is_truthy);
    Ok(Json(
        state
            .inventory
            .search(&RecordId::from(req.id), must_have_photo)
            .await?,
    ))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, ServerError> {
    multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))
}

async fn read_text(field: Field<'_>) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))
}

/// A file part with no filename and no bytes is a form submitted without a file.
async fn read_upload(field: Field<'_>) -> Result<Option<PhotoUpload>, ServerError> {
    let field_name = field.name().unwrap_or("").to_string();
    let file_name = field.file_name().map(str::to_string);

    let data = field
        .bytes()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;

    if data.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
        return Ok(None);
    }

    Ok(Some(PhotoUpload {
        field_name,
        file_name,
        data,
    }))
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    // host may be a name, so let the resolver pick the address
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "Starting HTTP API server");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "inventory-test-boundary";

    async fn test_app() -> (Router, TempDir) {
        let (service, dir) = crate::service::tests::test_service().await;
        let state = AppState {
            inventory: Arc::new(service),
            config: Arc::new(ServerConfig::default()),
        };
        (build_router(state), dir)
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = test_app().await;
        let (status, body) = send_json(&app, empty("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_plain() {
        let (app, _dir) = test_app().await;
        let req = multipart("POST", "/register", &[Part::Text("inventory_name", "Laptop")]);

        let (status, body) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Laptop");
        assert!(body["description"].is_null());
        assert!(body["photoReference"].is_null());
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_register_without_name() {
        let (app, dir) = test_app().await;
        let req = multipart(
            "POST",
            "/register",
            &[Part::File("photo", "photo.jpg", b"jpeg")],
        );

        let (status, body) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(std::fs::read_dir(dir.path().join("photos")).unwrap().count(), 0);

        let (_, list) = send_json(&app, empty("GET", "/inventory")).await;
        assert_eq!(list, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_register_with_photo_and_fetch() {
        let (app, _dir) = test_app().await;
        let req = multipart(
            "POST",
            "/register",
            &[
                Part::Text("inventory_name", "Camera"),
                Part::Text("description", "Mirrorless"),
                Part::File("photo", "photo.jpg", b"\x00\x01binary\xff"),
            ],
        );
        let (status, record) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(record["photoReference"].is_string());

        let id = record["id"].as_str().unwrap();
        let resp = app
            .clone()
            .oneshot(empty("GET", &format!("/inventory/{id}/photo")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\x00\x01binary\xff");
    }

    #[tokio::test]
    async fn test_empty_file_part_means_no_photo() {
        let (app, _dir) = test_app().await;
        let req = multipart(
            "POST",
            "/register",
            &[Part::Text("inventory_name", "Desk"), Part::File("photo", "", b"")],
        );
        let (status, record) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(record["photoReference"].is_null());
    }

    #[tokio::test]
    async fn test_update_and_get() {
        let (app, _dir) = test_app().await;
        let req = multipart(
            "POST",
            "/register",
            &[Part::Text("inventory_name", "Laptop"), Part::Text("description", "old")],
        );
        let (_, record) = send_json(&app, req).await;
        let id = record["id"].as_str().unwrap().to_string();

        let update = Request::builder()
            .method("PUT")
            .uri(format!("/inventory/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Notebook","description":""}"#))
            .unwrap();
        let (status, updated) = send_json(&app, update).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Notebook");
        assert_eq!(updated["description"], "old");

        let (status, fetched) = send_json(&app, empty("GET", &format!("/inventory/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_replace_photo() {
        let (app, _dir) = test_app().await;
        let req = multipart(
            "POST",
            "/register",
            &[
                Part::Text("inventory_name", "Camera"),
                Part::File("photo", "a.png", b"first"),
            ],
        );
        let (_, record) = send_json(&app, req).await;
        let id = record["id"].as_str().unwrap().to_string();

        let req = multipart(
            "PUT",
            &format!("/inventory/{id}/photo"),
            &[Part::File("photo", "b.jpg", b"second")],
        );
        let (status, updated) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(updated["photoReference"], record["photoReference"]);

        let (status, bytes) = send(&app, empty("GET", &format!("/inventory/{id}/photo"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"second");
    }

    #[tokio::test]
    async fn test_replace_photo_without_file() {
        let (app, _dir) = test_app().await;
        let req = multipart("POST", "/register", &[Part::Text("inventory_name", "Camera")]);
        let (_, record) = send_json(&app, req).await;
        let id = record["id"].as_str().unwrap().to_string();

        let req = multipart("PUT", &format!("/inventory/{id}/photo"), &[Part::Text("other", "x")]);
        let (status, _) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search() {
        let (app, _dir) = test_app().await;
        let req = multipart("POST", "/register", &[Part::Text("inventory_name", "Mouse")]);
        let (_, record) = send_json(&app, req).await;
        let id = record["id"].as_str().unwrap().to_string();

        let form = |body: String| {
            Request::builder()
                .method("POST")
                .uri("/search")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap()
        };

        let (status, found) = send_json(&app, form(format!("id={id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, record);

        let (status, _) = send_json(&app, form(format!("id={id}&has_photo=on"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(&app, form("id=unknown".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete() {
        let (app, dir) = test_app().await;
        let req = multipart(
            "POST",
            "/register",
            &[
                Part::Text("inventory_name", "Camera"),
                Part::File("photo", "photo.jpg", b"img"),
            ],
        );
        let (_, record) = send_json(&app, req).await;
        let id = record["id"].as_str().unwrap().to_string();

        let (status, body) = send_json(&app, empty("DELETE", &format!("/inventory/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);
        assert_eq!(body["id"], id.as_str());
        assert_eq!(std::fs::read_dir(dir.path().join("photos")).unwrap().count(), 0);

        let (status, _) = send_json(&app, empty("GET", &format!("/inventory/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send_json(&app, empty("DELETE", &format!("/inventory/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (app, _dir) = test_app().await;
        let (status, _) = send(&app, empty("PATCH", "/inventory")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_rejections_use_error_body() {
        let (app, _dir) = test_app().await;

        let wrong_type = Request::builder()
            .method("PUT")
            .uri("/inventory/1")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("name=x"))
            .unwrap();
        let (status, body) = send_json(&app, wrong_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let missing_id = Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("has_photo=on"))
            .unwrap();
        let (status, body) = send_json(&app, missing_id).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let not_multipart = Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send_json(&app, not_multipart).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_truthy_flags() {
        for v in ["on", "true", "TRUE", "1", "yes"] {
            assert!(is_truthy(v));
        }
        for v in ["", "off", "false", "0"] {
            assert!(!is_truthy(v));
        }
    }
}
