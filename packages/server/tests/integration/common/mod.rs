
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::Value;
use uuid::Uuid;

use hopekcc_common::StorageConfig;
use hopekcc_server::config::{AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
use hopekcc_server::coordinator::Coordinator;
use hopekcc_server::entity::{file, project};
use hopekcc_server::state::AppState;
use hopekcc_server::utils::jwt::{self, Claims};

pub use memory_store::MemoryBlobStore;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const PROJECTS: &str = "/api/v1/projects";
    pub const HEALTH: &str = "/api/v1/health";

    pub fn project(id: i32) -> String {
        format!("/api/v1/projects/{id}")
    }

    pub fn project_files(id: i32) -> String {
        format!("/api/v1/projects/{id}/files")
    }

    pub fn file(id: &str) -> String {
        format!("/api/v1/files/{id}")
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub blobs: Arc<MemoryBlobStore>,
    /// Same coordinator the server uses, for direct calls.
    pub coordinator: Coordinator,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let database = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            // One connection keeps the in-memory database alive and shared.
            max_connections: 1,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: None,
            max_lifetime_secs: None,
        };
        let db = hopekcc_server::database::init_db(&database)
            .await
            .expect("Failed to initialize test database");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database,
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                issuer: None,
                audience: None,
            },
            storage: StorageConfig {
                max_blob_size: 1024 * 1024,
                timeout_secs: 1,
                ..Default::default()
            },
        };

        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::new(app_config, db.clone(), blobs.clone());
        let coordinator = state.coordinator.clone();

        let app = hopekcc_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            blobs,
            coordinator,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A valid bearer token for `subject`.
    pub fn token_for(&self, subject: &str) -> String {
        let claims = Claims::for_subject(subject, Duration::hours(1)).unwrap();
        jwt::sign(JWT_SECRET.as_bytes(), &claims).unwrap()
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw_with_token(&self, path: &str, body: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Upload a file to a project as multipart `file`.
    pub async fn upload_with_token(
        &self,
        project_id: i32,
        file_name: &str,
        file_bytes: Vec<u8>,
        token: &str,
    ) -> TestResponse {
        let part = Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(&routes::project_files(project_id)))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Send an arbitrary multipart form to `path` with the given method.
    pub async fn send_form(
        &self,
        method: reqwest::Method,
        path: &str,
        form: Form,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// PATCH a file with optional new content and/or name.
    pub async fn update_file_with_token(
        &self,
        file_id: &str,
        file_name: Option<&str>,
        content: Option<Vec<u8>>,
        token: &str,
    ) -> TestResponse {
        let mut form = Form::new();
        if let Some(bytes) = content {
            form = form.part("file", Part::bytes(bytes).file_name("upload"));
        }
        if let Some(name) = file_name {
            form = form.text("file_name", name.to_string());
        }
        self.send_form(reqwest::Method::PATCH, &routes::file(file_id), form, token)
            .await
    }

    /// Create a project via the API and return its `id`.
    pub async fn create_project(&self, token: &str, name: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::PROJECTS,
                &serde_json::json!({
                    "name": name,
                    "description": "A test project",
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_project failed: {}", res.text);
        res.id()
    }

    /// Upload a file via the API and return the created file body.
    pub async fn create_file(
        &self,
        token: &str,
        project_id: i32,
        file_name: &str,
        content: &[u8],
    ) -> Value {
        let res = self
            .upload_with_token(project_id, file_name, content.to_vec(), token)
            .await;
        assert_eq!(res.status, 201, "create_file failed: {}", res.text);
        res.body
    }

    pub async fn project_row(&self, id: i32) -> Option<project::Model> {
        project::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .expect("DB query failed")
    }

    pub async fn file_row(&self, id: &str) -> Option<file::Model> {
        let id = Uuid::parse_str(id).expect("file id should be a UUID");
        file::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .expect("DB query failed")
    }

    pub async fn file_count(&self, project_id: i32) -> u64 {
        file::Entity::find()
            .filter(file::Column::ProjectId.eq(project_id))
            .count(&self.db)
            .await
            .expect("DB query failed")
    }

    pub async fn project_count(&self) -> u64 {
        project::Entity::find()
            .count(&self.db)
            .await
            .expect("DB query failed")
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
