//! Shared harness: boots the real server on a random port, backed by the
//! in-memory store and a stub media uploader.

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

use sessionkeeper::auth::{AuthService, TokenIssuer};
use sessionkeeper::configuration::JwtSettings;
use sessionkeeper::media::{MediaFile, MediaUploader, UploadError};
use sessionkeeper::startup::run;
use sessionkeeper::store::InMemoryUserStore;

pub struct StubUploader;

#[async_trait]
impl MediaUploader for StubUploader {
    async fn upload(&self, folder: &str, file: MediaFile) -> Result<String, UploadError> {
        if file.file_name.starts_with("broken") {
            return Err(UploadError("stub rejected the file".to_string()));
        }
        Ok(format!("https://media.test/{}/{}", folder, file.file_name))
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn jwt_settings(access_token_expiry: i64, refresh_token_expiry: i64) -> JwtSettings {
    JwtSettings {
        access_token_secret: "integration-access-secret-0123456789".to_string(),
        refresh_token_secret: "integration-refresh-secret-0123456789".to_string(),
        access_token_expiry,
        refresh_token_expiry,
        issuer: "sessionkeeper-tests".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(jwt_settings(900, 864_000)).await
}

/// Every access token this app issues is already expired
pub async fn spawn_app_with_expired_access_tokens() -> TestApp {
    spawn_app_with(jwt_settings(-10, 864_000)).await
}

/// Every refresh token this app issues is already expired
pub async fn spawn_app_with_expired_refresh_tokens() -> TestApp {
    spawn_app_with(jwt_settings(900, -10)).await
}

async fn spawn_app_with(jwt: JwtSettings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let auth = AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(StubUploader),
        TokenIssuer::new(&jwt),
        4,
    );
    let server = run(listener, auth).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

pub fn image_part(file_name: &str) -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .unwrap()
}

pub fn registration_form(username: &str, email: &str) -> Form {
    Form::new()
        .text("fullName", "Alice A")
        .text("email", email.to_string())
        .text("username", username.to_string())
        .text("password", "pw123456")
        .part("avatar", image_part("alice.png"))
}

/// Values of every `Set-Cookie` header for `name`
pub fn set_cookies(response: &Response, name: &str) -> Vec<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    pub async fn register(&self, form: Form) -> Response {
        self.client
            .post(self.url("/register"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register_alice(&self) -> Value {
        let response = self.register(registration_form("alice", "a@x.com")).await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn login(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/login"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Logs alice in and returns `(accessToken, refreshToken)`
    pub async fn login_alice(&self) -> (String, String) {
        let response = self
            .login(&json!({ "username": "alice", "password": "pw123456" }))
            .await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    pub async fn refresh_with_body(&self, refresh_token: &str) -> Response {
        self.client
            .post(self.url("/refresh-token"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
