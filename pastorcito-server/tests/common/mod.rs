//! Router-level test harness: real middleware stack over an in-memory database

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use pastorcito_server::db::DbService;
use pastorcito_server::{Config, ServerState, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@pastorcito.local";
pub const ADMIN_PASSWORD: &str = "salsa-verde-123";

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn code(&self) -> i64 {
        self.body["code"].as_i64().unwrap_or(-1)
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let mut config = Config::with_overrides("./target/test-data", 0);
        config.admin_email = ADMIN_EMAIL.into();
        config.admin_password = Some(ADMIN_PASSWORD.into());
        config.admin_password_hash = None;
        config.login_delay_ms = 0;
        config.cookie_secure = false;

        let db = DbService::in_memory().await.unwrap();
        let state = ServerState::with_pool(config, db.pool).unwrap();
        Self {
            app: build_app(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.call(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.call(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: &str) -> TestResponse {
        self.call(Method::PUT, uri, Some(body), Some(token)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.call(Method::DELETE, uri, None, Some(token)).await
    }

    /// Log in as the configured admin and return the bearer token
    pub async fn login(&self) -> String {
        let res = self
            .post(
                "/api/auth/login",
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
        res.data()["token"].as_str().unwrap().to_string()
    }

    pub async fn create_product(&self, token: &str, name: &str, price: f64, category: &str) -> i64 {
        let res = self
            .post(
                "/api/products",
                json!({ "name": name, "price": price, "category": category }),
                Some(token),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "create product: {}", res.body);
        res.data()["id"].as_i64().unwrap()
    }

    pub async fn register_client(&self, name: &str, phone: &str) -> TestResponse {
        self.post(
            "/api/clients",
            json!({ "name": name, "phone": phone, "address": "Av. Reforma 100" }),
            None,
        )
        .await
    }
}
