#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use zerocore::{
    api,
    auth::{AuthService, SESSION_COOKIE},
    backend::fake::FakeBackend,
    config::Settings,
    domain::User,
    service::ServiceContext,
};

pub struct TestApp {
    pub app: Router,
    pub fake: Arc<FakeBackend>,
    pub auth: Arc<AuthService>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok())
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(Settings::default())
}

pub fn spawn_app_with(settings: Settings) -> TestApp {
    let fake = Arc::new(FakeBackend::new());
    let auth = Arc::new(AuthService::new(
        settings.auth.session_duration_minutes,
        settings.auth.secure_cookies,
    ));
    let ctx = Arc::new(ServiceContext::new(fake.clone(), auth.clone(), &settings));
    let app = api::create_app(ctx, Arc::new(settings));

    TestApp { app, fake, auth }
}

impl TestApp {
    /// A user with a live backend token and a console session for it.
    pub async fn signed_in(&self, user: User) -> String {
        let token = self.fake.sign_in(user.clone());
        self.auth.establish(user, &token).await;
        token
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> anyhow::Result<TestResponse> {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<TestResponse> {
        self.send(Method::POST, uri, token, body).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<TestResponse> {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> anyhow::Result<TestResponse> {
        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(TestResponse { status, headers, body })
    }
}
