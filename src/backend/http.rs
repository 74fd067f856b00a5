use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, multipart, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::SESSION_COOKIE,
    backend::{Backend, LoginOutcome},
    config::BackendConfig,
    domain::*,
    error::{AppError, Result},
};

/// reqwest client for the backend's REST API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    user: Option<User>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("zerocore/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "backend rejected request");
        Err(error_for_status(status, &body))
    }
}

/// Maps a non-2xx backend reply onto the console's error taxonomy.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> AppError {
    let detail = detail_from_body(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unexpected backend response")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED => AppError::SessionExpired,
        StatusCode::FORBIDDEN => AppError::Forbidden(detail),
        StatusCode::NOT_FOUND => AppError::NotFound(detail),
        StatusCode::BAD_REQUEST => AppError::BadRequest(detail),
        StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(detail),
        other => AppError::Upstream { status: other.as_u16(), detail },
    }
}

/// FastAPI puts the reason in `detail`, either a string or a list of
/// field errors.
fn detail_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

fn session_token_from_headers(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| cookie::Cookie::parse(raw.to_string()).ok())
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health_check(&self) -> Result<()> {
        self.send(self.client.get(self.url("/"))).await?;
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let form = serde_urlencoded::to_string([("username", username), ("password", password)])
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let response = self
            .client
            .post(self.url("/auth/token"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED => AppError::Unauthorized(
                    detail_from_body(&body).unwrap_or_else(|| "Invalid credentials".to_string()),
                ),
                _ => error_for_status(status, &body),
            });
        }

        let cookie_token = session_token_from_headers(response.headers());
        let body: TokenResponse = response.json().await?;

        let user = body.user.ok_or_else(|| AppError::Upstream {
            status: status.as_u16(),
            detail: "Incomplete login response from the server".to_string(),
        })?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .or(cookie_token)
            .ok_or_else(|| AppError::Upstream {
                status: status.as_u16(),
                detail: "Login response carried no session token".to_string(),
            })?;

        Ok(LoginOutcome { token, user })
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let request = self.authed(self.client.post(self.url("/auth/logout")), token);
        self.send(request).await?;
        Ok(())
    }

    async fn list_announcements(&self, token: &str, query: &AnnouncementQuery) -> Result<Vec<Announcement>> {
        let mut params: Vec<(&str, String)> = vec![("show_archived", query.show_archived.to_string())];
        if let Some(category) = &query.category {
            params.push(("category", category.to_string()));
        }

        let request = self.authed(self.client.get(self.url("/announcements/")).query(&params), token);
        Ok(self.send(request).await?.json().await?)
    }

    async fn create_announcement(&self, token: &str, draft: &NewAnnouncement) -> Result<Option<Announcement>> {
        let builder = self.client.post(self.url("/announcements/"));
        let builder = match &draft.attachment {
            None => builder.json(&NewAnnouncementBody::from(draft)),
            Some(upload) => {
                let mut part = multipart::Part::bytes(upload.data.clone())
                    .file_name(upload.file_name.clone());
                if let Some(content_type) = &upload.content_type {
                    part = part.mime_str(content_type).map_err(|_| {
                        AppError::Validation(format!("Invalid attachment content type: {}", content_type))
                    })?;
                }

                let mut form = multipart::Form::new()
                    .text("title", draft.title.clone())
                    .text("content", draft.content.clone())
                    .text("category", draft.category.to_string());
                if let Some(dept) = &draft.target_dept {
                    form = form.text("target_dept", dept.clone());
                }
                builder.multipart(form.part("file", part))
            }
        };

        let body: Value = self.send(self.authed(builder, token)).await?.json().await?;
        Ok(serde_json::from_value(body).ok())
    }

    async fn acknowledge(&self, token: &str, id: Uuid) -> Result<()> {
        let url = self.url(&format!("/announcements/{}/acknowledge", id));
        self.send(self.authed(self.client.post(url), token)).await?;
        Ok(())
    }

    async fn set_archived(&self, token: &str, id: Uuid, archived: bool) -> Result<Announcement> {
        let action = if archived { "archive" } else { "unarchive" };
        let url = self.url(&format!("/announcements/{}/{}", id, action));
        Ok(self.send(self.authed(self.client.post(url), token)).await?.json().await?)
    }

    async fn announcement_logs(&self, token: &str, id: Uuid) -> Result<AcknowledgementLog> {
        let url = self.url(&format!("/announcements/{}/logs", id));
        Ok(self.send(self.authed(self.client.get(url), token)).await?.json().await?)
    }

    async fn list_employees(&self, token: &str, query: &EmployeeQuery) -> Result<Vec<EmployeeSummary>> {
        let mut params: Vec<(&str, &str)> = vec![("status", query.status.as_str())];
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search));
        }

        let request = self.authed(self.client.get(self.url("/employees/")).query(&params), token);
        Ok(self.send(request).await?.json().await?)
    }

    async fn get_employee(&self, token: &str, username: &str) -> Result<EmployeeProfile> {
        let url = self.url(&format!("/employees/{}", urlencoding::encode(username)));
        Ok(self.send(self.authed(self.client.get(url), token)).await?.json().await?)
    }

    async fn update_employee(&self, token: &str, username: &str, update: &EmployeeUpdate) -> Result<()> {
        let url = self.url(&format!("/employees/{}", urlencoding::encode(username)));
        self.send(self.authed(self.client.put(url).json(update), token)).await?;
        Ok(())
    }

    async fn list_departments(&self, token: &str) -> Result<Vec<String>> {
        let request = self.authed(self.client.get(self.url("/auth/departments")), token);
        Ok(self.send(request).await?.json().await?)
    }
}
