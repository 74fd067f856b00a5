use axum::{
    extract::{multipart::Field, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentSession, state::AppState},
    domain::{AcknowledgementLog, Announcement, AnnouncementQuery, AttachmentUpload, Category, NewAnnouncement},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub target_dept: Option<String>,
}

impl From<CreateAnnouncementRequest> for NewAnnouncement {
    fn from(req: CreateAnnouncementRequest) -> Self {
        NewAnnouncement {
            title: req.title,
            content: req.content,
            category: req.category,
            target_dept: req.target_dept.filter(|d| !d.trim().is_empty()),
            attachment: None,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Query(query): Query<AnnouncementQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let feed = state
        .service_context
        .announcement_service
        .list(&session, &query)
        .await?;
    Ok(Json(feed))
}

/// JSON for plain announcements, multipart when a file is attached.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    request: Request,
) -> Result<Response> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let draft = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_multipart_draft(multipart).await?
    } else {
        let Json(req) = Json::<CreateAnnouncementRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        NewAnnouncement::from(req)
    };

    let created = state
        .service_context
        .announcement_service
        .create(&session, draft)
        .await?;

    let response = match created {
        Some(announcement) => (StatusCode::CREATED, Json(announcement)).into_response(),
        None => (
            StatusCode::CREATED,
            Json(json!({ "message": "Announcement published" })),
        )
            .into_response(),
    };
    Ok(response)
}

async fn read_multipart_draft(mut multipart: Multipart) -> Result<NewAnnouncement> {
    let mut title = String::new();
    let mut content = String::new();
    let mut category = String::new();
    let mut target_dept: Option<String> = None;
    let mut attachment: Option<AttachmentUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => title = field_text(field).await?,
            "content" => content = field_text(field).await?,
            "category" => category = field_text(field).await?,
            "target_dept" => {
                let value = field_text(field).await?;
                if !value.trim().is_empty() {
                    target_dept = Some(value);
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !file_name.is_empty() {
                    attachment = Some(AttachmentUpload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
        }
    }

    Ok(NewAnnouncement {
        title,
        content,
        category: Category::from(category),
        target_dept,
        attachment,
    })
}

async fn field_text(field: Field<'_>) -> Result<String> {
    field.text().await.map_err(|e| AppError::BadRequest(e.body_text()))
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>> {
    let announcement = state
        .service_context
        .announcement_service
        .acknowledge(&session, id)
        .await?;
    Ok(Json(announcement))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>> {
    let announcement = state
        .service_context
        .announcement_service
        .set_archived(&session, id, true)
        .await?;
    Ok(Json(announcement))
}

pub async fn unarchive(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>> {
    let announcement = state
        .service_context
        .announcement_service
        .set_archived(&session, id, false)
        .await?;
    Ok(Json(announcement))
}

pub async fn toggle_archive(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>> {
    let announcement = state
        .service_context
        .announcement_service
        .toggle_archive(&session, id)
        .await?;
    Ok(Json(announcement))
}

pub async fn logs(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<AcknowledgementLog>> {
    let log = state
        .service_context
        .announcement_service
        .logs(&session, id)
        .await?;
    Ok(Json(log))
}
