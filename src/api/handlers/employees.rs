use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::{
    api::{middleware::auth::CurrentSession, state::AppState},
    domain::{EmployeeProfile, EmployeeQuery, EmployeeSummary, EmployeeUpdate},
    error::Result,
    service::ProfileEditor,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Query(query): Query<EmployeeQuery>,
) -> Result<Json<Vec<EmployeeSummary>>> {
    let employees = state.service_context.employee_service.list(&session, &query).await?;
    Ok(Json(employees))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(username): Path<String>,
) -> Result<Json<EmployeeProfile>> {
    let profile = state.service_context.employee_service.get(&session, &username).await?;
    Ok(Json(profile))
}

pub async fn editor(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(username): Path<String>,
) -> Result<Json<ProfileEditor>> {
    let editor = state
        .service_context
        .employee_service
        .profile_with_departments(&session, &username)
        .await?;
    Ok(Json(editor))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(username): Path<String>,
    Json(update): Json<EmployeeUpdate>,
) -> Result<Json<EmployeeProfile>> {
    let profile = state
        .service_context
        .employee_service
        .update(&session, &username, update)
        .await?;
    Ok(Json(profile))
}

pub async fn departments(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<String>>> {
    let departments = state.service_context.employee_service.departments(&session).await?;
    Ok(Json(departments))
}
