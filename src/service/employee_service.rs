use std::sync::Arc;

use futures_util::future::try_join;
use serde::Serialize;
use validator::Validate;

use crate::{
    auth::Session,
    backend::Backend,
    domain::*,
    error::{AppError, Result},
    policy,
};

/// What the profile editor needs in one response.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileEditor {
    pub profile: EmployeeProfile,
    pub initials: String,
    pub departments: Vec<String>,
    pub can_edit: bool,
}

pub struct EmployeeService {
    backend: Arc<dyn Backend>,
    fallback_departments: Vec<String>,
}

impl EmployeeService {
    pub fn new(backend: Arc<dyn Backend>, fallback_departments: Vec<String>) -> Self {
        Self { backend, fallback_departments }
    }

    pub async fn list(&self, session: &Session, query: &EmployeeQuery) -> Result<Vec<EmployeeSummary>> {
        self.backend.list_employees(&session.token, query).await
    }

    pub async fn get(&self, session: &Session, username: &str) -> Result<EmployeeProfile> {
        self.backend.get_employee(&session.token, username).await
    }

    /// Profile and department list, fetched concurrently.
    pub async fn profile_with_departments(&self, session: &Session, username: &str) -> Result<ProfileEditor> {
        let (profile, departments) =
            try_join(self.get(session, username), self.departments(session)).await?;

        Ok(ProfileEditor {
            initials: profile.initials(),
            profile,
            departments,
            can_edit: policy::can_edit_employee(&session.user),
        })
    }

    /// Writes profile fields through to the directory and returns the
    /// refreshed profile.
    pub async fn update(
        &self,
        session: &Session,
        username: &str,
        update: EmployeeUpdate,
    ) -> Result<EmployeeProfile> {
        policy::authorize_edit_employee(&session.user)?;
        update.validate()?;

        let update = update.normalized();
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }

        self.backend.update_employee(&session.token, username, &update).await?;
        tracing::info!(
            editor = %session.user.username,
            employee = %username,
            "employee profile synchronised"
        );

        self.get(session, username).await
    }

    pub async fn departments(&self, session: &Session) -> Result<Vec<String>> {
        let departments = self.backend.list_departments(&session.token).await?;
        if departments.is_empty() {
            tracing::debug!("directory returned no departments, using fallback list");
            return Ok(self.fallback_departments.clone());
        }
        Ok(departments)
    }
}
