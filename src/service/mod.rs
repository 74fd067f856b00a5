pub mod announcement_service;
pub mod employee_service;
pub mod in_flight;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::backend::Backend;
use crate::config::Settings;
use announcement_service::AnnouncementService;
use employee_service::EmployeeService;

pub use employee_service::ProfileEditor;

pub struct ServiceContext {
    pub backend: Arc<dyn Backend>,
    pub auth_service: Arc<AuthService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub employee_service: Arc<EmployeeService>,
}

impl ServiceContext {
    pub fn new(backend: Arc<dyn Backend>, auth_service: Arc<AuthService>, settings: &Settings) -> Self {
        let employee_service = Arc::new(EmployeeService::new(
            backend.clone(),
            settings.backend.fallback_departments.clone(),
        ));
        let announcement_service = Arc::new(AnnouncementService::new(
            backend.clone(),
            employee_service.clone(),
            settings.attachments.clone(),
        ));

        Self {
            backend,
            auth_service,
            announcement_service,
            employee_service,
        }
    }
}
