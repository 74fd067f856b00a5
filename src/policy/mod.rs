//! Access policy for the announcements board and the employee directory.
//!
//! Every function here is a pure function of the signed-in [`User`] and the
//! announcement or category in question. Handlers call the `authorize_*`
//! wrappers before touching the backend, so a denied action never produces
//! a network request.

use std::collections::BTreeSet;

use crate::{
    domain::{Announcement, Category, Role, User, POST_GENERAL, POST_TECH},
    error::{AppError, Result},
};

const OPS_ROLES: &[Role] = &[Role::Admin, Role::Diretoria, Role::Coordenador, Role::Supervisor];
const STRATEGY_ROLES: &[Role] = &[Role::Admin, Role::Diretoria, Role::Coordenador];
const MANAGEMENT_ROLES: &[Role] = &[Role::Admin, Role::Diretoria, Role::Coordenador];
const SECTOR_AUTHOR_ROLES: &[Role] = &[Role::Supervisor, Role::Coordenador];

/// Whether `user` may publish an announcement in `category`.
pub fn can_author(user: &User, category: &Category) -> bool {
    match category {
        Category::General => user.role == Role::Admin || user.has_permission(POST_GENERAL),
        Category::Tech => user.role == Role::Admin || user.has_permission(POST_TECH),
        Category::OpsMgmt => user.is_role(OPS_ROLES),
        Category::Sector => {
            user.is_role(SECTOR_AUTHOR_ROLES) || can_author(user, &Category::General)
        }
        Category::StratMgmt | Category::Unknown(_) => false,
    }
}

/// Departments `user` may target with a SECTOR announcement.
///
/// GENERAL authors reach the whole organisation; everyone else is limited
/// to their own departments.
pub fn authorable_departments(user: &User, all_departments: &[String]) -> BTreeSet<String> {
    if can_author(user, &Category::General) {
        all_departments.iter().cloned().collect()
    } else {
        user.departments.clone()
    }
}

/// Management rights: audit log access and archive toggling.
pub fn can_manage(user: &User) -> bool {
    user.is_role(MANAGEMENT_ROLES)
        || user.has_permission(POST_GENERAL)
        || user.has_permission(POST_TECH)
}

pub fn can_acknowledge(_user: &User, ann: &Announcement) -> bool {
    !ann.is_archived && !ann.has_acknowledged
}

/// Whether the announcement belongs in this user's feed at all.
pub fn can_view(user: &User, ann: &Announcement) -> bool {
    match &ann.category {
        Category::General | Category::Tech => true,
        Category::OpsMgmt => user.is_role(OPS_ROLES),
        Category::StratMgmt => user.is_role(STRATEGY_ROLES),
        Category::Sector => ann
            .target_dept
            .as_ref()
            .map(|dept| user.departments.contains(dept))
            .unwrap_or(false),
        Category::Unknown(_) => false,
    }
}

/// Profile edits are synchronised into the directory, so only admins.
pub fn can_edit_employee(user: &User) -> bool {
    user.role == Role::Admin
}

/// Flips the archive flag. Acknowledgement state is carried over as is.
pub fn toggle_archive(user: &User, ann: Announcement) -> Result<Announcement> {
    authorize_manage(user)?;
    let archived = !ann.is_archived;
    Ok(ann.with_archived(archived))
}

fn deny(user: &User, action: &str, reason: &str) -> AppError {
    tracing::debug!(username = %user.username, role = %user.role, action, "policy denied");
    AppError::Forbidden(reason.to_string())
}

pub fn authorize_author(user: &User, category: &Category) -> Result<()> {
    if can_author(user, category) {
        Ok(())
    } else {
        Err(deny(
            user,
            "author",
            &format!("You are not allowed to post in the {} category", category),
        ))
    }
}

pub fn authorize_target(user: &User, department: &str, all_departments: &[String]) -> Result<()> {
    if authorable_departments(user, all_departments).contains(department) {
        Ok(())
    } else {
        Err(deny(
            user,
            "target",
            &format!("You are not allowed to post to the {} department", department),
        ))
    }
}

pub fn authorize_manage(user: &User) -> Result<()> {
    if can_manage(user) {
        Ok(())
    } else {
        Err(deny(user, "manage", "Only management can view audit logs or archive announcements"))
    }
}

pub fn authorize_acknowledge(user: &User, ann: &Announcement) -> Result<()> {
    if ann.is_archived {
        return Err(deny(user, "acknowledge", "Archived announcements cannot be acknowledged"));
    }
    Ok(())
}

pub fn authorize_edit_employee(user: &User) -> Result<()> {
    if can_edit_employee(user) {
        Ok(())
    } else {
        Err(deny(user, "edit_employee", "Only administrators can edit employee profiles"))
    }
}

/// Per-user capability summary the frontend uses to show or hide controls.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Capabilities {
    pub can_manage: bool,
    pub can_edit_employees: bool,
    pub authorable_categories: Vec<Category>,
}

impl Capabilities {
    pub fn for_user(user: &User) -> Self {
        Self {
            can_manage: can_manage(user),
            can_edit_employees: can_edit_employee(user),
            authorable_categories: Category::AUTHORABLE
                .iter()
                .filter(|c| can_author(user, c))
                .cloned()
                .collect(),
        }
    }
}
