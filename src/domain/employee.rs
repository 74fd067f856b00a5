use serde::{Deserialize, Serialize};
use validator::Validate;

/// Row of the employee directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub depts: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl EmployeeProfile {
    /// Badge initials: "rildon.pereira" -> "RP", otherwise the first two letters.
    pub fn initials(&self) -> String {
        initials_for(&self.username)
    }
}

pub fn initials_for(username: &str) -> String {
    let mut parts = username.split('.').filter(|p| !p.is_empty());
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
        (Some(only), None) => only.chars().take(2).collect::<String>().to_uppercase(),
        _ => "UU".to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    All,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::All => "all",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub status: EmployeeStatus,
}

/// Partial profile edit. Absent fields are left alone by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployeeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120))]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120))]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depts: Option<Vec<String>>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.department.is_none()
            && self.depts.is_none()
    }

    /// Directory groups and profile fields are stored upper-cased.
    pub fn normalized(self) -> Self {
        let upper = |s: String| s.trim().to_uppercase();
        Self {
            title: self.title.map(upper),
            location: self.location.map(upper),
            department: self.department.map(upper),
            depts: self.depts.map(|depts| {
                let mut out: Vec<String> = Vec::with_capacity(depts.len());
                for dept in depts.into_iter().map(upper).filter(|d| !d.is_empty()) {
                    if !out.contains(&dept) {
                        out.push(dept);
                    }
                }
                out
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials() {
        assert_eq!(initials_for("rildon.pereira"), "RP");
        assert_eq!(initials_for("admin"), "AD");
        assert_eq!(initials_for(""), "UU");
    }

    #[test]
    fn test_update_normalization() {
        let update = EmployeeUpdate {
            title: Some(" advogado pleno ".into()),
            depts: Some(vec!["ti".into(), "TI".into(), " ".into(), "rh".into()]),
            ..Default::default()
        }
        .normalized();

        assert_eq!(update.title.as_deref(), Some("ADVOGADO PLENO"));
        assert_eq!(update.depts, Some(vec!["TI".to_string(), "RH".to_string()]));
        assert!(!update.is_empty());
        assert!(EmployeeUpdate::default().is_empty());
    }

    #[test]
    fn test_status_query_defaults_to_active() {
        let query: EmployeeQuery = serde_urlencoded::from_str("search=ana").unwrap();
        assert_eq!(query.status, EmployeeStatus::Active);
        assert_eq!(query.search.as_deref(), Some("ana"));
    }
}
