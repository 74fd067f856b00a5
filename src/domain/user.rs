use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission flag granting GENERAL announcement authorship.
pub const POST_GENERAL: &str = "post_general";
/// Permission flag granting TECH announcement authorship.
pub const POST_TECH: &str = "post_tech";

/// Directory role, resolved by the backend from the user's groups.
///
/// Unknown role strings survive a round trip as `Other` and carry no
/// privileges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Diretoria,
    Coordenador,
    Supervisor,
    Advogado,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Diretoria => "diretoria",
            Role::Coordenador => "coordenador",
            Role::Supervisor => "supervisor",
            Role::Advogado => "advogado",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "diretoria" => Role::Diretoria,
            "coordenador" => Role::Coordenador,
            "supervisor" => Role::Supervisor,
            "advogado" => Role::Advogado,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as reported by the directory backend at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(alias = "full_name", default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(alias = "depts", default)]
    pub departments: BTreeSet<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            name: String::new(),
            email: None,
            role,
            permissions: BTreeSet::new(),
            departments: BTreeSet::new(),
            title: None,
            location: None,
        }
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.insert(permission.to_string());
        self
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.departments.insert(department.to_string());
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn is_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
