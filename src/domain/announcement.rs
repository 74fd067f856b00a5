use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    General,
    Tech,
    OpsMgmt,
    StratMgmt,
    Sector,
    Unknown(String),
}

impl Category {
    pub const AUTHORABLE: [Category; 4] = [
        Category::General,
        Category::Tech,
        Category::OpsMgmt,
        Category::Sector,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::General => "GENERAL",
            Category::Tech => "TECH",
            Category::OpsMgmt => "OPS_MGMT",
            Category::StratMgmt => "STRAT_MGMT",
            Category::Sector => "SECTOR",
            Category::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.trim().to_uppercase().as_str() {
            "GENERAL" => Category::General,
            "TECH" => Category::Tech,
            "OPS_MGMT" => Category::OpsMgmt,
            "STRAT_MGMT" => Category::StratMgmt,
            "SECTOR" => Category::Sector,
            _ => Category::Unknown(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// An announcement as seen by one viewing user.
///
/// `has_acknowledged` is per viewer; `is_archived` alone decides whether
/// the announcement lives in the active feed or the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AnnouncementWire", into = "AnnouncementWire")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub target_dept: Option<String>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub attachment: Option<Attachment>,
    pub is_archived: bool,
    pub has_acknowledged: bool,
}

impl Announcement {
    /// `target_dept` is present exactly when the category is SECTOR.
    pub fn targeting_is_consistent(&self) -> bool {
        (self.category == Category::Sector) == self.target_dept.is_some()
    }

    /// Drops a `target_dept` that a non-SECTOR announcement should not carry.
    pub fn with_consistent_targeting(mut self) -> Self {
        if self.category != Category::Sector {
            self.target_dept = None;
        }
        self
    }

    /// Pending -> Acknowledged. Applying it twice changes nothing.
    pub fn acknowledged(mut self) -> Self {
        self.has_acknowledged = true;
        self
    }

    /// Moves between feed and archive. Acknowledgement state is untouched.
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.is_archived = archived;
        self
    }
}

// Backend shape: attachment as flat columns, naive UTC timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnouncementWire {
    id: Uuid,
    title: String,
    content: String,
    category: Category,
    #[serde(default)]
    target_dept: Option<String>,
    #[serde(default)]
    author_name: String,
    #[serde(deserialize_with = "lenient_utc")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    attachment_name: Option<String>,
    #[serde(default)]
    attachment_url: Option<String>,
    #[serde(default)]
    is_archived: bool,
    #[serde(default)]
    has_acknowledged: bool,
}

impl From<AnnouncementWire> for Announcement {
    fn from(wire: AnnouncementWire) -> Self {
        let attachment = match (wire.attachment_name, wire.attachment_url) {
            (Some(name), Some(url)) => Some(Attachment { name, url }),
            (None, Some(url)) => {
                let name = url.rsplit('/').next().unwrap_or_default().to_string();
                Some(Attachment { name, url })
            }
            _ => None,
        };

        let target_dept = wire.target_dept.filter(|d| !d.trim().is_empty());

        Announcement {
            id: wire.id,
            title: wire.title,
            content: wire.content,
            category: wire.category,
            target_dept,
            author_name: wire.author_name,
            created_at: wire.created_at,
            attachment,
            is_archived: wire.is_archived,
            has_acknowledged: wire.has_acknowledged,
        }
        .with_consistent_targeting()
    }
}

impl From<Announcement> for AnnouncementWire {
    fn from(ann: Announcement) -> Self {
        let (attachment_name, attachment_url) = match ann.attachment {
            Some(a) => (Some(a.name), Some(a.url)),
            None => (None, None),
        };

        Self {
            id: ann.id,
            title: ann.title,
            content: ann.content,
            category: ann.category,
            target_dept: ann.target_dept,
            author_name: ann.author_name,
            created_at: ann.created_at,
            attachment_name,
            attachment_url,
            is_archived: ann.is_archived,
            has_acknowledged: ann.has_acknowledged,
        }
    }
}

/// Accepts RFC 3339 as well as the backend's offset-less UTC timestamps.
fn lenient_utc<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .map_err(serde::de::Error::custom)
}

/// Feed filter sent to the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementQuery {
    pub category: Option<Category>,
    #[serde(default)]
    pub show_archived: bool,
}

/// A file picked in the creation form, already read into memory.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewAnnouncement {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub category: Category,
    pub target_dept: Option<String>,
    pub attachment: Option<AttachmentUpload>,
}

impl NewAnnouncement {
    pub fn new(title: impl Into<String>, content: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category,
            target_dept: None,
            attachment: None,
        }
    }

    pub fn for_department(mut self, department: impl Into<String>) -> Self {
        self.target_dept = Some(department.into());
        self
    }

    /// Field checks plus the SECTOR / `target_dept` pairing.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(AppError::Validation("Title and content are required".to_string()));
        }

        let has_target = self
            .target_dept
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false);

        match (&self.category, has_target) {
            (Category::Sector, false) => Err(AppError::Validation(
                "A target department is required for SECTOR announcements".to_string(),
            )),
            (Category::Sector, true) => Ok(()),
            (other, true) => Err(AppError::Validation(format!(
                "Only SECTOR announcements take a target department (got {})",
                other
            ))),
            (_, false) => Ok(()),
        }
    }
}

/// JSON body for attachment-less creation.
#[derive(Debug, Serialize)]
pub struct NewAnnouncementBody<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub category: &'a str,
    pub target_dept: Option<&'a str>,
}

impl<'a> From<&'a NewAnnouncement> for NewAnnouncementBody<'a> {
    fn from(draft: &'a NewAnnouncement) -> Self {
        Self {
            title: &draft.title,
            content: &draft.content,
            category: draft.category.as_str(),
            target_dept: draft.target_dept.as_deref(),
        }
    }
}
