//! In-memory stand-in for the directory backend, used by unit and
//! integration tests. It applies the same visibility rules as the real
//! service and records every call so tests can assert that a denied action
//! never reached the network.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    backend::{Backend, LoginOutcome},
    domain::*,
    error::{AppError, Result},
    policy,
};

/// Failure injected into every authenticated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    Offline,
    SessionExpired,
}

struct Account {
    password: String,
    user: User,
    active: bool,
}

struct StoredAnnouncement {
    announcement: Announcement,
    acknowledged_by: BTreeSet<String>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    announcements: Vec<StoredAnnouncement>,
    departments: Vec<String>,
    profile_updates: HashMap<String, EmployeeUpdate>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
    failure: Mutex<Option<FakeFailure>>,
    acknowledge_delay: Mutex<Option<Duration>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.set_departments(&["DIRETORIA", "GERAL", "JURÍDICO", "RH", "TI"]);
        backend
    }

    pub fn add_user(&self, user: User, password: &str) {
        let mut state = self.state.lock().unwrap();
        state.accounts.insert(
            user.username.clone(),
            Account { password: password.to_string(), user, active: true },
        );
    }

    /// Registers `user` and returns a token already valid for it.
    pub fn sign_in(&self, user: User) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        let username = user.username.clone();
        self.add_user(user, "secret");
        self.state.lock().unwrap().tokens.insert(token.clone(), username);
        token
    }

    pub fn expire_token(&self, token: &str) {
        self.state.lock().unwrap().tokens.remove(token);
    }

    pub fn set_departments(&self, departments: &[&str]) {
        self.state.lock().unwrap().departments = departments.iter().map(|d| d.to_string()).collect();
    }

    /// Seeds an announcement. Each one is dated a second after the previous.
    pub fn publish(&self, title: &str, category: Category, target_dept: Option<&str>) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let offset = chrono::Duration::seconds(state.announcements.len() as i64);
        let announcement = Announcement {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: format!("{} (conteúdo)", title),
            category,
            target_dept: target_dept.map(str::to_string),
            author_name: "Diretoria".to_string(),
            created_at: Utc::now() + offset,
            attachment: None,
            is_archived: false,
            has_acknowledged: false,
        };
        let id = announcement.id;
        state.announcements.push(StoredAnnouncement {
            announcement,
            acknowledged_by: BTreeSet::new(),
        });
        id
    }

    pub fn fail_with(&self, failure: Option<FakeFailure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn delay_acknowledge(&self, delay: Duration) {
        *self.acknowledge_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == name).count()
    }

    pub fn acknowledged_by(&self, id: Uuid) -> BTreeSet<String> {
        self.state
            .lock()
            .unwrap()
            .announcements
            .iter()
            .find(|s| s.announcement.id == id)
            .map(|s| s.acknowledged_by.clone())
            .unwrap_or_default()
    }

    pub fn last_update(&self, username: &str) -> Option<EmployeeUpdate> {
        self.state.lock().unwrap().profile_updates.get(username).cloned()
    }

    pub fn announcement_count(&self) -> usize {
        self.state.lock().unwrap().announcements.len()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    /// Records the call, applies any injected failure and resolves the token.
    fn caller(&self, call: &str, token: &str) -> Result<User> {
        self.record(call);
        match *self.failure.lock().unwrap() {
            Some(FakeFailure::Offline) => {
                return Err(AppError::Network("connection refused".to_string()))
            }
            Some(FakeFailure::SessionExpired) => return Err(AppError::SessionExpired),
            None => {}
        }

        let state = self.state.lock().unwrap();
        let username = state.tokens.get(token).ok_or(AppError::SessionExpired)?;
        state
            .accounts
            .get(username)
            .map(|a| a.user.clone())
            .ok_or(AppError::SessionExpired)
    }

    fn view_for(stored: &StoredAnnouncement, username: &str) -> Announcement {
        let mut view = stored.announcement.clone();
        view.has_acknowledged = stored.acknowledged_by.contains(username);
        view
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn health_check(&self) -> Result<()> {
        self.record("health_check");
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        self.record("login");
        let mut state = self.state.lock().unwrap();
        let user = match state.accounts.get(username) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AppError::Unauthorized("Invalid credentials".to_string())),
        };

        let token = format!("token-{}", Uuid::new_v4());
        state.tokens.insert(token.clone(), user.username.clone());
        Ok(LoginOutcome { token, user })
    }

    async fn logout(&self, token: &str) -> Result<()> {
        self.record("logout");
        self.state.lock().unwrap().tokens.remove(token);
        Ok(())
    }

    async fn list_announcements(&self, token: &str, query: &AnnouncementQuery) -> Result<Vec<Announcement>> {
        let user = self.caller("list_announcements", token)?;
        let state = self.state.lock().unwrap();
        let mut feed: Vec<Announcement> = state
            .announcements
            .iter()
            .filter(|s| s.announcement.is_archived == query.show_archived)
            .filter(|s| query.category.as_ref().map_or(true, |c| &s.announcement.category == c))
            .filter(|s| policy::can_view(&user, &s.announcement))
            .map(|s| Self::view_for(s, &user.username))
            .collect();
        feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feed)
    }

    async fn create_announcement(&self, token: &str, draft: &NewAnnouncement) -> Result<Option<Announcement>> {
        let user = self.caller("create_announcement", token)?;
        if !policy::can_author(&user, &draft.category) {
            return Err(AppError::Forbidden("Você não tem permissão para postar nesta categoria.".into()));
        }

        let attachment = draft.attachment.as_ref().map(|upload| Attachment {
            name: upload.file_name.clone(),
            url: format!("/uploads/{}", upload.file_name),
        });
        let announcement = Announcement {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            category: draft.category.clone(),
            target_dept: draft.target_dept.clone(),
            author_name: user.name.clone(),
            created_at: Utc::now(),
            attachment,
            is_archived: false,
            has_acknowledged: false,
        };

        self.state.lock().unwrap().announcements.push(StoredAnnouncement {
            announcement: announcement.clone(),
            acknowledged_by: BTreeSet::new(),
        });
        Ok(Some(announcement))
    }

    async fn acknowledge(&self, token: &str, id: Uuid) -> Result<()> {
        let user = self.caller("acknowledge", token)?;
        let delay = *self.acknowledge_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let stored = state
            .announcements
            .iter_mut()
            .find(|s| s.announcement.id == id)
            .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;
        stored.acknowledged_by.insert(user.username);
        Ok(())
    }

    async fn set_archived(&self, token: &str, id: Uuid, archived: bool) -> Result<Announcement> {
        let user = self.caller(if archived { "archive" } else { "unarchive" }, token)?;
        let mut state = self.state.lock().unwrap();
        let stored = state
            .announcements
            .iter_mut()
            .find(|s| s.announcement.id == id)
            .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;
        stored.announcement.is_archived = archived;
        Ok(Self::view_for(stored, &user.username))
    }

    async fn announcement_logs(&self, token: &str, id: Uuid) -> Result<AcknowledgementLog> {
        self.caller("announcement_logs", token)?;
        let state = self.state.lock().unwrap();
        let stored = state
            .announcements
            .iter()
            .find(|s| s.announcement.id == id)
            .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;

        let mut recipients: Vec<LogEntry> = state
            .accounts
            .values()
            .filter(|a| a.active && policy::can_view(&a.user, &stored.announcement))
            .map(|a| {
                let dept = a.user.departments.iter().next().cloned().unwrap_or_default();
                LogEntry::new(a.user.username.clone(), dept)
            })
            .collect();
        recipients.sort();

        Ok(AcknowledgementLog::from_recipients(&recipients, &stored.acknowledged_by))
    }

    async fn list_employees(&self, token: &str, query: &EmployeeQuery) -> Result<Vec<EmployeeSummary>> {
        self.caller("list_employees", token)?;
        let state = self.state.lock().unwrap();
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<EmployeeSummary> = state
            .accounts
            .values()
            .filter(|a| match query.status {
                EmployeeStatus::Active => a.active,
                EmployeeStatus::Inactive => !a.active,
                EmployeeStatus::All => true,
            })
            .filter(|a| {
                needle.as_ref().map_or(true, |n| {
                    a.user.username.to_lowercase().contains(n) || a.user.name.to_lowercase().contains(n)
                })
            })
            .map(|a| EmployeeSummary {
                id: a.user.username.clone(),
                username: a.user.username.clone(),
                full_name: a.user.name.clone(),
                department: a.user.departments.iter().next().cloned(),
                title: a.user.title.clone(),
                is_active: a.active,
                email: a.user.email.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(rows)
    }

    async fn get_employee(&self, token: &str, username: &str) -> Result<EmployeeProfile> {
        self.caller("get_employee", token)?;
        let state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get(username)
            .ok_or_else(|| AppError::NotFound("Colaborador não encontrado".into()))?;

        let user = &account.user;
        Ok(EmployeeProfile {
            username: user.username.clone(),
            full_name: user.name.clone(),
            email: user.email.clone(),
            department: user.departments.iter().next().cloned(),
            depts: user.departments.iter().cloned().collect(),
            title: user.title.clone(),
            location: user.location.clone(),
            role: Some(user.role.to_string()),
            last_login: None,
            created_at: None,
            phone: None,
            photo_url: None,
        })
    }

    async fn update_employee(&self, token: &str, username: &str, update: &EmployeeUpdate) -> Result<()> {
        self.caller("update_employee", token)?;
        let mut state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get_mut(username)
            .ok_or_else(|| AppError::NotFound("Colaborador não encontrado".into()))?;

        if let Some(title) = &update.title {
            account.user.title = Some(title.clone());
        }
        if let Some(location) = &update.location {
            account.user.location = Some(location.clone());
        }
        if let Some(depts) = &update.depts {
            account.user.departments = depts.iter().cloned().collect();
        }
        state.profile_updates.insert(username.to_string(), update.clone());
        Ok(())
    }

    async fn list_departments(&self, token: &str) -> Result<Vec<String>> {
        self.caller("list_departments", token)?;
        Ok(self.state.lock().unwrap().departments.clone())
    }
}
