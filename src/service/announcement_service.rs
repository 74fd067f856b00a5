use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::Session,
    backend::Backend,
    config::AttachmentConfig,
    domain::*,
    error::{AppError, Result},
    policy,
    service::{employee_service::EmployeeService, in_flight::InFlightGuard},
    web::uploads::validate_upload,
};

pub struct AnnouncementService {
    backend: Arc<dyn Backend>,
    directory: Arc<EmployeeService>,
    attachments: AttachmentConfig,
    in_flight: InFlightGuard,
}

impl AnnouncementService {
    pub fn new(
        backend: Arc<dyn Backend>,
        directory: Arc<EmployeeService>,
        attachments: AttachmentConfig,
    ) -> Self {
        Self {
            backend,
            directory,
            attachments,
            in_flight: InFlightGuard::new(),
        }
    }

    /// The caller's feed, newest first. Anything the backend returns outside
    /// the caller's scope is dropped here.
    pub async fn list(&self, session: &Session, query: &AnnouncementQuery) -> Result<Vec<Announcement>> {
        let feed = self.backend.list_announcements(&session.token, query).await?;
        let received = feed.len();

        let mut visible: Vec<Announcement> = feed
            .into_iter()
            .map(consistent)
            .filter(|a| policy::can_view(&session.user, a))
            .collect();
        if visible.len() != received {
            tracing::warn!(
                username = %session.user.username,
                dropped = received - visible.len(),
                "backend feed contained announcements outside the user's scope"
            );
        }

        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }

    /// Publishes a draft. Everything that can be checked locally is checked
    /// before the request goes out.
    pub async fn create(&self, session: &Session, draft: NewAnnouncement) -> Result<Option<Announcement>> {
        let user = &session.user;
        draft.check()?;
        policy::authorize_author(user, &draft.category)?;

        if let Some(upload) = &draft.attachment {
            validate_upload(upload, &self.attachments)?;
        }

        if let Some(department) = draft.target_dept.as_deref() {
            // Only organisation-wide authors need the full department list.
            let departments = if policy::can_author(user, &Category::General) {
                self.directory.departments(session).await?
            } else {
                Vec::new()
            };
            policy::authorize_target(user, department, &departments)?;
        }

        let _ticket = self.in_flight.acquire(&user.username, "create", draft.title.trim())?;
        let created = self
            .backend
            .create_announcement(&session.token, &draft)
            .await?
            .map(consistent);

        tracing::info!(
            author = %user.username,
            category = %draft.category,
            target_dept = ?draft.target_dept,
            with_attachment = draft.attachment.is_some(),
            "announcement published"
        );
        Ok(created)
    }

    /// Confirms reading. Repeating it is a no-op; archived announcements
    /// are refused without contacting the backend.
    pub async fn acknowledge(&self, session: &Session, id: Uuid) -> Result<Announcement> {
        let _ticket = self
            .in_flight
            .acquire(&session.user.username, "acknowledge", &id.to_string())?;

        let announcement = self.find(session, id).await?;
        policy::authorize_acknowledge(&session.user, &announcement)?;
        if !policy::can_acknowledge(&session.user, &announcement) {
            return Ok(announcement);
        }

        self.backend.acknowledge(&session.token, id).await?;
        tracing::info!(username = %session.user.username, announcement_id = %id, "announcement acknowledged");
        Ok(announcement.acknowledged())
    }

    /// Moves an announcement into or out of the archive. Already being in
    /// the requested state is a successful no-op.
    pub async fn set_archived(&self, session: &Session, id: Uuid, archived: bool) -> Result<Announcement> {
        policy::authorize_manage(&session.user)?;
        let _ticket = self
            .in_flight
            .acquire(&session.user.username, "archive", &id.to_string())?;

        let current = self.find(session, id).await?;
        if current.is_archived == archived {
            return Ok(current);
        }
        self.apply_archive(session, current.with_archived(archived)).await
    }

    pub async fn toggle_archive(&self, session: &Session, id: Uuid) -> Result<Announcement> {
        policy::authorize_manage(&session.user)?;
        let _ticket = self
            .in_flight
            .acquire(&session.user.username, "archive", &id.to_string())?;

        let current = self.find(session, id).await?;
        let target = policy::toggle_archive(&session.user, current)?;
        self.apply_archive(session, target).await
    }

    /// Acknowledgement audit for one announcement, management only.
    pub async fn logs(&self, session: &Session, id: Uuid) -> Result<AcknowledgementLog> {
        policy::authorize_manage(&session.user)?;

        let log = self.backend.announcement_logs(&session.token, id).await?;
        if !log.is_partition() {
            tracing::warn!(announcement_id = %id, "acknowledgement log overlaps, normalising");
        }
        Ok(log.normalized())
    }

    async fn apply_archive(&self, session: &Session, target: Announcement) -> Result<Announcement> {
        let updated = self
            .backend
            .set_archived(&session.token, target.id, target.is_archived)
            .await?;

        tracing::info!(
            username = %session.user.username,
            announcement_id = %target.id,
            archived = target.is_archived,
            "archive state changed"
        );

        // The archive endpoints do not report the caller's acknowledgement.
        Ok(consistent(Announcement {
            has_acknowledged: target.has_acknowledged,
            ..updated
        }))
    }

    /// Looks an announcement up in the active feed, then in the archive.
    async fn find(&self, session: &Session, id: Uuid) -> Result<Announcement> {
        for show_archived in [false, true] {
            let query = AnnouncementQuery { category: None, show_archived };
            let feed = self.backend.list_announcements(&session.token, &query).await?;
            if let Some(found) = feed.into_iter().find(|a| a.id == id) {
                return Ok(consistent(found));
            }
        }
        Err(AppError::NotFound("Announcement not found".to_string()))
    }
}

/// Only SECTOR announcements keep a `target_dept` on their way to the client.
fn consistent(announcement: Announcement) -> Announcement {
    if announcement.category != Category::Sector && announcement.target_dept.is_some() {
        tracing::warn!(
            announcement_id = %announcement.id,
            category = %announcement.category,
            "backend sent a target department on a non-SECTOR announcement, dropping it"
        );
    }
    announcement.with_consistent_targeting()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::backend::fake::FakeBackend;

    struct Fixture {
        fake: Arc<FakeBackend>,
        service: AnnouncementService,
    }

    impl Fixture {
        fn new() -> Self {
            let fake = Arc::new(FakeBackend::new());
            let directory = Arc::new(EmployeeService::new(fake.clone(), Vec::new()));
            let service = AnnouncementService::new(fake.clone(), directory, AttachmentConfig::default());
            Self { fake, service }
        }

        async fn session(&self, user: User) -> Session {
            let token = self.fake.sign_in(user.clone());
            AuthService::new(120, false).establish(user, &token).await
        }
    }

    #[tokio::test]
    async fn test_acknowledge_twice_posts_once() {
        let fx = Fixture::new();
        let session = fx.session(User::new("adv", Role::Advogado)).await;
        let id = fx.fake.publish("Recesso", Category::General, None);

        let first = fx.service.acknowledge(&session, id).await.unwrap();
        let second = fx.service.acknowledge(&session, id).await.unwrap();

        assert!(first.has_acknowledged);
        assert_eq!(first, second);
        assert_eq!(fx.fake.call_count("acknowledge"), 1);
        assert!(fx.fake.acknowledged_by(id).contains("adv"));
    }

    #[tokio::test]
    async fn test_archived_acknowledge_refused_locally() {
        let fx = Fixture::new();
        let admin = fx.session(User::new("admin", Role::Admin)).await;
        let lawyer = fx.session(User::new("adv", Role::Advogado)).await;
        let id = fx.fake.publish("Antigo", Category::General, None);
        fx.service.set_archived(&admin, id, true).await.unwrap();

        let result = fx.service.acknowledge(&lawyer, id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(fx.fake.call_count("acknowledge"), 0);
    }

    #[tokio::test]
    async fn test_archive_round_trip_keeps_acknowledgement() {
        let fx = Fixture::new();
        let director = fx.session(User::new("dir", Role::Diretoria)).await;
        let id = fx.fake.publish("Plantão", Category::General, None);
        fx.service.acknowledge(&director, id).await.unwrap();

        let archived = fx.service.toggle_archive(&director, id).await.unwrap();
        assert!(archived.is_archived);
        assert!(archived.has_acknowledged);

        let restored = fx.service.set_archived(&director, id, false).await.unwrap();
        assert!(!restored.is_archived);
        assert!(restored.has_acknowledged);

        // Unarchiving an active announcement changes nothing.
        let unchanged = fx.service.set_archived(&director, id, false).await.unwrap();
        assert_eq!(unchanged, restored);
        assert_eq!(fx.fake.call_count("unarchive"), 1);
    }

    #[tokio::test]
    async fn test_lawyer_logs_denied_before_network() {
        let fx = Fixture::new();
        let lawyer = fx.session(User::new("adv", Role::Advogado)).await;
        let id = fx.fake.publish("Aviso", Category::General, None);
        let before = fx.fake.calls().len();

        let result = fx.service.logs(&lawyer, id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(fx.fake.calls().len(), before);
    }

    #[tokio::test]
    async fn test_logs_partition_recipients() {
        let fx = Fixture::new();
        let manager = fx.session(User::new("coord", Role::Coordenador).with_department("TI")).await;
        let dev = fx.session(User::new("dev", Role::Advogado).with_department("TI")).await;
        fx.session(User::new("rh", Role::Advogado).with_department("RH")).await;
        let id = fx.fake.publish("Manutenção", Category::Sector, Some("TI"));
        fx.service.acknowledge(&dev, id).await.unwrap();

        let log = fx.service.logs(&manager, id).await.unwrap();
        assert!(log.is_partition());
        assert_eq!(log.total_recipients(), 2);
        assert_eq!(log.acknowledged, vec![LogEntry::new("dev", "TI")]);
    }

    #[tokio::test]
    async fn test_sector_draft_outside_own_departments_denied() {
        let fx = Fixture::new();
        let supervisor = fx.session(User::new("sup", Role::Supervisor).with_department("TI")).await;

        let draft = NewAnnouncement::new("Escala", "Sábado", Category::Sector).for_department("RH");
        let result = fx.service.create(&supervisor, draft).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(fx.fake.call_count("create_announcement"), 0);

        let draft = NewAnnouncement::new("Escala", "Sábado", Category::Sector).for_department("TI");
        let created = fx.service.create(&supervisor, draft).await.unwrap().unwrap();
        assert_eq!(created.target_dept.as_deref(), Some("TI"));
    }

    #[tokio::test]
    async fn test_bad_attachment_rejected_before_network() {
        let fx = Fixture::new();
        let admin = fx.session(User::new("admin", Role::Admin)).await;

        let mut draft = NewAnnouncement::new("Manual", "Segue anexo", Category::Tech);
        draft.attachment = Some(AttachmentUpload {
            file_name: "setup.exe".into(),
            content_type: None,
            data: vec![1, 2, 3],
        });

        let result = fx.service.create(&admin, draft).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(fx.fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_feed_is_scoped_and_newest_first() {
        let fx = Fixture::new();
        let lawyer = fx.session(User::new("adv", Role::Advogado).with_department("JURÍDICO")).await;
        fx.fake.publish("Primeiro", Category::General, None);
        fx.fake.publish("Gestão", Category::OpsMgmt, None);
        fx.fake.publish("Segundo", Category::Tech, None);

        let feed = fx.service.list(&lawyer, &AnnouncementQuery::default()).await.unwrap();
        let titles: Vec<&str> = feed.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Segundo", "Primeiro"]);
    }

    #[tokio::test]
    async fn test_stray_target_dept_never_reaches_the_client() {
        let fx = Fixture::new();
        let coordinator = fx.session(User::new("coord", Role::Coordenador).with_department("TI")).await;
        let id = fx.fake.publish("Aviso", Category::General, Some("TI"));

        let feed = fx.service.list(&coordinator, &AnnouncementQuery::default()).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].category, Category::General);
        assert_eq!(feed[0].target_dept, None);
        assert!(feed.iter().all(Announcement::targeting_is_consistent));

        let acknowledged = fx.service.acknowledge(&coordinator, id).await.unwrap();
        assert!(acknowledged.targeting_is_consistent());

        let archived = fx.service.toggle_archive(&coordinator, id).await.unwrap();
        assert!(archived.is_archived);
        assert_eq!(archived.target_dept, None);
    }
}
