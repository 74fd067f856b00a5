mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use zerocore::{
    auth::SESSION_COOKIE,
    domain::{Category, Role, User, POST_GENERAL},
};

use common::spawn_app;

#[tokio::test]
async fn test_admin_publishes_general_announcement() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("admin", Role::Admin)).await;

    let created = app
        .post(
            "/api/announcements",
            Some(&token),
            Some(json!({
                "title": "Recesso de fim de ano",
                "content": "O escritório fecha de 24/12 a 02/01.",
                "category": "GENERAL"
            })),
        )
        .await?;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["category"], "GENERAL");
    assert!(created.body["target_dept"].is_null());

    let feed = app.get("/api/announcements", Some(&token)).await?;
    assert_eq!(feed.status, StatusCode::OK);
    assert_eq!(feed.body.as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_lawyer_cannot_publish_and_nothing_is_sent() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("adv", Role::Advogado)).await;

    let response = app
        .post(
            "/api/announcements",
            Some(&token),
            Some(json!({ "title": "Festa", "content": "Sexta", "category": "GENERAL" })),
        )
        .await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["kind"], "forbidden");
    assert_eq!(response.body["retryable"], false);
    assert_eq!(app.fake.call_count("create_announcement"), 0);

    Ok(())
}

#[tokio::test]
async fn test_sector_requires_target_department() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app
        .signed_in(User::new("rh", Role::Advogado).with_permission(POST_GENERAL))
        .await;

    let missing = app
        .post(
            "/api/announcements",
            Some(&token),
            Some(json!({ "title": "Escala", "content": "Plantão", "category": "SECTOR" })),
        )
        .await?;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);

    let stray = app
        .post(
            "/api/announcements",
            Some(&token),
            Some(json!({ "title": "Aviso", "content": "Texto", "category": "GENERAL", "target_dept": "TI" })),
        )
        .await?;
    assert_eq!(stray.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.fake.call_count("create_announcement"), 0);

    Ok(())
}

#[tokio::test]
async fn test_multipart_create_with_attachment() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("admin", Role::Admin)).await;

    let multipart = |file_name: &str| {
        let boundary = "zcboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nManual do ponto\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\nSegue o manual.\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\nTECH\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n%PDF-1.4 fake\r\n\
             --{b}--\r\n",
            b = boundary,
            f = file_name
        );
        Request::builder()
            .method("POST")
            .uri("/api/announcements")
            .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
    };

    let created = app.dispatch(multipart("manual.pdf")?).await?;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["attachment_name"], "manual.pdf");

    let rejected = app.dispatch(multipart("manual.exe")?).await?;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.fake.call_count("create_announcement"), 1);
    assert_eq!(app.fake.announcement_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_truncated_multipart_is_bad_request() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("admin", Role::Admin)).await;

    // The stream ends inside the title field, without a closing boundary.
    let body = "--zcboundary\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nManual do po";
    let request = Request::builder()
        .method("POST")
        .uri("/api/announcements")
        .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=zcboundary")
        .body(Body::from(body))?;

    let response = app.dispatch(request).await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "bad_request");
    assert_eq!(app.fake.call_count("create_announcement"), 0);
    assert_eq!(app.fake.announcement_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_acknowledge_is_idempotent() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("adv", Role::Advogado)).await;
    let id = app.fake.publish("Novo sistema", Category::Tech, None);
    let uri = format!("/api/announcements/{}/acknowledge", id);

    let first = app.post(&uri, Some(&token), None).await?;
    let second = app.post(&uri, Some(&token), None).await?;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body["has_acknowledged"], true);
    assert_eq!(first.body, second.body);
    assert_eq!(app.fake.call_count("acknowledge"), 1);

    Ok(())
}

#[tokio::test]
async fn test_archived_announcement_cannot_be_acknowledged() -> anyhow::Result<()> {
    let app = spawn_app();
    let admin = app.signed_in(User::new("admin", Role::Admin)).await;
    let lawyer = app.signed_in(User::new("adv", Role::Advogado)).await;
    let id = app.fake.publish("Antigo", Category::General, None);

    let archived = app
        .post(&format!("/api/announcements/{}/archive", id), Some(&admin), None)
        .await?;
    assert_eq!(archived.status, StatusCode::OK);

    let response = app
        .post(&format!("/api/announcements/{}/acknowledge", id), Some(&lawyer), None)
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.fake.call_count("acknowledge"), 0);

    Ok(())
}

#[tokio::test]
async fn test_archive_and_unarchive_keep_acknowledgement() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("coord", Role::Coordenador)).await;
    let id = app.fake.publish("Reunião geral", Category::General, None);

    app.post(&format!("/api/announcements/{}/acknowledge", id), Some(&token), None)
        .await?;

    let archived = app
        .post(&format!("/api/announcements/{}/toggle-archive", id), Some(&token), None)
        .await?;
    assert_eq!(archived.body["is_archived"], true);
    assert_eq!(archived.body["has_acknowledged"], true);

    let archive_feed = app
        .get("/api/announcements?show_archived=true", Some(&token))
        .await?;
    assert_eq!(archive_feed.body.as_array().map(Vec::len), Some(1));

    let restored = app
        .post(&format!("/api/announcements/{}/unarchive", id), Some(&token), None)
        .await?;
    assert_eq!(restored.body["is_archived"], false);
    assert_eq!(restored.body["has_acknowledged"], true);

    Ok(())
}

#[tokio::test]
async fn test_lawyer_audit_log_denied_without_backend_call() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("adv", Role::Advogado)).await;
    let id = app.fake.publish("Aviso", Category::General, None);

    let response = app
        .get(&format!("/api/announcements/{}/logs", id), Some(&token))
        .await?;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.fake.calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_manager_reads_partitioned_audit_log() -> anyhow::Result<()> {
    let app = spawn_app();
    let manager = app.signed_in(User::new("dir", Role::Diretoria).with_department("DIRETORIA")).await;
    let reader = app.signed_in(User::new("ana", Role::Advogado).with_department("JURÍDICO")).await;
    app.signed_in(User::new("bruno", Role::Advogado).with_department("TI")).await;
    let id = app.fake.publish("Política de férias", Category::General, None);

    app.post(&format!("/api/announcements/{}/acknowledge", id), Some(&reader), None)
        .await?;

    let log = app
        .get(&format!("/api/announcements/{}/logs", id), Some(&manager))
        .await?;
    assert_eq!(log.status, StatusCode::OK);

    let acknowledged = log.body["acknowledged"].as_array().cloned().unwrap_or_default();
    let pending = log.body["pending"].as_array().cloned().unwrap_or_default();
    assert_eq!(acknowledged.len() + pending.len(), 3);
    assert_eq!(acknowledged, vec![json!({ "name": "ana", "dept": "JURÍDICO" })]);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_duplicate_acknowledge_is_refused() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("adv", Role::Advogado)).await;
    let id = app.fake.publish("Treinamento", Category::General, None);
    app.fake.delay_acknowledge(Duration::from_millis(200));

    let uri = format!("/api/announcements/{}/acknowledge", id);
    let (a, b) = tokio::join!(
        app.post(&uri, Some(&token), None),
        app.post(&uri, Some(&token), None)
    );

    let mut statuses = vec![a?.status, b?.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(app.fake.call_count("acknowledge"), 1);

    Ok(())
}

#[tokio::test]
async fn test_backend_outage_is_retryable() -> anyhow::Result<()> {
    let app = spawn_app();
    let token = app.signed_in(User::new("adv", Role::Advogado)).await;
    app.fake.fail_with(Some(zerocore::backend::fake::FakeFailure::Offline));

    let response = app.get("/api/announcements", Some(&token)).await?;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["kind"], "network");
    assert_eq!(response.body["retryable"], true);

    // The session survives an outage.
    assert!(app.auth.validate_session(&token).await.is_ok());

    Ok(())
}
