use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_notify::models::{AuthToken, CreateNotification, NotificationType};
use market_notify::{ApiError, HttpNotificationApi, NotificationApi, NotificationStore, StoreOptions};

fn token() -> AuthToken {
    AuthToken::new("tok-123").unwrap()
}

fn api_for(server: &MockServer) -> HttpNotificationApi {
    HttpNotificationApi::new(&format!("{}/api/v1", server.uri()), Duration::from_secs(5)).unwrap()
}

fn notification_json(id: &str, read: bool) -> serde_json::Value {
    let read_at = read.then_some("2026-01-05T10:05:00Z");
    json!({
        "id": id,
        "user_id": "user-1",
        "content": format!("notification {}", id),
        "notification_type": "comment",
        "metadata": { "postId": "p-9" },
        "read": read,
        "read_at": read_at,
        "created_at": "2026-01-05T10:00:00Z",
        "updated_at": null
    })
}

#[tokio::test]
async fn test_get_notifications_sends_page_and_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "20"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("accept", "application/json"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "page_size": 20,
            "total": 22,
            "items": [notification_json("n21", false), notification_json("n22", true)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api_for(&server).get_notifications(2, 20, &token()).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.total, 22);
    assert_eq!(page.items.len(), 2);
    assert!(page.items[1].read);
    assert_eq!(page.items[0].metadata["postId"], "p-9", "metadata keys are left alone");
}

#[tokio::test]
async fn test_camel_case_body_is_normalised() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "pageSize": 20,
            "total": 1,
            "items": [{
                "id": "n1",
                "userID": "user-1",
                "content": "Someone liked your post",
                "notificationType": "like",
                "metadata": { "likedBy": "user-7" },
                "read": false,
                "readAt": null,
                "createdAt": "2026-01-05T10:00:00Z"
            }]
        })))
        .mount(&server)
        .await;

    let page = api_for(&server).get_notifications(1, 20, &token()).await.unwrap();
    let n = &page.items[0];
    assert_eq!(n.user_id, "user-1");
    assert_eq!(n.notification_type, NotificationType::Like);
    assert!(n.updated_at.is_none());
    assert!(n.metadata.contains_key("likedBy"));
}

#[tokio::test]
async fn test_schema_mismatch_is_rejected() {
    let server = MockServer::start().await;

    let mut bad = notification_json("n1", false);
    bad["id"] = json!(17);
    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "page_size": 20, "total": 1, "items": [bad]
        })))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .get_notifications(1, 20, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Schema(ref msg) if msg.contains("/items/0/id")), "{err}");
}

#[tokio::test]
async fn test_unknown_notification_type_is_rejected() {
    let server = MockServer::start().await;

    let mut bad = notification_json("n1", false);
    bad["notification_type"] = json!("carrier_pigeon");
    Mock::given(method("POST"))
        .and(path("/api/v1/notifications/n1/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bad))
        .mount(&server)
        .await;

    let err = api_for(&server).mark_as_read("n1", &token()).await.unwrap_err();
    assert!(matches!(err, ApiError::Schema(_)));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .get_notifications(1, 20, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications/n1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("notification not found"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .delete_notification("n1", &token())
        .await
        .unwrap_err();
    match err {
        ApiError::Status { status, ref body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "notification not found");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .get_notifications(1, 20, &token())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_create_posts_camel_case_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/notifications"))
        .and(body_json(json!({
            "userId": "user-1",
            "content": "New application for your listing",
            "notificationType": "new_application",
            "metadata": { "applicationId": "app-4" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "n99",
            "user_id": "user-1",
            "content": "New application for your listing",
            "notification_type": "new_application",
            "metadata": { "applicationId": "app-4" },
            "read": false,
            "created_at": "2026-01-05T11:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut metadata = serde_json::Map::new();
    metadata.insert("applicationId".into(), json!("app-4"));
    let input = CreateNotification {
        user_id: "user-1".into(),
        content: "New application for your listing".into(),
        notification_type: NotificationType::NewApplication,
        metadata: Some(metadata),
    };

    let created = api_for(&server).create_notification(&input, &token()).await.unwrap();
    assert_eq!(created.id, "n99");
    assert!(!created.read);
}

#[tokio::test]
async fn test_ids_are_percent_encoded_in_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/notifications/a%2Fb/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(notification_json("a/b", true)))
        .expect(1)
        .mount(&server)
        .await;

    let n = api_for(&server).mark_as_read("a/b", &token()).await.unwrap();
    assert_eq!(n.id, "a/b");
    assert!(n.read_at.is_some());
}

#[tokio::test]
async fn test_deletes_accept_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications/n1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    tokio_test::assert_ok!(api.delete_notification("n1", &token()).await);
    tokio_test::assert_ok!(api.delete_all_notifications(&token()).await);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let api = api_for(&server);
    drop(server);

    let err = api.get_notifications(1, 20, &token()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_store_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "page_size": 20,
            "total": 3,
            "items": [
                notification_json("n1", false),
                notification_json("n2", false),
                notification_json("n3", true)
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notifications/n1/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(notification_json("n1", true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications/n2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = NotificationStore::new(Arc::new(api_for(&server)), StoreOptions::default());
    let token = token();

    store.fetch_page(&token, 1).await;
    assert_eq!(store.unread_count(), 2);
    assert!(!store.snapshot().has_more);

    store.mark_as_read(&token, "n1").await;
    assert_eq!(store.unread_count(), 1);

    store.delete_notification(&token, "n2").await;
    assert_eq!(store.notifications().len(), 3, "failed delete leaves the item");
    assert!(store.error().unwrap().contains("500"));
}
