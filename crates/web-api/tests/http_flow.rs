mod support;

use axum::http::{Method, StatusCode};
use domain::UserRole;
use serde_json::json;
use support::TestApp;

#[tokio::test]
async fn health_is_public_and_api_requires_a_token() {
    let app = TestApp::new();

    let (status, _) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call(Method::GET, "/api/v1/matches", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .call(Method::GET, "/api/v1/matches", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutual_likes_produce_a_match_and_notifications() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let alice_token = app.token(alice.id);
    let bob_token = app.token(bob.id);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/discover/like/{}", bob.id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match"], false);
    assert!(body.get("targetUser").is_none());

    let (_, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/discover/like/{}", alice.id),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(body["match"], true);
    assert_eq!(body["targetUser"]["displayName"], "Alice");
    assert_eq!(body["targetUser"]["id"], alice.id.to_string());

    let (_, matches) = app
        .call(Method::GET, "/api/v1/matches", Some(&alice_token), None)
        .await;
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["displayName"], "Bob");

    let (_, listed) = app
        .call(Method::GET, "/api/v1/notifications", Some(&alice_token), None)
        .await;
    assert_eq!(listed["unreadCount"], 1);
    assert_eq!(listed["notifications"][0]["type"], "new_match");
    assert_eq!(
        listed["notifications"][0]["link"],
        format!("/chats/{}", bob.id)
    );

    let (_, marked) = app
        .call(Method::POST, "/api/v1/notifications/read", Some(&alice_token), None)
        .await;
    assert_eq!(marked["updated"], 1);
    let (_, listed) = app
        .call(Method::GET, "/api/v1/notifications", Some(&alice_token), None)
        .await;
    assert_eq!(listed["unreadCount"], 0);
}

#[tokio::test]
async fn dislike_and_discover() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let token = app.token(alice.id);

    let (_, candidates) = app
        .call(Method::GET, "/api/v1/discover", Some(&token), None)
        .await;
    assert_eq!(candidates.as_array().unwrap().len(), 1);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/discover/dislike/{}", bob.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, candidates) = app
        .call(Method::GET, "/api/v1/discover", Some(&token), None)
        .await;
    assert!(candidates.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn chat_round_trip_over_http() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let alice_token = app.token(alice.id);
    let bob_token = app.token(bob.id);

    let (status, chat) = app
        .call(
            Method::GET,
            &format!("/api/v1/chats/{}", bob.id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(chat["messages"].as_array().unwrap().is_empty());
    let conversation_id = chat["conversationId"].as_str().unwrap().to_owned();

    // 对方打开同一个聊天得到同一个会话
    let (_, from_bob) = app
        .call(
            Method::GET,
            &format!("/api/v1/chats/{}", alice.id),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(from_bob["conversationId"], conversation_id);

    let (status, sent) = app
        .call(
            Method::POST,
            &format!("/api/v1/chats/{conversation_id}/messages"),
            Some(&alice_token),
            Some(json!({"content": "hello bob"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["content"], "hello bob");
    assert_eq!(sent["messageType"], "text");
    assert_eq!(sent["sender"]["displayName"], "Alice");

    let (status, image) = app
        .call(
            Method::POST,
            &format!("/api/v1/chats/{conversation_id}/images"),
            Some(&bob_token),
            Some(json!({"url": "https://cdn.example/p.jpg", "public_id": "chat/p"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(image["messageType"], "image");
    assert_eq!(image["mediaPublicId"], "chat/p");

    let (_, chats) = app
        .call(Method::GET, "/api/v1/chats", Some(&alice_token), None)
        .await;
    assert_eq!(chats[0]["conversationId"], conversation_id);
    assert_eq!(chats[0]["lastMessage"], "Image 📷");
    assert_eq!(chats[0]["otherUser"]["displayName"], "Bob");

    let (_, chat) = app
        .call(
            Method::GET,
            &format!("/api/v1/chats/{}", bob.id),
            Some(&alice_token),
            None,
        )
        .await;
    let contents: Vec<_> = chat["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(contents, vec!["hello bob", "https://cdn.example/p.jpg"]);
}

#[tokio::test]
async fn outsiders_and_blocked_users_are_rejected() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;
    let mallory = app.user("Mallory").await;
    let alice_token = app.token(alice.id);
    let bob_token = app.token(bob.id);

    let (_, chat) = app
        .call(
            Method::GET,
            &format!("/api/v1/chats/{}", bob.id),
            Some(&alice_token),
            None,
        )
        .await;
    let conversation_id = chat["conversationId"].as_str().unwrap().to_owned();

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/chats/{conversation_id}/messages"),
            Some(&app.token(mallory.id)),
            Some(json!({"content": "let me in"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_PARTICIPANT");

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/users/{}/block", alice.id),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/chats/{conversation_id}/messages"),
            Some(&alice_token),
            Some(json!({"content": "are you there?"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/discover/like/{}", bob.id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/users/{}/block", alice.id),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unblocked"], true);
}

#[tokio::test]
async fn invalid_requests_map_to_client_errors() {
    let app = TestApp::new();
    let alice = app.user("Alice").await;
    let token = app.token(alice.id);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/discover/like/{}", alice.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/discover/like/{}", domain::UserId::generate()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/chats/{}/messages", domain::ConversationId::generate()),
            Some(&token),
            Some(json!({"content": "anyone?"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CONVERSATION_NOT_FOUND");
}

#[tokio::test]
async fn admin_broadcast_flow() {
    let app = TestApp::new();
    let admin = app.user_with("Admin", |u| u.role = UserRole::Admin).await;
    let alice = app.user("Alice").await;
    let bob = app.user("Bob").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/admin/broadcasts",
            Some(&app.token(alice.id)),
            Some(json!({"message": "not allowed"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .call(
            Method::POST,
            "/api/v1/admin/broadcasts",
            Some(&app.token(admin.id)),
            Some(json!({"message": "Scheduled maintenance tonight"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["delivered"], 2);
    let broadcast_id = created["broadcast"]["id"].as_str().unwrap().to_owned();

    let (status, fetched) = app
        .call(
            Method::GET,
            &format!("/api/v1/broadcasts/{broadcast_id}"),
            Some(&app.token(bob.id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["message"], "Scheduled maintenance tonight");

    let (_, listed) = app
        .call(Method::GET, "/api/v1/notifications", Some(&app.token(bob.id)), None)
        .await;
    assert_eq!(listed["notifications"][0]["type"], "admin_broadcast");
    assert_eq!(
        listed["notifications"][0]["link"],
        format!("/broadcasts/{broadcast_id}")
    );

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/broadcasts/{}", domain::BroadcastId::generate()),
            Some(&app.token(bob.id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BROADCAST_NOT_FOUND");
}
