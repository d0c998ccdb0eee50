/// Integration tests for the Taskminder API
///
/// These tests drive the full router against a real PostgreSQL database:
/// - Registration, login, refresh and the current-user endpoints
/// - Task CRUD with per-user isolation
/// - Authentication failures
/// - Notification jobs executed by the worker
///
/// Run with: cargo test --test integration_test

mod common;

use axum::http::{header, Request, StatusCode};
use axum::body::Body;
use chrono::Duration;
use common::{body_json, cookie, json_request, request, set_cookie_header, TestContext, TEST_SECRET};
use serde_json::json;
use std::sync::Arc;
use taskminder_shared::auth::jwt::{create_token, Claims, TokenType};
use taskminder_shared::models::task::ReminderChannel;
use taskminder_worker::channels::RecordingChannel;
use taskminder_worker::dispatch::Dispatcher;
use taskminder_worker::orchestrator::{OrchestratorConfig, WorkerOrchestrator};

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send(request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_task_lifecycle_with_cookies() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.session().await;
    let cookie = session.access_cookie();

    let response = ctx
        .send(json_request(
            "POST",
            "/tasks",
            Some(&cookie),
            json!({ "title": "Buy milk", "email_notification": true }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await;
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["completed"], false);
    assert_eq!(task["email_notification"], true);
    assert_eq!(task["telegram_notification"], false);
    assert_eq!(task["user_id"], session.user_id.as_str());
    let id = task["id"].as_i64().unwrap();

    let response = ctx.send(request("GET", "/tasks", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], id);

    let response = ctx
        .send(json_request(
            "PATCH",
            &format!("/tasks/{}", id),
            Some(&cookie),
            json!({ "completed": true, "description": "2 liters" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["description"], "2 liters");
    assert_eq!(updated["title"], "Buy milk");

    let response = ctx
        .send(request("DELETE", &format!("/tasks/{}", id), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .send(request("GET", &format!("/tasks/{}", id), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send(request("DELETE", &format!("/tasks/{}", id), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bearer_header_authenticates() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.session().await;

    let request = Request::builder()
        .method("GET")
        .uri("/auth/me")
        .header(header::AUTHORIZATION, session.bearer())
        .body(Body::empty())
        .unwrap();

    let response = ctx.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(response).await;
    assert_eq!(me["id"], session.user_id.as_str());
    assert_eq!(me["email"], session.email.as_str());
    assert_eq!(me["is_active"], true);
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn test_users_cannot_see_each_others_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.session().await;
    let bob = ctx.session().await;

    let response = ctx
        .send(json_request(
            "POST",
            "/tasks",
            Some(&alice.access_cookie()),
            json!({ "title": "Alice's secret" }),
        ))
        .await;
    let id = body_json(response).await["id"].as_i64().unwrap();
    let bob_cookie = bob.access_cookie();

    let response = ctx.send(request("GET", "/tasks", Some(&bob_cookie))).await;
    assert_eq!(body_json(response).await, json!([]));

    let response = ctx
        .send(request("GET", &format!("/tasks/{}", id), Some(&bob_cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send(json_request(
            "PUT",
            &format!("/tasks/{}", id),
            Some(&bob_cookie),
            json!({ "title": "Hijacked" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send(request("DELETE", &format!("/tasks/{}", id), Some(&bob_cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send(request("POST", &format!("/notify/?task_id={}", id), Some(&bob_cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send(request("GET", &format!("/tasks/{}", id), Some(&alice.access_cookie())))
        .await;
    assert_eq!(body_json(response).await["title"], "Alice's secret");
}

#[tokio::test]
async fn test_register_and_login_failures() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.session().await;

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": session.email, "password": "other" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "pw1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": session.email, "password": "wrong" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": "pw1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_http_only_cookies() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.session().await;

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": session.email.to_uppercase(), "password": session.password }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let access = set_cookie_header(&response, "access_token").unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Max-Age=900"));

    let refresh = set_cookie_header(&response, "refresh_token").unwrap();
    assert!(refresh.contains("HttpOnly"));
    assert!(refresh.contains("Max-Age=604800"));

    let body = body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.session().await;

    let response = ctx
        .send(request(
            "POST",
            "/auth/refresh",
            Some(&format!("refresh_token={}", session.refresh_token)),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let access = cookie(&response, "access_token").unwrap();

    let response = ctx
        .send(request("GET", "/auth/me", Some(&format!("access_token={}", access))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A refresh token is not an access token, and vice versa.
    let response = ctx
        .send(request(
            "GET",
            "/auth/me",
            Some(&format!("access_token={}", session.refresh_token)),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .send(request(
            "POST",
            "/auth/refresh",
            Some(&format!("refresh_token={}", session.access_token)),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx.send(request("POST", "/auth/refresh", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send(request("GET", "/tasks", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");

    let response = ctx
        .send(request("GET", "/tasks", Some("access_token=garbage")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = create_token(
        &Claims::new("someone", TokenType::Access, Duration::seconds(-30)),
        TEST_SECRET,
    )
    .unwrap();
    let response = ctx
        .send(request("GET", "/auth/me", Some(&format!("access_token={}", expired))))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let ghost = create_token(
        &Claims::new("no-such-user", TokenType::Access, Duration::minutes(5)),
        TEST_SECRET,
    )
    .unwrap();
    let response = ctx
        .send(request("GET", "/auth/me", Some(&format!("access_token={}", ghost))))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let foreign = create_token(
        &Claims::new("someone", TokenType::Access, Duration::minutes(5)),
        "a-completely-different-secret-of-32-bytes",
    )
    .unwrap();
    let response = ctx
        .send(request("GET", "/auth/me", Some(&format!("access_token={}", foreign))))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_input_validation() {
    let ctx = TestContext::new().await.unwrap();
    let cookie = ctx.session().await.access_cookie();

    let response = ctx
        .send(json_request("POST", "/tasks", Some(&cookie), json!({ "description": "no title" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(json_request("POST", "/tasks", Some(&cookie), json!({ "title": "   " })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(json_request(
            "POST",
            "/tasks",
            Some(&cookie),
            json!({ "title": "x".repeat(256) }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unstorable_task_text_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let cookie = ctx.session().await.access_cookie();

    let response = ctx
        .send(json_request("POST", "/tasks", Some(&cookie), json!({ "title": "a\u{0}b" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");

    let response = ctx
        .send(json_request(
            "POST",
            "/tasks",
            Some(&cookie),
            json!({ "title": "Fine", "description": "nul\u{0}here" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(json_request("POST", "/tasks", Some(&cookie), json!({ "title": "Fine" })))
        .await;
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = ctx
        .send(json_request(
            "PATCH",
            &format!("/tasks/{}", id),
            Some(&cookie),
            json!({ "description": "\u{0}" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(json_request("PATCH", &format!("/tasks/{}", id), Some(&cookie), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(request("GET", &format!("/tasks/{}", id), Some(&cookie)))
        .await;
    let task = body_json(response).await;
    assert_eq!(task["title"], "Fine");
    assert!(task["description"].is_null());
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_shape() {
    let ctx = TestContext::new().await.unwrap();
    let cookie = ctx.session().await.access_cookie();

    for (method, uri) in [
        ("GET", "/tasks/abc"),
        ("DELETE", "/tasks/abc"),
        ("POST", "/notify/"),
        ("POST", "/notify/?task_id=abc"),
        ("GET", "/status/not-a-uuid"),
    ] {
        let response = ctx.send(request(method, uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", method, uri);

        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request", "{} {}", method, uri);
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_register_normalizes_email_before_validation() {
    let ctx = TestContext::new().await.unwrap();
    let local = uuid::Uuid::new_v4().simple().to_string();
    let padded = format!("  Padded-{}@Example.com ", local);
    let normalized = format!("padded-{}@example.com", local);

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": padded, "password": "pw1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], normalized.as_str());

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": normalized, "password": "pw1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .send(json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": padded, "password": "pw2" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "conflict");
}

#[tokio::test]
async fn test_update_contacts() {
    let ctx = TestContext::new().await.unwrap();
    let cookie = ctx.session().await.access_cookie();

    let response = ctx
        .send(json_request(
            "PUT",
            "/auth/me/contacts",
            Some(&cookie),
            json!({ "phone_number": "+7 999 123-45-67", "telegram_chat_id": "4242" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["phone_number"], "+7 999 123-45-67");
    assert_eq!(profile["telegram_chat_id"], "4242");

    let response = ctx
        .send(json_request(
            "PUT",
            "/auth/me/contacts",
            Some(&cookie),
            json!({ "telegram_chat_id": null }),
        ))
        .await;
    let profile = body_json(response).await;
    assert!(profile.get("telegram_chat_id").is_none());
    assert_eq!(profile["phone_number"], "+7 999 123-45-67");

    let response = ctx
        .send(json_request(
            "PUT",
            "/auth/me/contacts",
            Some(&cookie),
            json!({ "phone_number": "call me maybe" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .send(json_request("PUT", "/auth/me/contacts", Some(&cookie), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for chat_id in ["9".repeat(100), "12ab".to_string(), "4\u{0}2".to_string()] {
        let response = ctx
            .send(json_request(
                "PUT",
                "/auth/me/contacts",
                Some(&cookie),
                json!({ "telegram_chat_id": chat_id }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "bad_request");
    }

    let response = ctx
        .send(json_request(
            "PUT",
            "/auth/me/contacts",
            Some(&cookie),
            json!({ "telegram_chat_id": "-1001234567890" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["telegram_chat_id"], "-1001234567890");
}

#[tokio::test]
async fn test_notify_job_executed_by_worker() {
    let ctx = TestContext::new().await.unwrap();
    let session = ctx.session().await;
    let cookie = session.access_cookie();

    let response = ctx
        .send(json_request("POST", "/tasks", Some(&cookie), json!({ "title": "Call mom" })))
        .await;
    let task_id = body_json(response).await["id"].as_i64().unwrap();

    let response = ctx
        .send(request("POST", &format!("/notify/?task_id={}", task_id), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let queued = body_json(response).await;
    assert_eq!(queued["status"], "pending");
    let job_id = queued["task_id"].as_str().unwrap().to_string();

    let response = ctx
        .send(request("GET", &format!("/status/{}", job_id), Some(&cookie)))
        .await;
    let status = body_json(response).await;
    assert_eq!(status["task_id"], job_id.as_str());
    assert!(status["result"].is_null());

    let email = Arc::new(RecordingChannel::new(ReminderChannel::Email));
    let orchestrator = WorkerOrchestrator::new(
        ctx.db.clone(),
        Arc::new(Dispatcher::new().with_channel(email.clone())),
        OrchestratorConfig {
            job_batch_size: 100,
            ..Default::default()
        },
    );

    let mut status = status;
    for _ in 0..20 {
        if status["status"] == "succeeded" || status["status"] == "failed" {
            break;
        }
        orchestrator.run_jobs_once().await.unwrap();

        let response = ctx
            .send(request("GET", &format!("/status/{}", job_id), Some(&cookie)))
            .await;
        status = body_json(response).await;
    }

    assert_eq!(status["status"], "succeeded");
    assert_eq!(status["result"]["channels"]["email"]["status"], "sent");
    assert!(email.recipients().contains(&session.email));

    let other = ctx.session().await;
    let response = ctx
        .send(request("GET", &format!("/status/{}", job_id), Some(&other.access_cookie())))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
