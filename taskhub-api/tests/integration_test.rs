/// Integration tests for the TaskHub API
///
/// Two tiers:
/// - Tests against a never-connected pool, covering everything that must
///   resolve before the database is touched (auth header handling, token
///   verification, request validation).
/// - End-to-end flows against a real PostgreSQL, `#[ignore]`d so the
///   default test run needs no infrastructure. Run them with
///   `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, json_request, TestContext, TEST_JWT_SECRET};
use serde_json::json;
use taskhub_shared::auth::jwt::{create_token, Claims};
use tower::ServiceExt;
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_tasks_require_authorization_header() {
    let ctx = TestContext::without_database();

    let response = ctx
        .app
        .oneshot(json_request("GET", "/tasks", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let ctx = TestContext::without_database();

    let response = ctx
        .app
        .oneshot(json_request("GET", "/tasks", Some("not-a-jwt"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let ctx = TestContext::without_database();

    let claims = Claims::with_expiration(Uuid::new_v4(), Duration::seconds(-3600));
    let token = create_token(&claims, TEST_JWT_SECRET).unwrap();

    let response = ctx
        .app
        .oneshot(json_request("GET", "/tasks", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_with_wrong_secret_is_unauthorized() {
    let ctx = TestContext::without_database();

    let claims = Claims::new(Uuid::new_v4());
    let token = create_token(&claims, "some-other-secret-that-is-long-enough!").unwrap();

    let response = ctx
        .app
        .oneshot(json_request(
            "GET",
            "/auth/profile",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_runs_before_persistence() {
    let ctx = TestContext::without_database();

    // Pool is never connected: a 400 here proves validation fires first
    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "ab",
                "email": "not-an-email",
                "password": "short"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_login_validation_runs_before_persistence() {
    let ctx = TestContext::without_database();

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "nope", "password": "" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// --- End-to-end flows (need a real database) ------------------------------

async fn register(ctx: &TestContext, username: &str, email: &str, password: &str) -> (String, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": username, "email": email, "password": password })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    (body["token"].as_str().unwrap().to_string(), body["user"].clone())
}

async fn create_task(ctx: &TestContext, token: &str, payload: serde_json::Value) -> serde_json::Value {
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", "/tasks", Some(token), Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_register_token_resolves_to_new_user() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("reg");
    let email = format!("{}@example.com", username);

    let (token, user) = register(&ctx, &username, &email, "secret123").await;
    assert_eq!(user["username"], username.as_str());
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());

    // The token's embedded identity resolves to the newly created user
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("GET", "/auth/profile", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], user["id"]);
    assert_eq!(body["user"]["username"], username.as_str());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("dup");
    let email = format!("{}@example.com", username);

    register(&ctx, &username, &email, "secret123").await;

    // Same email, different username
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": unique("dup2"), "email": email, "password": "secret123" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "conflict");

    // Same username, different email
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", unique("other")),
                "password": "secret123"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("login");
    let email = format!("{}@example.com", username);
    register(&ctx, &username, &email, "secret123").await;

    let wrong_password = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        ))
        .await
        .unwrap();

    let unknown_email = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({
                "email": format!("{}@example.com", unique("ghost")),
                "password": "secret123"
            })),
        ))
        .await
        .unwrap();

    // 400 for both failure modes, with identical bodies; 401 is reserved
    // for token failures so clients don't clear their session here
    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    let a = body_json(wrong_password).await;
    let b = body_json(unknown_email).await;
    assert_eq!(a, b);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_foreign_tasks_are_not_found() {
    let ctx = TestContext::with_database().await.unwrap();

    let user_a = unique("alice");
    let (token_a, _) =
        register(&ctx, &user_a, &format!("{}@example.com", user_a), "secret123").await;
    let user_b = unique("bob");
    let (token_b, _) =
        register(&ctx, &user_b, &format!("{}@example.com", user_b), "secret123").await;

    let task = create_task(&ctx, &token_a, json!({ "title": "A's task" })).await;
    let task_id = task["id"].as_str().unwrap();

    // B cannot see, update, or delete A's task; all paths report 404
    for (method, body) in [
        ("GET", None),
        ("PUT", Some(json!({ "title": "stolen" }))),
        ("DELETE", None),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                method,
                &format!("/tasks/{}", task_id),
                Some(&token_b),
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} should 404", method);
    }

    // The owner still has it
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/tasks/{}", task_id),
            Some(&token_a),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_stats_summary_zero_and_scenario() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("stats");
    let (token, _) = register(
        &ctx,
        &username,
        &format!("{}@example.com", username),
        "secret123",
    )
    .await;

    // Zero tasks: all-zero counts, not an absent result
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("GET", "/tasks/stats/summary", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({ "total": 0, "pending": 0, "inProgress": 0, "completed": 0, "highPriority": 0 })
    );

    create_task(&ctx, &token, json!({ "title": "T1", "status": "pending" })).await;
    create_task(&ctx, &token, json!({ "title": "T2", "status": "in-progress" })).await;
    create_task(&ctx, &token, json!({ "title": "T3", "status": "completed" })).await;
    create_task(
        &ctx,
        &token,
        json!({ "title": "T4", "status": "pending", "priority": "high" }),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request("GET", "/tasks/stats/summary", Some(&token), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({ "total": 4, "pending": 2, "inProgress": 1, "completed": 1, "highPriority": 1 })
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_create_then_get_roundtrip() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("round");
    let (token, _) = register(
        &ctx,
        &username,
        &format!("{}@example.com", username),
        "secret123",
    )
    .await;

    let created = create_task(
        &ctx,
        &token,
        json!({
            "title": "Write report",
            "description": "Quarterly numbers",
            "status": "in-progress",
            "priority": "high",
            "dueDate": "2026-09-15T12:00:00Z"
        }),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/tasks/{}", created["id"].as_str().unwrap()),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;

    for field in ["title", "description", "status", "priority", "dueDate"] {
        assert_eq!(created[field], fetched[field], "field {} should round-trip", field);
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_update_with_null_clears_description_and_due_date() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("clear");
    let (token, _) = register(
        &ctx,
        &username,
        &format!("{}@example.com", username),
        "secret123",
    )
    .await;

    let task = create_task(
        &ctx,
        &token,
        json!({
            "title": "Trim me",
            "description": "to be removed",
            "dueDate": "2026-10-01T00:00:00Z"
        }),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    // Explicit nulls clear the fields; the omitted title is untouched
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({ "description": null, "dueDate": null })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["title"], "Trim me");
    assert!(updated["description"].is_null());
    assert!(updated["dueDate"].is_null());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_create_with_empty_title_persists_nothing() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("valid");
    let (token, _) = register(
        &ctx,
        &username,
        &format!("{}@example.com", username),
        "secret123",
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", "/tasks", Some(&token), Some(json!({ "title": "" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let messages: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["message"].as_str().unwrap())
        .collect();
    assert!(messages.iter().any(|m| m.contains("Title is required")));

    // Nothing was persisted
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("GET", "/tasks", Some(&token), None))
        .await
        .unwrap();
    let tasks = body_json(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_list_rejects_unknown_sort_field() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("sort");
    let (token, _) = register(
        &ctx,
        &username,
        &format!("{}@example.com", username),
        "secret123",
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "GET",
            "/tasks?sortBy=password_hash",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_list_filters_and_sorts() {
    let ctx = TestContext::with_database().await.unwrap();
    let username = unique("list");
    let (token, _) = register(
        &ctx,
        &username,
        &format!("{}@example.com", username),
        "secret123",
    )
    .await;

    create_task(&ctx, &token, json!({ "title": "a-low", "priority": "low" })).await;
    create_task(&ctx, &token, json!({ "title": "b-high", "priority": "high" })).await;
    create_task(
        &ctx,
        &token,
        json!({ "title": "c-high-done", "priority": "high", "status": "completed" }),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "GET",
            "/tasks?priority=high&sortBy=title&sortOrder=asc",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let tasks = body_json(response).await;
    let titles: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["b-high", "c-high-done"]);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_profile_update_and_conflict() {
    let ctx = TestContext::with_database().await.unwrap();

    let first = unique("taken");
    register(&ctx, &first, &format!("{}@example.com", first), "secret123").await;

    let second = unique("mover");
    let (token, _) = register(
        &ctx,
        &second,
        &format!("{}@example.com", second),
        "secret123",
    )
    .await;

    // Taking another user's username is a conflict
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/auth/profile",
            Some(&token),
            Some(json!({ "username": first })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A fresh username goes through
    let fresh = unique("fresh");
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/auth/profile",
            Some(&token),
            Some(json!({ "username": fresh })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], fresh.as_str());
}
