mod common;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};

use bike_invest::services::auth::Role;
use bike_invest::services::auth::password;
use bike_invest::services::auth::password_reset::hash_reset_id;
use bike_invest::services::auth::token_codec::Claims;
use common::{
    TestApp, body_json, get, json_request, session_cookie, session_set_cookie,
};

const PASSWORD: &str = "correct-horse-battery";
const NEW_PASSWORD: &str = "brand-new-password";

fn with_cookie(mut req: axum::http::Request<axum::body::Body>, token: &str) -> axum::http::Request<axum::body::Body> {
    req.headers_mut().insert(
        header::COOKIE,
        format!("bike_invest_session={token}").parse().unwrap(),
    );
    req
}

fn login_body(email: &str, password: &str) -> serde_json::Value {
    serde_json::json!({ "email": email, "password": password })
}

#[tokio::test]
async fn signup_sets_session_cookie_and_creates_investor() {
    let app = TestApp::new();
    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/signup",
            &serde_json::json!({
                "email": "  New@Example.com ",
                "password": PASSWORD,
                "full_name": "New Investor",
            }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let set_cookie = session_set_cookie(&res).unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=604800"));
    // Development config: plain http.
    assert!(!set_cookie.contains("Secure"));

    let token = session_cookie(&res).unwrap();
    let body = body_json(res).await;
    assert_eq!(body["email"], "new@example.com");
    assert_eq!(body["role"], "investor");

    let stored = app.users.by_email("new@example.com").unwrap();
    assert_eq!(stored.role, Some(Role::Investor));
    assert!(password::verify(PASSWORD, &stored.password_hash));

    let res = app.send(get("/api/v1/auth/session", Some(&token))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["user_id"], stored.id.to_string());
}

#[tokio::test]
async fn signup_cannot_choose_a_role() {
    let app = TestApp::new();
    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/signup",
            &serde_json::json!({
                "email": "sneaky@example.com",
                "password": PASSWORD,
                "role": "admin",
            }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.users.by_email("sneaky@example.com").is_none());
}

#[tokio::test]
async fn duplicate_signup_is_conflict() {
    let app = TestApp::new();
    app.users
        .insert("taken@example.com", PASSWORD, Some(Role::Investor));

    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/signup",
            &login_body("taken@example.com", PASSWORD),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(session_set_cookie(&res).is_none());
    assert_eq!(body_json(res).await["error"]["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn signup_with_weak_password_is_rejected() {
    let app = TestApp::new();
    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/signup",
            &login_body("weak@example.com", "short"),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"]["code"], "WEAK_PASSWORD");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.users
        .insert("known@example.com", PASSWORD, Some(Role::Investor));
    app.users.insert("orphan@example.com", PASSWORD, None);

    let mut bodies = Vec::new();
    for (email, password) in [
        ("known@example.com", "wrong-password"),
        ("nobody@example.com", PASSWORD),
        ("orphan@example.com", PASSWORD),
    ] {
        let res = app
            .send(json_request(
                "POST",
                "/api/v1/auth/login",
                &login_body(email, password),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{email}");
        assert!(session_set_cookie(&res).is_none());
        bodies.push(body_json(res).await);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}

#[tokio::test]
async fn logout_clears_cookie_but_token_stays_valid() {
    let app = TestApp::new();
    app.users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let token = app.login("investor@example.com", PASSWORD).await;

    let req = with_cookie(
        json_request("POST", "/api/v1/auth/logout", &serde_json::json!({})),
        &token,
    );
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = session_set_cookie(&res).unwrap();
    assert!(set_cookie.starts_with("bike_invest_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    assert!(set_cookie.contains("Path=/"));

    // The browser drops the cookie; a request without it is unauthenticated.
    let res = app.send(get("/api/v1/auth/session", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // No server-side revocation: the raw token still verifies until exp.
    assert!(app.state.auth.resolver().resolve_token(&token).is_ok());
}

#[tokio::test]
async fn logout_without_session_still_clears() {
    let app = TestApp::new();
    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/logout",
            &serde_json::json!({}),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_set_cookie(&res).unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn forgot_password_answers_the_same_for_unknown_email() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("known@example.com", PASSWORD, Some(Role::Investor));

    let unknown = app
        .send(json_request(
            "POST",
            "/api/v1/auth/forgot-password",
            &serde_json::json!({ "email": "nobody@example.com" }),
        ))
        .await;
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown = body_json(unknown).await;
    assert!(app.notifier.sent().is_empty());

    let known = app
        .send(json_request(
            "POST",
            "/api/v1/auth/forgot-password",
            &serde_json::json!({ "email": "Known@Example.com" }),
        ))
        .await;
    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(body_json(known).await, unknown);

    let sent = app.notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "known@example.com");
    assert!(sent[0].1.as_str().starts_with("http://localhost:3000/reset-password?token="));

    let stored = app.users.get(id).unwrap();
    let token = app.notifier.last_token().unwrap();
    let rid = app
        .state
        .auth
        .codec()
        .verify(&token)
        .unwrap()
        .claims
        .rid
        .unwrap();
    // Only the digest is stored.
    assert_eq!(stored.reset_token, Some(hash_reset_id(&rid)));
    assert_ne!(stored.reset_token, Some(rid));
    assert!(stored.reset_token_expires.unwrap() > Utc::now() + Duration::minutes(55));
}

async fn request_reset(app: &TestApp, email: &str) -> String {
    let before = app.notifier.sent().len();
    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/forgot-password",
            &serde_json::json!({ "email": email }),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    app.notifier.wait_for(before + 1).await;
    app.notifier.last_token().unwrap()
}

fn reset_request(token: &str, password: &str) -> axum::http::Request<axum::body::Body> {
    json_request(
        "POST",
        "/api/v1/auth/reset-password",
        &serde_json::json!({ "token": token, "password": password }),
    )
}

#[tokio::test]
async fn reset_password_once_then_token_is_spent() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let token = request_reset(&app, "investor@example.com").await;

    let res = app.send(reset_request(&token, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let stored = app.users.get(id).unwrap();
    assert!(password::verify(NEW_PASSWORD, &stored.password_hash));
    assert_eq!(stored.reset_token, None);
    assert_eq!(stored.reset_token_expires, None);

    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_body("investor@example.com", PASSWORD),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    app.login("investor@example.com", NEW_PASSWORD).await;

    // Same, still unexpired, token a second time.
    let res = app.send(reset_request(&token, "yet-another-password")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"]["code"], "INVALID_RESET_TOKEN");
    assert!(password::verify(
        NEW_PASSWORD,
        &app.users.get(id).unwrap().password_hash
    ));
}

#[tokio::test]
async fn newer_reset_request_invalidates_older_link() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let first = request_reset(&app, "investor@example.com").await;
    let second = request_reset(&app, "investor@example.com").await;
    assert_ne!(first, second);

    let res = app.send(reset_request(&first, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(password::verify(PASSWORD, &app.users.get(id).unwrap().password_hash));

    let res = app.send(reset_request(&second, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_stored_record_rejects_valid_token() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let token = request_reset(&app, "investor@example.com").await;

    let stored = app.users.get(id).unwrap();
    app.users.set_reset(
        id,
        stored.reset_token.as_deref(),
        Some(Utc::now() - Duration::seconds(1)),
    );

    let res = app.send(reset_request(&token, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(password::verify(PASSWORD, &app.users.get(id).unwrap().password_hash));
}

#[tokio::test]
async fn session_token_cannot_reset_password() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    request_reset(&app, "investor@example.com").await;

    let session = app
        .state
        .auth
        .codec()
        .issue(
            &Claims::session(id, "investor@example.com", Role::Investor),
            Duration::seconds(600),
        )
        .unwrap();

    let res = app.send(reset_request(&session, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"]["code"], "INVALID_RESET_TOKEN");
    assert!(app.users.get(id).unwrap().reset_token.is_some());
}

#[tokio::test]
async fn weak_new_password_keeps_reset_record() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let token = request_reset(&app, "investor@example.com").await;

    let res = app.send(reset_request(&token, "short")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"]["code"], "WEAK_PASSWORD");

    assert!(app.users.get(id).unwrap().reset_token.is_some());
    let res = app.send(reset_request(&token, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_token_is_rejected_as_session_cookie() {
    let app = TestApp::new();
    app.users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let token = request_reset(&app, "investor@example.com").await;

    let res = app.send(get("/api/v1/auth/session", Some(&token))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = app.send(get("/dashboard", Some(&token))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn store_failure_during_reset_is_a_server_error() {
    let app = TestApp::new();
    let id = app
        .users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    let token = request_reset(&app, "investor@example.com").await;

    app.users.set_offline(true);
    let res = app.send(reset_request(&token, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(res).await["error"]["code"], "INTERNAL_SERVER_ERROR");

    // The record survives and the link works once the store is back.
    app.users.set_offline(false);
    assert!(app.users.get(id).unwrap().reset_token.is_some());
    let res = app.send(reset_request(&token, NEW_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn store_failure_during_forgot_password_is_a_server_error() {
    let app = TestApp::new();
    app.users.set_offline(true);

    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/forgot-password",
            &serde_json::json!({ "email": "investor@example.com" }),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn store_failure_during_login_is_a_server_error() {
    let app = TestApp::new();
    app.users
        .insert("investor@example.com", PASSWORD, Some(Role::Investor));
    app.users.set_offline(true);

    let res = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            &login_body("investor@example.com", PASSWORD),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_set_cookie(&res).is_none());
}
