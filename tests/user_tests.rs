// SPDX-License-Identifier: MIT

//! Registration, authentication and profile endpoints.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{body_json, create_test_app, request, seed_user, send, PNG_URI, TEST_PASSWORD};

#[tokio::test]
async fn test_register_returns_201_with_profile_fields() {
    let (app, _state) = create_test_app().await;

    let payload = json!({
        "email": "vasya@example.org",
        "username": "vasya",
        "first_name": "Вася",
        "last_name": "Иванов",
        "password": "s3cret-pass",
    });
    let response = send(&app, request("POST", "/api/users/", None, Some(&payload))).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "vasya@example.org");
    assert_eq!(body["username"], "vasya");
    assert_eq!(body["first_name"], "Вася");
    assert_eq!(body["last_name"], "Иванов");
    assert!(body["id"].is_i64());
    assert!(body.get("password").is_none());
    assert!(body.get("is_subscribed").is_none());
}

#[tokio::test]
async fn test_register_missing_fields_lists_every_field() {
    let (app, _state) = create_test_app().await;

    let response = send(&app, request("POST", "/api/users/", None, Some(&json!({})))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert!(body.get(field).is_some(), "missing error for `{field}`");
    }
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (app, _state) = create_test_app().await;

    let payload = json!({
        "email": "not-an-email",
        "username": "vasya",
        "first_name": "Вася",
        "last_name": "Иванов",
        "password": "s3cret-pass",
    });
    let response = send(&app, request("POST", "/api/users/", None, Some(&payload))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("email").is_some());
}

#[tokio::test]
async fn test_register_duplicate_email_is_field_error() {
    let (app, state) = create_test_app().await;
    seed_user(&state, "vasya").await;

    let payload = json!({
        "email": "vasya@example.org",
        "username": "drugoj",
        "first_name": "Вася",
        "last_name": "Иванов",
        "password": "s3cret-pass",
    });
    let response = send(&app, request("POST", "/api/users/", None, Some(&payload))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["email"][0],
        "Пользователь с таким адресом электронной почты уже существует."
    );
}

#[tokio::test]
async fn test_login_issues_and_reuses_token() {
    let (app, state) = create_test_app().await;
    let (user, _token) = seed_user(&state, "vasya").await;

    let credentials = json!({"email": user.email, "password": TEST_PASSWORD});
    let response = send(
        &app,
        request("POST", "/api/auth/token/login/", None, Some(&credentials)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    let key = first["auth_token"].as_str().unwrap().to_string();
    assert!(!key.is_empty());

    let response = send(
        &app,
        request("POST", "/api/auth/token/login/", None, Some(&credentials)),
    )
    .await;
    let second = body_json(response).await;
    assert_eq!(second["auth_token"], key.as_str());
}

#[tokio::test]
async fn test_login_with_bad_credentials_is_400() {
    let (app, state) = create_test_app().await;
    let (user, _token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(&json!({"email": user.email, "password": "wrong"})),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["non_field_errors"][0],
        "Невозможно войти с предоставленными учетными данными."
    );
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let (app, state) = create_test_app().await;
    let (_user, token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request("POST", "/api/auth/token/logout/", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The revoked key is now an invalid token everywhere
    let response = send(&app, request("GET", "/api/users/me/", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_requires_auth() {
    let (app, _state) = create_test_app().await;
    let response = send(&app, request("POST", "/api/auth/token/logout/", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_auth() {
    let (app, state) = create_test_app().await;
    let (_user, token) = seed_user(&state, "vasya").await;

    let response = send(&app, request("GET", "/api/users/me/", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request("GET", "/api/users/me/", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "vasya");
    assert_eq!(body["is_subscribed"], false);
}

#[tokio::test]
async fn test_unknown_token_is_rejected_even_on_public_routes() {
    let (app, _state) = create_test_app().await;
    let response = send(
        &app,
        request("GET", "/api/recipes/", Some("deadbeef"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Недопустимый токен.");
}

#[tokio::test]
async fn test_user_detail_and_not_found() {
    let (app, state) = create_test_app().await;
    let (user, _token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request("GET", &format!("/api/users/{}/", user.id), None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "vasya");
    assert_eq!(body["is_subscribed"], false);
    assert!(body["avatar"].is_null());

    let response = send(&app, request("GET", "/api/users/1000000/", None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Пользователь не найден.");
}

#[tokio::test]
async fn test_user_list_paginates_at_six_by_default() {
    let (app, state) = create_test_app().await;
    for i in 0..7 {
        seed_user(&state, &format!("user{i}")).await;
    }

    let response = send(&app, request("GET", "/api/users/", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 7);
    assert_eq!(body["results"].as_array().unwrap().len(), 6);
    assert!(body["next"].is_string());
    assert!(body["previous"].is_null());

    let response = send(&app, request("GET", "/api/users/?limit=2&page=2", None, None)).await;
    let body = body_json(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["previous"].is_string());
}

#[tokio::test]
async fn test_set_password_flow() {
    let (app, state) = create_test_app().await;
    let (user, token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(&json!({"current_password": "wrong", "new_password": "brand-new-pass"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["current_password"][0], "Неверный текущий пароль.");

    let response = send(
        &app,
        request(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(&json!({
                "current_password": TEST_PASSWORD,
                "new_password": "brand-new-pass",
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The new password is live
    let response = send(
        &app,
        request(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(&json!({"email": user.email, "password": "brand-new-pass"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_password_missing_fields() {
    let (app, state) = create_test_app().await;
    let (_user, token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(&json!({})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("current_password").is_some());
    assert!(body.get("new_password").is_some());
}

#[tokio::test]
async fn test_avatar_set_and_remove() {
    let (app, state) = create_test_app().await;
    let (_user, token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request(
            "PUT",
            "/api/users/me/avatar/",
            Some(&token),
            Some(&json!({"avatar": PNG_URI})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let avatar_url = body["avatar"].as_str().unwrap();
    assert!(avatar_url.starts_with("http://testserver/media/users/"));

    let response = send(&app, request("GET", "/api/users/me/", Some(&token), None)).await;
    let body = body_json(response).await;
    assert_eq!(body["avatar"], avatar_url);

    let response = send(
        &app,
        request("DELETE", "/api/users/me/avatar/", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("GET", "/api/users/me/", Some(&token), None)).await;
    let body = body_json(response).await;
    assert!(body["avatar"].is_null());
}

#[tokio::test]
async fn test_avatar_payload_validation() {
    let (app, state) = create_test_app().await;
    let (_user, token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request("PUT", "/api/users/me/avatar/", Some(&token), Some(&json!({}))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["avatar"][0], "Обязательное поле.");

    let response = send(
        &app,
        request(
            "PUT",
            "/api/users/me/avatar/",
            Some(&token),
            Some(&json!({"avatar": ""})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["avatar"][0], "Поле для картинки не может быть пустым.");

    let response = send(
        &app,
        request(
            "PUT",
            "/api/users/me/avatar/",
            Some(&token),
            Some(&json!({"avatar": "not base64"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["avatar"][0], "Неверный формат изображения.");
}

#[tokio::test]
async fn test_avatar_requires_auth() {
    let (app, _state) = create_test_app().await;
    let response = send(
        &app,
        request(
            "PUT",
            "/api/users/me/avatar/",
            None,
            Some(&json!({"avatar": PNG_URI})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Учетные данные не были предоставлены.");
}
