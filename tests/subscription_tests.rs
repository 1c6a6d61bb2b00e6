// SPDX-License-Identifier: MIT

//! Subscription toggles and the subscriptions listing.

use axum::http::StatusCode;

mod common;

use common::{
    body_json, create_test_app, request, seed_ingredient, seed_recipe, seed_tag, seed_user, send,
};

#[tokio::test]
async fn test_subscribe_returns_author_with_recipes() {
    let (app, state) = create_test_app().await;
    let (_follower, token) = seed_user(&state, "follower").await;
    let (author, _token) = seed_user(&state, "author").await;

    let tag = seed_tag(&state, "Завтрак", "breakfast").await;
    let flour = seed_ingredient(&state, "Мука", "г").await;
    seed_recipe(&state, &author, "Блины", &[tag.id], &[(flour.id, 500)]).await;

    let response = send(
        &app,
        request(
            "POST",
            &format!("/api/users/{}/subscribe/", author.id),
            Some(&token),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], author.id);
    assert_eq!(body["email"], author.email);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 1);
    let recipes = body["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["name"], "Блины");
    for field in ["id", "name", "image", "cooking_time"] {
        assert!(recipes[0].get(field).is_some(), "missing `{field}`");
    }
}

#[tokio::test]
async fn test_self_subscription_always_rejected() {
    let (app, state) = create_test_app().await;
    let (user, token) = seed_user(&state, "vasya").await;

    for _ in 0..2 {
        let response = send(
            &app,
            request(
                "POST",
                &format!("/api/users/{}/subscribe/", user.id),
                Some(&token),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Нельзя подписаться на самого себя.");
    }
}

#[tokio::test]
async fn test_duplicate_subscription_rejected() {
    let (app, state) = create_test_app().await;
    let (_follower, token) = seed_user(&state, "follower").await;
    let (author, _token) = seed_user(&state, "author").await;
    let uri = format!("/api/users/{}/subscribe/", author.id);

    let response = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Вы уже подписаны на этого пользователя.");
}

#[tokio::test]
async fn test_unsubscribe_transitions() {
    let (app, state) = create_test_app().await;
    let (_follower, token) = seed_user(&state, "follower").await;
    let (author, _token) = seed_user(&state, "author").await;
    let uri = format!("/api/users/{}/subscribe/", author.id);

    // Removing an absent subscription is a 400, never a 204
    let response = send(&app, request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Подписка не найдена.");

    send(&app, request("POST", &uri, Some(&token), None)).await;

    let response = send(&app, request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscribe_unknown_author_is_404() {
    let (app, state) = create_test_app().await;
    let (_user, token) = seed_user(&state, "vasya").await;

    let response = send(
        &app,
        request("POST", "/api/users/1000000/subscribe/", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Пользователь не найден.");
}

#[tokio::test]
async fn test_subscribe_anonymous_is_401_even_for_unknown_author() {
    let (app, _state) = create_test_app().await;

    // Credentials are checked before target existence
    let response = send(
        &app,
        request("POST", "/api/users/1000000/subscribe/", None, None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_subscriptions_listing_honors_recipes_limit() {
    let (app, state) = create_test_app().await;
    let (_follower, token) = seed_user(&state, "follower").await;
    let (author, _token) = seed_user(&state, "author").await;

    let tag = seed_tag(&state, "Обед", "lunch").await;
    let salt = seed_ingredient(&state, "Соль", "г").await;
    for i in 0..3 {
        seed_recipe(&state, &author, &format!("Рецепт {i}"), &[tag.id], &[(salt.id, 1)]).await;
    }
    send(
        &app,
        request(
            "POST",
            &format!("/api/users/{}/subscribe/", author.id),
            Some(&token),
            None,
        ),
    )
    .await;

    let response = send(
        &app,
        request(
            "GET",
            "/api/users/subscriptions/?recipes_limit=2",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    let entry = &body["results"][0];
    assert_eq!(entry["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(entry["recipes_count"], 3);

    // An unparseable limit is ignored and everything comes back
    let response = send(
        &app,
        request(
            "GET",
            "/api/users/subscriptions/?recipes_limit=abc",
            Some(&token),
            None,
        ),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["results"][0]["recipes"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_subscriptions_listing_requires_auth() {
    let (app, _state) = create_test_app().await;
    let response = send(&app, request("GET", "/api/users/subscriptions/", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
