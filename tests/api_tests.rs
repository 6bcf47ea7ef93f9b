mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_register_login_and_logout() {
    let app = spawn_app().await;
    let (id, token) = app.register_and_login("alice").await;

    let (status, body) = app.call("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["is_subscribed"], false);
    assert!(body["data"].get("password").is_none());

    let (status, _) = app
        .call("POST", "/api/auth/token/logout/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The old token is rotated away
    let (status, _) = app.call("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicates_per_field() {
    let app = spawn_app().await;
    app.register_and_login("alice").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "other@example.com",
                "username": "alice",
                "first_name": "A",
                "last_name": "B",
                "password": "correct-horse"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["field"], "username");

    let (status, body) = app
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "alice@example.com",
                "username": "alice2",
                "first_name": "A",
                "last_name": "B",
                "password": "correct-horse"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn test_register_validates_fields() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "bob@example.com",
                "username": "bob smith",
                "first_name": "Bob",
                "last_name": "Smith",
                "password": "correct-horse"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "username");

    let (status, body) = app
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "bob@example.com",
                "username": "bob",
                "first_name": "Bob",
                "last_name": "Smith",
                "password": "short"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let app = spawn_app().await;
    app.register_and_login("alice").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_token_rejected_on_public_endpoint() {
    let app = spawn_app().await;

    let (status, _) = app.call("GET", "/api/recipes/", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("GET", "/api/recipes/", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/tags/")
                .header("Authorization", "Bearer nope")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Tags are read without an identity extractor
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_password() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(json!({ "current_password": "wrong", "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "current_password");

    let (status, _) = app
        .call(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(json!({ "current_password": "correct-horse", "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(json!({ "email": "alice@example.com", "password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_user_list_and_profile() {
    let app = spawn_app().await;
    let (alice, token) = app.register_and_login("alice").await;
    app.register_and_login("bob").await;

    let (status, body) = app.call("GET", "/api/users/?limit=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .call("GET", &format!("/api/users/{alice}/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    let (status, _) = app.call("GET", "/api/users/9999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscribe_flow() {
    let app = spawn_app().await;
    let (alice, alice_token) = app.register_and_login("alice").await;
    let (bob, bob_token) = app.register_and_login("bob").await;

    let flour = app.seed_ingredients(&[("flour", "g")]).await[0];
    app.create_recipe(&bob_token, "Bread", &[(flour, 500)], &[]).await;
    app.create_recipe(&bob_token, "Buns", &[(flour, 300)], &[]).await;

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/users/{bob}/subscribe/?recipes_limit=1"),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["is_subscribed"], true);
    assert_eq!(body["data"]["recipes_count"], 2);
    assert_eq!(body["data"]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["recipes"][0]["name"], "Buns");

    let (status, _) = app
        .call("POST", &format!("/api/users/{bob}/subscribe/"), Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call("GET", "/api/users/subscriptions/", Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["id"], bob);
    assert_eq!(body["data"]["results"][0]["recipes"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .call("GET", &format!("/api/users/{bob}/"), Some(&alice_token), None)
        .await;
    assert_eq!(body["data"]["is_subscribed"], true);

    let (status, _) = app
        .call("DELETE", &format!("/api/users/{bob}/subscribe/"), Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call("DELETE", &format!("/api/users/{bob}/subscribe/"), Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("POST", &format!("/api/users/{alice}/subscribe/"), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_self_follow_rejected() {
    let app = spawn_app().await;
    let (alice, token) = app.register_and_login("alice").await;

    let (status, body) = app
        .call("POST", &format!("/api/users/{alice}/subscribe/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .call("DELETE", &format!("/api/users/{alice}/subscribe/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("POST", "/api/users/9999/subscribe/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_rejected_on_authenticated_paths() {
    let app = spawn_app().await;

    for (method, uri) in [
        ("GET", "/api/users/me/"),
        ("GET", "/api/users/subscriptions/"),
        ("GET", "/api/recipes/download_shopping_cart/"),
        ("POST", "/api/recipes/1/favorite/"),
        ("DELETE", "/api/recipes/1/favorite/"),
        ("POST", "/api/recipes/1/shopping_cart/"),
        ("POST", "/api/users/1/subscribe/"),
    ] {
        let (status, body) = app.call(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_tags_and_ingredients() {
    let app = spawn_app().await;
    let breakfast = app.seed_tag("Breakfast", "breakfast").await;
    app.seed_tag("Dinner", "dinner").await;
    app.seed_ingredients(&[("Sugar", "g"), ("salt", "g"), ("sugar syrup", "ml")])
        .await;

    let (status, body) = app.call("GET", "/api/tags/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .call("GET", &format!("/api/tags/{breakfast}/"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "breakfast");
    assert_eq!(body["data"]["color"], "#49B64E");

    let (status, _) = app.call("GET", "/api/tags/9999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call("GET", "/api/ingredients/?name=sug", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sugar", "sugar syrup"]);

    let (_, body) = app.call("GET", "/api/ingredients/", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = spawn_app().await;
    let response = app.raw("GET", "/api/tags/", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_out_of_range_page_rejected() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;

    for uri in [
        "/api/recipes/?page=18446744073709551615",
        "/api/users/?page=9223372036854775807&limit=50",
        "/api/users/subscriptions/?page=18446744073709551615",
    ] {
        let (status, body) = app.call("GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["field"], "page");
    }

    // A far but representable page is simply empty
    let (status, body) = app
        .call("GET", "/api/recipes/?page=1000000", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"], json!([]));
}

#[tokio::test]
async fn test_ingredient_search_matches_wildcards_literally() {
    let app = spawn_app().await;
    app.seed_ingredients(&[("flour", "g"), ("eggs", "pcs"), ("100% juice", "ml")])
        .await;

    let names = |body: &serde_json::Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, body) = app.call("GET", "/api/ingredients/?name=%25", None, None).await;
    assert!(names(&body).is_empty());

    let (_, body) = app.call("GET", "/api/ingredients/?name=_l", None, None).await;
    assert!(names(&body).is_empty());

    let (_, body) = app
        .call("GET", "/api/ingredients/?name=100%25", None, None)
        .await;
    assert_eq!(names(&body), vec!["100% juice"]);
}

#[tokio::test]
async fn test_subscribe_rejects_non_positive_id() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;

    for (method, uri) in [
        ("POST", "/api/users/0/subscribe/"),
        ("DELETE", "/api/users/-3/subscribe/"),
    ] {
        let (status, _) = app.call(method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
    }
}
