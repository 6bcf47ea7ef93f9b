mod common;

use axum::http::{StatusCode, header};
use common::{recipe_body, spawn_app};
use foodgram::models::recipe::{IngredientAmount, RecipeRecord};
use http_body_util::BodyExt;
use serde_json::json;

#[tokio::test]
async fn test_create_and_get_recipe() {
    let app = spawn_app().await;
    let (alice, token) = app.register_and_login("alice").await;
    let tag = app.seed_tag("Breakfast", "breakfast").await;
    let ids = app.seed_ingredients(&[("flour", "g"), ("eggs", "pcs")]).await;

    let id = app
        .create_recipe(&token, "Pancakes", &[(ids[0], 200), (ids[1], 2)], &[tag])
        .await;

    let (status, body) = app
        .call("GET", &format!("/api/recipes/{id}/"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let recipe = &body["data"];
    assert_eq!(recipe["name"], "Pancakes");
    assert_eq!(recipe["cooking_time"], 20);
    assert_eq!(recipe["author"]["id"], alice);
    assert_eq!(recipe["tags"][0]["slug"], "breakfast");
    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(recipe["ingredients"][0]["name"], "flour");
    assert_eq!(recipe["ingredients"][0]["measurement_unit"], "g");
    assert_eq!(recipe["ingredients"][0]["amount"], 200);
    assert_eq!(recipe["is_favorited"], false);
    assert_eq!(recipe["is_in_shopping_cart"], false);
    assert!(recipe["image"].is_null());
}

#[tokio::test]
async fn test_create_recipe_requires_auth() {
    let app = spawn_app().await;
    let flour = app.seed_ingredients(&[("flour", "g")]).await[0];

    let (status, _) = app
        .call("POST", "/api/recipes/", None, Some(recipe_body("Bread", &[(flour, 1)], &[])))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_ingredient_persists_nothing() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let flour = app.seed_ingredients(&[("flour", "g")]).await[0];

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(recipe_body("Bread", &[(flour, 100), (flour, 50)], &[])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");

    let (_, body) = app.call("GET", "/api/recipes/", None, None).await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_invalid_amount_and_empty_ingredients() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let flour = app.seed_ingredients(&[("flour", "g")]).await[0];

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(recipe_body("Bread", &[(flour, 0)], &[])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");

    let (status, body) = app
        .call("POST", "/api/recipes/", Some(&token), Some(recipe_body("Bread", &[], &[])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");
}

#[tokio::test]
async fn test_unknown_references_and_duplicate_tags() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let flour = app.seed_ingredients(&[("flour", "g")]).await[0];
    let tag = app.seed_tag("Lunch", "lunch").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(recipe_body("Bread", &[(flour, 1)], &[tag, tag])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "tags");

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(recipe_body("Bread", &[(9999, 1)], &[])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");

    let (status, body) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&token),
            Some(recipe_body("Bread", &[(flour, 1)], &[9999])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "tags");
}

#[tokio::test]
async fn test_duplicate_recipe_name_is_per_author() {
    let app = spawn_app().await;
    let (_, alice) = app.register_and_login("alice").await;
    let (_, bob) = app.register_and_login("bob").await;
    let flour = app.seed_ingredients(&[("flour", "g")]).await[0];

    app.create_recipe(&alice, "Bread", &[(flour, 500)], &[]).await;

    let (status, _) = app
        .call(
            "POST",
            "/api/recipes/",
            Some(&alice),
            Some(recipe_body("Bread", &[(flour, 400)], &[])),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Another author may reuse the name
    app.create_recipe(&bob, "Bread", &[(flour, 400)], &[]).await;
}

#[tokio::test]
async fn test_update_replaces_ingredient_set() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let ids = app.seed_ingredients(&[("X", "g"), ("Y", "pcs")]).await;
    let (x, y) = (ids[0], ids[1]);

    let id = app.create_recipe(&token, "Soup", &[(x, 10)], &[]).await;

    for method in ["PUT", "PATCH"] {
        let (status, body) = app
            .call(
                method,
                &format!("/api/recipes/{id}/"),
                Some(&token),
                Some(recipe_body("Soup", &[(y, 5)], &[])),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{method}: {body}");

        let ingredients = body["data"]["ingredients"].as_array().unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0]["id"], y);
        assert_eq!(ingredients[0]["amount"], 5);
    }

    let (_, body) = app
        .call("GET", &format!("/api/recipes/{id}/"), None, None)
        .await;
    assert_eq!(body["data"]["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["ingredients"][0]["name"], "Y");
}

#[tokio::test]
async fn test_failed_update_keeps_previous_contents() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];

    let id = app.create_recipe(&token, "Soup", &[(x, 10)], &[]).await;

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/recipes/{id}/"),
            Some(&token),
            Some(recipe_body("Soup", &[(9999, 5)], &[])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .call("GET", &format!("/api/recipes/{id}/"), None, None)
        .await;
    assert_eq!(body["data"]["ingredients"][0]["amount"], 10);
}

#[tokio::test]
async fn test_update_rolls_back_when_link_insert_fails() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let breakfast = app.seed_tag("Breakfast", "breakfast").await;
    let dinner = app.seed_tag("Dinner", "dinner").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];

    let id = app.create_recipe(&token, "Soup", &[(x, 10)], &[breakfast]).await;

    // Ingredient 9999 violates the foreign key after the old links are cleared
    let record = RecipeRecord {
        name: "Renamed".to_string(),
        text: "Other text".to_string(),
        cooking_time: 5,
        image: None,
        tags: vec![dinner],
        ingredients: vec![IngredientAmount { id: 9999, amount: 1 }],
    };
    assert!(app.store.update_recipe(id, &record).await.is_err());

    let recipe = app.store.get_recipe(id).await.unwrap().unwrap();
    assert_eq!(recipe.name, "Soup");
    assert_eq!(recipe.cooking_time, 20);

    let tags = app.store.tags_for_recipes(&[id]).await.unwrap();
    let slugs: Vec<&str> = tags[&id].iter().map(|t| t.slug.as_str()).collect();
    assert_eq!(slugs, vec!["breakfast"]);

    let lines = app.store.ingredient_lines_for_recipes(&[id]).await.unwrap();
    assert_eq!(lines[&id].len(), 1);
    assert_eq!(lines[&id][0].id, x);
    assert_eq!(lines[&id][0].amount, 10);
}

#[tokio::test]
async fn test_only_author_may_modify() {
    let app = spawn_app().await;
    let (_, alice) = app.register_and_login("alice").await;
    let (_, bob) = app.register_and_login("bob").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];

    let id = app.create_recipe(&alice, "Soup", &[(x, 10)], &[]).await;

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/recipes/{id}/"),
            Some(&bob),
            Some(recipe_body("Stolen", &[(x, 1)], &[])),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("DELETE", &format!("/api/recipes/{id}/"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob's cart entry goes away with the recipe
    let (status, _) = app
        .call("POST", &format!("/api/recipes/{id}/shopping_cart/"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call("DELETE", &format!("/api/recipes/{id}/"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call("GET", &format!("/api/recipes/{id}/"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("DELETE", &format!("/api/recipes/{id}/"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app
        .raw("GET", "/api/recipes/download_shopping_cart/", Some(&bob), None)
        .await;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], "\u{feff}".as_bytes());
}

#[tokio::test]
async fn test_favorite_toggle() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];
    let id = app.create_recipe(&token, "Soup", &[(x, 10)], &[]).await;

    let (status, _) = app
        .call("DELETE", &format!("/api/recipes/{id}/favorite/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("POST", &format!("/api/recipes/{id}/favorite/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["name"], "Soup");
    assert_eq!(body["data"]["cooking_time"], 20);
    assert!(body["data"].get("text").is_none());

    let (status, _) = app
        .call("POST", &format!("/api/recipes/{id}/favorite/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app
        .call("GET", &format!("/api/recipes/{id}/"), Some(&token), None)
        .await;
    assert_eq!(body["data"]["is_favorited"], true);
    assert_eq!(body["data"]["is_in_shopping_cart"], false);

    let (status, _) = app
        .call("DELETE", &format!("/api/recipes/{id}/favorite/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call("POST", "/api/recipes/9999/favorite/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shopping_list_export_sums_amounts() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let ids = app.seed_ingredients(&[("X", "g"), ("Y", "pcs")]).await;
    let (x, y) = (ids[0], ids[1]);

    let a = app.create_recipe(&token, "A", &[(x, 100), (y, 2)], &[]).await;
    let b = app.create_recipe(&token, "B", &[(x, 50)], &[]).await;

    for id in [a, b] {
        let (status, _) = app
            .call("POST", &format!("/api/recipes/{id}/shopping_cart/"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = app
        .raw("GET", "/api/recipes/download_shopping_cart/", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Shoppinglist.csv\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text, "\u{feff}X,g,150\r\nY,pcs,2\r\n");
}

#[tokio::test]
async fn test_cart_toggle_conflicts() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];
    let id = app.create_recipe(&token, "Soup", &[(x, 10)], &[]).await;

    let uri = format!("/api/recipes/{id}/shopping_cart/");
    assert_eq!(app.call("POST", &uri, Some(&token), None).await.0, StatusCode::CREATED);
    assert_eq!(app.call("POST", &uri, Some(&token), None).await.0, StatusCode::CONFLICT);
    assert_eq!(app.call("DELETE", &uri, Some(&token), None).await.0, StatusCode::NO_CONTENT);
    assert_eq!(app.call("DELETE", &uri, Some(&token), None).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters() {
    let app = spawn_app().await;
    let (alice, alice_token) = app.register_and_login("alice").await;
    let (_, bob_token) = app.register_and_login("bob").await;
    let breakfast = app.seed_tag("Breakfast", "breakfast").await;
    let dinner = app.seed_tag("Dinner", "dinner").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];

    let eggs = app.create_recipe(&alice_token, "Eggs", &[(x, 1)], &[breakfast]).await;
    let stew = app.create_recipe(&alice_token, "Stew", &[(x, 1)], &[dinner]).await;
    let toast = app.create_recipe(&bob_token, "Toast", &[(x, 1)], &[breakfast]).await;

    let ids = |body: &serde_json::Value| -> Vec<i64> {
        body["data"]["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    };

    // Newest first
    let (_, body) = app.call("GET", "/api/recipes/", None, None).await;
    assert_eq!(ids(&body), vec![i64::from(toast), i64::from(stew), i64::from(eggs)]);

    let (_, body) = app
        .call("GET", &format!("/api/recipes/?author={alice}"), None, None)
        .await;
    assert_eq!(ids(&body), vec![i64::from(stew), i64::from(eggs)]);

    let (status, body) = app.call("GET", "/api/recipes/?author=alice", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "author");

    let (_, body) = app
        .call("GET", "/api/recipes/?tags=breakfast", None, None)
        .await;
    assert_eq!(ids(&body), vec![i64::from(toast), i64::from(eggs)]);

    let (_, body) = app
        .call("GET", "/api/recipes/?tags=breakfast&tags=dinner", None, None)
        .await;
    assert_eq!(body["data"]["count"], 3);

    app.call("POST", &format!("/api/recipes/{stew}/favorite/"), Some(&bob_token), None)
        .await;

    let (_, body) = app
        .call("GET", "/api/recipes/?is_favorited=1", Some(&bob_token), None)
        .await;
    assert_eq!(ids(&body), vec![i64::from(stew)]);
    assert_eq!(body["data"]["results"][0]["is_favorited"], true);

    // No-op for anonymous callers
    let (_, body) = app.call("GET", "/api/recipes/?is_favorited=1", None, None).await;
    assert_eq!(body["data"]["count"], 3);

    let (_, body) = app
        .call("GET", "/api/recipes/?is_in_shopping_cart=1", Some(&bob_token), None)
        .await;
    assert_eq!(body["data"]["count"], 0);

    let (_, body) = app.call("GET", "/api/recipes/?limit=2&page=2", None, None).await;
    assert_eq!(ids(&body), vec![i64::from(eggs)]);
    assert_eq!(body["data"]["total_pages"], 2);
}

#[tokio::test]
async fn test_recipe_image_lifecycle() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];

    let mut body = recipe_body("Picture", &[(x, 1)], &[]);
    body["image"] = json!("data:image/png;base64,iVBORw0KGgo=");

    let (status, created) = app.call("POST", "/api/recipes/", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let url = created["data"]["image"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/recipes/"));
    assert!(url.ends_with(".png"));
    let file = app.media_path.join(url.trim_start_matches("/media/"));
    assert!(file.exists());

    let response = app.raw("GET", &url, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Update without an image keeps the stored one
    let id = created["data"]["id"].as_i64().unwrap();
    let (_, updated) = app
        .call(
            "PUT",
            &format!("/api/recipes/{id}/"),
            Some(&token),
            Some(recipe_body("Picture", &[(x, 2)], &[])),
        )
        .await;
    assert_eq!(updated["data"]["image"], url.as_str());

    let (status, _) = app
        .call("DELETE", &format!("/api/recipes/{id}/"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!file.exists());
}

#[tokio::test]
async fn test_invalid_image_rejected() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("alice").await;
    let x = app.seed_ingredients(&[("X", "g")]).await[0];

    let mut body = recipe_body("Picture", &[(x, 1)], &[]);
    body["image"] = json!("https://example.com/cat.png");

    let (status, body) = app.call("POST", "/api/recipes/", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "image");
}
