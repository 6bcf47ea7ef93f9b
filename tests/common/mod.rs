#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use foodgram::config::Config;
use foodgram::db::Store;
use foodgram::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub media_path: PathBuf,
}

/// App backed by a fresh temp-file database and media directory.
pub async fn spawn_app() -> TestApp {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("foodgram-test-{id}.db"));
    let media_path = std::env::temp_dir().join(format!("foodgram-test-media-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.media_path = media_path.display().to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let shared = SharedState::new(config)
        .await
        .expect("Failed to create shared state");
    let store = shared.store.clone();
    let state = foodgram::api::create_app_state(Arc::new(shared), None);

    TestApp {
        router: foodgram::api::router(state),
        store,
        media_path,
    }
}

impl TestApp {
    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_string(&value).unwrap())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Send a request and decode the JSON body (`Null` when empty).
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Register `username` and log in. Returns `(user id, token)`.
    pub async fn register_and_login(&self, username: &str) -> (i32, String) {
        let email = format!("{username}@example.com");

        let (status, body) = self
            .call(
                "POST",
                "/api/users/",
                None,
                Some(json!({
                    "email": email,
                    "username": username,
                    "first_name": "Test",
                    "last_name": "Cook",
                    "password": "correct-horse"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

        let (status, body) = self
            .call(
                "POST",
                "/api/auth/token/login/",
                None,
                Some(json!({ "email": email, "password": "correct-horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {body}");

        (id, body["data"]["auth_token"].as_str().unwrap().to_string())
    }

    /// Seed ingredients and return their ids in input order.
    pub async fn seed_ingredients(&self, items: &[(&str, &str)]) -> Vec<i32> {
        let owned: Vec<(String, String)> = items
            .iter()
            .map(|(n, u)| ((*n).to_string(), (*u).to_string()))
            .collect();
        self.store.import_ingredients(&owned).await.unwrap();

        let all = self.store.search_ingredients(None).await.unwrap();
        items
            .iter()
            .map(|(n, u)| {
                all.iter()
                    .find(|i| i.name == *n && i.measurement_unit == *u)
                    .map(|i| i.id)
                    .unwrap()
            })
            .collect()
    }

    pub async fn seed_tag(&self, name: &str, slug: &str) -> i32 {
        self.store.create_tag(name, "#49B64E", slug).await.unwrap().id
    }

    /// Create a recipe through the API and return its id.
    pub async fn create_recipe(
        &self,
        token: &str,
        name: &str,
        ingredients: &[(i32, i32)],
        tags: &[i32],
    ) -> i32 {
        let (status, body) = self
            .call("POST", "/api/recipes/", Some(token), Some(recipe_body(name, ingredients, tags)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
    }
}

pub fn recipe_body(name: &str, ingredients: &[(i32, i32)], tags: &[i32]) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and cook.",
        "cooking_time": 20,
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
    })
}
