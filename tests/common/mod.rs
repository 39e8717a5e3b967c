//! In-process stand-in for the recipes backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;

use recipebox::models::{Credentials, Recipe, RecipeParams};

pub const PASSWORD: &str = "secret";
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

#[derive(Default)]
pub struct Backend {
    /// Recipes per account email.
    pub recipes: HashMap<String, Vec<Recipe>>,
    /// Every Authorization header seen on recipe endpoints.
    pub auth_headers: Vec<Option<String>>,
    pub image_hits: HashMap<String, usize>,
    /// Answer every recipe request with 401.
    pub expired: bool,
    /// Answer GET /recipes with a body that is not JSON.
    pub garbage: bool,
    next_id: u64,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeServer {
    pub base_url: String,
    pub origin: String,
    pub backend: Shared,
}

impl FakeServer {
    pub async fn start() -> Self {
        let backend: Shared = Arc::default();
        let app = Router::new()
            .route("/api/v1/auth/signin", post(sign_in))
            .route("/api/v1/auth/signup", post(sign_up))
            .route("/api/v1/recipes", get(list_recipes).post(add_recipe))
            .route("/api/v1/recipes/{id}", put(edit_recipe).delete(delete_recipe))
            .route("/images/{name}", get(image))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let origin = format!("http://{addr}");
        Self {
            base_url: format!("{origin}/api/v1/"),
            origin,
            backend,
        }
    }

    pub fn image_url(&self, name: &str) -> String {
        format!("{}/images/{name}", self.origin)
    }

    pub fn seed(&self, email: &str, recipes: Vec<Recipe>) {
        self.backend
            .lock()
            .unwrap()
            .recipes
            .insert(email.to_string(), recipes);
    }

    pub fn recipes_of(&self, email: &str) -> Vec<Recipe> {
        self.backend
            .lock()
            .unwrap()
            .recipes
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    pub fn image_hits(&self, name: &str) -> usize {
        let path = format!("/images/{name}");
        self.backend
            .lock()
            .unwrap()
            .image_hits
            .get(&path)
            .copied()
            .unwrap_or(0)
    }

    pub fn expire_sessions(&self) {
        self.backend.lock().unwrap().expired = true;
    }

    pub fn last_auth_header(&self) -> Option<String> {
        self.backend
            .lock()
            .unwrap()
            .auth_headers
            .last()
            .cloned()
            .flatten()
    }
}

fn token_for(email: &str) -> String {
    format!("tok-{email}")
}

/// Resolve the bearer token to an account, recording the header.
fn caller(backend: &mut Backend, headers: &HeaderMap) -> Result<String, Response> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.auth_headers.push(auth.clone());

    if backend.expired {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    }
    auth.as_deref()
        .and_then(|v| v.strip_prefix("Bearer tok-"))
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
}

async fn sign_in(Json(credentials): Json<Credentials>) -> Response {
    if credentials.password != PASSWORD {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "authToken": token_for(&credentials.email) })).into_response()
}

async fn sign_up(State(backend): State<Shared>, Json(credentials): Json<Credentials>) -> Response {
    let mut backend = backend.lock().unwrap();
    if backend.recipes.contains_key(&credentials.email) {
        return StatusCode::CONFLICT.into_response();
    }
    backend.recipes.insert(credentials.email, Vec::new());
    backend.next_id += 1;
    Json(json!({ "id": format!("user-{}", backend.next_id) })).into_response()
}

async fn list_recipes(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = backend.lock().unwrap();
    let email = match caller(&mut backend, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    if backend.garbage {
        return "definitely not json".into_response();
    }
    let recipes = backend.recipes.get(&email).cloned().unwrap_or_default();
    Json(json!({ "recipes": recipes })).into_response()
}

async fn add_recipe(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(params): Json<RecipeParams>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    let email = match caller(&mut backend, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    backend.next_id += 1;
    let id = format!("r{}", backend.next_id);
    backend
        .recipes
        .entry(email)
        .or_default()
        .push(Recipe::from_params(&params, id.clone()));
    Json(json!({ "id": id })).into_response()
}

async fn edit_recipe(
    State(backend): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(params): Json<RecipeParams>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    let email = match caller(&mut backend, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    let recipes = backend.recipes.entry(email).or_default();
    match recipes.iter_mut().find(|r| r.id == id) {
        Some(recipe) => {
            *recipe = Recipe::from_params(&params, id.clone());
            Json(json!({ "id": id })).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_recipe(
    State(backend): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut backend = backend.lock().unwrap();
    let email = match caller(&mut backend, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    let recipes = backend.recipes.entry(email).or_default();
    let before = recipes.len();
    recipes.retain(|r| r.id != id);
    if recipes.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::OK.into_response()
}

async fn image(State(backend): State<Shared>, Path(name): Path<String>) -> Response {
    let mut backend = backend.lock().unwrap();
    *backend
        .image_hits
        .entry(format!("/images/{name}"))
        .or_default() += 1;

    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => ([(header::CONTENT_TYPE, "image/png")], PNG).into_response(),
        Some("html") => ([(header::CONTENT_TYPE, "text/html")], "<html></html>").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
