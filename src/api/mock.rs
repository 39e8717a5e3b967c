use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{DownloadedImage, RecipeApi};
use crate::error::{ClientError, ClientResult};
use crate::models::{Credentials, Recipe, RecipeParams};

/// Operations a [`MockApi`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SignIn,
    SignUp,
    GetAll,
    Add,
    Edit,
    Delete,
    DownloadImage,
}

/// Failure a [`MockApi`] reports for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Response(StatusCode),
    Authentication,
    Decoding,
}

impl From<MockFailure> for ClientError {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::Response(status) => ClientError::Response(status),
            MockFailure::Authentication => ClientError::Authentication,
            MockFailure::Decoding => ClientError::Decoding,
        }
    }
}

#[derive(Default)]
struct MockState {
    recipes: Vec<Recipe>,
    images: HashMap<String, Bytes>,
    failures: HashMap<Op, MockFailure>,
    calls: HashMap<Op, usize>,
    next_id: u64,
}

/// In-memory backend for tests. Behaves like a well-formed server holding a
/// single account's recipes unless an operation is set to fail.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        let api = Self::new();
        api.set_recipes(recipes);
        api
    }

    pub fn set_recipes(&self, recipes: Vec<Recipe>) {
        self.state.lock().unwrap().recipes = recipes;
    }

    pub fn recipes(&self) -> Vec<Recipe> {
        self.state.lock().unwrap().recipes.clone()
    }

    pub fn set_image(&self, url: &str, data: impl Into<Bytes>) {
        self.state
            .lock()
            .unwrap()
            .images
            .insert(url.to_string(), data.into());
    }

    pub fn fail(&self, op: Op, failure: MockFailure) {
        self.state.lock().unwrap().failures.insert(op, failure);
    }

    pub fn succeed(&self, op: Op) {
        self.state.lock().unwrap().failures.remove(&op);
    }

    /// Number of times `op` has been invoked, failures included.
    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    fn begin(&self, op: Op) -> ClientResult<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(op).or_default() += 1;
        match state.failures.get(&op) {
            Some(failure) => Err((*failure).into()),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl RecipeApi for MockApi {
    async fn sign_in(&self, credentials: &Credentials) -> ClientResult<String> {
        let _guard = self.begin(Op::SignIn)?;
        Ok(format!("token-for-{}", credentials.email))
    }

    async fn sign_up(&self, _credentials: &Credentials) -> ClientResult<Option<String>> {
        let mut state = self.begin(Op::SignUp)?;
        state.next_id += 1;
        Ok(Some(format!("user-{}", state.next_id)))
    }

    async fn get_all_recipes(&self) -> ClientResult<Vec<Recipe>> {
        let state = self.begin(Op::GetAll)?;
        Ok(state.recipes.clone())
    }

    async fn add_recipe(&self, params: &RecipeParams) -> ClientResult<String> {
        let mut state = self.begin(Op::Add)?;
        state.next_id += 1;
        let id = format!("mock-{}", state.next_id);
        state.recipes.push(Recipe::from_params(params, id.clone()));
        Ok(id)
    }

    async fn edit_recipe(&self, params: &RecipeParams, id: &str) -> ClientResult<String> {
        let mut state = self.begin(Op::Edit)?;
        match state.recipes.iter_mut().find(|r| r.id == id) {
            Some(recipe) => {
                *recipe = Recipe::from_params(params, id);
                Ok(id.to_string())
            }
            None => Err(ClientError::Response(StatusCode::NOT_FOUND)),
        }
    }

    async fn delete_recipe(&self, id: &str) -> ClientResult<()> {
        let mut state = self.begin(Op::Delete)?;
        let before = state.recipes.len();
        state.recipes.retain(|r| r.id != id);
        if state.recipes.len() == before {
            return Err(ClientError::Response(StatusCode::NOT_FOUND));
        }
        Ok(())
    }

    async fn download_image(&self, url: &str) -> ClientResult<DownloadedImage> {
        let state = self.begin(Op::DownloadImage)?;
        let data = state
            .images
            .get(url)
            .cloned()
            .ok_or(ClientError::Response(StatusCode::NOT_FOUND))?;
        DownloadedImage::from_bytes(url, data)
    }
}
