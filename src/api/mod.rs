//! Client for the recipes REST backend.
//!
//! Everything that talks to the network goes through [`RecipeApi`] so the
//! manager, the image cache and the screens can be exercised against
//! [`MockApi`] in tests.

mod http;
mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;

use crate::error::{ClientError, ClientResult};
use crate::models::{Credentials, Recipe, RecipeParams};

pub use http::HttpRecipeApi;
pub use mock::{MockApi, MockFailure, Op};

/// Image formats the app can display.
pub const ALLOWED_IMAGE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// A downloaded image together with its cache cost.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub url: String,
    pub data: Bytes,
    pub format: ImageFormat,
}

impl DownloadedImage {
    /// Validate `data` as a displayable image.
    pub fn from_bytes(url: impl Into<String>, data: Bytes) -> ClientResult<Self> {
        let format = image::guess_format(&data).map_err(|_| ClientError::Decoding)?;
        if !ALLOWED_IMAGE_FORMATS.contains(&format) {
            return Err(ClientError::Decoding);
        }
        Ok(Self {
            url: url.into(),
            data,
            format,
        })
    }

    pub fn cost(&self) -> usize {
        self.data.len()
    }
}

/// Supplies the bearer token for recipe endpoints at request time.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token, handy for one-off tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// Returns the bearer token for the account.
    async fn sign_in(&self, credentials: &Credentials) -> ClientResult<String>;

    /// Returns the id of the created account when the server sends one.
    async fn sign_up(&self, credentials: &Credentials) -> ClientResult<Option<String>>;

    async fn get_all_recipes(&self) -> ClientResult<Vec<Recipe>>;

    /// Returns the server-assigned id.
    async fn add_recipe(&self, params: &RecipeParams) -> ClientResult<String>;

    /// Returns the id the server echoes back.
    async fn edit_recipe(&self, params: &RecipeParams, id: &str) -> ClientResult<String>;

    async fn delete_recipe(&self, id: &str) -> ClientResult<()>;

    async fn download_image(&self, url: &str) -> ClientResult<DownloadedImage>;
}
