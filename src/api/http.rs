use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::{DownloadedImage, RecipeApi, TokenSource};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    AuthenticationResponse, Credentials, IdResponse, Recipe, RecipeParams, RecipesResponse,
};

/// reqwest-backed [`RecipeApi`].
pub struct HttpRecipeApi {
    inner: reqwest::Client,
    base: Url,
    tokens: Arc<dyn TokenSource>,
}

impl HttpRecipeApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenSource>,
    ) -> ClientResult<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;

        let inner = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner,
            base,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn recipe_endpoint(&self, id: &str) -> ClientResult<Url> {
        let mut url = self.endpoint("recipes")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .push(id);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.tokens.token().unwrap_or_default();
        request.bearer_auth(token)
    }

    /// 401 first, then any other non-2xx.
    fn check_recipe_status(status: StatusCode) -> ClientResult<()> {
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Authentication);
        }
        Self::check_status(status)
    }

    fn check_status(status: StatusCode) -> ClientResult<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Response(status))
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Option<T> {
        let body = response.bytes().await.ok()?;
        serde_json::from_slice(&body).ok()
    }
}

#[async_trait]
impl RecipeApi for HttpRecipeApi {
    async fn sign_in(&self, credentials: &Credentials) -> ClientResult<String> {
        let response = self
            .inner
            .post(self.endpoint("auth/signin")?)
            .json(credentials)
            .send()
            .await?;

        Self::check_status(response.status())?;
        let body: AuthenticationResponse =
            Self::decode(response).await.ok_or(ClientError::Login)?;

        tracing::info!(email = %credentials.email, "signed in");
        Ok(body.auth_token)
    }

    async fn sign_up(&self, credentials: &Credentials) -> ClientResult<Option<String>> {
        let response = self
            .inner
            .post(self.endpoint("auth/signup")?)
            .json(credentials)
            .send()
            .await?;

        Self::check_status(response.status())?;
        let body: IdResponse = Self::decode(response)
            .await
            .ok_or(ClientError::Registration)?;

        tracing::info!(email = %credentials.email, "registered");
        Ok(Some(body.id))
    }

    async fn get_all_recipes(&self) -> ClientResult<Vec<Recipe>> {
        let request = self.inner.get(self.endpoint("recipes")?);
        let response = self.authorized(request).send().await?;

        Self::check_recipe_status(response.status())?;
        let body: RecipesResponse = Self::decode(response).await.ok_or(ClientError::Decoding)?;

        tracing::debug!(count = body.recipes.len(), "fetched recipes");
        Ok(body.recipes)
    }

    async fn add_recipe(&self, params: &RecipeParams) -> ClientResult<String> {
        let request = self.inner.post(self.endpoint("recipes")?).json(params);
        let response = self.authorized(request).send().await?;

        Self::check_recipe_status(response.status())?;
        let body: IdResponse = Self::decode(response).await.ok_or(ClientError::Decoding)?;

        tracing::debug!(id = %body.id, "added recipe");
        Ok(body.id)
    }

    async fn edit_recipe(&self, params: &RecipeParams, id: &str) -> ClientResult<String> {
        let request = self.inner.put(self.recipe_endpoint(id)?).json(params);
        let response = self.authorized(request).send().await?;

        Self::check_recipe_status(response.status())?;
        let body: IdResponse = Self::decode(response).await.ok_or(ClientError::Decoding)?;

        tracing::debug!(id = %body.id, "edited recipe");
        Ok(body.id)
    }

    async fn delete_recipe(&self, id: &str) -> ClientResult<()> {
        let request = self.inner.delete(self.recipe_endpoint(id)?);
        let response = self.authorized(request).send().await?;

        Self::check_recipe_status(response.status())?;

        tracing::debug!(id, "deleted recipe");
        Ok(())
    }

    async fn download_image(&self, url: &str) -> ClientResult<DownloadedImage> {
        let parsed = Url::parse(url)?;
        let response = self.inner.get(parsed).send().await?;

        Self::check_status(response.status())?;
        let data = response.bytes().await?;

        tracing::debug!(url, bytes = data.len(), "downloaded image");
        DownloadedImage::from_bytes(url, data)
    }
}
